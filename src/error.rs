//! Errors raised by the resolution core.
//!
//! All of them are configuration or environment errors: none is transient, so
//! callers report them and stop instead of retrying.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OsdepsError {
    /// A definition has the wrong shape somewhere in its tree.
    #[error("invalid osdeps definition in {source_name}, at {key}: {message}")]
    Malformed {
        source_name: String,
        key: String,
        message: String,
    },

    /// A top-level string that is neither `ignore` nor `gem`.
    #[error("unknown OS-independent package management type {directive} for {name}")]
    UnknownDirective { name: String, directive: String },

    #[error("there is no osdeps definition for {name}")]
    NoDefinition { name: String },

    #[error("there is an osdeps definition for {name}, but not for this operating system ({os})")]
    WrongOs { name: String, os: String },

    #[error(
        "there is an osdeps definition for {name}, but not for this particular operating system version ({os})"
    )]
    WrongOsVersion { name: String, os: String },

    #[error("cannot resolve {name}: the operating system could not be detected")]
    UnknownOs { name: String },

    /// The OS was detected but there is no install command for it.
    #[error("I don't know how to install packages on {os}")]
    UnsupportedOs { os: String },
}

impl OsdepsError {
    /// The dependency this error is about, when there is one.
    pub fn dependency(&self) -> Option<&str> {
        match self {
            Self::UnknownDirective { name, .. }
            | Self::NoDefinition { name }
            | Self::WrongOs { name, .. }
            | Self::WrongOsVersion { name, .. }
            | Self::UnknownOs { name } => Some(name),
            Self::Malformed { .. } | Self::UnsupportedOs { .. } => None,
        }
    }

    /// Same error, naming the dependency `name` instead.
    pub fn with_dependency(self, name: impl Into<String>) -> Self {
        let name = name.into();
        match self {
            Self::UnknownDirective { directive, .. } => Self::UnknownDirective { name, directive },
            Self::NoDefinition { .. } => Self::NoDefinition { name },
            Self::WrongOs { os, .. } => Self::WrongOs { name, os },
            Self::WrongOsVersion { os, .. } => Self::WrongOsVersion { name, os },
            Self::UnknownOs { .. } => Self::UnknownOs { name },
            other @ (Self::Malformed { .. } | Self::UnsupportedOs { .. }) => other,
        }
    }

    pub(crate) fn malformed(
        source_name: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Malformed {
            source_name: source_name.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_name() {
        let err = OsdepsError::WrongOs {
            name: "libxml2".into(),
            os: "gentoo".into(),
        };
        assert_eq!(err.dependency(), Some("libxml2"));

        let err = OsdepsError::UnsupportedOs { os: "haiku".into() };
        assert_eq!(err.dependency(), None);
    }

    #[test]
    fn test_with_dependency() {
        let err = OsdepsError::WrongOsVersion {
            name: "ruby19".into(),
            os: "debian:lenny".into(),
        }
        .with_dependency("ruby (alias of ruby19)");
        assert_eq!(err.dependency(), Some("ruby (alias of ruby19)"));
        assert!(err.to_string().contains("(debian:lenny)"));

        let err = OsdepsError::UnsupportedOs { os: "haiku".into() };
        assert_eq!(err.clone().with_dependency("foo"), err);
    }

    #[test]
    fn test_messages_name_the_dependency() {
        let err = OsdepsError::UnknownDirective {
            name: "nokogiri".into(),
            directive: "pip".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown OS-independent package management type pip for nokogiri"
        );

        let err = OsdepsError::NoDefinition {
            name: "boost".into(),
        };
        assert_eq!(err.to_string(), "there is no osdeps definition for boost");
    }
}

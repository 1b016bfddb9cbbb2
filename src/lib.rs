pub mod alias;
pub mod application;
pub mod commands;
pub mod context;
pub mod definition;
pub mod error;
pub mod installed;
pub mod os;
pub mod partition;
pub mod plan;
pub mod resolver;
pub mod runtime;

pub use context::OsdepsContext;
pub use error::OsdepsError;

//! Midpoint configuration through the REST API
//!
//! Pushes object files, patches and declarative operations to a Midpoint
//! identity platform, waiting for imports and tasks where the platform is
//! only eventually consistent.

pub mod config;
pub mod error;
pub mod midpoint;
pub mod operation;
pub mod processor;
pub mod properties;

pub use error::MidpointError;

//! Midpoint client error types

use thiserror::Error;

/// Errors raised while talking to Midpoint
#[derive(Error, Debug)]
pub enum MidpointError {
    /// The server answered outside the accepted status set
    #[error("Invalid HTTP response received: '{status}' from {url}")]
    Status { status: u16, url: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Can't find REST type for class {0}")]
    UnknownObjectType(String),

    #[error("Either object_oid or object_name must be specified")]
    MissingIdentifier,

    #[error("object_type: {object_type}, object_name: {name} does not exist")]
    ObjectNotFound { object_type: String, name: String },

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A polling loop exhausted its iteration budget
    #[error("Gave up waiting for {0}")]
    GaveUp(String),

    #[error("Unknown structure for {relationship} from source type {source_type}")]
    UnknownStructure {
        relationship: String,
        source_type: String,
    },

    #[error("Invalid operation parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid file layout: {0}")]
    InvalidFileLayout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MidpointError {
    /// Whether a polling loop should treat this error as "not yet"
    ///
    /// Missing objects, server-side failures and connection problems are
    /// expected while Midpoint is still starting or an object is still being
    /// imported. Everything else (bad credentials, malformed documents,
    /// unknown types) stops the loop.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 404 || *status >= 500,
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            Self::ObjectNotFound { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MidpointError>;

//! Error types for the graph runtime.
//!
//! Every variant here corresponds 1:1 to a symbolic status code in the
//! control-plane operation table; the (out-of-scope) HTTP façade translates
//! `Display` or [`GraphError::code`] into the response clients see.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// All errors the graph runtime can raise.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("block type '{0}' is not registered")]
    InvalidBlockType(String),

    #[error("block id '{0}' already exists")]
    BlockIdAlreadyExists(String),

    #[error("block id must be non-empty and non-whitespace")]
    BadBlockId,

    #[error("block '{0}' not found")]
    BlockNotFound(String),

    #[error("'from' block '{0}' not found")]
    FromBlockNotFound(String),

    #[error("'to' block '{0}' not found")]
    ToBlockNotFound(String),

    #[error("route '{route}' not found on block '{block}'")]
    ToRouteNotFound { block: String, route: String },

    #[error("connection id must be non-empty and non-whitespace")]
    BadConnectionId,

    #[error("block id '{0}' not found")]
    BlockIdNotFound(String),

    #[error("route '{route}' not found on block '{block}'")]
    RouteNotFound { block: String, route: String },

    #[error("malformed connection target '{0}', expected 'id' or 'id/route'")]
    MalformedTarget(String),

    #[error("import payload is malformed: {0}")]
    BadImport(String),

    #[error("the worker for block '{0}' is no longer running")]
    WorkerUnavailable(String),

    #[error("payload of {actual} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { actual: usize, limit: usize },

    #[error("{0}")]
    Internal(String),
}

impl GraphError {
    /// The symbolic status code a control-plane façade would surface to a
    /// client for this error.
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::InvalidBlockType(_) => "INVALID_BLOCKTYPE",
            GraphError::BlockIdAlreadyExists(_) => "BLOCK_ID_ALREADY_EXISTS",
            GraphError::BadBlockId => "BAD_BLOCK_ID",
            GraphError::BlockNotFound(_) => "BLOCK_NOT_FOUND",
            GraphError::FromBlockNotFound(_) => "FROM_BLOCK_NOT_FOUND",
            GraphError::ToBlockNotFound(_) => "TO_BLOCK_NOT_FOUND",
            GraphError::ToRouteNotFound { .. } => "TO_ROUTE_NOT_FOUND",
            GraphError::BadConnectionId => "BAD_CONNECTION_ID",
            GraphError::BlockIdNotFound(_) => "BLOCK_ID_NOT_FOUND",
            GraphError::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            GraphError::MalformedTarget(_) => "TO_ROUTE_NOT_FOUND",
            GraphError::BadImport(_) => "IMPORT_FAIL",
            GraphError::WorkerUnavailable(_) => "BAD_RESPONSE_FROM_BLOCK",
            GraphError::PayloadTooLarge { .. } => "BAD_REQUEST",
            GraphError::Internal(_) => "INTERNAL",
        }
    }
}

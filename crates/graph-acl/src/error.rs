use oxigraph::{
    model::IriParseError,
    sparql::{QueryEvaluationError, SparqlSyntaxError},
    store::StorageError,
};
use thiserror::Error;

/// Errors surfaced by statement stores and the access-control layer.
///
/// Permission denial is not represented here: denied reads yield nothing and
/// denied writes are no-ops.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// SPARQL evaluation failed
    #[error("Query evaluation failed: {0}")]
    QueryEvaluation(#[from] QueryEvaluationError),

    /// SPARQL text could not be parsed
    #[error("Query syntax error: {0}")]
    QuerySyntax(#[from] SparqlSyntaxError),

    /// A configured graph identifier is not a valid IRI
    #[error("Invalid IRI: {0}")]
    InvalidIri(#[from] IriParseError),

    /// Query is well-formed but not supported by this entry point
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Operation attempted on a closed connection
    #[error("Connection is closed")]
    ConnectionClosed,

    /// `begin` called while a transaction is already running
    #[error("A transaction is already active on this connection")]
    TransactionAlreadyActive,

    /// `commit` or `rollback` called without a running transaction
    #[error("No active transaction on this connection")]
    NoActiveTransaction,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;

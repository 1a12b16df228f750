//! Graph-scoped access control for RDF statement stores.
//!
//! [`AccessControlledConnection`] wraps any [`StoreConnection`] and confines
//! it to two live permission sets: graphs the caller may read and graphs the
//! caller may write (add and delete). [`AccessControlledStore`] owns those
//! sets and opens wrapped connections that share them.
//!
//! Denied operations never fail. Reads of unreadable graphs come back empty,
//! writes to unwritable graphs are skipped.

mod backend;
mod config;
mod connection;
pub mod error;
mod filter;
mod metrics;
mod permissions;
mod store;
pub mod types;

pub use backend::{
    ContextIter, NamespaceIter, OxigraphConnection, OxigraphStore, SolutionIter, StatementIter,
    StatementStore, StoreConnection,
};
pub use config::{
    ALLOW_WILDCARD_CLEAR, ALLOW_WILDCARD_SIZE, AccessControlConfig, AccessPolicy, ENV_PREFIX,
};
pub use connection::AccessControlledConnection;
pub use error::{Result, StoreError};
pub use filter::{ReadableContexts, ReadableStatements};
pub use permissions::PermissionSet;
pub use store::AccessControlledStore;
pub use types::{Dataset, GraphScope, NonEmptyGraphs, StatementPattern};

#[cfg(test)]
mod tests;

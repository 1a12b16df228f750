use std::sync::Arc;

use crate::{
    backend::StatementStore,
    config::{AccessControlConfig, AccessPolicy},
    connection::AccessControlledConnection,
    error::Result,
    permissions::PermissionSet,
};

/// Store decorator owning the permission sets
///
/// Every connection opened here shares the same readable and writable sets.
/// Mutating them through [`readable`](Self::readable) or
/// [`writable`](Self::writable) affects open connections immediately.
pub struct AccessControlledStore<S> {
    inner: S,
    readable: Arc<PermissionSet>,
    writable: Arc<PermissionSet>,
    policy: AccessPolicy,
}

impl<S: StatementStore> AccessControlledStore<S> {
    pub fn new(
        inner: S,
        readable: Arc<PermissionSet>,
        writable: Arc<PermissionSet>,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            inner,
            readable,
            writable,
            policy,
        }
    }

    /// Build the store from configuration, seeding both permission sets.
    pub fn from_config(inner: S, config: &AccessControlConfig) -> Result<Self> {
        let policy = AccessPolicy::try_from(config)?;
        let readable = PermissionSet::shared(config.readable_graph_ids()?);
        let writable = PermissionSet::shared(config.writable_graph_ids()?);

        tracing::info!(
            readable = readable.len(),
            writable = writable.len(),
            default_write_graph = ?policy.default_write_graph,
            hide_non_writable_contexts = policy.hide_non_writable_contexts,
            "Access-controlled store initialized"
        );

        Ok(Self::new(inner, readable, writable, policy))
    }

    pub fn readable(&self) -> &Arc<PermissionSet> {
        &self.readable
    }

    pub fn writable(&self) -> &Arc<PermissionSet> {
        &self.writable
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// The wrapped store, bypassing every permission check
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: StatementStore> StatementStore for AccessControlledStore<S> {
    type Connection = AccessControlledConnection<S::Connection>;

    fn connection(&self) -> Result<Self::Connection> {
        Ok(AccessControlledConnection::new(
            self.inner.connection()?,
            Arc::clone(&self.readable),
            Arc::clone(&self.writable),
            self.policy.clone(),
        ))
    }
}

#![allow(clippy::unwrap_used)]


use oxigraph::model::{GraphName, Literal, NamedNode, NamedOrBlankNode, Quad};

use crate::{
    AccessControlledStore, AccessPolicy, OxigraphStore, PermissionSet, StatementStore,
    StoreConnection,
};

pub(super) fn iri(name: &str) -> NamedNode {
    NamedNode::new(format!("http://example.org/{name}")).unwrap()
}

pub(super) fn graph(name: &str) -> GraphName {
    iri(name).into()
}

pub(super) fn named(name: &str) -> NamedOrBlankNode {
    iri(name).into()
}

pub(super) fn quad(subject: &str, graph_name: GraphName) -> Quad {
    Quad::new(iri(subject), iri("p"), Literal::from("o"), graph_name)
}

/// Access-controlled store over a fresh in-memory Oxigraph store.
pub(super) fn acl_store(
    readable: &[&str],
    writable: &[&str],
    policy: AccessPolicy,
) -> AccessControlledStore<OxigraphStore> {
    AccessControlledStore::new(
        OxigraphStore::in_memory().unwrap(),
        PermissionSet::shared(readable.iter().map(|name| named(name))),
        PermissionSet::shared(writable.iter().map(|name| named(name))),
        policy,
    )
}

/// Insert directly into the underlying store, bypassing access control.
pub(super) fn insert_raw(store: &AccessControlledStore<OxigraphStore>, quads: &[Quad]) {
    for quad in quads {
        store.inner().store().insert(quad).unwrap();
    }
}

pub(super) fn raw_len(store: &AccessControlledStore<OxigraphStore>) -> usize {
    store.inner().store().len().unwrap()
}

pub(super) fn raw_graph_len(store: &AccessControlledStore<OxigraphStore>, name: &str) -> u64 {
    let conn = store.inner().connection().unwrap();
    conn.size(&crate::GraphScope::one(graph(name))).unwrap()
}

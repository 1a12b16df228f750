use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use oxigraph::model::{NamedNode, NamedOrBlankNode};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Prefix of environment variables overriding [`AccessControlConfig`] fields.
pub const ENV_PREFIX: &str = "GRAPH_ACL_";

/// Whether `size` without graphs reports the store size. Fixed off.
pub const ALLOW_WILDCARD_SIZE: bool = false;

/// Whether `clear` without graphs may empty the whole store. Fixed off.
pub const ALLOW_WILDCARD_CLEAR: bool = false;

/// Access-control settings of a store
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct AccessControlConfig {
    /// Graph IRI used when a write names no graph
    pub default_write_graph: Option<String>,

    /// Initial members of the readable set
    pub readable_graphs: Vec<String>,

    /// Initial members of the writable set (add and delete)
    pub writable_graphs: Vec<String>,

    pub namespaces_readable: bool,

    pub namespaces_writable: bool,

    /// Report statements from graphs the caller cannot write as belonging to
    /// the default graph on wildcard reads.
    pub hide_non_writable_contexts: bool,
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            default_write_graph: None,
            readable_graphs: Vec::new(),
            writable_graphs: Vec::new(),
            namespaces_readable: true,
            namespaces_writable: true,
            hide_non_writable_contexts: false,
        }
    }
}

impl AccessControlConfig {
    /// Load configuration with layered sources (priority: lowest to highest):
    /// defaults, the optional TOML file, `GRAPH_ACL_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            tracing::info!(path = %path.display(), "Loading access-control config file");
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let config: Self = figment.extract().map_err(Box::new)?;
        Ok(config)
    }

    pub fn readable_graph_ids(&self) -> Result<Vec<NamedOrBlankNode>> {
        parse_graphs(&self.readable_graphs)
    }

    pub fn writable_graph_ids(&self) -> Result<Vec<NamedOrBlankNode>> {
        parse_graphs(&self.writable_graphs)
    }
}

fn parse_graphs(iris: &[String]) -> Result<Vec<NamedOrBlankNode>> {
    iris.iter()
        .map(|iri| Ok(NamedNode::new(iri.as_str())?.into()))
        .collect()
}

/// Parsed policy of one access-controlled connection.
///
/// The default write graph is a named graph: the default graph is never
/// writable, so it could never survive validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    pub default_write_graph: Option<NamedOrBlankNode>,
    pub namespaces_readable: bool,
    pub namespaces_writable: bool,
    pub hide_non_writable_contexts: bool,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            default_write_graph: None,
            namespaces_readable: true,
            namespaces_writable: true,
            hide_non_writable_contexts: false,
        }
    }
}

impl TryFrom<&AccessControlConfig> for AccessPolicy {
    type Error = crate::error::StoreError;

    fn try_from(config: &AccessControlConfig) -> Result<Self> {
        let default_write_graph = config
            .default_write_graph
            .as_deref()
            .map(|iri| NamedNode::new(iri).map(NamedOrBlankNode::from))
            .transpose()?;

        Ok(Self {
            default_write_graph,
            namespaces_readable: config.namespaces_readable,
            namespaces_writable: config.namespaces_writable,
            hide_non_writable_contexts: config.hide_non_writable_contexts,
        })
    }
}

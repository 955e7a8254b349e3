//! Module metadata

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cacheable::Cacheable;
use crate::error::{TypesError, TypesResult};
use crate::value::RefSpec;

/// What `describe-module` reports about a deployed module. Module code is
/// immutable once published, so these are cached without expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMetadata {
    /// Network the module lives on
    pub network: String,
    /// Chain the module lives on
    pub chain: String,
    /// Qualified module name
    pub name: String,
    /// Whether the module is deployed on this chain
    pub exists: bool,
    /// Current module hash
    #[serde(default)]
    pub hash: Option<String>,
    /// Superseded hashes that remain valid
    #[serde(default)]
    pub blessed: Vec<String>,
    /// Source code
    #[serde(default)]
    pub code: Option<String>,
    /// Governance: a keyset name or capability reference
    #[serde(default)]
    pub governance: Option<String>,
    /// Implemented interfaces
    #[serde(default)]
    pub interfaces: Vec<String>,
}

impl ModuleMetadata {
    /// Metadata for a module that is not deployed
    pub fn missing(network: impl Into<String>, chain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            chain: chain.into(),
            name: name.into(),
            exists: false,
            hash: None,
            blessed: Vec::new(),
            code: None,
            governance: None,
            interfaces: Vec::new(),
        }
    }

    /// Build from the output of `describe-module`. An object without a
    /// `hash` field (the probe's `{}` fallback) means the module is missing.
    pub fn from_description(
        network: impl Into<String>,
        chain: impl Into<String>,
        name: impl Into<String>,
        description: &Value,
    ) -> TypesResult<Self> {
        let mut metadata = Self::missing(network, chain, name);
        let Some(hash) = description.get("hash") else {
            return Ok(metadata);
        };

        let hash = hash
            .as_str()
            .ok_or_else(|| TypesError::MalformedValue(format!("module hash: {}", hash)))?;
        metadata.exists = true;
        metadata.hash = Some(hash.to_string());
        metadata.blessed = string_list(description.get("blessed"));
        metadata.code = description
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string);
        metadata.governance = description
            .get("keyset")
            .or_else(|| description.get("governance"))
            .and_then(governance_text);
        metadata.interfaces = string_list(description.get("interfaces"));
        Ok(metadata)
    }

    /// Whether the module declares the given interface
    pub fn implements(&self, interface: &str) -> bool {
        self.exists && self.interfaces.iter().any(|i| i == interface)
    }

    /// Key under which module metadata is cached
    pub fn cache_key_for(network: &str, chain: &str, module: &str) -> String {
        format!("pact-module@{}${}${}", network, chain, module)
    }
}

impl Cacheable for ModuleMetadata {
    fn cache_key(&self) -> String {
        Self::cache_key_for(&self.network, &self.chain, &self.name)
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                other => serde_json::from_value::<RefSpec>(other.clone())
                    .ok()
                    .map(|r| r.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn governance_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

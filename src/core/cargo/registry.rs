//! Cargo registries known to the project.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoRegistry {
    /// Name Cargo knows the registry by (`registry = "<alias>"` in dependencies).
    pub alias: String,
    pub index: String,
    #[serde(default, skip_serializing)]
    pub publish_token: Option<String>,
}

/// The `cargo` section of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoSettings {
    /// Registries keyed by the name tasks refer to them with.
    #[serde(default)]
    pub registries: BTreeMap<String, CargoRegistry>,
}

impl CargoSettings {
    pub fn registry(&self, name: &str) -> Result<&CargoRegistry> {
        self.registries
            .get(name)
            .ok_or_else(|| Error::registry_not_found(name))
    }

    pub fn add_registry(
        &mut self,
        alias: impl Into<String>,
        index: impl Into<String>,
        publish_token: Option<String>,
    ) -> &mut Self {
        let alias = alias.into();
        self.registries.insert(
            alias.clone(),
            CargoRegistry {
                alias,
                index: index.into(),
                publish_token,
            },
        );
        self
    }
}

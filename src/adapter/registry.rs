use crate::adapter::types::SiteAdapter;
use crate::{ConfigError, HarvestError};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Adapters shipped with the crate
const BUILTIN_SUPPLIERS: &str = include_str!("suppliers.toml");

/// Top-level shape of a file holding `[[site]]` tables
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteFile {
    #[serde(default)]
    pub site: Vec<SiteAdapter>,
}

/// Name-indexed collection of site adapters
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: BTreeMap<String, SiteAdapter>,
}

impl SiteRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the built-in supplier table
    pub fn builtin() -> Result<Self, ConfigError> {
        let file: SiteFile = toml::from_str(BUILTIN_SUPPLIERS)?;
        let mut registry = Self::new();
        registry.extend(file.site);
        Ok(registry)
    }

    /// Adds adapters, replacing any existing adapter with the same name
    pub fn extend(&mut self, sites: impl IntoIterator<Item = SiteAdapter>) {
        for site in sites {
            if self.sites.contains_key(&site.name) {
                tracing::debug!("Overriding site adapter '{}'", site.name);
            }
            self.sites.insert(site.name.clone(), site);
        }
    }

    /// Looks up a supplier by name
    ///
    /// # Returns
    ///
    /// * `Ok(&SiteAdapter)` - The adapter for this supplier
    /// * `Err(HarvestError::UnknownSupplier)` - No adapter carries this name
    pub fn get(&self, name: &str) -> Result<&SiteAdapter, HarvestError> {
        self.sites
            .get(name)
            .ok_or_else(|| HarvestError::UnknownSupplier {
                name: name.to_string(),
                known: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    /// Supplier names in alphabetical order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sites.keys().map(String::as_str)
    }

    /// All adapters in alphabetical order
    pub fn sites(&self) -> impl Iterator<Item = &SiteAdapter> {
        self.sites.values()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

//! Provider catalog
//!
//! An explicit, injected table of backends and their fallback edges. The
//! catalog is built once and read-only afterwards; tests build their own.

use crate::config::{ProviderConfig, Validate};
use crate::utils::error::{GatewayError, Result};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Read-only table of providers keyed by id, with alias resolution
#[derive(Debug, Clone, Default)]
pub struct ProviderCatalog {
    providers: Vec<ProviderConfig>,
    /// Provider id -> position in `providers`
    index: HashMap<String, usize>,
    /// Alias -> provider id
    aliases: HashMap<String, String>,
}

impl ProviderCatalog {
    /// Build a catalog from provider entries
    ///
    /// Rejects invalid entries, duplicate ids, aliases that clash with ids
    /// or with each other, and fallback targets that are not in the catalog.
    /// Cycles are not rejected here; [`check_acyclic`](Self::check_acyclic)
    /// reports them and the fallback walk fails fast on them at call time.
    pub fn new(providers: Vec<ProviderConfig>) -> Result<Self> {
        let mut index = HashMap::with_capacity(providers.len());
        for (position, provider) in providers.iter().enumerate() {
            provider
                .validate()
                .map_err(|e| GatewayError::Config(format!("Provider config error: {}", e)))?;
            if index.insert(provider.id.clone(), position).is_some() {
                return Err(GatewayError::Config(format!(
                    "Duplicate provider id: {}",
                    provider.id
                )));
            }
        }

        let mut aliases = HashMap::new();
        for provider in &providers {
            for alias in &provider.aliases {
                if index.contains_key(alias) {
                    return Err(GatewayError::Config(format!(
                        "Alias {} of provider {} clashes with a provider id",
                        alias, provider.id
                    )));
                }
                if let Some(existing) = aliases.insert(alias.clone(), provider.id.clone()) {
                    return Err(GatewayError::Config(format!(
                        "Alias {} is used by both {} and {}",
                        alias, existing, provider.id
                    )));
                }
            }
        }

        for provider in &providers {
            if let Some(target) = &provider.fallback {
                if !index.contains_key(target) && !aliases.contains_key(target) {
                    return Err(GatewayError::Config(format!(
                        "Provider {} falls back to unknown provider {}",
                        provider.id, target
                    )));
                }
            }
        }

        debug!("Built provider catalog with {} providers", providers.len());
        Ok(Self {
            providers,
            index,
            aliases,
        })
    }

    /// Look up a provider by id or alias
    pub fn get(&self, id_or_alias: &str) -> Option<&ProviderConfig> {
        let id = self
            .aliases
            .get(id_or_alias)
            .map(String::as_str)
            .unwrap_or(id_or_alias);
        self.index.get(id).map(|&position| &self.providers[position])
    }

    /// Look up a provider, failing with [`GatewayError::ProviderNotFound`]
    pub fn resolve(&self, id_or_alias: &str) -> Result<&ProviderConfig> {
        self.get(id_or_alias)
            .ok_or_else(|| GatewayError::ProviderNotFound(id_or_alias.to_string()))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Providers in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter()
    }

    /// Fallback chain starting at `id`, the starting provider included
    ///
    /// Stops before the first repeated provider.
    pub fn fallback_chain(&self, id: &str) -> Result<Vec<String>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(self.resolve(id)?);
        while let Some(provider) = current {
            if !seen.insert(provider.id.as_str()) {
                break;
            }
            chain.push(provider.id.clone());
            current = provider.fallback.as_deref().and_then(|next| self.get(next));
        }
        Ok(chain)
    }

    /// Check that following fallback edges never revisits a provider
    pub fn check_acyclic(&self) -> Result<()> {
        // Providers already proven to reach the end of a chain
        let mut terminal: HashSet<&str> = HashSet::new();

        for start in &self.providers {
            let mut path: Vec<&str> = Vec::new();
            let mut current = Some(start);
            while let Some(provider) = current {
                let id = provider.id.as_str();
                if terminal.contains(id) {
                    break;
                }
                if let Some(position) = path.iter().position(|seen| *seen == id) {
                    let mut chain: Vec<String> =
                        path[position..].iter().map(|s| s.to_string()).collect();
                    chain.push(id.to_string());
                    return Err(GatewayError::FallbackCycle { chain });
                }
                path.push(id);
                current = provider.fallback.as_deref().and_then(|next| self.get(next));
            }
            terminal.extend(path);
        }
        Ok(())
    }
}

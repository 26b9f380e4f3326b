//! Fallback resolution over the provider graph

use super::catalog::ProviderCatalog;
use crate::config::ProviderConfig;
use crate::utils::error::{GatewayError, Result};
use std::collections::HashSet;

/// Single-step lookup in the fallback graph
#[derive(Debug, Clone, Copy)]
pub struct FallbackResolver<'a> {
    catalog: &'a ProviderCatalog,
}

impl<'a> FallbackResolver<'a> {
    pub fn new(catalog: &'a ProviderCatalog) -> Self {
        Self { catalog }
    }

    /// Next provider to try after `current`, if any
    pub fn resolve(&self, current: &ProviderConfig) -> Option<&'a ProviderConfig> {
        current
            .fallback
            .as_deref()
            .and_then(|target| self.catalog.get(target))
    }

    /// Start a bounded walk at `start`
    pub fn walk(&self, start: &'a ProviderConfig) -> FallbackWalk<'a> {
        FallbackWalk::new(*self, start)
    }
}

/// A walk along fallback edges that fails fast on a cycle
///
/// Each provider is visited at most once, and the walk never takes more
/// steps than the catalog has providers.
#[derive(Debug)]
pub struct FallbackWalk<'a> {
    resolver: FallbackResolver<'a>,
    current: &'a ProviderConfig,
    visited: HashSet<&'a str>,
    chain: Vec<String>,
    bound: usize,
}

impl<'a> FallbackWalk<'a> {
    fn new(resolver: FallbackResolver<'a>, start: &'a ProviderConfig) -> Self {
        let mut visited = HashSet::new();
        visited.insert(start.id.as_str());
        Self {
            resolver,
            current: start,
            visited,
            chain: vec![start.id.clone()],
            bound: resolver.catalog.len().max(1),
        }
    }

    /// Provider the walk is on
    pub fn current(&self) -> &'a ProviderConfig {
        self.current
    }

    /// Move to the next provider
    ///
    /// Returns `Ok(None)` at the end of the chain and
    /// [`GatewayError::FallbackCycle`] when the next provider was already
    /// visited.
    pub fn advance(&mut self) -> Result<Option<&'a ProviderConfig>> {
        let Some(next) = self.resolver.resolve(self.current) else {
            return Ok(None);
        };

        if !self.visited.insert(next.id.as_str()) || self.chain.len() >= self.bound {
            let mut chain = self.chain.clone();
            chain.push(next.id.clone());
            return Err(GatewayError::FallbackCycle { chain });
        }

        self.chain.push(next.id.clone());
        self.current = next;
        Ok(Some(next))
    }

    /// Providers visited so far, in order
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    pub fn into_chain(self) -> Vec<String> {
        self.chain
    }
}

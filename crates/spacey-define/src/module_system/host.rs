// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host native resolver
//!
//! A host that already has a module ecosystem (a CommonJS `require`, a
//! plugin table, ...) can plug it in front of the registry. It is consulted
//! for single-name requests only.

use crate::value::Value;

/// Result of asking the host for a module
#[derive(Debug, Clone)]
pub enum HostResolution {
    /// The host resolved the module
    Found(Value),
    /// The host does not know the module; fall through to the registry
    NotFound,
    /// The host knows the module but failed to load it
    Failed(String),
}

/// A host-provided module resolver
pub trait HostResolver: Send + Sync {
    /// Resolve a module by name
    fn resolve(&self, name: &str) -> HostResolution;
}

impl<F> HostResolver for F
where
    F: Fn(&str) -> HostResolution + Send + Sync,
{
    fn resolve(&self, name: &str) -> HostResolution {
        self(name)
    }
}

/// A host resolver backed by a fixed table of values
#[derive(Debug, Clone, Default)]
pub struct StaticHostResolver {
    modules: std::collections::HashMap<String, Value>,
}

impl StaticHostResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module
    pub fn with_module(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.modules.insert(name.into(), value.into());
        self
    }
}

impl HostResolver for StaticHostResolver {
    fn resolve(&self, name: &str) -> HostResolution {
        match self.modules.get(name) {
            Some(value) => HostResolution::Found(value.clone()),
            None => HostResolution::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_resolver() {
        let resolver = |name: &str| match name {
            "fs" => HostResolution::Found(Value::from("fs")),
            "broken" => HostResolution::Failed("syntax error".into()),
            _ => HostResolution::NotFound,
        };

        assert!(matches!(resolver.resolve("fs"), HostResolution::Found(_)));
        assert!(matches!(resolver.resolve("broken"), HostResolution::Failed(_)));
        assert!(matches!(resolver.resolve("lodash"), HostResolution::NotFound));
    }

    #[test]
    fn test_static_resolver() {
        let resolver = StaticHostResolver::new().with_module("path", "path-module");
        assert!(matches!(
            resolver.resolve("path"),
            HostResolution::Found(Value::String(s)) if &*s == "path-module"
        ));
        assert!(matches!(resolver.resolve("Path"), HostResolution::NotFound));
    }
}

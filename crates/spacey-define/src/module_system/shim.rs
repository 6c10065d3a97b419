// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Shim table: modules backed by values in the global namespace

use crate::config::ShimConfig;
use crate::module_system::name;
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
struct ShimEntry {
    name: String,
    exports: Option<String>,
}

/// Module name to global path mapping, matched case-insensitively
#[derive(Debug, Clone, Default)]
pub struct ShimTable {
    entries: HashMap<String, ShimEntry>,
}

impl ShimTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from configuration entries
    pub fn from_config(shim: &BTreeMap<String, ShimConfig>) -> Self {
        let entries = shim
            .iter()
            .map(|(module, config)| {
                (
                    name::key(module),
                    ShimEntry {
                        name: name::normalize(module),
                        exports: config.exports.clone(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Check if a module is shimmed
    pub fn contains(&self, module: &str) -> bool {
        self.entries.contains_key(&name::key(module))
    }

    /// Dotted export path for a module, if shimmed with one
    pub fn exports(&self, module: &str) -> Option<&str> {
        self.entries
            .get(&name::key(module))
            .and_then(|entry| entry.exports.as_deref())
    }

    /// Shimmed module names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.values().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walk a dotted path (`_.str`) from `root`.
///
/// Missing properties and non-object intermediates yield `undefined`.
pub fn lookup_path(root: &Value, path: &str) -> Value {
    if path.trim().is_empty() {
        return Value::Undefined;
    }

    let mut current = root.clone();
    for part in path.split('.') {
        let next = current.as_object().and_then(|obj| obj.get(part));
        match next {
            Some(next) => current = next,
            None => return Value::Undefined,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    fn global() -> Value {
        let lib = Object::new();
        lib.set("version", "1.0");
        let ns = Object::new();
        ns.set("Lib", lib);
        let global = Object::new();
        global.set("Global", ns);
        global.set("flag", Value::Null);
        Value::Object(global)
    }

    #[test]
    fn test_lookup_path() {
        let root = global();
        let lib = lookup_path(&root, "Global.Lib");
        assert!(lib.as_object().is_some());
        assert_eq!(lookup_path(&root, "Global.Lib.version"), Value::from("1.0"));
    }

    #[test]
    fn test_lookup_path_missing() {
        let root = global();
        assert!(lookup_path(&root, "Global.Missing.Deeper").is_undefined());
        assert!(lookup_path(&root, "flag.x").is_undefined());
        assert!(lookup_path(&root, "Global.Lib.version.length").is_undefined());
        assert!(lookup_path(&root, "").is_undefined());
    }

    #[test]
    fn test_lookup_path_returns_null_leaf() {
        assert_eq!(lookup_path(&global(), "flag"), Value::Null);
    }

    #[test]
    fn test_table_is_case_insensitive() {
        let mut config = BTreeMap::new();
        config.insert("jQuery".to_string(), ShimConfig::new("jQuery"));
        config.insert("underscore.string".to_string(), ShimConfig::new("_.str"));

        let table = ShimTable::from_config(&config);
        assert_eq!(table.exports("jquery"), Some("jQuery"));
        assert_eq!(table.exports("UNDERSCORE.STRING"), Some("_.str"));
        assert_eq!(table.exports("lodash"), None);
        assert_eq!(table.names(), vec!["jQuery", "underscore.string"]);
    }

    #[test]
    fn test_entry_without_exports() {
        let mut config = BTreeMap::new();
        config.insert("plugin".to_string(), ShimConfig::default());

        let table = ShimTable::from_config(&config);
        assert!(table.contains("Plugin"));
        assert_eq!(table.exports("plugin"), None);
        assert!(!table.contains("other"));
    }
}

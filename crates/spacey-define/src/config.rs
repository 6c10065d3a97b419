// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration, RequireJS style.
//!
//! ```json
//! {
//!     "shim": {
//!         "jQuery": { "exports": "jQuery" },
//!         "underscore": { "exports": "_" },
//!         "underscore.string": { "exports": "_.str" }
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{DefineError, Result};

/// Configuration accepted by `Loader::configure`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Shim table. `None` keeps the table currently installed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shim: Option<BTreeMap<String, ShimConfig>>,

    /// Fail on unresolvable dependency slots instead of passing `undefined`.
    /// `None` keeps the current setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_dependencies: Option<bool>,
}

/// A single shim entry.
///
/// Other RequireJS shim keys (`deps`, `init`) are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShimConfig {
    /// Dotted path into the global namespace. A shim without one resolves
    /// to `undefined`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<String>,
}

impl ShimConfig {
    /// Create a shim entry exporting `path`.
    pub fn new(exports: impl Into<String>) -> Self {
        Self {
            exports: Some(exports.into()),
        }
    }
}

impl Config {
    /// Parse configuration from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    /// Load configuration from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Build configuration from a dynamically shaped JSON value.
    ///
    /// The value must be an object, and `shim`, when present, must be an
    /// object (or `null`, which keeps the current table).
    pub fn from_value(options: &serde_json::Value) -> Result<Self> {
        let Some(fields) = options.as_object() else {
            return Err(DefineError::invalid_argument("Invalid config: expected an object"));
        };

        if let Some(shim) = fields.get("shim") {
            if !shim.is_object() && !shim.is_null() {
                return Err(DefineError::invalid_argument(
                    "Invalid config: shim must be an object",
                ));
            }
        }

        serde_json::from_value(options.clone())
            .map_err(|e| DefineError::invalid_argument(format!("Invalid config: {}", e)))
    }

    /// Add a shim entry.
    pub fn with_shim(mut self, name: impl Into<String>, exports: impl Into<String>) -> Self {
        self.shim
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), ShimConfig::new(exports));
        self
    }

    /// Set strict dependency resolution.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_dependencies = Some(strict);
        self
    }
}

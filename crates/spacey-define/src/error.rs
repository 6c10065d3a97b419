// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module registry

use thiserror::Error;

/// Result type for define/require operations
pub type Result<T> = std::result::Result<T, DefineError>;

/// Errors that can occur while declaring or resolving modules
#[derive(Debug, Error)]
pub enum DefineError {
    /// Wrong argument shape (empty name, malformed config, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A module with the same name is already declared
    #[error("Module cannot be defined more than once: '{0}'")]
    DuplicateModule(String),

    /// Module not found
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// A module depends on itself, directly or transitively
    #[error("Circular dependency detected: {0}")]
    CyclicDependency(String),

    /// A producer reported a failure while building its module
    #[error("Error initializing module '{module}': {reason}")]
    Producer {
        /// Module name
        module: String,
        /// Reason for failure
        reason: String,
    },

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DefineError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound(module.into())
    }

    /// Create a producer failure for `module`
    pub fn producer(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Producer {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for a [`DefineError::ModuleNotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModuleNotFound(_))
    }
}

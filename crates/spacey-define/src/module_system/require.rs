// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Process-wide define()/require() functions
//!
//! Thin wrappers over a lazily created default [`Loader`]. Hosts that need
//! isolation (tests, embedders running several runtimes) construct their own
//! loaders instead.

use crate::config::Config;
use crate::error::Result;
use crate::module_system::loader::{Loader, Request, Resolved};
use crate::module_system::registry::Init;
use crate::value::Value;
use std::sync::LazyLock;

/// The default loader, empty at startup
static DEFAULT_LOADER: LazyLock<Loader> = LazyLock::new(Loader::new);

/// Get the process-wide loader
pub fn default_loader() -> &'static Loader {
    &DEFAULT_LOADER
}

/// define(name, init)
pub fn define(name: &str, init: impl Into<Init>) -> Result<()> {
    DEFAULT_LOADER.declare(name, init)
}

/// define(name, deps, init)
pub fn define_with<I>(name: &str, dependencies: I, init: impl Into<Init>) -> Result<()>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    DEFAULT_LOADER.declare_with(name, dependencies, init)
}

/// require(deps)
pub fn require(request: impl Into<Request>) -> Result<Resolved> {
    DEFAULT_LOADER.resolve(request)
}

/// require(deps, callback)
pub fn require_with<F>(request: impl Into<Request>, callback: F) -> Result<()>
where
    F: FnOnce(&[Value]),
{
    DEFAULT_LOADER.resolve_with(request, callback)
}

/// require.undefine(name)
pub fn undefine(name: &str) -> bool {
    DEFAULT_LOADER.undeclare(name)
}

/// require.config(cfg)
pub fn configure(config: Config) {
    DEFAULT_LOADER.configure(config)
}

/// require.config(cfg) with a dynamically shaped value
pub fn configure_json(options: &serde_json::Value) -> Result<()> {
    DEFAULT_LOADER.configure_json(options)
}

/// require.hasNativeRequire
pub fn has_native_require() -> bool {
    DEFAULT_LOADER.has_native_resolver()
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-define
//!
//! An AMD-style `define()`/`require()` module registry for the Spacey runtime.
//!
//! Modules are declared by name with a list of dependencies and either a
//! value or a producer. Resolving a module resolves its dependencies
//! depth-first, runs its producer once and caches the result:
//!
//! - Case-insensitive, slash-delimited module names
//! - Relative dependencies (`./loader`, `../../utils/dom`)
//! - Shim table exposing globals as modules (`require.config({ shim })`)
//! - Optional host resolver consulted before the registry
//! - Circular dependency detection
//!
//! ## Quick Start
//!
//! ```rust
//! use spacey_define::{Init, Loader, Value};
//!
//! let loader = Loader::new();
//! loader.declare("utils/dom", "dom")?;
//! loader.declare_with(
//!     "core/view",
//!     ["../utils/dom"],
//!     Init::producer(|deps| Ok(Value::from(format!("view({})", deps[0])))),
//! )?;
//!
//! assert_eq!(loader.require_value("core/view")?, Value::from("view(dom)"));
//! # Ok::<(), spacey_define::DefineError>(())
//! ```
//!
//! The free functions [`define`], [`require`], [`undefine`] and [`configure`]
//! operate on a process-wide default loader.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod module_system;
pub mod value;

// Re-exports
pub use config::{Config, ShimConfig};
pub use error::{DefineError, Result};
pub use module_system::{
    HostResolution, HostResolver, Init, Loader, LoaderBuilder, Request, Resolved,
    StaticHostResolver, configure, configure_json, default_loader, define, define_with,
    has_native_require, require, require_with, undefine,
};
pub use value::{Object, Value};

/// Version of the spacey-define crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! AMD-style module system
//!
//! - `define()` - declare a named module with dependencies
//! - `require()` - resolve modules, instantiating each exactly once
//! - relative dependency names (`./dep`, `../../dep`)
//! - shim table mapping module names to globals
//! - optional host resolver consulted before the registry

pub mod host;
mod loader;
pub mod name;
mod registry;
mod require;
mod shim;

pub use host::{HostResolution, HostResolver, StaticHostResolver};
pub use loader::{Loader, LoaderBuilder, Request, Resolved};
pub use registry::{Init, ModuleRecord, ModuleRegistry, ModuleState, Producer};
pub use require::{
    configure, configure_json, default_loader, define, define_with, has_native_require, require,
    require_with, undefine,
};
pub use shim::{ShimTable, lookup_path};

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - resolves declared modules and their dependencies

use crate::config::Config;
use crate::error::{DefineError, Result};
use crate::module_system::host::{HostResolution, HostResolver};
use crate::module_system::name;
use crate::module_system::registry::{Claim, Init, ModuleRegistry, Producer};
use crate::module_system::shim::{ShimTable, lookup_path};
use crate::value::{Object, Value};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// Names passed to [`Loader::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// A single module; resolves to a single value
    One(String),
    /// A list of modules; resolves to a list of values, even of length one
    Many(Vec<String>),
}

impl Request {
    /// Requested names, in order
    pub fn names(&self) -> &[String] {
        match self {
            Request::One(name) => std::slice::from_ref(name),
            Request::Many(names) => names,
        }
    }
}

impl From<&str> for Request {
    fn from(name: &str) -> Self {
        Request::One(name.to_string())
    }
}

impl From<String> for Request {
    fn from(name: String) -> Self {
        Request::One(name)
    }
}

impl From<&String> for Request {
    fn from(name: &String) -> Self {
        Request::One(name.clone())
    }
}

impl From<Vec<String>> for Request {
    fn from(names: Vec<String>) -> Self {
        Request::Many(names)
    }
}

impl From<Vec<&str>> for Request {
    fn from(names: Vec<&str>) -> Self {
        Request::Many(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Request {
    fn from(names: &[&str]) -> Self {
        Request::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Request {
    fn from(names: [&str; N]) -> Self {
        Request::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Values produced by [`Loader::resolve`]
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Value of a single-name request
    One(Value),
    /// Values of a list request, in request order
    Many(Vec<Value>),
}

impl Resolved {
    /// The single value, or the list as an array value
    pub fn into_value(self) -> Value {
        match self {
            Resolved::One(value) => value,
            Resolved::Many(values) => values.into(),
        }
    }

    /// All values in request order
    pub fn into_vec(self) -> Vec<Value> {
        match self {
            Resolved::One(value) => vec![value],
            Resolved::Many(values) => values,
        }
    }

    /// The value of a single-name request
    pub fn as_one(&self) -> Option<&Value> {
        match self {
            Resolved::One(value) => Some(value),
            Resolved::Many(_) => None,
        }
    }
}

/// Module loader
///
/// Owns the module registry, the shim table and the optional host resolver.
/// All methods take `&self`; no internal lock is held while producers,
/// callbacks or the host resolver run, so they may declare, undeclare and
/// resolve on the same loader.
///
/// Resolution is single-threaded by contract. The loading stack used for cycle
/// reports is shared by every thread, so two threads resolving at once may see
/// a false [`DefineError::CyclicDependency`] or an interleaved cycle chain.
pub struct Loader {
    /// Declared modules
    registry: ModuleRegistry,
    /// Shim table
    shims: RwLock<ShimTable>,
    /// Host native resolver
    host: RwLock<Option<Arc<dyn HostResolver>>>,
    /// Root of shim lookups
    global: Object,
    /// Fail on unresolvable dependencies
    strict: AtomicBool,
    /// Stack of modules whose producers are running (for cycle reports).
    /// Shared across threads.
    loading_stack: Mutex<Vec<String>>,
}

impl Loader {
    /// Create a new loader with an empty global namespace
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building a loader
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::default()
    }

    /// Declare a module with no dependencies.
    ///
    /// ```rust
    /// use spacey_define::{Init, Loader, Value};
    ///
    /// let loader = Loader::new();
    /// loader.declare("core/loader", Init::producer(|_| Ok(Value::from("loader"))))?;
    /// assert_eq!(loader.require_value("core/loader")?, Value::from("loader"));
    /// # Ok::<(), spacey_define::DefineError>(())
    /// ```
    pub fn declare(&self, name: &str, init: impl Into<Init>) -> Result<()> {
        self.declare_with(name, std::iter::empty::<&str>(), init)
    }

    /// Declare a module with dependencies.
    ///
    /// Dependencies may be absolute (`utils/dom`) or relative to `name`
    /// (`./loader`, `../../dom`). The producer receives their values in
    /// declared order.
    pub fn declare_with<I>(&self, name: &str, dependencies: I, init: impl Into<Init>) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let dependencies: Vec<String> = dependencies
            .into_iter()
            .map(|dep| dep.as_ref().to_string())
            .collect();

        if let Some(bad) = dependencies.iter().find(|dep| name::normalize(dep).is_empty()) {
            return Err(DefineError::invalid_argument(format!(
                "Invalid dependency '{}' of module '{}'",
                bad, name
            )));
        }

        self.registry.insert(name, dependencies, init.into())?;
        debug!("Declared module {}", name::normalize(name));
        Ok(())
    }

    /// Remove a module declaration. Returns whether one was removed.
    pub fn undeclare(&self, name: &str) -> bool {
        let removed = self.registry.remove(name).is_some();
        if removed {
            debug!("Undeclared module {}", name::normalize(name));
        }
        removed
    }

    /// Resolve one or more modules.
    ///
    /// Every requested name must resolve; missing names fail with
    /// [`DefineError::ModuleNotFound`].
    pub fn resolve(&self, request: impl Into<Request>) -> Result<Resolved> {
        let request = request.into();

        if let Request::One(name) = &request {
            if let Some(value) = self.resolve_host(name)? {
                return Ok(Resolved::One(value));
            }
        }

        match request {
            Request::One(name) => self.resolve_module(&name, None).map(Resolved::One),
            Request::Many(names) => names
                .iter()
                .map(|name| self.resolve_module(name, None))
                .collect::<Result<Vec<_>>>()
                .map(Resolved::Many),
        }
    }

    /// Resolve modules and pass their values to `callback` in request order.
    pub fn resolve_with<F>(&self, request: impl Into<Request>, callback: F) -> Result<()>
    where
        F: FnOnce(&[Value]),
    {
        let values = self.resolve(request)?.into_vec();
        callback(&values);
        Ok(())
    }

    /// Resolve a single module to its value
    pub fn require_value(&self, name: &str) -> Result<Value> {
        self.resolve(name).map(Resolved::into_value)
    }

    /// Replace the shim table and/or strictness setting.
    ///
    /// Fields left as `None` keep their current value.
    pub fn configure(&self, config: Config) {
        if let Some(shim) = config.shim {
            let table = ShimTable::from_config(&shim);
            debug!("Installed {} shim entries", table.len());
            *self.shims.write() = table;
        }
        if let Some(strict) = config.strict_dependencies {
            self.strict.store(strict, Ordering::Relaxed);
        }
    }

    /// Configure from a dynamically shaped JSON value
    pub fn configure_json(&self, options: &serde_json::Value) -> Result<()> {
        self.configure(Config::from_value(options)?);
        Ok(())
    }

    /// Install the host native resolver
    pub fn set_host_resolver(&self, resolver: impl HostResolver + 'static) {
        *self.host.write() = Some(Arc::new(resolver));
    }

    /// Remove the host native resolver
    pub fn clear_host_resolver(&self) {
        *self.host.write() = None;
    }

    /// Whether a host native resolver is installed
    pub fn has_native_resolver(&self) -> bool {
        self.host.read().is_some()
    }

    /// Whether unresolvable dependencies fail instead of resolving to `undefined`
    pub fn is_strict(&self) -> bool {
        self.strict.load(Ordering::Relaxed)
    }

    /// The global namespace used as the root of shim lookups
    pub fn global(&self) -> &Object {
        &self.global
    }

    /// Check if a module is declared
    pub fn is_declared(&self, name: &str) -> bool {
        self.registry.has(name)
    }

    /// Check if a module is declared and its value is available
    pub fn is_resolved(&self, name: &str) -> bool {
        self.registry.is_resolved(name)
    }

    /// Declared module names, sorted
    pub fn declared_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Shimmed module names, sorted
    pub fn shim_names(&self) -> Vec<String> {
        self.shims.read().names()
    }

    /// Get the module registry
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Remove every declared module
    pub fn clear(&self) {
        self.registry.clear();
    }

    fn resolve_host(&self, name: &str) -> Result<Option<Value>> {
        let Some(host) = self.host.read().clone() else {
            return Ok(None);
        };

        match host.resolve(name) {
            HostResolution::Found(value) => {
                trace!("Host resolved {}", name);
                Ok(Some(value))
            }
            HostResolution::NotFound => Ok(None),
            HostResolution::Failed(reason) => {
                debug!("Host failed to resolve {}: {}", name, reason);
                Err(DefineError::module_not_found(name))
            }
        }
    }

    /// Resolve `name`. `requested_by` is the declaring module when resolving a
    /// dependency slot, `None` for a top-level request.
    fn resolve_module(&self, name: &str, requested_by: Option<&str>) -> Result<Value> {
        match self.registry.claim(name) {
            Some(Claim::Ready(value)) => {
                trace!("Module cache hit {}", name);
                Ok(value)
            }
            Some(Claim::InProgress(module)) => Err(DefineError::CyclicDependency(
                self.cycle_chain(&module),
            )),
            Some(Claim::Run {
                id,
                name: module,
                dependencies,
                producer,
            }) => self.run_producer(id, &module, &dependencies, producer),
            None => self.resolve_fallback(name, requested_by),
        }
    }

    fn run_producer(
        &self,
        id: u64,
        module: &str,
        dependencies: &[String],
        producer: Producer,
    ) -> Result<Value> {
        self.loading_stack.lock().push(module.to_string());
        let mut guard = RunGuard {
            loader: self,
            module,
            id,
            producer: Some(Arc::clone(&producer)),
        };

        let value = self.instantiate(module, dependencies, &producer)?;
        guard.producer = None;
        drop(guard);

        self.registry.finish(module, id, value.clone());
        Ok(value)
    }

    fn instantiate(&self, module: &str, dependencies: &[String], producer: &Producer) -> Result<Value> {
        let mut args = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            let dep = name::resolve_relative(module, dep);
            args.push(self.resolve_module(&dep, Some(module))?);
        }

        debug!("Initializing module {} with {} dependencies", module, args.len());
        (**producer)(&args)
    }

    fn resolve_fallback(&self, name: &str, requested_by: Option<&str>) -> Result<Value> {
        let shim = {
            let shims = self.shims.read();
            shims
                .contains(name)
                .then(|| shims.exports(name).map(str::to_string))
        };
        if let Some(exports) = shim {
            trace!("Module {} shimmed to {:?}", name, exports);
            return Ok(exports.map_or(Value::Undefined, |path| {
                lookup_path(&Value::Object(self.global.clone()), &path)
            }));
        }

        match requested_by {
            None => Err(DefineError::module_not_found(name)),
            Some(parent) if self.is_strict() => {
                debug!("Module {} requires missing dependency {}", parent, name);
                Err(DefineError::module_not_found(name))
            }
            Some(parent) => {
                trace!("Optional dependency {} of {} is undefined", name, parent);
                Ok(Value::Undefined)
            }
        }
    }

    /// Render the loading stack from the first occurrence of `module`,
    /// closing the loop: `a -> b -> a`.
    fn cycle_chain(&self, module: &str) -> String {
        let stack = self.loading_stack.lock();
        let key = name::key(module);
        let start = stack
            .iter()
            .position(|entry| name::key(entry) == key)
            .unwrap_or(stack.len());

        let mut chain: Vec<&str> = stack[start..].iter().map(String::as_str).collect();
        chain.push(module);
        chain.join(" -> ")
    }
}

/// Pops the loading stack when a producer run ends. Unless disarmed by
/// clearing `producer`, also returns the record to pending, so a failed or
/// panicking producer can run again.
struct RunGuard<'a> {
    loader: &'a Loader,
    module: &'a str,
    id: u64,
    producer: Option<Producer>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.loader.loading_stack.lock().pop();
        if let Some(producer) = self.producer.take() {
            self.loader.registry.abort(self.module, self.id, producer);
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Loader`]
#[derive(Default)]
pub struct LoaderBuilder {
    global: Option<Object>,
    host: Option<Arc<dyn HostResolver>>,
    config: Config,
}

impl LoaderBuilder {
    /// Use `global` as the root of shim lookups
    pub fn global(mut self, global: Object) -> Self {
        self.global = Some(global);
        self
    }

    /// Install a host native resolver
    pub fn host_resolver(mut self, resolver: impl HostResolver + 'static) -> Self {
        self.host = Some(Arc::new(resolver));
        self
    }

    /// Initial configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Build the loader
    pub fn build(self) -> Loader {
        let loader = Loader {
            registry: ModuleRegistry::new(),
            shims: RwLock::new(ShimTable::new()),
            host: RwLock::new(self.host),
            global: self.global.unwrap_or_default(),
            strict: AtomicBool::new(false),
            loading_stack: Mutex::new(Vec::new()),
        };
        loader.configure(self.config);
        loader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_request_conversions() {
        assert_eq!(Request::from("a"), Request::One("a".into()));
        assert_eq!(Request::from(["a"]), Request::Many(vec!["a".into()]));
        assert_eq!(Request::from(vec!["a", "b"]).names().len(), 2);
        assert_eq!(Request::from("a").names(), ["a".to_string()]);
    }

    #[test]
    fn test_resolved_accessors() {
        let one = Resolved::One(Value::from(1));
        assert_eq!(one.as_one(), Some(&Value::from(1)));
        assert_eq!(one.into_vec(), vec![Value::from(1)]);

        let many = Resolved::Many(vec![Value::from(1), Value::from(2)]);
        assert!(many.as_one().is_none());
        assert_eq!(many.into_value().as_array().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_case_insensitive_resolution() {
        let loader = Loader::new();
        loader.declare("Core/Loader", "loader").unwrap();
        assert_eq!(loader.require_value("core/LOADER").unwrap(), Value::from("loader"));
        assert!(loader.is_declared("CORE//loader"));
    }

    #[test]
    fn test_invalid_dependency_rejected() {
        let loader = Loader::new();
        let err = loader
            .declare_with("f", ["ok", " / "], Init::producer(|_| Ok(Value::Null)))
            .unwrap_err();
        assert!(matches!(err, DefineError::InvalidArgument(_)));
        assert!(!loader.is_declared("f"));
    }

    #[test]
    fn test_direct_cycle_detected() {
        let loader = Loader::new();
        loader
            .declare_with("a", ["b"], Init::producer(|_| Ok(Value::Null)))
            .unwrap();
        loader
            .declare_with("b", ["a"], Init::producer(|_| Ok(Value::Null)))
            .unwrap();

        let err = loader.resolve("a").unwrap_err();
        match err {
            DefineError::CyclicDependency(chain) => assert_eq!(chain, "a -> b -> a"),
            other => panic!("unexpected error: {other}"),
        }

        // Both records are back to pending and the stack is empty.
        assert!(!loader.is_resolved("a"));
        assert!(!loader.is_resolved("b"));
        assert!(loader.loading_stack.lock().is_empty());
    }

    #[test]
    fn test_self_dependency_detected() {
        let loader = Loader::new();
        loader
            .declare_with("pkg/self", ["./self"], Init::producer(|_| Ok(Value::Null)))
            .unwrap();
        let err = loader.resolve("pkg/self").unwrap_err();
        assert!(matches!(err, DefineError::CyclicDependency(ref c) if c == "pkg/self -> pkg/self"));
    }

    #[test]
    fn test_failed_producer_can_retry() {
        let loader = Loader::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        loader
            .declare(
                "flaky",
                Init::producer(move |_| {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(DefineError::producer("flaky", "first call fails"))
                    } else {
                        Ok(Value::from("ok"))
                    }
                }),
            )
            .unwrap();

        assert!(matches!(loader.resolve("flaky"), Err(DefineError::Producer { .. })));
        assert_eq!(loader.require_value("flaky").unwrap(), Value::from("ok"));
        assert_eq!(loader.require_value("flaky").unwrap(), Value::from("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_producer_can_retry() {
        let loader = Loader::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        loader
            .declare(
                "boom",
                Init::producer(move |_| {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        panic!("producer exploded");
                    }
                    Ok(Value::from("recovered"))
                }),
            )
            .unwrap();
        loader
            .declare_with("top", ["boom"], Init::producer(|deps| Ok(deps[0].clone())))
            .unwrap();

        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| loader.resolve("top")));
        assert!(unwound.is_err());
        assert!(loader.loading_stack.lock().is_empty());
        assert!(!loader.is_resolved("boom"));
        assert!(!loader.is_resolved("top"));

        assert_eq!(loader.require_value("top").unwrap(), Value::from("recovered"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cycle_chain_ignores_failed_runs() {
        let loader = Loader::new();
        loader
            .declare("bad", Init::producer(|_| Err(DefineError::producer("bad", "nope"))))
            .unwrap();
        loader.declare_with("a", ["b"], Init::producer(|_| Ok(Value::Null))).unwrap();
        loader.declare_with("b", ["a"], Init::producer(|_| Ok(Value::Null))).unwrap();

        assert!(loader.resolve("bad").is_err());
        let err = loader.resolve("a").unwrap_err();
        assert!(matches!(err, DefineError::CyclicDependency(ref c) if c == "a -> b -> a"));
    }

    #[test]
    fn test_dependency_failure_propagates() {
        let loader = Loader::new();
        loader
            .declare("bad", Init::producer(|_| Err(DefineError::producer("bad", "nope"))))
            .unwrap();
        loader
            .declare_with("top", ["bad"], Init::producer(|_| Ok(Value::Null)))
            .unwrap();

        assert!(matches!(
            loader.resolve("top"),
            Err(DefineError::Producer { ref module, .. }) if module == "bad"
        ));
        assert!(!loader.is_resolved("top"));
    }

    #[test]
    fn test_builder_applies_config() {
        let loader = Loader::builder()
            .config(Config::default().with_shim("lib", "Lib").strict(true))
            .build();
        assert!(loader.is_strict());
        assert_eq!(loader.shim_names(), vec!["lib"]);
        assert!(!loader.has_native_resolver());
    }

    #[test]
    fn test_configure_keeps_unset_fields() {
        let loader = Loader::new();
        loader.configure(Config::default().with_shim("lib", "Lib").strict(true));
        loader.configure(Config::default());
        assert_eq!(loader.shim_names(), vec!["lib"]);
        assert!(loader.is_strict());

        loader.configure(Config::default().with_shim("other", "Other"));
        assert_eq!(loader.shim_names(), vec!["other"]);
    }
}

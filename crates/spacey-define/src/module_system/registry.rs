// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module registry for define()

use crate::error::{DefineError, Result};
use crate::module_system::name;
use crate::value::{Object, Value};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A callable that builds a module value from its resolved dependencies.
pub type Producer = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// What a module is declared with
#[derive(Clone)]
pub enum Init {
    /// An already realized value
    Value(Value),
    /// A producer invoked on first resolution
    Producer(Producer),
}

impl Init {
    /// Wrap a closure as a producer.
    pub fn producer<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Init::Producer(Arc::new(func))
    }
}

macro_rules! init_from_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Init {
                fn from(value: $ty) -> Self {
                    Init::Value(value.into())
                }
            }
        )*
    };
}

init_from_value!(Value, bool, f64, i32, u32, &str, String, Vec<Value>, Object);

/// Resolution state of a module
#[derive(Clone)]
pub enum ModuleState {
    /// Declared with a producer that has not run yet
    Pending(Producer),
    /// The producer is currently running
    Resolving,
    /// Value is available
    Resolved(Value),
}

impl fmt::Debug for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleState::Pending(_) => write!(f, "Pending"),
            ModuleState::Resolving => write!(f, "Resolving"),
            ModuleState::Resolved(value) => f.debug_tuple("Resolved").field(value).finish(),
        }
    }
}

/// Registered module entry
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    /// Declaration id, unique per registry
    pub(crate) id: u64,
    /// Normalized name in its original case
    pub name: String,
    /// Dependency references as declared
    pub dependencies: Vec<String>,
    /// Resolution state
    pub state: ModuleState,
}

impl ModuleRecord {
    /// Whether a value is available
    pub fn is_resolved(&self) -> bool {
        matches!(self.state, ModuleState::Resolved(_))
    }
}

/// Outcome of claiming a record for resolution
pub(crate) enum Claim {
    /// The value was already available
    Ready(Value),
    /// The caller now owns the producer run and must call
    /// [`ModuleRegistry::finish`] or [`ModuleRegistry::abort`]
    Run {
        id: u64,
        name: String,
        dependencies: Vec<String>,
        producer: Producer,
    },
    /// The producer of this record is already on the stack
    InProgress(String),
}

/// Case-insensitive module registry
///
/// Records are keyed by their normalized, lower-cased name; the record keeps
/// the original case.
pub struct ModuleRegistry {
    modules: DashMap<String, ModuleRecord>,
    next_id: AtomicU64,
}

impl ModuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            modules: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Insert a new record.
    ///
    /// Fails with [`DefineError::DuplicateModule`] if the name is taken, leaving
    /// the existing record untouched.
    pub fn insert(&self, name: &str, dependencies: Vec<String>, init: Init) -> Result<()> {
        let normalized = name::normalize(name);
        if normalized.is_empty() {
            return Err(DefineError::invalid_argument(format!(
                "Invalid module name '{}'",
                name
            )));
        }

        match self.modules.entry(normalized.to_lowercase()) {
            Entry::Occupied(_) => Err(DefineError::DuplicateModule(normalized)),
            Entry::Vacant(slot) => {
                let state = match init {
                    Init::Value(value) => ModuleState::Resolved(value),
                    Init::Producer(producer) => ModuleState::Pending(producer),
                };
                slot.insert(ModuleRecord {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    name: normalized,
                    dependencies,
                    state,
                });
                Ok(())
            }
        }
    }

    /// Get a snapshot of the record for `name`
    pub fn get(&self, name: &str) -> Option<ModuleRecord> {
        self.modules.get(&name::key(name)).map(|entry| entry.clone())
    }

    /// Check if a module is declared
    pub fn has(&self, name: &str) -> bool {
        self.modules.contains_key(&name::key(name))
    }

    /// Check if a module is declared and has a value
    pub fn is_resolved(&self, name: &str) -> bool {
        self.modules
            .get(&name::key(name))
            .is_some_and(|entry| entry.is_resolved())
    }

    /// Remove a module
    pub fn remove(&self, name: &str) -> Option<ModuleRecord> {
        self.modules.remove(&name::key(name)).map(|(_, v)| v)
    }

    /// Claim a record for resolution, marking pending records as resolving.
    pub(crate) fn claim(&self, name: &str) -> Option<Claim> {
        let mut entry = self.modules.get_mut(&name::key(name))?;
        let record = entry.value_mut();

        let claim = match std::mem::replace(&mut record.state, ModuleState::Resolving) {
            ModuleState::Resolved(value) => {
                record.state = ModuleState::Resolved(value.clone());
                Claim::Ready(value)
            }
            ModuleState::Resolving => Claim::InProgress(record.name.clone()),
            ModuleState::Pending(producer) => Claim::Run {
                id: record.id,
                name: record.name.clone(),
                dependencies: record.dependencies.clone(),
                producer,
            },
        };
        Some(claim)
    }

    /// Cache a produced value.
    ///
    /// Ignored if the record was removed or redeclared since it was claimed.
    pub(crate) fn finish(&self, name: &str, id: u64, value: Value) {
        if let Some(mut entry) = self.modules.get_mut(&name::key(name)) {
            if entry.id == id {
                entry.state = ModuleState::Resolved(value);
            }
        }
    }

    /// Return a claimed record to its pending state after a failure.
    pub(crate) fn abort(&self, name: &str, id: u64, producer: Producer) {
        if let Some(mut entry) = self.modules.get_mut(&name::key(name)) {
            if entry.id == id {
                entry.state = ModuleState::Pending(producer);
            }
        }
    }

    /// Declared names in original case, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .modules
            .iter()
            .map(|entry| entry.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Remove every module
    pub fn clear(&self) {
        self.modules.clear();
    }

    /// Get the number of declared modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! The function registry.
//!
//! Builtins are fixed once the registry is built. Libraries contribute user
//! functions; whenever a library's contributions change the active table is
//! rebuilt from the builtins and every remaining library, in registration
//! order, and swapped in whole. Readers always see a complete table.

use std::sync::Arc;

use arc_swap::ArcSwap;
use im::HashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use marginalia_foundation::{Error, Result};

use crate::contract::{FunctionBody, FunctionDescriptor};

// =============================================================================
// Snapshot
// =============================================================================

/// One consistent view of the active function table.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    functions: HashMap<String, Arc<FunctionDescriptor>>,
    conflicts: Vec<String>,
}

impl Snapshot {
    /// Resolves a name or alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<FunctionDescriptor>> {
        self.functions.get(name)
    }

    /// True if the name or alias resolves.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Primary names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .functions
            .iter()
            .filter(|(key, f)| **key == f.name)
            .map(|(key, _)| key.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of names and aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Names replaced by conflict placeholders in this snapshot.
    #[must_use]
    pub fn conflicts(&self) -> &[String] {
        &self.conflicts
    }

    fn insert(&mut self, descriptor: Arc<FunctionDescriptor>) {
        for alias in &descriptor.aliases {
            self.functions.insert(alias.clone(), Arc::clone(&descriptor));
        }
        self.functions
            .insert(descriptor.name.clone(), descriptor);
    }
}

// =============================================================================
// FunctionRegistry
// =============================================================================

/// Builtins, per-library user functions, and the active table built from
/// them.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    builtins: Snapshot,
    libraries: Mutex<Vec<(String, Vec<Arc<FunctionDescriptor>>)>>,
    active: ArcSwap<Snapshot>,
}

impl FunctionRegistry {
    /// Creates a registry with nothing registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the builtin library.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for descriptor in crate::builtins::all() {
            if let Err(e) = registry.register_builtin(descriptor) {
                warn!(error = %e, "skipping builtin");
            }
        }
        registry
    }

    /// Adds a builtin.
    ///
    /// # Errors
    /// Fails if the name or an alias is taken, or if the descriptor has a
    /// user-function body.
    pub fn register_builtin(&mut self, descriptor: FunctionDescriptor) -> Result<()> {
        if !descriptor.is_builtin() {
            return Err(Error::internal(format!(
                "{} is not a builtin function",
                descriptor.name
            )));
        }
        let taken = std::iter::once(&descriptor.name)
            .chain(&descriptor.aliases)
            .find(|name| self.builtins.contains(name));
        if let Some(name) = taken {
            return Err(Error::internal(format!(
                "builtin function {name} is already registered"
            )));
        }
        self.builtins.insert(Arc::new(descriptor));
        self.rebuild(&self.libraries.lock());
        Ok(())
    }

    /// Replaces one library's user functions and rebuilds the active table.
    pub fn register_library_functions(
        &self,
        library_id: &str,
        descriptors: Vec<FunctionDescriptor>,
    ) {
        let descriptors: Vec<_> = descriptors.into_iter().map(Arc::new).collect();
        let mut libraries = self.libraries.lock();
        match libraries.iter_mut().find(|(id, _)| id == library_id) {
            Some((_, existing)) => *existing = descriptors,
            None => libraries.push((library_id.to_string(), descriptors)),
        }
        self.rebuild(&libraries);
    }

    /// Withdraws one library's user functions.
    pub fn unregister_library_functions(&self, library_id: &str) {
        let mut libraries = self.libraries.lock();
        libraries.retain(|(id, _)| id != library_id);
        self.rebuild(&libraries);
    }

    /// Withdraws every library's user functions.
    pub fn reset_to_builtins(&self) {
        let mut libraries = self.libraries.lock();
        libraries.clear();
        self.rebuild(&libraries);
    }

    /// Resolves a name or alias in the active table.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<FunctionDescriptor>> {
        self.active.load().get(name).cloned()
    }

    /// The current active table. Holding it keeps one view for a whole
    /// evaluation even if a library is loaded meanwhile.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.active.load_full()
    }

    /// The builtin table.
    #[must_use]
    pub fn builtins(&self) -> &Snapshot {
        &self.builtins
    }

    /// Ids of libraries with registered functions, in registration order.
    #[must_use]
    pub fn library_ids(&self) -> Vec<String> {
        self.libraries
            .lock()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// The functions a library registered.
    #[must_use]
    pub fn library_functions(&self, library_id: &str) -> Vec<Arc<FunctionDescriptor>> {
        self.libraries
            .lock()
            .iter()
            .find(|(id, _)| id == library_id)
            .map(|(_, functions)| functions.clone())
            .unwrap_or_default()
    }

    fn rebuild(&self, libraries: &[(String, Vec<Arc<FunctionDescriptor>>)]) {
        let mut next = self.builtins.clone();
        for (library_id, functions) in libraries {
            for incoming in functions {
                match next.get(&incoming.name) {
                    None => next.insert(Arc::clone(incoming)),
                    Some(existing) if existing.program_text == incoming.program_text => {}
                    Some(_) => {
                        warn!(
                            function = %incoming.name,
                            library = %library_id,
                            "attempt to replace formatter function with a different body"
                        );
                        if !next.conflicts.contains(&incoming.name) {
                            next.conflicts.push(incoming.name.clone());
                        }
                        next.insert(Arc::new(FunctionDescriptor::conflict_placeholder(
                            &incoming.name,
                        )));
                    }
                }
            }
        }
        debug!(
            functions = next.len(),
            libraries = libraries.len(),
            conflicts = next.conflicts.len(),
            "rebuilt function table"
        );
        self.active.store(Arc::new(next));
    }
}

/// True when two descriptors would be treated as the same function.
#[must_use]
pub fn same_function(a: &FunctionDescriptor, b: &FunctionDescriptor) -> bool {
    a.program_text == b.program_text && !matches!(a.body, FunctionBody::ConflictPlaceholder)
}

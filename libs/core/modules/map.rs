// Copyright 2018-2026 the Deno authors. MIT license.

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::modules::EvalEntryPoint;
use crate::modules::ModuleKey;
use crate::modules::ModuleLoader;
use crate::modules::ModuleRecord;
use crate::modules::ModuleSource;
use crate::modules::VirtualModuleRegistry;

/// A copy of the module-provide table taken with
/// [`JsRealm::snapshot_registry`](crate::JsRealm::snapshot_registry).
#[derive(Clone, Debug, Default)]
pub struct RegistrySnapshot(IndexMap<ModuleKey, ModuleRecord>);

impl RegistrySnapshot {
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn contains(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }
}

/// Per-realm module state: the host loader, plugin modules and every record
/// provided so far.
pub(crate) struct ModuleMap {
  pub(crate) loader: Rc<dyn ModuleLoader>,
  pub(crate) virtual_modules: VirtualModuleRegistry,
  pub(crate) eval_entry_point: Option<EvalEntryPoint>,
  registry: RefCell<IndexMap<ModuleKey, ModuleRecord>>,
  reload_count: Cell<u32>,
}

impl ModuleMap {
  pub(crate) fn new(
    loader: Rc<dyn ModuleLoader>,
    eval_entry_point: Option<EvalEntryPoint>,
  ) -> Self {
    Self {
      loader,
      virtual_modules: VirtualModuleRegistry::default(),
      eval_entry_point,
      registry: Default::default(),
      reload_count: Cell::new(0),
    }
  }

  /// Inserts a fetched module under the key it was requested with. A later
  /// fetch of the same key replaces the earlier record.
  pub(crate) fn provide(
    &self,
    key: ModuleKey,
    source: ModuleSource,
  ) -> ModuleRecord {
    let record = ModuleRecord::new(key.clone(), source);
    log::trace!("providing module \"{key}\"");
    self.registry.borrow_mut().insert(key, record.clone());
    record
  }

  pub(crate) fn get(&self, key: &str) -> Option<ModuleRecord> {
    self.registry.borrow().get(key).cloned()
  }

  pub(crate) fn len(&self) -> usize {
    self.registry.borrow().len()
  }

  /// Drops every provided module. Returns `true` when the embedder should
  /// follow up with a garbage collection, which happens every other reload.
  pub(crate) fn reload(&self) -> bool {
    self.registry.borrow_mut().clear();
    let count = self.reload_count.get().wrapping_add(1);
    self.reload_count.set(count);
    let collect = count % 2 == 0;
    log::debug!(
      "module registry reloaded (reload #{count}, collect: {collect})"
    );
    collect
  }

  pub(crate) fn reload_count(&self) -> u32 {
    self.reload_count.get()
  }

  pub(crate) fn snapshot(&self) -> RegistrySnapshot {
    RegistrySnapshot(self.registry.borrow().clone())
  }

  pub(crate) fn reset(&self, snapshot: RegistrySnapshot) {
    *self.registry.borrow_mut() = snapshot.0;
  }
}

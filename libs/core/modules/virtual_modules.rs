// Copyright 2018-2026 the Deno authors. MIT license.

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::error::JsResult;
use crate::module_specifier::is_relative_specifier;
use crate::module_specifier::resolve_import_path;
use crate::modules::ModuleKey;
use crate::values::JsValue;

/// Produces the exports of a plugin-provided module.
pub type VirtualModuleFactory = Rc<dyn Fn() -> JsResult<JsValue>>;

/// Modules registered at runtime by plugins. They are consulted before the
/// host resolver and never touch the filesystem.
#[derive(Default)]
pub struct VirtualModuleRegistry {
  modules: RefCell<HashMap<ModuleKey, VirtualModuleFactory>>,
  has_virtual_modules: Cell<bool>,
  must_do_expensive_relative_lookup: Cell<bool>,
}

impl VirtualModuleRegistry {
  /// Registers (or replaces) the module served for `specifier`.
  ///
  /// Path-like specifiers enable relative lookups, so that `./x` imported
  /// from a file next to a registered `/dir/x` finds it.
  pub fn register(
    &self,
    specifier: impl Into<ModuleKey>,
    factory: VirtualModuleFactory,
  ) {
    let specifier = specifier.into();
    if Path::new(specifier.as_str()).is_absolute() {
      self.must_do_expensive_relative_lookup.set(true);
    }
    log::debug!("registered virtual module \"{specifier}\"");
    self.modules.borrow_mut().insert(specifier, factory);
    self.has_virtual_modules.set(true);
  }

  pub fn unregister(&self, specifier: &str) -> bool {
    let mut modules = self.modules.borrow_mut();
    let removed = modules.remove(specifier).is_some();
    if modules.is_empty() {
      self.has_virtual_modules.set(false);
      self.must_do_expensive_relative_lookup.set(false);
    }
    removed
  }

  pub fn has_virtual_modules(&self) -> bool {
    self.has_virtual_modules.get()
  }

  pub fn must_do_expensive_relative_lookup(&self) -> bool {
    self.must_do_expensive_relative_lookup.get()
  }

  pub fn len(&self) -> usize {
    self.modules.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.borrow().is_empty()
  }

  /// Returns the key of the virtual module `specifier` names, if any.
  /// Must only be called while modules are registered.
  pub fn resolve_virtual_module(
    &self,
    specifier: &str,
    referrer: &str,
  ) -> Option<ModuleKey> {
    debug_assert!(self.has_virtual_modules());
    let modules = self.modules.borrow();
    if let Some((key, _)) = modules.get_key_value(specifier) {
      return Some(key.clone());
    }

    if !self.must_do_expensive_relative_lookup.get()
      || !is_relative_specifier(specifier)
      || referrer.is_empty()
    {
      return None;
    }
    let joined = resolve_import_path(specifier, referrer).ok()?;
    modules
      .get_key_value(joined.as_str())
      .map(|(key, _)| key.clone())
  }

  pub fn get(&self, key: &str) -> Option<VirtualModuleFactory> {
    if !self.has_virtual_modules() {
      return None;
    }
    self.modules.borrow().get(key).cloned()
  }
}

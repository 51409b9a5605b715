// Copyright 2018-2026 the Deno authors. MIT license.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::JsResult;
use crate::runtime::JsRealm;
use crate::values::JsValue;

/// Native functions the host attaches as promise reactions.
///
/// The module evaluator dispatches the two entry point variants itself; the
/// host dispatches the rest through [`JsRealm::run_promise_handler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromiseFunction {
  OnResolveEntryPointResult,
  OnRejectEntryPointResult,
  OnLoadObjectResultResolve,
  OnLoadObjectResultReject,
  PluginsOnResolve,
  PluginsOnReject,
  TestScopeOnResolve,
  TestScopeOnReject,
}

impl PromiseFunction {
  pub const ALL: [PromiseFunction; 8] = [
    PromiseFunction::OnResolveEntryPointResult,
    PromiseFunction::OnRejectEntryPointResult,
    PromiseFunction::OnLoadObjectResultResolve,
    PromiseFunction::OnLoadObjectResultReject,
    PromiseFunction::PluginsOnResolve,
    PromiseFunction::PluginsOnReject,
    PromiseFunction::TestScopeOnResolve,
    PromiseFunction::TestScopeOnReject,
  ];

  pub const fn name(self) -> &'static str {
    match self {
      PromiseFunction::OnResolveEntryPointResult => "onResolveEntryPointResult",
      PromiseFunction::OnRejectEntryPointResult => "onRejectEntryPointResult",
      PromiseFunction::OnLoadObjectResultResolve => "onLoadObjectResultResolve",
      PromiseFunction::OnLoadObjectResultReject => "onLoadObjectResultReject",
      PromiseFunction::PluginsOnResolve => "pluginsOnResolve",
      PromiseFunction::PluginsOnReject => "pluginsOnReject",
      PromiseFunction::TestScopeOnResolve => "testScopeOnResolve",
      PromiseFunction::TestScopeOnReject => "testScopeOnReject",
    }
  }
}

const fn str_eq(a: &str, b: &str) -> bool {
  let (a, b) = (a.as_bytes(), b.as_bytes());
  if a.len() != b.len() {
    return false;
  }
  let mut i = 0;
  while i < a.len() {
    if a[i] != b[i] {
      return false;
    }
    i += 1;
  }
  true
}

const fn all_names_unique() -> bool {
  let all = PromiseFunction::ALL;
  let mut i = 0;
  while i < all.len() {
    let mut j = i + 1;
    while j < all.len() {
      if str_eq(all[i].name(), all[j].name()) {
        return false;
      }
      j += 1;
    }
    i += 1;
  }
  true
}

const _: () = assert!(all_names_unique(), "duplicate promise function");

pub type PromiseHandlerFn = dyn Fn(&JsRealm, &JsValue) -> JsResult<()>;

#[derive(Default)]
pub(crate) struct PromiseHandlerTable {
  handlers: HashMap<PromiseFunction, Rc<PromiseHandlerFn>>,
}

#[derive(Debug, thiserror::Error, deno_error::JsError)]
pub enum PromiseHandlerError {
  #[class(type)]
  #[error("Promise handler \"{}\" is already registered", .0.name())]
  Duplicate(PromiseFunction),
}

impl JsRealm {
  pub fn register_promise_handler(
    &self,
    function: PromiseFunction,
    handler: Rc<PromiseHandlerFn>,
  ) -> Result<(), PromiseHandlerError> {
    let mut table = self.state().promise_handlers.borrow_mut();
    if table.handlers.contains_key(&function) {
      return Err(PromiseHandlerError::Duplicate(function));
    }
    log::trace!("registered promise handler {}", function.name());
    table.handlers.insert(function, handler);
    Ok(())
  }

  /// Calls the handler registered for `function`. Returns `false` when there
  /// is none.
  pub fn run_promise_handler(
    &self,
    function: PromiseFunction,
    value: &JsValue,
  ) -> JsResult<bool> {
    let handler = self
      .state()
      .promise_handlers
      .borrow()
      .handlers
      .get(&function)
      .cloned();
    match handler {
      Some(handler) => {
        handler(self, value)?;
        Ok(true)
      }
      None => Ok(false),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use super::*;
  use crate::runtime::JsRuntime;

  #[test]
  fn duplicate_registration_is_rejected() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.main_realm();
    let handler: Rc<PromiseHandlerFn> =
      Rc::new(|_realm: &JsRealm, _value: &JsValue| Ok(()));
    realm
      .register_promise_handler(
        PromiseFunction::PluginsOnResolve,
        handler.clone(),
      )
      .unwrap();
    let err = realm
      .register_promise_handler(PromiseFunction::PluginsOnResolve, handler)
      .unwrap_err();
    assert_eq!(
      err.to_string(),
      "Promise handler \"pluginsOnResolve\" is already registered"
    );
  }

  #[test]
  fn runs_registered_handler() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.main_realm();
    let seen = Rc::new(RefCell::new(None));
    let handler: Rc<PromiseHandlerFn> = {
      let seen = seen.clone();
      Rc::new(move |_realm: &JsRealm, value: &JsValue| {
        *seen.borrow_mut() = Some(value.to_display_string());
        Ok(())
      })
    };
    realm
      .register_promise_handler(PromiseFunction::TestScopeOnResolve, handler)
      .unwrap();

    let ran = realm
      .run_promise_handler(PromiseFunction::TestScopeOnResolve, &"ok".into())
      .unwrap();
    assert!(ran);
    assert_eq!(seen.borrow().as_deref(), Some("ok"));
    let ran = realm
      .run_promise_handler(PromiseFunction::TestScopeOnReject, &"no".into())
      .unwrap();
    assert!(!ran);
  }
}

// Copyright 2018-2026 the Deno authors. MIT license.

use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use super::engine::NoopScriptEngine;
use super::engine::ScriptEngine;
use super::jsrealm::ContextState;
use super::jsrealm::JsRealm;
use super::jsrealm::JsRealmInner;
use super::jsrealm::UnhandledErrorCb;
use crate::modules::EvalEntryPoint;
use crate::modules::ModuleLoader;
use crate::modules::ModuleMap;
use crate::modules::NoopModuleLoader;
use crate::source_map::SourceRemapper;

/// A thread-safe handle used to stop script execution, shared by every realm
/// of a runtime.
#[derive(Clone, Debug, Default)]
pub struct TerminationHandle(Arc<AtomicBool>);

impl TerminationHandle {
  /// Requests termination. Resolution, fetch continuations, evaluation and
  /// stack formatting all stop at their next check.
  pub fn terminate_execution(&self) {
    log::debug!("terminating execution");
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn cancel_terminate_execution(&self) {
    self.0.store(false, Ordering::SeqCst);
  }

  pub fn is_execution_terminating(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}

#[derive(Default)]
pub struct RuntimeOptions {
  /// Implementation of `ModuleLoader` which will be called to resolve and
  /// load modules in the main realm.
  ///
  /// If not provided runtime will error if code being
  /// executed tries to load modules.
  pub module_loader: Option<Rc<dyn ModuleLoader>>,

  /// The engine reporting stack frames and evaluating modules. Defaults to
  /// [`NoopScriptEngine`].
  pub script_engine: Option<Rc<dyn ScriptEngine>>,

  /// Maps generated positions back to original sources when stack traces
  /// of the main realm are rendered.
  pub source_remapper: Option<Rc<dyn SourceRemapper>>,

  /// Initial `Error.stackTraceLimit`. Defaults to 10.
  pub stack_trace_limit: Option<usize>,

  /// Makes the main realm an eval context: the result of evaluating this
  /// module is recorded and reported to the entry point promise handlers.
  pub eval_entry_point: Option<String>,

  /// Receives exceptions thrown by microtasks and next-tick callbacks. When
  /// not provided they are logged.
  pub unhandled_error_cb: Option<Rc<UnhandledErrorCb>>,
}

#[derive(Default)]
pub struct CreateRealmOptions {
  /// Implementation of `ModuleLoader` which will be
  /// called to load modules in the realm.
  ///
  /// If not provided, there will be an error if code being
  /// executed tries to load modules from the realm.
  pub module_loader: Option<Rc<dyn ModuleLoader>>,

  /// A source remapper for this realm's own sources. Realms never inherit
  /// the runtime's remapper, so frames of a nested context are only
  /// remapped against its own source maps.
  pub source_remapper: Option<Rc<dyn SourceRemapper>>,

  pub eval_entry_point: Option<String>,
}

/// Owns the main realm and the collaborators shared with every realm it
/// creates.
pub struct JsRuntime {
  main_realm: JsRealm,
  engine: Rc<dyn ScriptEngine>,
  termination: TerminationHandle,
  stack_trace_limit: Option<usize>,
  unhandled_error_cb: Option<Rc<UnhandledErrorCb>>,
}

impl JsRuntime {
  pub fn new(options: RuntimeOptions) -> Self {
    let engine = options
      .script_engine
      .unwrap_or_else(|| Rc::new(NoopScriptEngine));
    let termination = TerminationHandle::default();
    let main_realm = Self::make_realm(
      engine.clone(),
      termination.clone(),
      options.stack_trace_limit,
      options.unhandled_error_cb.clone(),
      options.module_loader,
      options.source_remapper,
      options.eval_entry_point,
    );
    Self {
      main_realm,
      engine,
      termination,
      stack_trace_limit: options.stack_trace_limit,
      unhandled_error_cb: options.unhandled_error_cb,
    }
  }

  fn make_realm(
    engine: Rc<dyn ScriptEngine>,
    termination: TerminationHandle,
    stack_trace_limit: Option<usize>,
    unhandled_error_cb: Option<Rc<UnhandledErrorCb>>,
    module_loader: Option<Rc<dyn ModuleLoader>>,
    source_remapper: Option<Rc<dyn SourceRemapper>>,
    eval_entry_point: Option<String>,
  ) -> JsRealm {
    let loader = module_loader.unwrap_or_else(|| Rc::new(NoopModuleLoader));
    let eval_entry_point = eval_entry_point.map(EvalEntryPoint::new);
    let realm = JsRealm::new(JsRealmInner {
      state: ContextState::new(stack_trace_limit, unhandled_error_cb),
      module_map: ModuleMap::new(loader, eval_entry_point),
      engine,
      source_remapper,
      termination,
    });
    log::debug!("created realm {:?}", realm.context_id());
    realm
  }

  pub fn main_realm(&self) -> JsRealm {
    self.main_realm.clone()
  }

  /// Creates a new realm, e.g. for a `node:vm` context. It shares this
  /// runtime's engine and termination handle but has its own module
  /// registry, stack trace hooks and microtask queues.
  pub fn create_realm(&self, options: CreateRealmOptions) -> JsRealm {
    Self::make_realm(
      self.engine.clone(),
      self.termination.clone(),
      self.stack_trace_limit,
      self.unhandled_error_cb.clone(),
      options.module_loader,
      options.source_remapper,
      options.eval_entry_point,
    )
  }

  pub fn termination_handle(&self) -> TerminationHandle {
    self.termination.clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn termination_handle_is_shared() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.create_realm(Default::default());
    assert_ne!(realm.context_id(), runtime.main_realm().context_id());

    let handle = runtime.termination_handle();
    assert!(!realm.termination_handle().is_execution_terminating());
    handle.terminate_execution();
    assert!(realm.termination_handle().is_execution_terminating());
    assert!(runtime.main_realm().check_termination().is_err());
    handle.cancel_terminate_execution();
    assert!(realm.check_termination().is_ok());
  }

  #[test]
  fn termination_handle_crosses_threads() {
    let handle = TerminationHandle::default();
    let remote = handle.clone();
    std::thread::spawn(move || remote.terminate_execution())
      .join()
      .unwrap();
    assert!(handle.is_execution_terminating());
  }

  #[test]
  fn stack_trace_limit_option() {
    let runtime = JsRuntime::new(RuntimeOptions {
      stack_trace_limit: Some(3),
      ..Default::default()
    });
    assert_eq!(runtime.main_realm().stack_trace_limit(), 3);
    let default = JsRuntime::new(Default::default());
    assert_eq!(default.main_realm().stack_trace_limit(), 10);
  }
}

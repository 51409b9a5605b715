// Copyright 2018-2026 the Deno authors. MIT license.

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use deno_error::JsErrorClass;
use once_cell::unsync::OnceCell;

use super::engine::ScriptEngine;
use super::jsruntime::TerminationHandle;
use super::microtask::Microtask;
use super::next_tick::MicrotaskTickHook;
use super::next_tick::NextTickQueue;
use super::promise_handlers::PromiseHandlerTable;
use crate::error::Exception;
use crate::error::ExecutionTerminated;
use crate::error::JsError;
use crate::modules::ModuleKey;
use crate::modules::ModuleMap;
use crate::modules::ModuleRecord;
use crate::modules::RegistrySnapshot;
use crate::modules::VirtualModuleFactory;
use crate::source_map::SourceRemapper;
use crate::stack_trace::DEFAULT_STACK_TRACE_LIMIT;
use crate::values::ErrorType;
use crate::values::JsObject;
use crate::values::JsValue;

/// Called with every exception thrown by a microtask or next-tick callback
/// that nothing caught.
pub type UnhandledErrorCb = dyn Fn(&JsRealm, &JsValue);

/// Identifies a realm. Frames and errors remember the realm they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u32);

impl ContextId {
  pub fn next() -> Self {
    static NEXT_CONTEXT_ID: AtomicU32 = AtomicU32::new(1);
    ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
  }
}

pub struct ContextState {
  pub(crate) id: ContextId,
  /// The realm's `Error` constructor. Script may put a plain
  /// `prepareStackTrace` property on it.
  pub(crate) error_constructor: JsObject,
  pub(crate) stack_trace_limit: Cell<usize>,
  /// Written through the `Error.prepareStackTrace` accessor.
  pub(crate) prepare_stack_trace: RefCell<Option<JsValue>>,
  pub(crate) default_prepare_stack_trace: OnceCell<JsObject>,
  pub(crate) inside_prepare_stack_trace: Cell<bool>,
  pub(crate) microtasks: RefCell<VecDeque<Microtask>>,
  pub(crate) next_tick_queue: OnceCell<NextTickQueue>,
  pub(crate) draining_next_tick_queue: Cell<bool>,
  pub(crate) tick_hook: Cell<MicrotaskTickHook>,
  pub(crate) async_context: RefCell<JsValue>,
  pub(crate) async_context_needs_cleanup: Cell<bool>,
  pub(crate) promise_handlers: RefCell<PromiseHandlerTable>,
  pub(crate) unhandled_error_cb: Option<Rc<UnhandledErrorCb>>,
}

impl ContextState {
  pub(crate) fn new(
    stack_trace_limit: Option<usize>,
    unhandled_error_cb: Option<Rc<UnhandledErrorCb>>,
  ) -> Self {
    Self {
      id: ContextId::next(),
      error_constructor: JsObject::new_function(|_this, _args| {
        Ok(JsValue::Undefined)
      }),
      stack_trace_limit: Cell::new(
        stack_trace_limit.unwrap_or(DEFAULT_STACK_TRACE_LIMIT),
      ),
      prepare_stack_trace: Default::default(),
      default_prepare_stack_trace: Default::default(),
      inside_prepare_stack_trace: Default::default(),
      microtasks: Default::default(),
      next_tick_queue: Default::default(),
      draining_next_tick_queue: Default::default(),
      tick_hook: Cell::new(MicrotaskTickHook::CheckNextTick),
      async_context: Default::default(),
      async_context_needs_cleanup: Default::default(),
      promise_handlers: Default::default(),
      unhandled_error_cb,
    }
  }
}

/// A JavaScript realm: its own globals, module registry, stack trace
/// configuration and microtask queues, running on the engine and termination
/// handle of the [`JsRuntime`](super::JsRuntime) that created it.
///
/// A [`JsRealm`] is a reference; cloning it only creates a new reference to
/// the same realm.
#[derive(Clone)]
pub struct JsRealm(pub(crate) Rc<JsRealmInner>);

pub(crate) struct JsRealmInner {
  pub(crate) state: ContextState,
  pub(crate) module_map: ModuleMap,
  pub(crate) engine: Rc<dyn ScriptEngine>,
  pub(crate) source_remapper: Option<Rc<dyn SourceRemapper>>,
  pub(crate) termination: TerminationHandle,
}

impl JsRealm {
  pub(crate) fn new(inner: JsRealmInner) -> Self {
    Self(Rc::new(inner))
  }

  pub fn context_id(&self) -> ContextId {
    self.0.state.id
  }

  pub(crate) fn state(&self) -> &ContextState {
    &self.0.state
  }

  pub(crate) fn module_map(&self) -> &ModuleMap {
    &self.0.module_map
  }

  pub(crate) fn engine(&self) -> &dyn ScriptEngine {
    &*self.0.engine
  }

  pub(crate) fn source_remapper(&self) -> Option<&Rc<dyn SourceRemapper>> {
    self.0.source_remapper.as_ref()
  }

  pub fn ptr_eq(&self, other: &JsRealm) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }

  /// The realm's `Error` constructor object.
  pub fn error_constructor(&self) -> JsObject {
    self.0.state.error_constructor.clone()
  }

  pub fn termination_handle(&self) -> TerminationHandle {
    self.0.termination.clone()
  }

  pub(crate) fn check_termination(&self) -> Result<(), ExecutionTerminated> {
    if self.0.termination.is_execution_terminating() {
      log::trace!("execution terminated in realm {:?}", self.context_id());
      Err(ExecutionTerminated)
    } else {
      Ok(())
    }
  }

  /// A thrown `TypeError` carrying the current frames.
  pub fn type_error(&self, message: impl AsRef<str>) -> Exception {
    Exception::Thrown(self.new_error(ErrorType::TypeError, message).into())
  }

  /// Converts a host error into a script exception. The error class becomes
  /// the constructor when it names a built-in error, and the `name`
  /// otherwise.
  pub fn exception_from_error(&self, err: &dyn JsErrorClass) -> Exception {
    let class = err.get_class();
    let message = err.get_message();
    log::debug!("throwing {class}: {message}");
    let error =
      self.new_error_with_name(ErrorType::from_class(&class), &class, message);
    Exception::Thrown(error.into())
  }

  /// Reports an exception nothing caught, through the unhandled error
  /// callback when one is installed.
  pub(crate) fn report_unhandled_error(&self, exception: &JsValue) {
    if let Some(cb) = self.0.state.unhandled_error_cb.clone() {
      cb(self, exception);
      return;
    }
    match JsError::from_exception(self, exception) {
      Ok(js_error) => log::error!("{js_error}"),
      Err(ExecutionTerminated) => {
        log::error!("Uncaught {}", exception.to_display_string())
      }
    }
  }

  pub fn register_virtual_module(
    &self,
    specifier: impl Into<ModuleKey>,
    factory: VirtualModuleFactory,
  ) {
    self
      .module_map()
      .virtual_modules
      .register(specifier, factory);
  }

  pub fn unregister_virtual_module(&self, specifier: &str) -> bool {
    self.module_map().virtual_modules.unregister(specifier)
  }

  /// The record provided for `key`, if it was fetched.
  pub fn get_module(&self, key: &str) -> Option<ModuleRecord> {
    self.module_map().get(key)
  }

  pub fn module_count(&self) -> usize {
    self.module_map().len()
  }

  /// Clears the module registry. Returns `true` when the embedder should
  /// run a garbage collection afterwards.
  pub fn reload(&self) -> bool {
    self.module_map().reload()
  }

  pub fn reload_count(&self) -> u32 {
    self.module_map().reload_count()
  }

  pub fn snapshot_registry(&self) -> RegistrySnapshot {
    self.module_map().snapshot()
  }

  pub fn reset_registry(&self, snapshot: RegistrySnapshot) {
    self.module_map().reset(snapshot)
  }

  /// The last value recorded for the eval entry point, if this realm has
  /// one.
  pub fn entry_point_result(&self) -> Option<JsValue> {
    self
      .module_map()
      .eval_entry_point
      .as_ref()
      .and_then(|entry_point| entry_point.result())
  }
}

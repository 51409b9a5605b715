// Copyright 2018-2026 the Deno authors. MIT license.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::Exception;
use crate::error::ExecutionTerminated;
use crate::error::JsResult;
use crate::runtime::JsRealm;
use crate::values::JsFunction;
use crate::values::JsValue;

/// What runs after every microtask of a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicrotaskTickHook {
  None,
  /// Drains the next-tick queue as soon as one exists.
  CheckNextTick,
  /// Clears the async context before applying the next-tick logic.
  CleanupAsyncContext,
}

struct Tick {
  callback: JsFunction,
  args: Vec<JsValue>,
  async_context: JsValue,
}

/// The `process.nextTick` queue. Created for a realm the first time a
/// callback is scheduled.
#[derive(Default)]
pub(crate) struct NextTickQueue {
  ticks: RefCell<VecDeque<Tick>>,
}

impl NextTickQueue {
  fn pop(&self) -> Option<Tick> {
    self.ticks.borrow_mut().pop_front()
  }

  fn is_empty(&self) -> bool {
    self.ticks.borrow().is_empty()
  }
}

impl JsRealm {
  /// `process.nextTick(callback, ...args)`.
  pub fn queue_next_tick(
    &self,
    callback: &JsValue,
    args: Vec<JsValue>,
  ) -> JsResult<()> {
    let Some(callback) = callback.as_function() else {
      return Err(self.type_error(
        "The \"callback\" argument must be of type function",
      ));
    };
    let queue = self.state().next_tick_queue.get_or_init(|| {
      log::trace!("creating next tick queue for {:?}", self.context_id());
      Default::default()
    });
    queue.ticks.borrow_mut().push_back(Tick {
      callback,
      args,
      async_context: self.async_context(),
    });
    Ok(())
  }

  pub fn has_next_tick_queue(&self) -> bool {
    self.state().next_tick_queue.get().is_some()
  }

  pub fn microtask_tick_hook(&self) -> MicrotaskTickHook {
    self.state().tick_hook.get()
  }

  /// Selects the hook for the following microtask ticks.
  pub(crate) fn reset_on_each_microtask_tick(&self) {
    let state = self.state();
    let hook = if state.async_context_needs_cleanup.get() {
      MicrotaskTickHook::CleanupAsyncContext
    } else if self.has_next_tick_queue() {
      MicrotaskTickHook::None
    } else {
      MicrotaskTickHook::CheckNextTick
    };
    state.tick_hook.set(hook);
  }

  pub(crate) fn on_each_microtask_tick(
    &self,
  ) -> Result<(), ExecutionTerminated> {
    match self.microtask_tick_hook() {
      MicrotaskTickHook::None => Ok(()),
      MicrotaskTickHook::CheckNextTick => self.check_next_tick(),
      MicrotaskTickHook::CleanupAsyncContext => self.cleanup_async_context(),
    }
  }

  fn check_next_tick(&self) -> Result<(), ExecutionTerminated> {
    if !self.has_next_tick_queue() {
      return Ok(());
    }
    self.reset_on_each_microtask_tick();
    self.drain_next_tick_queue()
  }

  fn cleanup_async_context(&self) -> Result<(), ExecutionTerminated> {
    let state = self.state();
    *state.async_context.borrow_mut() = JsValue::Undefined;
    state.async_context_needs_cleanup.set(false);
    self.reset_on_each_microtask_tick();
    if self.has_next_tick_queue() {
      self.drain_next_tick_queue()?;
    }
    Ok(())
  }

  /// Runs everything that is queued: next-tick callbacks when a next-tick
  /// queue exists, otherwise the microtask queue.
  pub fn drain_microtasks(&self) -> Result<(), ExecutionTerminated> {
    if self.has_next_tick_queue() {
      self.drain_next_tick_queue()
    } else {
      self.perform_microtask_checkpoint()
    }
  }

  /// Runs queued ticks in order, then the microtasks they queued, until both
  /// queues are empty. Ticks scheduled while draining run in the same drain.
  fn drain_next_tick_queue(&self) -> Result<(), ExecutionTerminated> {
    let state = self.state();
    let Some(queue) = state.next_tick_queue.get() else {
      return Ok(());
    };
    // A microtask run by this drain may hit the tick hook again.
    if state.draining_next_tick_queue.replace(true) {
      return Ok(());
    }
    let _guard = scopeguard::guard(&state.draining_next_tick_queue, |flag| {
      flag.set(false)
    });

    loop {
      while let Some(tick) = queue.pop() {
        self.check_termination()?;
        match self.run_with_async_context(
          tick.async_context,
          &tick.callback,
          &tick.args,
        ) {
          Ok(_) => {}
          Err(Exception::Terminated) => return Err(ExecutionTerminated),
          Err(Exception::Thrown(exception)) => {
            self.report_unhandled_error(&exception)
          }
        }
      }
      self.perform_microtask_checkpoint()?;
      if queue.is_empty() && !self.has_pending_microtasks() {
        return Ok(());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;
  use std::cell::RefCell;
  use std::rc::Rc;

  use super::*;
  use crate::runtime::JsRuntime;
  use crate::runtime::RuntimeOptions;
  use crate::values::JsObject;

  fn recorder(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> JsValue {
    let log = log.clone();
    JsObject::new_function(move |_this, args| {
      let suffix = args
        .first()
        .map(|arg| format!(":{}", arg.to_display_string()))
        .unwrap_or_default();
      log.borrow_mut().push(format!("{name}{suffix}"));
      Ok(JsValue::Undefined)
    })
    .into()
  }

  #[test]
  fn hook_selection() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.main_realm();
    assert_eq!(realm.microtask_tick_hook(), MicrotaskTickHook::CheckNextTick);

    let log = Rc::new(RefCell::new(vec![]));
    realm.queue_next_tick(&recorder(&log, "tick"), vec![]).unwrap();
    realm.reset_on_each_microtask_tick();
    assert_eq!(realm.microtask_tick_hook(), MicrotaskTickHook::None);

    realm.request_async_context_cleanup();
    assert_eq!(
      realm.microtask_tick_hook(),
      MicrotaskTickHook::CleanupAsyncContext
    );
  }

  #[test]
  fn next_tick_requires_a_function() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.main_realm();
    assert!(realm.queue_next_tick(&JsValue::Null, vec![]).is_err());
    assert!(!realm.has_next_tick_queue());
  }

  #[test]
  fn first_microtask_tick_drains_next_ticks() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.main_realm();
    let log = Rc::new(RefCell::new(vec![]));

    realm.queue_microtask(&recorder(&log, "microtask")).unwrap();
    realm.queue_next_tick(&recorder(&log, "tick"), vec![]).unwrap();
    realm.perform_microtask_checkpoint().unwrap();

    assert_eq!(*log.borrow(), vec!["microtask", "tick"]);
    assert_eq!(realm.microtask_tick_hook(), MicrotaskTickHook::None);
  }

  #[test]
  fn cleanup_async_context_clears_context() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.main_realm();
    let log = Rc::new(RefCell::new(vec![]));

    realm.set_async_context(JsValue::from("ctx"));
    realm.queue_microtask(&recorder(&log, "microtask")).unwrap();
    realm.set_async_context(JsValue::Undefined);
    realm.request_async_context_cleanup();
    realm.set_async_context(JsValue::from("leaked"));
    realm.perform_microtask_checkpoint().unwrap();

    assert!(realm.async_context().is_undefined());
    assert_eq!(realm.microtask_tick_hook(), MicrotaskTickHook::CheckNextTick);
  }

  #[test]
  fn thrown_tick_is_reported_and_drain_continues() {
    let reported = Rc::new(RefCell::new(vec![]));
    let runtime = JsRuntime::new(RuntimeOptions {
      unhandled_error_cb: Some({
        let reported = reported.clone();
        Rc::new(move |_realm: &JsRealm, exception: &JsValue| {
          reported.borrow_mut().push(exception.to_display_string());
        })
      }),
      ..Default::default()
    });
    let realm = runtime.main_realm();
    let log = Rc::new(RefCell::new(vec![]));
    let thrower = JsObject::new_function(|_this, _args| {
      Err(Exception::Thrown(JsValue::from("boom")))
    });

    realm.queue_next_tick(&thrower.into(), vec![]).unwrap();
    realm.queue_next_tick(&recorder(&log, "after"), vec![]).unwrap();
    realm.drain_microtasks().unwrap();

    assert_eq!(*reported.borrow(), vec!["boom"]);
    assert_eq!(*log.borrow(), vec!["after"]);
  }

  #[test]
  fn drain_microtasks_without_next_tick_queue() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.main_realm();
    let log = Rc::new(RefCell::new(vec![]));
    realm.queue_microtask(&recorder(&log, "microtask")).unwrap();
    realm.drain_microtasks().unwrap();
    assert_eq!(*log.borrow(), vec!["microtask"]);
    assert!(!realm.has_next_tick_queue());
  }

  #[test]
  fn nested_ticks_run_before_microtasks() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.main_realm();
    let log = Rc::new(RefCell::new(vec![]));
    let record = |name: &'static str| -> JsValue {
      let log = log.clone();
      JsObject::new_function(move |_this, _args| {
        log.borrow_mut().push(name);
        Ok(JsValue::Undefined)
      })
      .into()
    };

    let weak = Rc::downgrade(&realm.0);
    let nested_tick = record("c");
    let microtask = record("microtask");
    let scheduler = {
      let log = log.clone();
      JsObject::new_function(move |_this, _args| {
        log.borrow_mut().push("a");
        let realm = JsRealm(weak.upgrade().unwrap());
        realm.queue_microtask(&microtask)?;
        realm.queue_next_tick(&nested_tick, vec![])?;
        Ok(JsValue::Undefined)
      })
    };
    realm.queue_next_tick(&scheduler.into(), vec![]).unwrap();
    realm.queue_next_tick(&record("b"), vec![]).unwrap();

    realm.drain_microtasks().unwrap();
    assert_eq!(*log.borrow(), vec!["a", "b", "c", "microtask"]);
    assert!(!realm.has_pending_microtasks());
  }

  #[test]
  fn termination_aborts_drain() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.main_realm();
    let handle = runtime.termination_handle();
    let ran = Rc::new(Cell::new(false));
    let terminate = {
      let handle = handle.clone();
      JsObject::new_function(move |_this, _args| {
        handle.terminate_execution();
        Err(Exception::Terminated)
      })
    };
    let after = {
      let ran = ran.clone();
      JsObject::new_function(move |_this, _args| {
        ran.set(true);
        Ok(JsValue::Undefined)
      })
    };
    realm.queue_next_tick(&terminate.into(), vec![]).unwrap();
    realm.queue_next_tick(&after.into(), vec![]).unwrap();

    assert!(realm.drain_microtasks().is_err());
    assert!(!ran.get());

    // The remaining tick runs once execution may continue.
    handle.cancel_terminate_execution();
    realm.drain_microtasks().unwrap();
    assert!(ran.get());
  }

  #[test]
  fn tick_arguments_and_async_context() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.main_realm();
    let seen = Rc::new(RefCell::new(vec![]));
    let weak = Rc::downgrade(&realm.0);
    let callback = {
      let seen = seen.clone();
      JsObject::new_function(move |_this, args| {
        let realm = JsRealm(weak.upgrade().unwrap());
        seen.borrow_mut().push(format!(
          "{} {}",
          args[0].to_display_string(),
          realm.async_context().to_display_string()
        ));
        Ok(JsValue::Undefined)
      })
    };
    realm.set_async_context("ctx".into());
    realm
      .queue_next_tick(&callback.into(), vec![JsValue::from(1.0)])
      .unwrap();
    realm.set_async_context(JsValue::Undefined);
    realm.drain_microtasks().unwrap();
    assert_eq!(*seen.borrow(), vec!["1 ctx"]);
    assert!(realm.async_context().is_undefined());
  }
}

// Copyright 2018-2026 the Deno authors. MIT license.

use crate::error::Exception;
use crate::error::ExecutionTerminated;
use crate::error::JsResult;
use crate::runtime::JsRealm;
use crate::values::JsFunction;
use crate::values::JsValue;

pub(crate) struct Microtask {
  callback: JsFunction,
  args: Vec<JsValue>,
  async_context: JsValue,
}

impl JsRealm {
  /// `queueMicrotask(callback)`.
  pub fn queue_microtask(&self, callback: &JsValue) -> JsResult<()> {
    self.queue_microtask_with_args(callback, vec![])
  }

  pub fn queue_microtask_with_args(
    &self,
    callback: &JsValue,
    args: Vec<JsValue>,
  ) -> JsResult<()> {
    let Some(callback) = callback.as_function() else {
      return Err(self.type_error(
        "The \"callback\" argument must be of type function",
      ));
    };
    self.state().microtasks.borrow_mut().push_back(Microtask {
      callback,
      args,
      async_context: self.async_context(),
    });
    Ok(())
  }

  pub fn has_pending_microtasks(&self) -> bool {
    !self.state().microtasks.borrow().is_empty()
  }

  /// The async context mapping active for the code currently running.
  pub fn async_context(&self) -> JsValue {
    self.state().async_context.borrow().clone()
  }

  pub fn set_async_context(&self, value: JsValue) {
    *self.state().async_context.borrow_mut() = value;
  }

  /// Asks for the async context to be cleared once the current microtask
  /// finishes.
  pub fn request_async_context_cleanup(&self) {
    self.state().async_context_needs_cleanup.set(true);
    self.reset_on_each_microtask_tick();
  }

  /// Runs `callback` with `async_context` installed, restoring the previous
  /// context afterwards.
  pub(crate) fn run_with_async_context(
    &self,
    async_context: JsValue,
    callback: &JsFunction,
    args: &[JsValue],
  ) -> JsResult<JsValue> {
    let previous = self.state().async_context.replace(async_context);
    let _restore = scopeguard::guard(previous, |previous| {
      self.set_async_context(previous);
    });
    callback.call(&JsValue::Undefined, args)
  }

  /// Runs queued microtasks until the queue is empty. Microtasks queued while
  /// draining run in the same checkpoint.
  pub fn perform_microtask_checkpoint(
    &self,
  ) -> Result<(), ExecutionTerminated> {
    loop {
      self.check_termination()?;
      let Some(microtask) = self.state().microtasks.borrow_mut().pop_front()
      else {
        return Ok(());
      };
      match self.run_with_async_context(
        microtask.async_context,
        &microtask.callback,
        &microtask.args,
      ) {
        Ok(_) => {}
        Err(Exception::Terminated) => return Err(ExecutionTerminated),
        Err(Exception::Thrown(exception)) => {
          self.report_unhandled_error(&exception)
        }
      }
      self.on_each_microtask_tick()?;
    }
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::Rc;

  use crate::runtime::JsRealm;
  use crate::runtime::JsRuntime;
  use crate::values::JsObject;
  use crate::values::JsValue;

  #[test]
  fn microtasks_run_in_order_with_their_context() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.main_realm();
    let seen = Rc::new(RefCell::new(vec![]));

    for name in ["a", "b"] {
      realm.set_async_context(JsValue::from(name));
      let seen = seen.clone();
      let weak = Rc::downgrade(&realm.0);
      let callback = JsObject::new_function(move |_this, _args| {
        let realm = JsRealm(weak.upgrade().unwrap());
        seen
          .borrow_mut()
          .push(realm.async_context().to_display_string());
        Ok(JsValue::Undefined)
      });
      realm.queue_microtask(&callback.into()).unwrap();
    }
    realm.set_async_context(JsValue::from("outer"));

    assert!(realm.has_pending_microtasks());
    realm.perform_microtask_checkpoint().unwrap();
    assert!(!realm.has_pending_microtasks());
    assert_eq!(*seen.borrow(), vec!["a", "b"]);
    assert_eq!(realm.async_context().to_display_string(), "outer");
  }

  #[test]
  fn queue_microtask_requires_a_function() {
    let runtime = JsRuntime::new(Default::default());
    let realm = runtime.main_realm();
    let err = realm.queue_microtask(&JsValue::from(1.0)).unwrap_err();
    let error = err.thrown_value().unwrap().as_object().unwrap().clone();
    assert_eq!(error.get("name").to_display_string(), "TypeError");
  }

  #[test]
  fn thrown_microtask_is_reported() {
    let reported = Rc::new(RefCell::new(vec![]));
    let runtime = JsRuntime::new(crate::runtime::RuntimeOptions {
      unhandled_error_cb: Some({
        let reported = reported.clone();
        Rc::new(move |_realm: &JsRealm, exception: &JsValue| {
          reported.borrow_mut().push(exception.to_display_string());
        })
      }),
      ..Default::default()
    });
    let realm = runtime.main_realm();
    let thrower = JsObject::new_function(|_this, _args| {
      Err(crate::error::Exception::Thrown(JsValue::from("boom")))
    });
    let ok = JsObject::new_function(|_this, _args| Ok(JsValue::Undefined));
    realm.queue_microtask(&thrower.into()).unwrap();
    realm.queue_microtask(&ok.into()).unwrap();
    realm.perform_microtask_checkpoint().unwrap();
    assert_eq!(*reported.borrow(), vec!["boom"]);
    assert!(!realm.has_pending_microtasks());
  }
}

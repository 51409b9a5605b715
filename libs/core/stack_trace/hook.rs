// Copyright 2018-2026 the Deno authors. MIT license.

use std::rc::Rc;

use super::CallSite;
use super::StackFrame;
use super::format::error_header;
use super::format::render_call_sites;
use crate::error::Exception;
use crate::error::ExecutionTerminated;
use crate::error::JsResult;
use crate::runtime::JsRealm;
use crate::values::JsFunction;
use crate::values::JsObject;
use crate::values::JsValue;

impl JsRealm {
  /// The hook to run for this realm, if any. A value assigned through the
  /// `Error.prepareStackTrace` accessor wins over a plain `prepareStackTrace`
  /// property on the realm's `Error` constructor.
  pub(crate) fn prepare_stack_trace_hook(&self) -> Option<JsFunction> {
    let state = self.state();
    let hook = match &*state.prepare_stack_trace.borrow() {
      Some(value) => value.clone(),
      None => state.error_constructor.get("prepareStackTrace"),
    };
    hook.as_function()
  }

  /// `Error.prepareStackTrace` getter. Returns the internal default
  /// formatter when nothing was assigned.
  pub fn get_prepare_stack_trace(&self) -> JsValue {
    match &*self.state().prepare_stack_trace.borrow() {
      Some(value) => value.clone(),
      None => JsValue::from(self.default_prepare_stack_trace()),
    }
  }

  /// `Error.prepareStackTrace` setter. Assigning the internal default
  /// formatter clears the override.
  pub fn set_prepare_stack_trace(&self, value: JsValue) {
    let default = self.default_prepare_stack_trace();
    let is_default = value.as_object().is_some_and(|o| o.ptr_eq(&default));
    *self.state().prepare_stack_trace.borrow_mut() =
      if is_default { None } else { Some(value) };
  }

  /// The function exposed as the default `Error.prepareStackTrace`. Created
  /// on first use.
  pub fn default_prepare_stack_trace(&self) -> JsObject {
    self
      .state()
      .default_prepare_stack_trace
      .get_or_init(|| {
        let realm = Rc::downgrade(&self.0);
        JsObject::new_function(move |_this, args| {
          match realm.upgrade() {
            Some(inner) => JsRealm(inner).prepare_stack_trace_default(args),
            None => Ok(JsValue::Undefined),
          }
        })
      })
      .clone()
  }

  /// `(error, callSites) => string`, formatting without consulting any hook.
  fn prepare_stack_trace_default(&self, args: &[JsValue]) -> JsResult<JsValue> {
    let Some(error) = args
      .first()
      .and_then(JsValue::as_object)
      .filter(|object| object.is_error())
    else {
      return Err(self.type_error("First argument must be an Error object"));
    };

    let mut out = error_header(error);
    if let Some(call_sites) = args.get(1).and_then(JsValue::as_object)
      && let Some(items) = call_sites.array()
    {
      for item in items.iter() {
        out.push_str("\n    at ");
        match item.as_object().and_then(JsObject::call_site) {
          Some(call_site) => out.push_str(&call_site.to_string()),
          None => out.push_str(&item.to_display_string()),
        }
      }
    }
    Ok(JsValue::from(out))
  }

  pub(crate) fn format_with_hook(
    &self,
    object: &JsObject,
    frames: Vec<StackFrame>,
    hook: JsFunction,
  ) -> Result<JsValue, ExecutionTerminated> {
    let (header, remapped) = self.remap_for_rendering(object, frames);
    let call_sites = CallSite::from_frames(remapped);

    // Script that reads `error.stack` from inside the hook sees the default
    // rendering.
    let default = render_call_sites(&header, &call_sites);
    object.set("stack", JsValue::from(default));

    let call_sites = JsObject::new_array(
      call_sites
        .into_iter()
        .map(|call_site| JsValue::from(JsObject::new_call_site(call_site)))
        .collect(),
    );

    let result = {
      let flag = &self.state().inside_prepare_stack_trace;
      let previous = flag.replace(true);
      let _guard = scopeguard::guard(flag, move |flag| flag.set(previous));
      hook.call(
        &JsValue::from(self.error_constructor()),
        &[JsValue::from(object.clone()), JsValue::from(call_sites)],
      )
    };
    self.check_termination()?;

    match result {
      Ok(value) if value.is_null_or_undefined() => Ok(JsValue::Undefined),
      Ok(value) => Ok(value),
      Err(Exception::Terminated) => Err(ExecutionTerminated),
      Err(Exception::Thrown(exception)) => {
        log::debug!(
          "prepareStackTrace threw, using an empty stack: {}",
          exception.to_display_string()
        );
        Ok(JsValue::from(""))
      }
    }
  }
}

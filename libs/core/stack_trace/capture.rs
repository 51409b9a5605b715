// Copyright 2018-2026 the Deno authors. MIT license.

use super::StackFrame;
use crate::error::ExecutionTerminated;
use crate::error::JsResult;
use crate::runtime::JsRealm;
use crate::values::ErrorType;
use crate::values::JsObject;
use crate::values::JsValue;
use crate::values::StackSlot;

impl JsRealm {
  /// `Error.stackTraceLimit`.
  pub fn stack_trace_limit(&self) -> usize {
    self.state().stack_trace_limit.get()
  }

  pub fn set_stack_trace_limit(&self, limit: usize) {
    self.state().stack_trace_limit.set(limit);
  }

  /// Walks the engine's current frames. With `skip_until`, every frame up to
  /// and including the most recent call of that function is dropped; if the
  /// function is not on the stack nothing is captured.
  pub(crate) fn collect_stack_frames(
    &self,
    skip_until: Option<&JsValue>,
    limit: usize,
  ) -> Vec<StackFrame> {
    if limit == 0 {
      return vec![];
    }
    let mut frames = self.engine().current_stack_frames();
    if let Some(function) = skip_until {
      match frames
        .iter()
        .position(|frame| frame.function.strict_equals(function))
      {
        Some(index) => {
          frames.drain(..=index);
        }
        None => frames.clear(),
      }
    }
    frames.truncate(limit);
    frames
  }

  /// `Error.captureStackTrace(target, constructorOpt)`.
  ///
  /// Errors get their frames captured lazily and format on the first read of
  /// `stack`. Any other object gets an eagerly formatted `stack` property.
  pub fn capture_stack_trace(
    &self,
    target: &JsValue,
    constructor_opt: Option<&JsValue>,
  ) -> JsResult<()> {
    let Some(object) = target.as_object() else {
      return Err(self.type_error("invalid_argument"));
    };
    self.check_termination()?;

    let skip_until = constructor_opt.filter(|value| value.is_callable());
    let frames =
      self.collect_stack_frames(skip_until, self.stack_trace_limit());
    match object.error_data() {
      Some(data) => {
        *data.stack.borrow_mut() = StackSlot::Lazy(frames);
      }
      None => {
        let stack = self.compute_error_stack(object, frames)?;
        object.set("stack", stack);
      }
    }
    Ok(())
  }

  /// Moves the frames captured on `source` to the end of `destination`'s.
  /// A destination with no captured frames first captures the current one.
  pub fn append_stack_trace(
    &self,
    source: &JsValue,
    destination: &JsValue,
  ) -> JsResult<()> {
    let errors = source
      .as_object()
      .and_then(JsObject::error_data)
      .zip(destination.as_object().and_then(JsObject::error_data));
    let Some((source, destination)) = errors else {
      return Err(
        self.type_error("First & second argument must be an Error object"),
      );
    };

    if !destination.has_lazy_stack() {
      let frames = self.collect_stack_frames(None, 1);
      *destination.stack.borrow_mut() = StackSlot::Lazy(frames);
    }
    let moved = source.take_frames().unwrap_or_default();
    if let StackSlot::Lazy(frames) = &mut *destination.stack.borrow_mut() {
      frames.extend(moved);
    }
    Ok(())
  }

  /// Reads `object.stack`, formatting captured frames on first access.
  pub fn get_stack(
    &self,
    object: &JsObject,
  ) -> Result<JsValue, ExecutionTerminated> {
    let Some(frames) = object.error_data().and_then(|data| data.take_frames())
    else {
      return Ok(object.get("stack"));
    };
    let stack = self.compute_error_stack(object, frames)?;
    object.set("stack", stack.clone());
    Ok(stack)
  }

  /// Assigns `object.stack`, dropping any frames not yet formatted.
  pub fn set_stack(&self, object: &JsObject, value: JsValue) {
    object.set("stack", value);
  }

  /// Creates an error and captures the current frames into it, like
  /// `new Error(message)` would.
  pub fn new_error(
    &self,
    error_type: ErrorType,
    message: impl AsRef<str>,
  ) -> JsObject {
    self.new_error_with_name(error_type, error_type.name(), message)
  }

  pub fn new_error_with_name(
    &self,
    error_type: ErrorType,
    name: &str,
    message: impl AsRef<str>,
  ) -> JsObject {
    let frames = self.collect_stack_frames(None, self.stack_trace_limit());
    JsObject::new_error(
      error_type,
      name,
      message.as_ref(),
      self.context_id(),
      None,
      frames,
    )
  }

  /// A `SyntaxError` raised while parsing `source_url` at the one-based
  /// `line`.
  pub fn new_syntax_error(
    &self,
    message: impl AsRef<str>,
    source_url: impl Into<String>,
    line: u32,
  ) -> JsObject {
    let frames = self.collect_stack_frames(None, self.stack_trace_limit());
    JsObject::new_error(
      ErrorType::SyntaxError,
      ErrorType::SyntaxError.name(),
      message.as_ref(),
      self.context_id(),
      Some((source_url.into(), line)),
      frames,
    )
  }
}

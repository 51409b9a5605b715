// Copyright 2018-2026 the Deno authors. MIT license.

use deno_error::JsErrorBox;

use super::JsRealm;
use crate::error::JsResult;
use crate::modules::ModuleRecord;
use crate::modules::ResumeMode;
use crate::stack_trace::StackFrame;
use crate::values::JsValue;

/// The script engine a realm runs on.
pub trait ScriptEngine {
  /// The frames of the currently executing script, most recent first.
  fn current_stack_frames(&self) -> Vec<StackFrame>;

  /// Links and evaluates a fetched module, or resumes an evaluation that was
  /// suspended at a top-level `await`.
  fn evaluate_module(
    &self,
    realm: &JsRealm,
    record: &ModuleRecord,
    sent_value: &JsValue,
    resume_mode: ResumeMode,
  ) -> JsResult<JsValue>;
}

/// Placeholder used when a runtime is created without an engine. It never
/// reports frames and refuses to evaluate modules.
pub struct NoopScriptEngine;

impl ScriptEngine for NoopScriptEngine {
  fn current_stack_frames(&self) -> Vec<StackFrame> {
    vec![]
  }

  fn evaluate_module(
    &self,
    realm: &JsRealm,
    record: &ModuleRecord,
    _sent_value: &JsValue,
    _resume_mode: ResumeMode,
  ) -> JsResult<JsValue> {
    Err(realm.exception_from_error(&JsErrorBox::generic(format!(
      "Module evaluation is not supported; attempted to evaluate: \"{}\"",
      record.key()
    ))))
  }
}

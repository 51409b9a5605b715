// Copyright 2018-2026 the Deno authors. MIT license.

//! Stack trace capture, source-map remapping, `Error.prepareStackTrace`
//! dispatch and the default V8-style rendering.

mod call_site;
mod capture;
mod format;
mod hook;


pub use call_site::CallSite;

use crate::runtime::ContextId;
use crate::values::JsValue;

/// Frames captured when `Error.stackTraceLimit` was never assigned.
pub const DEFAULT_STACK_TRACE_LIMIT: usize = 10;

/// What kind of code a frame is executing. Controls the placeholders used
/// when a frame has no function name or no source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
  /// A regular function call.
  Function,
  /// Code running inside `eval` or `new Function`.
  Eval,
  /// A function implemented by the engine.
  Builtin,
  /// Top-level script code.
  Global,
  /// Top-level module code.
  Module,
  Wasm,
}

/// A zero-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColumn {
  pub line: u32,
  pub column: u32,
}

/// A call frame as reported by the engine. Frames are ordered most recent
/// first.
#[derive(Debug, Clone)]
pub struct StackFrame {
  pub function_name: String,
  pub kind: FrameKind,
  pub source_url: String,
  /// `None` when the engine has no line/column information for the frame.
  pub position: Option<LineColumn>,
  pub is_strict: bool,
  pub is_constructor: bool,
  /// The realm the frame's code belongs to.
  pub context: ContextId,
  pub this_value: JsValue,
  pub function: JsValue,
}

impl StackFrame {
  pub fn new(
    function_name: impl Into<String>,
    source_url: impl Into<String>,
    context: ContextId,
  ) -> Self {
    Self {
      function_name: function_name.into(),
      kind: FrameKind::Function,
      source_url: source_url.into(),
      position: None,
      is_strict: false,
      is_constructor: false,
      context,
      this_value: JsValue::Undefined,
      function: JsValue::Undefined,
    }
  }

  /// Sets the zero-based position.
  pub fn at(mut self, line: u32, column: u32) -> Self {
    self.position = Some(LineColumn { line, column });
    self
  }

  pub fn with_kind(mut self, kind: FrameKind) -> Self {
    self.kind = kind;
    self
  }

  pub fn strict(mut self) -> Self {
    self.is_strict = true;
    self
  }

  pub fn constructor(mut self) -> Self {
    self.is_constructor = true;
    self
  }

  pub fn with_this(mut self, this_value: JsValue) -> Self {
    self.this_value = this_value;
    self
  }

  pub fn with_function(mut self, function: JsValue) -> Self {
    self.function = function;
    self
  }
}

// Copyright 2018-2026 the Deno authors. MIT license.

use std::fmt;

use super::FrameKind;
use super::LineColumn;
use super::format::RemappedFrame;
use super::format::write_frame;
use crate::values::JsValue;

/// The script-visible view of a frame handed to `Error.prepareStackTrace`.
///
/// Positions are the remapped ones. Strict call sites hide their receiver and
/// function.
#[derive(Debug, Clone)]
pub struct CallSite {
  function_name: String,
  kind: FrameKind,
  source_url: String,
  position: Option<LineColumn>,
  is_strict: bool,
  is_constructor: bool,
  this_value: JsValue,
  function: JsValue,
}

impl CallSite {
  pub(crate) fn new(frame: RemappedFrame, is_strict: bool) -> Self {
    let RemappedFrame {
      frame,
      source_url,
      position,
      ..
    } = frame;
    Self {
      function_name: frame.function_name,
      kind: frame.kind,
      source_url,
      position,
      is_strict,
      is_constructor: frame.is_constructor,
      this_value: frame.this_value,
      function: frame.function,
    }
  }

  /// Builds call sites from frames ordered most recent first. Once a strict
  /// frame is seen, it and every older frame are strict.
  pub(crate) fn from_frames(frames: Vec<RemappedFrame>) -> Vec<CallSite> {
    let mut strict = false;
    frames
      .into_iter()
      .map(|frame| {
        strict |= frame.frame.is_strict;
        CallSite::new(frame, strict)
      })
      .collect()
  }

  pub fn kind(&self) -> FrameKind {
    self.kind
  }

  pub fn function_name(&self) -> Option<&str> {
    Some(self.function_name.as_str()).filter(|name| !name.is_empty())
  }

  pub fn file_name(&self) -> Option<&str> {
    Some(self.source_url.as_str()).filter(|url| !url.is_empty())
  }

  /// One-based.
  pub fn line_number(&self) -> Option<u32> {
    self.position.map(|position| position.line + 1)
  }

  /// One-based.
  pub fn column_number(&self) -> Option<u32> {
    self.position.map(|position| position.column + 1)
  }

  pub fn this(&self) -> JsValue {
    if self.is_strict {
      JsValue::Undefined
    } else {
      self.this_value.clone()
    }
  }

  pub fn function(&self) -> JsValue {
    if self.is_strict {
      JsValue::Undefined
    } else {
      self.function.clone()
    }
  }

  pub fn is_native(&self) -> bool {
    self.kind == FrameKind::Builtin
  }

  pub fn is_eval(&self) -> bool {
    self.kind == FrameKind::Eval
  }

  pub fn is_constructor(&self) -> bool {
    self.is_constructor
  }

  pub fn is_toplevel(&self) -> bool {
    matches!(self.kind, FrameKind::Global | FrameKind::Module)
  }

  pub fn is_strict(&self) -> bool {
    self.is_strict
  }
}

impl fmt::Display for CallSite {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut out = String::new();
    write_frame(
      &mut out,
      &self.function_name,
      self.kind,
      self.is_constructor,
      &self.source_url,
      self.position,
    );
    f.write_str(&out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::runtime::ContextId;
  use crate::stack_trace::StackFrame;
  use crate::values::JsObject;

  fn remapped(frame: StackFrame) -> RemappedFrame {
    RemappedFrame::unchanged(frame)
  }

  #[test]
  fn strictness_propagates_to_older_frames() {
    let context = ContextId::next();
    let this = JsValue::from(JsObject::new());
    let frames = vec![
      remapped(StackFrame::new("a", "/a.js", context).with_this(this.clone())),
      remapped(StackFrame::new("b", "/b.js", context).strict()),
      remapped(StackFrame::new("c", "/c.js", context).with_this(this.clone())),
    ];
    let call_sites = CallSite::from_frames(frames);
    assert!(!call_sites[0].is_strict());
    assert!(call_sites[0].this().strict_equals(&this));
    assert!(call_sites[1].is_strict());
    assert!(call_sites[2].is_strict());
    assert!(call_sites[2].this().is_undefined());
    assert!(call_sites[2].function().is_undefined());
  }

  #[test]
  fn accessors_are_one_based() {
    let context = ContextId::next();
    let call_site = CallSite::new(
      remapped(StackFrame::new("", "/a.js", context).at(0, 4)),
      false,
    );
    assert_eq!(call_site.function_name(), None);
    assert_eq!(call_site.file_name(), Some("/a.js"));
    assert_eq!(call_site.line_number(), Some(1));
    assert_eq!(call_site.column_number(), Some(5));
    assert_eq!(call_site.to_string(), "<anonymous> (/a.js:1:5)");
  }

  #[test]
  fn toplevel_and_native() {
    let context = ContextId::next();
    let global = CallSite::new(
      remapped(
        StackFrame::new("", "/main.js", context)
          .with_kind(FrameKind::Global)
          .at(2, 0),
      ),
      false,
    );
    assert!(global.is_toplevel());
    assert_eq!(global.to_string(), "/main.js:3");

    let native = CallSite::new(
      remapped(
        StackFrame::new("push", "", context).with_kind(FrameKind::Builtin),
      ),
      false,
    );
    assert!(native.is_native());
    assert_eq!(native.to_string(), "push (native)");
  }
}

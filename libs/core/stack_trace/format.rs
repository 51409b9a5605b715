// Copyright 2018-2026 the Deno authors. MIT license.

use std::fmt::Write as _;

use super::CallSite;
use super::FrameKind;
use super::LineColumn;
use super::StackFrame;
use crate::error::ExecutionTerminated;
use crate::runtime::ContextId;
use crate::runtime::JsRealm;
use crate::source_map::SourceMapApplication;
use crate::values::ErrorType;
use crate::values::JsObject;
use crate::values::JsValue;

/// A frame after it went through the source remapper.
#[derive(Debug, Clone)]
pub(crate) struct RemappedFrame {
  pub frame: StackFrame,
  pub source_url: String,
  /// Zero-based display position.
  pub position: Option<LineColumn>,
  pub remapped: bool,
}

impl RemappedFrame {
  pub(crate) fn unchanged(frame: StackFrame) -> Self {
    Self {
      source_url: frame.source_url.clone(),
      position: frame.position,
      remapped: false,
      frame,
    }
  }
}

/// The synthetic `<parse>` frame rendered for syntax errors raised while
/// parsing a file other than the one on top of the stack.
struct ParseFrame {
  source_url: String,
  /// One-based.
  line: u32,
}

/// Writes the pre-remap `originalLine`/`originalColumn` onto the error for
/// the first remapped frame only.
struct OriginalPositionWriter<'a> {
  target: Option<&'a JsObject>,
  written: bool,
}

impl<'a> OriginalPositionWriter<'a> {
  fn new(target: Option<&'a JsObject>) -> Self {
    Self {
      target,
      written: false,
    }
  }

  fn record(&mut self, line: u32, column: Option<u32>) {
    if self.written {
      return;
    }
    let Some(target) = self.target else {
      return;
    };
    target.define_hidden("originalLine", line.into());
    if let Some(column) = column {
      target.define_hidden("originalColumn", column.into());
    }
    self.written = true;
  }
}

/// Renders one frame the way V8 does:
/// `fn (url:line:col)`, or `url:line:col` when the frame has no name.
///
/// `:line` is only written when the position is past the start of the file,
/// `:col` only when the column is past the first.
pub(crate) fn write_frame(
  out: &mut String,
  function_name: &str,
  kind: FrameKind,
  is_constructor: bool,
  source_url: &str,
  position: Option<LineColumn>,
) {
  let name = if function_name.is_empty() {
    match kind {
      FrameKind::Function | FrameKind::Eval => "<anonymous>".to_string(),
      _ => String::new(),
    }
  } else if is_constructor {
    format!("new {function_name}")
  } else {
    function_name.to_string()
  };

  let has_name = !name.is_empty();
  if has_name {
    out.push_str(&name);
    out.push_str(" (");
  }

  if source_url.is_empty() {
    out.push_str(if kind == FrameKind::Builtin {
      "native"
    } else {
      "unknown"
    });
  } else {
    out.push_str(source_url);
  }

  if let Some(LineColumn { line, column }) = position
    && (line > 0 || column > 0)
  {
    let _ = write!(out, ":{}", line + 1);
    if column > 0 {
      let _ = write!(out, ":{}", column + 1);
    }
  }

  if has_name {
    out.push(')');
  }
}

/// `Name: message`, or whichever of the two is non-empty.
pub(crate) fn error_header(object: &JsObject) -> String {
  let name = match object.get("name") {
    JsValue::Undefined => "Error".to_string(),
    value => value.to_display_string(),
  };
  let message = match object.get("message") {
    JsValue::Undefined => String::new(),
    value => value.to_display_string(),
  };
  match (name.is_empty(), message.is_empty()) {
    (_, true) => name,
    (true, false) => message,
    (false, false) => format!("{name}: {message}"),
  }
}

/// The header followed by one `    at` line per call site.
pub(crate) fn render_call_sites(
  header: &str,
  call_sites: &[CallSite],
) -> String {
  let mut out = header.to_string();
  for call_site in call_sites {
    let _ = write!(out, "\n    at {call_site}");
  }
  out
}

impl JsRealm {
  /// The realm whose frames may be remapped for `object`.
  fn owner_context(&self, object: &JsObject) -> ContextId {
    object
      .error_data()
      .map(|data| data.context())
      .unwrap_or_else(|| self.context_id())
  }

  fn remap_frame(
    &self,
    frame: StackFrame,
    owner: ContextId,
    writer: &mut OriginalPositionWriter,
  ) -> RemappedFrame {
    let mut remapped = RemappedFrame::unchanged(frame);
    let Some(remapper) = self.source_remapper() else {
      return remapped;
    };
    let Some(position) = remapped.frame.position else {
      return remapped;
    };
    if remapped.frame.source_url.is_empty() || remapped.frame.context != owner
    {
      return remapped;
    }

    match remapper.remap(
      &remapped.frame.source_url,
      position.line,
      position.column,
    ) {
      SourceMapApplication::Unchanged => return remapped,
      SourceMapApplication::LineAndColumn {
        line_number,
        column_number,
      } => {
        remapped.position = Some(LineColumn {
          line: line_number,
          column: column_number,
        });
      }
      SourceMapApplication::LineAndColumnAndFileName {
        file_name,
        line_number,
        column_number,
      } => {
        remapped.source_url = file_name;
        remapped.position = Some(LineColumn {
          line: line_number,
          column: column_number,
        });
      }
    }
    remapped.remapped = true;
    writer.record(position.line + 1, Some(position.column + 1));
    remapped
  }

  fn remap_frames_with(
    &self,
    object: &JsObject,
    frames: Vec<StackFrame>,
    writer: &mut OriginalPositionWriter,
  ) -> Vec<RemappedFrame> {
    let owner = self.owner_context(object);
    frames
      .into_iter()
      .map(|frame| self.remap_frame(frame, owner, writer))
      .collect()
  }

  /// Call sites for the frames still captured on `error`, without consuming
  /// them or touching the error.
  pub fn call_sites_for(&self, error: &JsObject) -> Vec<CallSite> {
    let Some(frames) = error.error_data().and_then(|data| data.peek_frames())
    else {
      return vec![];
    };
    let mut writer = OriginalPositionWriter::new(None);
    CallSite::from_frames(self.remap_frames_with(error, frames, &mut writer))
  }

  fn parse_frame(
    &self,
    object: &JsObject,
    frames: &[StackFrame],
    writer: &mut OriginalPositionWriter,
  ) -> Option<ParseFrame> {
    let data = object.error_data()?;
    if data.error_type() != ErrorType::SyntaxError {
      return None;
    }
    let (source_url, line) = data.source_location.clone()?;
    if frames.first().is_some_and(|top| top.source_url == source_url) {
      return None;
    }

    let mut parse_frame = ParseFrame { source_url, line };
    if let Some(remapper) = self.source_remapper()
      && !parse_frame.source_url.is_empty()
      && line > 0
    {
      match remapper.remap(&parse_frame.source_url, line - 1, 0) {
        SourceMapApplication::Unchanged => {}
        SourceMapApplication::LineAndColumn { line_number, .. } => {
          parse_frame.line = line_number + 1;
          writer.record(line, None);
        }
        SourceMapApplication::LineAndColumnAndFileName {
          file_name,
          line_number,
          ..
        } => {
          parse_frame.source_url = file_name;
          parse_frame.line = line_number + 1;
          writer.record(line, None);
        }
      }
    }
    Some(parse_frame)
  }

  /// Remaps `frames` for rendering `object`'s stack, writing the original
  /// position side channel onto `object`. Returns the remapped frames and
  /// the header the rendering starts with, including the `<parse>` frame
  /// of a syntax error.
  pub(crate) fn remap_for_rendering(
    &self,
    object: &JsObject,
    frames: Vec<StackFrame>,
  ) -> (String, Vec<RemappedFrame>) {
    let mut writer = OriginalPositionWriter::new(Some(object));
    let parse_frame = self.parse_frame(object, &frames, &mut writer);
    let remapped = self.remap_frames_with(object, frames, &mut writer);

    let mut header = error_header(object);
    if let Some(ParseFrame { source_url, line }) = parse_frame {
      let _ = write!(header, "\n    at <parse> ({source_url}:{line})");
    }
    (header, remapped)
  }

  /// The built-in rendering used when no `prepareStackTrace` hook applies.
  pub(crate) fn format_without_hook(
    &self,
    object: &JsObject,
    frames: Vec<StackFrame>,
  ) -> String {
    let (mut out, remapped) = self.remap_for_rendering(object, frames);
    for frame in &remapped {
      out.push_str("\n    at ");
      write_frame(
        &mut out,
        &frame.frame.function_name,
        frame.frame.kind,
        frame.frame.is_constructor,
        &frame.source_url,
        frame.position,
      );
    }
    out
  }

  /// Produces the value of `object.stack` from its captured frames.
  ///
  /// Dispatches to the user's `prepareStackTrace` hook unless one is already
  /// running. Only termination escapes; any other failure yields `""`.
  pub(crate) fn compute_error_stack(
    &self,
    object: &JsObject,
    frames: Vec<StackFrame>,
  ) -> Result<JsValue, ExecutionTerminated> {
    self.check_termination()?;
    let hook = if self.state().inside_prepare_stack_trace.get() {
      None
    } else {
      self.prepare_stack_trace_hook()
    };
    match hook {
      Some(hook) => self.format_with_hook(object, frames, hook),
      None => Ok(JsValue::from(self.format_without_hook(object, frames))),
    }
  }
}

// Copyright 2018-2026 the Deno authors. MIT license.

use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::runtime::JsRealm;
use crate::stack_trace::FrameKind;
use crate::values::JsValue;

/// A script-visible failure. Every pipeline operation that can run user code
/// or hand errors back to script returns this.
#[derive(Debug, Clone)]
pub enum Exception {
  /// A value was thrown and may be caught by script.
  Thrown(JsValue),
  /// Execution was terminated. Never catchable and never swallowed.
  Terminated,
}

pub type JsResult<T> = Result<T, Exception>;

impl Exception {
  pub fn is_termination(&self) -> bool {
    matches!(self, Exception::Terminated)
  }

  pub fn thrown_value(&self) -> Option<&JsValue> {
    match self {
      Exception::Thrown(value) => Some(value),
      Exception::Terminated => None,
    }
  }
}

impl Display for Exception {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Exception::Thrown(value) => {
        write!(f, "Uncaught {}", value.to_display_string())
      }
      Exception::Terminated => write!(f, "{ExecutionTerminated}"),
    }
  }
}

impl std::error::Error for Exception {}

/// The only failure stack formatting is allowed to surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("execution terminated")]
pub struct ExecutionTerminated;

impl From<ExecutionTerminated> for Exception {
  fn from(_: ExecutionTerminated) -> Self {
    Exception::Terminated
  }
}

/// A host-side snapshot of a thrown value, suitable for logging and for
/// sending across threads.
#[derive(Debug, PartialEq, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsError {
  pub name: Option<String>,
  pub message: Option<String>,
  pub stack: Option<String>,
  pub exception_message: String,
  pub frames: Vec<JsStackFrame>,
}

#[derive(Debug, Eq, PartialEq, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsStackFrame {
  pub function_name: Option<String>,
  pub file_name: Option<String>,
  pub line_number: Option<i64>,
  pub column_number: Option<i64>,
  pub is_eval: bool,
  pub is_native: bool,
  pub is_constructor: bool,
  pub is_strict: bool,
}

impl JsStackFrame {
  pub fn from_location(
    file_name: Option<String>,
    line_number: Option<i64>,
    column_number: Option<i64>,
  ) -> Self {
    Self {
      function_name: None,
      file_name,
      line_number,
      column_number,
      is_eval: false,
      is_native: false,
      is_constructor: false,
      is_strict: false,
    }
  }

  pub(crate) fn from_call_site(
    call_site: &crate::stack_trace::CallSite,
  ) -> Self {
    Self {
      function_name: call_site.function_name().map(str::to_string),
      file_name: call_site.file_name().map(str::to_string),
      line_number: call_site.line_number().map(i64::from),
      column_number: call_site.column_number().map(i64::from),
      is_eval: call_site.kind() == FrameKind::Eval,
      is_native: call_site.is_native(),
      is_constructor: call_site.is_constructor(),
      is_strict: call_site.is_strict(),
    }
  }

  pub fn maybe_format_location(&self) -> Option<String> {
    Some(format!(
      "{}:{}:{}",
      self.file_name.as_ref()?,
      self.line_number?,
      self.column_number?
    ))
  }
}

impl JsError {
  /// Builds a snapshot of `exception`. Reading the `stack` of an error with
  /// captured frames renders it, which may run a user hook.
  pub fn from_exception(
    realm: &JsRealm,
    exception: &JsValue,
  ) -> Result<Self, ExecutionTerminated> {
    let Some(object) = exception.as_object().filter(|o| o.is_error()) else {
      return Ok(Self {
        name: None,
        message: None,
        stack: None,
        exception_message: format!(
          "Uncaught {}",
          exception.to_display_string()
        ),
        frames: vec![],
      });
    };

    let name = object.get("name").as_str().map(str::to_string);
    let message = object.get("message").as_str().map(str::to_string);
    let frames = realm
      .call_sites_for(object)
      .iter()
      .map(JsStackFrame::from_call_site)
      .collect();
    let stack = realm
      .get_stack(object)?
      .as_str()
      .filter(|s| !s.is_empty())
      .map(str::to_string);
    let exception_message = match (name.as_deref(), message.as_deref()) {
      (Some(name), Some(message)) if !name.is_empty() && !message.is_empty() => {
        format!("Uncaught {name}: {message}")
      }
      (Some(name), _) if !name.is_empty() => format!("Uncaught {name}"),
      (_, Some(message)) => format!("Uncaught {message}"),
      _ => "Uncaught".to_string(),
    };

    Ok(Self {
      name,
      message,
      stack,
      exception_message,
      frames,
    })
  }
}

impl std::error::Error for JsError {}

impl Display for JsError {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    if let Some(stack) = &self.stack {
      let stack_lines = stack.lines();
      if stack_lines.count() > 1 {
        return write!(f, "{stack}");
      }
    }
    write!(f, "{}", self.exception_message)?;
    let location = self.frames.first().and_then(|f| f.maybe_format_location());
    if let Some(location) = location {
      write!(f, "\n    at {location}")?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn js_error_display_prefers_multiline_stack() {
    let error = JsError {
      name: Some("Error".to_string()),
      message: Some("boom".to_string()),
      stack: Some("Error: boom\n    at a.js:1:2".to_string()),
      exception_message: "Uncaught Error: boom".to_string(),
      frames: vec![],
    };
    assert_eq!(error.to_string(), "Error: boom\n    at a.js:1:2");
  }

  #[test]
  fn js_error_display_falls_back_to_first_frame() {
    let error = JsError {
      name: Some("Error".to_string()),
      message: Some("boom".to_string()),
      stack: None,
      exception_message: "Uncaught Error: boom".to_string(),
      frames: vec![JsStackFrame::from_location(
        Some("/a.js".to_string()),
        Some(3),
        Some(4),
      )],
    };
    assert_eq!(error.to_string(), "Uncaught Error: boom\n    at /a.js:3:4");
  }

  #[test]
  fn js_stack_frame_serializes_camel_case() {
    let frame =
      JsStackFrame::from_location(Some("/a.js".to_string()), Some(1), None);
    let value = serde_json::to_value(&frame).unwrap();
    assert_eq!(value["fileName"], "/a.js");
    assert_eq!(value["lineNumber"], 1);
    assert!(value["columnNumber"].is_null());
    assert_eq!(value["isNative"], false);
  }

  #[test]
  fn exception_display() {
    let exception = Exception::Thrown(JsValue::from("nope"));
    assert_eq!(exception.to_string(), "Uncaught nope");
    assert_eq!(Exception::Terminated.to_string(), "execution terminated");
    assert!(Exception::from(ExecutionTerminated).is_termination());
  }
}

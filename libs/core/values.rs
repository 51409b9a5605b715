// Copyright 2018-2026 the Deno authors. MIT license.

//! A small host-side value model.
//!
//! The engine owns the real heap; these handles carry exactly what the module
//! pipeline and the stack trace machinery need to look at: error objects with
//! a lazily formatted `stack`, callables for user hooks, arrays of call sites
//! and plain objects for import options and synthetic module namespaces.

use std::cell::Ref;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::JsResult;
use crate::runtime::ContextId;
use crate::stack_trace::CallSite;
use crate::stack_trace::StackFrame;

pub type NativeFunction = dyn Fn(&JsValue, &[JsValue]) -> JsResult<JsValue>;

#[derive(Clone, Default)]
pub enum JsValue {
  #[default]
  Undefined,
  Null,
  Bool(bool),
  Number(f64),
  String(Rc<str>),
  Object(JsObject),
}

impl JsValue {
  pub fn string(s: impl Into<Rc<str>>) -> Self {
    JsValue::String(s.into())
  }

  pub fn is_undefined(&self) -> bool {
    matches!(self, JsValue::Undefined)
  }

  pub fn is_null_or_undefined(&self) -> bool {
    matches!(self, JsValue::Undefined | JsValue::Null)
  }

  pub fn is_object(&self) -> bool {
    matches!(self, JsValue::Object(_))
  }

  pub fn is_callable(&self) -> bool {
    self.as_function().is_some()
  }

  pub fn as_object(&self) -> Option<&JsObject> {
    match self {
      JsValue::Object(object) => Some(object),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      JsValue::String(s) => Some(&**s),
      _ => None,
    }
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      JsValue::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_function(&self) -> Option<JsFunction> {
    self.as_object().and_then(JsObject::as_function)
  }

  /// `===` semantics; objects compare by identity.
  pub fn strict_equals(&self, other: &JsValue) -> bool {
    match (self, other) {
      (JsValue::Undefined, JsValue::Undefined) => true,
      (JsValue::Null, JsValue::Null) => true,
      (JsValue::Bool(a), JsValue::Bool(b)) => a == b,
      (JsValue::Number(a), JsValue::Number(b)) => a == b,
      (JsValue::String(a), JsValue::String(b)) => a == b,
      (JsValue::Object(a), JsValue::Object(b)) => a.ptr_eq(b),
      _ => false,
    }
  }

  /// An approximation of `String(value)` that never calls into script.
  pub fn to_display_string(&self) -> String {
    match self {
      JsValue::Undefined => "undefined".to_string(),
      JsValue::Null => "null".to_string(),
      JsValue::Bool(b) => b.to_string(),
      JsValue::Number(n) => format_number(*n),
      JsValue::String(s) => s.to_string(),
      JsValue::Object(object) => object.to_display_string(),
    }
  }
}

fn format_number(n: f64) -> String {
  if n.is_nan() {
    "NaN".to_string()
  } else if n.is_infinite() {
    let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
    s.to_string()
  } else if n.fract() == 0.0 && n.abs() < 1e21 {
    format!("{}", n as i64)
  } else {
    format!("{n}")
  }
}

impl fmt::Debug for JsValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      JsValue::Undefined => write!(f, "undefined"),
      JsValue::Null => write!(f, "null"),
      JsValue::Bool(b) => write!(f, "{b}"),
      JsValue::Number(n) => write!(f, "{}", format_number(*n)),
      JsValue::String(s) => write!(f, "{s:?}"),
      JsValue::Object(object) => write!(f, "{object:?}"),
    }
  }
}

impl From<&str> for JsValue {
  fn from(s: &str) -> Self {
    JsValue::String(s.into())
  }
}

impl From<String> for JsValue {
  fn from(s: String) -> Self {
    JsValue::String(s.into())
  }
}

impl From<f64> for JsValue {
  fn from(n: f64) -> Self {
    JsValue::Number(n)
  }
}

impl From<u32> for JsValue {
  fn from(n: u32) -> Self {
    JsValue::Number(n as f64)
  }
}

impl From<bool> for JsValue {
  fn from(b: bool) -> Self {
    JsValue::Bool(b)
  }
}

impl From<JsObject> for JsValue {
  fn from(object: JsObject) -> Self {
    JsValue::Object(object)
  }
}

/// The built-in error constructors the host knows how to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
  Error,
  EvalError,
  RangeError,
  ReferenceError,
  SyntaxError,
  TypeError,
  UriError,
}

impl ErrorType {
  pub fn name(self) -> &'static str {
    match self {
      ErrorType::Error => "Error",
      ErrorType::EvalError => "EvalError",
      ErrorType::RangeError => "RangeError",
      ErrorType::ReferenceError => "ReferenceError",
      ErrorType::SyntaxError => "SyntaxError",
      ErrorType::TypeError => "TypeError",
      ErrorType::UriError => "URIError",
    }
  }

  /// Maps a `deno_error` class name onto a constructor. Classes that are not
  /// built-in errors become plain `Error`s carrying the class as their name.
  pub fn from_class(class: &str) -> Self {
    match class {
      "EvalError" => ErrorType::EvalError,
      "RangeError" => ErrorType::RangeError,
      "ReferenceError" => ErrorType::ReferenceError,
      "SyntaxError" => ErrorType::SyntaxError,
      "TypeError" => ErrorType::TypeError,
      "URIError" => ErrorType::UriError,
      _ => ErrorType::Error,
    }
  }
}

#[derive(Debug)]
pub(crate) enum StackSlot {
  /// Frames captured but not yet rendered.
  Lazy(Vec<StackFrame>),
  /// A rendered or assigned `stack` value.
  Value(JsValue),
}

#[derive(Debug)]
pub struct ErrorData {
  pub(crate) error_type: ErrorType,
  pub(crate) context: ContextId,
  /// Where a syntax error was raised, with a one-based line.
  pub(crate) source_location: Option<(String, u32)>,
  pub(crate) stack: RefCell<StackSlot>,
}

impl ErrorData {
  pub fn error_type(&self) -> ErrorType {
    self.error_type
  }

  pub fn context(&self) -> ContextId {
    self.context
  }

  pub fn has_lazy_stack(&self) -> bool {
    matches!(&*self.stack.borrow(), StackSlot::Lazy(_))
  }

  pub(crate) fn take_frames(&self) -> Option<Vec<StackFrame>> {
    let mut slot = self.stack.borrow_mut();
    match &mut *slot {
      StackSlot::Lazy(frames) => Some(std::mem::take(frames)),
      StackSlot::Value(_) => None,
    }
  }

  pub(crate) fn peek_frames(&self) -> Option<Vec<StackFrame>> {
    match &*self.stack.borrow() {
      StackSlot::Lazy(frames) => Some(frames.clone()),
      StackSlot::Value(_) => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Property {
  pub value: JsValue,
  pub enumerable: bool,
}

enum ObjectKind {
  Ordinary,
  Function(Rc<NativeFunction>),
  Array(RefCell<Vec<JsValue>>),
  Error(ErrorData),
  CallSite(CallSite),
}

struct ObjectInner {
  properties: RefCell<IndexMap<String, Property>>,
  kind: ObjectKind,
}

/// A reference-counted handle to a host object. Clones share identity.
#[derive(Clone)]
pub struct JsObject(Rc<ObjectInner>);

impl JsObject {
  fn with_kind(kind: ObjectKind) -> Self {
    JsObject(Rc::new(ObjectInner {
      properties: RefCell::new(IndexMap::new()),
      kind,
    }))
  }

  pub fn new() -> Self {
    Self::with_kind(ObjectKind::Ordinary)
  }

  pub fn new_function(
    f: impl Fn(&JsValue, &[JsValue]) -> JsResult<JsValue> + 'static,
  ) -> Self {
    Self::with_kind(ObjectKind::Function(Rc::new(f)))
  }

  pub fn new_array(items: Vec<JsValue>) -> Self {
    Self::with_kind(ObjectKind::Array(RefCell::new(items)))
  }

  pub(crate) fn new_call_site(call_site: CallSite) -> Self {
    Self::with_kind(ObjectKind::CallSite(call_site))
  }

  pub(crate) fn new_error(
    error_type: ErrorType,
    name: &str,
    message: &str,
    context: ContextId,
    source_location: Option<(String, u32)>,
    frames: Vec<StackFrame>,
  ) -> Self {
    let object = Self::with_kind(ObjectKind::Error(ErrorData {
      error_type,
      context,
      source_location,
      stack: RefCell::new(StackSlot::Lazy(frames)),
    }));
    if name != error_type.name() {
      object.set("name", JsValue::string(name));
    }
    object.define_hidden("message", JsValue::string(message));
    object
  }

  pub fn ptr_eq(&self, other: &JsObject) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }

  pub fn as_function(&self) -> Option<JsFunction> {
    match &self.0.kind {
      ObjectKind::Function(f) => Some(JsFunction(f.clone())),
      _ => None,
    }
  }

  pub fn error_data(&self) -> Option<&ErrorData> {
    match &self.0.kind {
      ObjectKind::Error(data) => Some(data),
      _ => None,
    }
  }

  pub fn is_error(&self) -> bool {
    self.error_data().is_some()
  }

  pub fn call_site(&self) -> Option<&CallSite> {
    match &self.0.kind {
      ObjectKind::CallSite(call_site) => Some(call_site),
      _ => None,
    }
  }

  pub fn array(&self) -> Option<Ref<'_, Vec<JsValue>>> {
    match &self.0.kind {
      ObjectKind::Array(items) => Some(items.borrow()),
      _ => None,
    }
  }

  /// Own-property lookup. Error objects answer `name` from their
  /// constructor when no own `name` was assigned, and `stack` only once it has
  /// been materialized.
  pub fn get(&self, key: &str) -> JsValue {
    if let Some(property) = self.0.properties.borrow().get(key) {
      return property.value.clone();
    }
    match (&self.0.kind, key) {
      (ObjectKind::Array(items), "length") => {
        JsValue::Number(items.borrow().len() as f64)
      }
      (ObjectKind::Error(data), "name") => {
        JsValue::string(data.error_type.name())
      }
      (ObjectKind::Error(data), "stack") => match &*data.stack.borrow() {
        StackSlot::Value(value) => value.clone(),
        StackSlot::Lazy(_) => JsValue::Undefined,
      },
      _ => JsValue::Undefined,
    }
  }

  pub fn set(&self, key: &str, value: JsValue) {
    self.put(key, value, true);
  }

  /// Defines a non-enumerable data property.
  pub fn define_hidden(&self, key: &str, value: JsValue) {
    self.put(key, value, false);
  }

  fn put(&self, key: &str, value: JsValue, enumerable: bool) {
    if let (ObjectKind::Error(data), "stack") = (&self.0.kind, key) {
      *data.stack.borrow_mut() = StackSlot::Value(value);
      return;
    }
    self
      .0
      .properties
      .borrow_mut()
      .insert(key.to_string(), Property { value, enumerable });
  }

  pub fn has_own(&self, key: &str) -> bool {
    self.0.properties.borrow().contains_key(key)
  }

  pub fn property(&self, key: &str) -> Option<Property> {
    self.0.properties.borrow().get(key).cloned()
  }

  /// Enumerable own keys in insertion order.
  pub fn keys(&self) -> Vec<String> {
    self
      .0
      .properties
      .borrow()
      .iter()
      .filter(|(_, property)| property.enumerable)
      .map(|(key, _)| key.clone())
      .collect()
  }

  fn to_display_string(&self) -> String {
    match &self.0.kind {
      ObjectKind::Ordinary => "[object Object]".to_string(),
      ObjectKind::Function(_) => "function () { [native code] }".to_string(),
      ObjectKind::Array(items) => items
        .borrow()
        .iter()
        .map(|item| {
          if item.is_null_or_undefined() {
            String::new()
          } else {
            item.to_display_string()
          }
        })
        .collect::<Vec<_>>()
        .join(","),
      ObjectKind::Error(_) => {
        let name = self.get("name").to_display_string();
        let message = self.get("message").to_display_string();
        match (name.is_empty(), message.is_empty()) {
          (_, true) => name,
          (true, false) => message,
          (false, false) => format!("{name}: {message}"),
        }
      }
      ObjectKind::CallSite(call_site) => call_site.to_string(),
    }
  }
}

impl Default for JsObject {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for JsObject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.0.kind {
      ObjectKind::Ordinary => f
        .debug_map()
        .entries(
          self
            .0
            .properties
            .borrow()
            .iter()
            .map(|(key, property)| (key.clone(), property.value.clone())),
        )
        .finish(),
      ObjectKind::Function(_) => write!(f, "[Function]"),
      ObjectKind::Array(items) => {
        f.debug_list().entries(items.borrow().iter()).finish()
      }
      ObjectKind::Error(_) => write!(f, "[{}]", self.to_display_string()),
      ObjectKind::CallSite(call_site) => write!(f, "CallSite({call_site})"),
    }
  }
}

/// A callable extracted from a function object.
#[derive(Clone)]
pub struct JsFunction(Rc<NativeFunction>);

impl JsFunction {
  pub fn call(&self, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
    (self.0)(this, args)
  }
}

impl fmt::Debug for JsFunction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[Function]")
  }
}

// Copyright 2018-2026 the Deno authors. MIT license.

use serde::Deserialize;
use serde::Serialize;
use std::borrow::Borrow;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::ops::Deref;
use std::rc::Rc;

use crate::values::JsValue;

mod evaluate;
mod fetch;
mod loaders;
mod map;
mod resolve;
mod virtual_modules;

#[cfg(test)]
pub(crate) mod testing;

pub use evaluate::EvalEntryPoint;
pub use evaluate::ResumeMode;
pub use fetch::FetchParameters;
pub use loaders::FsModuleLoader;
pub use loaders::ModuleLoadOptions;
pub use loaders::ModuleLoadResponse;
pub use loaders::ModuleLoader;
pub use loaders::ModuleLoaderError;
pub use loaders::NoopModuleLoader;
pub use loaders::StaticModuleLoader;
pub(crate) use map::ModuleMap;
pub use map::RegistrySnapshot;
pub use virtual_modules::VirtualModuleFactory;
pub use virtual_modules::VirtualModuleRegistry;

/// The canonical string a module is registered under: a filesystem path, a
/// virtual module id or an embedder-defined name, plus any query string the
/// resolver attached.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey(Rc<str>);

impl ModuleKey {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl Deref for ModuleKey {
  type Target = str;

  fn deref(&self) -> &str {
    &self.0
  }
}

impl Borrow<str> for ModuleKey {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl AsRef<str> for ModuleKey {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ModuleKey {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl fmt::Debug for ModuleKey {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", &*self.0)
  }
}

impl From<&str> for ModuleKey {
  fn from(s: &str) -> Self {
    ModuleKey(s.into())
  }
}

impl From<String> for ModuleKey {
  fn from(s: String) -> Self {
    ModuleKey(s.into())
  }
}

impl PartialEq<str> for ModuleKey {
  fn eq(&self, other: &str) -> bool {
    &*self.0 == other
  }
}

impl PartialEq<&str> for ModuleKey {
  fn eq(&self, other: &&str) -> bool {
    &*self.0 == *other
  }
}

/// What a [`ModuleLoader`] hands back from `resolve`. The final module key is
/// `key` with `query` appended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSpecifier {
  pub key: String,
  pub query: Option<String>,
}

impl ResolvedSpecifier {
  pub fn new(key: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      query: None,
    }
  }

  pub fn with_query(key: impl Into<String>, query: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      query: Some(query.into()),
    }
  }

  pub fn into_module_key(self) -> ModuleKey {
    match self.query {
      Some(query) if !query.is_empty() => {
        ModuleKey::from(format!("{}{}", self.key, query))
      }
      _ => ModuleKey::from(self.key),
    }
  }
}

impl From<String> for ResolvedSpecifier {
  fn from(key: String) -> Self {
    Self::new(key)
  }
}

/// The actual source code returned from the loader.
#[derive(Debug)]
pub enum ModuleSourceCode {
  String(String),
  Bytes(Box<[u8]>),
  /// A ready-made exports value provided by a virtual module plugin. Such
  /// modules are never handed to the engine for evaluation.
  Synthetic(JsValue),
}

impl ModuleSourceCode {
  pub fn as_bytes(&self) -> Option<&[u8]> {
    match self {
      Self::String(s) => Some(s.as_bytes()),
      Self::Bytes(b) => Some(b),
      Self::Synthetic(_) => None,
    }
  }
}

/// A type of module to be executed.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ModuleType {
  JavaScript,
  Wasm,
  Json,
  Other(Cow<'static, str>),
}

impl std::fmt::Display for ModuleType {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Self::JavaScript => write!(f, "JavaScript"),
      Self::Wasm => write!(f, "Wasm"),
      Self::Json => write!(f, "JSON"),
      Self::Other(ty) => write!(f, "{}", ty),
    }
  }
}

/// The `type` import attribute, e.g.
/// `import("./data.json", { with: { type: "json" } })`.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum RequestedModuleType {
  /// There was no attribute specified in the import statement.
  #[default]
  None,
  Json,
  WebAssembly,
  /// An arbitrary module type. It is up to the loader to handle (or deny) it.
  Other(Cow<'static, str>),
}

impl RequestedModuleType {
  pub fn from_type_attribute(ty: Option<&str>) -> Self {
    match ty {
      None => RequestedModuleType::None,
      Some("json") => RequestedModuleType::Json,
      Some("webassembly") => RequestedModuleType::WebAssembly,
      Some(other) => RequestedModuleType::Other(Cow::Owned(other.to_string())),
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      RequestedModuleType::None => None,
      RequestedModuleType::Json => Some("json"),
      RequestedModuleType::WebAssembly => Some("webassembly"),
      RequestedModuleType::Other(ty) => Some(ty),
    }
  }
}

impl std::fmt::Display for RequestedModuleType {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Self::None => write!(f, "None"),
      Self::Json => write!(f, "JSON"),
      Self::WebAssembly => write!(f, "WebAssembly"),
      Self::Other(ty) => write!(f, "Other({ty})"),
    }
  }
}

/// Module source code handed back by a loader or a virtual module plugin.
#[derive(Debug)]
pub struct ModuleSource {
  pub code: ModuleSourceCode,
  pub module_type: ModuleType,
}

impl ModuleSource {
  pub fn new(
    module_type: impl Into<ModuleType>,
    code: ModuleSourceCode,
  ) -> Self {
    Self {
      code,
      module_type: module_type.into(),
    }
  }

  pub fn synthetic(exports: JsValue) -> Self {
    Self::new(ModuleType::JavaScript, ModuleSourceCode::Synthetic(exports))
  }
}

/// A fetched module as stored in the module-provide table.
#[derive(Clone, Debug)]
pub struct ModuleRecord {
  key: ModuleKey,
  source: Rc<ModuleSource>,
}

impl ModuleRecord {
  pub(crate) fn new(key: ModuleKey, source: ModuleSource) -> Self {
    Self {
      key,
      source: Rc::new(source),
    }
  }

  pub fn key(&self) -> &ModuleKey {
    &self.key
  }

  pub fn source(&self) -> &ModuleSource {
    &self.source
  }

  pub fn module_type(&self) -> &ModuleType {
    &self.source.module_type
  }

  /// The exports of a virtual module; `None` for anything the engine must
  /// evaluate.
  pub fn synthetic_exports(&self) -> Option<&JsValue> {
    match &self.source.code {
      ModuleSourceCode::Synthetic(exports) => Some(exports),
      _ => None,
    }
  }

  pub fn ptr_eq(&self, other: &ModuleRecord) -> bool {
    Rc::ptr_eq(&self.source, &other.source)
  }
}

pub type ModuleSourceFuture =
  dyn Future<Output = Result<ModuleSource, ModuleLoaderError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
  /// A static `import` or a module fetched through the pipeline.
  Import,
  /// An `import()` call.
  DynamicImport,
}

// Copyright 2018-2026 the Deno authors. MIT license.

//! Mock loader and engine shared by the crate's integration tests.

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;

use super::ModuleKey;
use super::ModuleLoadOptions;
use super::ModuleLoadResponse;
use super::ModuleLoader;
use super::ModuleLoaderError;
use super::ModuleRecord;
use super::ModuleSource;
use super::ModuleSourceCode;
use super::ModuleType;
use super::RequestedModuleType;
use super::ResolutionKind;
use super::ResolvedSpecifier;
use super::ResumeMode;
use super::VirtualModuleFactory;
use crate::error::Exception;
use crate::error::JsResult;
use crate::module_specifier::resolve_import_path;
use crate::runtime::JsRealm;
use crate::runtime::JsRuntime;
use crate::runtime::RuntimeOptions;
use crate::runtime::ScriptEngine;
use crate::stack_trace::StackFrame;
use crate::values::JsObject;
use crate::values::JsValue;

const A_SRC: &str = r#"import b from "./dir/b.js"; export default b;"#;
pub(crate) const B_SRC: &str = "export default 42;";
const DATA_SRC: &str = r#"{ "answer": 42 }"#;

fn mock_source_code(key: &str) -> Option<(&'static str, ModuleType)> {
  match key {
    "/a.js" => Some((A_SRC, ModuleType::JavaScript)),
    "/dir/b.js" => Some((B_SRC, ModuleType::JavaScript)),
    "/slow.js" => Some((B_SRC, ModuleType::JavaScript)),
    "/throws.js" => Some(("throw new Error('boom');", ModuleType::JavaScript)),
    "/data.json" => Some((DATA_SRC, ModuleType::Json)),
    _ => None,
  }
}

/// Serves a fixed set of modules and records what it was asked for.
#[derive(Default)]
pub(crate) struct MockLoader {
  pub(crate) resolve_count: Cell<usize>,
  pub(crate) loads: RefCell<Vec<(String, RequestedModuleType)>>,
}

impl ModuleLoader for MockLoader {
  fn resolve(
    &self,
    specifier: &str,
    referrer: &str,
    _kind: ResolutionKind,
  ) -> Result<ResolvedSpecifier, ModuleLoaderError> {
    self.resolve_count.set(self.resolve_count.get() + 1);
    let (path, query) = match specifier.split_once('?') {
      Some((path, query)) => (path, Some(format!("?{query}"))),
      None => (specifier, None),
    };
    Ok(ResolvedSpecifier {
      key: resolve_import_path(path, referrer)?,
      query,
    })
  }

  fn load(
    &self,
    module_key: &ModuleKey,
    _maybe_referrer: Option<&ModuleKey>,
    options: ModuleLoadOptions,
  ) -> ModuleLoadResponse {
    self.loads.borrow_mut().push((
      module_key.to_string(),
      options.requested_module_type.clone(),
    ));
    let path = module_key.split('?').next().unwrap_or_default();
    let result = match mock_source_code(path) {
      None => Err(ModuleLoaderError::NotFound(module_key.to_string())),
      Some((_, ModuleType::Json))
        if options.requested_module_type != RequestedModuleType::Json =>
      {
        Err(ModuleLoaderError::MissingJsonAttribute)
      }
      Some((code, module_type)) => Ok(ModuleSource::new(
        module_type,
        ModuleSourceCode::String(code.to_string()),
      )),
    };
    if path == "/slow.js" {
      ModuleLoadResponse::Async(async move { result }.boxed_local())
    } else {
      ModuleLoadResponse::Sync(result)
    }
  }
}

/// Reports whatever frames a test puts in `frames`.
#[derive(Default)]
pub(crate) struct MockEngine {
  pub(crate) frames: RefCell<Vec<StackFrame>>,
  pub(crate) evaluations: Cell<usize>,
}

impl ScriptEngine for MockEngine {
  fn current_stack_frames(&self) -> Vec<StackFrame> {
    self.frames.borrow().clone()
  }

  fn evaluate_module(
    &self,
    _realm: &JsRealm,
    record: &ModuleRecord,
    _sent_value: &JsValue,
    _resume_mode: ResumeMode,
  ) -> JsResult<JsValue> {
    self.evaluations.set(self.evaluations.get() + 1);
    if record.key().contains("throws") {
      return Err(Exception::Thrown(JsValue::from("boom")));
    }
    Ok(JsValue::from(format!("evaluated {}", record.key())))
  }
}

pub(crate) struct Setup {
  pub(crate) runtime: JsRuntime,
  pub(crate) realm: JsRealm,
  pub(crate) loader: Rc<MockLoader>,
  pub(crate) engine: Rc<MockEngine>,
}

pub(crate) fn setup() -> Setup {
  setup_with(RuntimeOptions::default())
}

pub(crate) fn setup_with(options: RuntimeOptions) -> Setup {
  let loader = Rc::new(MockLoader::default());
  let engine = Rc::new(MockEngine::default());
  let runtime = JsRuntime::new(RuntimeOptions {
    module_loader: Some(loader.clone()),
    script_engine: Some(engine.clone()),
    ..options
  });
  let realm = runtime.main_realm();
  Setup {
    runtime,
    realm,
    loader,
    engine,
  }
}

pub(crate) fn exports(value: &'static str) -> VirtualModuleFactory {
  Rc::new(move || {
    let exports = JsObject::new();
    exports.set("default", JsValue::from(value));
    Ok(exports.into())
  })
}

/// `Name: message` of a thrown error.
pub(crate) fn thrown_message(exception: &Exception) -> String {
  let object = exception
    .thrown_value()
    .and_then(JsValue::as_object)
    .expect("expected a thrown object");
  format!(
    "{}: {}",
    object.get("name").to_display_string(),
    object.get("message").to_display_string()
  )
}

pub(crate) fn string_value(value: &JsValue) -> String {
  value.as_str().expect("expected a string").to_string()
}

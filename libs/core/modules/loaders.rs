// Copyright 2018-2026 the Deno authors. MIT license.

use std::collections::HashMap;
use std::path::Path;
use std::pin::Pin;

use deno_error::JsErrorBox;

use crate::module_specifier::ModuleResolutionError;
use crate::module_specifier::resolve_import_path;
use crate::modules::ModuleKey;
use crate::modules::ModuleSource;
use crate::modules::ModuleSourceCode;
use crate::modules::ModuleSourceFuture;
use crate::modules::ModuleType;
use crate::modules::RequestedModuleType;
use crate::modules::ResolutionKind;
use crate::modules::ResolvedSpecifier;

#[derive(Debug, thiserror::Error, deno_error::JsError)]
pub enum ModuleLoaderError {
  #[class(inherit)]
  #[error(transparent)]
  Resolution(#[from] ModuleResolutionError),
  #[class(type)]
  #[error(
    "To load Node-API modules, use require() or process.dlopen instead of {via}."
  )]
  NativeAddon { via: &'static str },
  #[class("NotFound")]
  #[error("Module not found \"{0}\"")]
  NotFound(String),
  #[class(type)]
  #[error(
    "Attempted to load JSON module without specifying \"type\": \"json\" attribute in the import statement."
  )]
  MissingJsonAttribute,
  #[class(type)]
  #[error("Importing '{0}' modules is not supported")]
  UnsupportedType(String),
  #[class(syntax)]
  #[error("Failed to parse JSON module \"{specifier}\": {error}")]
  Json {
    specifier: String,
    error: serde_json::Error,
  },
  #[class(inherit)]
  #[error("{0}")]
  Io(#[from] std::io::Error),
  #[class(inherit)]
  #[error(transparent)]
  Other(#[from] JsErrorBox),
}

#[derive(Debug, Clone, Default)]
pub struct ModuleLoadOptions {
  pub is_dynamic_import: bool,
  /// If this is a synchronous load request (`importSync` or `require`). The
  /// caller blocks on an async response.
  pub is_synchronous: bool,
  pub requested_module_type: RequestedModuleType,
}

/// Result of calling `ModuleLoader::load`.
pub enum ModuleLoadResponse {
  /// Source file is available synchronously, eg. embedder might have
  /// collected all the necessary sources up front.
  Sync(Result<ModuleSource, ModuleLoaderError>),

  /// Source file needs to be loaded. Requires asynchronous
  /// operation (eg. reading a file from disk or fetching it over the
  /// network).
  Async(Pin<Box<ModuleSourceFuture>>),
}

pub trait ModuleLoader {
  /// Returns the canonical key for `specifier` imported from `referrer`,
  /// optionally with a query string to append.
  ///
  /// `kind` can be used to check permissions or deny dynamic imports
  /// altogether.
  fn resolve(
    &self,
    specifier: &str,
    referrer: &str,
    kind: ResolutionKind,
  ) -> Result<ResolvedSpecifier, ModuleLoaderError>;

  /// Given a module key, load its source code.
  fn load(
    &self,
    module_key: &ModuleKey,
    maybe_referrer: Option<&ModuleKey>,
    options: ModuleLoadOptions,
  ) -> ModuleLoadResponse;
}

/// Placeholder structure used when creating
/// a runtime that doesn't support module loading.
pub struct NoopModuleLoader;

impl ModuleLoader for NoopModuleLoader {
  fn resolve(
    &self,
    specifier: &str,
    referrer: &str,
    _kind: ResolutionKind,
  ) -> Result<ResolvedSpecifier, ModuleLoaderError> {
    Err(ModuleLoaderError::Other(JsErrorBox::generic(format!(
      "Module loading is not supported; attempted to resolve: \"{specifier}\" from \"{referrer}\""
    ))))
  }

  fn load(
    &self,
    module_key: &ModuleKey,
    maybe_referrer: Option<&ModuleKey>,
    _options: ModuleLoadOptions,
  ) -> ModuleLoadResponse {
    let maybe_referrer = match maybe_referrer {
      Some(referrer) => referrer.as_str(),
      None => "(no referrer)",
    };
    let err = JsErrorBox::generic(format!(
      "Module loading is not supported; attempted to load: \"{module_key}\" from \"{maybe_referrer}\"",
    ));
    ModuleLoadResponse::Sync(Err(err.into()))
  }
}

fn module_type_from_path(path: &Path) -> ModuleType {
  match path
    .extension()
    .map(|ext| ext.to_string_lossy().to_lowercase())
    .as_deref()
  {
    Some("json") => ModuleType::Json,
    Some("wasm") => ModuleType::Wasm,
    _ => ModuleType::JavaScript,
  }
}

fn check_requested_type(
  module_type: &ModuleType,
  requested_module_type: &RequestedModuleType,
) -> Result<(), ModuleLoaderError> {
  match (module_type, requested_module_type) {
    (ModuleType::Json, RequestedModuleType::Json) => Ok(()),
    (ModuleType::Json, _) => Err(ModuleLoaderError::MissingJsonAttribute),
    (_, RequestedModuleType::Other(ty)) => {
      Err(ModuleLoaderError::UnsupportedType(ty.to_string()))
    }
    _ => Ok(()),
  }
}

fn validate_json(
  specifier: &str,
  code: &str,
) -> Result<(), ModuleLoaderError> {
  serde_json::from_str::<serde_json::Value>(code)
    .map(|_| ())
    .map_err(|error| ModuleLoaderError::Json {
      specifier: specifier.to_string(),
      error,
    })
}

/// A simple module loader that allows loading source from memory. Keys are
/// resolved as filesystem-style paths.
pub struct StaticModuleLoader {
  map: HashMap<String, String>,
}

impl StaticModuleLoader {
  /// Create a new [`StaticModuleLoader`] from an `Iterator` of keys and code.
  pub fn new(
    from: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
  ) -> Self {
    Self {
      map: from
        .into_iter()
        .map(|(key, code)| (key.into(), code.into()))
        .collect(),
    }
  }

  /// Create a new [`StaticModuleLoader`] from a single key and code.
  pub fn with(key: impl Into<String>, code: impl Into<String>) -> Self {
    Self::new([(key, code)])
  }
}

impl ModuleLoader for StaticModuleLoader {
  fn resolve(
    &self,
    specifier: &str,
    referrer: &str,
    _kind: ResolutionKind,
  ) -> Result<ResolvedSpecifier, ModuleLoaderError> {
    Ok(resolve_import_path(specifier, referrer)?.into())
  }

  fn load(
    &self,
    module_key: &ModuleKey,
    _maybe_referrer: Option<&ModuleKey>,
    options: ModuleLoadOptions,
  ) -> ModuleLoadResponse {
    ModuleLoadResponse::Sync(
      if let Some(code) = self.map.get(module_key.as_str()) {
        let module_type = module_type_from_path(Path::new(module_key.as_str()));
        check_requested_type(&module_type, &options.requested_module_type)
          .and_then(|()| {
            if module_type == ModuleType::Json {
              validate_json(module_key, code)?;
            }
            Ok(ModuleSource::new(
              module_type,
              ModuleSourceCode::String(code.clone()),
            ))
          })
      } else {
        Err(ModuleLoaderError::NotFound(module_key.to_string()))
      },
    )
  }
}

/// Basic file system module loader.
///
/// Note that this loader will **block** event loop
/// when loading file as it uses synchronous FS API
/// from standard library.
pub struct FsModuleLoader;

impl ModuleLoader for FsModuleLoader {
  fn resolve(
    &self,
    specifier: &str,
    referrer: &str,
    _kind: ResolutionKind,
  ) -> Result<ResolvedSpecifier, ModuleLoaderError> {
    Ok(resolve_import_path(specifier, referrer)?.into())
  }

  fn load(
    &self,
    module_key: &ModuleKey,
    _maybe_referrer: Option<&ModuleKey>,
    options: ModuleLoadOptions,
  ) -> ModuleLoadResponse {
    fn load(
      module_key: &ModuleKey,
      requested_module_type: &RequestedModuleType,
    ) -> Result<ModuleSource, ModuleLoaderError> {
      let path = Path::new(module_key.as_str());
      if !path.is_absolute() {
        return Err(ModuleLoaderError::NotFound(module_key.to_string()));
      }
      let module_type = module_type_from_path(path);
      check_requested_type(&module_type, requested_module_type)?;

      let bytes = std::fs::read(path)?;
      let code = match module_type {
        ModuleType::Wasm => ModuleSourceCode::Bytes(bytes.into_boxed_slice()),
        ModuleType::Json => {
          let code = String::from_utf8_lossy(&bytes).into_owned();
          validate_json(module_key, &code)?;
          ModuleSourceCode::String(code)
        }
        _ => ModuleSourceCode::String(
          String::from_utf8_lossy(&bytes).into_owned(),
        ),
      };
      Ok(ModuleSource::new(module_type, code))
    }

    ModuleLoadResponse::Sync(load(module_key, &options.requested_module_type))
  }
}

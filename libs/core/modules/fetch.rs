// Copyright 2018-2026 the Deno authors. MIT license.

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use super::ModuleKey;
use super::ModuleLoadOptions;
use super::ModuleLoadResponse;
use super::ModuleLoaderError;
use super::ModuleRecord;
use super::ModuleSource;
use super::RequestedModuleType;
use crate::error::JsResult;
use crate::runtime::JsRealm;

/// Extra information about how a module is being fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchParameters {
  /// The `type` import attribute.
  pub requested_module_type: RequestedModuleType,
  pub is_dynamic_import: bool,
}

impl JsRealm {
  /// Fetches `key` and provides it to the registry. Failures, including a
  /// terminated execution, reject the returned future.
  pub fn fetch(
    &self,
    key: &ModuleKey,
    parameters: FetchParameters,
  ) -> LocalBoxFuture<'static, JsResult<ModuleRecord>> {
    let realm = self.clone();
    let key = key.clone();
    async move {
      let options = ModuleLoadOptions {
        is_dynamic_import: parameters.is_dynamic_import,
        is_synchronous: false,
        requested_module_type: parameters.requested_module_type,
      };
      let response = realm.begin_fetch(&key, options, "import")?;
      let result = match response {
        ModuleLoadResponse::Sync(result) => result,
        ModuleLoadResponse::Async(future) => future.await,
      };
      realm.finish_fetch(key, result)
    }
    .boxed_local()
  }

  /// Like [`JsRealm::fetch`], blocking on the loader when it answers
  /// asynchronously.
  pub fn fetch_sync(
    &self,
    key: &ModuleKey,
    parameters: FetchParameters,
  ) -> JsResult<ModuleRecord> {
    self.fetch_blocking(key, parameters, "import")
  }

  /// Serves `importSync(key)`.
  pub fn fulfill_module_sync(&self, key: &ModuleKey) -> JsResult<ModuleRecord> {
    self.fetch_blocking(key, FetchParameters::default(), "importSync")
  }

  fn fetch_blocking(
    &self,
    key: &ModuleKey,
    parameters: FetchParameters,
    via: &'static str,
  ) -> JsResult<ModuleRecord> {
    let options = ModuleLoadOptions {
      is_dynamic_import: parameters.is_dynamic_import,
      is_synchronous: true,
      requested_module_type: parameters.requested_module_type,
    };
    let result = match self.begin_fetch(key, options, via)? {
      ModuleLoadResponse::Sync(result) => result,
      ModuleLoadResponse::Async(future) => futures::executor::block_on(future),
    };
    self.finish_fetch(key.clone(), result)
  }

  fn begin_fetch(
    &self,
    key: &ModuleKey,
    options: ModuleLoadOptions,
    via: &'static str,
  ) -> JsResult<ModuleLoadResponse> {
    self.check_termination()?;
    // Native addons go through `require()`, even when a virtual module with
    // the same name exists.
    if key.ends_with(".node") {
      return Err(
        self.exception_from_error(&ModuleLoaderError::NativeAddon { via }),
      );
    }

    let module_map = self.module_map();
    if let Some(factory) = module_map.virtual_modules.get(key) {
      log::trace!("serving virtual module \"{key}\"");
      let exports = factory()?;
      return Ok(ModuleLoadResponse::Sync(Ok(ModuleSource::synthetic(
        exports,
      ))));
    }

    log::debug!(
      "loading module \"{key}\" (type: {})",
      options.requested_module_type
    );
    Ok(module_map.loader.load(key, None, options))
  }

  fn finish_fetch(
    &self,
    key: ModuleKey,
    result: Result<ModuleSource, ModuleLoaderError>,
  ) -> JsResult<ModuleRecord> {
    let source = result.map_err(|err| {
      log::debug!("failed to load module \"{key}\": {err}");
      self.exception_from_error(&err)
    })?;
    self.check_termination()?;
    Ok(self.module_map().provide(key, source))
  }
}

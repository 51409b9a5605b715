// Copyright 2018-2026 the Deno authors. MIT license.

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use super::FetchParameters;
use super::ModuleKey;
use super::RequestedModuleType;
use super::ResolutionKind;
use super::ResumeMode;
use crate::error::JsResult;
use crate::module_specifier::file_origin_path;
use crate::module_specifier::normalize_file_url;
use crate::module_specifier::referrer_from_origin;
use crate::runtime::JsRealm;
use crate::values::JsValue;

impl JsRealm {
  /// Resolves `specifier` imported from `referrer` to the key it is fetched
  /// and registered under.
  ///
  /// Virtual modules take precedence over the host loader, which is not
  /// consulted at all when one matches.
  pub fn resolve(
    &self,
    specifier: &str,
    referrer: &str,
  ) -> JsResult<ModuleKey> {
    self.check_termination()?;
    let specifier = normalize_file_url(specifier);
    self.resolve_specifier(
      &specifier,
      referrer,
      referrer,
      ResolutionKind::Import,
    )
  }

  fn resolve_specifier(
    &self,
    specifier: &str,
    virtual_referrer: &str,
    referrer: &str,
    kind: ResolutionKind,
  ) -> JsResult<ModuleKey> {
    let module_map = self.module_map();
    let virtual_modules = &module_map.virtual_modules;
    if virtual_modules.has_virtual_modules() {
      if let Some(key) =
        virtual_modules.resolve_virtual_module(specifier, virtual_referrer)
      {
        log::trace!("resolved \"{specifier}\" to virtual module \"{key}\"");
        return Ok(key);
      }
    } else {
      debug_assert!(!virtual_modules.must_do_expensive_relative_lookup());
    }

    let resolved = module_map
      .loader
      .resolve(specifier, referrer, kind)
      .map_err(|err| self.exception_from_error(&err))?;
    let key = resolved.into_module_key();
    log::trace!("resolved \"{specifier}\" from \"{referrer}\" to \"{key}\"");
    Ok(key)
  }

  /// `import(specifier, options)` issued by a script whose origin is
  /// `origin`. Every failure rejects the returned future.
  pub fn import_module(
    &self,
    specifier: &str,
    options: &JsValue,
    origin: &str,
  ) -> LocalBoxFuture<'static, JsResult<JsValue>> {
    let realm = self.clone();
    let specifier = normalize_file_url(specifier).into_owned();
    let options = options.clone();
    let origin = origin.to_string();
    async move {
      realm.check_termination()?;
      let requested_module_type = realm.requested_module_type(&options)?;
      let referrer = referrer_from_origin(&origin);
      let virtual_referrer = file_origin_path(&origin).unwrap_or_default();
      let key = realm.resolve_specifier(
        &specifier,
        &virtual_referrer,
        &referrer,
        ResolutionKind::DynamicImport,
      )?;
      log::debug!("dynamic import of \"{key}\" from \"{referrer}\"");

      let parameters = FetchParameters {
        requested_module_type,
        is_dynamic_import: true,
      };
      let record = realm.fetch(&key, parameters).await?;
      let script_fetcher =
        record.synthetic_exports().cloned().unwrap_or_default();
      realm.evaluate(
        &key,
        &record,
        &script_fetcher,
        &JsValue::Undefined,
        ResumeMode::Normal,
      )
    }
    .boxed_local()
  }

  /// Reads `options.with.type`.
  fn requested_module_type(
    &self,
    options: &JsValue,
  ) -> JsResult<RequestedModuleType> {
    let attributes = match options {
      JsValue::Undefined => return Ok(RequestedModuleType::None),
      JsValue::Object(options) => options.get("with"),
      _ => {
        return Err(
          self.type_error("The second argument of import() must be an object"),
        );
      }
    };
    let attributes = match attributes {
      JsValue::Undefined => return Ok(RequestedModuleType::None),
      JsValue::Object(attributes) => attributes,
      _ => return Err(self.type_error("The 'with' option must be an object")),
    };
    match attributes.get("type") {
      JsValue::Undefined => Ok(RequestedModuleType::None),
      JsValue::String(ty) => {
        Ok(RequestedModuleType::from_type_attribute(Some(&*ty)))
      }
      _ => Err(self.type_error("Import attribute value must be a string")),
    }
  }
}

// Copyright 2018-2026 the Deno authors. MIT license.

use std::cell::RefCell;

use super::ModuleKey;
use super::ModuleRecord;
use crate::error::Exception;
use crate::error::JsResult;
use crate::runtime::JsRealm;
use crate::runtime::PromiseFunction;
use crate::values::JsValue;

/// How a suspended module evaluation is resumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResumeMode {
  #[default]
  Normal,
  Throw,
  Return,
}

/// The module whose result an eval context reports back to the host.
pub struct EvalEntryPoint {
  key: ModuleKey,
  result: RefCell<Option<JsValue>>,
}

impl EvalEntryPoint {
  pub fn new(key: impl Into<ModuleKey>) -> Self {
    Self {
      key: key.into(),
      result: RefCell::new(None),
    }
  }

  pub fn key(&self) -> &ModuleKey {
    &self.key
  }

  pub fn result(&self) -> Option<JsValue> {
    self.result.borrow().clone()
  }
}

impl JsRealm {
  /// Evaluates a fetched module.
  ///
  /// An object `script_fetcher` is the already-built namespace of a virtual
  /// module and is returned without running anything.
  pub fn evaluate(
    &self,
    key: &ModuleKey,
    record: &ModuleRecord,
    script_fetcher: &JsValue,
    sent_value: &JsValue,
    resume_mode: ResumeMode,
  ) -> JsResult<JsValue> {
    self.check_termination()?;
    if script_fetcher.is_object() {
      let result = Ok(script_fetcher.clone());
      self.record_entry_point_result(key, &result)?;
      return result;
    }

    log::debug!("evaluating module \"{key}\" ({resume_mode:?})");
    let result = self
      .engine()
      .evaluate_module(self, record, sent_value, resume_mode);
    self.record_entry_point_result(key, &result)?;
    result
  }

  fn record_entry_point_result(
    &self,
    key: &ModuleKey,
    result: &JsResult<JsValue>,
  ) -> JsResult<()> {
    let Some(entry_point) = self
      .module_map()
      .eval_entry_point
      .as_ref()
      .filter(|entry_point| entry_point.key() == key)
    else {
      return Ok(());
    };
    let (function, value) = match result {
      Ok(value) => (PromiseFunction::OnResolveEntryPointResult, value),
      Err(Exception::Thrown(value)) => {
        (PromiseFunction::OnRejectEntryPointResult, value)
      }
      Err(Exception::Terminated) => return Ok(()),
    };
    *entry_point.result.borrow_mut() = Some(value.clone());

    match self.run_promise_handler(function, value) {
      Ok(_) => Ok(()),
      Err(Exception::Terminated) => Err(Exception::Terminated),
      Err(Exception::Thrown(exception)) => {
        self.report_unhandled_error(&exception);
        Ok(())
      }
    }
  }
}

// Copyright 2018-2026 the Deno authors. MIT license.

#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![deny(clippy::unused_async)]
#![deny(clippy::unnecessary_wraps)]

pub mod error;
mod module_specifier;
mod modules;
mod runtime;
pub mod source_map;
mod stack_trace;
mod values;

// Re-exports
pub use futures;
pub use serde;
pub use serde_json;
pub use sourcemap;
pub use thiserror;
pub use url;

pub use crate::error::Exception;
pub use crate::error::ExecutionTerminated;
pub use crate::error::JsError;
pub use crate::error::JsResult;
pub use crate::error::JsStackFrame;
pub use crate::module_specifier::ModuleResolutionError;
pub use crate::module_specifier::normalize_file_url;
pub use crate::module_specifier::resolve_import_path;
pub use crate::modules::EvalEntryPoint;
pub use crate::modules::FetchParameters;
pub use crate::modules::FsModuleLoader;
pub use crate::modules::ModuleKey;
pub use crate::modules::ModuleLoadOptions;
pub use crate::modules::ModuleLoadResponse;
pub use crate::modules::ModuleLoader;
pub use crate::modules::ModuleLoaderError;
pub use crate::modules::ModuleRecord;
pub use crate::modules::ModuleSource;
pub use crate::modules::ModuleSourceCode;
pub use crate::modules::ModuleSourceFuture;
pub use crate::modules::ModuleType;
pub use crate::modules::NoopModuleLoader;
pub use crate::modules::RegistrySnapshot;
pub use crate::modules::RequestedModuleType;
pub use crate::modules::ResolutionKind;
pub use crate::modules::ResolvedSpecifier;
pub use crate::modules::ResumeMode;
pub use crate::modules::StaticModuleLoader;
pub use crate::modules::VirtualModuleFactory;
pub use crate::modules::VirtualModuleRegistry;
pub use crate::runtime::ContextId;
pub use crate::runtime::ContextState;
pub use crate::runtime::CreateRealmOptions;
pub use crate::runtime::JsRealm;
pub use crate::runtime::JsRuntime;
pub use crate::runtime::MicrotaskTickHook;
pub use crate::runtime::NoopScriptEngine;
pub use crate::runtime::PromiseFunction;
pub use crate::runtime::PromiseHandlerError;
pub use crate::runtime::PromiseHandlerFn;
pub use crate::runtime::RuntimeOptions;
pub use crate::runtime::ScriptEngine;
pub use crate::runtime::TerminationHandle;
pub use crate::runtime::UnhandledErrorCb;
pub use crate::source_map::SourceMapApplication;
pub use crate::source_map::SourceMapGetter;
pub use crate::source_map::SourceMapper;
pub use crate::source_map::SourceRemapper;
pub use crate::stack_trace::CallSite;
pub use crate::stack_trace::DEFAULT_STACK_TRACE_LIMIT;
pub use crate::stack_trace::FrameKind;
pub use crate::stack_trace::LineColumn;
pub use crate::stack_trace::StackFrame;
pub use crate::values::ErrorData;
pub use crate::values::ErrorType;
pub use crate::values::JsFunction;
pub use crate::values::JsObject;
pub use crate::values::JsValue;
pub use crate::values::NativeFunction;
pub use crate::values::Property;
pub use deno_error::JsErrorBox;
pub use deno_error::JsErrorClass;

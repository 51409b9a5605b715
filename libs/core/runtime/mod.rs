// Copyright 2018-2026 the Deno authors. MIT license.

mod engine;
mod jsrealm;
mod jsruntime;
mod microtask;
mod next_tick;
mod promise_handlers;

pub use engine::NoopScriptEngine;
pub use engine::ScriptEngine;
pub use jsrealm::ContextId;
pub use jsrealm::ContextState;
pub use jsrealm::JsRealm;
pub use jsrealm::UnhandledErrorCb;
pub use jsruntime::CreateRealmOptions;
pub use jsruntime::JsRuntime;
pub use jsruntime::RuntimeOptions;
pub use jsruntime::TerminationHandle;
pub use next_tick::MicrotaskTickHook;
pub use promise_handlers::PromiseFunction;
pub use promise_handlers::PromiseHandlerError;
pub use promise_handlers::PromiseHandlerFn;

//! Stage Script - Rhai script binding and event dispatch
//!
//! - `ScriptEngine` owns the Rhai engine with the host API registered
//! - `bind` compiles each node's scripts, runs them once and registers the
//!   handlers they expose into an `EventChannelRegistry`
//! - `ScriptRuntime` dispatches channel events to those handlers, one isolated
//!   call per handler
//!
//! Scripts reach the player only through the handles in `ScriptContext`;
//! player-level requests are queued as `PlayerCommand`s.

pub mod api;
mod binder;
mod context;
mod diagnostics;
mod engine;
mod registry;
mod runtime;

pub use binder::{bind, BindOutcome};
pub use context::{PlayerCommand, PlayerStatus, ScriptContext};
pub use diagnostics::{BindDiagnostic, BindReport, RuntimeDiagnostic, ScriptLocation};
pub use engine::{ScriptEngine, ScriptLimits};
pub use registry::{EventChannelRegistry, HandlerBinding};
pub use runtime::{to_payload, CompiledScript, DispatchSummary, Payload, ScriptRuntime};

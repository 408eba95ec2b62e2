//! ScriptEngine: Rhai engine setup and execution limits
//!
//! One engine per player. The host API is registered once at construction;
//! every script compiled against it shares the same registrations.

use crate::api;
use log::{debug, info};
use rhai::{Engine, ParseError, AST};
use serde::{Deserialize, Serialize};

/// Per-call execution budget for scripts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptLimits {
    /// Operations allowed per top-level run or handler call; 0 disables the limit
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_expr_depth: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: 1_000_000,
            max_call_levels: 64,
            max_expr_depth: 64,
        }
    }
}

/// The scripting engine. Owns the Rhai Engine with the host API registered
pub struct ScriptEngine {
    engine: Engine,
    limits: ScriptLimits,
}

impl ScriptEngine {
    pub fn new(limits: ScriptLimits) -> Self {
        let mut engine = Engine::new();

        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);

        engine.on_print(|text| info!(target: "stage::script", "{}", text));
        engine.on_debug(|text, source, pos| match source {
            Some(source) => debug!(target: "stage::script", "{} @ {:?} | {}", source, pos, text),
            None => debug!(target: "stage::script", "{:?} | {}", pos, text),
        });

        api::register_all(&mut engine);

        Self { engine, limits }
    }

    /// Compile script source into an AST
    pub fn compile(&self, source: &str) -> Result<AST, ParseError> {
        self.engine.compile(source)
    }

    pub fn limits(&self) -> ScriptLimits {
        self.limits
    }

    pub(crate) fn rhai(&self) -> &Engine {
        &self.engine
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new(ScriptLimits::default())
    }
}

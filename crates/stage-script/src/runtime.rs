//! Bound scripts and the dispatcher that invokes their handlers

use crate::diagnostics::{RuntimeDiagnostic, ScriptLocation};
use crate::engine::ScriptEngine;
use crate::registry::{EventChannelRegistry, HandlerBinding};
use log::{error, warn};
use rhai::{CallFnOptions, Dynamic, Scope, AST};
use serde::Serialize;
use stage_core::NodeId;
use stage_runtime::Channel;

/// Event value handed to handlers
pub type Payload = Dynamic;

/// Runtime diagnostics kept before the oldest are discarded
const MAX_DIAGNOSTICS: usize = 256;

/// A script that compiled and ran once at load
pub struct CompiledScript {
    pub name: String,
    pub node: NodeId,
    pub(crate) ast: AST,
    /// Top-level variables, visible to handlers through closures
    pub(crate) scope: Scope<'static>,
}

/// What happened during one dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub invoked: usize,
    pub failed: usize,
}

/// The scripts bound for the current project together with their channels
#[derive(Default)]
pub struct ScriptRuntime {
    registry: EventChannelRegistry,
    scripts: Vec<CompiledScript>,
    diagnostics: Vec<RuntimeDiagnostic>,
}

impl ScriptRuntime {
    pub fn new(registry: EventChannelRegistry, scripts: Vec<CompiledScript>) -> Self {
        Self {
            registry,
            scripts,
            diagnostics: Vec::new(),
        }
    }

    pub fn registry(&self) -> &EventChannelRegistry {
        &self.registry
    }

    pub fn scripts(&self) -> &[CompiledScript] {
        &self.scripts
    }

    /// Invoke every handler on `channel` in registration order.
    ///
    /// The binding list is captured before the first call. A failing handler
    /// is logged and recorded; the remaining handlers still run.
    pub fn dispatch(
        &mut self,
        engine: &ScriptEngine,
        channel: Channel,
        payload: &Payload,
    ) -> DispatchSummary {
        let bindings: Vec<HandlerBinding> = self.registry.bindings(channel).to_vec();
        let mut summary = DispatchSummary::default();

        for binding in bindings {
            summary.invoked += 1;
            if let Err(diag) = self.invoke(engine, channel, &binding, payload) {
                summary.failed += 1;
                error!(target: "stage::script", "{}", diag);
                self.push_diagnostic(diag);
            }
        }
        summary
    }

    fn invoke(
        &mut self,
        engine: &ScriptEngine,
        channel: Channel,
        binding: &HandlerBinding,
        payload: &Dynamic,
    ) -> Result<(), RuntimeDiagnostic> {
        let Some(script) = self.scripts.get_mut(binding.script) else {
            return Err(RuntimeDiagnostic {
                channel,
                script: format!("#{}", binding.script),
                node: String::new(),
                message: "handler refers to a script that is no longer loaded".to_string(),
                location: None,
            });
        };

        let mut args: Vec<Dynamic> = binding.function.curry().to_vec();
        if binding.takes_payload {
            args.push(payload.clone());
        }
        let mut this = Dynamic::from(binding.node.clone());
        let options = CallFnOptions::new()
            .eval_ast(false)
            .rewind_scope(true)
            .bind_this_ptr(&mut this);

        engine
            .rhai()
            .call_fn_with_options::<Dynamic>(
                options,
                &mut script.scope,
                &script.ast,
                binding.function.fn_name(),
                args,
            )
            .map(|_| ())
            .map_err(|err| RuntimeDiagnostic {
                channel,
                script: script.name.clone(),
                node: script.node.to_string(),
                message: err.to_string(),
                location: ScriptLocation::from_position(err.position()),
            })
    }

    fn push_diagnostic(&mut self, diag: RuntimeDiagnostic) {
        self.diagnostics.push(diag);
        if self.diagnostics.len() > MAX_DIAGNOSTICS {
            let excess = self.diagnostics.len() - MAX_DIAGNOSTICS;
            self.diagnostics.drain(0..excess);
        }
    }

    /// Take the diagnostics recorded since the last drain
    pub fn drain_diagnostics(&mut self) -> Vec<RuntimeDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

/// Convert a host value into a script payload. Unserializable values become `()`.
pub fn to_payload<T: Serialize>(value: &T) -> Payload {
    rhai::serde::to_dynamic(value).unwrap_or_else(|err| {
        warn!(target: "stage::script", "Payload conversion failed: {}", err);
        Dynamic::UNIT
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind;
    use crate::context::ScriptContext;
    use crate::engine::ScriptLimits;
    use stage_core::lock;
    use stage_runtime::UpdateEvent;
    use stage_scene::{Camera, Node, SceneGraph, ScriptDescriptor};

    #[test]
    fn test_update_payload_is_a_map() {
        let payload = to_payload(&UpdateEvent {
            time: 16.0,
            delta: 16.0,
        });
        let map = payload.try_cast::<rhai::Map>().unwrap();
        assert_eq!(map["time"].as_float().unwrap(), 16.0);
        assert_eq!(map["delta"].as_float().unwrap(), 16.0);
    }

    #[test]
    fn test_dispatch_on_empty_runtime() {
        let engine = ScriptEngine::default();
        let mut runtime = ScriptRuntime::default();
        let summary = runtime.dispatch(&engine, Channel::Init, &Dynamic::UNIT);
        assert_eq!(summary, DispatchSummary::default());
        assert!(runtime.drain_diagnostics().is_empty());
    }

    fn context() -> ScriptContext {
        let mut graph = SceneGraph::new(Node::new("Scene", "Scene").with_uuid("root"));
        let root = graph.root();
        graph.add_child(root, Node::new("A", "Mesh").with_uuid("a")).unwrap();
        graph.add_child(root, Node::new("B", "Mesh").with_uuid("b")).unwrap();
        ScriptContext::detached(graph, Camera::new())
    }

    fn bound(
        engine: &ScriptEngine,
        ctx: &ScriptContext,
        scripts: &[(&str, &str, &str)],
    ) -> ScriptRuntime {
        let scripts: Vec<(String, Vec<ScriptDescriptor>)> = scripts
            .iter()
            .map(|(node, name, source)| {
                (
                    node.to_string(),
                    vec![ScriptDescriptor {
                        name: name.to_string(),
                        source: source.to_string(),
                    }],
                )
            })
            .collect();
        let outcome = bind(engine, ctx, &scripts);
        assert!(outcome.report.is_clean(), "{:?}", outcome.report.diagnostics);
        outcome.runtime
    }

    fn user_data(ctx: &ScriptContext, uuid: &str, key: &str) -> Option<serde_json::Value> {
        let scene = lock(&ctx.scene);
        let index = scene.find_by_uuid(uuid)?;
        scene.get(index)?.user_data.get(key).cloned()
    }

    #[test]
    fn test_this_is_the_owning_node() {
        let engine = ScriptEngine::default();
        let ctx = context();
        let source = r#"
            fn update(event) { this.set_user_data("seen", this.uuid); }
        "#;
        let mut runtime = bound(&engine, &ctx, &[("a", "tag", source), ("b", "tag", source)]);
        runtime.dispatch(&engine, Channel::Update, &Dynamic::UNIT);
        assert_eq!(user_data(&ctx, "a", "seen").unwrap(), "a");
        assert_eq!(user_data(&ctx, "b", "seen").unwrap(), "b");
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let engine = ScriptEngine::default();
        let ctx = context();
        let first = r#"
            #{ init: |e| scene.root().set_user_data("order", "first") }
        "#;
        let second = r#"
            #{ init: |e| {
                let so_far = scene.root().user_data("order");
                scene.root().set_user_data("order", so_far + ",second");
            } }
        "#;
        let mut runtime = bound(&engine, &ctx, &[("a", "one", first), ("b", "two", second)]);
        let summary = runtime.dispatch(&engine, Channel::Init, &Dynamic::UNIT);
        assert_eq!(summary.invoked, 2);
        assert_eq!(user_data(&ctx, "root", "order").unwrap(), "first,second");
    }

    #[test]
    fn test_failing_handler_does_not_stop_the_others() {
        let engine = ScriptEngine::default();
        let ctx = context();
        let broken = "#{ update: |e| { throw \"boom\"; } }";
        let healthy = "#{ update: |e| this_node.set_user_data(\"delta\", e.delta) }";
        let mut runtime = bound(&engine, &ctx, &[("a", "broken", broken), ("b", "healthy", healthy)]);

        let payload = to_payload(&UpdateEvent {
            time: 32.0,
            delta: 16.0,
        });
        let summary = runtime.dispatch(&engine, Channel::Update, &payload);
        assert_eq!(summary, DispatchSummary { invoked: 2, failed: 1 });
        assert_eq!(user_data(&ctx, "b", "delta").unwrap(), 16.0);

        let diagnostics = runtime.drain_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].channel, Channel::Update);
        assert_eq!(diagnostics[0].script, "broken");
        assert_eq!(diagnostics[0].node, "a");
        assert!(diagnostics[0].message.contains("boom"));
    }

    #[test]
    fn test_closures_keep_script_state() {
        let engine = ScriptEngine::default();
        let ctx = context();
        let source = r#"
            let count = 0;
            update = |e| {
                count += 1;
                this_node.set_user_data("count", count);
            };
        "#;
        let mut runtime = bound(&engine, &ctx, &[("a", "counter", source)]);
        for _ in 0..3 {
            runtime.dispatch(&engine, Channel::Update, &Dynamic::UNIT);
        }
        assert_eq!(user_data(&ctx, "a", "count").unwrap(), 3);
    }

    #[test]
    fn test_runaway_handler_is_stopped_and_reported() {
        let engine = ScriptEngine::new(ScriptLimits {
            max_operations: 10_000,
            ..Default::default()
        });
        let ctx = context();
        let mut runtime = bound(&engine, &ctx, &[("a", "spin", "fn update(e) { loop { } }")]);
        let summary = runtime.dispatch(&engine, Channel::Update, &Dynamic::UNIT);
        assert_eq!(summary.failed, 1);
        assert_eq!(runtime.drain_diagnostics().len(), 1);
    }

    #[test]
    fn test_diagnostics_are_bounded() {
        let engine = ScriptEngine::default();
        let ctx = context();
        let mut runtime = bound(&engine, &ctx, &[("a", "broken", "fn update(e) { throw 1; }")]);
        for _ in 0..MAX_DIAGNOSTICS + 10 {
            runtime.dispatch(&engine, Channel::Update, &Dynamic::UNIT);
        }
        assert_eq!(runtime.drain_diagnostics().len(), MAX_DIAGNOSTICS);
    }
}

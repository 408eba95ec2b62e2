//! Script binder: turns script descriptors into channel handler bindings
//!
//! Each script runs once at load inside its own scope. The scope exposes the
//! player handles plus one variable per channel name.
//! Whatever the script leaves behind becomes its handler record:
//!
//! ```rhai
//! // record form: the final expression is a map
//! #{ update: |event| this_node.rotate_y(event.delta * 0.001) }
//!
//! // variable form
//! keydown = |event| log(event.key);
//!
//! // function form; `this` is the node the script is attached to
//! fn start(event) { this.visible = true; }
//! ```

use crate::api::{CameraHandle, NodeHandle, PlayerHandle, RendererHandle, SceneHandle};
use crate::context::ScriptContext;
use crate::diagnostics::{BindDiagnostic, BindReport, ScriptLocation};
use crate::engine::ScriptEngine;
use crate::registry::{EventChannelRegistry, HandlerBinding};
use crate::runtime::{CompiledScript, ScriptRuntime};
use log::{debug, error, warn};
use rhai::{Dynamic, FnPtr, Scope, AST};
use stage_core::{lock, NodeId};
use stage_runtime::Channel;
use stage_scene::{NodeIndex, ScriptDescriptor};

/// Result of binding one project's scripts
pub struct BindOutcome {
    pub runtime: ScriptRuntime,
    pub report: BindReport,
}

/// Compile, execute and register every script, node by node in document order.
///
/// Failures never abort the pass: an unresolved node skips its scripts, a
/// script that fails to compile or run is skipped alone, and a bad record
/// entry is dropped while the rest of the record still registers.
pub fn bind(
    engine: &ScriptEngine,
    ctx: &ScriptContext,
    scripts: &[(String, Vec<ScriptDescriptor>)],
) -> BindOutcome {
    let mut registry = EventChannelRegistry::new();
    let mut compiled: Vec<CompiledScript> = Vec::new();
    let mut report = BindReport::default();

    for (uuid, descriptors) in scripts {
        let found = lock(&ctx.scene).find_by_uuid(uuid);
        let Some(index) = found else {
            warn!(target: "stage::script", "Script without object: {}", uuid);
            report.diagnostics.push(BindDiagnostic::UnresolvedNode { node: uuid.clone() });
            continue;
        };
        report.resolved_nodes += 1;

        for descriptor in descriptors {
            let slot = compiled.len();
            let Some(script) = run_script(engine, ctx, uuid, index, descriptor, &mut report) else {
                continue;
            };
            let node = NodeHandle::new(ctx.scene.clone(), index);
            report.handlers += register_record(&script, slot, &node, &mut registry, &mut report);
            report.bound_scripts += 1;
            compiled.push(script.compiled);
        }
    }

    debug!(
        target: "stage::script",
        "Bound {} scripts on {} nodes ({} handlers, {} diagnostics)",
        report.bound_scripts,
        report.resolved_nodes,
        report.handlers,
        report.diagnostics.len()
    );

    BindOutcome {
        runtime: ScriptRuntime::new(registry, compiled),
        report,
    }
}

/// A script that ran, with the value its top level produced
struct ExecutedScript {
    compiled: CompiledScript,
    result: Dynamic,
}

fn run_script(
    engine: &ScriptEngine,
    ctx: &ScriptContext,
    uuid: &str,
    index: NodeIndex,
    descriptor: &ScriptDescriptor,
    report: &mut BindReport,
) -> Option<ExecutedScript> {
    let ast = match engine.compile(&descriptor.source) {
        Ok(ast) => ast,
        Err(err) => {
            error!(
                target: "stage::script",
                "Compile error in '{}' ({}): {}", descriptor.name, uuid, err
            );
            report.diagnostics.push(BindDiagnostic::Compile {
                script: descriptor.name.clone(),
                node: uuid.to_string(),
                message: err.to_string(),
                location: ScriptLocation::from_position(err.position()),
            });
            return None;
        }
    };

    let mut scope = script_scope(ctx, index);
    match engine.rhai().eval_ast_with_scope::<Dynamic>(&mut scope, &ast) {
        Ok(result) => Some(ExecutedScript {
            compiled: CompiledScript {
                name: descriptor.name.clone(),
                node: NodeId::from(uuid),
                ast,
                scope,
            },
            result,
        }),
        Err(err) => {
            error!(
                target: "stage::script",
                "Execution error in '{}' ({}): {}", descriptor.name, uuid, err
            );
            report.diagnostics.push(BindDiagnostic::Execute {
                script: descriptor.name.clone(),
                node: uuid.to_string(),
                message: err.to_string(),
                location: ScriptLocation::from_position(err.position()),
            });
            None
        }
    }
}

fn script_scope(ctx: &ScriptContext, index: NodeIndex) -> Scope<'static> {
    let mut scope = Scope::new();
    scope
        .push("player", PlayerHandle::new(ctx.player.clone()))
        .push("renderer", RendererHandle::new(ctx.renderer.clone()))
        .push("scene", SceneHandle::new(ctx.scene.clone()))
        .push("camera", CameraHandle::new(ctx.camera.clone()))
        .push("this_node", NodeHandle::new(ctx.scene.clone(), index));
    for channel in Channel::ALL {
        scope.push_dynamic(channel.name(), Dynamic::UNIT);
    }
    scope
}

/// Register the handler record of one script; returns how many bindings it added
fn register_record(
    script: &ExecutedScript,
    slot: usize,
    node: &NodeHandle,
    registry: &mut EventChannelRegistry,
    report: &mut BindReport,
) -> usize {
    let compiled = &script.compiled;
    let mut added = 0;

    for (key, value) in handler_record(script) {
        if value.is_unit() {
            continue;
        }
        let Some(channel) = Channel::from_name(&key) else {
            warn!(
                target: "stage::script",
                "Event type not supported ({}) in '{}'", key, compiled.name
            );
            report.diagnostics.push(BindDiagnostic::UnsupportedChannel {
                script: compiled.name.clone(),
                node: compiled.node.to_string(),
                key,
            });
            continue;
        };
        let type_name = value.type_name().to_string();
        let Some(function) = value.try_cast::<FnPtr>() else {
            warn!(
                target: "stage::script",
                "Handler '{}' in '{}' is a {}, not a function", key, compiled.name, type_name
            );
            report.diagnostics.push(BindDiagnostic::NotAFunction {
                script: compiled.name.clone(),
                node: compiled.node.to_string(),
                channel: key,
                found: type_name,
            });
            continue;
        };

        let takes_payload = takes_payload(&compiled.ast, &function);
        registry.register(
            channel,
            HandlerBinding {
                script: slot,
                function,
                node: node.clone(),
                takes_payload,
            },
        );
        added += 1;
    }
    added
}

/// The (key, value) entries a script exposes, in a stable order
fn handler_record(script: &ExecutedScript) -> Vec<(String, Dynamic)> {
    if script.result.is_map() {
        if let Some(map) = script.result.clone().flatten().try_cast::<rhai::Map>() {
            return map
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.flatten()))
                .collect();
        }
    }

    let compiled = &script.compiled;
    let mut record = Vec::new();
    for channel in Channel::ALL {
        let name = channel.name();
        let from_var = compiled
            .scope
            .get_value::<Dynamic>(name)
            .map(Dynamic::flatten)
            .filter(|value| !value.is_unit());
        if let Some(value) = from_var {
            record.push((name.to_string(), value));
            continue;
        }
        if compiled.ast.iter_functions().any(|f| f.name == name) {
            match FnPtr::new(name) {
                Ok(ptr) => record.push((name.to_string(), Dynamic::from(ptr))),
                Err(err) => warn!(target: "stage::script", "Cannot reference fn {}: {}", name, err),
            }
        }
    }
    record
}

/// Whether the payload should be passed: true unless every definition of the
/// target function leaves no room for it after curried arguments
fn takes_payload(ast: &AST, function: &FnPtr) -> bool {
    let curried = function.curry().len();
    let mut arities = ast
        .iter_functions()
        .filter(|f| f.name == function.fn_name())
        .map(|f| f.params.len())
        .peekable();
    if arities.peek().is_none() {
        return true;
    }
    arities.any(|arity| arity == curried + 1)
}

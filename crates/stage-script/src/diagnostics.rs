//! Structured diagnostics for script binding and dispatch
//!
//! Rhai reports parse and runtime errors with positions. Both the binder and
//! the dispatcher wrap those into stable records the player can surface
//! without scraping logs.

use serde::Serialize;
use stage_runtime::Channel;
use std::fmt;

/// 1-based position inside a script's source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScriptLocation {
    pub line: usize,
    pub column: usize,
}

impl ScriptLocation {
    pub(crate) fn from_position(pos: rhai::Position) -> Option<Self> {
        Some(Self {
            line: pos.line()?,
            column: pos.position().unwrap_or(1).max(1),
        })
    }
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A problem found while binding scripts at load time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindDiagnostic {
    /// No node in the scene carries this uuid; all of its scripts were skipped
    UnresolvedNode { node: String },
    /// The script failed to parse
    Compile {
        script: String,
        node: String,
        message: String,
        location: Option<ScriptLocation>,
    },
    /// The script's top-level code raised an error
    Execute {
        script: String,
        node: String,
        message: String,
        location: Option<ScriptLocation>,
    },
    /// The handler record named something other than a channel
    UnsupportedChannel {
        script: String,
        node: String,
        key: String,
    },
    /// A channel entry held a value that cannot be called
    NotAFunction {
        script: String,
        node: String,
        channel: String,
        found: String,
    },
}

impl fmt::Display for BindDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindDiagnostic::UnresolvedNode { node } => {
                write!(f, "Script without object: {}", node)
            }
            BindDiagnostic::Compile {
                script,
                node,
                message,
                ..
            } => write!(f, "Compile error in '{}' ({}): {}", script, node, message),
            BindDiagnostic::Execute {
                script,
                node,
                message,
                ..
            } => write!(f, "Execution error in '{}' ({}): {}", script, node, message),
            BindDiagnostic::UnsupportedChannel { script, key, .. } => {
                write!(f, "Event type not supported ({}) in '{}'", key, script)
            }
            BindDiagnostic::NotAFunction {
                script,
                channel,
                found,
                ..
            } => write!(
                f,
                "Handler '{}' in '{}' is a {}, not a function",
                channel, script, found
            ),
        }
    }
}

/// Outcome of binding one project's scripts
#[derive(Debug, Clone, Default, Serialize)]
pub struct BindReport {
    pub diagnostics: Vec<BindDiagnostic>,
    /// Node uuids that resolved to a scene node
    pub resolved_nodes: usize,
    /// Scripts that compiled and ran
    pub bound_scripts: usize,
    /// Handler bindings registered across all channels
    pub handlers: usize,
}

impl BindReport {
    pub fn unresolved_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, BindDiagnostic::UnresolvedNode { .. }))
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// A handler that raised an error during dispatch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeDiagnostic {
    #[serde(serialize_with = "channel_name")]
    pub channel: Channel,
    pub script: String,
    pub node: String,
    pub message: String,
    pub location: Option<ScriptLocation>,
}

fn channel_name<S: serde::Serializer>(channel: &Channel, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(channel.name())
}

impl fmt::Display for RuntimeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} handler in '{}' ({}) failed: {}",
            self.channel, self.script, self.node, self.message
        )?;
        if let Some(location) = self.location {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_count() {
        let report = BindReport {
            diagnostics: vec![
                BindDiagnostic::UnresolvedNode { node: "a".into() },
                BindDiagnostic::UnsupportedChannel {
                    script: "s".into(),
                    node: "b".into(),
                    key: "click".into(),
                },
                BindDiagnostic::UnresolvedNode { node: "c".into() },
            ],
            ..Default::default()
        };
        assert_eq!(report.unresolved_count(), 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_diagnostic_serializes_with_kind_tag() {
        let diag = BindDiagnostic::UnsupportedChannel {
            script: "spin".into(),
            node: "cube".into(),
            key: "onclick".into(),
        };
        let value = serde_json::to_value(&diag).unwrap();
        assert_eq!(value["kind"], "unsupported_channel");
        assert_eq!(value["key"], "onclick");
    }

    #[test]
    fn test_runtime_diagnostic_display() {
        let diag = RuntimeDiagnostic {
            channel: Channel::Update,
            script: "spin".into(),
            node: "cube".into(),
            message: "boom".into(),
            location: Some(ScriptLocation { line: 3, column: 7 }),
        };
        assert_eq!(
            diag.to_string(),
            "update handler in 'spin' (cube) failed: boom at line 3, column 7"
        );
    }
}

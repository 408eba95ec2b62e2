//! Event channel registry: ordered handler bindings per channel

use crate::api::NodeHandle;
use rhai::FnPtr;
use stage_runtime::Channel;

/// A script callback bound to the node it came from
#[derive(Clone)]
pub struct HandlerBinding {
    /// Index of the owning script in its `ScriptRuntime`
    pub script: usize,
    pub function: FnPtr,
    /// Receiver supplied as `this` on every call
    pub node: NodeHandle,
    /// Whether the callback declares a parameter for the event payload
    pub takes_payload: bool,
}

/// Handler bindings for every channel, in registration order
#[derive(Clone)]
pub struct EventChannelRegistry {
    channels: [Vec<HandlerBinding>; Channel::ALL.len()],
}

impl Default for EventChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventChannelRegistry {
    /// A registry with every channel present and empty
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|_| Vec::new()),
        }
    }

    pub fn register(&mut self, channel: Channel, binding: HandlerBinding) {
        self.channels[channel.index()].push(binding);
    }

    pub fn bindings(&self, channel: Channel) -> &[HandlerBinding] {
        &self.channels[channel.index()]
    }

    pub fn len(&self, channel: Channel) -> usize {
        self.channels[channel.index()].len()
    }

    /// Bindings across all channels
    pub fn total(&self) -> usize {
        self.channels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn clear(&mut self) {
        for bindings in &mut self.channels {
            bindings.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_core::shared;
    use stage_scene::{Node, SceneGraph};

    fn binding(script: usize, name: &str) -> HandlerBinding {
        let graph = SceneGraph::new(Node::new("Scene", "Scene"));
        let root = graph.root();
        HandlerBinding {
            script,
            function: FnPtr::new(name).unwrap(),
            node: NodeHandle::new(shared(graph), root),
            takes_payload: true,
        }
    }

    #[test]
    fn test_new_registry_has_empty_channels() {
        let registry = EventChannelRegistry::new();
        for channel in Channel::ALL {
            assert!(registry.bindings(channel).is_empty());
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = EventChannelRegistry::new();
        registry.register(Channel::Update, binding(0, "first"));
        registry.register(Channel::Update, binding(1, "second"));
        registry.register(Channel::KeyDown, binding(1, "keys"));

        let names: Vec<_> = registry
            .bindings(Channel::Update)
            .iter()
            .map(|b| b.function.fn_name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(registry.len(Channel::KeyDown), 1);
        assert_eq!(registry.total(), 3);

        registry.clear();
        assert!(registry.is_empty());
    }
}

//! Stable scene-node identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// A node identifier assigned by the scene document.
///
/// Scene documents key scripts by this value, so it must survive
/// save/load cycles unchanged. Nodes without one get a fresh v4 uuid.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a new random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier string
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::from_raw(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation() {
        let id1 = NodeId::generate();
        let id2 = NodeId::generate();
        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 36);
    }

    #[test]
    fn test_from_raw() {
        let id = NodeId::from_raw("A1B2");
        assert_eq!(id.as_str(), "A1B2");
        assert_eq!(id.to_string(), "A1B2");
    }

    #[test]
    fn test_serde_transparent() {
        let id: NodeId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id, NodeId::from("abc"));
    }
}

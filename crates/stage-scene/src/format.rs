//! Project document format definitions

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use stage_animation::AnimationClip;
use stage_core::{StageError, Vec3};
use std::fmt;

/// Root structure of a project document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub project: RendererFlags,
    pub camera: Value,
    pub scene: Value,
    /// Scripts per node uuid, in document order
    #[serde(
        default,
        deserialize_with = "ordered_scripts",
        serialize_with = "scripts_as_map"
    )]
    pub scripts: Vec<(String, Vec<ScriptDescriptor>)>,
}

impl ProjectDocument {
    /// Parse a project document from a JSON string
    pub fn from_json(content: &str) -> stage_core::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Number of node uuids that carry scripts
    pub fn script_node_count(&self) -> usize {
        self.scripts.len()
    }
}

/// A behavior script attached to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDescriptor {
    pub name: String,
    pub source: String,
}

/// Renderer configuration carried by the document. Absent flags leave the
/// renderer setting unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadows: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_type: Option<ShadowType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_mapping: Option<ToneMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_mapping_exposure: Option<f32>,
}

/// Shadow-map filtering algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ShadowType {
    Basic,
    #[default]
    Pcf,
    PcfSoft,
    Vsm,
}

impl TryFrom<u32> for ShadowType {
    type Error = StageError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Basic),
            1 => Ok(Self::Pcf),
            2 => Ok(Self::PcfSoft),
            3 => Ok(Self::Vsm),
            _ => Err(StageError::InvalidEnumValue {
                value: value.to_string(),
                allowed: (0..=3).map(|v| v.to_string()).collect(),
            }),
        }
    }
}

impl From<ShadowType> for u32 {
    fn from(value: ShadowType) -> Self {
        value as u32
    }
}

/// Tone-mapping operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ToneMapping {
    #[default]
    None,
    Linear,
    Reinhard,
    Cineon,
    AcesFilmic,
    Custom,
    AgX,
    Neutral,
}

impl TryFrom<u32> for ToneMapping {
    type Error = StageError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::None,
            1 => Self::Linear,
            2 => Self::Reinhard,
            3 => Self::Cineon,
            4 => Self::AcesFilmic,
            5 => Self::Custom,
            6 => Self::AgX,
            7 => Self::Neutral,
            _ => {
                return Err(StageError::InvalidEnumValue {
                    value: value.to_string(),
                    allowed: (0..=7).map(|v| v.to_string()).collect(),
                })
            }
        })
    }
}

impl From<ToneMapping> for u32 {
    fn from(value: ToneMapping) -> Self {
        value as u32
    }
}

/// A scene or camera subtree: clip library plus the object tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDocument {
    #[serde(default)]
    pub animations: Vec<AnimationClip>,
    pub object: ObjectDef,
}

/// One object in the tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDef {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(rename = "type", default = "default_object_type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Option<Vec3>,
    /// Euler angles in radians
    #[serde(default)]
    pub rotation: Option<Vec3>,
    #[serde(default)]
    pub scale: Option<Vec3>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub user_data: Map<String, Value>,
    /// Uuids (or names) of clips in the document's clip library
    #[serde(default)]
    pub animations: Vec<String>,
    #[serde(default)]
    pub children: Vec<ObjectDef>,

    // Camera-only fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub near: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub far: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Vec3>,
}

fn default_object_type() -> String {
    "Object3D".to_string()
}

fn default_visible() -> bool {
    true
}

fn ordered_scripts<'de, D>(deserializer: D) -> Result<Vec<(String, Vec<ScriptDescriptor>)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScriptsVisitor;

    impl<'de> Visitor<'de> for ScriptsVisitor {
        type Value = Vec<(String, Vec<ScriptDescriptor>)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of node uuid to script list")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((uuid, scripts)) = map.next_entry()? {
                entries.push((uuid, scripts));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(ScriptsVisitor)
}

fn scripts_as_map<S: Serializer>(
    scripts: &[(String, Vec<ScriptDescriptor>)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(scripts.iter().map(|(uuid, list)| (uuid, list)))
}

//! Renderer state shared between the player, scripts and the backend

use crate::format::{RendererFlags, ShadowType, ToneMapping};
use stage_core::Shared;

pub type SharedRendererSettings = Shared<RendererSettings>;

/// Current renderer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RendererSettings {
    pub shadows: bool,
    pub shadow_type: ShadowType,
    pub tone_mapping: ToneMapping,
    pub tone_mapping_exposure: f32,
    /// Drawing surface size in CSS pixels
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            shadows: false,
            shadow_type: ShadowType::default(),
            tone_mapping: ToneMapping::default(),
            tone_mapping_exposure: 1.0,
            width: 500.0,
            height: 500.0,
            pixel_ratio: 1.0,
        }
    }
}

impl RendererSettings {
    /// Apply the flags present in a document; absent flags keep their value.
    pub fn apply_flags(&mut self, flags: &RendererFlags) {
        if let Some(shadows) = flags.shadows {
            self.shadows = shadows;
        }
        if let Some(shadow_type) = flags.shadow_type {
            self.shadow_type = shadow_type;
        }
        if let Some(tone_mapping) = flags.tone_mapping {
            self.tone_mapping = tone_mapping;
        }
        if let Some(exposure) = flags.tone_mapping_exposure {
            self.tone_mapping_exposure = exposure;
        }
    }

    /// Size of the backing buffer in device pixels
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).floor() as u32,
            (self.height * self.pixel_ratio).floor() as u32,
        )
    }
}

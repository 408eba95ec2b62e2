//! Stage Core - Foundational types for the Stage scene player
//!
//! This crate provides the types that all other Stage crates depend on:
//! - `NodeId` - Stable scene-node identifiers (uuid strings)
//! - `Transform`, `Vec3` - Spatial types
//! - `Shared<T>` - Lock-protected handles shared with scripts
//! - Error types and Result alias

mod error;
mod id;
mod shared;
mod types;

pub use error::{Result, StageError};
pub use id::NodeId;
pub use shared::{lock, shared, Shared};
pub use types::{mat4_mul, Transform, Vec3};

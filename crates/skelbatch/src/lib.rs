//! Per-frame render-batch builder for posed 2D skeletal characters.
//!
//! [`SkeletonRenderer::draw`] walks a [`Skeleton`]'s slots in draw order,
//! extracts world-space triangles from each attachment, clips them against
//! the active clipping polygon and groups them into batches that share one
//! texture page and one blend function. Each finished batch goes to a
//! [`RenderBackend`].

pub mod config;
pub mod render;
pub mod skeleton;
pub mod traits;

pub use config::RenderConfig;
pub use render::{CommandRecorder, DrawStats, SkeletonRenderer, Vertex};
pub use skeleton::Skeleton;
pub use traits::render::{DrawBatch, RenderBackend};

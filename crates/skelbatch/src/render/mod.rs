pub mod batch;
pub mod blend;
pub mod clipping;
pub mod color;
pub mod command_recorder;
pub mod geometry;
pub mod skeleton_renderer;
pub mod triangulator;

// Public API for library consumers
pub use batch::{Batch, BatchKey, BatchState, Vertex};
pub use blend::{BlendFactor, BlendFunc, select_blend};
pub use clipping::{ClippedGeometry, SkeletonClipper};
pub use color::{Rgba8, composite, composite_color};
pub use command_recorder::{CommandRecorder, RecordedBatch};
pub use geometry::{Extraction, GeometryExtractor, QUAD_INDICES, SkipReason, SlotGeometry};
pub use skeleton_renderer::{DrawStats, SkeletonRenderer};

use anyhow::Result;

use crate::render::batch::Vertex;
use crate::render::blend::BlendFunc;
use crate::skeleton::{BlendMode, TexturePage};

/// A finished batch handed to the backend.
///
/// The vertex and index slices borrow the renderer's working buffers, which
/// are cleared as soon as `flush` returns. Backends upload or copy them.
#[derive(Debug, Clone, Copy)]
pub struct DrawBatch<'a> {
    pub texture: TexturePage,
    pub blend_mode: BlendMode,
    pub blend: BlendFunc,
    /// Triangle-list vertices; texture coordinates are in page pixels.
    pub vertices: &'a [Vertex],
    pub indices: &'a [u32],
}

impl DrawBatch<'_> {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Raw vertex bytes for buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.indices)
    }
}

/// Abstraction over rendering backends.
/// Implementations: GPU submitters (downstream), CommandRecorder (testing).
pub trait RenderBackend {
    /// Submit one batch, homogeneous in texture and blend function.
    fn flush(&mut self, batch: &DrawBatch<'_>) -> Result<()>;
}

impl<B: RenderBackend + ?Sized> RenderBackend for &mut B {
    fn flush(&mut self, batch: &DrawBatch<'_>) -> Result<()> {
        (**self).flush(batch)
    }
}

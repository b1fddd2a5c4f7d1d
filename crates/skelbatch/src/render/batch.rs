use anyhow::Result;

use crate::render::blend::BlendFunc;
use crate::render::color::Rgba8;
use crate::skeleton::{BlendMode, TexturePage};
use crate::traits::render::{DrawBatch, RenderBackend};

/// Vertex data for one corner of a skeleton triangle.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    /// Texture coordinate in page pixels.
    pub tex_coords: [f32; 2],
    pub color: [u8; 4],
}

impl Vertex {
    pub const fn new(position: [f32; 2], tex_coords: [f32; 2], color: [u8; 4]) -> Self {
        Self {
            position,
            tex_coords,
            color,
        }
    }
}

/// What a batch must share: one texture page and one blend function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchKey {
    pub texture: TexturePage,
    pub blend_mode: BlendMode,
    pub blend: BlendFunc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    /// Nothing has been drawn yet this pass.
    #[default]
    Empty,
    Open(BatchKey),
}

/// The single open batch of a draw pass.
/// Buffers keep their capacity across passes.
#[derive(Debug, Default)]
pub struct Batch {
    state: BatchState,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            state: BatchState::Empty,
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    /// Clear all batched data for a new pass.
    pub fn reset(&mut self) {
        self.state = BatchState::Empty;
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Make `key` the open batch. A different open batch is flushed first.
    ///
    /// Returns whether a batch was submitted to the backend.
    pub fn open<B: RenderBackend + ?Sized>(&mut self, key: BatchKey, backend: &mut B) -> Result<bool> {
        match self.state {
            BatchState::Open(current) if current == key => Ok(false),
            BatchState::Empty => {
                self.state = BatchState::Open(key);
                Ok(false)
            }
            BatchState::Open(_) => {
                let flushed = self.flush(backend)?;
                self.state = BatchState::Open(key);
                Ok(flushed)
            }
        }
    }

    /// Append indexed triangles. `positions` and `uvs` hold `x, y` / `u, v`
    /// pairs; `uvs` are normalized and scaled here by the page size.
    pub fn append<I>(&mut self, positions: &[f32], uvs: &[f32], indices: &[I], color: Rgba8)
    where
        I: Copy + Into<u32>,
    {
        let BatchState::Open(key) = self.state else {
            return;
        };
        let width = key.texture.width as f32;
        let height = key.texture.height as f32;
        let base = self.vertices.len() as u32;

        self.vertices.extend(
            positions
                .chunks_exact(2)
                .zip(uvs.chunks_exact(2))
                .map(|(p, uv)| Vertex::new([p[0], p[1]], [uv[0] * width, uv[1] * height], color)),
        );
        self.indices
            .extend(indices.iter().map(|&index| base + index.into()));
    }

    /// Submit the accumulated geometry and clear it. The open key is kept.
    ///
    /// Empty batches are not submitted. Returns whether anything was sent.
    pub fn flush<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<bool> {
        let BatchState::Open(key) = self.state else {
            return Ok(false);
        };
        if self.vertices.is_empty() {
            return Ok(false);
        }

        log::trace!(
            "flush {:?} {} ({} vertices, {} indices)",
            key.texture.id,
            key.blend_mode.name(),
            self.vertices.len(),
            self.indices.len()
        );
        let result = backend.flush(&DrawBatch {
            texture: key.texture,
            blend_mode: key.blend_mode,
            blend: key.blend,
            vertices: &self.vertices,
            indices: &self.indices,
        });
        self.vertices.clear();
        self.indices.clear();
        result.map(|()| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::blend::select_blend;
    use crate::render::command_recorder::CommandRecorder;
    use crate::skeleton::TextureId;

    const QUAD: [f32; 8] = [0.0, 0.0, 32.0, 0.0, 32.0, 32.0, 0.0, 32.0];
    const QUAD_UVS: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
    const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

    fn key(texture: TexturePage, mode: BlendMode) -> BatchKey {
        BatchKey {
            texture,
            blend_mode: mode,
            blend: select_blend(mode, false),
        }
    }

    #[test]
    fn test_append_scales_uvs_by_page_size() {
        let mut recorder = CommandRecorder::new();
        let page = recorder.register_texture(256, 128);
        let mut batch = Batch::new();
        batch.open(key(page, BlendMode::Normal), &mut recorder).unwrap();
        batch.append(&QUAD, &QUAD_UVS, &QUAD_INDICES, [255; 4]);

        assert_eq!(batch.vertices().len(), 4);
        assert_eq!(batch.vertices()[2].tex_coords, [256.0, 128.0]);
        assert_eq!(batch.indices(), &[0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn test_append_rebases_indices() {
        let mut recorder = CommandRecorder::new();
        let page = recorder.register_texture(32, 32);
        let mut batch = Batch::new();
        batch.open(key(page, BlendMode::Normal), &mut recorder).unwrap();
        batch.append(&QUAD, &QUAD_UVS, &QUAD_INDICES, [255; 4]);
        batch.append(&QUAD, &QUAD_UVS, &QUAD_INDICES, [255; 4]);

        assert_eq!(batch.vertices().len(), 8);
        assert_eq!(&batch.indices()[6..], &[4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn test_append_without_open_batch_is_ignored() {
        let mut batch = Batch::new();
        batch.append(&QUAD, &QUAD_UVS, &QUAD_INDICES, [255; 4]);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_first_open_does_not_flush() {
        let mut recorder = CommandRecorder::new();
        let page = recorder.register_texture(32, 32);
        let mut batch = Batch::new();
        assert!(!batch.open(key(page, BlendMode::Normal), &mut recorder).unwrap());
        assert_eq!(batch.state(), BatchState::Open(key(page, BlendMode::Normal)));
        assert!(recorder.batches().is_empty());
    }

    #[test]
    fn test_different_blend_flushes() {
        let mut recorder = CommandRecorder::new();
        let page = recorder.register_texture(32, 32);
        let mut batch = Batch::new();
        batch.open(key(page, BlendMode::Normal), &mut recorder).unwrap();
        batch.append(&QUAD, &QUAD_UVS, &QUAD_INDICES, [255; 4]);

        assert!(batch.open(key(page, BlendMode::Additive), &mut recorder).unwrap());
        assert!(batch.is_empty());
        assert_eq!(recorder.batches().len(), 1);
        assert_eq!(recorder.batches()[0].blend_mode, BlendMode::Normal);
    }

    #[test]
    fn test_same_key_does_not_flush() {
        let mut recorder = CommandRecorder::new();
        let page = recorder.register_texture(32, 32);
        let mut batch = Batch::new();
        batch.open(key(page, BlendMode::Screen), &mut recorder).unwrap();
        batch.append(&QUAD, &QUAD_UVS, &QUAD_INDICES, [255; 4]);
        assert!(!batch.open(key(page, BlendMode::Screen), &mut recorder).unwrap());
        assert_eq!(batch.vertices().len(), 4);
    }

    #[test]
    fn test_empty_flush_is_suppressed() {
        let mut recorder = CommandRecorder::new();
        let page = recorder.register_texture(32, 32);
        let mut batch = Batch::new();
        assert!(!batch.flush(&mut recorder).unwrap());
        batch.open(key(page, BlendMode::Normal), &mut recorder).unwrap();
        assert!(!batch.flush(&mut recorder).unwrap());
        assert!(recorder.batches().is_empty());
    }

    #[test]
    fn test_flush_error_still_clears() {
        let mut recorder = CommandRecorder::new();
        let unknown = TexturePage::new(TextureId(999), 8, 8);
        let mut batch = Batch::new();
        batch.open(key(unknown, BlendMode::Normal), &mut recorder).unwrap();
        batch.append(&QUAD, &QUAD_UVS, &QUAD_INDICES, [255; 4]);
        assert!(batch.flush(&mut recorder).is_err());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_reset() {
        let mut recorder = CommandRecorder::new();
        let page = recorder.register_texture(32, 32);
        let mut batch = Batch::new();
        batch.open(key(page, BlendMode::Normal), &mut recorder).unwrap();
        batch.append(&QUAD, &QUAD_UVS, &QUAD_INDICES, [255; 4]);
        batch.reset();
        assert!(batch.is_empty());
        assert!(batch.indices().is_empty());
        assert_eq!(batch.state(), BatchState::Empty);
    }
}

use std::collections::HashMap;

use anyhow::{Result, anyhow};

use crate::render::batch::Vertex;
use crate::render::blend::BlendFunc;
use crate::skeleton::{BlendMode, TextureId, TexturePage};
use crate::traits::render::{DrawBatch, RenderBackend};

/// Owned copy of a flushed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBatch {
    pub texture: TexturePage,
    pub blend_mode: BlendMode,
    pub blend: BlendFunc,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl RecordedBatch {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A mock RenderBackend that records flushed batches for snapshot testing.
/// Does not require a GPU.
pub struct CommandRecorder {
    batches: Vec<RecordedBatch>,
    textures: HashMap<TextureId, (u32, u32)>,
    next_texture_id: u64,
}

impl Default for CommandRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
            textures: HashMap::new(),
            next_texture_id: 1,
        }
    }

    /// Get all recorded batches.
    pub fn batches(&self) -> &[RecordedBatch] {
        &self.batches
    }

    /// Clear recorded batches.
    pub fn clear_batches(&mut self) {
        self.batches.clear();
    }

    pub fn total_vertices(&self) -> usize {
        self.batches.iter().map(|b| b.vertices.len()).sum()
    }

    /// Register a mock texture page with specified dimensions.
    pub fn register_texture(&mut self, width: u32, height: u32) -> TexturePage {
        let id = TextureId(self.next_texture_id);
        self.next_texture_id += 1;
        self.textures.insert(id, (width, height));
        TexturePage::new(id, width, height)
    }

    /// Register a page created elsewhere, e.g. one named by a loaded skeleton.
    pub fn register_page(&mut self, page: TexturePage) {
        self.next_texture_id = self.next_texture_id.max(page.id.0 + 1);
        self.textures.insert(page.id, (page.width, page.height));
    }

    pub fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&id).copied()
    }
}

impl RenderBackend for CommandRecorder {
    fn flush(&mut self, batch: &DrawBatch<'_>) -> Result<()> {
        if !self.textures.contains_key(&batch.texture.id) {
            return Err(anyhow!("unknown texture: {:?}", batch.texture.id));
        }
        self.batches.push(RecordedBatch {
            texture: batch.texture,
            blend_mode: batch.blend_mode,
            blend: batch.blend,
            vertices: batch.vertices.to_vec(),
            indices: batch.indices.to_vec(),
        });
        Ok(())
    }
}

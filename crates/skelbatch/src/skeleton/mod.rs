//! Posed-skeleton snapshot consumed by the renderer.
//!
//! Posing, constraints and animation mixing happen upstream; by the time a
//! `Skeleton` reaches the renderer every bone already carries its world
//! transform. Drawing takes `&Skeleton`, so a pose update (which needs
//! `&mut Skeleton`) can never overlap a draw pass.

pub mod attachment;
pub mod bone;
pub mod color;
pub mod slot;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use attachment::{
    Attachment, BoneInfluence, ClippingAttachment, MeshAttachment, RegionAttachment, TextureId,
    TexturePage, VertexData, WeightedVertex,
};
pub use bone::Bone;
pub use color::Color;
pub use slot::{BlendMode, Slot, SlotId};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Skeleton {
    /// Overall tint; its alpha hides the whole skeleton when zero.
    pub color: Color,
    pub bones: Vec<Bone>,
    pub slots: Vec<Slot>,
    /// Slot ids in drawing order. Empty means storage order.
    pub draw_order: Vec<SlotId>,
}

impl Skeleton {
    pub fn new(bones: Vec<Bone>, slots: Vec<Slot>) -> Self {
        Self {
            color: Color::WHITE,
            bones,
            slots,
            draw_order: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_draw_order(mut self, order: Vec<SlotId>) -> Self {
        self.draw_order = order;
        self
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(id.0)
    }

    pub fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.slots.get_mut(id.0)
    }

    pub fn find_slot(&self, name: &str) -> Option<SlotId> {
        self.slots.iter().position(|s| s.name == name).map(SlotId)
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Distinct texture pages referenced by slot attachments, in slot order.
    pub fn texture_pages(&self) -> Vec<TexturePage> {
        let mut pages = Vec::new();
        for slot in &self.slots {
            let page = match &slot.attachment {
                Some(Attachment::Region(region)) => region.texture,
                Some(Attachment::Mesh(mesh)) => mesh.texture,
                _ => continue,
            };
            if !pages.contains(&page) {
                pages.push(page);
            }
        }
        pages
    }

    /// Slots in drawing order. Ids that do not name a slot are skipped.
    pub fn draw_order(&self) -> impl Iterator<Item = (SlotId, &Slot)> + '_ {
        let explicit = (!self.draw_order.is_empty()).then_some(self.draw_order.as_slice());
        let storage = explicit.is_none().then(|| (0..self.slots.len()).map(SlotId));
        explicit
            .into_iter()
            .flatten()
            .copied()
            .chain(storage.into_iter().flatten())
            .filter_map(|id| self.slot(id).map(|slot| (id, slot)))
    }

    /// Parse a posed-skeleton snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a posed-skeleton snapshot from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read skeleton {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("failed to parse skeleton {}", path.display()))
    }
}

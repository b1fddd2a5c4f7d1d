use serde::{Deserialize, Serialize};

use super::bone::Bone;
use super::color::Color;
use super::slot::SlotId;

/// Texture handle for referencing loaded atlas pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(pub u64);

/// An atlas page as seen by the renderer: handle plus pixel size.
///
/// The page is owned by the atlas; attachments only carry this copyable view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TexturePage {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl TexturePage {
    pub const fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }
}

/// One bone's contribution to a weighted vertex, in that bone's local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneInfluence {
    pub bone: usize,
    pub x: f32,
    pub y: f32,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightedVertex {
    pub influences: Vec<BoneInfluence>,
}

/// Vertex positions of a mesh or clipping polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexData {
    /// Flat `x, y` pairs in the slot bone's local space.
    Local(Vec<f32>),
    /// Skinned vertices blended from several bones.
    Weighted(Vec<WeightedVertex>),
}

impl Default for VertexData {
    fn default() -> Self {
        Self::Local(Vec::new())
    }
}

impl VertexData {
    /// Number of floats the world-space buffer needs (two per vertex).
    pub fn world_vertices_length(&self) -> usize {
        match self {
            Self::Local(coords) => coords.len() & !1,
            Self::Weighted(vertices) => vertices.len() * 2,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.world_vertices_length() / 2
    }

    /// Write world-space `x, y` pairs into `out`, replacing its contents.
    ///
    /// Influences naming a bone outside `bones` contribute nothing.
    pub fn compute_world_vertices(&self, bones: &[Bone], slot_bone: &Bone, out: &mut Vec<f32>) {
        out.clear();
        match self {
            Self::Local(coords) => {
                for pair in coords.chunks_exact(2) {
                    out.extend_from_slice(&slot_bone.local_to_world(pair[0], pair[1]));
                }
            }
            Self::Weighted(vertices) => {
                for vertex in vertices {
                    let (mut wx, mut wy) = (0.0, 0.0);
                    for influence in &vertex.influences {
                        let Some(bone) = bones.get(influence.bone) else {
                            continue;
                        };
                        let [x, y] = bone.local_to_world(influence.x, influence.y);
                        wx += x * influence.weight;
                        wy += y * influence.weight;
                    }
                    out.push(wx);
                    out.push(wy);
                }
            }
        }
    }
}

/// A textured quad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAttachment {
    #[serde(default)]
    pub color: Color,
    pub texture: TexturePage,
    /// Corner positions in the slot bone's local space, four `x, y` pairs.
    pub offset: [f32; 8],
    /// Normalized texture coordinates matching `offset`.
    pub uvs: [f32; 8],
}

impl RegionAttachment {
    /// Axis-aligned quad covering the whole page.
    /// Corners are ordered top-left, top-right, bottom-right, bottom-left.
    pub fn rect(texture: TexturePage, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            color: Color::WHITE,
            texture,
            offset: [
                x,
                y,
                x + width,
                y,
                x + width,
                y + height,
                x,
                y + height,
            ],
            uvs: [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Restrict the quad to a sub-rectangle of its page, in pixels.
    pub fn with_region(mut self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let tw = self.texture.width.max(1) as f32;
        let th = self.texture.height.max(1) as f32;
        let u0 = x as f32 / tw;
        let v0 = y as f32 / th;
        let u1 = (x + width) as f32 / tw;
        let v1 = (y + height) as f32 / th;
        self.uvs = [u0, v0, u1, v0, u1, v1, u0, v1];
        self
    }

    pub fn compute_world_vertices(&self, bone: &Bone, out: &mut Vec<f32>) {
        out.clear();
        for pair in self.offset.chunks_exact(2) {
            out.extend_from_slice(&bone.local_to_world(pair[0], pair[1]));
        }
    }
}

/// An arbitrary triangle mesh, optionally skinned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshAttachment {
    #[serde(default)]
    pub color: Color,
    pub texture: TexturePage,
    pub vertices: VertexData,
    /// Normalized texture coordinates, one `u, v` pair per vertex.
    pub uvs: Vec<f32>,
    /// Triangle list indexing into the vertices.
    pub triangles: Vec<u16>,
}

impl MeshAttachment {
    pub fn new(texture: TexturePage, vertices: VertexData, uvs: Vec<f32>, triangles: Vec<u16>) -> Self {
        Self {
            color: Color::WHITE,
            texture,
            vertices,
            uvs,
            triangles,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// A clipping polygon. Geometry drawn after it is clipped until the slot
/// `end_slot` has been drawn, or until the end of the pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClippingAttachment {
    pub vertices: VertexData,
    #[serde(default)]
    pub end_slot: Option<SlotId>,
}

impl ClippingAttachment {
    pub fn new(polygon: Vec<f32>) -> Self {
        Self {
            vertices: VertexData::Local(polygon),
            end_slot: None,
        }
    }

    pub fn until(mut self, end_slot: SlotId) -> Self {
        self.end_slot = Some(end_slot);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attachment {
    Region(RegionAttachment),
    Mesh(MeshAttachment),
    Clipping(ClippingAttachment),
}

impl From<RegionAttachment> for Attachment {
    fn from(region: RegionAttachment) -> Self {
        Self::Region(region)
    }
}

impl From<MeshAttachment> for Attachment {
    fn from(mesh: MeshAttachment) -> Self {
        Self::Mesh(mesh)
    }
}

impl From<ClippingAttachment> for Attachment {
    fn from(clip: ClippingAttachment) -> Self {
        Self::Clipping(clip)
    }
}

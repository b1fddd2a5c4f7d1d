use crate::skeleton::{Attachment, ClippingAttachment, Color, Skeleton, Slot, TexturePage};

/// Two triangles covering a region quad.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Largest mesh, in vertices, drawn by default.
pub const DEFAULT_MAX_MESH_VERTICES: usize = 1000;

/// Why a slot produced no geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    NoAttachment,
    /// Skeleton, slot or attachment alpha is zero.
    Invisible,
    InactiveBone,
    /// The slot names a bone the skeleton does not have.
    MissingBone,
    /// Mesh exceeds the working buffer capacity.
    MeshTooLarge,
    /// Mesh UVs or triangles do not match its vertices.
    MalformedMesh,
}

/// World-space triangles for one slot. Borrows the extractor's buffer.
#[derive(Debug, Clone, Copy)]
pub struct SlotGeometry<'a> {
    /// `x, y` pairs.
    pub positions: &'a [f32],
    /// Normalized `u, v` pairs, one per position.
    pub uvs: &'a [f32],
    pub indices: &'a [u16],
    /// Attachment tint.
    pub color: Color,
    pub texture: TexturePage,
}

impl SlotGeometry<'_> {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 2
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Extraction<'a> {
    Geometry(SlotGeometry<'a>),
    /// The slot shows a clipping polygon; it draws nothing itself.
    Clip(&'a ClippingAttachment),
    Skip(SkipReason),
}

/// Turns a slot's attachment into world-space triangles, reusing one buffer.
#[derive(Debug)]
pub struct GeometryExtractor {
    world_vertices: Vec<f32>,
    max_mesh_vertices: usize,
}

impl Default for GeometryExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESH_VERTICES)
    }
}

impl GeometryExtractor {
    pub fn new(max_mesh_vertices: usize) -> Self {
        Self {
            world_vertices: Vec::with_capacity(max_mesh_vertices.max(4) * 2),
            max_mesh_vertices,
        }
    }

    pub fn max_mesh_vertices(&self) -> usize {
        self.max_mesh_vertices
    }

    pub fn extract<'a>(&'a mut self, skeleton: &'a Skeleton, slot: &'a Slot) -> Extraction<'a> {
        let Some(attachment) = &slot.attachment else {
            return Extraction::Skip(SkipReason::NoAttachment);
        };
        if skeleton.color.a == 0.0 || slot.color.a == 0.0 {
            return Extraction::Skip(SkipReason::Invisible);
        }
        let Some(bone) = skeleton.bone(slot.bone) else {
            return Extraction::Skip(SkipReason::MissingBone);
        };
        if !bone.active {
            return Extraction::Skip(SkipReason::InactiveBone);
        }

        match attachment {
            Attachment::Clipping(clip) => Extraction::Clip(clip),
            Attachment::Region(region) => {
                if region.color.a == 0.0 {
                    return Extraction::Skip(SkipReason::Invisible);
                }
                region.compute_world_vertices(bone, &mut self.world_vertices);
                Extraction::Geometry(SlotGeometry {
                    positions: &self.world_vertices,
                    uvs: &region.uvs,
                    indices: &QUAD_INDICES,
                    color: region.color,
                    texture: region.texture,
                })
            }
            Attachment::Mesh(mesh) => {
                if mesh.color.a == 0.0 {
                    return Extraction::Skip(SkipReason::Invisible);
                }
                let length = mesh.vertices.world_vertices_length();
                let vertex_count = length / 2;
                if vertex_count > self.max_mesh_vertices {
                    log::trace!(
                        "skip slot {}: mesh has {} vertices (max {})",
                        slot.name,
                        vertex_count,
                        self.max_mesh_vertices
                    );
                    return Extraction::Skip(SkipReason::MeshTooLarge);
                }
                if mesh.uvs.len() < length
                    || mesh.triangles.len() % 3 != 0
                    || mesh.triangles.iter().any(|&i| i as usize >= vertex_count)
                {
                    log::trace!("skip slot {}: malformed mesh", slot.name);
                    return Extraction::Skip(SkipReason::MalformedMesh);
                }
                mesh.vertices
                    .compute_world_vertices(&skeleton.bones, bone, &mut self.world_vertices);
                Extraction::Geometry(SlotGeometry {
                    positions: &self.world_vertices,
                    uvs: &mesh.uvs[..length],
                    indices: &mesh.triangles,
                    color: mesh.color,
                    texture: mesh.texture,
                })
            }
        }
    }
}

use crate::render::triangulator::{Triangulator, cross, make_counter_clockwise, signed_area};
use crate::skeleton::{ClippingAttachment, Skeleton, Slot, SlotId};

/// Clipped triangles for one slot. Borrows the clipper's output buffers.
#[derive(Debug, Clone, Copy)]
pub struct ClippedGeometry<'a> {
    pub positions: &'a [f32],
    pub uvs: &'a [f32],
    pub indices: &'a [u32],
}

impl ClippedGeometry<'_> {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveClip {
    end_slot: Option<SlotId>,
}

/// Clips slot triangles against the active clipping polygon.
///
/// At most one polygon is active. Starting a new one replaces the old.
#[derive(Debug, Default)]
pub struct SkeletonClipper {
    active: Option<ActiveClip>,
    triangulator: Triangulator,
    polygon: Vec<f32>,
    /// Convex, counter-clockwise pieces of `polygon`.
    pieces: Vec<Vec<f32>>,
    scratch: Vec<f32>,
    polygon_out: Vec<f32>,
    positions: Vec<f32>,
    uvs: Vec<f32>,
    indices: Vec<u32>,
}

impl SkeletonClipper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_clipping(&self) -> bool {
        self.active.is_some()
    }

    /// World-space convex pieces of the active polygon.
    pub fn pieces(&self) -> &[Vec<f32>] {
        &self.pieces
    }

    /// Activate `clip`, positioned by `slot`'s bone. Returns the number of
    /// convex pieces; zero when the polygon is degenerate and nothing is clipped.
    pub fn clip_start(&mut self, skeleton: &Skeleton, slot: &Slot, clip: &ClippingAttachment) -> usize {
        self.clip_end_pass();

        let Some(bone) = skeleton.bone(slot.bone) else {
            log::warn!("clipping slot {} has no bone {}", slot.name, slot.bone);
            return 0;
        };
        clip.vertices
            .compute_world_vertices(&skeleton.bones, bone, &mut self.polygon);
        if self.polygon.len() < 6 || signed_area(&self.polygon) == 0.0 {
            log::warn!("clipping slot {}: degenerate polygon ignored", slot.name);
            self.polygon.clear();
            return 0;
        }

        make_counter_clockwise(&mut self.polygon);
        self.pieces = self.triangulator.decompose(&self.polygon);
        self.active = Some(ActiveClip {
            end_slot: clip.end_slot,
        });
        log::trace!(
            "clip start at slot {}: {} vertices, {} pieces",
            slot.name,
            self.polygon.len() / 2,
            self.pieces.len()
        );
        self.pieces.len()
    }

    /// Called after each slot is processed; ends clipping if `slot` closes it.
    pub fn clip_end(&mut self, slot: SlotId) {
        if let Some(active) = self.active
            && active.end_slot == Some(slot)
        {
            self.clip_end_pass();
        }
    }

    /// Unconditionally end clipping.
    pub fn clip_end_pass(&mut self) {
        self.active = None;
        self.polygon.clear();
        self.pieces.clear();
    }

    /// Clip indexed triangles against every convex piece.
    ///
    /// Triangles fully inside a piece keep their vertices and UVs; others
    /// are cut and fan-triangulated with UVs interpolated barycentrically.
    /// Nothing is produced while clipping is inactive.
    pub fn clip_triangles(&mut self, positions: &[f32], indices: &[u16], uvs: &[f32]) -> ClippedGeometry<'_> {
        self.positions.clear();
        self.uvs.clear();
        self.indices.clear();

        for triangle in indices.chunks_exact(3) {
            let [i1, i2, i3] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
            let corners = [
                [positions[i1 * 2], positions[i1 * 2 + 1]],
                [positions[i2 * 2], positions[i2 * 2 + 1]],
                [positions[i3 * 2], positions[i3 * 2 + 1]],
            ];
            let tex = [
                [uvs[i1 * 2], uvs[i1 * 2 + 1]],
                [uvs[i2 * 2], uvs[i2 * 2 + 1]],
                [uvs[i3 * 2], uvs[i3 * 2 + 1]],
            ];

            for piece in &self.pieces {
                let base = (self.positions.len() / 2) as u32;
                if !clip_triangle(corners, piece, &mut self.scratch, &mut self.polygon_out) {
                    // Pieces do not overlap, so no other piece can hold it.
                    self.positions.extend(corners.iter().flatten());
                    self.uvs.extend(tex.iter().flatten());
                    self.indices.extend([base, base + 1, base + 2]);
                    break;
                }

                let count = self.polygon_out.len() / 2;
                if count < 3 || signed_area(&self.polygon_out) == 0.0 {
                    continue;
                }
                let Some(weights) = Barycentric::new(corners) else {
                    continue;
                };
                for point in self.polygon_out.chunks_exact(2) {
                    let [a, b, c] = weights.at(point[0], point[1]);
                    self.positions.extend([point[0], point[1]]);
                    self.uvs.extend([
                        tex[0][0] * a + tex[1][0] * b + tex[2][0] * c,
                        tex[0][1] * a + tex[1][1] * b + tex[2][1] * c,
                    ]);
                }
                for i in 1..count as u32 - 1 {
                    self.indices.extend([base, base + i, base + i + 1]);
                }
            }
        }

        ClippedGeometry {
            positions: &self.positions,
            uvs: &self.uvs,
            indices: &self.indices,
        }
    }
}

/// Barycentric weights relative to one triangle.
struct Barycentric {
    x3: f32,
    y3: f32,
    d0: f32,
    d1: f32,
    d2: f32,
    d4: f32,
    inv: f32,
}

impl Barycentric {
    fn new(corners: [[f32; 2]; 3]) -> Option<Self> {
        let [[x1, y1], [x2, y2], [x3, y3]] = corners;
        let d0 = y2 - y3;
        let d1 = x3 - x2;
        let d2 = x1 - x3;
        let d4 = y3 - y1;
        let det = d0 * d2 + d1 * (y1 - y3);
        if det == 0.0 {
            return None;
        }
        Some(Self {
            x3,
            y3,
            d0,
            d1,
            d2,
            d4,
            inv: 1.0 / det,
        })
    }

    fn at(&self, x: f32, y: f32) -> [f32; 3] {
        let cx = x - self.x3;
        let cy = y - self.y3;
        let a = (self.d0 * cx + self.d1 * cy) * self.inv;
        let b = (self.d4 * cx + self.d2 * cy) * self.inv;
        [a, b, 1.0 - a - b]
    }
}

fn push_point(out: &mut Vec<f32>, x: f32, y: f32) {
    if let [.., lx, ly] = out.as_slice()
        && *lx == x
        && *ly == y
    {
        return;
    }
    out.extend([x, y]);
}

/// Sutherland-Hodgman against one convex counter-clockwise piece.
///
/// Returns false when the triangle is entirely inside, leaving `output`
/// unspecified. Otherwise `output` holds the clipped polygon, which is empty
/// when nothing is inside.
fn clip_triangle(triangle: [[f32; 2]; 3], piece: &[f32], input: &mut Vec<f32>, output: &mut Vec<f32>) -> bool {
    let mut clipped = false;
    output.clear();
    output.extend(triangle.iter().flatten());

    let edges = piece.len() / 2;
    for e in 0..edges {
        let (ex1, ey1) = (piece[e * 2], piece[e * 2 + 1]);
        let next = (e + 1) % edges;
        let (ex2, ey2) = (piece[next * 2], piece[next * 2 + 1]);

        std::mem::swap(input, output);
        output.clear();
        let count = input.len() / 2;
        for i in 0..count {
            let prev = (i + count - 1) % count;
            let (sx, sy) = (input[prev * 2], input[prev * 2 + 1]);
            let (px, py) = (input[i * 2], input[i * 2 + 1]);
            let ds = cross(ex1, ey1, ex2, ey2, sx, sy);
            let dp = cross(ex1, ey1, ex2, ey2, px, py);

            match (ds >= 0.0, dp >= 0.0) {
                (true, true) => push_point(output, px, py),
                (true, false) | (false, true) => {
                    clipped = true;
                    let t = ds / (ds - dp);
                    push_point(output, sx + (px - sx) * t, sy + (py - sy) * t);
                    if dp >= 0.0 {
                        push_point(output, px, py);
                    }
                }
                (false, false) => clipped = true,
            }
        }

        if output.len() >= 4 && output[0] == output[output.len() - 2] && output[1] == output[output.len() - 1] {
            output.truncate(output.len() - 2);
        }
        if output.is_empty() {
            return true;
        }
    }
    clipped
}

use anyhow::Result;

use crate::config::RenderConfig;
use crate::render::batch::{Batch, BatchKey};
use crate::render::clipping::SkeletonClipper;
use crate::render::color::composite;
use crate::render::geometry::{Extraction, GeometryExtractor};
use crate::skeleton::Skeleton;
use crate::traits::render::RenderBackend;

/// Counters for one draw pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Slots that appended geometry.
    pub slots_drawn: usize,
    /// Slots with no attachment, zero alpha, an inactive bone or an unusable mesh.
    pub slots_skipped: usize,
    /// Slots whose geometry lay entirely outside the active clip.
    pub slots_clipped_away: usize,
    pub clips_started: usize,
    pub batches_flushed: usize,
    pub vertices: usize,
    pub indices: usize,
}

/// Turns a posed skeleton into texture/blend homogeneous batches.
///
/// Working buffers live here and are reused from pass to pass; each pass
/// starts by resetting them.
#[derive(Debug)]
pub struct SkeletonRenderer {
    config: RenderConfig,
    extractor: GeometryExtractor,
    clipper: SkeletonClipper,
    batch: Batch,
}

impl Default for SkeletonRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl SkeletonRenderer {
    pub fn new(config: RenderConfig) -> Self {
        let max = config.max_mesh_vertices;
        Self {
            extractor: GeometryExtractor::new(max),
            clipper: SkeletonClipper::new(),
            batch: Batch::with_capacity(max, max * 3),
            config,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_premultiplied_alpha(&mut self, premultiplied: bool) {
        self.config.premultiplied_alpha = premultiplied;
    }

    pub fn is_clipping(&self) -> bool {
        self.clipper.is_clipping()
    }

    /// Walk the slots in draw order and submit batches to `backend`.
    ///
    /// A batch is flushed whenever the texture page or blend function changes,
    /// and once more at the end. Empty batches are never submitted. A backend
    /// error aborts the pass.
    pub fn draw<B: RenderBackend + ?Sized>(&mut self, skeleton: &Skeleton, backend: &mut B) -> Result<DrawStats> {
        self.batch.reset();
        self.clipper.clip_end_pass();

        let mut stats = DrawStats::default();
        if skeleton.color.a == 0.0 {
            log::debug!("skeleton alpha is zero; nothing to draw");
            return Ok(stats);
        }

        let premultiplied = self.config.premultiplied_alpha;
        for (id, slot) in skeleton.draw_order() {
            match self.extractor.extract(skeleton, slot) {
                Extraction::Clip(clip) => {
                    if self.clipper.clip_start(skeleton, slot, clip) > 0 {
                        stats.clips_started += 1;
                    }
                    continue;
                }
                Extraction::Skip(_) => stats.slots_skipped += 1,
                Extraction::Geometry(geometry) => {
                    let (color, blend) = composite(
                        skeleton.color,
                        slot.color,
                        geometry.color,
                        slot.blend_mode,
                        premultiplied,
                    );
                    let key = BatchKey {
                        texture: geometry.texture,
                        blend_mode: slot.blend_mode,
                        blend,
                    };
                    // A slot with nothing left after clipping leaves the open batch alone.
                    if self.clipper.is_clipping() {
                        let clipped =
                            self.clipper
                                .clip_triangles(geometry.positions, geometry.indices, geometry.uvs);
                        if clipped.is_empty() {
                            stats.slots_clipped_away += 1;
                        } else {
                            if self.batch.open(key, backend)? {
                                stats.batches_flushed += 1;
                            }
                            stats.slots_drawn += 1;
                            stats.vertices += clipped.vertex_count();
                            stats.indices += clipped.indices.len();
                            self.batch
                                .append(clipped.positions, clipped.uvs, clipped.indices, color);
                        }
                    } else {
                        if self.batch.open(key, backend)? {
                            stats.batches_flushed += 1;
                        }
                        stats.slots_drawn += 1;
                        stats.vertices += geometry.vertex_count();
                        stats.indices += geometry.indices.len();
                        self.batch
                            .append(geometry.positions, geometry.uvs, geometry.indices, color);
                    }
                }
            }
            self.clipper.clip_end(id);
        }

        if self.batch.flush(backend)? {
            stats.batches_flushed += 1;
        }
        self.clipper.clip_end_pass();

        log::debug!(
            "draw pass: {} slots drawn, {} skipped, {} clipped away, {} batches, {} vertices",
            stats.slots_drawn,
            stats.slots_skipped,
            stats.slots_clipped_away,
            stats.batches_flushed,
            stats.vertices
        );
        Ok(stats)
    }
}

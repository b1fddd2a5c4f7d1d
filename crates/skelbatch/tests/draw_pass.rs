use std::path::PathBuf;

use proptest::prelude::*;
use skelbatch::render::{SkeletonClipper, select_blend, triangulator::signed_area};
use skelbatch::skeleton::{
    BlendMode, Bone, ClippingAttachment, Color, MeshAttachment, RegionAttachment, Slot, SlotId,
    TextureId, TexturePage, VertexData,
};
use skelbatch::{CommandRecorder, RenderConfig, Skeleton, SkeletonRenderer};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn quad(page: TexturePage, x: f32, y: f32, size: f32) -> RegionAttachment {
    RegionAttachment::rect(page, x, y, size, size)
}

#[test]
fn test_three_slots_make_two_batches() {
    let mut recorder = CommandRecorder::new();
    let t1 = recorder.register_texture(256, 256);
    let t2 = recorder.register_texture(128, 128);
    let skeleton = Skeleton::new(
        vec![Bone::new("root")],
        vec![
            Slot::new("a", 0).with_attachment(quad(t1, 0.0, 0.0, 10.0)),
            Slot::new("b", 0).with_attachment(quad(t1, 10.0, 0.0, 10.0)),
            Slot::new("c", 0)
                .with_attachment(quad(t2, 0.0, 0.0, 10.0))
                .with_blend_mode(BlendMode::Additive),
        ],
    );

    let stats = SkeletonRenderer::default().draw(&skeleton, &mut recorder).unwrap();

    let batches = recorder.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(stats.batches_flushed, 2);
    assert_eq!((batches[0].texture, batches[0].blend_mode), (t1, BlendMode::Normal));
    assert_eq!(batches[0].vertices.len(), 8);
    assert_eq!((batches[1].texture, batches[1].blend_mode), (t2, BlendMode::Additive));
    assert_eq!(batches[1].vertices.len(), 4);
    assert_eq!(batches[1].blend, select_blend(BlendMode::Additive, false));
}

#[test]
fn test_region_outside_left_half_clip_is_dropped() {
    let mut recorder = CommandRecorder::new();
    let page = recorder.register_texture(64, 64);
    let left_half = vec![0.0, 0.0, 50.0, 0.0, 50.0, 100.0, 0.0, 100.0];
    let skeleton = Skeleton::new(
        vec![Bone::new("root")],
        vec![
            Slot::new("clip", 0).with_attachment(ClippingAttachment::new(left_half)),
            Slot::new("right", 0).with_attachment(quad(page, 60.0, 10.0, 20.0)),
        ],
    );

    let stats = SkeletonRenderer::default().draw(&skeleton, &mut recorder).unwrap();

    assert_eq!(stats.slots_clipped_away, 1);
    assert_eq!(stats.vertices, 0);
    assert_eq!(recorder.total_vertices(), 0);
    assert!(recorder.batches().is_empty());
}

#[test]
fn test_region_straddling_clip_is_cut_with_pixel_uvs() {
    let mut recorder = CommandRecorder::new();
    let page = recorder.register_texture(100, 100);
    let skeleton = Skeleton::new(
        vec![Bone::new("root")],
        vec![
            Slot::new("clip", 0).with_attachment(ClippingAttachment::new(vec![
                0.0, 0.0, 50.0, 0.0, 50.0, 100.0, 0.0, 100.0,
            ])),
            Slot::new("wide", 0).with_attachment(quad(page, 0.0, 0.0, 100.0)),
        ],
    );

    SkeletonRenderer::default().draw(&skeleton, &mut recorder).unwrap();

    let batch = &recorder.batches()[0];
    for vertex in &batch.vertices {
        assert!(vertex.position[0] <= 50.0 + 1e-3);
        // The quad maps 1:1 onto a 100px page, so pixel UVs equal positions.
        assert!((vertex.tex_coords[0] - vertex.position[0]).abs() < 1e-3);
        assert!((vertex.tex_coords[1] - vertex.position[1]).abs() < 1e-3);
    }
}

#[test]
fn test_zero_alpha_appends_nothing() {
    let mut recorder = CommandRecorder::new();
    let page = recorder.register_texture(64, 64);
    let hidden_slot = Slot::new("a", 0)
        .with_attachment(quad(page, 0.0, 0.0, 1.0))
        .with_color(Color::new(1.0, 1.0, 1.0, 0.0));
    let hidden_attachment =
        Slot::new("b", 0).with_attachment(quad(page, 0.0, 0.0, 1.0).with_color(Color::TRANSPARENT));
    let skeleton = Skeleton::new(vec![Bone::new("root")], vec![hidden_slot, hidden_attachment]);

    let stats = SkeletonRenderer::default().draw(&skeleton, &mut recorder).unwrap();

    assert_eq!(stats.slots_skipped, 2);
    assert_eq!(recorder.total_vertices(), 0);
}

#[test]
fn test_region_emits_quad_pattern() {
    let mut recorder = CommandRecorder::new();
    let page = recorder.register_texture(32, 32);
    let skeleton = Skeleton::new(
        vec![Bone::rotated("root", 5.0, 5.0, std::f32::consts::FRAC_PI_4, 2.0)],
        vec![Slot::new("a", 0).with_attachment(quad(page, -1.0, -1.0, 2.0))],
    );

    SkeletonRenderer::default().draw(&skeleton, &mut recorder).unwrap();

    let batch = &recorder.batches()[0];
    assert_eq!(batch.vertices.len(), 4);
    assert_eq!(batch.indices, vec![0, 1, 2, 2, 3, 0]);
    assert_eq!(batch.vertices[2].tex_coords, [32.0, 32.0]);
}

#[test]
fn test_weighted_mesh_is_skinned() {
    let mut recorder = CommandRecorder::new();
    let page = recorder.register_texture(16, 16);
    let weighted = serde_json::from_str::<VertexData>(
        r#"{ "weighted": [
            { "influences": [ { "bone": 0, "x": 0.0, "y": 0.0, "weight": 1.0 } ] },
            { "influences": [ { "bone": 1, "x": 0.0, "y": 0.0, "weight": 1.0 } ] },
            { "influences": [
                { "bone": 0, "x": 0.0, "y": 10.0, "weight": 0.5 },
                { "bone": 1, "x": 0.0, "y": 10.0, "weight": 0.5 }
            ] }
        ] }"#,
    )
    .unwrap();
    let mesh = MeshAttachment::new(page, weighted, vec![0.0, 0.0, 1.0, 0.0, 0.5, 1.0], vec![0, 1, 2]);
    let skeleton = Skeleton::new(
        vec![Bone::at("root", 0.0, 0.0), Bone::at("tip", 20.0, 0.0)],
        vec![Slot::new("mesh", 0).with_attachment(mesh)],
    );

    SkeletonRenderer::default().draw(&skeleton, &mut recorder).unwrap();

    let positions: Vec<_> = recorder.batches()[0].vertices.iter().map(|v| v.position).collect();
    assert_eq!(positions, vec![[0.0, 0.0], [20.0, 0.0], [10.0, 10.0]]);
}

#[test]
fn test_renderer_reuse_across_passes() {
    let mut recorder = CommandRecorder::new();
    let page = recorder.register_texture(32, 32);
    let skeleton = Skeleton::new(
        vec![Bone::new("root")],
        vec![Slot::new("a", 0).with_attachment(quad(page, 0.0, 0.0, 4.0))],
    );
    let mut renderer = SkeletonRenderer::default();

    let first = renderer.draw(&skeleton, &mut recorder).unwrap();
    let second = renderer.draw(&skeleton, &mut recorder).unwrap();

    assert_eq!(first, second);
    assert_eq!(recorder.batches().len(), 2);
    assert_eq!(recorder.batches()[0], recorder.batches()[1]);
}

#[test]
fn test_fixture_scene() {
    let skeleton = Skeleton::load_from(fixture("hero.json")).unwrap();
    let mut recorder = CommandRecorder::new();
    for page in skeleton.texture_pages() {
        recorder.register_page(page);
    }

    let stats = SkeletonRenderer::default().draw(&skeleton, &mut recorder).unwrap();

    let t1 = TexturePage::new(TextureId(1), 256, 256);
    let t2 = TexturePage::new(TextureId(2), 128, 128);
    let summary: Vec<_> = recorder
        .batches()
        .iter()
        .map(|b| (b.texture, b.blend_mode, b.vertices.len()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (t1, BlendMode::Normal, 8),
            (t2, BlendMode::Additive, 4),
            (t1, BlendMode::Normal, 3),
        ]
    );
    assert_eq!(stats.slots_drawn, 4);
    assert_eq!(stats.slots_clipped_away, 1);
    assert_eq!(stats.clips_started, 1);

    // The arm slot tints red by half in green and blue.
    assert_eq!(recorder.batches()[0].vertices[4].color, [255, 128, 128, 255]);
    // The arm follows its bone.
    assert_eq!(recorder.batches()[0].vertices[4].position, [10.0, 0.0]);
}

#[test]
fn test_fixture_with_premultiplied_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("render.json");
    std::fs::write(&config_path, r#"{ "premultiplied_alpha": true }"#).unwrap();
    let config = RenderConfig::load_from(&config_path).unwrap();

    let skeleton = Skeleton::load_from(fixture("hero.json")).unwrap();
    let mut recorder = CommandRecorder::new();
    for page in skeleton.texture_pages() {
        recorder.register_page(page);
    }
    SkeletonRenderer::new(config).draw(&skeleton, &mut recorder).unwrap();

    assert_eq!(recorder.batches()[1].blend, select_blend(BlendMode::Additive, true));
}

/// Count maximal runs of equal consecutive keys.
fn runs(keys: &[(u8, u8)]) -> usize {
    let mut count = 0;
    let mut last = None;
    for key in keys {
        if last != Some(key) {
            count += 1;
            last = Some(key);
        }
    }
    count
}

/// One generated slot for the flush-run property.
#[derive(Debug, Clone, Copy)]
enum Piece {
    /// Quad inside every clip.
    Near(u8, u8),
    /// Quad outside every clip.
    Far(u8, u8),
    Hidden(u8, u8),
    /// Clip square ending `span` slots later.
    Clip(usize),
}

fn piece() -> impl Strategy<Value = Piece> {
    prop_oneof![
        3 => (0u8..2, 0u8..4).prop_map(|(page, mode)| Piece::Near(page, mode)),
        3 => (0u8..2, 0u8..4).prop_map(|(page, mode)| Piece::Far(page, mode)),
        1 => (0u8..2, 0u8..4).prop_map(|(page, mode)| Piece::Hidden(page, mode)),
        1 => (1usize..4).prop_map(Piece::Clip),
    ]
}

/// Keys of the slots that should reach the batch, replaying clip ranges.
fn drawn_keys(pieces: &[Piece]) -> Vec<(u8, u8)> {
    let mut drawn = Vec::new();
    let mut clip_end: Option<usize> = None;
    for (i, piece) in pieces.iter().enumerate() {
        match *piece {
            Piece::Clip(span) => {
                clip_end = Some(i + span);
                continue;
            }
            Piece::Near(page, mode) => drawn.push((page, mode)),
            Piece::Far(page, mode) if clip_end.is_none() => drawn.push((page, mode)),
            Piece::Far(..) | Piece::Hidden(..) => {}
        }
        if clip_end == Some(i) {
            clip_end = None;
        }
    }
    drawn
}

proptest! {
    #[test]
    fn prop_flushes_equal_runs(pieces in prop::collection::vec(piece(), 0..24)) {
        let mut recorder = CommandRecorder::new();
        let pages = [recorder.register_texture(64, 64), recorder.register_texture(32, 32)];
        let skeleton = Skeleton::new(
            vec![Bone::new("root")],
            pieces
                .iter()
                .enumerate()
                .map(|(i, piece)| {
                    let slot = Slot::new(format!("s{i}"), 0);
                    let (page, mode, x) = match *piece {
                        Piece::Clip(span) => {
                            let square = vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0];
                            return slot.with_attachment(ClippingAttachment::new(square).until(SlotId(i + span)));
                        }
                        Piece::Near(page, mode) | Piece::Hidden(page, mode) => (page, mode, 2.0),
                        Piece::Far(page, mode) => (page, mode, 100.0),
                    };
                    let slot = slot
                        .with_attachment(quad(pages[page as usize], x, 2.0, 1.0))
                        .with_blend_mode(BlendMode::from_index(mode as u32));
                    if matches!(piece, Piece::Hidden(..)) { slot.with_color(Color::TRANSPARENT) } else { slot }
                })
                .collect(),
        );

        let stats = SkeletonRenderer::default().draw(&skeleton, &mut recorder).unwrap();

        let drawn = drawn_keys(&pieces);
        prop_assert_eq!(recorder.batches().len(), runs(&drawn));
        prop_assert_eq!(stats.batches_flushed, runs(&drawn));
        prop_assert_eq!(stats.slots_drawn, drawn.len());
        prop_assert_eq!(recorder.total_vertices(), stats.vertices);
        for pair in recorder.batches().windows(2) {
            prop_assert!((pair[0].texture, pair[0].blend_mode) != (pair[1].texture, pair[1].blend_mode));
        }
    }

    #[test]
    fn prop_clipped_triangles_stay_inside(
        points in prop::array::uniform6(-50.0f32..150.0),
    ) {
        let skeleton = Skeleton::new(vec![Bone::new("root")], vec![Slot::new("clip", 0)]);
        let mut clipper = SkeletonClipper::new();
        clipper.clip_start(
            &skeleton,
            &skeleton.slots[0],
            &ClippingAttachment::new(vec![0.0, 0.0, 100.0, 0.0, 100.0, 100.0, 0.0, 100.0]),
        );
        let uvs = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        let clipped = clipper.clip_triangles(&points, &[0, 1, 2], &uvs);

        for p in clipped.positions.chunks_exact(2) {
            prop_assert!((-1e-2..=100.01).contains(&p[0]), "x {} escaped", p[0]);
            prop_assert!((-1e-2..=100.01).contains(&p[1]), "y {} escaped", p[1]);
        }
        let clipped_area: f32 = clipped
            .indices
            .chunks_exact(3)
            .map(|t| {
                let tri: Vec<f32> = t
                    .iter()
                    .flat_map(|&i| [clipped.positions[i as usize * 2], clipped.positions[i as usize * 2 + 1]])
                    .collect();
                signed_area(&tri).abs()
            })
            .sum();
        prop_assert!(clipped_area <= signed_area(&points).abs() + 1e-1);
        prop_assert!(clipped.indices.iter().all(|&i| (i as usize) < clipped.vertex_count()));
    }
}

#[test]
fn test_clip_end_slot_in_draw_order() {
    let mut recorder = CommandRecorder::new();
    let page = recorder.register_texture(64, 64);
    // Storage order differs from draw order; the end slot is matched by id.
    let skeleton = Skeleton::new(
        vec![Bone::new("root")],
        vec![
            Slot::new("outside", 0).with_attachment(quad(page, 200.0, 0.0, 10.0)),
            Slot::new("clip", 0).with_attachment(
                ClippingAttachment::new(vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0]).until(SlotId(2)),
            ),
            Slot::new("also_outside", 0).with_attachment(quad(page, 300.0, 0.0, 10.0)),
        ],
    )
    .with_draw_order(vec![SlotId(1), SlotId(2), SlotId(0)]);

    let stats = SkeletonRenderer::default().draw(&skeleton, &mut recorder).unwrap();

    assert_eq!(stats.slots_clipped_away, 1);
    assert_eq!(stats.slots_drawn, 1);
    assert_eq!(recorder.batches()[0].vertices[0].position, [200.0, 0.0]);
}

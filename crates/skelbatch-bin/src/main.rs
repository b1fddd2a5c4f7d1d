//! Draws one posed-skeleton scene through the recording backend and prints
//! the resulting batch list.

use std::fmt::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use skelbatch::render::DrawStats;
use skelbatch::{CommandRecorder, RenderConfig, Skeleton, SkeletonRenderer};

#[derive(Parser, Debug)]
#[command(name = "skelbatch", about = "Batch a posed skeleton and report the draw calls")]
struct Args {
    /// Posed skeleton scene (JSON).
    scene: PathBuf,

    /// Render config JSON file; defaults are used if it does not exist.
    #[arg(long, default_value = "skelbatch.json")]
    config: PathBuf,

    /// Force premultiplied-alpha blending regardless of the config.
    #[arg(long)]
    premultiplied: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<String> {
    let mut config = RenderConfig::load_from(&args.config)?;
    if args.premultiplied {
        config.premultiplied_alpha = true;
    }
    let skeleton = Skeleton::load_from(&args.scene)?;
    info!(
        "loaded {} ({} bones, {} slots)",
        args.scene.display(),
        skeleton.bones.len(),
        skeleton.slots.len()
    );

    let mut recorder = CommandRecorder::new();
    for page in skeleton.texture_pages() {
        recorder.register_page(page);
    }
    let mut renderer = SkeletonRenderer::new(config);
    let stats = renderer.draw(&skeleton, &mut recorder)?;

    let mut out = String::new();
    write_report(&mut out, &recorder, &stats)?;
    Ok(out)
}

fn write_report(out: &mut impl Write, recorder: &CommandRecorder, stats: &DrawStats) -> fmt::Result {
    writeln!(out, "Batches: {}", recorder.batches().len())?;
    for (i, batch) in recorder.batches().iter().enumerate() {
        writeln!(
            out,
            "  [{}] texture {} ({}x{}) {:<8} {:>5} vertices {:>5} triangles  {:?} -> {:?}",
            i,
            batch.texture.id.0,
            batch.texture.width,
            batch.texture.height,
            batch.blend_mode.name(),
            batch.vertices.len(),
            batch.triangle_count(),
            batch.blend.src,
            batch.blend.dst,
        )?;
    }
    writeln!(
        out,
        "Slots: {} drawn, {} skipped, {} clipped away ({} clips)",
        stats.slots_drawn, stats.slots_skipped, stats.slots_clipped_away, stats.clips_started
    )?;
    writeln!(out, "Vertices: {}, indices: {}", stats.vertices, stats.indices)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    print!("{}", run(&args)?);
    Ok(())
}

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use stipple::{Codec, Encoder, Scene};

/// Render a JSON scene file to an image
#[derive(Parser, Debug)]
#[command(name = "stipple", version, about, long_about = None)]
struct Cli {
    /// Scene description (JSON)
    scene: PathBuf,

    /// Output file; defaults to the scene path with the codec's extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output codec: png, jpeg, bmp, tiff or webp
    #[arg(short, long, default_value = "png")]
    codec: Codec,

    /// Encoder executable
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Write raw RGBA bytes instead of invoking the encoder
    #[arg(long)]
    raw: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let scene = Scene::load(&cli.scene)
        .with_context(|| format!("failed to load scene {}", cli.scene.display()))?;
    let buffer = scene.render().context("failed to render scene")?;

    let extension = if cli.raw { "rgba" } else { cli.codec.extension() };
    let output = cli
        .output
        .unwrap_or_else(|| cli.scene.with_extension(extension));

    let file = File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut sink = BufWriter::new(file);

    if cli.raw {
        sink.write_all(buffer.as_bytes())?;
    } else {
        Encoder::with_program(&cli.ffmpeg)
            .encode_buffer(&buffer, cli.codec, &mut sink)
            .with_context(|| format!("failed to encode {}", output.display()))?;
    }
    sink.flush()?;

    info!(
        "wrote {}x{} image to {}",
        buffer.width(),
        buffer.height(),
        output.display()
    );
    Ok(())
}

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "shotframe", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Frame a screenshot on a styled background and write a PNG.
    Render(RenderArgs),
    /// Crop transparent padding from an image and write the result as PNG.
    Trim(TrimArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input image (PNG, JPEG, WebP, ...).
    #[arg(long)]
    image: PathBuf,

    /// Style configuration JSON; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Fixed noise seed for reproducible grain.
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the transparent-border trim preprocessor.
    #[arg(long)]
    no_trim: bool,
}

#[derive(Parser, Debug)]
struct TrimArgs {
    /// Input image (PNG, JPEG, WebP, ...).
    #[arg(long)]
    image: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Trim(args) => cmd_trim(args),
    }
}

fn read_image(path: &Path) -> anyhow::Result<shotframe::RasterImage> {
    let bytes =
        fs::read(path).with_context(|| format!("read input image '{}'", path.display()))?;
    let img = shotframe::decode_image(&bytes)
        .with_context(|| format!("decode input image '{}'", path.display()))?;
    Ok(img)
}

fn read_config(path: Option<&Path>) -> anyhow::Result<shotframe::StyleConfig> {
    let Some(path) = path else {
        return Ok(shotframe::StyleConfig::default());
    };
    let bytes = fs::read(path).with_context(|| format!("read config '{}'", path.display()))?;
    let config: shotframe::StyleConfig =
        serde_json::from_slice(&bytes).with_context(|| "parse style config JSON")?;
    Ok(config)
}

fn write_png(path: &Path, image: &shotframe::RasterImage) -> anyhow::Result<()> {
    let png = shotframe::encode_png(image)?;
    fs::write(path, png).with_context(|| format!("write output '{}'", path.display()))?;
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut image = read_image(&args.image)?;
    if !args.no_trim {
        image = shotframe::trim(&image);
    }
    let config = read_config(args.config.as_deref())?;

    let mut compositor = shotframe::Compositor::new(shotframe::CompositorOpts {
        noise_seed: args.seed,
    });
    let out = compositor.render(&image, &config)?;
    write_png(&args.out, &out)?;
    println!(
        "wrote {} ({}x{})",
        args.out.display(),
        out.width,
        out.height
    );
    Ok(())
}

fn cmd_trim(args: TrimArgs) -> anyhow::Result<()> {
    let image = read_image(&args.image)?;
    let trimmed = shotframe::trim(&image);
    write_png(&args.out, &trimmed)?;
    println!(
        "wrote {} ({}x{} -> {}x{})",
        args.out.display(),
        image.width,
        image.height,
        trimmed.width,
        trimmed.height
    );
    Ok(())
}

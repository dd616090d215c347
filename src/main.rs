//! Headless access to saved canvases: render a snapshot to a file, or print
//! what it contains. No session, history or project store is involved.
//!
//!   canvas-studio render --snapshot scene.json --assets images/ --output out.png
//!   canvas-studio render -s scene.json -o out.jpg --quality 0.8
//!   canvas-studio inspect --snapshot scene.json

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use futures::executor::block_on;

use canvas_studio::element::Element;
use canvas_studio::renderer::{ExportFormat, ExportPreset, RenderSurface};
use canvas_studio::services::file::FileImageSource;
use canvas_studio::{EditorConfig, EditorError, EditorResult, SceneSnapshot, SceneStore};

#[derive(Parser, Debug)]
#[command(name = "canvas-studio", about = "Render and inspect saved canvas snapshots")]
struct CliArgs {
    /// JSON file with editor settings; missing keys keep their defaults
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a snapshot at its native resolution and write it as an image
    Render {
        #[arg(short, long, value_name = "FILE")]
        snapshot: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// png, jpeg or webp. Inferred from --output when omitted.
        #[arg(short, long, value_name = "FORMAT")]
        format: Option<String>,

        /// Encoder quality between 0 and 1 (JPEG only)
        #[arg(short, long, value_name = "0-1")]
        quality: Option<f32>,

        /// Directory relative image references are resolved against
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        assets: PathBuf,
    },
    /// Print the document size, background and object list of a snapshot
    Inspect {
        #[arg(short, long, value_name = "FILE")]
        snapshot: PathBuf,
    },
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> EditorResult<()> {
    let config = match &args.config {
        Some(path) => EditorConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => EditorConfig::default(),
    };
    match args.command {
        Command::Render {
            snapshot,
            output,
            format,
            quality,
            assets,
        } => render(&config, &snapshot, &output, format.as_deref(), quality, assets),
        Command::Inspect { snapshot } => inspect(&snapshot),
    }
}

fn read_snapshot(path: &Path) -> EditorResult<SceneSnapshot> {
    Ok(SceneSnapshot::from_string(std::fs::read_to_string(path)?))
}

fn parse_format(name: Option<&str>, output: &Path) -> EditorResult<ExportFormat> {
    let name = name
        .map(str::to_owned)
        .or_else(|| output.extension().map(|e| e.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "png".to_owned());
    match name.to_ascii_lowercase().as_str() {
        "png" => Ok(ExportFormat::Png),
        "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
        "webp" => Ok(ExportFormat::Webp),
        other => Err(EditorError::InvalidState(format!("unsupported output format {}", other))),
    }
}

fn render(config: &EditorConfig, snapshot: &Path, output: &Path, format: Option<&str>, quality: Option<f32>, assets: PathBuf) -> EditorResult<()> {
    let mut scene = SceneStore::new();
    scene.load_snapshot(&read_snapshot(snapshot)?)?;
    scene.drain_changes();

    let mut preset = ExportPreset::for_format(parse_format(format, output)?);
    if let Some(quality) = quality {
        preset.quality = quality.clamp(0.0, 1.0);
    }

    let mut surface = RenderSurface::new(Rc::new(FileImageSource::new(assets)), config);
    let file_name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("export.{}", preset.format.extension()));
    let exported = block_on(async {
        let missing = surface.load_scene_images(&scene).await;
        for src in &missing {
            log::warn!("image {} could not be loaded and is left out", src);
        }
        surface.export_raster(&mut scene, &preset, file_name).await
    })?;

    std::fs::write(output, &exported.bytes)?;
    log::info!(
        "wrote {} ({}x{}, {} bytes)",
        output.display(),
        exported.width,
        exported.height,
        exported.bytes.len()
    );
    Ok(())
}

fn inspect(snapshot: &Path) -> EditorResult<()> {
    let doc = read_snapshot(snapshot)?.decode()?;
    println!("document: {}x{} (version {})", doc.width, doc.height, doc.version);
    println!("background: {}", serde_json::to_string(&doc.background)?);
    for (z, object) in doc.objects.iter().enumerate() {
        let rect = object.rect();
        println!(
            "{:>3} {} {:<8} at ({:.0}, {:.0}) size {:.0}x{:.0}",
            z,
            object.id(),
            object.element_type(),
            rect.min.x,
            rect.min.y,
            rect.width(),
            rect.height()
        );
    }
    Ok(())
}

//! Headless command-line entry point.

use postkit_app::{EditorError, EditorResult, ShortcutRegistry, unix_millis};
use postkit_core::canvas::{Canvas, CanvasDocument};
use postkit_core::config::EditorConfig;
use postkit_core::layers::Layer;
use postkit_core::storage::{AutoSaveManager, FileStorage};
use postkit_render::{CpuRasterizer, export_png};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const USAGE: &str = "\
Usage:
  postkit render <layers.json> <out-dir> [--font <file>] [--config <file>]
  postkit artifacts [--store <dir>]
  postkit shortcuts";

fn main() {
    env_logger::init();
    log::info!("Starting postkit");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("render") => render(&args[1..]),
        Some("artifacts") => artifacts(&args[1..]),
        Some("shortcuts") => {
            ShortcutRegistry::new(EditorConfig::load_or_default().escape_cancels_gesture).print_all();
            Ok(())
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Split `args` into positionals and `--flag value` pairs.
fn parse_args(args: &[String]) -> (Vec<&str>, Vec<(&str, &str)>) {
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.strip_prefix("--") {
            Some(name) => {
                if let Some(value) = iter.next() {
                    flags.push((name, value.as_str()));
                }
            }
            None => positional.push(arg.as_str()),
        }
    }
    (positional, flags)
}

fn flag<'a>(flags: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    flags.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

fn render(args: &[String]) -> EditorResult<()> {
    let (positional, flags) = parse_args(args);
    let &[input, out_dir] = positional.as_slice() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let config = match flag(&flags, "config") {
        Some(path) => EditorConfig::load(Path::new(path))?,
        None => EditorConfig::load_or_default(),
    };
    let mut rasterizer = CpuRasterizer::new();
    if let Some(font) = flag(&flags, "font") {
        rasterizer = rasterizer.with_font(std::fs::read(font)?)?;
    }

    let json = std::fs::read_to_string(input)?;
    let layers: Vec<Layer> = serde_json::from_str(&json)?;
    let canvas = Canvas::with_document(CanvasDocument::from_layers(layers)?);

    let artifact = export_png(&canvas, &mut rasterizer, &config, unix_millis())?;
    std::fs::create_dir_all(out_dir)?;
    let path = PathBuf::from(out_dir).join(&artifact.file_name);
    std::fs::write(&path, &artifact.png)?;
    println!("{}", path.display());
    Ok(())
}

fn artifacts(args: &[String]) -> EditorResult<()> {
    let (_, flags) = parse_args(args);
    let storage = match flag(&flags, "store") {
        Some(dir) => FileStorage::new(PathBuf::from(dir))?,
        None => FileStorage::default_location()?,
    };
    log::debug!("Listing artifacts in {}", storage.base_path().display());
    let manager = AutoSaveManager::new(Arc::new(storage));
    for key in manager.list_artifacts()? {
        match manager.load_artifact(&key) {
            Ok(layers) => println!("{:40} {} layers", key, layers.len()),
            Err(e) => println!("{:40} unreadable: {}", key, EditorError::from(e)),
        }
    }
    Ok(())
}

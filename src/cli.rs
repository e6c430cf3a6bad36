use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::editor::{Editor, EditorSettings};
use crate::error::{AppError, AppResult};
use crate::geometry::{Color, CropRegion, Size};
use crate::i18n::Language;
use crate::templates::TemplateCatalog;

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Parser, Debug)]
#[command(name = "avatar-studio")]
#[command(about = "Square-crop photos into avatars and inspect prompt templates")]
pub struct Cli {
    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crop an image to a padded square, as the editor's crop tool would.
    Crop {
        /// Image to crop.
        #[arg(short, long)]
        input: PathBuf,

        /// Output file. Defaults to `edited-<input stem>.png` next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Viewer size the selection is expressed in, as WIDTHxHEIGHT.
        #[arg(long, value_parser = parse_size, default_value = "512x512")]
        container: Size,

        /// Selection as X,Y,SIDE in viewer coordinates. Defaults to the centered square.
        #[arg(long, value_parser = parse_region)]
        region: Option<CropRegion>,

        /// Output pixels per viewer pixel; overrides config.
        #[arg(long)]
        pixel_ratio: Option<f64>,

        /// Padding color as #RRGGBB; overrides config.
        #[arg(long)]
        background: Option<String>,
    },
    /// List template labels from the catalog.
    Templates {
        /// Catalog file. Defaults to the configured path.
        #[arg(long)]
        path: Option<PathBuf>,

        /// Label language: zh or en.
        #[arg(long)]
        language: Option<String>,
    },
}

pub fn execute(cli: Cli, config: &AppConfig) -> AppResult<()> {
    match cli.command {
        Command::Crop {
            input,
            output,
            container,
            region,
            pixel_ratio,
            background,
        } => {
            let mut settings = EditorSettings::from(config);
            if let Some(ratio) = pixel_ratio.filter(|ratio| ratio.is_finite() && *ratio > 0.0) {
                settings.render.pixel_ratio = ratio;
            }
            if let Some(raw) = background.as_deref() {
                match Color::from_hex(raw) {
                    Some(color) => settings.render.background = color,
                    None => tracing::warn!(value = raw, "ignoring invalid --background"),
                }
            }
            let written = crop_file(&input, output.as_deref(), container, region, settings)?;
            println!("{}", written.display());
        }
        Command::Templates { path, language } => {
            let path = path
                .or_else(|| config.templates_path())
                .ok_or(AppError::MissingTemplatesPath)?;
            let language = language
                .as_deref()
                .and_then(Language::from_code)
                .unwrap_or_else(|| config.language());
            let catalog = TemplateCatalog::load(&path)?;
            for template in catalog.templates() {
                println!("{}\t{}", template.name.get(language), template.prompt.get(language));
            }
        }
    }
    Ok(())
}

/// Runs one upload + crop round trip and writes the result. Returns the written path.
pub fn crop_file(
    input: &Path,
    output: Option<&Path>,
    container: Size,
    region: Option<CropRegion>,
    settings: EditorSettings,
) -> AppResult<PathBuf> {
    let bytes = std::fs::read(input).map_err(|source| AppError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let mime = image::ImageFormat::from_path(input)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME);

    let mut editor = Editor::new(settings);
    editor.upload(name, mime, bytes)?;
    let initial = editor.begin_crop(container)?;
    let selection = match region {
        Some(region) => editor.change_crop(region)?,
        None => initial,
    };
    editor.complete_crop(selection)?;
    editor.apply_crop(container)?;

    let download = editor.download().ok_or(AppError::NothingToSave)?;
    let target = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(input));
    std::fs::write(&target, download.bytes).map_err(|source| AppError::Write {
        path: target.clone(),
        source,
    })?;
    tracing::info!(path = %target.display(), "wrote cropped avatar");
    Ok(target)
}

/// The cropped file is always PNG, so only the input's stem is kept.
fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("edited-{stem}.png"))
}

fn parse_size(raw: &str) -> Result<Size, String> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{raw}`"))?;
    let size = Size::new(parse_number(width)?, parse_number(height)?);
    if !size.is_drawable() {
        return Err(format!("container `{raw}` has no drawable area"));
    }
    Ok(size)
}

fn parse_region(raw: &str) -> Result<CropRegion, String> {
    let parts: Vec<&str> = raw.split(',').collect();
    let [x, y, side] = parts.as_slice() else {
        return Err(format!("expected X,Y,SIDE, got `{raw}`"));
    };
    let side = parse_number(side)?;
    Ok(CropRegion::new(parse_number(x)?, parse_number(y)?, side, side))
}

fn parse_number(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("`{raw}` is not finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::encode_png;
    use image::{Rgba, RgbaImage};
    use std::fs;

    fn fixture_root(label: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let pid = std::process::id();
        path.push(format!("avatar-studio-cli-{label}-{pid}-{nanos}"));
        path
    }

    #[test]
    fn parse_size_accepts_width_by_height() {
        assert_eq!(parse_size("640x480"), Ok(Size::new(640.0, 480.0)));
        assert_eq!(parse_size("10X20"), Ok(Size::new(10.0, 20.0)));
        assert!(parse_size("640").is_err());
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn parse_region_builds_square_selection() {
        assert_eq!(
            parse_region("5, 6, 70"),
            Ok(CropRegion::new(5.0, 6.0, 70.0, 70.0))
        );
        assert!(parse_region("1,2").is_err());
        assert!(parse_region("1,2,nan").is_err());
    }

    #[test]
    fn cli_parses_crop_subcommand() {
        let cli = Cli::try_parse_from([
            "avatar-studio",
            "crop",
            "--input",
            "in.png",
            "--container",
            "300x200",
            "--region",
            "0,0,100",
        ])
        .expect("arguments should parse");
        match cli.command {
            Command::Crop {
                container, region, ..
            } => {
                assert_eq!(container, Size::new(300.0, 200.0));
                assert_eq!(region, Some(CropRegion::new(0.0, 0.0, 100.0, 100.0)));
            }
            Command::Templates { .. } => panic!("expected crop subcommand"),
        }
    }

    #[test]
    fn crop_file_writes_square_png_next_to_input() {
        let root = fixture_root("crop");
        fs::create_dir_all(&root).unwrap();
        let input = root.join("photo.png");
        let image = RgbaImage::from_pixel(60, 30, Rgba([9, 9, 9, 255]));
        fs::write(&input, encode_png(&image).unwrap()).unwrap();

        let written = crop_file(
            &input,
            None,
            Size::new(120.0, 120.0),
            None,
            EditorSettings::default(),
        )
        .expect("crop should succeed");

        assert_eq!(written, root.join("edited-photo.png"));
        let output = image::open(&written).expect("output should decode");
        assert_eq!(output.width(), output.height());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn default_output_sits_next_to_input_as_png() {
        assert_eq!(
            default_output(Path::new("/tmp/shots/photo.jpg")),
            PathBuf::from("/tmp/shots/edited-photo.png")
        );
        assert_eq!(
            default_output(Path::new("selfie.webp")),
            PathBuf::from("edited-selfie.png")
        );
    }

    #[test]
    fn crop_file_reports_missing_input() {
        let root = fixture_root("missing");
        let err = crop_file(
            &root.join("absent.png"),
            None,
            Size::new(10.0, 10.0),
            None,
            EditorSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Read { .. }));
    }
}

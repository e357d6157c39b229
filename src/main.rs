use std::env;
use std::path::{Path, PathBuf};

use shadeline::colors::unpack_color;
use shadeline::prelude::*;

const DEFAULT_WIDTH: u32 = 800;
const DEFAULT_HEIGHT: u32 = 600;

const USAGE: &str =
    "usage: shadeline [MODEL.obj] [--config FILE.json] [--out FILE.png] [--size WxH]";

struct Args {
    model: Option<PathBuf>,
    config: Option<PathBuf>,
    output: PathBuf,
    width: u32,
    height: u32,
}

fn parse_size(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.split_once('x')?;
    let (w, h) = (w.parse().ok()?, h.parse().ok()?);
    (w > 0 && h > 0).then_some((w, h))
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        model: None,
        config: None,
        output: PathBuf::from("frame.png"),
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = || iter.next().ok_or_else(|| format!("{arg} needs a value\n{USAGE}"));
        match arg.as_str() {
            "--config" => args.config = Some(PathBuf::from(value()?)),
            "--out" => args.output = PathBuf::from(value()?),
            "--size" => {
                let size = value()?;
                (args.width, args.height) =
                    parse_size(&size).ok_or_else(|| format!("bad size {size:?}\n{USAGE}"))?;
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ if args.model.is_none() && !arg.starts_with("--") => {
                args.model = Some(PathBuf::from(&arg))
            }
            _ => return Err(format!("unexpected argument {arg:?}\n{USAGE}")),
        }
    }
    Ok(args)
}

fn save_png(frame: &FrameBuffer, path: &Path) -> Result<(), image::ImageError> {
    let image = image::RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
        let c = frame
            .get_pixel(x as i32, y as i32)
            .map(unpack_color)
            .unwrap_or(Vec3::ZERO);
        image::Rgb([c.x, c.y, c.z].map(|v| (v * 255.0).round() as u8))
    });
    image.save(path)
}

fn main() -> Result<(), String> {
    env_logger::init();
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => RenderConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => RenderConfig::default(),
    };
    let mut engine = Engine::with_config(args.width, args.height, config);
    if let Some(path) = &args.model {
        engine.load_obj(path).map_err(|e| e.to_string())?;
    }

    let stats = engine.render();
    log::info!(
        "rendered {} triangles in {:?} ({:.1} fps)",
        stats.rasterized,
        stats.elapsed,
        stats.fps()
    );

    save_png(engine.frame(), &args.output).map_err(|e| e.to_string())?;
    log::info!("wrote {}", args.output.display());
    Ok(())
}

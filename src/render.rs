//! Puzzle and answer image rendering
//!
//! Missing assets never fail a round: a missing background leaves the canvas
//! white, a missing icon becomes a placeholder, and without a usable font the
//! captions fall back to the bundled DejaVu Sans.

use crate::config::WhoisConfig;
use crate::types::EncodedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::register_font;
use std::io::Cursor;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

const CANVAS_W: u32 = 640;
const CANVAS_H: u32 = 464;
const ICON_SIZE: u32 = 230;
const ICON_X: i64 = 50;
const ICON_Y: i64 = 60;
/// Captions are centred on this column
const CAPTION_X: i32 = 463;
const CAPTION_COLOR: RGBColor = RGBColor(255, 255, 0);
const PLACEHOLDER_GREY: Rgba<u8> = Rgba([200, 200, 200, 255]);
const FALLBACK_FAMILY: &str = "whois-fallback";
static FALLBACK_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Produces the two images of a round
pub trait ImageRenderer: Send + Sync {
    /// Obscured image with the character as a black silhouette
    fn puzzle(&self, name: &str) -> Result<EncodedImage, RenderError>;

    /// Revealed image with the character in colour and both names
    fn answer(&self, name: &str, alt_name: &str) -> Result<EncodedImage, RenderError>;
}

/// Run a render on the blocking pool
pub async fn render_blocking<F>(
    renderer: &Arc<dyn ImageRenderer>,
    f: F,
) -> Result<EncodedImage, RenderError>
where
    F: FnOnce(&dyn ImageRenderer) -> Result<EncodedImage, RenderError> + Send + 'static,
{
    let renderer = Arc::clone(renderer);
    tokio::task::spawn_blocking(move || f(renderer.as_ref())).await?
}

struct Caption<'a> {
    text: &'a str,
    size: i32,
    at: (i32, i32),
    color: RGBColor,
    pos: Pos,
}

impl<'a> Caption<'a> {
    fn centred(text: &'a str, size: i32, y: i32) -> Self {
        Self {
            text,
            size,
            at: (CAPTION_X, y),
            color: CAPTION_COLOR,
            pos: Pos::new(HPos::Center, VPos::Top),
        }
    }
}

/// Load result per font file. Plotters keeps registered fonts for the
/// life of the process, so each file is read at most once.
static LOADED_FONTS: OnceLock<Mutex<HashMap<PathBuf, bool>>> = OnceLock::new();
static FALLBACK_READY: OnceLock<bool> = OnceLock::new();

fn family_for(path: &Path) -> String {
    format!("whois:{}", path.display())
}

/// Register the font at `path` under its own family
fn load_font(path: &Path) -> bool {
    let mut fonts = LOADED_FONTS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(&loaded) = fonts.get(path) {
        return loaded;
    }

    let loaded = match std::fs::read(path) {
        Ok(bytes) => {
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            match register_font(&family_for(path), FontStyle::Normal, bytes) {
                Ok(()) => {
                    tracing::info!("Loaded caption font {}", path.display());
                    true
                }
                Err(_) => {
                    tracing::warn!("{} is not a usable font", path.display());
                    false
                }
            }
        }
        Err(e) => {
            tracing::warn!("Failed to read font {}: {}", path.display(), e);
            false
        }
    };

    fonts.insert(path.to_path_buf(), loaded);
    loaded
}

fn fallback_family() -> Option<&'static str> {
    let ready = *FALLBACK_READY.get_or_init(|| {
        register_font(FALLBACK_FAMILY, FontStyle::Normal, FALLBACK_FONT).is_ok()
    });
    ready.then_some(FALLBACK_FAMILY)
}

/// Renderer reading `<icon_path>/<name>.png` icons from disk
pub struct PokemonRenderer {
    icon_path: PathBuf,
    bg_path: PathBuf,
    /// Plotters family for captions, `None` only if even the fallback failed
    font_family: Option<String>,
}

impl PokemonRenderer {
    pub fn new(config: &WhoisConfig) -> Self {
        let font_family = if load_font(&config.font_path) {
            Some(family_for(&config.font_path))
        } else {
            tracing::warn!("Captions use the fallback font");
            fallback_family().map(str::to_string)
        };

        Self {
            icon_path: config.icon_path.clone(),
            bg_path: config.bg_path.clone(),
            font_family,
        }
    }

    fn canvas(&self) -> RgbaImage {
        let mut canvas =
            RgbaImage::from_pixel(CANVAS_W, CANVAS_H, Rgba([255, 255, 255, 255]));

        if self.bg_path.exists() {
            match image::open(&self.bg_path) {
                Ok(bg) => imageops::overlay(&mut canvas, &bg.to_rgba8(), 0, 0),
                Err(e) => tracing::warn!(
                    "Failed to load background {}: {}",
                    self.bg_path.display(),
                    e
                ),
            }
        }

        canvas
    }

    fn icon(&self, name: &str) -> Option<RgbaImage> {
        let path = self.icon_path.join(format!("{}.png", name));
        if !path.exists() {
            tracing::warn!("No icon for {} at {}", name, path.display());
            return None;
        }

        match image::open(&path) {
            Ok(icon) => Some(imageops::resize(
                &icon.to_rgba8(),
                ICON_SIZE,
                ICON_SIZE,
                imageops::FilterType::CatmullRom,
            )),
            Err(e) => {
                tracing::warn!("Failed to load icon {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Draw captions and encode. Caption failures only cost the captions.
    fn finish(
        &self,
        canvas: RgbaImage,
        captions: &[Caption<'_>],
    ) -> Result<EncodedImage, RenderError> {
        let mut rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();

        if let Some(family) = &self.font_family {
            if let Err(e) = draw_captions(&mut rgb, family, captions) {
                tracing::warn!("Failed to draw captions: {}", e);
            }
        }

        encode_png(&DynamicImage::ImageRgb8(rgb))
    }
}

impl ImageRenderer for PokemonRenderer {
    fn puzzle(&self, name: &str) -> Result<EncodedImage, RenderError> {
        let mut canvas = self.canvas();
        let mut captions = vec![
            Caption::centred("???", 40, 40),
            Caption::centred("我是谁", 42, 100),
        ];

        match self.icon(name) {
            Some(icon) => imageops::overlay(&mut canvas, &silhouette(&icon), ICON_X, ICON_Y),
            None => {
                let placeholder = RgbaImage::from_pixel(ICON_SIZE, ICON_SIZE, PLACEHOLDER_GREY);
                imageops::overlay(&mut canvas, &placeholder, ICON_X, ICON_Y);
                captions.push(Caption {
                    text: "?",
                    size: 100,
                    at: (100, 175),
                    color: BLACK,
                    pos: Pos::new(HPos::Left, VPos::Top),
                });
            }
        }

        self.finish(canvas, &captions)
    }

    fn answer(&self, name: &str, alt_name: &str) -> Result<EncodedImage, RenderError> {
        let mut canvas = self.canvas();

        if let Some(icon) = self.icon(name) {
            imageops::overlay(&mut canvas, &icon, ICON_X, ICON_Y);
        }

        let captions = [
            Caption::centred(alt_name, 40, 40),
            Caption::centred(name, 42, 100),
        ];
        self.finish(canvas, &captions)
    }
}

/// Opaque pixels become black, transparent ones stay transparent
fn silhouette(icon: &RgbaImage) -> RgbaImage {
    let mut out = icon.clone();
    for pixel in out.pixels_mut() {
        *pixel = if pixel[3] == 0 {
            Rgba([255, 255, 255, 0])
        } else {
            Rgba([0, 0, 0, 255])
        };
    }
    out
}

fn draw_captions(
    rgb: &mut image::RgbImage,
    family: &str,
    captions: &[Caption<'_>],
) -> Result<(), Box<dyn std::error::Error>> {
    let buf: &mut [u8] = rgb;
    let root = BitMapBackend::with_buffer(buf, (CANVAS_W, CANVAS_H)).into_drawing_area();

    for caption in captions {
        let style = TextStyle::from((family, caption.size, FontStyle::Normal))
            .color(&caption.color)
            .pos(caption.pos);
        root.draw_text(caption.text, &style, caption.at)?;
    }

    root.present()?;
    Ok(())
}

fn encode_png(img: &DynamicImage) -> Result<EncodedImage, RenderError> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

    Ok(EncodedImage(format!(
        "{}{}",
        EncodedImage::PREFIX,
        STANDARD.encode(&bytes)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Left half opaque red, right half transparent
    fn write_icon(dir: &Path, name: &str) {
        let icon = RgbaImage::from_fn(100, 100, |x, _| {
            if x < 50 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        icon.save(dir.join(format!("{}.png", name))).unwrap();
    }

    fn renderer(dir: &Path) -> PokemonRenderer {
        let config = WhoisConfig {
            icon_path: dir.to_path_buf(),
            bg_path: dir.join("missing_bg.jpg"),
            font_path: dir.join("missing.ttf"),
            ..Default::default()
        };
        PokemonRenderer::new(&config)
    }

    fn decode(img: &EncodedImage) -> image::RgbImage {
        let data = img.as_str().strip_prefix(EncodedImage::PREFIX).unwrap();
        let bytes = STANDARD.decode(data).unwrap();
        image::load_from_memory(&bytes).unwrap().to_rgb8()
    }

    #[test]
    fn test_puzzle_is_silhouette() {
        let dir = tempfile::tempdir().unwrap();
        write_icon(dir.path(), "皮卡丘");

        let puzzle = decode(&renderer(dir.path()).puzzle("皮卡丘").unwrap());
        assert_eq!(puzzle.dimensions(), (CANVAS_W, CANVAS_H));
        assert_eq!(puzzle.get_pixel(80, 175).0, [0, 0, 0]);
        assert_eq!(puzzle.get_pixel(250, 175).0, [255, 255, 255]);
    }

    #[test]
    fn test_answer_keeps_colour() {
        let dir = tempfile::tempdir().unwrap();
        write_icon(dir.path(), "皮卡丘");

        let answer = decode(&renderer(dir.path()).answer("皮卡丘", "Pikachu").unwrap());
        assert_eq!(answer.get_pixel(80, 175).0, [255, 0, 0]);
        assert_eq!(answer.get_pixel(250, 175).0, [255, 255, 255]);
    }

    #[test]
    fn test_missing_icon_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer(dir.path());

        let puzzle = decode(&renderer.puzzle("不存在").unwrap());
        assert_eq!(puzzle.get_pixel(60, 70).0, [200, 200, 200]);

        let answer = decode(&renderer.answer("不存在", "Nothing").unwrap());
        assert_eq!(answer.get_pixel(60, 70).0, [255, 255, 255]);
    }

    #[test]
    fn test_silhouette_mask() {
        let mut icon = RgbaImage::new(2, 1);
        icon.put_pixel(0, 0, Rgba([10, 200, 30, 128]));
        icon.put_pixel(1, 0, Rgba([10, 200, 30, 0]));

        let mask = silhouette(&icon);
        assert_eq!(mask.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(mask.get_pixel(1, 0).0, [255, 255, 255, 0]);
    }

    /// Bounding box of the caption-yellow pixels
    fn yellow_bounds(img: &image::RgbImage) -> Option<(u32, u32, u32, u32)> {
        img.enumerate_pixels()
            .filter(|(_, _, p)| p[0] >= 250 && p[1] >= 250 && p[2] <= 100)
            .fold(None, |acc, (x, y, _)| match acc {
                None => Some((x, x, y, y)),
                Some((x0, x1, y0, y1)) => Some((x0.min(x), x1.max(x), y0.min(y), y1.max(y))),
            })
    }

    #[test]
    fn test_captions_fall_back_to_bundled_font() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer(dir.path());
        assert_eq!(renderer.font_family.as_deref(), Some(FALLBACK_FAMILY));

        let answer = decode(&renderer.answer("Pikachu", "Pikachu").unwrap());
        let (x0, x1, y0, y1) = yellow_bounds(&answer).expect("captions drawn");

        let centre = (x0 + x1) / 2;
        assert!(centre.abs_diff(CAPTION_X as u32) <= 10, "centre {}", centre);
        assert!(x0 > ICON_X as u32 + ICON_SIZE);
        assert!(y0 >= 30 && y1 < 170, "rows {}..{}", y0, y1);
    }

    #[test]
    fn test_font_loaded_per_path() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("caption.ttf");
        let bad = dir.path().join("bad.ttf");
        std::fs::write(&good, FALLBACK_FONT).unwrap();
        std::fs::write(&bad, b"not a font").unwrap();

        let with_font = |path: &Path| {
            PokemonRenderer::new(&WhoisConfig {
                icon_path: dir.path().to_path_buf(),
                bg_path: dir.path().join("missing_bg.jpg"),
                font_path: path.to_path_buf(),
                ..Default::default()
            })
        };

        let first = with_font(&good);
        assert_eq!(first.font_family, Some(family_for(&good)));

        let second = with_font(&bad);
        assert_eq!(second.font_family.as_deref(), Some(FALLBACK_FAMILY));

        // a cached failure for one path does not leak into another
        assert_eq!(with_font(&good).font_family, Some(family_for(&good)));

        let puzzle = decode(&first.puzzle("不存在").unwrap());
        assert!(yellow_bounds(&puzzle).is_some());
    }

    #[tokio::test]
    async fn test_render_blocking() {
        let dir = tempfile::tempdir().unwrap();
        write_icon(dir.path(), "伊布");
        let renderer: Arc<dyn ImageRenderer> = Arc::new(self::renderer(dir.path()));

        let img = render_blocking(&renderer, |r| r.answer("伊布", "Eevee"))
            .await
            .unwrap();
        assert!(img.as_str().starts_with(EncodedImage::PREFIX));
    }
}

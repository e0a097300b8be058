use std::{io::Cursor, path::Path, sync::Arc};

use base64::Engine as _;
use color_eyre::eyre::{Result, WrapErr as _, eyre};
use image::{DynamicImage, ImageFormat, RgbaImage, imageops::FilterType};
use tracing::{info, instrument};

use crate::canvas::Canvas;

/// A finished card as PNG. Owned by the caller; nothing in the renderer keeps a reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedImage {
	pub width: u32,
	pub height: u32,
	png: Vec<u8>,
}

impl RenderedImage {
	pub fn as_bytes(&self) -> &[u8] {
		&self.png
	}

	pub fn into_bytes(self) -> Vec<u8> {
		self.png
	}

	/// `data:image/png;base64,...`
	pub fn to_data_url(&self) -> String {
		format!("data:image/png;base64,{}", base64::engine::general_purpose::STANDARD.encode(&self.png))
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, &self.png).wrap_err_with(|| format!("Failed to write {}", path.display()))
	}

	/// Scaled-down copy no wider than `max_width`, aspect ratio kept. Returns a clone if already small enough.
	pub fn preview(&self, max_width: u32) -> Result<RenderedImage> {
		if max_width == 0 {
			return Err(eyre!("Preview width must be positive"));
		}
		if self.width <= max_width {
			return Ok(self.clone());
		}
		let img = image::load_from_memory_with_format(&self.png, ImageFormat::Png)?;
		let height = ((self.height as u64 * max_width as u64) / self.width as u64).max(1) as u32;
		encode(&img.resize_exact(max_width, height, FilterType::Lanczos3))
	}
}

/// Composites the overlay onto the background and encodes the result as PNG.
///
/// Takes the canvas by value: a surface is exported once.
#[instrument(skip_all, fields(width = canvas.width(), height = canvas.height()))]
pub fn export(canvas: Canvas, fontdb: Arc<fontdb::Database>) -> Result<RenderedImage> {
	let Canvas { mut pixmap, overlay } = canvas;

	if !overlay.is_empty() {
		let mut options = usvg::Options::default();
		options.fontdb = fontdb;
		let tree = usvg::Tree::from_str(&overlay.to_svg(), &options).wrap_err("Failed to parse card overlay")?;
		resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
	}

	let (width, height) = (pixmap.width(), pixmap.height());
	let straight: Vec<u8> = pixmap
		.pixels()
		.iter()
		.flat_map(|p| {
			let c = p.demultiply();
			[c.red(), c.green(), c.blue(), c.alpha()]
		})
		.collect();
	let img = RgbaImage::from_raw(width, height, straight).ok_or_else(|| eyre!("Pixel buffer does not match {width}x{height}"))?;
	let rendered = encode(&DynamicImage::ImageRgba8(img))?;
	info!(bytes = rendered.png.len(), width, height, "card exported");
	Ok(rendered)
}

fn encode(img: &DynamicImage) -> Result<RenderedImage> {
	let mut png = Vec::new();
	img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).wrap_err("Failed to encode PNG")?;
	Ok(RenderedImage {
		width: img.width(),
		height: img.height(),
		png,
	})
}

#[cfg(test)]
mod tests {
	use image::GenericImageView;

	use super::*;
	use crate::theme::Rgba;

	fn solid(width: u32, height: u32) -> Canvas {
		let mut canvas = Canvas::new(width, height).unwrap();
		canvas.pixmap_mut().fill(tiny_skia::Color::from_rgba8(2, 6, 23, 255));
		canvas
	}

	#[test]
	fn exports_png_with_canvas_dimensions() {
		let image = export(solid(64, 32), Arc::new(fontdb::Database::new())).unwrap();
		assert_eq!((image.width, image.height), (64, 32));
		assert!(image.as_bytes().starts_with(b"\x89PNG\r\n\x1a\n"));

		let decoded = image::load_from_memory(image.as_bytes()).unwrap();
		assert_eq!(decoded.dimensions(), (64, 32));
		assert_eq!(decoded.get_pixel(10, 10).0, [2, 6, 23, 255]);
	}

	#[test]
	fn overlay_shapes_reach_the_pixels() {
		let mut canvas = solid(40, 40);
		canvas.overlay_mut().circle(20.0, 20.0, 10.0, Rgba::WHITE);
		let image = export(canvas, Arc::new(fontdb::Database::new())).unwrap();
		let decoded = image::load_from_memory(image.as_bytes()).unwrap();
		assert_eq!(decoded.get_pixel(20, 20).0, [255, 255, 255, 255]);
		assert_eq!(decoded.get_pixel(1, 1).0, [2, 6, 23, 255]);
	}

	#[test]
	fn data_url_is_base64_png() {
		let image = export(solid(4, 4), Arc::new(fontdb::Database::new())).unwrap();
		let url = image.to_data_url();
		let payload = url.strip_prefix("data:image/png;base64,").unwrap();
		assert_eq!(base64::engine::general_purpose::STANDARD.decode(payload).unwrap(), image.as_bytes());
	}

	#[test]
	fn preview_keeps_aspect_ratio() {
		let image = export(solid(108, 192), Arc::new(fontdb::Database::new())).unwrap();
		let small = image.preview(54).unwrap();
		assert_eq!((small.width, small.height), (54, 96));
		assert_eq!(image.preview(500).unwrap(), image);
		assert!(image.preview(0).is_err());
	}

	#[test]
	fn save_creates_parent_dirs() {
		let dir = std::env::temp_dir().join(format!("ayah_card_export_{}", std::process::id()));
		let path = dir.join("nested/card.png");
		let image = export(solid(4, 4), Arc::new(fontdb::Database::new())).unwrap();
		image.save(&path).unwrap();
		assert_eq!(std::fs::read(&path).unwrap(), image.as_bytes());
		std::fs::remove_dir_all(dir).unwrap();
	}
}

use std::f32::consts::FRAC_PI_4;

use color_eyre::eyre::{Result, eyre};
use rand::Rng;
use tiny_skia::{Color, FillRule, GradientStop, LinearGradient, Paint, PathBuilder, Pixmap, Point, RadialGradient, Rect, Shader, SpreadMode, Stroke, Transform};
use tracing::instrument;

use crate::theme::{Rgba, Theme};

const GRAIN_DOTS: usize = 50_000;
const GRAIN_ALPHA: f32 = 0.05;

const LATTICE_STEP: f32 = 120.0;
const DIAMOND_HALF: f32 = 20.0;
const OCTAGON_RADIUS: f32 = 30.0;
const LATTICE_ALPHA: f32 = 0.07;

const BLOB_ALPHA: f32 = 0.15;
/// Width of the soft edge around each blob.
const BLOB_FEATHER: f32 = 120.0;

/// Paints the whole card background for `theme`, sized to the pixmap.
pub fn paint_background(pixmap: &mut Pixmap, theme: &Theme) -> Result<()> {
	paint_background_with(pixmap, theme, &mut rand::rng())
}

/// [`paint_background`] with the grain drawn from `rng`.
#[instrument(skip_all, fields(width = pixmap.width(), height = pixmap.height(), pattern = theme.has_pattern))]
pub fn paint_background_with<R: Rng>(pixmap: &mut Pixmap, theme: &Theme, rng: &mut R) -> Result<()> {
	paint_gradient(pixmap, theme.background_stops)?;
	if !theme.has_pattern {
		return Ok(());
	}
	paint_grain(pixmap, theme.text, rng);
	paint_lattice(pixmap, theme.primary);
	paint_blobs(pixmap, theme.primary);
	Ok(())
}

fn full_rect(pixmap: &Pixmap) -> Result<Rect> {
	Rect::from_xywh(0.0, 0.0, pixmap.width() as f32, pixmap.height() as f32).ok_or_else(|| eyre!("Degenerate canvas {}x{}", pixmap.width(), pixmap.height()))
}

fn paint_gradient(pixmap: &mut Pixmap, stops: &[Rgba]) -> Result<()> {
	let rect = full_rect(pixmap)?;
	let shader = match stops {
		[] => return Err(eyre!("Theme has no background stops")),
		[only] => Shader::SolidColor(only.to_skia()),
		_ => {
			let last = (stops.len() - 1) as f32;
			let stops = stops.iter().enumerate().map(|(i, c)| GradientStop::new(i as f32 / last, c.to_skia())).collect();
			LinearGradient::new(Point::from_xy(0.0, 0.0), Point::from_xy(0.0, rect.height()), stops, SpreadMode::Pad, Transform::identity())
				.ok_or_else(|| eyre!("Failed to build background gradient"))?
		}
	};
	let paint = Paint {
		shader,
		..Paint::default()
	};
	pixmap.fill_rect(rect, &paint, Transform::identity(), None);
	Ok(())
}

fn paint_grain<R: Rng>(pixmap: &mut Pixmap, color: Rgba, rng: &mut R) {
	let (width, height) = (pixmap.width(), pixmap.height());
	let mut paint = Paint::default();
	paint.set_color(color.with_alpha(GRAIN_ALPHA).to_skia());
	paint.anti_alias = false;

	for _ in 0..GRAIN_DOTS {
		let x = rng.random_range(0..width) as f32;
		let y = rng.random_range(0..height) as f32;
		if let Some(dot) = Rect::from_xywh(x, y, 1.0, 1.0) {
			pixmap.fill_rect(dot, &paint, Transform::identity(), None);
		}
	}
}

/// Diamond and octagon outlines on every lattice node, including one step past each edge.
fn paint_lattice(pixmap: &mut Pixmap, color: Rgba) {
	let (width, height) = (pixmap.width() as f32, pixmap.height() as f32);
	let mut pb = PathBuilder::new();

	let mut x = 0.0;
	while x < width + LATTICE_STEP {
		let mut y = 0.0;
		while y < height + LATTICE_STEP {
			pb.move_to(x, y - DIAMOND_HALF);
			pb.line_to(x + DIAMOND_HALF, y);
			pb.line_to(x, y + DIAMOND_HALF);
			pb.line_to(x - DIAMOND_HALF, y);
			pb.close();

			for i in 0..8 {
				let angle = i as f32 * FRAC_PI_4;
				let (px, py) = (x + OCTAGON_RADIUS * angle.cos(), y + OCTAGON_RADIUS * angle.sin());
				if i == 0 { pb.move_to(px, py) } else { pb.line_to(px, py) }
			}
			pb.close();
			y += LATTICE_STEP;
		}
		x += LATTICE_STEP;
	}

	let Some(path) = pb.finish() else { return };
	let mut paint = Paint::default();
	paint.set_color(color.with_alpha(LATTICE_ALPHA).to_skia());
	paint.anti_alias = true;
	let stroke = Stroke { width: 1.0, ..Stroke::default() };
	pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Two soft discs: top-right corner and bottom-left corner.
fn paint_blobs(pixmap: &mut Pixmap, color: Rgba) {
	let (width, height) = (pixmap.width() as f32, pixmap.height() as f32);
	for (cx, cy, radius) in [(width, 0.0, 800.0), (0.0, height, 600.0)] {
		let outer = radius + BLOB_FEATHER;
		let solid = color.with_alpha(BLOB_ALPHA).to_skia();
		let clear = Color::from_rgba8(color.r, color.g, color.b, 0);
		let stops = vec![GradientStop::new(0.0, solid), GradientStop::new((radius - BLOB_FEATHER) / outer, solid), GradientStop::new(1.0, clear)];
		let center = Point::from_xy(cx, cy);
		let Some(shader) = RadialGradient::new(center, center, outer, stops, SpreadMode::Pad, Transform::identity()) else {
			continue;
		};

		let mut pb = PathBuilder::new();
		pb.push_circle(cx, cy, outer);
		let Some(disc) = pb.finish() else { continue };
		let paint = Paint {
			shader,
			anti_alias: true,
			..Paint::default()
		};
		pixmap.fill_path(&disc, &paint, FillRule::Winding, Transform::identity(), None);
	}
}

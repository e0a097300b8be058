//! Drawing surface for one card.
//!
//! Fills and strokes that need per-pixel control (gradient, grain, lattice) go straight into the
//! `tiny_skia` pixmap. Everything on top of the background is collected as an SVG overlay and
//! composited by `resvg` at export time, which also gives us text shaping and blur filters.

use std::fmt::Write as _;

use color_eyre::eyre::{Result, eyre};

use crate::{
	fonts::FontSpec,
	theme::Rgba,
	wrap::Direction,
};

pub struct Canvas {
	pub(crate) pixmap: tiny_skia::Pixmap,
	pub(crate) overlay: Overlay,
}

impl Canvas {
	pub fn new(width: u32, height: u32) -> Result<Self> {
		let pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| eyre!("Failed to create {width}x{height} pixmap"))?;
		Ok(Self {
			pixmap,
			overlay: Overlay::new(width, height),
		})
	}

	pub fn width(&self) -> u32 {
		self.pixmap.width()
	}

	pub fn height(&self) -> u32 {
		self.pixmap.height()
	}

	pub fn pixmap(&self) -> &tiny_skia::Pixmap {
		&self.pixmap
	}

	pub fn pixmap_mut(&mut self) -> &mut tiny_skia::Pixmap {
		&mut self.pixmap
	}

	pub fn overlay(&self) -> &Overlay {
		&self.overlay
	}

	pub fn overlay_mut(&mut self) -> &mut Overlay {
		&mut self.overlay
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Anchor {
	Start,
	#[default]
	Middle,
}

impl Anchor {
	fn svg(self) -> &'static str {
		match self {
			Anchor::Start => "start",
			Anchor::Middle => "middle",
		}
	}
}

/// One line of text; `y` is the baseline.
#[derive(Clone, Debug)]
pub struct TextRun<'a> {
	pub text: &'a str,
	pub x: f32,
	pub y: f32,
	pub font: FontSpec,
	pub family: &'a str,
	pub fill: Rgba,
	pub anchor: Anchor,
	pub direction: Direction,
	pub filter: Option<&'a str>,
}

#[derive(Clone, Copy, Debug)]
pub struct Shadow {
	pub dy: f32,
	pub blur: f32,
	pub color: Rgba,
}

/// Vector layer, painted in insertion order.
#[derive(Clone, Debug)]
pub struct Overlay {
	width: u32,
	height: u32,
	defs: String,
	body: String,
	elements: usize,
}

impl Overlay {
	pub fn new(width: u32, height: u32) -> Self {
		Self {
			width,
			height,
			defs: String::new(),
			body: String::new(),
			elements: 0,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.elements == 0
	}

	pub fn len(&self) -> usize {
		self.elements
	}

	/// Registers a drop-shadow filter; `blur` follows the canvas convention (twice the standard deviation).
	pub fn define_shadow(&mut self, id: &str, shadow: Shadow) {
		let _ = write!(
			self.defs,
			r#"<filter id="{id}" x="-50%" y="-50%" width="200%" height="200%"><feDropShadow dx="0" dy="{:.1}" stdDeviation="{:.1}" flood-color="{}" flood-opacity="{:.3}"/></filter>"#,
			shadow.dy,
			shadow.blur / 2.0,
			shadow.color.svg_rgb(),
			shadow.color.opacity(),
		);
	}

	pub fn text(&mut self, run: &TextRun) {
		let style = if run.font.italic { "italic" } else { "normal" };
		let direction = match run.direction {
			Direction::Ltr => "ltr",
			Direction::Rtl => "rtl",
		};
		let _ = write!(
			self.body,
			r#"<text x="{:.1}" y="{:.1}" font-family="{}" font-size="{:.1}" font-weight="{}" font-style="{style}" direction="{direction}" text-anchor="{}" fill="{}" fill-opacity="{:.3}"{}>{}</text>"#,
			run.x,
			run.y,
			escape(run.family),
			run.font.size,
			run.font.weight,
			run.anchor.svg(),
			run.fill.svg_rgb(),
			run.fill.opacity(),
			filter_attr(run.filter),
			escape(run.text),
		);
		self.elements += 1;
	}

	/// Rounded rectangle; at least one of `fill`/`stroke` should be set.
	#[allow(clippy::too_many_arguments)]
	pub fn rounded_rect(&mut self, x: f32, y: f32, width: f32, height: f32, radius: f32, fill: Option<Rgba>, stroke: Option<(Rgba, f32)>, filter: Option<&str>) {
		let _ = write!(
			self.body,
			r#"<rect x="{x:.1}" y="{y:.1}" width="{width:.1}" height="{height:.1}" rx="{radius:.1}" {} {}{}/>"#,
			paint_attrs("fill", fill),
			stroke_attrs(stroke),
			filter_attr(filter),
		);
		self.elements += 1;
	}

	/// Axis-aligned square of side `2 * half` centred on (`cx`, `cy`), rotated by `degrees`.
	pub fn rotated_square(&mut self, cx: f32, cy: f32, half: f32, degrees: f32, fill: Rgba) {
		let _ = write!(
			self.body,
			r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" transform="translate({cx:.1} {cy:.1}) rotate({degrees:.1})" {}/>"#,
			-half,
			-half,
			half * 2.0,
			half * 2.0,
			paint_attrs("fill", Some(fill)),
		);
		self.elements += 1;
	}

	pub fn round_line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgba, width: f32) {
		let _ = write!(
			self.body,
			r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke-linecap="round" {}/>"#,
			from.0,
			from.1,
			to.0,
			to.1,
			stroke_attrs(Some((color, width))),
		);
		self.elements += 1;
	}

	pub fn circle(&mut self, cx: f32, cy: f32, radius: f32, fill: Rgba) {
		let _ = write!(self.body, r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{radius:.1}" {}/>"#, paint_attrs("fill", Some(fill)));
		self.elements += 1;
	}

	pub fn to_svg(&self) -> String {
		format!(
			r#"<?xml version="1.0" encoding="UTF-8"?>
<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">
  <defs>{defs}</defs>
  {body}
</svg>"#,
			w = self.width,
			h = self.height,
			defs = self.defs,
			body = self.body,
		)
	}
}

fn paint_attrs(kind: &str, color: Option<Rgba>) -> String {
	match color {
		Some(c) => format!(r#"{kind}="{}" {kind}-opacity="{:.3}""#, c.svg_rgb(), c.opacity()),
		None => format!(r#"{kind}="none""#),
	}
}

fn stroke_attrs(stroke: Option<(Rgba, f32)>) -> String {
	match stroke {
		Some((color, width)) => format!(r#"{} stroke-width="{width:.1}""#, paint_attrs("stroke", Some(color))),
		None => paint_attrs("stroke", None),
	}
}

fn filter_attr(filter: Option<&str>) -> String {
	filter.map(|id| format!(r#" filter="url(#{id})""#)).unwrap_or_default()
}

fn escape(text: &str) -> String {
	text.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&apos;")
}

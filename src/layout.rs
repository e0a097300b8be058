//! Two-pass card layout.
//!
//! [`plan`] walks the blocks top to bottom and records where each one starts without touching a
//! surface; the canvas is then allocated at the planned size and [`draw`] walks the same blocks
//! again with the same [`TextStyle`]s. Every text baseline in the second pass is derived from the
//! first, so content can never outgrow the canvas.
//!
//! Block order: header, Arabic, separator, translation, note box, footer.

use color_eyre::eyre::{Result, bail, ensure};
use tracing::{debug, instrument};

use crate::{
	canvas::{Anchor, Canvas, Shadow, TextRun},
	config::Branding,
	fonts::{FontRole, FontSet, FontSpec, Measure},
	request::ShareRequest,
	theme::Rgba,
	wrap::{Direction, TextStyle, wrap},
};

pub const CANVAS_WIDTH: u32 = 1080;
/// 9:16 story format.
pub const MIN_CANVAS_HEIGHT: u32 = 1920;
const PADDING: f32 = 80.0;
const CONTENT_WIDTH: f32 = CANVAS_WIDTH as f32 - 2.0 * PADDING;
const CENTER_X: f32 = CANVAS_WIDTH as f32 / 2.0;

const HEADER_TOP: f32 = 150.0;
const LOGO_LIFT: f32 = 30.0;
const LOGO_SPACE: f32 = 60.0;
const LOGO_HALF: f32 = 25.0;
const TITLE_TO_REFERENCE: f32 = 75.0;
const HEADER_BOTTOM: f32 = 180.0;
const TITLE_FONT: FontSpec = FontSpec::sans(48.0, 700);
const REFERENCE_FONT: FontSpec = FontSpec::sans(42.0, 600);

pub const ARABIC: TextStyle = TextStyle {
	font: FontSpec::arabic(80.0),
	line_height: 140.0,
	max_width: CONTENT_WIDTH,
	direction: Direction::Rtl,
};
pub const ARABIC_MARGIN: f32 = 60.0;

const SEPARATOR_LEAD: f32 = 20.0;
const SEPARATOR_TRAIL: f32 = 100.0;
const SEPARATOR_HALF: f32 = 150.0;
const SEPARATOR_DOT: f32 = 6.0;
const ARABIC_ONLY_GAP: f32 = 40.0;

pub const TRANSLATION: TextStyle = TextStyle {
	font: FontSpec::sans(38.0, 400).italic(),
	line_height: 60.0,
	max_width: CONTENT_WIDTH,
	direction: Direction::Ltr,
};
pub const TRANSLATION_MARGIN: f32 = 60.0;

const NOTE_LEAD: f32 = 40.0;
const NOTE_PADDING_X: f32 = 45.0;
const NOTE_HEADING_BASELINE: f32 = 70.0;
const NOTE_TEXT_BASELINE: f32 = 130.0;
/// Heading plus top and bottom padding around the wrapped note.
const NOTE_CHROME: f32 = 150.0;
const NOTE_RADIUS: f32 = 32.0;
const NOTE_HEADING_FONT: FontSpec = FontSpec::sans(28.0, 700);
pub const NOTE: TextStyle = TextStyle {
	font: FontSpec::sans(32.0, 400).italic(),
	line_height: 50.0,
	max_width: CONTENT_WIDTH - 2.0 * NOTE_PADDING_X,
	direction: Direction::Ltr,
};
pub const NOTE_MARGIN: f32 = 80.0;

/// Kept free below the last content block; the footer pill lives in it.
pub const FOOTER_BAND: f32 = 200.0;
const FOOTER_BASELINE_FROM_BOTTOM: f32 = 120.0;
const FOOTER_FONT: FontSpec = FontSpec::sans(32.0, 300);
const PILL_WIDTH: f32 = 400.0;
const PILL_HEIGHT: f32 = 70.0;
const PILL_ABOVE_BASELINE: f32 = 45.0;

const VERSE_SHADOW: &str = "verse-shadow";
const NOTE_SHADOW: &str = "note-shadow";

/// Vertical extent of a wrapped text block; `top` is the first baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Block {
	pub top: f32,
	pub height: f32,
}

impl Block {
	pub fn bottom(&self) -> f32 {
		self.top + self.height
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
	/// Centre of the star logo, absent on undecorated themes.
	pub logo: Option<f32>,
	pub title: f32,
	pub reference: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteBox {
	pub top: f32,
	pub height: f32,
	pub text: Block,
}

impl NoteBox {
	pub fn bottom(&self) -> f32 {
		self.top + self.height
	}
}

/// Where everything goes for one render. Built by [`plan`], consumed by [`draw`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutPlan {
	pub width: u32,
	pub height: u32,
	pub header: Header,
	pub arabic: Option<Block>,
	/// Y of the separator rule.
	pub separator: Option<f32>,
	pub translation: Option<Block>,
	pub note: Option<NoteBox>,
	/// Cursor after the last content block and its margin.
	pub content_bottom: f32,
	pub footer: f32,
}

/// Pass 1: measures every enabled block and sizes the canvas to fit.
#[instrument(skip_all, fields(chapter = %request.chapter_name, ayah = request.ayah_number, theme = %request.theme))]
pub fn plan<M: Measure + ?Sized>(request: &ShareRequest, fonts: &M) -> LayoutPlan {
	let theme = request.theme.theme();
	let mut cursor = HEADER_TOP;

	let logo = if theme.has_pattern {
		let center = cursor - LOGO_LIFT;
		cursor += LOGO_SPACE;
		Some(center)
	} else {
		None
	};
	let title = cursor;
	cursor += TITLE_TO_REFERENCE;
	let reference = cursor;
	cursor += HEADER_BOTTOM;

	let arabic = request.arabic().map(|text| Block {
		top: cursor,
		height: wrap(text, &ARABIC, fonts, None),
	});
	if let Some(block) = arabic {
		cursor += block.height + ARABIC_MARGIN;
	}

	let translation_text = request.translation();
	let separator = match (arabic, &translation_text) {
		(Some(_), Some(_)) => {
			cursor += SEPARATOR_LEAD;
			let y = cursor;
			cursor += SEPARATOR_TRAIL;
			Some(y)
		}
		(Some(_), None) => {
			cursor += ARABIC_ONLY_GAP;
			None
		}
		_ => None,
	};

	let translation = translation_text.map(|text| Block {
		top: cursor,
		height: wrap(&text, &TRANSLATION, fonts, None),
	});
	if let Some(block) = translation {
		cursor += block.height + TRANSLATION_MARGIN;
	}

	let note = request.note().map(|text| {
		let top = cursor + NOTE_LEAD;
		let text_height = wrap(text, &NOTE, fonts, None);
		NoteBox {
			top,
			height: text_height + NOTE_CHROME,
			text: Block {
				top: top + NOTE_TEXT_BASELINE,
				height: text_height,
			},
		}
	});
	if let Some(note) = note {
		cursor = note.bottom() + NOTE_MARGIN;
	}

	let height = MIN_CANVAS_HEIGHT.max((cursor + FOOTER_BAND).ceil() as u32);
	let plan = LayoutPlan {
		width: CANVAS_WIDTH,
		height,
		header: Header { logo, title, reference },
		arabic,
		separator,
		translation,
		note,
		content_bottom: cursor,
		footer: height as f32 - FOOTER_BASELINE_FROM_BOTTOM,
	};
	debug!(height, content_bottom = cursor, "layout planned");
	plan
}

/// Pass 2: draws every planned block onto `canvas`, which must already carry the background.
#[instrument(skip_all)]
pub fn draw(plan: &LayoutPlan, request: &ShareRequest, fonts: &FontSet, branding: &Branding, canvas: &mut Canvas) -> Result<()> {
	if (canvas.width(), canvas.height()) != (plan.width, plan.height) {
		bail!("Canvas is {}x{}, plan expects {}x{}", canvas.width(), canvas.height(), plan.width, plan.height);
	}
	let theme = request.theme.theme();
	let sans = fonts.family_list(FontRole::Sans);
	let arabic_family = fonts.family_list(FontRole::Arabic);
	let overlay = canvas.overlay_mut();

	overlay.define_shadow(
		VERSE_SHADOW,
		Shadow {
			dy: 0.0,
			blur: 10.0,
			color: Rgba::BLACK.with_alpha(0.3),
		},
	);
	overlay.define_shadow(
		NOTE_SHADOW,
		Shadow {
			dy: 10.0,
			blur: 30.0,
			color: Rgba::BLACK.with_alpha(0.2),
		},
	);

	// header
	if let Some(y) = plan.header.logo {
		overlay.rotated_square(CENTER_X, y, LOGO_HALF, 45.0, theme.primary);
		overlay.rotated_square(CENTER_X, y, LOGO_HALF, 90.0, theme.primary);
	}
	overlay.text(&sans_run(&branding.title, &sans, CENTER_X, plan.header.title, TITLE_FONT, theme.text));
	let reference = request.reference();
	overlay.text(&sans_run(&reference, &sans, CENTER_X, plan.header.reference, REFERENCE_FONT, theme.secondary));

	if let (Some(block), Some(text)) = (plan.arabic, request.arabic()) {
		let drawn = wrap(
			text,
			&ARABIC,
			fonts,
			Some(&mut |line: &str, dy: f32| {
				overlay.text(&TextRun {
					text: line,
					x: CENTER_X,
					y: block.top + dy,
					font: ARABIC.font,
					family: &arabic_family,
					fill: theme.text,
					anchor: Anchor::Middle,
					direction: Direction::Rtl,
					filter: Some(VERSE_SHADOW),
				})
			}),
		);
		ensure_planned("Arabic", drawn, block.height)?;
	}

	if let Some(y) = plan.separator {
		overlay.round_line((CENTER_X - SEPARATOR_HALF, y), (CENTER_X + SEPARATOR_HALF, y), theme.accent, 4.0);
		overlay.circle(CENTER_X, y, SEPARATOR_DOT, theme.primary);
	}

	if let (Some(block), Some(text)) = (plan.translation, request.translation()) {
		let drawn = wrap(
			&text,
			&TRANSLATION,
			fonts,
			Some(&mut |line: &str, dy: f32| overlay.text(&sans_run(line, &sans, CENTER_X, block.top + dy, TRANSLATION.font, theme.secondary))),
		);
		ensure_planned("translation", drawn, block.height)?;
	}

	if let (Some(note), Some(text)) = (plan.note, request.note()) {
		if theme.has_pattern {
			overlay.rounded_rect(PADDING, note.top, CONTENT_WIDTH, note.height, NOTE_RADIUS, Some(theme.accent), None, Some(NOTE_SHADOW));
		} else {
			overlay.rounded_rect(PADDING, note.top, CONTENT_WIDTH, note.height, NOTE_RADIUS, None, Some((theme.secondary, 1.0)), None);
		}
		let left = PADDING + NOTE_PADDING_X;
		overlay.text(&TextRun {
			anchor: Anchor::Start,
			..sans_run(&branding.note_heading, &sans, left, note.top + NOTE_HEADING_BASELINE, NOTE_HEADING_FONT, theme.primary)
		});
		let drawn = wrap(
			text,
			&NOTE,
			fonts,
			Some(&mut |line: &str, dy: f32| {
				overlay.text(&TextRun {
					anchor: Anchor::Start,
					..sans_run(line, &sans, left, note.text.top + dy, NOTE.font, theme.text)
				})
			}),
		);
		ensure_planned("note", drawn, note.text.height)?;
	}

	if theme.has_pattern {
		overlay.rounded_rect(
			CENTER_X - PILL_WIDTH / 2.0,
			plan.footer - PILL_ABOVE_BASELINE,
			PILL_WIDTH,
			PILL_HEIGHT,
			PILL_HEIGHT / 2.0,
			Some(Rgba::WHITE.with_alpha(0.05)),
			None,
			None,
		);
	}
	overlay.text(&sans_run(&branding.footer, &sans, CENTER_X, plan.footer, FOOTER_FONT, theme.secondary));
	Ok(())
}

/// A plan measured with other metrics would let text spill past the canvas or into the next block.
fn ensure_planned(block: &str, drawn: f32, planned: f32) -> Result<()> {
	ensure!(drawn == planned, "{block} block drew {drawn}px but was planned at {planned}px");
	Ok(())
}

/// Centred left-to-right line in the sans family.
fn sans_run<'a>(text: &'a str, family: &'a str, x: f32, y: f32, font: FontSpec, fill: Rgba) -> TextRun<'a> {
	TextRun {
		text,
		x,
		y,
		font,
		family,
		fill,
		anchor: Anchor::Middle,
		direction: Direction::Ltr,
		filter: None,
	}
}

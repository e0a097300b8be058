//! Greedy word wrapping.
//!
//! The same routine measures and draws, so the height it reports is identical either way and the
//! layout can be planned before anything touches the canvas.

use crate::fonts::{FontSpec, Measure};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Direction {
	#[default]
	Ltr,
	Rtl,
}

/// Everything that decides where a block breaks and how tall it is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
	pub font: FontSpec,
	pub line_height: f32,
	pub max_width: f32,
	pub direction: Direction,
}

/// Splits `text` into lines no wider than `max_width`, breaking only at whitespace.
///
/// A word wider than `max_width` gets a line of its own. Whitespace-only input yields no lines.
pub fn wrap_lines<M: Measure + ?Sized>(text: &str, font: &FontSpec, max_width: f32, measure: &M) -> Vec<String> {
	let mut lines = Vec::new();
	let mut line = String::new();

	for word in text.split_whitespace() {
		if line.is_empty() {
			line.push_str(word);
			continue;
		}
		let candidate = format!("{line} {word}");
		if measure.text_width(&candidate, font) > max_width {
			lines.push(std::mem::replace(&mut line, word.to_string()));
		} else {
			line = candidate;
		}
	}
	if !line.is_empty() {
		lines.push(line);
	}
	lines
}

/// Wraps `text` with `style` and returns the block height, `lines * line_height`.
///
/// With `draw`, each line is handed to the callback together with its baseline offset from the
/// block origin (`0`, `line_height`, `2 * line_height`, ...). Direction only matters to the callback.
pub fn wrap<M: Measure + ?Sized>(text: &str, style: &TextStyle, measure: &M, draw: Option<&mut dyn FnMut(&str, f32)>) -> f32 {
	let lines = wrap_lines(text, &style.font, style.max_width, measure);
	if let Some(draw) = draw {
		for (i, line) in lines.iter().enumerate() {
			draw(line, i as f32 * style.line_height);
		}
	}
	lines.len() as f32 * style.line_height
}

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::theme::ThemeId;

/// Everything a single card render needs. Built by the caller, consumed by one render.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, new)]
#[serde(rename_all = "camelCase", default)]
pub struct ShareRequest {
	pub chapter_name: String,
	pub ayah_number: u32,
	#[serde(alias = "textArabic")]
	pub arabic_text: Option<String>,
	#[serde(alias = "translation")]
	pub translation_text: Option<String>,
	pub note: Option<String>,
	pub include_note: bool,
	pub show_arabic: bool,
	pub show_translation: bool,
	pub theme: ThemeId,
}

impl ShareRequest {
	/// `QS. <chapter> : <ayah>`
	pub fn reference(&self) -> String {
		format!("QS. {} : {}", self.chapter_name, self.ayah_number)
	}

	/// Arabic text, if the block is enabled and has something to show.
	pub fn arabic(&self) -> Option<&str> {
		self.show_arabic.then_some(self.arabic_text.as_deref()).flatten().filter(|t| has_words(t))
	}

	/// Translation with markup removed, if the block is enabled and non-empty after stripping.
	pub fn translation(&self) -> Option<String> {
		if !self.show_translation {
			return None;
		}
		let clean = strip_markup(self.translation_text.as_deref()?);
		has_words(&clean).then_some(clean)
	}

	pub fn note(&self) -> Option<&str> {
		self.include_note.then_some(self.note.as_deref()).flatten().filter(|t| has_words(t))
	}
}

fn has_words(text: &str) -> bool {
	text.split_whitespace().next().is_some()
}

/// Removes every `<...>` tag, keeping the text between tags. An unterminated `<` is kept literally.
pub fn strip_markup(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(open) = rest.find('<') {
		out.push_str(&rest[..open]);
		match rest[open..].find('>') {
			Some(close) => rest = &rest[open + close + 1..],
			None => {
				rest = &rest[open..];
				break;
			}
		}
	}
	out.push_str(rest);
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_paragraph_tags() {
		assert_eq!(strip_markup("<p>In the name of Allah</p>"), "In the name of Allah");
	}

	#[test]
	fn strips_footnote_markers_with_attributes() {
		let raw = r#"Guide us<sup foot_note="77">1</sup> to the Straight Way"#;
		assert_eq!(strip_markup(raw), "Guide us1 to the Straight Way");
	}

	#[test]
	fn strips_tags_spanning_lines() {
		assert_eq!(strip_markup("a<span\nclass=\"x\">b</span>"), "ab");
	}

	#[test]
	fn keeps_unterminated_angle_bracket() {
		assert_eq!(strip_markup("1 < 2 always"), "1 < 2 always");
	}

	#[test]
	fn blocks_respect_toggles() {
		let mut req = ShareRequest::new(
			"Al-Fatihah".into(),
			1,
			Some("بسم الله".into()),
			Some("<p></p>".into()),
			Some("mine".into()),
			false,
			true,
			true,
			ThemeId::Midnight,
		);
		assert_eq!(req.arabic(), Some("بسم الله"));
		assert_eq!(req.translation(), None, "tags only leaves nothing to draw");
		assert_eq!(req.note(), None);

		req.include_note = true;
		req.show_arabic = false;
		assert_eq!(req.arabic(), None);
		assert_eq!(req.note(), Some("mine"));
		assert_eq!(req.reference(), "QS. Al-Fatihah : 1");
	}

	#[test]
	fn deserializes_from_camel_case_json() {
		let req: ShareRequest = serde_json::from_str(
			r#"{"chapterName":"Al-Ikhlas","ayahNumber":1,"textArabic":"قل","translation":"Say","showArabic":true,"showTranslation":true,"theme":"ocean"}"#,
		)
		.unwrap();
		assert_eq!(req.theme, ThemeId::Ocean);
		assert_eq!(req.arabic_text.as_deref(), Some("قل"));
		assert_eq!(req.translation().as_deref(), Some("Say"));
		assert!(!req.include_note);
	}
}

//! Font resolution and text measurement.
//!
//! Measurement and drawing must agree on the face: [`FontSet`] decides the family list once and
//! hands the same list to the measurer (via `fontdb` queries) and to the overlay renderer (via the
//! `font-family` attribute `usvg` resolves against the same database).

use std::{path::Path, sync::Arc, time::Duration};

use tracing::{debug, instrument, warn};

use crate::config::FontConfig;

/// Monospace chars are ~0.6 of the font size; used when no face can be resolved.
const ESTIMATED_ADVANCE: f32 = 0.6;

/// DejaVu Sans, regular. Covers Latin and Arabic, and is always in the database so text is never dropped.
const BUNDLED_FACE: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
pub const BUNDLED_FAMILY: &str = "DejaVu Sans";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FontRole {
	/// Decorative face for the verse itself.
	Arabic,
	/// Everything else: branding, translation, note, footer.
	Sans,
}

impl FontRole {
	/// A face without this glyph cannot stand in for the role.
	fn sample(self) -> char {
		match self {
			Self::Arabic => '\u{0628}',
			Self::Sans => 'a',
		}
	}

	fn generic(self) -> fontdb::Family<'static> {
		match self {
			Self::Arabic => fontdb::Family::Serif,
			Self::Sans => fontdb::Family::SansSerif,
		}
	}

	fn generic_name(self) -> &'static str {
		match self {
			Self::Arabic => "serif",
			Self::Sans => "sans-serif",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontSpec {
	pub role: FontRole,
	pub size: f32,
	pub weight: u16,
	pub italic: bool,
}

impl FontSpec {
	pub const fn arabic(size: f32) -> Self {
		Self {
			role: FontRole::Arabic,
			size,
			weight: 400,
			italic: false,
		}
	}

	pub const fn sans(size: f32, weight: u16) -> Self {
		Self {
			role: FontRole::Sans,
			size,
			weight,
			italic: false,
		}
	}

	pub const fn italic(self) -> Self {
		Self { italic: true, ..self }
	}
}

/// Pixel width of a run of text set in a given font.
pub trait Measure {
	fn text_width(&self, text: &str, font: &FontSpec) -> f32;
}

/// Width estimate from character count alone.
pub fn estimate_width(text: &str, size: f32) -> f32 {
	text.chars().count() as f32 * size * ESTIMATED_ADVANCE
}

/// The fonts one render is measured and drawn with.
///
/// Both roles always name a family that is installed in `db` and has glyphs for the role, and the
/// database's generic `serif`/`sans-serif` point at those same families.
#[derive(Clone, Debug)]
pub struct FontSet {
	db: Arc<fontdb::Database>,
	arabic: String,
	sans: String,
}

impl FontSet {
	/// Only the bundled face, for both roles.
	pub fn bundled() -> Self {
		let mut db = fontdb::Database::new();
		db.load_font_data(BUNDLED_FACE.to_vec());
		Self::resolved(db, BUNDLED_FAMILY.to_string(), BUNDLED_FAMILY.to_string())
	}

	/// Wraps an already populated database, adding the bundled face.
	///
	/// A configured family that is missing or lacks the role's glyphs is replaced by the database's
	/// generic family when that one qualifies, otherwise by [`BUNDLED_FAMILY`].
	pub fn from_database(mut db: fontdb::Database, config: &FontConfig) -> Self {
		db.load_font_data(BUNDLED_FACE.to_vec());
		let arabic = resolve(&db, FontRole::Arabic, &config.arabic_family);
		let sans = resolve(&db, FontRole::Sans, &config.sans_family);
		debug!(faces = db.len(), %arabic, %sans, "fonts ready");
		Self::resolved(db, arabic, sans)
	}

	fn resolved(mut db: fontdb::Database, arabic: String, sans: String) -> Self {
		db.set_serif_family(arabic.as_str());
		db.set_sans_serif_family(sans.as_str());
		Self { db: Arc::new(db), arabic, sans }
	}

	/// Loads system fonts plus `config.font_dirs` on a blocking task, giving up after `config.load_timeout_ms`.
	///
	/// Never fails: a timeout or a panicked loader logs a warning and yields [`FontSet::bundled`].
	#[instrument(skip_all, fields(timeout_ms = config.load_timeout_ms))]
	pub async fn load(config: &FontConfig) -> Self {
		let dirs = config.font_dirs.clone();
		let task = tokio::task::spawn_blocking(move || build_database(&dirs));
		match tokio::time::timeout(Duration::from_millis(config.load_timeout_ms), task).await {
			Ok(Ok(db)) => Self::from_database(db, config),
			Ok(Err(e)) => {
				warn!(error = %e, "font loading failed, using bundled font");
				Self::bundled()
			}
			Err(_) => {
				warn!("font loading timed out, using bundled font");
				Self::bundled()
			}
		}
	}

	pub fn database(&self) -> Arc<fontdb::Database> {
		Arc::clone(&self.db)
	}

	pub fn family(&self, role: FontRole) -> &str {
		match role {
			FontRole::Arabic => &self.arabic,
			FontRole::Sans => &self.sans,
		}
	}

	/// Value for an SVG `font-family` attribute.
	pub fn family_list(&self, role: FontRole) -> String {
		format!("'{}', {}", self.family(role), role.generic_name())
	}

	/// Shaped advance of `text`, the same way the overlay renderer lays it out.
	fn shaped_width(&self, text: &str, font: &FontSpec) -> Option<f32> {
		let families = [fontdb::Family::Name(self.family(font.role)), font.role.generic()];
		let query = fontdb::Query {
			families: &families,
			weight: fontdb::Weight(font.weight),
			stretch: fontdb::Stretch::Normal,
			style: if font.italic { fontdb::Style::Italic } else { fontdb::Style::Normal },
		};
		let id = self.db.query(&query)?;
		self.db
			.with_face_data(id, |data, index| {
				let face = rustybuzz::Face::from_slice(data, index)?;
				let mut buffer = rustybuzz::UnicodeBuffer::new();
				buffer.push_str(text);
				if font.role == FontRole::Arabic {
					buffer.set_direction(rustybuzz::Direction::RightToLeft);
				}
				buffer.guess_segment_properties();
				let glyphs = rustybuzz::shape(&face, &[], buffer);
				let units: i32 = glyphs.glyph_positions().iter().map(|p| p.x_advance).sum();
				Some(units as f32 * font.size / face.units_per_em().max(1) as f32)
			})
			.flatten()
	}
}

impl Measure for FontSet {
	fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
		self.shaped_width(text, font).unwrap_or_else(|| estimate_width(text, font.size))
	}
}

/// Installed spelling of `configured`, or the first qualifying fallback.
fn resolve(db: &fontdb::Database, role: FontRole, configured: &str) -> String {
	let installed = db
		.faces()
		.flat_map(|face| face.families.iter())
		.map(|(name, _)| name.as_str())
		.find(|name| name.eq_ignore_ascii_case(configured));
	if let Some(name) = installed.filter(|name| covers(db, name, role)) {
		return name.to_string();
	}

	let generic_family = role.generic();
	let generic = db.family_name(&generic_family);
	let fallback = if covers(db, generic, role) { generic } else { BUNDLED_FAMILY };
	warn!(family = configured, fallback, ?role, "font family unusable, falling back");
	fallback.to_string()
}

fn covers(db: &fontdb::Database, family: &str, role: FontRole) -> bool {
	let families = [fontdb::Family::Name(family)];
	let query = fontdb::Query {
		families: &families,
		..fontdb::Query::default()
	};
	db.query(&query)
		.and_then(|id| db.with_face_data(id, |data, index| ttf_parser::Face::parse(data, index).ok().and_then(|face| face.glyph_index(role.sample())).is_some()))
		.unwrap_or(false)
}

fn build_database(dirs: &[std::path::PathBuf]) -> fontdb::Database {
	let mut db = fontdb::Database::new();
	db.load_system_fonts();

	// dev checkout
	let bundled = Path::new("assets/fonts");
	if bundled.is_dir() {
		db.load_fonts_dir(bundled);
	}
	for dir in dirs {
		db.load_fonts_dir(dir);
	}
	db
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASMALA: &str = "بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ";

	/// Width of the advance box usvg lays `text` out in, with the same database and family list.
	fn rendered_width(set: &FontSet, text: &str, font: &FontSpec) -> f32 {
		let svg = format!(
			r#"<svg xmlns="http://www.w3.org/2000/svg" width="3000" height="300"><text x="20" y="200" font-family="{}" font-size="{}" font-weight="{}">{text}</text></svg>"#,
			set.family_list(font.role),
			font.size,
			font.weight,
		);
		let options = usvg::Options {
			fontdb: set.database(),
			..usvg::Options::default()
		};
		let tree = usvg::Tree::from_str(&svg, &options).unwrap();
		tree.root().abs_bounding_box().width()
	}

	fn installed(set: &FontSet, family: &str) -> bool {
		set.database().faces().any(|face| face.families.iter().any(|(name, _)| name == family))
	}

	#[test]
	fn estimate_scales_with_chars_and_size() {
		assert_eq!(estimate_width("abcd", 10.0), 24.0);
		assert_eq!(estimate_width("", 10.0), 0.0);
		assert_eq!(estimate_width("الله", 10.0), 24.0);
	}

	#[test]
	fn bundled_set_measures_real_glyphs() {
		let set = FontSet::bundled();
		let font = FontSpec::sans(32.0, 400);
		assert_eq!(set.family(FontRole::Sans), BUNDLED_FAMILY);
		assert_eq!(set.text_width("", &font), 0.0);
		// proportional, unlike the estimate
		assert!(set.text_width("iiii", &font) < set.text_width("MMMM", &font));
		assert!(set.text_width("word word", &font) > 2.0 * set.text_width("word", &font));
	}

	#[test]
	fn arabic_measurement_matches_rendered_layout() {
		let set = FontSet::bundled();
		let font = FontSpec::arabic(80.0);
		let measured = set.text_width(BASMALA, &font);
		let rendered = rendered_width(&set, BASMALA, &font);
		assert!((measured - rendered).abs() <= 1.0 + rendered * 0.01, "measured {measured}, rendered {rendered}");
		// fits the card's content column on one line
		assert!(measured < 920.0, "{measured}");
	}

	#[test]
	fn latin_measurement_matches_rendered_layout() {
		let set = FontSet::bundled();
		let font = FontSpec::sans(48.0, 700);
		let text = "Kafein Quran AVAWAY fi ffl";
		let measured = set.text_width(text, &font);
		let rendered = rendered_width(&set, text, &font);
		assert!((measured - rendered).abs() <= 1.0 + rendered * 0.01, "measured {measured}, rendered {rendered}");
	}

	#[test]
	fn empty_database_resolves_to_the_bundled_face() {
		let set = FontSet::from_database(fontdb::Database::new(), &FontConfig::default());
		assert_eq!(set.family(FontRole::Arabic), BUNDLED_FAMILY);
		assert_eq!(set.family(FontRole::Sans), BUNDLED_FAMILY);
		assert_eq!(set.family_list(FontRole::Arabic), "'DejaVu Sans', serif");
		assert_eq!(set.database().family_name(&fontdb::Family::SansSerif), BUNDLED_FAMILY);
	}

	#[test]
	fn configured_family_is_matched_case_insensitively() {
		let config = FontConfig {
			sans_family: "dejavu sans".into(),
			..FontConfig::default()
		};
		let set = FontSet::from_database(fontdb::Database::new(), &config);
		assert_eq!(set.family(FontRole::Sans), "DejaVu Sans");
	}

	#[test]
	fn italic_keeps_size_and_weight() {
		let f = FontSpec::sans(38.0, 300).italic();
		assert!(f.italic);
		assert_eq!((f.size, f.weight), (38.0, 300));
	}

	#[tokio::test]
	async fn load_always_yields_installed_families() {
		let config = FontConfig {
			load_timeout_ms: 0,
			..FontConfig::default()
		};
		let set = FontSet::load(&config).await;
		// finished instantly or fell back; either way both roles must draw
		for role in [FontRole::Arabic, FontRole::Sans] {
			assert!(installed(&set, set.family(role)), "{role:?} -> {}", set.family(role));
		}
		assert!(set.text_width("word", &FontSpec::sans(32.0, 400)) > 0.0);
	}
}

//! Static card palettes.
//!
//! The set of themes is closed; lookups by name never fail and fall back to [`ThemeId::Midnight`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// 8-bit straight-alpha colour.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Rgba {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: u8,
}

impl Rgba {
	pub const BLACK: Rgba = Rgba::hex(0x000000);
	pub const WHITE: Rgba = Rgba::hex(0xffffff);

	/// Opaque colour from `0xRRGGBB`.
	pub const fn hex(rgb: u32) -> Self {
		Self {
			r: (rgb >> 16) as u8,
			g: (rgb >> 8) as u8,
			b: rgb as u8,
			a: 255,
		}
	}

	pub const fn with_alpha(self, alpha: f32) -> Self {
		Self {
			a: (alpha * 255.0 + 0.5) as u8,
			..self
		}
	}

	pub fn opacity(self) -> f32 {
		self.a as f32 / 255.0
	}

	pub fn to_skia(self) -> tiny_skia::Color {
		tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
	}

	/// `#rrggbb`, alpha is emitted separately as `*-opacity`.
	pub fn svg_rgb(self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ThemeId {
	#[default]
	Midnight,
	Emerald,
	Sunset,
	Ocean,
	Rose,
	Minimal,
}

impl ThemeId {
	pub const ALL: [ThemeId; 6] = [ThemeId::Midnight, ThemeId::Emerald, ThemeId::Sunset, ThemeId::Ocean, ThemeId::Rose, ThemeId::Minimal];

	pub fn name(self) -> &'static str {
		match self {
			ThemeId::Midnight => "midnight",
			ThemeId::Emerald => "emerald",
			ThemeId::Sunset => "sunset",
			ThemeId::Ocean => "ocean",
			ThemeId::Rose => "rose",
			ThemeId::Minimal => "minimal",
		}
	}

	/// Case-insensitive lookup, `None` for names outside the closed set.
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|id| id.name().eq_ignore_ascii_case(name.trim()))
	}

	pub fn theme(self) -> &'static Theme {
		match self {
			ThemeId::Midnight => &MIDNIGHT,
			ThemeId::Emerald => &EMERALD,
			ThemeId::Sunset => &SUNSET,
			ThemeId::Ocean => &OCEAN,
			ThemeId::Rose => &ROSE,
			ThemeId::Minimal => &MINIMAL,
		}
	}
}

impl From<String> for ThemeId {
	fn from(name: String) -> Self {
		Self::from_name(&name).unwrap_or_else(|| {
			tracing::warn!(theme = %name, "unknown theme, using midnight");
			ThemeId::default()
		})
	}
}

impl fmt::Display for ThemeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
	/// Top to bottom, spread evenly.
	pub background_stops: &'static [Rgba],
	pub primary: Rgba,
	pub secondary: Rgba,
	pub text: Rgba,
	pub accent: Rgba,
	/// Enables every decoration: grain, lattice, blobs, logo, footer pill, filled note box.
	pub has_pattern: bool,
}

/// Theme for an arbitrary identifier; unknown names resolve to the default.
pub fn resolve_theme(id: &str) -> &'static Theme {
	ThemeId::from_name(id).unwrap_or_default().theme()
}

static MIDNIGHT: Theme = Theme {
	background_stops: &[Rgba::hex(0x020617), Rgba::hex(0x0f172a), Rgba::hex(0x1e293b)],
	primary: Rgba::hex(0x10b981),
	secondary: Rgba::hex(0x94a3b8),
	text: Rgba::WHITE,
	accent: Rgba::hex(0x10b981).with_alpha(0.25),
	has_pattern: true,
};

static EMERALD: Theme = Theme {
	background_stops: &[Rgba::hex(0x064e3b), Rgba::hex(0x065f46), Rgba::hex(0x047857)],
	primary: Rgba::hex(0x34d399),
	secondary: Rgba::hex(0xa7f3d0),
	text: Rgba::WHITE,
	accent: Rgba::hex(0x34d399).with_alpha(0.25),
	has_pattern: true,
};

static SUNSET: Theme = Theme {
	background_stops: &[Rgba::hex(0x4c1d95), Rgba::hex(0x701a75), Rgba::hex(0x831843)],
	primary: Rgba::hex(0xfbbf24),
	secondary: Rgba::hex(0xfde68a),
	text: Rgba::WHITE,
	accent: Rgba::hex(0xfbbf24).with_alpha(0.25),
	has_pattern: true,
};

static OCEAN: Theme = Theme {
	background_stops: &[Rgba::hex(0x1e3a8a), Rgba::hex(0x1d4ed8), Rgba::hex(0x1e40af)],
	primary: Rgba::hex(0x38bdf8),
	secondary: Rgba::hex(0xbae6fd),
	text: Rgba::WHITE,
	accent: Rgba::hex(0x38bdf8).with_alpha(0.25),
	has_pattern: true,
};

static ROSE: Theme = Theme {
	background_stops: &[Rgba::hex(0x881337), Rgba::hex(0x9f1239), Rgba::hex(0x4c0519)],
	primary: Rgba::hex(0xfda4af),
	secondary: Rgba::hex(0xfecdd3),
	text: Rgba::WHITE,
	accent: Rgba::hex(0xfda4af).with_alpha(0.25),
	has_pattern: true,
};

static MINIMAL: Theme = Theme {
	background_stops: &[Rgba::WHITE, Rgba::hex(0xf8fafc), Rgba::hex(0xf1f5f9)],
	primary: Rgba::hex(0x0f172a),
	secondary: Rgba::hex(0x64748b),
	text: Rgba::hex(0x0f172a),
	accent: Rgba::hex(0x0f172a).with_alpha(0.05),
	has_pattern: false,
};

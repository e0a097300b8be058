use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr as _, eyre};
use serde::Deserialize;

use crate::theme::ThemeId;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
	pub fonts: FontConfig,
	pub branding: Branding,
	pub default_theme: ThemeId,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FontConfig {
	pub arabic_family: String,
	pub sans_family: String,
	/// Loaded in addition to the system fonts.
	pub font_dirs: Vec<PathBuf>,
	pub load_timeout_ms: u64,
}

impl Default for FontConfig {
	fn default() -> Self {
		Self {
			arabic_family: "LPMQ Isep Misbah".to_string(),
			sans_family: "Outfit".to_string(),
			font_dirs: Vec::new(),
			load_timeout_ms: 3000,
		}
	}
}

/// Fixed strings printed on every card.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Branding {
	pub title: String,
	pub footer: String,
	pub note_heading: String,
}

impl Default for Branding {
	fn default() -> Self {
		Self {
			title: "Kafein Quran".to_string(),
			footer: "quran.kafein.web.id".to_string(),
			note_heading: "Catatan Saya".to_string(),
		}
	}
}

impl AppConfig {
	/// Explicit `path` is required to exist; otherwise the xdg locations are tried and may be absent.
	/// `AYAH_CARD__SECTION__KEY` environment variables override both.
	pub fn read(path: Option<&Path>) -> Result<Self> {
		let app_name = env!("CARGO_PKG_NAME");
		let mut builder = config::Config::builder();

		match path {
			Some(path) => {
				builder = builder.add_source(config::File::from(path).required(true));
			}
			None => {
				let xdg_dirs = xdg::BaseDirectories::with_prefix(app_name);
				let xdg_conf_dir = xdg_dirs
					.get_config_home()
					.and_then(|home| home.parent().map(Path::to_path_buf))
					.ok_or_else(|| eyre!("Could not determine XDG config home"))?
					.display()
					.to_string();

				let locations = [
					format!("{xdg_conf_dir}/{app_name}"),
					format!("{xdg_conf_dir}/{app_name}/config"), //
				];
				for location in locations.iter() {
					builder = builder.add_source(config::File::with_name(location).required(false));
				}
			}
		}

		let raw = builder
			.add_source(config::Environment::with_prefix("AYAH_CARD").prefix_separator("__").separator("__"))
			.build()
			.wrap_err("Failed to assemble configuration")?;
		raw.try_deserialize().wrap_err("Config file is invalid")
	}
}

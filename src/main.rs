use std::path::PathBuf;

use ayah_card::{AppConfig, ShareImageGenerator, ShareRequest, ThemeId};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr as _, eyre};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ayah_card")]
#[command(about = "Render a shareable card for a Quran verse")]
struct Args {
	/// Path to a JSON share request. Flags below override its fields.
	#[arg(long)]
	request: Option<PathBuf>,
	/// Chapter display name, e.g. "Al-Fatihah".
	#[arg(long)]
	chapter: Option<String>,
	#[arg(long)]
	ayah: Option<u32>,
	#[arg(long)]
	arabic: Option<String>,
	/// Translation text; inline HTML tags are stripped.
	#[arg(long)]
	translation: Option<String>,
	#[arg(long)]
	note: Option<String>,
	/// Put the note on the card.
	#[arg(long)]
	include_note: bool,
	#[arg(long)]
	no_arabic: bool,
	#[arg(long)]
	no_translation: bool,
	#[arg(long, value_enum)]
	theme: Option<ThemeId>,
	/// Output PNG. Defaults to the xdg state dir.
	#[arg(short, long)]
	output: Option<PathBuf>,
	/// Print the image as a `data:` URL.
	#[arg(long)]
	data_url: bool,
	/// Also write a downscaled preview of at most this width next to the output.
	#[arg(long)]
	preview_width: Option<u32>,
	#[arg(long)]
	config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();
	let args = Args::parse();

	let config = AppConfig::read(args.config.as_deref())?;
	let request = build_request(&args, &config)?;
	println!("Rendering {} ({} theme)", request.reference(), request.theme);

	let generator = ShareImageGenerator::new(config);
	let image = generator.generate_image(&request).await?;

	let output_path = match &args.output {
		Some(path) => path.clone(),
		None => default_output(&request)?,
	};
	image.save(&output_path)?;
	println!("Card written to {} ({}x{})", output_path.display(), image.width, image.height);

	if let Some(width) = args.preview_width {
		let preview_path = output_path.with_extension("preview.png");
		image.preview(width)?.save(&preview_path)?;
		println!("Preview written to {}", preview_path.display());
	}
	if args.data_url {
		println!("{}", image.to_data_url());
	}
	Ok(())
}

fn build_request(args: &Args, config: &AppConfig) -> Result<ShareRequest> {
	let mut request = match &args.request {
		Some(path) => {
			let raw = std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
			serde_json::from_str(&raw).wrap_err("Share request is not valid JSON")?
		}
		None => ShareRequest {
			show_arabic: true,
			show_translation: true,
			theme: config.default_theme,
			..ShareRequest::default()
		},
	};

	if let Some(chapter) = &args.chapter {
		request.chapter_name = chapter.clone();
	}
	if let Some(ayah) = args.ayah {
		request.ayah_number = ayah;
	}
	if let Some(arabic) = &args.arabic {
		request.arabic_text = Some(arabic.clone());
	}
	if let Some(translation) = &args.translation {
		request.translation_text = Some(translation.clone());
	}
	if let Some(note) = &args.note {
		request.note = Some(note.clone());
	}
	request.include_note |= args.include_note;
	request.show_arabic &= !args.no_arabic;
	request.show_translation &= !args.no_translation;
	if let Some(theme) = args.theme {
		request.theme = theme;
	}

	if request.chapter_name.is_empty() || request.ayah_number == 0 {
		return Err(eyre!("A chapter name and a positive ayah number are required (--chapter, --ayah or --request)"));
	}
	Ok(request)
}

fn default_output(request: &ShareRequest) -> Result<PathBuf> {
	let xdg_dirs = xdg::BaseDirectories::with_prefix(env!("CARGO_PKG_NAME"));
	let slug: String = request.chapter_name.chars().map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' }).collect();
	xdg_dirs
		.place_state_file(format!("ayah-{slug}-{}.png", request.ayah_number))
		.wrap_err("Could not prepare xdg state directory")
}

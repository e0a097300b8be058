use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr as _};
use rand::Rng;
use tokio::sync::{OnceCell, watch};
use tracing::{info, instrument};

use crate::{
	background::paint_background_with,
	canvas::Canvas,
	config::AppConfig,
	export::{RenderedImage, export},
	fonts::FontSet,
	layout,
	request::ShareRequest,
};

/// Renders one request synchronously: plan, allocate, paint, draw, export.
pub fn render(request: &ShareRequest, fonts: &FontSet, config: &AppConfig) -> Result<RenderedImage> {
	render_with(request, fonts, config, &mut rand::rng())
}

/// [`render`] with the background grain drawn from `rng`.
#[instrument(skip_all, fields(chapter = %request.chapter_name, ayah = request.ayah_number, theme = %request.theme))]
pub fn render_with<R: Rng>(request: &ShareRequest, fonts: &FontSet, config: &AppConfig, rng: &mut R) -> Result<RenderedImage> {
	let plan = layout::plan(request, fonts);
	let mut canvas = Canvas::new(plan.width, plan.height)?;
	paint_background_with(canvas.pixmap_mut(), request.theme.theme(), rng)?;
	layout::draw(&plan, request, fonts, &config.branding, &mut canvas)?;
	export(canvas, fonts.database())
}

/// Long-lived entry point for a UI: waits for fonts once, then renders on the blocking pool.
pub struct ShareImageGenerator {
	config: Arc<AppConfig>,
	fonts: OnceCell<FontSet>,
	/// Renders in flight.
	busy: watch::Sender<usize>,
}

impl ShareImageGenerator {
	pub fn new(config: AppConfig) -> Self {
		Self {
			config: Arc::new(config),
			fonts: OnceCell::new(),
			busy: watch::Sender::new(0),
		}
	}

	/// Skips font loading; every render uses `fonts`.
	pub fn with_fonts(config: AppConfig, fonts: FontSet) -> Self {
		Self {
			fonts: OnceCell::new_with(Some(fonts)),
			..Self::new(config)
		}
	}

	pub fn is_generating(&self) -> bool {
		*self.busy.borrow() > 0
	}

	/// Number of renders in flight; non-zero means busy.
	pub fn subscribe(&self) -> watch::Receiver<usize> {
		self.busy.subscribe()
	}

	pub async fn fonts(&self) -> &FontSet {
		self.fonts.get_or_init(|| FontSet::load(&self.config.fonts)).await
	}

	/// Waits for fonts (bounded by `fonts.load_timeout_ms`), then renders `request`.
	///
	/// Renders may overlap; the generator stays busy until the last one settles. Dropping the
	/// returned future counts as settled, and the blocking render, if already started, finishes on
	/// its own with its result discarded.
	pub async fn generate_image(&self, request: &ShareRequest) -> Result<RenderedImage> {
		let _busy = BusyGuard::engage(&self.busy);
		let fonts = self.fonts().await.clone();
		let config = Arc::clone(&self.config);
		let request = request.clone();

		let image = tokio::task::spawn_blocking(move || render(&request, &fonts, &config)).await.wrap_err("Render task panicked")??;
		info!(width = image.width, height = image.height, "share image ready");
		Ok(image)
	}
}

struct BusyGuard<'a>(&'a watch::Sender<usize>);

impl<'a> BusyGuard<'a> {
	fn engage(busy: &'a watch::Sender<usize>) -> Self {
		busy.send_modify(|n| *n += 1);
		Self(busy)
	}
}

impl Drop for BusyGuard<'_> {
	fn drop(&mut self) {
		self.0.send_modify(|n| *n = n.saturating_sub(1));
	}
}

#[cfg(test)]
mod tests {
	use rand::{SeedableRng, rngs::StdRng};

	use super::*;
	use crate::theme::ThemeId;

	fn request() -> ShareRequest {
		ShareRequest {
			chapter_name: "Al-Ikhlas".into(),
			ayah_number: 1,
			arabic_text: Some("قل هو الله أحد".into()),
			translation_text: Some("Say, He is Allah, the One".into()),
			note: Some("Equal to a third of the Quran".into()),
			include_note: true,
			show_arabic: true,
			show_translation: true,
			theme: ThemeId::Emerald,
		}
	}

	#[test]
	fn seeded_renders_are_reproducible() {
		let fonts = FontSet::bundled();
		let config = AppConfig::default();
		let a = render_with(&request(), &fonts, &config, &mut StdRng::seed_from_u64(3)).unwrap();
		let b = render_with(&request(), &fonts, &config, &mut StdRng::seed_from_u64(3)).unwrap();
		assert_eq!(a, b);
	}

	#[tokio::test]
	async fn busy_flag_tracks_generation() {
		let generator = ShareImageGenerator::with_fonts(AppConfig::default(), FontSet::bundled());
		let mut status = generator.subscribe();
		assert!(!generator.is_generating());

		let image = generator.generate_image(&request()).await.unwrap();
		assert_eq!(image.width, 1080);
		assert!(!generator.is_generating());
		// the flag was raised at some point
		assert!(status.has_changed().unwrap());
		assert_eq!(*status.borrow_and_update(), 0);
	}

	#[tokio::test]
	async fn dropped_generation_clears_busy() {
		let generator = ShareImageGenerator::with_fonts(AppConfig::default(), FontSet::bundled());
		{
			let req = request();
			let fut = generator.generate_image(&req);
			tokio::pin!(fut);
			// poll once so the guard is engaged, then abandon
			let _ = poll_once(fut.as_mut()).await;
		}
		assert!(!generator.is_generating());
	}

	#[tokio::test]
	async fn stays_busy_until_the_last_concurrent_render_settles() {
		let generator = ShareImageGenerator::with_fonts(AppConfig::default(), FontSet::bundled());
		let req = request();
		let mut first = Box::pin(generator.generate_image(&req));
		let mut second = Box::pin(generator.generate_image(&req));
		assert!(poll_once(first.as_mut()).await.is_none());
		assert!(poll_once(second.as_mut()).await.is_none());
		assert_eq!(*generator.subscribe().borrow(), 2);

		drop(first);
		assert!(generator.is_generating(), "second render still in flight");
		assert_eq!(*generator.subscribe().borrow(), 1);

		let image = second.await.unwrap();
		assert_eq!(image.width, 1080);
		assert!(!generator.is_generating());
	}

	async fn poll_once<F: std::future::Future + Unpin>(fut: F) -> Option<F::Output> {
		tokio::select! {
			biased;
			out = fut => Some(out),
			_ = std::future::ready(()) => None,
		}
	}
}

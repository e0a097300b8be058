//! Shareable Quran verse cards.
//!
//! A [`ShareRequest`] (chapter, ayah, Arabic text, translation, optional note, theme) goes in, a
//! 1080px wide PNG comes out, at least 1920px tall and taller when the content needs it.
//! The layout is measured first and drawn second, see [`layout`].

pub mod background;
pub mod canvas;
pub mod config;
pub mod export;
pub mod fonts;
pub mod generator;
pub mod layout;
pub mod request;
pub mod theme;
pub mod wrap;

pub use config::AppConfig;
pub use export::RenderedImage;
pub use fonts::FontSet;
pub use generator::{ShareImageGenerator, render};
pub use request::ShareRequest;
pub use theme::{Theme, ThemeId, resolve_theme};

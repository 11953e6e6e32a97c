//! # Briefcast Common Library
//!
//! Shared code for Briefcast modules including:
//! - Topic model and feed record types
//! - Event types (BriefcastEvent enum) and EventBus
//! - Configuration file resolution
//! - Fade curve definitions and calculations

pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;
pub mod types;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
pub use types::{Topic, TopicReadyState};

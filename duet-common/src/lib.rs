//! # Duet Common Library
//!
//! Shared code for the duet workspace:
//! - Error and result types
//! - Configuration file discovery and TOML loading
//! - Fade curve definitions and calculations
//! - Millisecond/frame and decibel conversions

pub mod config;
pub mod error;
pub mod fade_curves;
pub mod timing;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;

//! Small interactive map preview with a degrading initialization ladder.
//!
//! The map engine itself lives outside this crate; it is reached through the
//! [`MapEngine`] and [`MapHandle`] seams so the ladder can be exercised
//! without a browser.

pub mod config;
pub mod engine;
pub mod icons;
pub mod ladder;
pub mod style;

pub use config::*;
pub use engine::*;
pub use icons::*;
pub use ladder::*;
pub use style::*;

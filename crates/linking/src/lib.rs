//! Link resolution: query string to typed intent, intent to app URLs, and the
//! best-effort sequence that tries to hand the URL to the native app.

pub mod config;
pub mod deep_link;
pub mod entity;
pub mod intent;
pub mod platform;
pub mod trigger;

pub use config::*;
pub use deep_link::*;
pub use entity::*;
pub use intent::*;
pub use platform::*;
pub use trigger::*;

//! The web preview shown while (and after) the native app is tried.

pub mod config;
pub mod content;
pub mod event_time;
pub mod image;
pub mod landing;
pub mod page_meta;
pub mod state;
pub mod surface;

pub use config::*;
pub use content::*;
pub use event_time::*;
pub use image::*;
pub use landing::*;
pub use page_meta::*;
pub use state::*;
pub use surface::*;

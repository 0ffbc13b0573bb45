//! Types used by all components of the renderer.

pub mod image;
pub mod logging;

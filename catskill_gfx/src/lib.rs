//! Software renderer for an NES-style tile and sprite display.
//!
//! Game code authors tiles, sprites and scroll positions through [`Ppu`], and renders frames into
//! a caller owned [`Playfield`] of 240x240 RGB pixels. Button input is handled by [`Controller`].
pub mod common;
pub mod components;
pub mod controller;

pub use crate::components::ppu::Flip;
pub use crate::components::ppu::Playfield;
pub use crate::components::ppu::Ppu;
pub use crate::controller::Button;
pub use crate::controller::Controller;

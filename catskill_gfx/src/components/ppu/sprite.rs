//! Implementation of the sprite layer.
//!
//! Sprites are not stored as objects. Drawing a sprite composites its pixels directly into a
//! full-view overlay buffer, which the renderer consumes (and clears) while drawing the next
//! frame. Unwritten pixels hold the transparency sentinel.
use anyhow::ensure;
use anyhow::Result;
use bitcode::Decode;
use bitcode::Encode;

use super::palette::Palette;
use super::pattern::PatternTable;
use super::VIEW_HEIGHT;
use super::VIEW_WIDTH;
use crate::common::image::Rgb565;

/// Marks a sprite layer pixel as empty. No palette color should use this value.
pub const SPRITE_TRANSPARENT: Rgb565 = Rgb565(0x0001);

/// Bounds of the area sprites may be drawn into.
///
/// Bounds are exclusive: a pixel is drawn only if `left < x < right` and `top < y < bottom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct SpriteWindow {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl SpriteWindow {
    /// Creates a window from inclusive pixel bounds, clamped to the view.
    pub fn from_inclusive(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        let max_x = VIEW_WIDTH as i32 - 1;
        let max_y = VIEW_HEIGHT as i32 - 1;
        Self {
            left: left.clamp(0, max_x) - 1,
            right: right.clamp(0, max_x) + 1,
            top: top.clamp(0, max_y) - 1,
            bottom: bottom.clamp(0, max_y) + 1,
        }
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x > self.left && x < self.right && y > self.top && y < self.bottom
    }
}

impl Default for SpriteWindow {
    fn default() -> Self {
        Self::from_inclusive(0, 0, VIEW_WIDTH as i32 - 1, VIEW_HEIGHT as i32 - 1)
    }
}

/// Orientation of a sprite tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flip {
    pub h: bool,
    pub v: bool,
}

impl Flip {
    pub fn new(h: bool, v: bool) -> Self {
        Self { h, v }
    }
}

#[derive(Clone, Encode, Decode)]
pub struct SpriteLayer {
    pixels: Vec<Rgb565>,
    pub window: SpriteWindow,
}

impl SpriteLayer {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            pixels: vec![SPRITE_TRANSPARENT; VIEW_WIDTH * VIEW_HEIGHT],
            window: SpriteWindow::default(),
        }
    }

    /// Checks that the layer covers the view and its window does not reach outside of it.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.pixels.len() == VIEW_WIDTH * VIEW_HEIGHT,
            "Sprite layer has {} pixels",
            self.pixels.len()
        );
        let window = self.window;
        ensure!(
            window.left >= -1
                && window.top >= -1
                && window.right <= VIEW_WIDTH as i32
                && window.bottom <= VIEW_HEIGHT as i32,
            "Sprite window {:?} is outside of the view",
            window
        );
        Ok(())
    }

    /// Resets every pixel to the transparency sentinel.
    pub fn clear(&mut self) {
        self.pixels.fill(SPRITE_TRANSPARENT);
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgb565 {
        self.pixels[y * VIEW_WIDTH + x]
    }

    /// Returns row `y` of the layer for the renderer to consume.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [Rgb565] {
        let start = (y % VIEW_HEIGHT) * VIEW_WIDTH;
        &mut self.pixels[start..start + VIEW_WIDTH]
    }

    /// Draws pattern table tile `tile` with its top left corner at (x, y).
    ///
    /// A pixel is written only if it is inside the window, has a non-zero color index and no
    /// earlier sprite has been drawn at that position this frame.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_tile(
        &mut self,
        patterns: &PatternTable,
        palette: &Palette,
        x: i32,
        y: i32,
        tile: usize,
        palette_group: usize,
        flip: Flip,
    ) {
        for row_offset in 0..8 {
            let tile_row = if flip.v { 7 - row_offset } else { row_offset };
            let mut data = patterns.row(tile, tile_row);
            let pixel_y = y + row_offset as i32;
            for col_offset in 0..8 {
                // Horizontal flip reads the row from its right end.
                let color_idx = if flip.h {
                    let bits = data & 0x03;
                    data >>= 2;
                    bits
                } else {
                    let bits = data >> 14;
                    data <<= 2;
                    bits
                };
                let pixel_x = x + col_offset;
                if color_idx == 0 || !self.window.contains(pixel_x, pixel_y) {
                    continue;
                }
                let target = &mut self.pixels[pixel_y as usize * VIEW_WIDTH + pixel_x as usize];
                if *target == SPRITE_TRANSPARENT {
                    *target = palette.color(palette_group, color_idx as usize);
                }
            }
        }
    }
}

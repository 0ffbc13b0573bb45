//! Scanline compositor.
//!
//! The screen is rendered in 15 display rows of 16 physical scanlines each (8 tile pixel rows,
//! every one of them sent twice). Every logical pixel is emitted twice horizontally, which turns
//! the 120x120 view into the 240x240 output.
use super::nametable::NameTable;
use super::nametable::NAMETABLE_SIZE;
use super::pattern::PatternTable;
use super::sprite::SPRITE_TRANSPARENT;
use super::PpuState;
use super::DISPLAY_ROWS;
use super::SCREEN_HEIGHT;
use super::SCREEN_WIDTH;
use super::VIEW_WIDTH;
use crate::common::image::Image;
use crate::common::image::Rgb24;
use crate::common::image::Rgb565;

/// Physical scanlines rendered per display row.
pub const SCANLINES_PER_ROW: usize = 16;
/// Words in one line buffer, one display row of output pixels.
pub const LINE_BUFFER_WORDS: usize = SCREEN_WIDTH * SCANLINES_PER_ROW;

/// Position of the renderer within the frame being drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCursor {
    /// Display row rendered next (0..15).
    pub row: usize,
    pub coarse_y: u8,
    pub fine_y: u8,
    fine_y_sub: u8,
    /// Set once the global vertical scroll has been loaded for the first non-jumped row.
    scroll_restored: bool,
}

impl FrameCursor {
    pub fn new(coarse_y: u8, fine_y: u8) -> Self {
        Self {
            row: 0,
            coarse_y,
            fine_y,
            fine_y_sub: 0,
            scroll_restored: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
pub enum RenderState {
    #[default]
    Idle,
    Rendering(FrameCursor),
}

/// Two row buffers used round-robin: one is filled while the other is presented.
pub struct LineBuffers {
    buffers: [Vec<Rgb565>; 2],
    current: usize,
}

impl LineBuffers {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            buffers: [
                vec![Rgb565::default(); LINE_BUFFER_WORDS],
                vec![Rgb565::default(); LINE_BUFFER_WORDS],
            ],
            current: 0,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn get(&self, index: usize) -> &[Rgb565] {
        &self.buffers[index % 2]
    }

    pub fn current_mut(&mut self) -> &mut [Rgb565] {
        &mut self.buffers[self.current]
    }

    pub fn swap(&mut self) {
        self.current ^= 1;
    }
}

/// 240x240 RGB output frame, 3 bytes per pixel, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Playfield(Vec<u8>);

impl Playfield {
    pub const SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT * 3;

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(vec![0; Self::SIZE])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb24 {
        let offset = (y * SCREEN_WIDTH + x) * 3;
        Rgb24([self.0[offset], self.0[offset + 1], self.0[offset + 2]])
    }

    /// Converts a line buffer into RGB and stores it starting at scanline `first_scanline`.
    pub fn write_lines(&mut self, first_scanline: usize, line: &[Rgb565]) {
        let start = first_scanline * SCREEN_WIDTH * 3;
        let pixels = self.0[start..].chunks_exact_mut(3);
        for (target, color) in pixels.zip(line.iter()) {
            target.copy_from_slice(&Rgb24::from(*color).0);
        }
    }

    pub fn to_rgb<ImageT: Image>(&self) -> ImageT {
        let mut image = ImageT::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                image.set_pixel((x as u32, y as u32), self.pixel(x, y));
            }
        }
        image
    }
}

/// Fetches the pattern row and palette group of the name table cell at (`tile_x`, `coarse_y`).
#[inline]
fn fetch_tile(
    nametable: &NameTable,
    patterns: &PatternTable,
    tile_x: usize,
    coarse_y: usize,
    fine_y: usize,
) -> (u16, usize) {
    let entry = nametable.entry(tile_x, coarse_y);
    (
        patterns.row(entry.pattern() as usize, fine_y),
        entry.palette_group(),
    )
}

impl PpuState {
    /// Renders display row `cursor.row` into `line` and advances the vertical scroll of `cursor`.
    ///
    /// Sprite pixels take priority over the background wherever the sprite layer is not
    /// transparent. The sprite layer rows covered by this display row are cleared as they are
    /// consumed.
    pub(super) fn render_row(&mut self, cursor: &mut FrameCursor, line: &mut [Rgb565]) {
        debug_assert!(cursor.row < DISPLAY_ROWS);
        match self.scroll.row_jump(cursor.row) {
            Some(target_row) => {
                cursor.coarse_y = target_row;
                cursor.fine_y = 0;
            }
            None => {
                if !cursor.scroll_restored {
                    cursor.scroll_restored = true;
                    cursor.coarse_y = self.scroll.coarse_y;
                    cursor.fine_y = self.scroll.fine_y;
                }
            }
        }

        for (scanline, output) in line
            .chunks_exact_mut(SCREEN_WIDTH)
            .take(SCANLINES_PER_ROW)
            .enumerate()
        {
            let coarse_y = cursor.coarse_y as usize % NAMETABLE_SIZE;
            let fine_y = cursor.fine_y as usize;
            let mut fine_x = self.scroll.fine_x[coarse_y];
            let mut tile_x = self.scroll.coarse_x[coarse_y] as usize;
            let (mut pattern_row, mut palette_group) =
                fetch_tile(&self.nametable, &self.patterns, tile_x, coarse_y, fine_y);
            pattern_row <<= fine_x * 2;

            // Each sprite row is shown on two scanlines and cleared on the second.
            let consume_sprites = scanline % 2 == 1;
            let sprite_row = self
                .sprites
                .row_mut(cursor.row * 8 + scanline / 2);

            for (x, sprite_pixel) in sprite_row.iter_mut().enumerate().take(VIEW_WIDTH) {
                let color = if *sprite_pixel == SPRITE_TRANSPARENT {
                    self.palette
                        .color(palette_group, (pattern_row >> 14) as usize)
                } else {
                    *sprite_pixel
                };
                output[x * 2] = color;
                output[x * 2 + 1] = color;
                if consume_sprites {
                    *sprite_pixel = SPRITE_TRANSPARENT;
                }
                pattern_row <<= 2;

                fine_x += 1;
                if fine_x == 8 {
                    fine_x = 0;
                    tile_x = (tile_x + 1) % NAMETABLE_SIZE;
                    (pattern_row, palette_group) =
                        fetch_tile(&self.nametable, &self.patterns, tile_x, coarse_y, fine_y);
                }
            }

            cursor.fine_y_sub += 1;
            if cursor.fine_y_sub > 1 {
                cursor.fine_y_sub = 0;
                cursor.fine_y += 1;
                if cursor.fine_y == 8 {
                    cursor.fine_y = 0;
                    cursor.coarse_y = self.scroll.next_coarse_y(cursor.coarse_y);
                }
            }
        }
    }
}

//! Text and number rendering into the name table and sprite layer.
//!
//! Printable ASCII is expected to be stored in the pattern table as a contiguous run of glyphs
//! starting with the space character at `ascii_base`.
use anyhow::ensure;
use anyhow::Result;
use bitcode::Decode;
use bitcode::Encode;

use super::nametable::TileEntry;
use super::nametable::NAMETABLE_SIZE;
use super::sprite::Flip;
use super::Ppu;
use super::VIEW_TILES;

/// Largest value the decimal functions can display (9 digits).
pub const MAX_DECIMAL: u32 = 999_999_999;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct TextSettings {
    pub ascii_base: u16,
    pub left_margin: u8,
    pub right_margin: u8,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            ascii_base: 32,
            left_margin: 0,
            right_margin: (VIEW_TILES - 1) as u8,
        }
    }
}

impl TextSettings {
    /// Returns the pattern table index of the glyph for `character`.
    #[inline]
    pub fn glyph(&self, character: u8) -> u16 {
        self.ascii_base
            .wrapping_add(character as u16)
            .wrapping_sub(b' ' as u16)
    }
}

/// Formats `value` as zero-suppressed decimal digits (at least one digit).
///
/// Values above `MAX_DECIMAL` are clamped to it. Negative values are rejected.
pub fn decimal_digits(value: i32) -> Result<Vec<u8>> {
    ensure!(value >= 0, "Cannot display negative value {}", value);
    Ok((value as u32).min(MAX_DECIMAL).to_string().into_bytes())
}

impl Ppu {
    /// Sets the pattern table index of the space glyph. Default is 32.
    pub fn set_ascii_base(&mut self, base: u16) {
        self.state.text.ascii_base = base;
    }

    /// Sets the name table columns between which word wrapped text is laid out (inclusive).
    pub fn set_text_margins(&mut self, left: u8, right: u8) {
        let limit = NAMETABLE_SIZE as u8 - 1;
        self.state.text.left_margin = left.min(limit);
        self.state.text.right_margin = right.min(limit);
    }

    /// Draws `text` into the name table starting at column `x` of row `y`.
    ///
    /// Without wrapping, characters are written left to right until the end of the name table
    /// row, keeping the palette and attributes of the cells they overwrite.
    ///
    /// With wrapping, text is laid out between the text margins. Words that do not fit on the
    /// current line move to the next line, words that hit the right margin are hyphenated and
    /// lines past the vertical rollover row continue at the reset row.
    pub fn draw_text(&mut self, text: &str, x: usize, y: usize, wrap: bool) {
        if wrap {
            self.draw_wrapped_text(text.as_bytes(), x, y);
        } else {
            self.draw_unwrapped_text(text.as_bytes(), x, y);
        }
    }

    fn draw_unwrapped_text(&mut self, text: &[u8], x: usize, y: usize) {
        for (column, character) in (x..NAMETABLE_SIZE).zip(text.iter()) {
            let glyph = self.state.text.glyph(*character) as u8;
            self.state.nametable.set_pattern(column, y, glyph);
        }
    }

    fn draw_wrapped_text(&mut self, text: &[u8], x: usize, y: usize) {
        let left = self.state.text.left_margin as usize;
        let right = self.state.text.right_margin as usize;
        let settings = self.state.text;
        let y_reset = self.state.scroll.y_reset as usize;
        let y_rollover = self.state.scroll.y_rollover as usize;
        let mut put = |x: usize, y: usize, character: u8| {
            let glyph = settings.glyph(character) as u8;
            self.state
                .nametable
                .set_entry(x, y, TileEntry::with_tile(glyph, 0, 0));
        };

        let mut x = x;
        let mut y = y % NAMETABLE_SIZE;
        let mut idx = 0;
        while idx < text.len() {
            let character = text[idx];
            let mut carriage_return = false;
            if character == b' ' {
                if x == left {
                    // Spaces are not drawn at the start of a line.
                    idx += 1;
                    continue;
                }
                put(x, y, b' ');
                idx += 1;
                if x >= right {
                    carriage_return = true;
                } else {
                    x += 1;
                    let word_len = text[idx..].iter().take_while(|c| **c != b' ').count();
                    if word_len > right + 1 - x {
                        carriage_return = true;
                    }
                }
            } else if x >= right {
                let next = text.get(idx + 1);
                if next.is_none() || next == Some(&b' ') || x == left {
                    put(x, y, character);
                    idx += 1;
                } else {
                    // The rest of the word continues on the next line.
                    put(x, y, b'-');
                }
                carriage_return = true;
            } else {
                put(x, y, character);
                x += 1;
                idx += 1;
            }

            if carriage_return {
                x = left;
                y += 1;
                if y > y_rollover {
                    y = y_reset;
                }
            }
        }
    }

    /// Draws `text` as a line of sprite tiles, 8 pixels apart.
    pub fn draw_sprite_text(&mut self, text: &str, x: i32, y: i32, palette: u8) {
        for (idx, character) in text.bytes().enumerate() {
            let glyph = self.state.text.glyph(character);
            self.draw_sprite_tile(x + idx as i32 * 8, y, glyph, palette, Flip::default());
        }
    }

    /// Draws `value` into the name table, left aligned at (`x`, `y`).
    pub fn draw_decimal_xy(&mut self, value: i32, x: usize, y: usize) -> Result<()> {
        let digits = decimal_digits(value)?;
        self.draw_unwrapped_text(&digits, x, y);
        Ok(())
    }

    /// Draws `value` into name table row `y`, centered on the visible screen width.
    pub fn draw_decimal(&mut self, value: i32, y: usize) -> Result<()> {
        let digits = decimal_digits(value)?;
        let x = (VIEW_TILES - (digits.len() - 1)) / 2;
        self.draw_unwrapped_text(&digits, x, y);
        Ok(())
    }

    /// Draws `value` as sprite tiles, left aligned at pixel position (`x`, `y`).
    pub fn draw_sprite_decimal(&mut self, value: i32, x: i32, y: i32, palette: u8) -> Result<()> {
        let digits = decimal_digits(value)?;
        for (idx, digit) in digits.iter().enumerate() {
            let glyph = self.state.text.glyph(*digit);
            self.draw_sprite_tile(x + idx as i32 * 8, y, glyph, palette, Flip::default());
        }
        Ok(())
    }

    /// Draws `value` as sprite tiles with the last digit at pixel position (`x_right`, `y`).
    pub fn draw_sprite_decimal_right(
        &mut self,
        value: i32,
        x_right: i32,
        y: i32,
        palette: u8,
    ) -> Result<()> {
        let digits = decimal_digits(value)?;
        for (idx, digit) in digits.iter().rev().enumerate() {
            let glyph = self.state.text.glyph(*digit);
            self.draw_sprite_tile(x_right - idx as i32 * 8, y, glyph, palette, Flip::default());
        }
        Ok(())
    }
}

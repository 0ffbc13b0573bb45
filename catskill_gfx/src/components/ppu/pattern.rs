//! Implementation of the pattern table containing tile bitmaps.
//!
//! Tiles are authored in the NES planar format: each 8x8 tile is stored as 8 bytes of the low
//! bit plane followed by 8 bytes of the high bit plane. The two color bits of a pixel live at the
//! same bit position of the two plane bytes.
//!
//! The pattern table stores tiles in a chunky format instead. Each tile row is one word with two
//! adjacent bits per pixel, leftmost pixel in the top bits:
//!
//! 15  bit  8   7  bit  0
//!  ---- ----   ---- ----
//!  0011 2233   4455 6677
//!
//! This allows the renderer to shift a row left by two bits per pixel and read the color index
//! from the top two bits.
use anyhow::ensure;
use anyhow::Result;
use bitcode::Decode;
use bitcode::Encode;
use intbits::Bits;

/// Number of words in the pattern table. 1024 tiles of 8 rows each.
pub const PATTERN_TABLE_WORDS: usize = 8192;
/// Number of tiles that fit into the pattern table.
pub const PATTERN_TABLE_TILES: usize = PATTERN_TABLE_WORDS / 8;
/// Size of one tile record in a pattern file (two 8 byte bit planes).
pub const TILE_RECORD_SIZE: usize = 16;

/// Combines a low and high bit plane byte into a chunky pattern row.
pub fn convert_bitplane_row(low: u8, high: u8) -> u16 {
    let mut row = 0_u16;
    for bit in (0..8_u32).rev() {
        let pixel = ((high.bit(bit) as u16) << 1) | low.bit(bit) as u16;
        row = (row << 2) | pixel;
    }
    row
}

/// Splits a chunky pattern row back into its low and high bit plane bytes.
pub fn split_pattern_row(row: u16) -> (u8, u8) {
    let mut low = 0_u8;
    let mut high = 0_u8;
    for pixel_idx in 0..8 {
        let pixel = pattern_pixel(row, pixel_idx);
        let plane_bit = 7 - pixel_idx as u32;
        low.set_bit(plane_bit, pixel.bit(0));
        high.set_bit(plane_bit, pixel.bit(1));
    }
    (low, high)
}

/// Returns the 2 bit color index of pixel `pixel_idx` (0 = leftmost) of a pattern row.
pub fn pattern_pixel(row: u16, pixel_idx: usize) -> u8 {
    let shift = 14 - pixel_idx * 2;
    ((row >> shift) & 0x03) as u8
}

#[derive(Clone, Encode, Decode)]
pub struct PatternTable {
    memory: Vec<u16>,
}

impl PatternTable {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            memory: vec![0; PATTERN_TABLE_WORDS],
        }
    }

    /// Returns row `row` (0..8) of tile `tile`. Tiles beyond the table wrap around.
    #[inline]
    pub fn row(&self, tile: usize, row: usize) -> u16 {
        self.memory[(tile * 8 + row) % PATTERN_TABLE_WORDS]
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.memory.len() == PATTERN_TABLE_WORDS,
            "Pattern table has {} words, expected {}",
            self.memory.len(),
            PATTERN_TABLE_WORDS
        );
        Ok(())
    }

    pub fn set_row(&mut self, tile: usize, row: usize, value: u16) {
        self.memory[(tile * 8 + row) % PATTERN_TABLE_WORDS] = value;
    }

    /// Converts a planar tile into chunky rows and stores it at `tile`.
    pub fn convert_bitplane_tile(&mut self, tile: usize, low: &[u8; 8], high: &[u8; 8]) {
        for (row, (low, high)) in low.iter().zip(high.iter()).enumerate() {
            self.set_row(tile, row, convert_bitplane_row(*low, *high));
        }
    }

    /// Re-derives the bit plane bytes of a stored tile row.
    pub fn bitplanes(&self, tile: usize, row: usize) -> (u8, u8) {
        split_pattern_row(self.row(tile, row))
    }

    /// Loads `length` tile records from `data` into tiles `start..start + length`.
    ///
    /// If `data` is too short, all complete records are converted and the remaining tiles are left
    /// untouched. Returns the number of tiles converted.
    pub fn load_pattern_data(&mut self, data: &[u8], start: usize, length: usize) -> usize {
        let mut converted = 0;
        for (tile, record) in (start..start + length).zip(data.chunks_exact(TILE_RECORD_SIZE)) {
            let low: [u8; 8] = std::array::from_fn(|row| record[row]);
            let high: [u8; 8] = std::array::from_fn(|row| record[8 + row]);
            self.convert_bitplane_tile(tile, &low, &high);
            converted += 1;
        }
        if converted < length {
            log::warn!(
                "Pattern data ends after {} of {} tiles (tiles {}..{} unchanged)",
                converted,
                length,
                start + converted,
                start + length
            );
        }
        converted
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_convert_bitplane_row() {
        assert_eq!(convert_bitplane_row(0x00, 0x00), 0x0000);
        assert_eq!(convert_bitplane_row(0xFF, 0x00), 0x5555);
        assert_eq!(convert_bitplane_row(0x00, 0xFF), 0xAAAA);
        assert_eq!(convert_bitplane_row(0xFF, 0xFF), 0xFFFF);
        // MSB of each plane becomes the leftmost pixel in the top bits.
        assert_eq!(convert_bitplane_row(0x80, 0x00), 0b01_00_00_00_00_00_00_00);
        assert_eq!(convert_bitplane_row(0x00, 0x80), 0b10_00_00_00_00_00_00_00);
        assert_eq!(convert_bitplane_row(0x01, 0x01), 0b00_00_00_00_00_00_00_11);
    }

    #[test]
    fn test_pixels_match_planes() {
        for (low, high) in [(0x5A_u8, 0xC3_u8), (0x0F, 0xF0), (0x81, 0x7E), (0x12, 0x34)] {
            let row = convert_bitplane_row(low, high);
            for pixel_idx in 0..8 {
                let plane_bit = 7 - pixel_idx as u32;
                let expected = ((high.bit(plane_bit) as u8) << 1) | low.bit(plane_bit) as u8;
                assert_eq!(pattern_pixel(row, pixel_idx), expected);
            }
        }
    }

    #[test]
    fn test_split_inverts_conversion() {
        for low in (0..=255_u8).step_by(7) {
            for high in (0..=255_u8).step_by(11) {
                assert_eq!(split_pattern_row(convert_bitplane_row(low, high)), (low, high));
            }
        }
    }

    #[test]
    fn test_load_pattern_data() {
        let mut data = vec![0_u8; TILE_RECORD_SIZE * 2];
        // Tile 0: top row low plane only, bottom row high plane only.
        data[0] = 0xFF;
        data[8 + 7] = 0xFF;
        // Tile 1: diagonal in both planes (color 3).
        for row in 0..8 {
            data[16 + row] = 0x80 >> row;
            data[24 + row] = 0x80 >> row;
        }

        let mut patterns = PatternTable::new();
        assert_eq!(patterns.load_pattern_data(&data, 4, 2), 2);
        assert_eq!(patterns.row(4, 0), 0x5555);
        assert_eq!(patterns.row(4, 7), 0xAAAA);
        assert_eq!(patterns.row(4, 3), 0x0000);
        for row in 0..8 {
            assert_eq!(patterns.row(5, row), 0xC000 >> (row * 2));
            assert_eq!(patterns.bitplanes(5, row), (0x80 >> row, 0x80 >> row));
        }
        assert_eq!(patterns.row(3, 0), 0);
        assert_eq!(patterns.row(6, 0), 0);
    }

    #[test]
    fn test_load_short_pattern_data() {
        let mut patterns = PatternTable::new();
        patterns.set_row(2, 0, 0x1234);
        // One full record and half of a second one.
        let data = [0xFF_u8; TILE_RECORD_SIZE + 8];
        assert_eq!(patterns.load_pattern_data(&data, 1, 3), 1);
        assert_eq!(patterns.row(1, 0), 0xFFFF);
        assert_eq!(patterns.row(2, 0), 0x1234);
    }
}

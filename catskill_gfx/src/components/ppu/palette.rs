//! Implementation of the master color table and the working palette.
//!
//! The master table holds 64 colors converted once from a 24-bit RGB file. The working palette
//! holds 8 groups of 4 colors (plus 32 spare slots) that are copies of master colors selected by
//! an index file. Palette effects only rewrite working slots.
use anyhow::ensure;
use anyhow::Result;
use bitcode::Decode;
use bitcode::Encode;

use crate::common::image::Rgb565;

/// Number of entries in both the master table and the working palette.
pub const PALETTE_SIZE: usize = 64;
/// Number of colors in one palette group.
pub const COLORS_PER_PALETTE: usize = 4;

#[derive(Clone, Encode, Decode)]
pub struct Palette {
    /// Master colors, loaded from an RGB file.
    pub master: Vec<Rgb565>,
    /// Working palette the renderer reads. Group `p` occupies slots `4p..4p + 3`.
    pub working: Vec<Rgb565>,
}

impl Palette {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            master: vec![Rgb565::default(); PALETTE_SIZE],
            working: vec![Rgb565::default(); PALETTE_SIZE],
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.master.len() == PALETTE_SIZE && self.working.len() == PALETTE_SIZE,
            "Palette has {} master and {} working colors",
            self.master.len(),
            self.working.len()
        );
        Ok(())
    }

    /// Converts a 24-bit color and stores it in the master table.
    pub fn set_master_rgb(&mut self, position: usize, r: u8, g: u8, b: u8) {
        self.master[position % PALETTE_SIZE] = Rgb565::from_rgb888(r, g, b);
    }

    /// Copies master color `index` into working slot `position`.
    pub fn update(&mut self, position: usize, index: usize) {
        self.working[position % PALETTE_SIZE] = self.master[index % PALETTE_SIZE];
    }

    /// Writes a color directly into working slot `position`.
    pub fn set_color(&mut self, position: usize, color: Rgb565) {
        self.working[position % PALETTE_SIZE] = color;
    }

    /// Returns color `color_idx` (0..4) of palette group `palette`.
    #[inline]
    pub fn color(&self, palette: usize, color_idx: usize) -> Rgb565 {
        self.working[(palette * COLORS_PER_PALETTE + color_idx) % PALETTE_SIZE]
    }

    /// Loads (R, G, B) triplets into the master table. Returns the number of colors converted.
    pub fn load_rgb_data(&mut self, data: &[u8]) -> usize {
        let mut converted = 0;
        for (position, rgb) in data.chunks_exact(3).take(PALETTE_SIZE).enumerate() {
            self.set_master_rgb(position, rgb[0], rgb[1], rgb[2]);
            converted += 1;
        }
        if converted < PALETTE_SIZE {
            log::warn!("RGB palette data ends after {} colors", converted);
        }
        converted
    }

    /// Loads master table indices into the working palette. Returns the number of slots updated.
    pub fn load_index_data(&mut self, data: &[u8]) -> usize {
        let mut updated = 0;
        for (position, index) in data.iter().take(PALETTE_SIZE).enumerate() {
            self.update(position, *index as usize);
            updated += 1;
        }
        if updated < PALETTE_SIZE {
            log::warn!("Palette index data ends after {} entries", updated);
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rgb_data() -> Vec<u8> {
        (0..PALETTE_SIZE as u8)
            .flat_map(|idx| [idx * 4, 255 - idx * 4, idx])
            .collect()
    }

    #[test]
    fn test_load_rgb_data() {
        let mut palette = Palette::new();
        assert_eq!(palette.load_rgb_data(&test_rgb_data()), PALETTE_SIZE);
        for idx in 0..PALETTE_SIZE as u8 {
            assert_eq!(
                palette.master[idx as usize],
                Rgb565::from_rgb888(idx * 4, 255 - idx * 4, idx)
            );
        }
    }

    #[test]
    fn test_load_index_data() {
        let mut palette = Palette::new();
        palette.load_rgb_data(&test_rgb_data());
        let indices: Vec<u8> = (0..PALETTE_SIZE as u8).rev().collect();
        assert_eq!(palette.load_index_data(&indices), PALETTE_SIZE);
        assert_eq!(palette.working[0], palette.master[63]);
        assert_eq!(palette.working[63], palette.master[0]);
        assert_eq!(palette.color(1, 2), palette.master[63 - 6]);
    }

    #[test]
    fn test_update_does_not_touch_master() {
        let mut palette = Palette::new();
        palette.set_master_rgb(5, 248, 252, 248);
        let master = palette.master.clone();
        palette.update(12, 5);
        assert_eq!(palette.color(3, 0), Rgb565(0xFFFF));
        assert_eq!(palette.master, master);
    }

    #[test]
    fn test_short_data_keeps_remaining_colors() {
        let mut palette = Palette::new();
        palette.set_master_rgb(2, 255, 0, 0);
        assert_eq!(palette.load_rgb_data(&[0, 0, 0, 0, 0, 0, 1]), 2);
        assert_eq!(palette.master[2], Rgb565(0xF800));
    }
}

//! Implementation of the name table containing the tile map.
//!
//! The name table is a 32x32 grid, four times the size of the visible 15x15 tile window, which
//! can be scrolled around NES-style.
use anyhow::ensure;
use anyhow::Result;
use bilge::prelude::*;
use bitcode::Decode;
use bitcode::Encode;

/// Width and height of the name table in tiles.
pub const NAMETABLE_SIZE: usize = 32;

/// A single name table cell.
///
/// 15  bit  8   7  bit  0
///  ---- ----   ---- ----
///  AAAA APPP   TTTT TTTT
///  |||| ||||   |||| ||||
///  |||| ||||   ++++-++++- Pattern table index
///  |||| |+++------------- Palette group (0-7)
///  ++++-+---------------- Attribute flags (collision, hazards, ... game defined)
///
/// Attribute flags are exchanged with game code as the high 5 bits of a byte (`flags & 0xF8`),
/// which is how they line up with the upper byte of the raw entry.
#[bitsize(16)]
#[derive(Clone, Copy, DebugBits, Default, FromBits, PartialEq)]
pub struct TileEntry {
    pub pattern: u8,
    pub palette: u3,
    pub attributes: u5,
}

impl TileEntry {
    pub fn with_tile(pattern: u8, palette: u8, flags: u8) -> Self {
        TileEntry::new(pattern, u3::new(palette & 0x07), u5::new(flags >> 3))
    }

    /// Attribute flags in the high 5 bits of a byte.
    pub fn flags(&self) -> u8 {
        self.attributes().value() << 3
    }

    pub fn set_flags(&mut self, flags: u8) {
        self.set_attributes(u5::new(flags >> 3));
    }

    pub fn palette_group(&self) -> usize {
        self.palette().value() as usize
    }
}

#[derive(Clone, Encode, Decode)]
pub struct NameTable {
    memory: Vec<u16>,
}

impl NameTable {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            memory: vec![0; NAMETABLE_SIZE * NAMETABLE_SIZE],
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.memory.len() == NAMETABLE_SIZE * NAMETABLE_SIZE,
            "Name table has {} entries",
            self.memory.len()
        );
        Ok(())
    }

    #[inline]
    fn index(x: usize, y: usize) -> usize {
        (y % NAMETABLE_SIZE) * NAMETABLE_SIZE + (x % NAMETABLE_SIZE)
    }

    #[inline]
    pub fn raw(&self, x: usize, y: usize) -> u16 {
        self.memory[Self::index(x, y)]
    }

    pub fn set_raw(&mut self, x: usize, y: usize, value: u16) {
        self.memory[Self::index(x, y)] = value;
    }

    pub fn entry(&self, x: usize, y: usize) -> TileEntry {
        TileEntry::from(self.raw(x, y))
    }

    pub fn set_entry(&mut self, x: usize, y: usize, entry: TileEntry) {
        self.set_raw(x, y, u16::from(entry));
    }

    pub fn draw_tile(&mut self, x: usize, y: usize, pattern: u8, palette: u8, flags: u8) {
        self.set_entry(x, y, TileEntry::with_tile(pattern, palette, flags));
    }

    pub fn set_tile_type(&mut self, x: usize, y: usize, flags: u8) {
        let mut entry = self.entry(x, y);
        entry.set_flags(flags);
        self.set_entry(x, y, entry);
    }

    pub fn set_tile_palette(&mut self, x: usize, y: usize, palette: u8) {
        let mut entry = self.entry(x, y);
        entry.set_palette(u3::new(palette & 0x07));
        self.set_entry(x, y, entry);
    }

    /// Replaces the pattern index of a cell, keeping palette and attribute flags.
    pub fn set_pattern(&mut self, x: usize, y: usize, pattern: u8) {
        let mut entry = self.entry(x, y);
        entry.set_pattern(pattern);
        self.set_entry(x, y, entry);
    }

    /// Fills the inclusive rectangle (x0, y0)..=(x1, y1). Attribute flags are cleared.
    pub fn fill(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, pattern: u8, palette: u8) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.draw_tile(x, y, pattern, palette, 0);
            }
        }
    }
}

/// Converts a (column, row) coordinate in the 16 tiles wide pattern sheet to a tile index.
pub fn pattern_index(pattern_x: usize, pattern_y: usize) -> usize {
    pattern_y * 16 + pattern_x
}

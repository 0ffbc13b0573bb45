//! Scroll registers selecting which part of the name table is displayed.
//!
//! Horizontal scroll is kept per name table row, which allows rows to scroll at different rates.
//! Vertical scroll is global, with two extensions for static status bars: display rows can jump
//! to a fixed name table row, and the rows the scroll cycles through can be limited to
//! `y_reset..=y_rollover`.
use anyhow::ensure;
use anyhow::Result;
use bitcode::Decode;
use bitcode::Encode;

use super::nametable::NAMETABLE_SIZE;
use super::DISPLAY_ROWS;

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct ScrollState {
    pub coarse_x: [u8; NAMETABLE_SIZE],
    pub fine_x: [u8; NAMETABLE_SIZE],
    pub coarse_y: u8,
    pub fine_y: u8,
    /// Name table row to display on each display row, if the row is jumped.
    pub row_jumps: [Option<u8>; DISPLAY_ROWS + 1],
    pub y_reset: u8,
    pub y_rollover: u8,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            coarse_x: [0; NAMETABLE_SIZE],
            fine_x: [0; NAMETABLE_SIZE],
            coarse_y: 0,
            fine_y: 0,
            row_jumps: [None; DISPLAY_ROWS + 1],
            y_reset: 0,
            y_rollover: NAMETABLE_SIZE as u8 - 1,
        }
    }
}

impl ScrollState {
    /// Sets the scroll position in pixels for all name table rows.
    pub fn set_window(&mut self, x: u8, y: u8) {
        for row in 0..NAMETABLE_SIZE {
            self.set_window_slice(row, x);
        }
        self.coarse_y = (y >> 3) % NAMETABLE_SIZE as u8;
        self.fine_y = y & 0x07;
    }

    /// Sets the horizontal scroll in pixels of a single name table row.
    pub fn set_window_slice(&mut self, row: usize, x: u8) {
        let row = row % NAMETABLE_SIZE;
        self.coarse_x[row] = (x >> 3) % NAMETABLE_SIZE as u8;
        self.fine_x[row] = x & 0x07;
    }

    pub fn set_row_jump(&mut self, display_row: usize, target_row: u8) {
        if let Some(jump) = self.row_jumps.get_mut(display_row) {
            *jump = Some(target_row % NAMETABLE_SIZE as u8);
        } else {
            log::warn!("Row jump on display row {} ignored", display_row);
        }
    }

    pub fn clear_row_jump(&mut self, display_row: usize) {
        if let Some(jump) = self.row_jumps.get_mut(display_row) {
            *jump = None;
        }
    }

    #[inline]
    pub fn row_jump(&self, display_row: usize) -> Option<u8> {
        self.row_jumps.get(display_row).copied().flatten()
    }

    pub fn set_coarse_y_rollover(&mut self, reset: u8, rollover: u8) {
        self.y_reset = reset % NAMETABLE_SIZE as u8;
        self.y_rollover = rollover % NAMETABLE_SIZE as u8;
    }

    /// Checks that all scroll positions are within the name table.
    pub fn validate(&self) -> Result<()> {
        let rows = NAMETABLE_SIZE as u8;
        ensure!(
            self.coarse_x.iter().all(|x| *x < rows) && self.fine_x.iter().all(|x| *x < 8),
            "Horizontal scroll out of range"
        );
        ensure!(
            self.coarse_y < rows && self.fine_y < 8,
            "Vertical scroll ({}, {}) out of range",
            self.coarse_y,
            self.fine_y
        );
        ensure!(
            self.y_reset < rows && self.y_rollover < rows,
            "Rollover rows {}..={} out of range",
            self.y_reset,
            self.y_rollover
        );
        ensure!(
            self.row_jumps.iter().flatten().all(|row| *row < rows),
            "Row jump target out of range"
        );
        Ok(())
    }

    /// Returns the name table row following `coarse_y` in vertical scroll order.
    #[inline]
    pub fn next_coarse_y(&self, coarse_y: u8) -> u8 {
        let next = coarse_y + 1;
        if next > self.y_rollover || next as usize >= NAMETABLE_SIZE {
            self.y_reset
        } else {
            next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_window() {
        let mut scroll = ScrollState::default();
        scroll.set_window(0x5D, 0x2B);
        assert!(scroll.coarse_x.iter().all(|x| *x == 11));
        assert!(scroll.fine_x.iter().all(|x| *x == 5));
        assert_eq!(scroll.coarse_y, 5);
        assert_eq!(scroll.fine_y, 3);

        scroll.set_window_slice(31, 0x0F);
        assert_eq!(scroll.coarse_x[31], 1);
        assert_eq!(scroll.fine_x[31], 7);
        assert_eq!(scroll.coarse_x[30], 11);
    }

    #[test]
    fn test_row_jumps() {
        let mut scroll = ScrollState::default();
        scroll.set_row_jump(13, 30);
        scroll.set_row_jump(14, 31);
        assert_eq!(scroll.row_jump(13), Some(30));
        assert_eq!(scroll.row_jump(14), Some(31));
        assert_eq!(scroll.row_jump(0), None);
        scroll.clear_row_jump(13);
        assert_eq!(scroll.row_jump(13), None);
        // Out of range rows are ignored.
        scroll.set_row_jump(40, 1);
        assert_eq!(scroll.row_jump(40), None);
    }

    #[test]
    fn test_next_coarse_y() {
        let mut scroll = ScrollState::default();
        assert_eq!(scroll.next_coarse_y(0), 1);
        assert_eq!(scroll.next_coarse_y(31), 0);

        scroll.set_coarse_y_rollover(2, 29);
        assert_eq!(scroll.next_coarse_y(28), 29);
        assert_eq!(scroll.next_coarse_y(29), 2);
        // Rows past the rollover (e.g. a jumped status bar) also reset.
        assert_eq!(scroll.next_coarse_y(30), 2);
    }

    #[test]
    fn test_validate() {
        let mut scroll = ScrollState::default();
        scroll.set_window(255, 255);
        assert!(scroll.validate().is_ok());
        scroll.fine_x[4] = 8;
        assert!(scroll.validate().is_err());
        scroll.fine_x[4] = 0;
        scroll.row_jumps[2] = Some(32);
        assert!(scroll.validate().is_err());
    }
}

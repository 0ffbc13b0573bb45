use super::nametable::NAMETABLE_SIZE;
use super::palette::COLORS_PER_PALETTE;
use super::palette::PALETTE_SIZE;
use super::pattern::pattern_pixel;
use super::pattern::PATTERN_TABLE_TILES;
use super::sprite::SPRITE_TRANSPARENT;
use super::Ppu;
use super::VIEW_HEIGHT;
use super::VIEW_WIDTH;
use crate::common::image::Image;
use crate::common::image::Rgb24;

/// Width of the pattern sheet in tiles, matching the layout of pattern files.
const PATTERN_SHEET_WIDTH: u32 = 16;
/// Size of a palette swatch in `render_palette`.
const SWATCH_SIZE: u32 = 8;

pub struct PpuDebug<'a>(pub &'a Ppu);

impl PpuDebug<'_> {
    /// Renders the whole pattern table as a 16 tile wide sheet, colored with palette group
    /// `palette`.
    pub fn render_pattern_table<ImageT: Image>(&self, palette: usize) -> ImageT {
        let rows = PATTERN_TABLE_TILES as u32 / PATTERN_SHEET_WIDTH;
        let mut image = ImageT::new(PATTERN_SHEET_WIDTH * 8, rows * 8);
        for tile in 0..PATTERN_TABLE_TILES as u32 {
            let origin = (
                (tile % PATTERN_SHEET_WIDTH) * 8,
                (tile / PATTERN_SHEET_WIDTH) * 8,
            );
            self.render_tile(&mut image, origin, tile as usize, palette);
        }
        image
    }

    /// Renders the full 32x32 name table without scrolling or sprites.
    pub fn render_nametable<ImageT: Image>(&self) -> ImageT {
        let size = NAMETABLE_SIZE as u32 * 8;
        let mut image = ImageT::new(size, size);
        for y in 0..NAMETABLE_SIZE {
            for x in 0..NAMETABLE_SIZE {
                let entry = self.0.state.nametable.entry(x, y);
                self.render_tile(
                    &mut image,
                    (x as u32 * 8, y as u32 * 8),
                    entry.pattern() as usize,
                    entry.palette_group(),
                );
            }
        }
        image
    }

    /// Renders the working palette as one row of swatches per palette group.
    pub fn render_palette<ImageT: Image>(&self) -> ImageT {
        let groups = (PALETTE_SIZE / COLORS_PER_PALETTE) as u32;
        let mut image = ImageT::new(
            COLORS_PER_PALETTE as u32 * SWATCH_SIZE,
            groups * SWATCH_SIZE,
        );
        for group in 0..groups {
            for color_idx in 0..COLORS_PER_PALETTE as u32 {
                let color = self.0.state.palette.color(group as usize, color_idx as usize);
                for y in 0..SWATCH_SIZE {
                    for x in 0..SWATCH_SIZE {
                        image.set_pixel(
                            (color_idx * SWATCH_SIZE + x, group * SWATCH_SIZE + y),
                            color.into(),
                        );
                    }
                }
            }
        }
        image
    }

    /// Renders the pending sprite layer. Transparent pixels are drawn as magenta.
    pub fn render_sprite_layer<ImageT: Image>(&self) -> ImageT {
        let mut image = ImageT::new(VIEW_WIDTH as u32, VIEW_HEIGHT as u32);
        for y in 0..VIEW_HEIGHT {
            for x in 0..VIEW_WIDTH {
                let pixel = self.0.state.sprites.pixel(x, y);
                let color = if pixel == SPRITE_TRANSPARENT {
                    Rgb24([255, 0, 255])
                } else {
                    pixel.into()
                };
                image.set_pixel((x as u32, y as u32), color);
            }
        }
        image
    }

    pub fn tile_info(&self, x: usize, y: usize) -> String {
        let entry = self.0.state.nametable.entry(x, y);
        format!(
            "Tile ({}, {})\nPattern: #{}\nPalette: {}\nFlags: 0x{:02X}",
            x % NAMETABLE_SIZE,
            y % NAMETABLE_SIZE,
            entry.pattern(),
            entry.palette_group(),
            entry.flags()
        )
    }

    pub fn scroll_info(&self) -> String {
        let scroll = &self.0.state.scroll;
        format!(
            "Window ({}, {})\nRollover {}..={}",
            scroll.coarse_x[scroll.coarse_y as usize] as u32 * 8
                + scroll.fine_x[scroll.coarse_y as usize] as u32,
            scroll.coarse_y as u32 * 8 + scroll.fine_y as u32,
            scroll.y_reset,
            scroll.y_rollover
        )
    }

    fn render_tile<ImageT: Image>(
        &self,
        image: &mut ImageT,
        origin: (u32, u32),
        tile: usize,
        palette: usize,
    ) {
        for fine_y in 0..8 {
            let row = self.0.state.patterns.row(tile, fine_y);
            for fine_x in 0..8 {
                let color = self
                    .0
                    .state
                    .palette
                    .color(palette, pattern_pixel(row, fine_x) as usize);
                image.set_pixel(
                    (origin.0 + fine_x as u32, origin.1 + fine_y as u32),
                    color.into(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::image::Rgb565;
    use crate::components::ppu::Flip;

    struct TestImage {
        width: u32,
        pixels: Vec<Rgb24>,
    }

    impl Image for TestImage {
        fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                pixels: vec![Rgb24::default(); (width * height) as usize],
            }
        }

        fn set_pixel(&mut self, index: (u32, u32), value: Rgb24) {
            self.pixels[(index.1 * self.width + index.0) as usize] = value;
        }
    }

    impl TestImage {
        fn get(&self, x: u32, y: u32) -> Rgb24 {
            self.pixels[(y * self.width + x) as usize]
        }
    }

    #[test]
    fn test_render_nametable() {
        let mut ppu = Ppu::new();
        ppu.load_pattern_data(&[0xFF; 16], 1, 1);
        ppu.set_palette_color(4 + 3, Rgb565(0xF800));
        ppu.draw_tile(31, 31, 1, 1, 0);
        let image: TestImage = ppu.debug().render_nametable();
        assert_eq!(image.width, 256);
        assert_eq!(image.get(255, 255), Rgb24([248, 0, 0]));
        assert_eq!(image.get(247, 247), Rgb24([0, 0, 0]));
    }

    #[test]
    fn test_render_pattern_table() {
        let mut ppu = Ppu::new();
        ppu.load_pattern_data(&[0xFF; 16], 17, 1);
        ppu.set_palette_color(2 * 4 + 3, Rgb565(0x001F));
        let image: TestImage = ppu.debug().render_pattern_table(2);
        assert_eq!(image.width, 128);
        assert_eq!(image.pixels.len(), 128 * 512);
        // Tile 17 sits in column 1 of sheet row 1.
        assert_eq!(image.get(8, 8), Rgb24([0, 0, 248]));
        assert_eq!(image.get(15, 15), Rgb24([0, 0, 248]));
        assert_eq!(image.get(7, 7), Rgb24([0, 0, 0]));
        assert_eq!(image.get(16, 8), Rgb24([0, 0, 0]));
    }

    #[test]
    fn test_render_sprite_layer() {
        let mut ppu = Ppu::new();
        ppu.load_pattern_data(&[0xFF; 16], 1, 1);
        ppu.set_palette_color(3, Rgb565(0x001F));
        ppu.draw_sprite_tile(0, 0, 1, 0, Flip::default());
        let image: TestImage = ppu.debug().render_sprite_layer();
        assert_eq!(image.get(7, 7), Rgb24([0, 0, 248]));
        assert_eq!(image.get(8, 8), Rgb24([255, 0, 255]));
    }

    #[test]
    fn test_info() {
        let mut ppu = Ppu::new();
        ppu.draw_tile(2, 3, 65, 4, 0x88);
        assert_eq!(
            ppu.debug().tile_info(2, 3),
            "Tile (2, 3)\nPattern: #65\nPalette: 4\nFlags: 0x88"
        );
        ppu.set_window(20, 9);
        assert_eq!(ppu.debug().scroll_info(), "Window (20, 9)\nRollover 0..=31");
    }
}

//! Implementation of the Picture Processing Unit
//!
//! A tile and sprite renderer modelled after the NES PPU. Game code authors a 32x32 name table of
//! 8x8 tiles and an overlay of sprites, the renderer composites both into a 240x240 RGB frame one
//! display row at a time.
mod debug;
mod nametable;
mod palette;
mod pattern;
mod render;
mod scroll;
mod sprite;
mod text;

use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use bitcode::Decode;
use bitcode::Encode;

pub use self::debug::PpuDebug;
pub use self::nametable::pattern_index;
pub use self::nametable::TileEntry;
pub use self::nametable::NAMETABLE_SIZE;
use self::nametable::NameTable;
pub use self::palette::PALETTE_SIZE;
use self::palette::Palette;
pub use self::pattern::convert_bitplane_row;
pub use self::pattern::PatternTable;
pub use self::pattern::PATTERN_TABLE_WORDS;
pub use self::pattern::TILE_RECORD_SIZE;
pub use self::render::FrameCursor;
pub use self::render::LineBuffers;
pub use self::render::Playfield;
pub use self::render::RenderState;
pub use self::render::LINE_BUFFER_WORDS;
use self::scroll::ScrollState;
pub use self::sprite::Flip;
use self::sprite::SpriteLayer;
pub use self::sprite::SpriteWindow;
pub use self::sprite::SPRITE_TRANSPARENT;
pub use self::text::MAX_DECIMAL;
use self::text::TextSettings;
use crate::common::image::Rgb565;

/// Width and height of the output frame in pixels.
pub const SCREEN_WIDTH: usize = 240;
pub const SCREEN_HEIGHT: usize = 240;
/// Width and height of the view in logical pixels. Every logical pixel is drawn as 2x2.
pub const VIEW_WIDTH: usize = 120;
pub const VIEW_HEIGHT: usize = 120;
/// Number of tiles visible in each direction.
pub const VIEW_TILES: usize = VIEW_WIDTH / 8;
/// Number of display rows of tiles rendered per frame.
pub const DISPLAY_ROWS: usize = 15;

pub struct Ppu {
    paused: bool,
    render_state: RenderState,
    line_buffers: LineBuffers,
    state: PpuState,
}

/// All data authored by game code. This is what save states capture.
#[derive(Clone, Encode, Decode)]
pub struct PpuState {
    patterns: PatternTable,
    nametable: NameTable,
    palette: Palette,
    sprites: SpriteLayer,
    scroll: ScrollState,
    text: TextSettings,
}

impl Default for PpuState {
    fn default() -> Self {
        Self {
            patterns: PatternTable::new(),
            nametable: NameTable::new(),
            palette: Palette::new(),
            sprites: SpriteLayer::new(),
            scroll: ScrollState::default(),
            text: TextSettings::default(),
        }
    }
}

impl PpuState {
    fn validate(&self) -> Result<()> {
        self.patterns.validate()?;
        self.nametable.validate()?;
        self.palette.validate()?;
        self.sprites.validate()?;
        self.scroll.validate()
    }
}

impl Ppu {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            paused: false,
            render_state: RenderState::Idle,
            line_buffers: LineBuffers::new(),
            state: PpuState::default(),
        }
    }

    /// Restores a state produced by `save_state`. On error the current state is kept.
    pub fn load_state(&mut self, encoded: &[u8]) -> Result<()> {
        let state: PpuState = bitcode::decode(encoded)?;
        state.validate().context("Invalid save state")?;
        self.state = state;
        self.transition(RenderState::Idle);
        Ok(())
    }

    pub fn save_state(&self) -> Vec<u8> {
        bitcode::encode(&self.state)
    }

    pub fn debug(&self) -> PpuDebug<'_> {
        PpuDebug(self)
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Asset loading

    /// Loads `length` tiles from a planar pattern file into tiles `start..start + length`.
    pub fn load_pattern_file(&mut self, path: &Path, start: usize, length: usize) -> Result<()> {
        let data = read_asset(path, "pattern")?;
        self.load_pattern_data(&data, start, length);
        Ok(())
    }

    pub fn load_pattern_data(&mut self, data: &[u8], start: usize, length: usize) -> usize {
        let converted = self.state.patterns.load_pattern_data(data, start, length);
        log::info!("Loaded {} pattern tiles at {}", converted, start);
        converted
    }

    /// Loads the 64 master colors from a file of 24-bit RGB triplets.
    ///
    /// If the file is short, the colors it does contain are still converted.
    pub fn load_rgb_file(&mut self, path: &Path) -> Result<()> {
        let data = read_asset(path, "RGB palette")?;
        let converted = self.state.palette.load_rgb_data(&data);
        if converted < PALETTE_SIZE {
            log::error!("RGB palette file {} is incomplete", path.display());
            anyhow::bail!(
                "RGB palette file {} contains {} of {} colors",
                path.display(),
                converted,
                PALETTE_SIZE
            );
        }
        log::info!("Loaded RGB palette from {}", path.display());
        Ok(())
    }

    /// Loads the working palette from a file of 64 master color indices.
    pub fn load_palette_file(&mut self, path: &Path) -> Result<()> {
        let data = read_asset(path, "palette")?;
        self.state.palette.load_index_data(&data);
        log::info!("Loaded palette from {}", path.display());
        Ok(())
    }

    pub fn load_rgb_data(&mut self, data: &[u8]) -> usize {
        self.state.palette.load_rgb_data(data)
    }

    pub fn load_palette_data(&mut self, data: &[u8]) -> usize {
        self.state.palette.load_index_data(data)
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Palette

    /// Converts a 24-bit color into master color `position`.
    pub fn set_master_rgb(&mut self, position: usize, r: u8, g: u8, b: u8) {
        self.state.palette.set_master_rgb(position, r, g, b);
    }

    /// Copies master color `index` into working palette slot `position`.
    pub fn update_palette(&mut self, position: usize, index: usize) {
        self.state.palette.update(position, index);
    }

    pub fn set_palette_color(&mut self, position: usize, color: Rgb565) {
        self.state.palette.set_color(position, color);
    }

    pub fn palette_color(&self, palette: usize, color_idx: usize) -> Rgb565 {
        self.state.palette.color(palette, color_idx)
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Name table

    pub fn draw_tile(&mut self, x: usize, y: usize, pattern: u8, palette: u8, flags: u8) {
        self.state.nametable.draw_tile(x, y, pattern, palette, flags);
    }

    /// Draws the tile at column `pattern_x`, row `pattern_y` of the 16 tile wide pattern sheet.
    pub fn draw_tile_xy(
        &mut self,
        x: usize,
        y: usize,
        pattern_x: usize,
        pattern_y: usize,
        palette: u8,
        flags: u8,
    ) {
        let pattern = pattern_index(pattern_x, pattern_y) as u8;
        self.state.nametable.draw_tile(x, y, pattern, palette, flags);
    }

    /// Sets the attribute flags of a tile (high 5 bits of `flags`).
    pub fn set_tile_type(&mut self, x: usize, y: usize, flags: u8) {
        self.state.nametable.set_tile_type(x, y, flags);
    }

    pub fn tile_type(&self, x: usize, y: usize) -> u8 {
        self.state.nametable.entry(x, y).flags()
    }

    pub fn set_tile_palette(&mut self, x: usize, y: usize, palette: u8) {
        self.state.nametable.set_tile_palette(x, y, palette);
    }

    pub fn tile_value(&self, x: usize, y: usize) -> u8 {
        self.state.nametable.entry(x, y).pattern()
    }

    /// Writes a raw name table entry.
    pub fn tile_direct(&mut self, x: usize, y: usize, raw: u16) {
        self.state.nametable.set_raw(x, y, raw);
    }

    pub fn tile_entry(&self, x: usize, y: usize) -> TileEntry {
        self.state.nametable.entry(x, y)
    }

    pub fn fill_tiles(
        &mut self,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        pattern: u8,
        palette: u8,
    ) {
        self.state.nametable.fill(x0, y0, x1, y1, pattern, palette);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fill_tiles_xy(
        &mut self,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        pattern_x: usize,
        pattern_y: usize,
        palette: u8,
    ) {
        let pattern = pattern_index(pattern_x, pattern_y) as u8;
        self.state.nametable.fill(x0, y0, x1, y1, pattern, palette);
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Sprites

    /// Draws pattern table tile `tile` as a sprite with its top left corner at pixel (`x`, `y`).
    pub fn draw_sprite_tile(&mut self, x: i32, y: i32, tile: u16, palette: u8, flip: Flip) {
        let PpuState {
            patterns,
            palette: colors,
            sprites,
            ..
        } = &mut self.state;
        sprites.draw_tile(
            patterns,
            colors,
            x,
            y,
            tile as usize,
            palette as usize,
            flip,
        );
    }

    /// Draws the tile at column `tile_x`, row `tile_y` of the pattern sheet as a sprite.
    pub fn draw_sprite_single(
        &mut self,
        x: i32,
        y: i32,
        tile_x: usize,
        tile_y: usize,
        palette: u8,
        flip: Flip,
    ) {
        let tile = pattern_index(tile_x, tile_y) as u16;
        self.draw_sprite_tile(x, y, tile, palette, flip);
    }

    /// Draws a `width` x `height` block of pattern sheet tiles as one sprite.
    ///
    /// Flipping mirrors the order of tiles within the block as well as the pixels of each tile.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_sprite_range(
        &mut self,
        x: i32,
        y: i32,
        tile_x: usize,
        tile_y: usize,
        width: usize,
        height: usize,
        palette: u8,
        flip: Flip,
    ) {
        for row in 0..height {
            let source_row = if flip.v { height - 1 - row } else { row };
            for column in 0..width {
                let source_column = if flip.h { width - 1 - column } else { column };
                self.draw_sprite_single(
                    x + column as i32 * 8,
                    y + row as i32 * 8,
                    tile_x + source_column,
                    tile_y + source_row,
                    palette,
                    flip,
                );
            }
        }
    }

    /// Clears the sprite layer. The renderer clears the layer while drawing a frame, so this is
    /// only needed to discard sprites before a frame has been drawn.
    pub fn clear_sprites(&mut self) {
        self.state.sprites.clear();
    }

    /// Limits sprite drawing to the inclusive rectangle (`left`, `top`)..=(`right`, `bottom`).
    pub fn set_sprite_window(&mut self, left: i32, top: i32, right: i32, bottom: i32) {
        self.state.sprites.window = SpriteWindow::from_inclusive(left, top, right, bottom);
    }

    pub fn sprite_window(&self) -> SpriteWindow {
        self.state.sprites.window
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Scrolling

    /// Sets the scroll position in pixels for the whole name table.
    pub fn set_window(&mut self, x: u8, y: u8) {
        self.state.scroll.set_window(x, y);
    }

    /// Sets the horizontal scroll position of name table row `row` only.
    pub fn set_window_slice(&mut self, row: usize, x: u8) {
        self.state.scroll.set_window_slice(row, x);
    }

    /// Displays name table row `target_row` on display row `display_row`, ignoring vertical
    /// scroll. Display rows following it continue from the jumped position.
    pub fn set_row_jump(&mut self, display_row: usize, target_row: u8) {
        self.state.scroll.set_row_jump(display_row, target_row);
    }

    pub fn clear_row_jump(&mut self, display_row: usize) {
        self.state.scroll.clear_row_jump(display_row);
    }

    /// Limits vertical scrolling to name table rows `reset..=rollover`.
    pub fn set_coarse_y_rollover(&mut self, reset: u8, rollover: u8) {
        self.state.scroll.set_coarse_y_rollover(reset, rollover);
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Frame rendering

    /// Holds the last rendered frame. While paused no new frame can be started.
    pub fn pause(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_rendering(&self) -> bool {
        matches!(self.render_state, RenderState::Rendering(_))
    }

    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    pub fn line_buffer(&self, index: usize) -> &[Rgb565] {
        self.line_buffers.get(index)
    }

    /// Index of the line buffer the next display row is rendered into.
    pub fn current_line_buffer(&self) -> usize {
        self.line_buffers.current()
    }

    fn transition(&mut self, next: RenderState) {
        if std::mem::discriminant(&self.render_state) != std::mem::discriminant(&next) {
            log::trace!("PPU: {} -> {}", self.render_state, next);
        }
        self.render_state = next;
    }

    /// Starts a new frame using the current scroll registers.
    ///
    /// Returns false if the renderer is paused or a frame is already in progress.
    pub fn begin_frame(&mut self) -> bool {
        if self.paused || self.is_rendering() {
            return false;
        }
        let cursor = FrameCursor::new(self.state.scroll.coarse_y, self.state.scroll.fine_y);
        self.transition(RenderState::Rendering(cursor));
        true
    }

    /// Renders the next display row of the current frame into `playfield`.
    ///
    /// Returns true while more rows remain to be rendered.
    pub fn render_next_row(&mut self, playfield: &mut Playfield) -> bool {
        let RenderState::Rendering(mut cursor) = self.render_state else {
            return false;
        };
        let line = self.line_buffers.current_mut();
        self.state.render_row(&mut cursor, line);
        playfield.write_lines(cursor.row * render::SCANLINES_PER_ROW, line);
        self.line_buffers.swap();

        cursor.row += 1;
        if cursor.row == DISPLAY_ROWS {
            self.transition(RenderState::Idle);
            false
        } else {
            self.transition(RenderState::Rendering(cursor));
            true
        }
    }

    /// Renders a complete frame into `playfield`.
    ///
    /// Returns false without touching `playfield` if no frame could be started.
    pub fn draw_playfield(&mut self, playfield: &mut Playfield) -> bool {
        if !self.begin_frame() {
            return false;
        }
        while self.render_next_row(playfield) {}
        true
    }
}

fn read_asset(path: &Path, kind: &str) -> Result<Vec<u8>> {
    std::fs::read(path)
        .with_context(|| format!("Unable to open {} file {}", kind, path.display()))
        .map_err(|err| {
            log::error!("{:#}", err);
            err
        })
}

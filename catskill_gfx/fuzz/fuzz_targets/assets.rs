//! Feeds random asset data and draw calls through the renderer.
#![no_main]

use catskill_gfx::Flip;
use catskill_gfx::Playfield;
use catskill_gfx::Ppu;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut ppu = Ppu::new();
    ppu.load_pattern_data(data, 0, 1024);
    ppu.load_rgb_data(data);
    ppu.load_palette_data(data);

    // Use the data as text and as a stream of draw coordinates.
    let text = String::from_utf8_lossy(data);
    ppu.draw_text(&text, 0, 0, true);
    ppu.draw_text(&text, 3, 5, false);
    for chunk in data.chunks_exact(4) {
        let x = chunk[0] as i8 as i32;
        let y = chunk[1] as i8 as i32;
        let flip = Flip::new(chunk[2] & 1 != 0, chunk[2] & 2 != 0);
        ppu.draw_sprite_tile(x, y, chunk[3] as u16, chunk[2] >> 2, flip);
        ppu.set_row_jump(chunk[0] as usize % 16, chunk[1]);
        ppu.set_window(chunk[2], chunk[3]);
    }
    if let [reset, rollover, ..] = data {
        ppu.set_coarse_y_rollover(*reset, *rollover);
    }

    // Whatever the input, rendering must never panic.
    let mut playfield = Playfield::new();
    ppu.draw_playfield(&mut playfield);
});

#![no_main]

use catskill_gfx::Ppu;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut ppu = Ppu::new();
    // This will likely fail, but should never panic!
    let _ = ppu.load_state(data);
});

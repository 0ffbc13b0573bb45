use bitcode::Decode;
use bitcode::Encode;
use intbits::Bits;

/// 16-bit color format used by the LCD, 5 bits red, 6 bits green, 5 bits blue.
///
/// 15  bit  8   7  bit  0
///  ---- ----   ---- ----
///  RRRR RGGG   GGGB BBBB
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    /// Truncates a 24-bit color to 5/6/5 bits. No rounding is applied.
    pub fn from_rgb888(r: u8, g: u8, b: u8) -> Self {
        let red = (r as u16 & 0xF8) << 8;
        let green = (g as u16 & 0xFC) << 3;
        let blue = b as u16 >> 3;
        Self(red | green | blue)
    }

    pub fn r(self) -> u8 {
        self.0.bits(11..=15) as u8
    }

    pub fn g(self) -> u8 {
        self.0.bits(5..=10) as u8
    }

    pub fn b(self) -> u8 {
        self.0.bits(0..=4) as u8
    }
}

/// 24-bit RGB format of the playfield handed to the display layer.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgb24(pub [u8; 3]);

/// Expands each channel by shifting it into the high bits of a byte. The low bits stay zero, so
/// full intensity maps to 248/252/248 rather than 255.
impl From<Rgb565> for Rgb24 {
    fn from(value: Rgb565) -> Self {
        Self([value.r() << 3, value.g() << 2, value.b() << 3])
    }
}

/// Abstract interface for image::RgbImage (used in tests and the headless tool) or any other
/// image container a frontend wants to render debug views into.
pub trait Image {
    fn new(width: u32, height: u32) -> Self;
    fn set_pixel(&mut self, index: (u32, u32), value: Rgb24);
}

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use argh::FromArgs;
use catskill_gfx::common::image::Image;
use catskill_gfx::common::image::Rgb24;
use catskill_gfx::common::logging;
use catskill_gfx::components::ppu::Playfield;
use catskill_gfx::components::ppu::Ppu;
use catskill_gfx::components::ppu::PALETTE_SIZE;
use image::RgbImage;

/// Renders a single frame of tiles and text into a PNG file
#[derive(FromArgs)]
struct HeadlessArgs {
    /// RGB palette file (64 24-bit colors)
    #[argh(option)]
    rgb: Option<PathBuf>,

    /// palette file (64 indices into the RGB palette)
    #[argh(option)]
    palette: Option<PathBuf>,

    /// pattern file in planar NES format
    #[argh(option)]
    pattern: Option<PathBuf>,

    /// number of tiles to load from the pattern file
    #[argh(option, default = "256")]
    tiles: usize,

    /// line of text to draw, one name table row per line. May be repeated.
    #[argh(option)]
    text: Vec<String>,

    /// lay out all text lines as one word wrapped paragraph
    #[argh(switch)]
    wrap: bool,

    /// horizontal scroll in pixels
    #[argh(option, default = "0")]
    scroll_x: u8,

    /// vertical scroll in pixels
    #[argh(option, default = "0")]
    scroll_y: u8,

    /// output PNG file
    #[argh(option, default = "PathBuf::from(\"frame.png\")")]
    output: PathBuf,

    /// also write the full name table to this PNG file
    #[argh(option)]
    nametable: Option<PathBuf>,
}

struct FrameImage(RgbImage);

impl Image for FrameImage {
    fn new(width: u32, height: u32) -> Self {
        FrameImage(RgbImage::new(width, height))
    }

    fn set_pixel(&mut self, index: (u32, u32), value: Rgb24) {
        self.0[(index.0, index.1)] = image::Rgb(value.0);
    }
}

/// Four shades of gray repeated for every palette group.
fn load_default_palette(ppu: &mut Ppu) {
    for position in 0..PALETTE_SIZE {
        let shade = (position % 4) as u8 * 85;
        ppu.set_master_rgb(position, shade, shade, shade);
        ppu.update_palette(position, position);
    }
}

fn load_assets(ppu: &mut Ppu, args: &HeadlessArgs) -> Result<()> {
    match &args.rgb {
        Some(rgb) => ppu.load_rgb_file(rgb)?,
        None => load_default_palette(ppu),
    }
    if let Some(palette) = &args.palette {
        ppu.load_palette_file(palette)?;
    }
    if let Some(pattern) = &args.pattern {
        ppu.load_pattern_file(pattern, 0, args.tiles)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    logging::init();
    let args: HeadlessArgs = argh::from_env();

    let mut ppu = Ppu::new();
    load_assets(&mut ppu, &args)?;

    if args.wrap {
        ppu.draw_text(&args.text.join(" "), 0, 0, true);
    } else {
        for (row, line) in args.text.iter().enumerate() {
            ppu.draw_text(line, 0, row, false);
        }
    }
    ppu.set_window(args.scroll_x, args.scroll_y);

    let mut playfield = Playfield::new();
    if !ppu.draw_playfield(&mut playfield) {
        anyhow::bail!("Unable to start a frame");
    }
    playfield
        .to_rgb::<FrameImage>()
        .0
        .save(&args.output)
        .with_context(|| format!("Unable to write {}", args.output.display()))?;
    log::info!("Wrote frame to {}", args.output.display());

    if let Some(path) = &args.nametable {
        ppu.debug()
            .render_nametable::<FrameImage>()
            .0
            .save(path)
            .with_context(|| format!("Unable to write {}", path.display()))?;
    }
    Ok(())
}

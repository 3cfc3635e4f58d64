use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use slime_core::{MASK_RADIUS, Mask, MaskRecord};
use slime_geom::CHUNK_WIDTH;
use slime_io::ImageConfig;

use crate::error::RenderError;

const BACKGROUND: [u8; 3] = [255, 255, 255];
const SLIME: [u8; 3] = [0, 255, 0];
const GRID: [u8; 3] = [0, 0, 0];
const CENTER: [u8; 3] = [255, 0, 0];
/// Brightness kept by a block or chunk outside the mask.
const OUTSIDE_SHADE: f32 = 0.55;
/// Arm length of the center cross in blocks, not counting the middle.
const CENTER_ARM: i32 = 3;
const CENTER_THICKNESS: i32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pixels per block edge.
    pub block_width: u32,
    /// Pixels between chunks.
    pub grid_width: u32,
    pub draw_slime_chunks: bool,
    pub draw_block_mask: bool,
    pub draw_chunk_mask: bool,
    pub draw_center: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            block_width: 1,
            grid_width: 1,
            draw_slime_chunks: true,
            draw_block_mask: true,
            draw_chunk_mask: true,
            draw_center: true,
        }
    }
}

impl From<&ImageConfig> for RenderOptions {
    fn from(cfg: &ImageConfig) -> Self {
        Self {
            block_width: cfg.block_width.max(1) as u32,
            grid_width: cfg.grid_width.max(0) as u32,
            draw_slime_chunks: cfg.draw_slime_chunks,
            draw_block_mask: cfg.draw_block_mask,
            draw_chunk_mask: cfg.draw_chunk_mask,
            draw_center: cfg.draw_center,
        }
    }
}

/// Tightly packed RGB8 raster, row-major with +z pointing down.
#[derive(Clone, Debug)]
pub struct MaskImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl MaskImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    #[inline]
    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let idx = self.index(x, y);
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = self.index(x, y);
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, rgb: [u8; 3]) {
        for row in y..y + h {
            for col in x..x + w {
                self.put_pixel(col, row, rgb);
            }
        }
    }

    pub fn write_png<W: Write>(&self, out: W) -> Result<(), image::ImageError> {
        PngEncoder::new(out).write_image(
            &self.data,
            self.width,
            self.height,
            image::ExtendedColorType::Rgb8,
        )
    }

    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        let file = File::create(path)?;
        self.write_png(BufWriter::new(file))?;
        Ok(())
    }
}

/// `{bx}x_{bz}z_{chunkSize}c{chunkSurfaceArea}_{blockSize}b{blockSurfaceArea}.png`
pub fn image_file_name(record: &MaskRecord) -> String {
    let block = record.position.block();
    let s = &record.stats;
    format!(
        "{}x_{}z_{}c{}_{}b{}.png",
        block.x, block.z, s.chunk_size, s.chunk_surface_area, s.block_size, s.block_surface_area
    )
}

/// Draws the whole neighborhood of a mask: chunks as squares of blocks,
/// separated by grid lines.
#[derive(Clone, Debug)]
pub struct MaskPainter {
    options: RenderOptions,
    chunk_px: u32,
    image_px: u32,
}

impl MaskPainter {
    pub fn new(options: RenderOptions) -> Self {
        let chunk_px = CHUNK_WIDTH as u32 * options.block_width + options.grid_width;
        let chunks = 2 * MASK_RADIUS as u32 + 1;
        Self {
            options,
            chunk_px,
            image_px: chunks * chunk_px - options.grid_width,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Pixels from one chunk's left edge to the next one's.
    pub fn chunk_width(&self) -> u32 {
        self.chunk_px
    }

    pub fn image_width(&self) -> u32 {
        self.image_px
    }

    pub fn new_image(&self) -> MaskImage {
        MaskImage::new(self.image_px, self.image_px)
    }

    /// Paints every pixel of `image`, which must come from `new_image`.
    pub fn paint(&self, mask: &Mask, image: &mut MaskImage) {
        assert_eq!(
            (image.width, image.height),
            (self.image_px, self.image_px),
            "image size does not match the painter"
        );
        let o = &self.options;
        let offset = mask.position().offset;
        for rel_x in -MASK_RADIUS..=MASK_RADIUS {
            for rel_z in -MASK_RADIUS..=MASK_RADIUS {
                let slime = o.draw_slime_chunks && mask.is_slime_chunk(rel_x, rel_z);
                let chunk_outside = o.draw_chunk_mask && !mask.is_chunk_inside(rel_x, rel_z);
                // The last chunk in each direction has no trailing grid line.
                let cells_x = if rel_x < MASK_RADIUS { CHUNK_WIDTH + 1 } else { CHUNK_WIDTH };
                let cells_z = if rel_z < MASK_RADIUS { CHUNK_WIDTH + 1 } else { CHUNK_WIDTH };
                let chunk_left = (rel_x + MASK_RADIUS) as u32 * self.chunk_px;
                let chunk_top = (rel_z + MASK_RADIUS) as u32 * self.chunk_px;

                for in_x in 0..cells_x {
                    let w = if in_x < CHUNK_WIDTH { o.block_width } else { o.grid_width };
                    for in_z in 0..cells_z {
                        let h = if in_z < CHUNK_WIDTH { o.block_width } else { o.grid_width };
                        if w == 0 || h == 0 {
                            continue;
                        }
                        let block_x = CHUNK_WIDTH * rel_x + in_x;
                        let block_z = CHUNK_WIDTH * rel_z + in_z;

                        let mut color = if in_x == CHUNK_WIDTH || in_z == CHUNK_WIDTH {
                            GRID
                        } else {
                            let mut c = if slime { SLIME } else { BACKGROUND };
                            if o.draw_block_mask && !mask.is_block_inside(block_x, block_z) {
                                c = shade(c);
                            }
                            if chunk_outside {
                                c = shade(c);
                            }
                            c
                        };
                        if o.draw_center && is_center(block_x - offset.x, block_z - offset.z) {
                            color = CENTER;
                        }

                        let x = chunk_left + in_x as u32 * o.block_width;
                        let y = chunk_top + in_z as u32 * o.block_width;
                        image.fill_rect(x, y, w, h, color);
                    }
                }
            }
        }
    }

    /// Convenience for one-off pictures.
    pub fn render(&self, mask: &Mask) -> MaskImage {
        let mut image = self.new_image();
        self.paint(mask, &mut image);
        image
    }
}

#[inline]
fn shade(rgb: [u8; 3]) -> [u8; 3] {
    rgb.map(|c| (f32::from(c) * OUTSIDE_SHADE) as u8)
}

/// Whether a block, relative to the mask's center block, is on the cross.
#[inline]
fn is_center(dx: i32, dz: i32) -> bool {
    (dx.abs() <= CENTER_ARM && dz.abs() < CENTER_THICKNESS)
        || (dz.abs() <= CENTER_ARM && dx.abs() < CENTER_THICKNESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slime_core::{MaskParams, MaskStats};
    use slime_geom::{Point, Position};

    fn mask_at(ix: i32, iz: i32) -> Mask {
        Mask::new(
            MaskParams::default(),
            Position::new(Point::ORIGIN, Point::new(ix, iz)),
        )
    }

    #[test]
    fn sizes_follow_block_and_grid_widths() {
        let p = MaskPainter::new(RenderOptions::default());
        assert_eq!(p.chunk_width(), 17);
        assert_eq!(p.image_width(), 17 * 17 - 1);
        let p = MaskPainter::new(RenderOptions {
            block_width: 3,
            grid_width: 0,
            ..RenderOptions::default()
        });
        assert_eq!(p.chunk_width(), 48);
        assert_eq!(p.image_width(), 17 * 48);
    }

    #[test]
    fn shading_truncates_like_integer_scaling() {
        assert_eq!(shade(BACKGROUND), [140, 140, 140]);
        assert_eq!(shade(shade(BACKGROUND)), [77, 77, 77]);
        assert_eq!(shade(SLIME), [0, 140, 0]);
    }

    #[test]
    fn center_cross_and_grid() {
        let mask = mask_at(5, 9);
        let p = MaskPainter::new(RenderOptions::default());
        let img = p.render(&mask);
        let cx = 8 * 17 + 5;
        let cz = 8 * 17 + 9;
        for d in -3..=3 {
            assert_eq!(img.pixel((cx + d) as u32, cz as u32), CENTER);
            assert_eq!(img.pixel(cx as u32, (cz + d) as u32), CENTER);
        }
        assert_ne!(img.pixel((cx + 4) as u32, cz as u32), CENTER);
        assert_ne!(img.pixel((cx + 1) as u32, (cz + 1) as u32), CENTER);
        // Grid column right of the first chunk, away from the cross.
        assert_eq!(img.pixel(16, 0), GRID);
        assert_eq!(img.pixel(0, 16), GRID);
    }

    #[test]
    fn far_corner_is_shaded_twice() {
        let mask = mask_at(0, 0);
        let img = MaskPainter::new(RenderOptions::default()).render(&mask);
        let base = if mask.is_slime_chunk(-MASK_RADIUS, -MASK_RADIUS) {
            SLIME
        } else {
            BACKGROUND
        };
        assert_eq!(img.pixel(0, 0), shade(shade(base)));
    }

    #[test]
    fn disabled_layers_leave_plain_background() {
        let mask = mask_at(0, 0);
        let p = MaskPainter::new(RenderOptions {
            grid_width: 0,
            draw_slime_chunks: false,
            draw_block_mask: false,
            draw_chunk_mask: false,
            draw_center: false,
            ..RenderOptions::default()
        });
        let img = p.render(&mask);
        assert!(img.data.iter().all(|&b| b == 255));
    }

    #[test]
    fn slime_chunks_inside_the_mask_are_green() {
        let mask = mask_at(0, 0);
        let p = MaskPainter::new(RenderOptions::default());
        let img = p.render(&mask);
        let mut seen = 0;
        for rel_x in -MASK_RADIUS..=MASK_RADIUS {
            for rel_z in -MASK_RADIUS..=MASK_RADIUS {
                if !mask.is_slime_chunk(rel_x, rel_z) || mask.chunk_weight(rel_x, rel_z) != 256 {
                    continue;
                }
                let x = (rel_x + MASK_RADIUS) as u32 * 17 + 8;
                let y = (rel_z + MASK_RADIUS) as u32 * 17 + 8;
                assert_eq!(img.pixel(x, y), SLIME);
                seen += 1;
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn file_name_lists_position_and_stats() {
        let record = MaskRecord {
            position: Position::from_block(-300, 41),
            stats: MaskStats {
                block_size: 4005,
                chunk_size: 18,
                block_surface_area: 49640,
                chunk_surface_area: 222,
            },
        };
        assert_eq!(image_file_name(&record), "-300x_41z_18c222_4005b49640.png");
    }
}

//! Composite raster buffer
//!
//! A single fixed-size RGBA raster that fetched tiles are drawn into and
//! that the external renderer samples as a texture source. The buffer is
//! fully initialized with a background fill before any tile arrives, so
//! every pixel always holds a valid color.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Ocean-blue placeholder shown anywhere imagery has not loaded yet.
pub const BACKGROUND_COLOR: Rgba<u8> = Rgba([18, 60, 102, 255]);

/// Fixed-size raster that tiles are composited into.
///
/// Exclusively owned by the stream manager; the renderer is a read-only
/// consumer notified through the dirty flag. Successful draws are the only
/// mutations.
pub struct CompositeBuffer {
    raster: RgbaImage,
    dirty: bool,
}

impl CompositeBuffer {
    /// Allocates a `side_pixels` square raster filled with the background color.
    pub fn new(side_pixels: u32) -> Self {
        Self {
            raster: RgbaImage::from_pixel(side_pixels, side_pixels, BACKGROUND_COLOR),
            dirty: false,
        }
    }

    /// Width and height of the raster in pixels.
    pub fn side_pixels(&self) -> u32 {
        self.raster.width()
    }

    /// Read access to the raster for texture upload.
    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    /// Draws a fetched tile image into the destination square.
    ///
    /// Crops `crop_size × crop_size` pixels starting at `(crop_offset,
    /// crop_offset)` out of `image` (removing the provider's branded border),
    /// scales the result to `dest_size × dest_size`, and writes it at
    /// `(dest_x, dest_y)`. Marks the buffer dirty.
    ///
    /// Drawing never fails for a decoded image; undersized imagery is
    /// clamped to whatever pixels are available.
    pub fn draw_tile(
        &mut self,
        image: &RgbaImage,
        dest_x: u32,
        dest_y: u32,
        dest_size: u32,
        crop_offset: u32,
        crop_size: u32,
    ) {
        let cropped = imageops::crop_imm(image, crop_offset, crop_offset, crop_size, crop_size)
            .to_image();

        if cropped.width() == dest_size && cropped.height() == dest_size {
            imageops::replace(&mut self.raster, &cropped, dest_x as i64, dest_y as i64);
        } else {
            let scaled = imageops::resize(&cropped, dest_size, dest_size, FilterType::Triangle);
            imageops::replace(&mut self.raster, &scaled, dest_x as i64, dest_y as i64);
        }

        self.dirty = true;
    }

    /// Whether the raster changed since the dirty flag was last cleared.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the one-shot change flag.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialized_with_background_fill() {
        let buffer = CompositeBuffer::new(64);

        assert_eq!(buffer.side_pixels(), 64);
        assert!(!buffer.is_dirty());
        for pixel in buffer.raster().pixels() {
            assert_eq!(*pixel, BACKGROUND_COLOR);
        }
    }

    #[test]
    fn test_draw_tile_overwrites_destination_only() {
        let mut buffer = CompositeBuffer::new(64);
        let tile = RgbaImage::from_pixel(32, 32, Rgba([200, 100, 50, 255]));

        buffer.draw_tile(&tile, 32, 0, 32, 0, 32);

        assert_eq!(*buffer.raster().get_pixel(33, 1), Rgba([200, 100, 50, 255]));
        assert_eq!(*buffer.raster().get_pixel(63, 31), Rgba([200, 100, 50, 255]));
        // Outside the destination rectangle the fill is untouched
        assert_eq!(*buffer.raster().get_pixel(0, 0), BACKGROUND_COLOR);
        assert_eq!(*buffer.raster().get_pixel(31, 63), BACKGROUND_COLOR);
    }

    #[test]
    fn test_draw_tile_crops_border() {
        // 20x20 source: red border, green 10x10 interior at offset 5
        let source = RgbaImage::from_fn(20, 20, |x, y| {
            if (5..15).contains(&x) && (5..15).contains(&y) {
                Rgba([0, 255, 0, 255])
            } else {
                Rgba([255, 0, 0, 255])
            }
        });

        let mut buffer = CompositeBuffer::new(32);
        buffer.draw_tile(&source, 0, 0, 10, 5, 10);

        // Only the interior survives the crop
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(*buffer.raster().get_pixel(x, y), Rgba([0, 255, 0, 255]));
            }
        }
    }

    #[test]
    fn test_draw_tile_upscales_to_destination() {
        let tile = RgbaImage::from_pixel(8, 8, Rgba([7, 7, 7, 255]));
        let mut buffer = CompositeBuffer::new(64);

        buffer.draw_tile(&tile, 0, 0, 32, 0, 8);

        // A solid color survives any resampling filter
        assert_eq!(*buffer.raster().get_pixel(31, 31), Rgba([7, 7, 7, 255]));
        assert_eq!(*buffer.raster().get_pixel(32, 32), BACKGROUND_COLOR);
    }

    #[test]
    fn test_dirty_flag_is_one_shot() {
        let mut buffer = CompositeBuffer::new(16);
        let tile = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]));

        assert!(!buffer.is_dirty());
        buffer.draw_tile(&tile, 0, 0, 8, 0, 8);
        assert!(buffer.is_dirty());

        buffer.clear_dirty();
        assert!(!buffer.is_dirty());

        buffer.draw_tile(&tile, 8, 8, 8, 0, 8);
        assert!(buffer.is_dirty());
    }
}

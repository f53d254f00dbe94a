// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: exact resize, sharpness/brightness enhancement, and
// circular alpha masking. Operates on in-memory images using the `image` and
// `imageproc` crates.

use docqr_core::error::DocqrError;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbaImage};
use imageproc::drawing::draw_filled_ellipse_mut;
use tracing::{debug, info, instrument};

/// Weight of the centre pixel in the 3x3 smoothing kernel; neighbours weigh 1.
const SMOOTH_CENTRE_WEIGHT: u32 = 5;

/// Sum of all smoothing kernel weights.
const SMOOTH_KERNEL_SUM: f32 = 13.0;

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let logo = ImageProcessor::open("files/logo.png")?
///     .resize_exact(160, 160)
///     .enhance_sharpness(2.0)
///     .enhance_brightness(1.2)
///     .circular_mask()
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, DocqrError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            DocqrError::Image(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(
            width = img.width(),
            height = img.height(),
            "Image loaded"
        );
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (PNG, JPEG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, DocqrError> {
        let img = image::load_from_memory(data)
            .map_err(|err| DocqrError::Image(format!("failed to decode image: {}", err)))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Resize the image to exactly `width` x `height`, ignoring aspect ratio.
    /// Uses Lanczos3 filtering.
    #[instrument(skip(self), fields(width, height))]
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            "Resizing image"
        );
        let resized =
            self.image
                .resize_exact(width, height, image::imageops::FilterType::Lanczos3);
        Self { image: resized }
    }

    /// Sharpen (factor > 1.0) or soften (factor < 1.0) the image.
    ///
    /// Each colour channel is extrapolated away from a 3x3 smoothed copy of the
    /// image: `out = smooth + factor * (orig - smooth)`. Pixels on the outer
    /// edge have no full neighbourhood and keep their original value. Alpha is
    /// left untouched; a factor of 1.0 is a no-op.
    #[instrument(skip(self), fields(factor))]
    pub fn enhance_sharpness(self, factor: f32) -> Self {
        info!(factor, "Enhancing sharpness");

        let rgba = self.image.to_rgba8();
        let (width, height) = rgba.dimensions();

        let sharpened = RgbaImage::from_fn(width, height, |x, y| {
            let pixel = *rgba.get_pixel(x, y);
            if x == 0 || y == 0 || x + 1 >= width || y + 1 >= height {
                return pixel;
            }

            let mut out = pixel;
            for channel in 0..3 {
                let mut sum = 0u32;
                for ny in y - 1..=y + 1 {
                    for nx in x - 1..=x + 1 {
                        let weight = if nx == x && ny == y {
                            SMOOTH_CENTRE_WEIGHT
                        } else {
                            1
                        };
                        sum += weight * u32::from(rgba.get_pixel(nx, ny).0[channel]);
                    }
                }
                let smooth = sum as f32 / SMOOTH_KERNEL_SUM;
                let val = smooth + factor * (f32::from(pixel.0[channel]) - smooth);
                out.0[channel] = val.round().clamp(0.0, 255.0) as u8;
            }
            out
        });

        Self {
            image: DynamicImage::ImageRgba8(sharpened),
        }
    }

    /// Scale every colour channel by `factor` (1.0 = unchanged, 0.0 = black).
    /// Alpha is left untouched.
    #[instrument(skip(self), fields(factor))]
    pub fn enhance_brightness(self, factor: f32) -> Self {
        info!(factor, "Enhancing brightness");

        let rgba = self.image.to_rgba8();

        // Manual per-pixel scaling.
        let brightened = image::ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
            let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            let adjust = |channel: u8| -> u8 {
                (f32::from(channel) * factor).round().clamp(0.0, 255.0) as u8
            };
            image::Rgba([adjust(r), adjust(g), adjust(b), a])
        });
        Self {
            image: DynamicImage::ImageRgba8(brightened),
        }
    }

    /// Replace the alpha channel with a filled ellipse inscribed in the image:
    /// opaque inside, fully transparent outside.
    #[instrument(skip(self))]
    pub fn circular_mask(self) -> Self {
        let mut rgba = self.image.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut mask = GrayImage::new(width, height);
        draw_filled_ellipse_mut(
            &mut mask,
            ((width / 2) as i32, (height / 2) as i32),
            (width / 2) as i32,
            (height / 2) as i32,
            Luma([255u8]),
        );

        for (pixel, alpha) in rgba.pixels_mut().zip(mask.pixels()) {
            pixel.0[3] = alpha.0[0];
        }
        debug!(width, height, "Circular mask applied");

        Self {
            image: DynamicImage::ImageRgba8(rgba),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, DocqrError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| DocqrError::Image(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the image to `path` as an opaque RGB PNG, regardless of extension.
    pub fn save_png_rgb(&self, path: impl AsRef<std::path::Path>) -> Result<(), DocqrError> {
        self.image
            .to_rgb8()
            .save_with_format(path.as_ref(), ImageFormat::Png)
            .map_err(|err| {
                DocqrError::Image(format!(
                    "failed to save image to {}: {}",
                    path.as_ref().display(),
                    err
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 5x5 checkerboard so every interior pixel has a contrasting neighbourhood.
    fn checkerboard() -> DynamicImage {
        let img = RgbaImage::from_fn(5, 5, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([200, 200, 200, 255])
            } else {
                Rgba([50, 50, 50, 128])
            }
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn sharpness_factor_one_is_identity() {
        let original = checkerboard();
        let out = ImageProcessor::from_dynamic(original.clone())
            .enhance_sharpness(1.0)
            .into_dynamic();
        assert_eq!(out.to_rgba8(), original.to_rgba8());
    }

    #[test]
    fn sharpness_increases_local_contrast() {
        let out = ImageProcessor::from_dynamic(checkerboard())
            .enhance_sharpness(2.0)
            .into_dynamic()
            .to_rgba8();
        // Centre (2,2) is light with four dark and four light neighbours:
        // smooth = (5*200 + 4*200 + 4*50) / 13 = 153.8; out = 2*200 - 153.8.
        assert_eq!(out.get_pixel(2, 2).0[0], 246);
        // Dark interior pixel is pushed darker.
        assert!(out.get_pixel(1, 2).0[0] < 50);
    }

    #[test]
    fn sharpness_keeps_edges_and_alpha() {
        let original = checkerboard().to_rgba8();
        let out = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(original.clone()))
            .enhance_sharpness(2.0)
            .into_dynamic()
            .to_rgba8();
        assert_eq!(out.get_pixel(0, 0), original.get_pixel(0, 0));
        assert_eq!(out.get_pixel(4, 3), original.get_pixel(4, 3));
        assert_eq!(out.get_pixel(1, 2).0[3], 128);
    }

    #[test]
    fn brightness_scales_colour_only() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([100, 220, 0, 77]));
        let out = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(img))
            .enhance_brightness(1.2)
            .into_dynamic()
            .to_rgba8();
        assert_eq!(out.get_pixel(1, 1).0, [120, 255, 0, 77]);
    }

    #[test]
    fn brightness_factor_one_is_identity() {
        let original = checkerboard();
        let out = ImageProcessor::from_dynamic(original.clone())
            .enhance_brightness(1.0)
            .into_dynamic();
        assert_eq!(out.to_rgba8(), original.to_rgba8());
    }

    #[test]
    fn circular_mask_clears_corners_and_keeps_centre() {
        let img = RgbaImage::from_pixel(40, 40, Rgba([10, 20, 30, 255]));
        let out = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(img))
            .circular_mask()
            .into_dynamic()
            .to_rgba8();
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
        assert_eq!(out.get_pixel(39, 39).0[3], 0);
        assert_eq!(out.get_pixel(20, 20).0, [10, 20, 30, 255]);
    }

    #[test]
    fn resize_exact_ignores_aspect_ratio() {
        let img = RgbaImage::from_pixel(30, 10, Rgba([0, 0, 0, 255]));
        let out = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(img)).resize_exact(8, 8);
        assert_eq!((out.width(), out.height()), (8, 8));
    }

    #[test]
    fn png_bytes_decode_back() {
        let bytes = ImageProcessor::from_dynamic(checkerboard())
            .to_png_bytes()
            .expect("encode");
        let decoded = ImageProcessor::from_bytes(&bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (5, 5));
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        assert!(matches!(
            ImageProcessor::from_bytes(b"not an image"),
            Err(DocqrError::Image(_))
        ));
    }
}

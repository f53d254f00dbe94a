// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// QR composer: encodes a URL at the highest error-correction level, rasterizes
// the symbol, and composites an enhanced, circular logo at its centre.
//
// Level H tolerates roughly 30% module damage, which is what lets a logo sit
// on top of the symbol. Nothing checks that the result still decodes; a large
// or high-contrast logo can break it.

use std::path::Path;

use docqr_core::config::{MAX_IMAGE_SIDE, QrStyle};
use docqr_core::error::{DocqrError, Result};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode, Version};
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ImageProcessor;

/// Largest symbol version defined for normal QR codes.
const MAX_VERSION: i16 = 40;

const DARK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// An encoded QR symbol: a square grid of dark and light modules, without
/// quiet zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    version: i16,
    width: usize,
    dark: Vec<bool>,
}

impl QrMatrix {
    /// Symbol version (1..=40).
    pub fn version(&self) -> i16 {
        self.version
    }

    /// Modules per side.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at column `x`, row `y` is dark. Out-of-range
    /// coordinates are light.
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.dark[y * self.width + x]
    }
}

/// Renders download URLs into PNG QR codes.
#[derive(Debug, Clone, Default)]
pub struct QrComposer {
    style: QrStyle,
}

impl QrComposer {
    pub fn new(style: QrStyle) -> Self {
        Self { style }
    }

    /// Encode `data` at error-correction level H, using the smallest symbol
    /// version no lower than `min_version` that can hold it.
    #[instrument(skip(self, data), fields(data_len = data.len()))]
    pub fn encode(&self, data: &str) -> Result<QrMatrix> {
        for version in self.style.min_version.max(1)..=MAX_VERSION {
            match QrCode::with_version(data.as_bytes(), Version::Normal(version), EcLevel::H) {
                Ok(code) => {
                    debug!(version, width = code.width(), "QR symbol encoded");
                    let dark = code
                        .to_colors()
                        .into_iter()
                        .map(|c| c == Color::Dark)
                        .collect();
                    return Ok(QrMatrix {
                        version,
                        width: code.width(),
                        dark,
                    });
                }
                Err(QrError::DataTooLong) => continue,
                Err(e) => return Err(DocqrError::QrEncode(e.to_string())),
            }
        }
        Err(DocqrError::QrEncode(format!(
            "{} bytes do not fit a version {MAX_VERSION} symbol at level H",
            data.len()
        )))
    }

    /// Draw the symbol black on white, `module_size` pixels per module, with a
    /// `border`-module light margin on every side.
    ///
    /// # Errors
    ///
    /// Returns an error when the style gives an empty image or one larger than
    /// `MAX_IMAGE_SIDE` pixels per side.
    pub fn rasterize(&self, matrix: &QrMatrix) -> Result<RgbaImage> {
        let module = self.style.module_size;
        let border = self.style.border;
        let side = u32::try_from(matrix.width())
            .ok()
            .and_then(|modules| self.style.image_side(modules))
            .filter(|&side| module > 0 && side <= MAX_IMAGE_SIDE)
            .ok_or_else(|| {
                DocqrError::Image(format!(
                    "module size {module} with border {border} gives no usable image for a {0}x{0} symbol",
                    matrix.width()
                ))
            })?;

        let mut img = RgbaImage::from_pixel(side, side, LIGHT);
        for y in 0..matrix.width() {
            for x in 0..matrix.width() {
                if matrix.is_dark(x, y) {
                    let px = (x as u32 + border) * module;
                    let py = (y as u32 + border) * module;
                    draw_filled_rect_mut(
                        &mut img,
                        Rect::at(px as i32, py as i32).of_size(module, module),
                        DARK,
                    );
                }
            }
        }
        Ok(img)
    }

    /// Composite `logo` at the centre of `canvas`.
    ///
    /// The logo is resized to a square `logo_ratio` of the canvas width,
    /// sharpened, brightened, masked to a circle, then alpha-blended so only
    /// the circle covers the symbol.
    #[instrument(skip_all, fields(logo_w = logo.width(), logo_h = logo.height()))]
    pub fn overlay_logo(&self, canvas: &mut RgbaImage, logo: &DynamicImage) -> Result<()> {
        let (width, height) = canvas.dimensions();
        let side = (f64::from(width) * f64::from(self.style.logo_ratio)).floor() as u32;
        if side == 0 || side > width || side > height {
            return Err(DocqrError::Image(format!(
                "logo side {side} does not fit a {width}x{height} canvas"
            )));
        }

        let prepared = ImageProcessor::from_dynamic(logo.clone())
            .resize_exact(side, side)
            .enhance_sharpness(self.style.logo_sharpness)
            .enhance_brightness(self.style.logo_brightness)
            .circular_mask()
            .into_dynamic()
            .to_rgba8();

        let x = (width - side) / 2;
        let y = (height - side) / 2;
        image::imageops::overlay(canvas, &prepared, i64::from(x), i64::from(y));
        debug!(side, x, y, "Logo composited");
        Ok(())
    }

    /// Encode and rasterize `url`, overlaying `logo` when given.
    pub fn compose(&self, url: &str, logo: Option<&DynamicImage>) -> Result<RgbaImage> {
        let matrix = self.encode(url)?;
        let mut img = self.rasterize(&matrix)?;
        if let Some(logo) = logo {
            self.overlay_logo(&mut img, logo)?;
        }
        Ok(img)
    }

    /// Compose `url` and save it as an RGB PNG at `dest`.
    ///
    /// The image is written to a sibling temporary file and renamed into place,
    /// so `dest` only ever exists fully written. Returns whether the logo was
    /// applied; a logo that fails to composite is logged and the QR is saved
    /// without it.
    #[instrument(skip(self, logo, dest), fields(dest = %dest.display()))]
    pub fn compose_to_file(
        &self,
        url: &str,
        logo: Option<&DynamicImage>,
        dest: &Path,
    ) -> Result<bool> {
        let matrix = self.encode(url)?;
        let mut img = self.rasterize(&matrix)?;

        let with_logo = match logo {
            Some(logo) => match self.overlay_logo(&mut img, logo) {
                Ok(()) => {
                    info!("Logo added to QR code");
                    true
                }
                Err(e) => {
                    warn!(error = %e, "failed to add logo, saving plain QR code");
                    false
                }
            },
            None => false,
        };

        let mut tmp_name = dest.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = Path::new(&tmp_name);

        let written = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(img))
            .save_png_rgb(tmp)
            .and_then(|()| std::fs::rename(tmp, dest).map_err(DocqrError::from));
        if let Err(e) = written {
            std::fs::remove_file(tmp).ok();
            return Err(e);
        }

        info!(version = matrix.version(), with_logo, "QR code saved");
        Ok(with_logo)
    }
}

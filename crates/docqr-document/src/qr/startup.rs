// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Startup QR pass: makes sure every document in the catalog has a cached QR
// image on disk. Existing images are never rewritten; failures are logged and
// do not stop the remaining documents or the server.

use std::path::Path;

use docqr_core::types::GenerationOutcome;
use docqr_core::AppConfig;
use image::DynamicImage;
use tracing::{debug, error, info, warn};

use crate::image::processor::ImageProcessor;
use crate::qr::composer::QrComposer;

/// Load the optional logo. A missing file is normal; an unreadable one is
/// logged and treated as missing.
pub fn load_logo(path: &Path) -> Option<DynamicImage> {
    if !path.exists() {
        debug!(path = %path.display(), "no logo file, QR codes will be plain");
        return None;
    }
    match ImageProcessor::open(path) {
        Ok(processor) => Some(processor.into_dynamic()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load logo");
            None
        }
    }
}

/// Generate the QR image of every document whose image is not on disk yet.
///
/// Returns one outcome per document, in catalog order.
pub fn ensure_qr_codes(config: &AppConfig) -> Vec<(String, GenerationOutcome)> {
    let composer = QrComposer::new(config.qr.clone());
    // Loaded on first use so a fully cached catalog never touches the logo.
    let mut logo: Option<Option<DynamicImage>> = None;
    let mut outcomes = Vec::with_capacity(config.documents.len());

    for record in config.documents.iter() {
        let qr_path = record.qr_path(&config.files_dir);
        if qr_path.exists() {
            info!(key = %record.key, path = %qr_path.display(), "QR already exists, skipping");
            outcomes.push((record.key.clone(), GenerationOutcome::Skipped));
            continue;
        }

        info!(key = %record.key, "Generating QR code");
        let url = record.download_url(&config.public_base_url);
        let logo = logo.get_or_insert_with(|| load_logo(&config.logo_path()));

        let outcome = match composer.compose_to_file(&url, logo.as_ref(), &qr_path) {
            Ok(with_logo) => {
                info!(key = %record.key, path = %qr_path.display(), url = %url, "QR code saved");
                GenerationOutcome::Generated { with_logo }
            }
            Err(e) => {
                error!(key = %record.key, error = %e, "QR generation failed");
                GenerationOutcome::Failed
            }
        };
        outcomes.push((record.key.clone(), outcome));
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqr_core::types::{DocumentCatalog, DocumentRecord};
    use docqr_core::QrStyle;
    use image::{Rgba, RgbaImage};

    fn config_in(dir: &Path) -> AppConfig {
        AppConfig {
            files_dir: dir.to_path_buf(),
            public_base_url: "http://localhost:8000".into(),
            documents: DocumentCatalog::new(vec![
                DocumentRecord::new("deed", "Deed.pdf", "deed.png", "deed"),
                DocumentRecord::new("permit", "Permit.pdf", "permit.png", "permit"),
            ])
            .expect("catalog"),
            // Small symbols keep the tests fast.
            qr: QrStyle {
                module_size: 2,
                min_version: 2,
                ..QrStyle::default()
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn generates_missing_images() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());

        let outcomes = ensure_qr_codes(&config);
        assert_eq!(
            outcomes,
            vec![
                ("deed".to_string(), GenerationOutcome::Generated { with_logo: false }),
                ("permit".to_string(), GenerationOutcome::Generated { with_logo: false }),
            ]
        );
        assert!(dir.path().join("deed.png").exists());
        assert!(dir.path().join("permit.png").exists());
    }

    #[test]
    fn existing_image_is_left_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        let existing = dir.path().join("deed.png");
        std::fs::write(&existing, b"cached").expect("write");

        let outcomes = ensure_qr_codes(&config);
        assert_eq!(outcomes[0].1, GenerationOutcome::Skipped);
        assert_eq!(std::fs::read(&existing).expect("read"), b"cached");
        assert!(matches!(outcomes[1].1, GenerationOutcome::Generated { .. }));
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        ensure_qr_codes(&config);
        let first = std::fs::read(dir.path().join("deed.png")).expect("read");

        let outcomes = ensure_qr_codes(&config);
        assert!(outcomes.iter().all(|(_, o)| *o == GenerationOutcome::Skipped));
        assert_eq!(std::fs::read(dir.path().join("deed.png")).expect("read"), first);
    }

    #[test]
    fn logo_is_applied_when_present() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        RgbaImage::from_pixel(32, 32, Rgba([255, 0, 0, 255]))
            .save(config.logo_path())
            .expect("save logo");

        let outcomes = ensure_qr_codes(&config);
        assert_eq!(outcomes[0].1, GenerationOutcome::Generated { with_logo: true });
    }

    #[test]
    fn unreadable_logo_falls_back_to_plain() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        std::fs::write(config.logo_path(), b"not a png").expect("write");

        let outcomes = ensure_qr_codes(&config);
        assert_eq!(outcomes[0].1, GenerationOutcome::Generated { with_logo: false });
    }

    #[test]
    fn failures_are_reported_not_raised() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(&dir.path().join("does-not-exist"));

        let outcomes = ensure_qr_codes(&config);
        assert!(outcomes.iter().all(|(_, o)| *o == GenerationOutcome::Failed));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// Settings come from an optional JSON file and are then overridden by a few
// environment variables (PORT matches what hosting platforms inject).

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DocqrError, Result};
use crate::types::DocumentCatalog;

/// Default configuration file, resolved against the working directory.
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable names recognised by [`AppConfig::apply_overrides`].
pub const ENV_CONFIG: &str = "DOCQR_CONFIG";
pub const ENV_PORT: &str = "PORT";
pub const ENV_BIND: &str = "DOCQR_BIND";
pub const ENV_FILES_DIR: &str = "DOCQR_FILES_DIR";
pub const ENV_PUBLIC_BASE_URL: &str = "DOCQR_PUBLIC_BASE_URL";

/// Largest QR image side, in pixels, a style may produce.
pub const MAX_IMAGE_SIDE: u32 = 4096;

/// Modules per side of a version 40 symbol.
const MAX_SYMBOL_MODULES: u32 = 177;

/// Rendering parameters for generated QR codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrStyle {
    /// Pixels per QR module.
    pub module_size: u32,
    /// Light quiet-zone width, in modules.
    pub border: u32,
    /// Smallest symbol version tried; larger ones are used if the URL needs them.
    pub min_version: i16,
    /// Logo side length as a fraction of the image width.
    pub logo_ratio: f32,
    /// Sharpness enhancement factor applied to the logo (1.0 = unchanged).
    pub logo_sharpness: f32,
    /// Brightness enhancement factor applied to the logo (1.0 = unchanged).
    pub logo_brightness: f32,
}

impl Default for QrStyle {
    fn default() -> Self {
        Self {
            module_size: 10,
            border: 4,
            min_version: 10,
            logo_ratio: 0.25,
            logo_sharpness: 2.0,
            logo_brightness: 1.2,
        }
    }
}

impl QrStyle {
    /// Pixel side of the image for a symbol `modules` wide, quiet zone
    /// included. `None` on overflow.
    pub fn image_side(&self, modules: u32) -> Option<u32> {
        self.border
            .checked_mul(2)?
            .checked_add(modules)?
            .checked_mul(self.module_size)
    }

    pub fn validate(&self) -> Result<()> {
        if self.module_size == 0 {
            return Err(DocqrError::Config("qr.module_size must be at least 1".into()));
        }
        // Symbols grow up to version 40 when the data needs it.
        match self.image_side(MAX_SYMBOL_MODULES) {
            Some(side) if side <= MAX_IMAGE_SIDE => {}
            _ => {
                return Err(DocqrError::Config(format!(
                    "qr.module_size {} with qr.border {} exceeds the {MAX_IMAGE_SIDE} px image limit",
                    self.module_size, self.border
                )));
            }
        }
        if !(1..=40).contains(&self.min_version) {
            return Err(DocqrError::Config(format!(
                "qr.min_version must be within 1..=40, got {}",
                self.min_version
            )));
        }
        if !(self.logo_ratio > 0.0 && self.logo_ratio < 1.0) {
            return Err(DocqrError::Config(format!(
                "qr.logo_ratio must be within (0, 1), got {}",
                self.logo_ratio
            )));
        }
        if self.logo_sharpness < 0.0 || self.logo_brightness < 0.0 {
            return Err(DocqrError::Config(
                "qr enhancement factors must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_address: IpAddr,
    /// Port for the HTTP server (default 8000).
    pub port: u16,
    /// Directory holding the PDFs, generated QR images, logo and favicon.
    pub files_dir: PathBuf,
    /// Externally reachable base URL; QR codes point at `{base}/download/{route}`.
    pub public_base_url: String,
    /// Optional logo overlaid on QR codes, relative to `files_dir`.
    pub logo_file: String,
    /// Favicon served at `/favicon.ico`, relative to `files_dir`.
    pub favicon_file: String,
    /// The documents on offer.
    pub documents: DocumentCatalog,
    /// QR rendering parameters.
    pub qr: QrStyle,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            files_dir: PathBuf::from("files"),
            public_base_url: "https://cdn-buildnow-telangana.onrender.com".into(),
            logo_file: "logo.png".into(),
            favicon_file: "favicon.ico".into(),
            documents: DocumentCatalog::default(),
            qr: QrStyle::default(),
        }
    }
}

impl AppConfig {
    /// Load the configuration the binary runs with: the JSON file named by
    /// `DOCQR_CONFIG` (or `config.json`) when present, then environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE));
        let mut config = Self::from_file_or_default(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path` as JSON, or fall back to defaults when the file is absent.
    /// A file that exists but does not parse is an error.
    pub fn from_file_or_default(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(data) => {
                info!(path = %path.display(), "loading configuration file");
                Ok(serde_json::from_str(&data)?)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| DocqrError::Config(format!("{ENV_PORT} is not a valid port: {port:?}")))?;
        }
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind_address = bind
                .trim()
                .parse()
                .map_err(|_| DocqrError::Config(format!("{ENV_BIND} is not an IP address: {bind:?}")))?;
        }
        if let Some(dir) = lookup(ENV_FILES_DIR) {
            self.files_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(ENV_PUBLIC_BASE_URL) {
            self.public_base_url = url;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.public_base_url.starts_with("http://")
            || self.public_base_url.starts_with("https://"))
        {
            return Err(DocqrError::Config(format!(
                "public_base_url must be an http(s) URL, got {:?}",
                self.public_base_url
            )));
        }
        self.qr.validate()
    }

    /// Full path of the optional logo.
    pub fn logo_path(&self) -> PathBuf {
        self.files_dir.join(&self.logo_file)
    }

    /// Full path of the favicon.
    pub fn favicon_path(&self) -> PathBuf {
        self.files_dir.join(&self.favicon_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.qr.module_size, 10);
        assert_eq!(config.qr.border, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("PORT", "9090"),
                ("DOCQR_BIND", "127.0.0.1"),
                ("DOCQR_FILES_DIR", "/srv/docs"),
                ("DOCQR_PUBLIC_BASE_URL", "http://localhost:9090"),
            ]))
            .expect("overrides apply");
        assert_eq!(config.port, 9090);
        assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.files_dir, PathBuf::from("/srv/docs"));
        assert_eq!(config.public_base_url, "http://localhost:9090");
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, DocqrError::Config(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config =
            AppConfig::from_file_or_default(&dir.path().join("nope.json")).expect("defaults");
        assert_eq!(config.files_dir, PathBuf::from("files"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "port": 1234, "qr": { "border": 2 } }"#).expect("write");
        let config = AppConfig::from_file_or_default(&path).expect("parse");
        assert_eq!(config.port, 1234);
        assert_eq!(config.qr.border, 2);
        assert_eq!(config.qr.module_size, 10);
        assert_eq!(config.documents, DocumentCatalog::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").expect("write");
        assert!(matches!(
            AppConfig::from_file_or_default(&path),
            Err(DocqrError::Serialization(_))
        ));
    }

    #[test]
    fn style_validation() {
        let mut style = QrStyle::default();
        style.min_version = 41;
        assert!(style.validate().is_err());
        style = QrStyle { logo_ratio: 0.0, ..QrStyle::default() };
        assert!(style.validate().is_err());
        style = QrStyle { module_size: 0, ..QrStyle::default() };
        assert!(style.validate().is_err());
    }

    #[test]
    fn image_size_is_bounded() {
        // Default: (177 + 8) * 10 = 1850 px at version 40.
        assert_eq!(QrStyle::default().image_side(177), Some(1850));

        let huge_border = QrStyle { border: u32::MAX / 2 + 1, ..QrStyle::default() };
        assert_eq!(huge_border.image_side(21), None);
        assert!(matches!(huge_border.validate(), Err(DocqrError::Config(_))));

        let huge_module = QrStyle { module_size: 2000, ..QrStyle::default() };
        assert!(huge_module.validate().is_err());

        let at_limit = QrStyle { module_size: 22, border: 1, ..QrStyle::default() };
        assert_eq!(at_limit.image_side(177), Some(3938));
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let config = AppConfig {
            public_base_url: "ftp://example.org".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

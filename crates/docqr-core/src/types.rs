// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for docqr.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DocqrError;

/// A downloadable document and the QR image that points at it.
///
/// Records are defined once at process start and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Stable identifier shown on the index page.
    pub key: String,
    /// File name of the PDF inside the files directory.
    pub file_name: String,
    /// File name of the generated QR image inside the files directory.
    pub qr_file_name: String,
    /// Path segment used by `/download/{route}` and `/qr/{route}`.
    pub route: String,
}

impl DocumentRecord {
    pub fn new(
        key: impl Into<String>,
        file_name: impl Into<String>,
        qr_file_name: impl Into<String>,
        route: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            file_name: file_name.into(),
            qr_file_name: qr_file_name.into(),
            route: route.into(),
        }
    }

    /// Location of the PDF on disk.
    pub fn source_path(&self, files_dir: &Path) -> PathBuf {
        files_dir.join(&self.file_name)
    }

    /// Location of the cached QR image on disk.
    pub fn qr_path(&self, files_dir: &Path) -> PathBuf {
        files_dir.join(&self.qr_file_name)
    }

    /// Public URL encoded into the QR code.
    pub fn download_url(&self, public_base_url: &str) -> String {
        format!(
            "{}/download/{}",
            public_base_url.trim_end_matches('/'),
            self.route
        )
    }
}

/// The static mapping of routes to documents.
///
/// Routes are unique and every field of every record is non-empty; both are
/// checked on construction (including when deserialized from config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DocumentRecord>", into = "Vec<DocumentRecord>")]
pub struct DocumentCatalog {
    records: Vec<DocumentRecord>,
}

impl DocumentCatalog {
    pub fn new(records: Vec<DocumentRecord>) -> Result<Self, DocqrError> {
        let mut routes = HashSet::new();
        for record in &records {
            let fields = [
                ("key", &record.key),
                ("file_name", &record.file_name),
                ("qr_file_name", &record.qr_file_name),
                ("route", &record.route),
            ];
            if let Some((field, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
                return Err(DocqrError::Catalog(format!(
                    "document {:?} has an empty {field}",
                    record.key
                )));
            }
            if record.route.contains('/') {
                return Err(DocqrError::Catalog(format!(
                    "route {:?} must be a single path segment",
                    record.route
                )));
            }
            if !routes.insert(record.route.as_str()) {
                return Err(DocqrError::Catalog(format!(
                    "duplicate route {:?}",
                    record.route
                )));
            }
        }
        Ok(Self { records })
    }

    /// Look a document up by its URL route segment.
    pub fn find_by_route(&self, route: &str) -> Option<&DocumentRecord> {
        self.records.iter().find(|r| r.route == route)
    }

    /// Records in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for DocumentCatalog {
    fn default() -> Self {
        Self {
            records: vec![DocumentRecord::new(
                "occupancy_certificate",
                "Occupancy Certificate.pdf",
                "occupancy.png",
                "occupancy_certificate",
            )],
        }
    }
}

impl TryFrom<Vec<DocumentRecord>> for DocumentCatalog {
    type Error = DocqrError;

    fn try_from(records: Vec<DocumentRecord>) -> Result<Self, Self::Error> {
        Self::new(records)
    }
}

impl From<DocumentCatalog> for Vec<DocumentRecord> {
    fn from(catalog: DocumentCatalog) -> Self {
        catalog.records
    }
}

/// Result of the startup QR pass for a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A new QR image was written.
    Generated { with_logo: bool },
    /// The QR image already existed and was left untouched.
    Skipped,
    /// Generation failed; the error has been logged.
    Failed,
}

/// Status of the embedded HTTP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(route: &str) -> DocumentRecord {
        DocumentRecord::new(route, format!("{route}.pdf"), format!("{route}.png"), route)
    }

    #[test]
    fn download_url_joins_base_and_route() {
        let rec = record("deed");
        assert_eq!(
            rec.download_url("https://example.org"),
            "https://example.org/download/deed"
        );
        assert_eq!(
            rec.download_url("https://example.org/"),
            "https://example.org/download/deed"
        );
    }

    #[test]
    fn paths_are_relative_to_files_dir() {
        let rec = DocumentRecord::new("k", "A File.pdf", "a.png", "a");
        let dir = Path::new("files");
        assert_eq!(rec.source_path(dir), PathBuf::from("files/A File.pdf"));
        assert_eq!(rec.qr_path(dir), PathBuf::from("files/a.png"));
    }

    #[test]
    fn default_catalog_has_occupancy_certificate() {
        let catalog = DocumentCatalog::default();
        assert_eq!(catalog.len(), 1);
        let rec = catalog
            .find_by_route("occupancy_certificate")
            .expect("default record");
        assert_eq!(rec.file_name, "Occupancy Certificate.pdf");
        assert_eq!(rec.qr_file_name, "occupancy.png");
    }

    #[test]
    fn find_by_route_misses_unknown() {
        let catalog = DocumentCatalog::new(vec![record("a"), record("b")]).expect("valid");
        assert!(catalog.find_by_route("c").is_none());
        assert_eq!(catalog.find_by_route("b").map(|r| r.key.as_str()), Some("b"));
    }

    #[test]
    fn duplicate_routes_are_rejected() {
        let err = DocumentCatalog::new(vec![record("a"), record("a")]).unwrap_err();
        assert!(matches!(err, DocqrError::Catalog(_)));
    }

    #[test]
    fn empty_fields_are_rejected() {
        let mut rec = record("a");
        rec.qr_file_name = "  ".into();
        let err = DocumentCatalog::new(vec![rec]).unwrap_err();
        assert!(err.to_string().contains("qr_file_name"));
    }

    #[test]
    fn nested_routes_are_rejected() {
        let rec = DocumentRecord::new("k", "k.pdf", "k.png", "a/b");
        assert!(DocumentCatalog::new(vec![rec]).is_err());
    }

    #[test]
    fn deserializing_validates() {
        let json = r#"[
            {"key":"a","file_name":"a.pdf","qr_file_name":"a.png","route":"x"},
            {"key":"b","file_name":"b.pdf","qr_file_name":"b.png","route":"x"}
        ]"#;
        assert!(serde_json::from_str::<DocumentCatalog>(json).is_err());
    }
}

//! Core domain types for Marginalia.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SubsecRound as _, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["epub", "pdf"];

/// Lowercase hex SHA-256 of `identifier`, used as the per-book storage key.
pub fn fingerprint(identifier: &str) -> String {
    let digest = Sha256::digest(identifier.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookRef {
    // Recent lists written by earlier releases store the identifier as `title`.
    #[serde(rename = "title")]
    pub identifier: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFormat {
    Epub,
    Pdf,
}

impl BookFormat {
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let lower = identifier.trim().to_ascii_lowercase();
        if lower.ends_with(".epub") {
            Some(BookFormat::Epub)
        } else if lower.ends_with(".pdf") {
            Some(BookFormat::Pdf)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookFormat::Epub => "epub",
            BookFormat::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for BookFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BookRef {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    pub fn format(&self) -> Option<BookFormat> {
        BookFormat::from_identifier(&self.identifier)
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.identifier)
    }

    /// Last path segment, for list display.
    pub fn display_name(&self) -> &str {
        let trimmed = self.identifier.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// `file://` URIs and absolute paths map to themselves; anything else is
    /// treated as the name of a bundled asset.
    pub fn resolve_path(&self, assets_dir: &Path) -> PathBuf {
        if let Some(rest) = self.identifier.strip_prefix("file://") {
            return PathBuf::from(rest);
        }
        let path = Path::new(&self.identifier);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            assets_dir.join(path)
        }
    }
}

/// Selects the on-disk file name suffix and the decode schema of a record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Note,
    PdfAnnotation,
    Highlight,
}

impl RecordKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            RecordKind::Note => "notes",
            RecordKind::PdfAnnotation => "annotations",
            RecordKind::Highlight => "highlights",
        }
    }

    pub fn file_name(&self, book_key: &str) -> String {
        format!("{}_{}.json", fingerprint(book_key), self.suffix())
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

pub trait Record: Serialize + DeserializeOwned {
    const KIND: RecordKind;
}

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    #[serde(rename = "timestamp", with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            created_at: now.trunc_subsecs(0),
        }
    }

    pub fn timestamp(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl Record for Note {
    const KIND: RecordKind = RecordKind::Note;
}

mod timestamp {
    use chrono::{DateTime, NaiveDateTime, TimeZone as _, Utc};
    use serde::{Deserialize as _, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    /// Writes use [`TIMESTAMP_FORMAT`]; reads accept any RFC 3339 value too.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map_err(serde::de::Error::custom)?;
        Ok(Utc.from_utc_datetime(&naive))
    }
}

/// A note pinned to a page position. `x` and `y` are fractions of the view
/// size at the moment of creation and are never re-normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfAnnotation {
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub text: String,
}

impl PdfAnnotation {
    pub fn from_tap(
        page: u32,
        tap: (f32, f32),
        view_size: (f32, f32),
        text: impl Into<String>,
    ) -> Self {
        let (view_w, view_h) = view_size;
        Self {
            page,
            x: normalize_axis(tap.0, view_w),
            y: normalize_axis(tap.1, view_h),
            text: text.into(),
        }
    }

    pub fn position_in(&self, page_width: f32, page_height: f32) -> (f32, f32) {
        (self.x * page_width, self.y * page_height)
    }
}

fn normalize_axis(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        0.0
    } else {
        (value / extent).clamp(0.0, 1.0)
    }
}

impl Record for PdfAnnotation {
    const KIND: RecordKind = RecordKind::PdfAnnotation;
}

/// Highlight object produced by the EPUB renderer. Stored and handed back
/// unchanged; only `bookId` is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Highlight(serde_json::Value);

impl Highlight {
    pub fn from_value(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn book_id(&self) -> Option<&str> {
        self.0.get("bookId").and_then(serde_json::Value::as_str)
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl Record for Highlight {
    const KIND: RecordKind = RecordKind::Highlight;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub assets_dir: Option<String>,
}

impl Settings {
    pub fn normalize(&mut self) {
        self.assets_dir = self
            .assets_dir
            .take()
            .map(|dir| dir.trim().to_string())
            .filter(|dir| !dir.is_empty());
    }
}

//! Test helpers and fixtures.

use std::path::{Path, PathBuf};

use marginalia_application::{AssetSource, EpubRenderer, PdfRenderer, RendererFactory};
use marginalia_core::{Highlight, Settings};
use marginalia_storage::{Prefs, RecordStore};
use tempfile::TempDir;

pub fn make_settings(assets_dir: &str) -> Settings {
    let mut settings = Settings {
        assets_dir: Some(assets_dir.to_string()),
    };
    settings.normalize();
    settings
}

/// A record store rooted in a fresh temp dir. Keep the guard alive for the
/// duration of the test.
pub fn temp_store() -> anyhow::Result<(TempDir, RecordStore)> {
    let dir = tempfile::tempdir()?;
    let store = RecordStore::new(dir.path().join("records"));
    Ok((dir, store))
}

pub fn memory_prefs() -> anyhow::Result<Prefs> {
    Prefs::open_in_memory()
}

#[derive(Debug, Clone, Default)]
pub struct StaticAssets(pub Vec<String>);

impl StaticAssets {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }
}

impl AssetSource for StaticAssets {
    fn list(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Default)]
pub struct FakePdf {
    pub opened: Option<PathBuf>,
    pub page: u32,
    pub size: (f32, f32),
    pub redraws: usize,
    pub fail_open: bool,
}

impl FakePdf {
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            size: (width, height),
            ..Self::default()
        }
    }
}

impl PdfRenderer for FakePdf {
    fn open(&mut self, source: &Path) -> anyhow::Result<()> {
        if self.fail_open {
            anyhow::bail!("cannot open {}", source.display());
        }
        self.opened = Some(source.to_path_buf());
        Ok(())
    }

    fn current_page(&self) -> u32 {
        self.page
    }

    fn view_size(&self) -> (f32, f32) {
        self.size
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
    }
}

#[derive(Debug, Default)]
pub struct FakeEpub {
    pub opened: Option<String>,
    pub highlights: Vec<Highlight>,
    /// Number of `set_highlights` calls made before `open_book`.
    pub primed_before_open: usize,
    set_calls: usize,
}

impl EpubRenderer for FakeEpub {
    fn set_highlights(&mut self, highlights: Vec<Highlight>) {
        self.highlights = highlights;
        self.set_calls += 1;
    }

    fn open_book(&mut self, identifier: &str) -> anyhow::Result<()> {
        self.primed_before_open = self.set_calls;
        self.opened = Some(identifier.to_string());
        Ok(())
    }
}

/// Hands out fake renderers; PDF views share one view size.
#[derive(Debug, Clone, Copy)]
pub struct FakeRenderers {
    pub pdf_size: (f32, f32),
    pub fail_pdf_open: bool,
}

impl Default for FakeRenderers {
    fn default() -> Self {
        Self {
            pdf_size: (1000.0, 2000.0),
            fail_pdf_open: false,
        }
    }
}

impl RendererFactory for FakeRenderers {
    type Epub = FakeEpub;
    type Pdf = FakePdf;

    fn epub(&mut self) -> FakeEpub {
        FakeEpub::default()
    }

    fn pdf(&mut self) -> FakePdf {
        FakePdf {
            fail_open: self.fail_pdf_open,
            ..FakePdf::sized(self.pdf_size.0, self.pdf_size.1)
        }
    }
}

pub fn highlight(book_id: &str, content: &str) -> Highlight {
    Highlight::from_value(serde_json::json!({
        "bookId": book_id,
        "content": content,
        "type": "highlight_yellow",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_settings() {
        let settings = make_settings("  /books  ");
        assert_eq!(settings.assets_dir.as_deref(), Some("/books"));
        assert_eq!(make_settings("   ").assets_dir, None);
    }

    #[test]
    fn fake_epub_tracks_priming() -> anyhow::Result<()> {
        let mut epub = FakeEpub::default();
        epub.set_highlights(vec![highlight("a.epub", "x")]);
        epub.open_book("a.epub")?;
        assert_eq!(epub.primed_before_open, 1);
        assert_eq!(epub.opened.as_deref(), Some("a.epub"));
        Ok(())
    }
}

//! Document engines behind the terminal renderers: PDF page geometry and EPUB
//! chapter text.

use std::path::Path;

use anyhow::Context as _;
use epub::doc::EpubDoc;
use pdf::file::FileOptions;

/// US Letter, used when a page box cannot be read.
const FALLBACK_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Terminal cells are roughly twice as tall as they are wide.
pub const CELL_ASPECT: f32 = 2.0;

const CHAPTER_WRAP_WIDTH: usize = 80;

#[derive(Debug, Clone)]
pub struct PdfDocument {
    page_sizes: Vec<(f32, f32)>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = FileOptions::cached()
            .open(path)
            .with_context(|| format!("open pdf {}", path.display()))?;

        let mut page_sizes = Vec::new();
        for page_index in 0..file.num_pages() {
            let size = file
                .get_page(page_index)
                .map_err(|err| anyhow::anyhow!(err))
                .and_then(|page| page.crop_box().map_err(|err| anyhow::anyhow!(err)))
                .map(|rect| {
                    let width = (rect.right - rect.left).abs().max(1.0);
                    let height = (rect.top - rect.bottom).abs().max(1.0);
                    (width, height)
                });
            match size {
                Ok(size) => page_sizes.push(size),
                Err(err) => {
                    tracing::debug!(page_index, error = %err, "page box unreadable, using letter size");
                    page_sizes.push(FALLBACK_PAGE_SIZE);
                }
            }
        }

        tracing::debug!(path = %path.display(), pages = page_sizes.len(), "opened pdf");
        Ok(Self { page_sizes })
    }

    pub fn page_count(&self) -> u32 {
        u32::try_from(self.page_sizes.len()).unwrap_or(u32::MAX)
    }

    pub fn page_size_points(&self, page_index: u32) -> (f32, f32) {
        usize::try_from(page_index)
            .ok()
            .and_then(|i| self.page_sizes.get(i).copied())
            .unwrap_or(FALLBACK_PAGE_SIZE)
    }
}

/// Largest `(columns, rows)` box with the page's aspect ratio that fits in
/// `available` terminal cells.
pub fn fit_page_cells(page_points: (f32, f32), available: (u16, u16)) -> (u16, u16) {
    let (avail_w, avail_h) = available;
    if avail_w == 0 || avail_h == 0 {
        return (0, 0);
    }
    let (page_w, page_h) = page_points;
    let ratio = if page_w > 0.0 { page_h / page_w } else { 1.0 };

    let rows_for_full_width = (avail_w as f32 * ratio / CELL_ASPECT).round();
    if rows_for_full_width <= avail_h as f32 {
        return (avail_w, (rows_for_full_width as u16).max(1));
    }
    let cols_for_full_height = (avail_h as f32 * CELL_ASPECT / ratio).round();
    ((cols_for_full_height as u16).clamp(1, avail_w), avail_h)
}

#[derive(Debug, Clone)]
pub struct EpubBook {
    chapters: Vec<String>,
}

impl EpubBook {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let mut doc = EpubDoc::new(path)
            .with_context(|| format!("open epub {}", path.display()))?;

        let mut chapters = Vec::new();
        loop {
            if let Some((chapter, _mime)) = doc.get_current_str() {
                let plain = html2text::from_read(chapter.as_bytes(), CHAPTER_WRAP_WIDTH);
                let plain = collapse_blank_lines(&plain);
                if !plain.trim().is_empty() {
                    chapters.push(plain);
                }
            }
            if !doc.go_next() {
                break;
            }
        }

        if chapters.is_empty() {
            chapters.push("No textual content found in this EPUB.".to_string());
        }
        tracing::debug!(path = %path.display(), chapters = chapters.len(), "opened epub");
        Ok(Self { chapters })
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn chapter(&self, index: usize) -> Option<&str> {
        self.chapters.get(index).map(String::as_str)
    }
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_matches('\n').to_string()
}

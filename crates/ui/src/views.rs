//! Terminal renderers handed to the application flows.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use marginalia_application::{EpubRenderer, PdfRenderer, RendererFactory};
use marginalia_core::{BookRef, Highlight};
use marginalia_engine::{EpubBook, PdfDocument, fit_page_cells};
use ratatui::layout::Rect;

/// Paginated PDF view measured in terminal cells. Tap coordinates and the view
/// size share that unit.
#[derive(Debug, Default)]
pub struct TerminalPdfView {
    document: Option<PdfDocument>,
    page: u32,
    page_area: Rect,
    cursor: (u16, u16),
    dirty: bool,
}

impl TerminalPdfView {
    pub fn page_count(&self) -> u32 {
        self.document.as_ref().map_or(0, PdfDocument::page_count)
    }

    pub fn next_page(&mut self) {
        if self.page + 1 < self.page_count() {
            self.page += 1;
            self.dirty = true;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 0 {
            self.page -= 1;
            self.dirty = true;
        }
    }

    /// Places the current page inside `available`, centered, and remembers
    /// the result as the view area.
    pub fn layout(&mut self, available: Rect) -> Rect {
        let points = self
            .document
            .as_ref()
            .map_or((612.0, 792.0), |doc| doc.page_size_points(self.page));
        let (cols, rows) = fit_page_cells(points, (available.width, available.height));
        let x = available.x + (available.width - cols) / 2;
        let y = available.y + (available.height - rows) / 2;
        self.page_area = Rect::new(x, y, cols, rows);
        self.cursor = (
            self.cursor.0.min(cols.saturating_sub(1)),
            self.cursor.1.min(rows.saturating_sub(1)),
        );
        self.page_area
    }

    pub fn page_area(&self) -> Rect {
        self.page_area
    }

    pub fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let max_x = i32::from(self.page_area.width.saturating_sub(1));
        let max_y = i32::from(self.page_area.height.saturating_sub(1));
        let x = (i32::from(self.cursor.0) + dx).clamp(0, max_x);
        let y = (i32::from(self.cursor.1) + dy).clamp(0, max_y);
        self.cursor = (x as u16, y as u16);
    }

    /// Cell center relative to the page area, for a tap at the cursor.
    pub fn cursor_tap(&self) -> (f32, f32) {
        (f32::from(self.cursor.0) + 0.5, f32::from(self.cursor.1) + 0.5)
    }

    /// Cell center relative to the page area, or `None` outside the page.
    pub fn screen_tap(&self, column: u16, row: u16) -> Option<(f32, f32)> {
        let area = self.page_area;
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        inside.then(|| {
            (
                f32::from(column - area.x) + 0.5,
                f32::from(row - area.y) + 0.5,
            )
        })
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl PdfRenderer for TerminalPdfView {
    fn open(&mut self, source: &Path) -> anyhow::Result<()> {
        self.document = Some(PdfDocument::open(source)?);
        self.page = 0;
        self.dirty = true;
        Ok(())
    }

    fn current_page(&self) -> u32 {
        self.page
    }

    fn view_size(&self) -> (f32, f32) {
        (
            f32::from(self.page_area.width),
            f32::from(self.page_area.height),
        )
    }

    fn request_redraw(&mut self) {
        self.dirty = true;
    }
}

#[derive(Debug)]
pub struct TerminalEpubView {
    assets_dir: PathBuf,
    identifier: String,
    book: Option<EpubBook>,
    chapter: usize,
    scroll: u16,
    highlights: Vec<Highlight>,
}

impl TerminalEpubView {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            identifier: String::new(),
            book: None,
            chapter: 0,
            scroll: 0,
            highlights: Vec::new(),
        }
    }

    pub fn chapter_text(&self) -> &str {
        self.book
            .as_ref()
            .and_then(|book| book.chapter(self.chapter))
            .unwrap_or("")
    }

    pub fn chapter(&self) -> usize {
        self.chapter
    }

    pub fn chapter_count(&self) -> usize {
        self.book.as_ref().map_or(0, EpubBook::chapter_count)
    }

    pub fn next_chapter(&mut self) {
        if self.chapter + 1 < self.chapter_count() {
            self.chapter += 1;
            self.scroll = 0;
        }
    }

    pub fn prev_chapter(&mut self) {
        if self.chapter > 0 {
            self.chapter -= 1;
            self.scroll = 0;
        }
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn scroll_by(&mut self, delta: i32) {
        self.scroll = (i32::from(self.scroll) + delta).clamp(0, i32::from(u16::MAX)) as u16;
    }

    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    /// Highlight object in the shape the reader stores for selected text.
    pub fn highlight(&self, content: &str, now: DateTime<Utc>) -> Highlight {
        Highlight::from_value(serde_json::json!({
            "bookId": self.identifier,
            "content": content,
            "date": now.to_rfc3339(),
            "type": "highlight_yellow",
            "pageNumber": self.chapter,
        }))
    }
}

impl EpubRenderer for TerminalEpubView {
    fn set_highlights(&mut self, highlights: Vec<Highlight>) {
        self.highlights = highlights;
    }

    fn open_book(&mut self, identifier: &str) -> anyhow::Result<()> {
        let path = BookRef::new(identifier).resolve_path(&self.assets_dir);
        self.book = Some(EpubBook::open(&path)?);
        self.identifier = identifier.to_string();
        self.chapter = 0;
        self.scroll = 0;
        Ok(())
    }
}

pub struct TerminalRenderers {
    assets_dir: PathBuf,
}

impl TerminalRenderers {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }
}

impl RendererFactory for TerminalRenderers {
    type Epub = TerminalEpubView;
    type Pdf = TerminalPdfView;

    fn epub(&mut self) -> TerminalEpubView {
        TerminalEpubView::new(&self.assets_dir)
    }

    fn pdf(&mut self) -> TerminalPdfView {
        TerminalPdfView::default()
    }
}

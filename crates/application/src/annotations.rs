//! Spatial PDF annotations placed by tapping while annotation mode is on.

use std::path::Path;

use anyhow::Context as _;
use marginalia_core::PdfAnnotation;
use marginalia_storage::{Loaded, RecordStore};

use crate::notice::{Notice, Subject};
use crate::renderer::PdfRenderer;

/// A tap waiting for its annotation text.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTap {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

/// An annotation positioned on the page being drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayMark<'a> {
    pub x: f32,
    pub y: f32,
    pub text: &'a str,
}

pub struct AnnotationFlow<R> {
    store: RecordStore,
    book_key: String,
    renderer: R,
    annotations: Vec<PdfAnnotation>,
    annotation_mode: bool,
    pending: Option<PendingTap>,
    notices: Vec<Notice>,
}

impl<R: PdfRenderer> AnnotationFlow<R> {
    /// Loads the stored annotations for `book_key` and opens `source` in the
    /// renderer.
    pub fn open(
        store: RecordStore,
        book_key: impl Into<String>,
        source: &Path,
        mut renderer: R,
    ) -> anyhow::Result<Self> {
        let book_key = book_key.into();
        renderer
            .open(source)
            .with_context(|| format!("open pdf {}", source.display()))?;
        let mut flow = Self {
            store,
            book_key,
            renderer,
            annotations: Vec::new(),
            annotation_mode: false,
            pending: None,
            notices: Vec::new(),
        };
        flow.reload();
        Ok(flow)
    }

    pub fn reload(&mut self) {
        let Loaded { records, warning } = self.store.load::<PdfAnnotation>(&self.book_key);
        self.annotations = records;
        if warning.is_some() {
            self.notices.push(Notice::LoadFailed(Subject::Annotations));
        }
    }

    pub fn book_key(&self) -> &str {
        &self.book_key
    }

    pub fn annotations(&self) -> &[PdfAnnotation] {
        &self.annotations
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn annotation_mode(&self) -> bool {
        self.annotation_mode
    }

    pub fn toggle_annotation_mode(&mut self) -> bool {
        self.annotation_mode = !self.annotation_mode;
        self.notices.push(if self.annotation_mode {
            Notice::AnnotationModeEnabled
        } else {
            Notice::AnnotationModeDisabled
        });
        self.annotation_mode
    }

    /// Marks for the page being drawn, scaled to its pixel size.
    pub fn overlay(
        &self,
        page_width: f32,
        page_height: f32,
        page_index: u32,
    ) -> impl Iterator<Item = OverlayMark<'_>> {
        self.annotations
            .iter()
            .filter(move |a| a.page == page_index)
            .map(move |a| {
                let (x, y) = a.position_in(page_width, page_height);
                OverlayMark {
                    x,
                    y,
                    text: a.text.as_str(),
                }
            })
    }

    /// Returns whether the tap was consumed. Outside annotation mode the
    /// renderer keeps its own tap behavior.
    pub fn on_tap(&mut self, x: f32, y: f32) -> bool {
        if !self.annotation_mode {
            return false;
        }
        self.pending = Some(PendingTap {
            x,
            y,
            text: String::new(),
        });
        true
    }

    pub fn pending(&self) -> Option<&PendingTap> {
        self.pending.as_ref()
    }

    pub fn pending_text_mut(&mut self) -> Option<&mut String> {
        self.pending.as_mut().map(|p| &mut p.text)
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// Stores the pending tap on the renderer's current page, normalized by
    /// the current view size. Blank text discards the tap.
    pub fn confirm_pending(&mut self) -> Option<&PdfAnnotation> {
        let pending = self.pending.take()?;
        if pending.text.trim().is_empty() {
            return None;
        }

        let annotation = PdfAnnotation::from_tap(
            self.renderer.current_page(),
            (pending.x, pending.y),
            self.renderer.view_size(),
            pending.text,
        );
        self.annotations.push(annotation);

        match self.store.save(&self.book_key, &self.annotations) {
            Ok(()) => tracing::info!(
                book = %self.book_key,
                count = self.annotations.len(),
                "annotation added"
            ),
            Err(err) => {
                tracing::warn!(book = %self.book_key, error = %err, "annotation kept in memory only");
                self.notices.push(Notice::SaveFailed(Subject::Annotations));
            }
        }
        self.renderer.request_redraw();
        self.annotations.last()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Debug, Default)]
    struct FakeView {
        opened: Option<PathBuf>,
        page: u32,
        size: (f32, f32),
        redraws: usize,
    }

    impl PdfRenderer for FakeView {
        fn open(&mut self, source: &Path) -> anyhow::Result<()> {
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

    fn flow(dir: &Path) -> anyhow::Result<AnnotationFlow<FakeView>> {
        let view = FakeView {
            size: (400.0, 800.0),
            ..FakeView::default()
        };
        AnnotationFlow::open(RecordStore::new(dir), "doc.pdf", Path::new("/b/doc.pdf"), view)
    }

    fn place(flow: &mut AnnotationFlow<FakeView>, x: f32, y: f32, text: &str) -> bool {
        if !flow.on_tap(x, y) {
            return false;
        }
        flow.pending_text_mut().expect("pending").push_str(text);
        flow.confirm_pending().is_some()
    }

    #[test]
    fn open_hands_source_to_renderer() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let flow = flow(dir.path())?;
        assert_eq!(flow.renderer().opened.as_deref(), Some(Path::new("/b/doc.pdf")));
        assert!(!flow.annotation_mode());
        Ok(())
    }

    #[test]
    fn taps_outside_annotation_mode_are_ignored() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut flow = flow(dir.path())?;
        assert!(!place(&mut flow, 10.0, 10.0, "nope"));
        assert!(flow.pending().is_none());

        let store = RecordStore::new(dir.path());
        assert!(store.load::<PdfAnnotation>("doc.pdf").records.is_empty());
        Ok(())
    }

    #[test]
    fn toggling_emits_notices() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut flow = flow(dir.path())?;
        assert!(flow.toggle_annotation_mode());
        assert!(!flow.toggle_annotation_mode());
        assert_eq!(
            flow.take_notices(),
            vec![Notice::AnnotationModeEnabled, Notice::AnnotationModeDisabled]
        );
        Ok(())
    }

    #[test]
    fn placed_annotation_is_normalized_and_persisted() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut flow = flow(dir.path())?;
        flow.toggle_annotation_mode();
        flow.renderer_mut().page = 2;

        assert!(place(&mut flow, 100.0, 200.0, "margin"));
        assert_eq!(flow.renderer().redraws, 1);

        let stored = RecordStore::new(dir.path())
            .load::<PdfAnnotation>("doc.pdf")
            .into_records();
        assert_eq!(
            stored,
            vec![PdfAnnotation {
                page: 2,
                x: 0.25,
                y: 0.25,
                text: "margin".to_string(),
            }]
        );
        Ok(())
    }

    #[test]
    fn confirm_reads_page_and_size_at_confirmation() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut flow = flow(dir.path())?;
        flow.toggle_annotation_mode();
        assert!(flow.on_tap(100.0, 100.0));
        flow.renderer_mut().page = 5;
        flow.renderer_mut().size = (200.0, 200.0);
        flow.pending_text_mut().expect("pending").push_str("late");

        let placed = flow.confirm_pending().cloned().expect("placed");
        assert_eq!((placed.page, placed.x, placed.y), (5, 0.5, 0.5));
        Ok(())
    }

    #[test]
    fn blank_or_cancelled_text_stores_nothing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut flow = flow(dir.path())?;
        flow.toggle_annotation_mode();
        assert!(!place(&mut flow, 1.0, 1.0, "  "));

        assert!(flow.on_tap(1.0, 1.0));
        flow.cancel_pending();
        assert!(flow.confirm_pending().is_none());
        assert!(flow.annotations().is_empty());
        assert_eq!(flow.renderer().redraws, 0);
        Ok(())
    }

    #[test]
    fn overlay_draws_only_current_page() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        RecordStore::new(dir.path()).save(
            "doc.pdf",
            &[
                PdfAnnotation {
                    page: 2,
                    x: 0.5,
                    y: 0.1,
                    text: "two".to_string(),
                },
                PdfAnnotation {
                    page: 1,
                    x: 0.0,
                    y: 0.0,
                    text: "one".to_string(),
                },
            ],
        )?;
        let flow = flow(dir.path())?;

        let marks: Vec<OverlayMark<'_>> = flow.overlay(600.0, 1000.0, 2).collect();
        assert_eq!(
            marks,
            vec![OverlayMark {
                x: 300.0,
                y: 100.0,
                text: "two"
            }]
        );
        assert_eq!(flow.overlay(600.0, 1000.0, 3).count(), 0);
        assert_eq!(flow.overlay(600.0, 1000.0, 1).count(), 1);
        Ok(())
    }
}

use std::path::Path;

use marginalia_core::Highlight;

/// EPUB rendering collaborator. Highlight creation is reported back through
/// [`crate::EpubSession::on_highlight_created`].
pub trait EpubRenderer {
    fn set_highlights(&mut self, highlights: Vec<Highlight>);
    fn open_book(&mut self, identifier: &str) -> anyhow::Result<()>;
}

/// Paginated PDF view. The view calls back into
/// [`crate::AnnotationFlow::overlay`] while drawing a page and into
/// [`crate::AnnotationFlow::on_tap`] on taps.
pub trait PdfRenderer {
    fn open(&mut self, source: &Path) -> anyhow::Result<()>;
    fn current_page(&self) -> u32;
    /// View size in the same units as tap coordinates.
    fn view_size(&self) -> (f32, f32);
    fn request_redraw(&mut self);
}

//! EPUB reading session: hands stored highlights to the renderer and persists
//! the ones it reports back.

use anyhow::Context as _;
use marginalia_core::Highlight;
use marginalia_storage::{Appended, Loaded, RecordStore};

use crate::notice::{Notice, Subject};
use crate::renderer::EpubRenderer;

pub struct EpubSession<R> {
    store: RecordStore,
    identifier: String,
    renderer: R,
    notices: Vec<Notice>,
}

impl<R: EpubRenderer> EpubSession<R> {
    pub fn open(
        store: RecordStore,
        identifier: impl Into<String>,
        mut renderer: R,
    ) -> anyhow::Result<Self> {
        let identifier = identifier.into();
        let mut notices = Vec::new();

        let Loaded { records, warning } = store.load::<Highlight>(&identifier);
        if warning.is_some() {
            notices.push(Notice::LoadFailed(Subject::Highlights));
        }
        tracing::info!(book = %identifier, highlights = records.len(), "opening epub");
        renderer.set_highlights(records);
        renderer
            .open_book(&identifier)
            .with_context(|| format!("open epub {identifier}"))?;

        Ok(Self {
            store,
            identifier,
            renderer,
            notices,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn highlights(&self) -> Vec<Highlight> {
        self.store.load(&self.identifier).into_records()
    }

    /// Hands the renderer the highlights currently on disk.
    pub fn reload_highlights(&mut self) {
        let Loaded { records, warning } = self.store.load::<Highlight>(&self.identifier);
        if warning.is_some() {
            self.notices.push(Notice::LoadFailed(Subject::Highlights));
        }
        self.renderer.set_highlights(records);
    }

    /// Appends the highlight to the list stored under its own `bookId`, or
    /// under the session identifier when the renderer left it out.
    pub fn on_highlight_created(&mut self, highlight: Highlight) {
        let key = highlight
            .book_id()
            .unwrap_or(self.identifier.as_str())
            .to_string();
        let Appended {
            records,
            load_warning,
            save_error,
        } = self.store.append(&key, highlight);
        if load_warning.is_some() {
            self.notices.push(Notice::LoadFailed(Subject::Highlights));
        }
        if save_error.is_some() {
            self.notices.push(Notice::SaveFailed(Subject::Highlights));
        }
        if key == self.identifier {
            self.renderer.set_highlights(records);
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

//! Per-book note list: `Listing -> Adding -> Listing`.

use chrono::{DateTime, Utc};
use marginalia_core::Note;
use marginalia_storage::{Appended, Loaded, RecordStore, StoreError};

use crate::mindmap;
use crate::notice::Notice;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesState {
    Listing,
    Adding { input: String },
}

#[derive(Debug)]
pub struct NotesFlow {
    store: RecordStore,
    book_key: String,
    state: NotesState,
    notes: Vec<Note>,
    notices: Vec<Notice>,
}

impl NotesFlow {
    /// Creates the flow already in `Listing`, loaded from storage.
    pub fn new(store: RecordStore, book_key: impl Into<String>) -> Self {
        let mut flow = Self {
            store,
            book_key: book_key.into(),
            state: NotesState::Listing,
            notes: Vec::new(),
            notices: Vec::new(),
        };
        flow.enter();
        flow
    }

    /// (Re)enters `Listing`, always reloading from storage.
    pub fn enter(&mut self) {
        self.state = NotesState::Listing;
        let Loaded { records, warning } = self.store.load::<Note>(&self.book_key);
        self.notes = records;
        self.warn_load(warning);
    }

    pub fn book_key(&self) -> &str {
        &self.book_key
    }

    pub fn state(&self) -> &NotesState {
        &self.state
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn begin_add(&mut self) {
        self.state = NotesState::Adding {
            input: String::new(),
        };
    }

    pub fn input_mut(&mut self) -> Option<&mut String> {
        match &mut self.state {
            NotesState::Adding { input } => Some(input),
            NotesState::Listing => None,
        }
    }

    pub fn cancel_add(&mut self) {
        self.enter();
    }

    pub fn submit(&mut self) -> bool {
        self.submit_at(Utc::now())
    }

    /// Stores the typed note stamped with `now` and returns to `Listing`.
    /// Blank input stays in `Adding` and queues [`Notice::NoteEmpty`].
    pub fn submit_at(&mut self, now: DateTime<Utc>) -> bool {
        let NotesState::Adding { input } = &self.state else {
            return false;
        };
        if input.trim().is_empty() {
            self.notices.push(Notice::NoteEmpty);
            return false;
        }

        let note = Note::new(input.clone(), now);
        let Appended {
            records,
            load_warning,
            save_error,
        } = self.store.append(&self.book_key, note);
        self.warn_load(load_warning);

        match save_error {
            Some(err) => {
                tracing::warn!(book = %self.book_key, error = %err, "note kept in memory only");
                self.notices.push(Notice::SaveFailed(err.kind().into()));
                self.state = NotesState::Listing;
                self.notes = records;
            }
            None => {
                tracing::info!(book = %self.book_key, count = records.len(), "note added");
                self.enter();
            }
        }
        true
    }

    /// All note texts, newline-joined, verbatim.
    pub fn summary(&self) -> String {
        self.notes
            .iter()
            .map(|note| note.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full mind-map page for the current notes.
    pub fn mind_map(&self, script_src: &str) -> String {
        mindmap::render_page(&self.book_key, &self.notes, script_src)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn warn_load(&mut self, warning: Option<StoreError>) {
        if let Some(err) = warning {
            self.notices.push(Notice::LoadFailed(err.kind().into()));
        }
    }
}

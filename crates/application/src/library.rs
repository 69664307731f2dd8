//! Book list plus open dispatch by format.

use std::path::{Path, PathBuf};

use marginalia_core::{BookFormat, BookRef};
use marginalia_storage::RecordStore;

use crate::annotations::AnnotationFlow;
use crate::catalog::{AssetSource, Catalog};
use crate::epub::EpubSession;
use crate::notes::NotesFlow;
use crate::notice::Notice;
use crate::renderer::{EpubRenderer, PdfRenderer};

/// Builds a fresh renderer for each opened book.
pub trait RendererFactory {
    type Epub: EpubRenderer;
    type Pdf: PdfRenderer;

    fn epub(&mut self) -> Self::Epub;
    fn pdf(&mut self) -> Self::Pdf;
}

pub enum Opened<E, P> {
    Epub(EpubSession<E>),
    Pdf(AnnotationFlow<P>),
}

pub struct Library<A> {
    catalog: Catalog<A>,
    store: RecordStore,
    assets_dir: PathBuf,
    books: Vec<BookRef>,
    notices: Vec<Notice>,
}

impl<A: AssetSource> Library<A> {
    pub fn new(catalog: Catalog<A>, store: RecordStore, assets_dir: impl Into<PathBuf>) -> Self {
        let mut library = Self {
            catalog,
            store,
            assets_dir: assets_dir.into(),
            books: Vec::new(),
            notices: Vec::new(),
        };
        library.refresh();
        library
    }

    pub fn refresh(&mut self) -> &[BookRef] {
        self.books = self.catalog.list_available_books();
        &self.books
    }

    pub fn books(&self) -> &[BookRef] {
        &self.books
    }

    pub fn catalog(&self) -> &Catalog<A> {
        &self.catalog
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Opens the book and, once it is open, records it as recently opened.
    pub fn open_from_picker<F: RendererFactory>(
        &mut self,
        book: BookRef,
        factory: &mut F,
    ) -> Option<Opened<F::Epub, F::Pdf>> {
        let opened = self.open_listed(&book, factory)?;
        self.catalog.record_opened(book);
        self.refresh();
        Some(opened)
    }

    /// Opens a book already in the list; the recent list is left alone.
    pub fn open_listed<F: RendererFactory>(
        &mut self,
        book: &BookRef,
        factory: &mut F,
    ) -> Option<Opened<F::Epub, F::Pdf>> {
        let Some(format) = book.format() else {
            self.notices
                .push(Notice::UnsupportedFormat(book.identifier.clone()));
            return None;
        };

        let opened = match format {
            BookFormat::Epub => {
                EpubSession::open(self.store.clone(), book.identifier.clone(), factory.epub())
                    .map(Opened::Epub)
            }
            BookFormat::Pdf => {
                let source = book.resolve_path(&self.assets_dir);
                AnnotationFlow::open(
                    self.store.clone(),
                    book.identifier.clone(),
                    &source,
                    factory.pdf(),
                )
                .map(Opened::Pdf)
            }
        };

        match opened {
            Ok(opened) => Some(opened),
            Err(err) => {
                tracing::warn!(book = %book.identifier, error = ?err, "open failed");
                self.notices
                    .push(Notice::OpenFailed(book.identifier.clone()));
                None
            }
        }
    }

    pub fn notes_flow(&self, book: &BookRef) -> NotesFlow {
        NotesFlow::new(self.store.clone(), book.identifier.clone())
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        let mut notices = self.catalog.take_notices();
        notices.append(&mut self.notices);
        notices
    }
}

//! Book list: recently opened books followed by bundled assets.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::Context as _;
use marginalia_core::{BookFormat, BookRef};
use marginalia_storage::Prefs;

use crate::notice::{Notice, Subject};

pub const PREFS_NAME: &str = "EBookReaderPrefs";
pub const RECENT_BOOKS_KEY: &str = "RecentBooks";
pub const MAX_RECENT_BOOKS: usize = 10;

pub trait AssetSource {
    /// Names of bundled books with a supported extension.
    fn list(&self) -> anyhow::Result<Vec<String>>;
}

/// Bundled books read from a directory. A missing directory lists nothing.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirAssets {
    fn list(&self) -> anyhow::Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read assets dir {}", self.root.display()));
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if BookFormat::from_identifier(&name).is_some() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Most-recent-first, capped at [`MAX_RECENT_BOOKS`], no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentBooks {
    books: Vec<BookRef>,
}

impl RecentBooks {
    pub fn new(books: Vec<BookRef>) -> Self {
        Self { books }
    }

    pub fn books(&self) -> &[BookRef] {
        &self.books
    }

    /// Returns `false` when the book is already listed. Known books keep their
    /// position; they are not moved to the front.
    pub fn record_opened(&mut self, book: BookRef) -> bool {
        if self.books.contains(&book) {
            return false;
        }
        self.books.insert(0, book);
        self.books.truncate(MAX_RECENT_BOOKS);
        true
    }
}

/// Concatenates both lists and keeps the first occurrence of each identifier.
pub fn merge_available(
    recent: &[BookRef],
    assets: impl IntoIterator<Item = BookRef>,
) -> Vec<BookRef> {
    let mut seen = HashSet::new();
    recent
        .iter()
        .cloned()
        .chain(assets)
        .filter(|book| seen.insert(book.identifier.clone()))
        .collect()
}

pub struct Catalog<A> {
    prefs: Prefs,
    assets: A,
    recent: RecentBooks,
    notices: Vec<Notice>,
}

impl<A: AssetSource> Catalog<A> {
    pub fn load(prefs: Prefs, assets: A) -> Self {
        let mut notices = Vec::new();
        let recent = match read_recent(&prefs) {
            Ok(books) => RecentBooks::new(books),
            Err(err) => {
                tracing::warn!(error = ?err, "recent books unreadable, starting empty");
                notices.push(Notice::LoadFailed(Subject::RecentBooks));
                RecentBooks::default()
            }
        };
        Self {
            prefs,
            assets,
            recent,
            notices,
        }
    }

    pub fn prefs(&self) -> &Prefs {
        &self.prefs
    }

    pub fn recent(&self) -> &RecentBooks {
        &self.recent
    }

    pub fn list_available_books(&mut self) -> Vec<BookRef> {
        let assets = match self.assets.list() {
            Ok(names) => names,
            Err(err) => {
                tracing::warn!(error = ?err, "asset listing failed");
                self.notices.push(Notice::AssetsUnavailable);
                Vec::new()
            }
        };
        merge_available(self.recent.books(), assets.into_iter().map(BookRef::new))
    }

    pub fn record_opened(&mut self, book: BookRef) {
        if !self.recent.record_opened(book) {
            return;
        }
        if let Err(err) = write_recent(&self.prefs, self.recent.books()) {
            tracing::warn!(error = ?err, "failed to persist recent books");
            self.notices.push(Notice::SaveFailed(Subject::RecentBooks));
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

fn read_recent(prefs: &Prefs) -> anyhow::Result<Vec<BookRef>> {
    let Some(json) = prefs.get_string(PREFS_NAME, RECENT_BOOKS_KEY)? else {
        return Ok(Vec::new());
    };
    let books = serde_json::from_str(&json).context("decode recent books")?;
    Ok(books)
}

fn write_recent(prefs: &Prefs, books: &[BookRef]) -> anyhow::Result<()> {
    let json = serde_json::to_string(books)?;
    prefs.put_string(PREFS_NAME, RECENT_BOOKS_KEY, &json)
}

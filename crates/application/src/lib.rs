//! Application orchestration layer for Marginalia.

pub mod annotations;
pub mod catalog;
pub mod epub;
pub mod library;
pub mod mindmap;
pub mod notes;
mod notice;
mod renderer;

pub use annotations::{AnnotationFlow, OverlayMark, PendingTap};
pub use catalog::{AssetSource, Catalog, DirAssets, MAX_RECENT_BOOKS, RecentBooks};
pub use epub::EpubSession;
pub use library::{Library, Opened, RendererFactory};
pub use notes::{NotesFlow, NotesState};
pub use notice::{Notice, Subject};
pub use renderer::{EpubRenderer, PdfRenderer};

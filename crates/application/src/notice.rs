use marginalia_core::RecordKind;

/// What a load or save notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Notes,
    Annotations,
    Highlights,
    RecentBooks,
}

impl From<RecordKind> for Subject {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Note => Subject::Notes,
            RecordKind::PdfAnnotation => Subject::Annotations,
            RecordKind::Highlight => Subject::Highlights,
        }
    }
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Notes => "notes",
            Subject::Annotations => "annotations",
            Subject::Highlights => "highlights",
            Subject::RecentBooks => "recent books",
        }
    }
}

/// Transient user-facing signal. Flows queue these; the front end shows and
/// drops them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    AnnotationModeEnabled,
    AnnotationModeDisabled,
    LoadFailed(Subject),
    SaveFailed(Subject),
    NoteEmpty,
    AssetsUnavailable,
    UnsupportedFormat(String),
    OpenFailed(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            Notice::AnnotationModeEnabled | Notice::AnnotationModeDisabled
        )
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::AnnotationModeEnabled => f.write_str("Annotation mode enabled"),
            Notice::AnnotationModeDisabled => f.write_str("Annotation mode disabled"),
            Notice::LoadFailed(subject) => write!(f, "Error loading {}", subject.as_str()),
            Notice::SaveFailed(subject) => write!(f, "Error saving {}", subject.as_str()),
            Notice::NoteEmpty => f.write_str("Note cannot be empty"),
            Notice::AssetsUnavailable => f.write_str("Bundled books are unavailable"),
            Notice::UnsupportedFormat(id) => write!(f, "Unsupported book format: {id}"),
            Notice::OpenFailed(id) => write!(f, "Could not open {id}"),
        }
    }
}

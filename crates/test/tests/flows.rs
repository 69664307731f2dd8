use std::fs;

use chrono::{TimeZone as _, Utc};
use marginalia_application::{
    AnnotationFlow, Catalog, EpubSession, Library, MAX_RECENT_BOOKS, Notice, Opened, Subject,
};
use marginalia_core::{BookRef, Highlight, Note, PdfAnnotation, RecordKind, fingerprint};
use marginalia_test::{
    FakeEpub, FakePdf, FakeRenderers, StaticAssets, highlight, memory_prefs, temp_store,
};

fn ids(books: &[BookRef]) -> Vec<&str> {
    books.iter().map(|b| b.identifier.as_str()).collect()
}

fn library(assets: &[&str]) -> anyhow::Result<(tempfile::TempDir, Library<StaticAssets>)> {
    let (dir, store) = temp_store()?;
    let catalog = Catalog::load(memory_prefs()?, StaticAssets::new(assets.iter().copied()));
    let assets_dir = dir.path().join("assets");
    Ok((dir, Library::new(catalog, store, assets_dir)))
}

#[test]
fn notes_are_appended_and_written_in_the_documented_shape() -> anyhow::Result<()> {
    let (_dir, library) = library(&[])?;
    let book = BookRef::new("content://books/1");
    let mut flow = library.notes_flow(&book);
    assert!(flow.notes().is_empty());
    assert!(flow.take_notices().is_empty());

    for (text, second) in [("first", 1), ("second", 2)] {
        flow.begin_add();
        if let Some(input) = flow.input_mut() {
            input.push_str(text);
        }
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 8, 30, second).unwrap();
        assert!(flow.submit_at(now));
    }

    let texts: Vec<&str> = flow.notes().iter().map(|n| n.text.as_str()).collect();
    assert_eq!(texts, ["first", "second"]);
    assert_eq!(flow.summary(), "first\nsecond");

    let path = library.store().path_for(RecordKind::Note, &book.identifier);
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some(format!("{}_notes.json", fingerprint(&book.identifier)).as_str())
    );
    let raw: serde_json::Value = serde_json::from_slice(&fs::read(&path)?)?;
    assert_eq!(raw[1]["text"], "second");
    assert_eq!(raw[1]["timestamp"], "2024-03-09T08:30:02Z");

    // A second flow for the same book sees what the first one stored.
    let reopened = library.notes_flow(&book);
    assert_eq!(reopened.notes().len(), 2);
    Ok(())
}

#[test]
fn blank_note_is_rejected_without_writing() -> anyhow::Result<()> {
    let (_dir, library) = library(&[])?;
    let book = BookRef::new("a.epub");
    let mut flow = library.notes_flow(&book);
    flow.begin_add();
    if let Some(input) = flow.input_mut() {
        input.push_str("   ");
    }
    assert!(!flow.submit());
    assert_eq!(flow.take_notices(), vec![Notice::NoteEmpty]);

    flow.cancel_add();
    assert!(flow.notes().is_empty());
    assert!(!library.store().path_for(RecordKind::Note, "a.epub").exists());
    Ok(())
}

#[test]
fn picker_opens_update_recent_list_but_listed_opens_do_not() -> anyhow::Result<()> {
    let (_dir, mut library) = library(&["b.epub", "c.pdf"])?;
    let mut renderers = FakeRenderers::default();

    assert!(matches!(
        library.open_from_picker(BookRef::new("a.epub"), &mut renderers),
        Some(Opened::Epub(_))
    ));
    assert!(matches!(
        library.open_from_picker(BookRef::new("b.epub"), &mut renderers),
        Some(Opened::Epub(_))
    ));
    assert_eq!(ids(library.books()), ["b.epub", "a.epub", "c.pdf"]);

    let listed = BookRef::new("c.pdf");
    assert!(library.open_listed(&listed, &mut renderers).is_some());
    library.refresh();
    assert_eq!(ids(library.catalog().recent().books()), ["b.epub", "a.epub"]);
    Ok(())
}

#[test]
fn recent_list_caps_at_ten_and_ignores_repeats() -> anyhow::Result<()> {
    let (_dir, mut library) = library(&[])?;
    let mut renderers = FakeRenderers::default();

    for i in 0..=MAX_RECENT_BOOKS {
        library.open_from_picker(BookRef::new(format!("book{i}.epub")), &mut renderers);
    }
    let recent = ids(library.catalog().recent().books()).join(",");
    assert_eq!(library.books().len(), MAX_RECENT_BOOKS);
    assert_eq!(library.books()[0].identifier, "book10.epub");
    assert!(!recent.contains("book0.epub"));

    library.open_from_picker(BookRef::new("book5.epub"), &mut renderers);
    assert_eq!(ids(library.catalog().recent().books()).join(","), recent);
    Ok(())
}

#[test]
fn unsupported_format_is_reported() -> anyhow::Result<()> {
    let (_dir, mut library) = library(&[])?;
    let mut renderers = FakeRenderers::default();
    let opened = library.open_listed(&BookRef::new("notes.txt"), &mut renderers);
    assert!(opened.is_none());
    assert_eq!(
        library.take_notices(),
        vec![Notice::UnsupportedFormat("notes.txt".to_string())]
    );
    Ok(())
}

#[test]
fn failed_pdf_open_is_reported() -> anyhow::Result<()> {
    let (_dir, mut library) = library(&["broken.pdf"])?;
    let mut renderers = FakeRenderers {
        fail_pdf_open: true,
        ..FakeRenderers::default()
    };
    let book = BookRef::new("broken.pdf");
    assert!(library.open_listed(&book, &mut renderers).is_none());
    assert_eq!(
        library.take_notices(),
        vec![Notice::OpenFailed("broken.pdf".to_string())]
    );
    Ok(())
}

#[test]
fn asset_pdf_opens_from_assets_dir() -> anyhow::Result<()> {
    let (_dir, mut library) = library(&["guide.pdf"])?;
    let mut renderers = FakeRenderers::default();
    let Some(Opened::Pdf(flow)) = library.open_listed(&BookRef::new("guide.pdf"), &mut renderers)
    else {
        anyhow::bail!("expected a pdf flow");
    };
    assert_eq!(
        flow.renderer().opened.as_deref(),
        Some(library.assets_dir().join("guide.pdf").as_path())
    );
    assert_eq!(flow.book_key(), "guide.pdf");
    Ok(())
}

#[test]
fn annotation_taps_persist_only_in_annotation_mode() -> anyhow::Result<()> {
    let (dir, store) = temp_store()?;
    let source = dir.path().join("doc.pdf");
    let mut flow = AnnotationFlow::open(
        store.clone(),
        "file:///doc.pdf",
        &source,
        FakePdf::sized(1000.0, 2000.0),
    )?;

    assert!(!flow.on_tap(100.0, 100.0));
    assert!(flow.pending().is_none());
    assert!(store.load::<PdfAnnotation>("file:///doc.pdf").records.is_empty());

    assert!(flow.toggle_annotation_mode());
    assert!(flow.on_tap(250.0, 500.0));
    if let Some(text) = flow.pending_text_mut() {
        text.push_str("look here");
    }
    flow.renderer_mut().page = 2;
    let stored = flow.confirm_pending().cloned();
    assert_eq!(
        stored,
        Some(PdfAnnotation {
            page: 2,
            x: 0.25,
            y: 0.25,
            text: "look here".to_string(),
        })
    );
    assert_eq!(flow.renderer().redraws, 1);
    assert_eq!(
        flow.take_notices(),
        vec![Notice::AnnotationModeEnabled]
    );

    assert!(flow.on_tap(10.0, 10.0));
    flow.cancel_pending();
    assert_eq!(store.load::<PdfAnnotation>("file:///doc.pdf").records.len(), 1);
    Ok(())
}

#[test]
fn overlay_draws_only_current_page_marks() -> anyhow::Result<()> {
    let (dir, store) = temp_store()?;
    store.save(
        "doc.pdf",
        &[
            PdfAnnotation {
                page: 1,
                x: 0.1,
                y: 0.1,
                text: "one".to_string(),
            },
            PdfAnnotation {
                page: 2,
                x: 0.5,
                y: 0.25,
                text: "two".to_string(),
            },
        ],
    )?;
    let flow = AnnotationFlow::open(store, "doc.pdf", &dir.path().join("doc.pdf"), FakePdf::default())?;

    let marks: Vec<_> = flow
        .overlay(600.0, 800.0, 2)
        .map(|m| (m.x, m.y, m.text.to_string()))
        .collect();
    assert_eq!(marks, vec![(300.0, 200.0, "two".to_string())]);
    assert_eq!(flow.overlay(600.0, 800.0, 3).count(), 0);
    Ok(())
}

#[test]
fn uri_and_asset_copies_keep_separate_annotations() -> anyhow::Result<()> {
    let (dir, store) = temp_store()?;
    store.append(
        "content://docs/guide.pdf",
        PdfAnnotation {
            page: 0,
            x: 0.5,
            y: 0.5,
            text: "uri".to_string(),
        },
    );
    let asset =
        AnnotationFlow::open(store, "guide.pdf", &dir.path().join("guide.pdf"), FakePdf::default())?;
    assert!(asset.annotations().is_empty());
    Ok(())
}

#[test]
fn epub_session_primes_renderer_and_stores_highlights() -> anyhow::Result<()> {
    let (_dir, store) = temp_store()?;
    store.save("a.epub", &[highlight("a.epub", "earlier")])?;

    let mut session = EpubSession::open(store.clone(), "a.epub", FakeEpub::default())?;
    assert_eq!(session.renderer().primed_before_open, 1);
    assert_eq!(session.renderer().opened.as_deref(), Some("a.epub"));
    assert_eq!(session.renderer().highlights.len(), 1);

    session.on_highlight_created(highlight("a.epub", "later"));
    let stored: Vec<Highlight> = store.load("a.epub").into_records();
    let contents: Vec<&str> = stored
        .iter()
        .filter_map(|h| h.value()["content"].as_str())
        .collect();
    assert_eq!(contents, ["earlier", "later"]);
    assert_eq!(session.renderer().highlights.len(), 2);

    session.on_highlight_created(highlight("other.epub", "elsewhere"));
    assert_eq!(store.load::<Highlight>("other.epub").records.len(), 1);
    assert_eq!(session.renderer().highlights.len(), 2);
    assert!(session.take_notices().is_empty());
    Ok(())
}

#[test]
fn malformed_note_file_degrades_to_empty_with_warning() -> anyhow::Result<()> {
    let (_dir, library) = library(&[])?;
    let path = library.store().path_for(RecordKind::Note, "a.epub");
    fs::create_dir_all(library.store().dir())?;
    fs::write(&path, "{ not json")?;

    let mut flow = library.notes_flow(&BookRef::new("a.epub"));
    assert!(flow.notes().is_empty());
    assert_eq!(flow.take_notices(), vec![Notice::LoadFailed(Subject::Notes)]);
    Ok(())
}

#[test]
fn mind_map_lists_every_note() -> anyhow::Result<()> {
    let (_dir, store) = temp_store()?;
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    store.save("a.epub", &[Note::new("alpha", now), Note::new("beta", now)])?;
    let flow = marginalia_application::NotesFlow::new(store, "a.epub");

    let page = flow.mind_map("markmap.js");
    assert!(page.contains("<div class=\"markmap\">"));
    assert!(page.contains("# a.epub"));
    assert!(page.contains("<li>alpha</li>\n<li>beta</li>"));
    assert!(page.contains("src=\"markmap.js\""));
    Ok(())
}

#[test]
fn failed_picker_opens_leave_recent_list_alone() -> anyhow::Result<()> {
    let (_dir, mut library) = library(&[])?;
    let mut renderers = FakeRenderers {
        fail_pdf_open: true,
        ..FakeRenderers::default()
    };

    assert!(library.open_from_picker(BookRef::new("typo.txt"), &mut renderers).is_none());
    assert!(library.open_from_picker(BookRef::new("/missing/x.pdf"), &mut renderers).is_none());
    assert_eq!(
        library.take_notices(),
        vec![
            Notice::UnsupportedFormat("typo.txt".to_string()),
            Notice::OpenFailed("/missing/x.pdf".to_string()),
        ]
    );
    assert!(library.catalog().recent().books().is_empty());
    assert!(library.books().is_empty());
    Ok(())
}

#[test]
fn notes_with_fractional_timestamps_survive_an_append() -> anyhow::Result<()> {
    let (_dir, library) = library(&[])?;
    let path = library.store().path_for(RecordKind::Note, "a.epub");
    fs::create_dir_all(library.store().dir())?;
    fs::write(
        &path,
        r#"[{"text":"precious","timestamp":"2024-01-01T00:00:00.123Z"}]"#,
    )?;

    let mut flow = library.notes_flow(&BookRef::new("a.epub"));
    assert_eq!(flow.notes().len(), 1);
    assert!(flow.take_notices().is_empty());

    flow.begin_add();
    if let Some(input) = flow.input_mut() {
        input.push_str("new");
    }
    let now = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
    assert!(flow.submit_at(now));

    let raw: serde_json::Value = serde_json::from_slice(&fs::read(&path)?)?;
    assert_eq!(raw[0]["text"], "precious");
    assert_eq!(raw[0]["timestamp"], "2024-01-01T00:00:00Z");
    assert_eq!(raw[1]["text"], "new");
    assert_eq!(raw[1]["timestamp"], "2024-02-01T12:00:00Z");
    Ok(())
}

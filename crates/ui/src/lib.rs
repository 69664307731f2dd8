//! Terminal front end: library, notes, PDF annotation and EPUB screens.

use std::fs;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use chrono::Utc;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use marginalia_application::{
    AnnotationFlow, AssetSource, EpubSession, Library, NotesFlow, NotesState, Opened, PdfRenderer,
};
use marginalia_core::{BookRef, fingerprint};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap,
};
use unicode_width::UnicodeWidthChar as _;

mod views;

pub use views::{TerminalEpubView, TerminalPdfView, TerminalRenderers};

const STATUS_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub assets_dir: PathBuf,
    /// Where generated mind-map pages are written.
    pub mindmap_dir: PathBuf,
    pub markmap_script: String,
}

struct Status {
    text: String,
    error: bool,
    at: Instant,
}

struct NotesScreen {
    flow: NotesFlow,
    selected: usize,
    summary: Option<String>,
}

struct EpubScreen {
    session: EpubSession<TerminalEpubView>,
    highlight_input: Option<String>,
}

enum Screen {
    Notes(NotesScreen),
    Pdf(AnnotationFlow<TerminalPdfView>),
    Epub(EpubScreen),
}

enum InputAction {
    Submit,
    Cancel,
    Edited,
}

pub struct Ui<A> {
    library: Library<A>,
    renderers: TerminalRenderers,
    config: UiConfig,
    stack: Vec<Screen>,
    selected: usize,
    picker_input: Option<String>,
    status: Option<Status>,
}

impl<A: AssetSource> Ui<A> {
    pub fn new(library: Library<A>, config: UiConfig) -> Self {
        let renderers = TerminalRenderers::new(&config.assets_dir);
        let mut ui = Self {
            library,
            renderers,
            config,
            stack: Vec::new(),
            selected: 0,
            picker_input: None,
            status: None,
        };
        ui.collect_notices();
        ui
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut terminal = setup_terminal()?;
        terminal.clear().ok();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(())), Ok(())) => Ok(()),
            (Ok(Ok(())), Err(err)) => Err(err),
            (Ok(Err(err)), _) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let tick_rate = Duration::from_millis(250);
        let mut needs_redraw = true;

        loop {
            if self.expire_status() || self.take_view_dirty() {
                needs_redraw = true;
            }
            if needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                needs_redraw = false;
            }

            if !event::poll(tick_rate)? {
                continue;
            }

            match event::read()? {
                Event::Resize(_, _) => needs_redraw = true,
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    needs_redraw = true;
                    if self.handle_key(key)? {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => {
                    if self.handle_mouse(mouse) {
                        needs_redraw = true;
                    }
                }
                _ => {}
            }
            self.collect_notices();
        }
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        let Some(screen) = self.stack.last_mut() else {
            return Ok(self.handle_library_key(key));
        };

        let mut pop = false;
        let mut push = None;
        let mut outcome = None;
        match screen {
            Screen::Notes(notes) => match handle_notes_key(notes, key) {
                NotesOutcome::Stay => {}
                NotesOutcome::Back => pop = true,
                NotesOutcome::WriteMindMap => {
                    outcome = Some(
                        write_mind_map(&self.config, &notes.flow)
                            .map(|path| format!("Mind map written to {}", path.display())),
                    );
                }
            },
            Screen::Pdf(flow) => match handle_pdf_key(flow, key) {
                PdfOutcome::Stay => {}
                PdfOutcome::Back => pop = true,
                PdfOutcome::Notes => {
                    let book = BookRef::new(flow.book_key());
                    push = Some(Screen::Notes(NotesScreen::new(self.library.notes_flow(&book))));
                }
            },
            Screen::Epub(epub) => match handle_epub_key(epub, key) {
                EpubOutcome::Stay => {}
                EpubOutcome::Back => pop = true,
                EpubOutcome::Notes => {
                    let book = BookRef::new(epub.session.identifier());
                    push = Some(Screen::Notes(NotesScreen::new(self.library.notes_flow(&book))));
                }
            },
        }

        if let Some(result) = outcome {
            self.report(result);
        }
        if let Some(screen) = push {
            self.stack.push(screen);
        } else if pop {
            self.pop_screen();
        }
        Ok(false)
    }

    fn handle_library_key(&mut self, key: KeyEvent) -> bool {
        if let Some(input) = self.picker_input.as_mut() {
            match edit_input(input, key) {
                InputAction::Submit => {
                    let identifier = input.trim().to_string();
                    self.picker_input = None;
                    if !identifier.is_empty() {
                        let book = BookRef::new(identifier);
                        let opened = self.library.open_from_picker(book, &mut self.renderers);
                        self.push_opened(opened);
                    }
                }
                InputAction::Cancel => self.picker_input = None,
                InputAction::Edited => {}
            }
            return false;
        }

        let len = self.library.books().len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if len > 0 {
                    self.selected = (self.selected + 1).min(len - 1);
                }
            }
            KeyCode::Enter => {
                if let Some(book) = self.library.books().get(self.selected).cloned() {
                    let opened = self.library.open_listed(&book, &mut self.renderers);
                    self.push_opened(opened);
                }
            }
            KeyCode::Char('n') => {
                if let Some(book) = self.library.books().get(self.selected).cloned() {
                    let flow = self.library.notes_flow(&book);
                    self.stack.push(Screen::Notes(NotesScreen::new(flow)));
                }
            }
            KeyCode::Char('o') => self.picker_input = Some(String::new()),
            KeyCode::Char('r') => {
                self.library.refresh();
                self.clamp_selection();
            }
            _ => {}
        }
        false
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        let Some(Screen::Pdf(flow)) = self.stack.last_mut() else {
            return false;
        };
        if flow.pending().is_some() {
            return false;
        }
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return false;
        }
        let Some((x, y)) = flow.renderer().screen_tap(mouse.column, mouse.row) else {
            return false;
        };
        flow.on_tap(x, y)
    }

    fn push_opened(&mut self, opened: Option<Opened<TerminalEpubView, TerminalPdfView>>) {
        match opened {
            Some(Opened::Epub(session)) => self.stack.push(Screen::Epub(EpubScreen {
                session,
                highlight_input: None,
            })),
            Some(Opened::Pdf(flow)) => self.stack.push(Screen::Pdf(flow)),
            None => {}
        }
    }

    /// Screens below the top reload from storage when they become visible
    /// again.
    fn pop_screen(&mut self) {
        self.stack.pop();
        match self.stack.last_mut() {
            Some(Screen::Notes(notes)) => {
                notes.flow.enter();
                notes.clamp_selection();
            }
            Some(Screen::Pdf(flow)) => flow.reload(),
            Some(Screen::Epub(epub)) => epub.session.reload_highlights(),
            None => {
                self.library.refresh();
                self.clamp_selection();
            }
        }
    }

    fn clamp_selection(&mut self) {
        self.selected = self
            .selected
            .min(self.library.books().len().saturating_sub(1));
    }

    fn collect_notices(&mut self) {
        let mut notices = self.library.take_notices();
        for screen in &mut self.stack {
            notices.extend(match screen {
                Screen::Notes(notes) => notes.flow.take_notices(),
                Screen::Pdf(flow) => flow.take_notices(),
                Screen::Epub(epub) => epub.session.take_notices(),
            });
        }
        if let Some(last) = notices.last() {
            self.set_status(last.to_string(), last.is_error());
        }
    }

    fn report(&mut self, result: anyhow::Result<String>) {
        match result {
            Ok(message) => self.set_status(message, false),
            Err(err) => {
                tracing::warn!(error = ?err, "action failed");
                self.set_status(format!("{err:#}"), true);
            }
        }
    }

    fn set_status(&mut self, text: String, error: bool) {
        self.status = Some(Status {
            text,
            error,
            at: Instant::now(),
        });
    }

    fn expire_status(&mut self) -> bool {
        let expired = self
            .status
            .as_ref()
            .is_some_and(|status| status.at.elapsed() >= STATUS_TTL);
        if expired {
            self.status = None;
        }
        expired
    }

    fn take_view_dirty(&mut self) -> bool {
        match self.stack.last_mut() {
            Some(Screen::Pdf(flow)) => flow.renderer_mut().take_dirty(),
            _ => false,
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        frame.render_widget(Clear, area);
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        match self.stack.last_mut() {
            None => self.draw_library(sections[0], frame),
            Some(Screen::Notes(notes)) => draw_notes(notes, sections[0], frame),
            Some(Screen::Pdf(flow)) => draw_pdf(flow, sections[0], frame),
            Some(Screen::Epub(epub)) => draw_epub(epub, sections[0], frame),
        }
        self.draw_status(sections[1], frame);
    }

    fn draw_library(&self, area: Rect, frame: &mut ratatui::Frame) {
        let block = Block::default().borders(Borders::ALL).title(Span::styled(
            "Library",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);

        let books = self.library.books();
        let items: Vec<ListItem> = if books.is_empty() {
            vec![ListItem::new(Line::raw("(no books; press o to open a file)"))]
        } else {
            books
                .iter()
                .map(|book| {
                    let format = book.format().map_or("?", |f| f.as_str());
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            format!("[{format}] "),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::raw(book.display_name().to_string()),
                        Span::styled(
                            format!("  {}", book.identifier),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect()
        };
        let mut state = ListState::default();
        if !books.is_empty() {
            state.select(Some(self.selected.min(books.len() - 1)));
        }
        frame.render_stateful_widget(selection_list(items), sections[0], &mut state);

        frame.render_widget(
            footer(&[
                ("Enter", "open"),
                ("n", "notes"),
                ("o", "open file"),
                ("r", "refresh"),
                ("q", "quit"),
            ]),
            sections[1],
        );

        if let Some(input) = &self.picker_input {
            draw_input_popup("Open file (path or file:// URI)", input, area, frame);
        }
    }

    fn draw_status(&self, area: Rect, frame: &mut ratatui::Frame) {
        let Some(status) = &self.status else {
            return;
        };
        let style = if status.error {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Green)
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(status.text.clone(), style))),
            area,
        );
    }
}

impl NotesScreen {
    fn new(flow: NotesFlow) -> Self {
        Self {
            flow,
            selected: 0,
            summary: None,
        }
    }

    fn clamp_selection(&mut self) {
        self.selected = self
            .selected
            .min(self.flow.notes().len().saturating_sub(1));
    }
}

enum NotesOutcome {
    Stay,
    Back,
    WriteMindMap,
}

fn handle_notes_key(notes: &mut NotesScreen, key: KeyEvent) -> NotesOutcome {
    if notes.summary.is_some() {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
            notes.summary = None;
        }
        return NotesOutcome::Stay;
    }

    if let Some(input) = notes.flow.input_mut() {
        match edit_input(input, key) {
            InputAction::Submit => {
                if notes.flow.submit() {
                    notes.selected = notes.flow.notes().len().saturating_sub(1);
                }
            }
            InputAction::Cancel => {
                notes.flow.cancel_add();
                notes.clamp_selection();
            }
            InputAction::Edited => {}
        }
        return NotesOutcome::Stay;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return NotesOutcome::Back,
        KeyCode::Up | KeyCode::Char('k') => notes.selected = notes.selected.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => {
            let len = notes.flow.notes().len();
            if len > 0 {
                notes.selected = (notes.selected + 1).min(len - 1);
            }
        }
        KeyCode::Char('a') => notes.flow.begin_add(),
        KeyCode::Char('s') => notes.summary = Some(notes.flow.summary()),
        KeyCode::Char('m') => return NotesOutcome::WriteMindMap,
        _ => {}
    }
    NotesOutcome::Stay
}

fn write_mind_map(config: &UiConfig, flow: &NotesFlow) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(&config.mindmap_dir)
        .with_context(|| format!("create {}", config.mindmap_dir.display()))?;
    let path = config
        .mindmap_dir
        .join(format!("{}.html", fingerprint(flow.book_key())));
    fs::write(&path, flow.mind_map(&config.markmap_script))
        .with_context(|| format!("write mind map {}", path.display()))?;
    tracing::info!(book = %flow.book_key(), path = %path.display(), "mind map written");
    Ok(path)
}

fn draw_notes(notes: &NotesScreen, area: Rect, frame: &mut ratatui::Frame) {
    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        format!("Notes: {}", notes.flow.book_key()),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let list = notes.flow.notes();
    let items: Vec<ListItem> = if list.is_empty() {
        vec![ListItem::new(Line::raw("(none)"))]
    } else {
        list.iter()
            .map(|note| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{}  ", note.timestamp()),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw(note.text.clone()),
                ]))
            })
            .collect()
    };
    let mut state = ListState::default();
    if !list.is_empty() {
        state.select(Some(notes.selected.min(list.len() - 1)));
    }
    frame.render_stateful_widget(selection_list(items), sections[0], &mut state);

    frame.render_widget(
        footer(&[
            ("a", "add"),
            ("s", "summary"),
            ("m", "mind map"),
            ("Esc", "back"),
        ]),
        sections[1],
    );

    if let NotesState::Adding { input } = notes.flow.state() {
        draw_input_popup("Add note", input, area, frame);
    } else if let Some(summary) = &notes.summary {
        let popup = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup);
        let paragraph = Paragraph::new(Text::raw(summary.clone()))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Note summary"));
        frame.render_widget(paragraph, popup);
    }
}

enum PdfOutcome {
    Stay,
    Back,
    Notes,
}

fn handle_pdf_key(flow: &mut AnnotationFlow<TerminalPdfView>, key: KeyEvent) -> PdfOutcome {
    if let Some(text) = flow.pending_text_mut() {
        match edit_input(text, key) {
            InputAction::Submit => {
                flow.confirm_pending();
            }
            InputAction::Cancel => flow.cancel_pending(),
            InputAction::Edited => {}
        }
        return PdfOutcome::Stay;
    }

    let annotating = flow.annotation_mode();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return PdfOutcome::Back,
        KeyCode::Char('n') => return PdfOutcome::Notes,
        KeyCode::Char('a') => {
            flow.toggle_annotation_mode();
        }
        KeyCode::Right | KeyCode::PageDown if !annotating => flow.renderer_mut().next_page(),
        KeyCode::Left | KeyCode::PageUp if !annotating => flow.renderer_mut().prev_page(),
        KeyCode::PageDown => flow.renderer_mut().next_page(),
        KeyCode::PageUp => flow.renderer_mut().prev_page(),
        KeyCode::Left | KeyCode::Char('h') => flow.renderer_mut().move_cursor(-1, 0),
        KeyCode::Right | KeyCode::Char('l') => flow.renderer_mut().move_cursor(1, 0),
        KeyCode::Up | KeyCode::Char('k') => flow.renderer_mut().move_cursor(0, -1),
        KeyCode::Down | KeyCode::Char('j') => flow.renderer_mut().move_cursor(0, 1),
        KeyCode::Enter | KeyCode::Char(' ') => {
            let (x, y) = flow.renderer().cursor_tap();
            flow.on_tap(x, y);
        }
        _ => {}
    }
    PdfOutcome::Stay
}

fn draw_pdf(flow: &mut AnnotationFlow<TerminalPdfView>, area: Rect, frame: &mut ratatui::Frame) {
    let view = flow.renderer();
    let mode = if flow.annotation_mode() { "ON" } else { "off" };
    let title = format!(
        "{}  page {}/{}  annotate: {mode}",
        flow.book_key(),
        view.current_page_display(),
        view.page_count(),
    );
    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let page_area = flow.renderer_mut().layout(sections[0]);
    frame.render_widget(
        Block::default().style(Style::default().bg(Color::White).fg(Color::Black)),
        page_area,
    );

    let page = flow.renderer().current_page();
    let (width, height) = (f32::from(page_area.width), f32::from(page_area.height));
    let mark_style = Style::default()
        .fg(Color::Red)
        .bg(Color::White)
        .add_modifier(Modifier::BOLD);
    let buf = frame.buffer_mut();
    for mark in flow
        .overlay(width, height, page)
        .filter(|_| page_area.width > 0 && page_area.height > 0)
    {
        let col = (mark.x.floor() as u16).min(page_area.width.saturating_sub(1));
        let row = (mark.y.floor() as u16).min(page_area.height.saturating_sub(1));
        let room = usize::from(page_area.width - col);
        let label = truncate_to_width(&format!("● {}", mark.text), room);
        buf.set_string(page_area.x + col, page_area.y + row, label, mark_style);
    }

    if flow.annotation_mode() && page_area.width > 0 && page_area.height > 0 {
        let (cx, cy) = flow.renderer().cursor();
        buf.set_style(
            Rect::new(page_area.x + cx, page_area.y + cy, 1, 1),
            Style::default().bg(Color::Blue).fg(Color::White),
        );
    }

    frame.render_widget(
        footer(&[
            ("←/→", "page"),
            ("a", "annotate"),
            ("click/Enter", "place"),
            ("n", "notes"),
            ("Esc", "back"),
        ]),
        sections[1],
    );

    if let Some(pending) = flow.pending() {
        draw_input_popup("Add annotation", &pending.text, area, frame);
    }
}

enum EpubOutcome {
    Stay,
    Back,
    Notes,
}

fn handle_epub_key(epub: &mut EpubScreen, key: KeyEvent) -> EpubOutcome {
    if let Some(input) = epub.highlight_input.as_mut() {
        match edit_input(input, key) {
            InputAction::Submit => {
                let content = input.trim().to_string();
                epub.highlight_input = None;
                if !content.is_empty() {
                    let highlight = epub.session.renderer().highlight(&content, Utc::now());
                    epub.session.on_highlight_created(highlight);
                }
            }
            InputAction::Cancel => epub.highlight_input = None,
            InputAction::Edited => {}
        }
        return EpubOutcome::Stay;
    }

    let view = epub.session.renderer_mut();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return EpubOutcome::Back,
        KeyCode::Char('n') => return EpubOutcome::Notes,
        KeyCode::Right | KeyCode::PageDown => view.next_chapter(),
        KeyCode::Left | KeyCode::PageUp => view.prev_chapter(),
        KeyCode::Down | KeyCode::Char('j') => view.scroll_by(1),
        KeyCode::Up | KeyCode::Char('k') => view.scroll_by(-1),
        KeyCode::Char('h') => epub.highlight_input = Some(String::new()),
        _ => {}
    }
    EpubOutcome::Stay
}

fn draw_epub(epub: &EpubScreen, area: Rect, frame: &mut ratatui::Frame) {
    let view = epub.session.renderer();
    let title = format!(
        "{}  chapter {}/{}",
        epub.session.identifier(),
        view.chapter() + 1,
        view.chapter_count()
    );
    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(rows[0]);

    let text = Paragraph::new(Text::raw(view.chapter_text().to_string()))
        .wrap(Wrap { trim: false })
        .scroll((view.scroll(), 0));
    frame.render_widget(text, cols[0]);

    let items: Vec<ListItem> = view
        .highlights()
        .iter()
        .map(|h| {
            let content = h.value()["content"].as_str().unwrap_or("(highlight)");
            ListItem::new(Line::raw(content.to_string()))
        })
        .collect();
    frame.render_widget(
        List::new(items).block(Block::default().borders(Borders::LEFT).title("Highlights")),
        cols[1],
    );

    frame.render_widget(
        footer(&[
            ("←/→", "chapter"),
            ("↑/↓", "scroll"),
            ("h", "highlight"),
            ("n", "notes"),
            ("Esc", "back"),
        ]),
        rows[1],
    );

    if let Some(input) = &epub.highlight_input {
        draw_input_popup("Highlight text", input, area, frame);
    }
}

impl TerminalPdfView {
    fn current_page_display(&self) -> u32 {
        if self.page_count() == 0 {
            0
        } else {
            self.current_page() + 1
        }
    }
}

fn edit_input(input: &mut String, key: KeyEvent) -> InputAction {
    match key.code {
        KeyCode::Enter => InputAction::Submit,
        KeyCode::Esc => InputAction::Cancel,
        KeyCode::Backspace => {
            input.pop();
            InputAction::Edited
        }
        KeyCode::Char(ch) => {
            if !ch.is_control() {
                input.push(ch);
            }
            InputAction::Edited
        }
        _ => InputAction::Edited,
    }
}

fn selection_list(items: Vec<ListItem<'_>>) -> List<'_> {
    List::new(items)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ")
        .highlight_spacing(HighlightSpacing::Always)
}

fn footer(keys: &[(&str, &str)]) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for (key, label) in keys {
        spans.push(Span::styled(
            key.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {label}  ")));
    }
    Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
}

fn draw_input_popup(title: &str, input: &str, area: Rect, frame: &mut ratatui::Frame) {
    let popup = centered_rect(70, 20, area);
    frame.render_widget(Clear, popup);
    let paragraph = Paragraph::new(Text::from(vec![
        Line::raw(format!("{input}_")),
        Line::from(Span::styled(
            "Enter save  Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ]))
    .wrap(Wrap { trim: false })
    .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(paragraph, popup);
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width {
            break;
        }
        width += w;
        out.push(ch);
    }
    out
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )
    .context("leave alt screen")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

//! Markup consumed by the bundled markmap script.
//!
//! Note text goes into the markup as-is. Markup inside a note is therefore
//! interpreted by the page.

use marginalia_core::Note;

pub const MARKMAP_SCRIPT: &str = "file:///android_asset/markmap-autoloader.js";

pub fn render(book_title: &str, notes: &[Note]) -> String {
    let mut items = String::new();
    for note in notes {
        items.push_str("<li>");
        items.push_str(&note.text);
        items.push_str("</li>\n");
    }
    format!("<div class=\"markmap\">\n# {book_title}\n<ul>\n{items}</ul>\n</div>")
}

pub fn render_page(book_title: &str, notes: &[Note], script_src: &str) -> String {
    format!(
        "<html>\n<head>\n<title>Mind Map</title>\n<script src=\"{script_src}\"></script>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        render(book_title, notes)
    )
}

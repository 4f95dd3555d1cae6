//! Viewer rendering
//!
//! Turns linearized transcripts into display-ready view models and writes the
//! two-pane HTML viewer. Nothing here touches the mapping graph; rendering
//! only consumes `Transcript` values.

pub mod html;

use crate::config::ViewerConfig;
use crate::linearize::{SpeakerRole, Transcript};
use chrono::{DateTime, NaiveDateTime};
use pulldown_cmark::{Event, Options, Parser};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Shown in the transcript pane before a conversation is picked
pub const NO_SELECTION_TEXT: &str = "Select a conversation to view it";

/// Shown when a conversation linearizes to zero turns
pub const EMPTY_CONVERSATION_TEXT: &str = "This conversation has no content";

/// Shown when a conversation has no usable timestamp
pub const UNKNOWN_DATE: &str = "Unknown date";

/// Options controlling how transcripts are presented
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Browser tab and sidebar heading
    pub page_title: String,
    /// Title shown for conversations with an empty title
    pub untitled_placeholder: String,
    /// Render content as Markdown instead of preformatted text
    pub markdown: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&ViewerConfig::default())
    }
}

impl From<&ViewerConfig> for RenderOptions {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            page_title: config.page_title.clone(),
            untitled_placeholder: config.untitled_placeholder.clone(),
            markdown: config.markdown,
        }
    }
}

/// A conversation as the viewer script consumes it
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub id: String,
    pub title: String,
    pub date: String,
    pub turns: Vec<TurnView>,
}

/// A turn as the viewer script consumes it
#[derive(Debug, Clone, Serialize)]
pub struct TurnView {
    pub role: SpeakerRole,
    pub label: &'static str,
    /// Raw text, displayed preformatted
    pub content: String,
    /// Markdown rendered to HTML, only when markdown is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

impl ConversationView {
    pub fn from_transcript(transcript: &Transcript, options: &RenderOptions) -> Self {
        let turns = transcript
            .turns
            .iter()
            .map(|turn| TurnView {
                role: turn.role,
                label: turn.role.label(),
                content: turn.content.clone(),
                content_html: options.markdown.then(|| markdown_to_html(&turn.content)),
                reasoning_content: turn.reasoning_content.clone(),
            })
            .collect();

        Self {
            id: transcript.id.clone(),
            title: transcript
                .display_title(&options.untitled_placeholder)
                .to_string(),
            date: format_display_date(transcript.display_date()),
            turns,
        }
    }
}

/// Build view models for every transcript, in order
pub fn build_views(transcripts: &[Transcript], options: &RenderOptions) -> Vec<ConversationView> {
    transcripts
        .iter()
        .map(|t| ConversationView::from_transcript(t, options))
        .collect()
}

/// Format an exported timestamp for the sidebar.
///
/// RFC 3339 and naive ISO timestamps become `YYYY-MM-DD HH:MM`; anything else
/// is shown as exported.
pub fn format_display_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return UNKNOWN_DATE.to_string();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format("%Y-%m-%d %H:%M").to_string();
        }
    }

    raw.to_string()
}

/// Render Markdown to HTML. Raw HTML in the source is shown as text.
pub fn markdown_to_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut out, parser);
    out
}

/// Escape text for use in HTML element content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the viewer page into a string
pub fn render_to_string(transcripts: &[Transcript], options: &RenderOptions) -> io::Result<String> {
    let mut buf = Vec::new();
    html::write(&mut buf, transcripts, options)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write the viewer page to `path`
pub fn generate(path: &Path, transcripts: &[Transcript], options: &RenderOptions) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    html::write(&mut writer, transcripts, options)?;
    writer.flush()?;
    tracing::info!(
        path = %path.display(),
        conversations = transcripts.len(),
        "wrote viewer page"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linearize::Turn;

    fn transcript(title: &str, date: &str, turns: Vec<Turn>) -> Transcript {
        Transcript {
            id: "c1".to_string(),
            title: title.to_string(),
            inserted_at: date.to_string(),
            updated_at: String::new(),
            turns,
        }
    }

    fn turn(node_id: &str, role: SpeakerRole, content: &str) -> Turn {
        Turn {
            node_id: node_id.to_string(),
            role,
            content: content.to_string(),
            reasoning_content: None,
        }
    }

    #[test]
    fn test_format_rfc3339_date() {
        assert_eq!(
            format_display_date("2025-02-01T10:05:33.120000+08:00"),
            "2025-02-01 10:05"
        );
    }

    #[test]
    fn test_format_naive_date() {
        assert_eq!(format_display_date("2025-02-01T10:05:33"), "2025-02-01 10:05");
        assert_eq!(format_display_date("2025-02-01 10:05:33"), "2025-02-01 10:05");
    }

    #[test]
    fn test_format_unparseable_date() {
        assert_eq!(format_display_date("yesterday"), "yesterday");
        assert_eq!(format_display_date(""), UNKNOWN_DATE);
        assert_eq!(format_display_date("   "), UNKNOWN_DATE);
    }

    #[test]
    fn test_view_uses_placeholder_title() {
        let view = ConversationView::from_transcript(&transcript("", "", vec![]), &RenderOptions::default());
        assert_eq!(view.title, "Untitled conversation");
        assert_eq!(view.date, UNKNOWN_DATE);
    }

    #[test]
    fn test_view_labels_speakers() {
        let t = transcript(
            "Greeting",
            "2025-02-01T10:00:00Z",
            vec![
                turn("1", SpeakerRole::User, "hi"),
                turn("2", SpeakerRole::Assistant, "hello"),
            ],
        );
        let view = ConversationView::from_transcript(&t, &RenderOptions::default());
        assert_eq!(view.turns[0].label, "User");
        assert_eq!(view.turns[1].label, "Assistant");
        assert!(view.turns[0].content_html.is_none());
    }

    #[test]
    fn test_view_markdown_enabled() {
        let t = transcript("md", "", vec![turn("2", SpeakerRole::Assistant, "**bold**")]);
        let options = RenderOptions {
            markdown: true,
            ..Default::default()
        };
        let view = ConversationView::from_transcript(&t, &options);
        assert_eq!(
            view.turns[0].content_html.as_deref(),
            Some("<p><strong>bold</strong></p>\n")
        );
        assert_eq!(view.turns[0].content, "**bold**");
    }

    #[test]
    fn test_markdown_neutralizes_raw_html() {
        let html = markdown_to_html("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_generate_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("viewer.html");
        let t = transcript("Saved", "", vec![turn("1", SpeakerRole::User, "hi")]);

        generate(&path, &[t], &RenderOptions::default()).unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("Saved"));
        assert!(html.contains("</html>"));
    }
}

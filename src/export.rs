//! Export utilities for transcripts
//!
//! Provides Markdown and JSON renditions of linearized conversations.

use crate::linearize::Transcript;
use crate::render::format_display_date;
use std::fmt::Write;

/// Configuration for Markdown export
#[derive(Debug, Clone)]
pub struct MarkdownConfig {
    /// Include reasoning traces as blockquotes
    pub include_reasoning: bool,
    /// Heading level for conversation titles (1-6)
    pub heading_level: usize,
    /// Heading used for conversations with a blank title
    pub untitled_placeholder: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            include_reasoning: true,
            heading_level: 2,
            untitled_placeholder: crate::archive::UNTITLED.to_string(),
        }
    }
}

/// Prefix every line with `> `
fn blockquote(s: &str) -> String {
    s.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate a string to at most `max_chars` characters
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Render one transcript as Markdown
pub fn transcript_to_markdown(transcript: &Transcript, config: &MarkdownConfig) -> String {
    let mut md = String::new();
    let hashes = "#".repeat(config.heading_level.clamp(1, 6));

    writeln!(
        md,
        "{} {}\n",
        hashes,
        transcript.display_title(&config.untitled_placeholder)
    )
    .unwrap();
    writeln!(md, "_{}_\n", format_display_date(transcript.display_date())).unwrap();

    if transcript.is_empty() {
        writeln!(md, "_No content._").unwrap();
        return md;
    }

    for turn in &transcript.turns {
        writeln!(md, "**{}**:\n", turn.role).unwrap();

        if config.include_reasoning {
            if let Some(reasoning) = &turn.reasoning_content {
                writeln!(md, "{}\n", blockquote(reasoning)).unwrap();
            }
        }

        writeln!(md, "{}\n", turn.content).unwrap();
    }

    md
}

/// Render several transcripts as one Markdown document
pub fn archive_to_markdown(transcripts: &[Transcript], config: &MarkdownConfig) -> String {
    transcripts
        .iter()
        .map(|t| transcript_to_markdown(t, config))
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

/// Pretty-printed JSON for a set of transcripts
pub fn transcripts_to_json(transcripts: &[Transcript]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(transcripts)
}

/// Look up a transcript by conversation id
pub fn find_transcript<'a>(transcripts: &'a [Transcript], id: &str) -> Option<&'a Transcript> {
    transcripts.iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linearize::{SpeakerRole, Turn};

    fn sample_transcript() -> Transcript {
        Transcript {
            id: "c1".to_string(),
            title: "Tea brewing".to_string(),
            inserted_at: "2025-03-04T08:30:00Z".to_string(),
            updated_at: String::new(),
            turns: vec![
                Turn {
                    node_id: "1".to_string(),
                    role: SpeakerRole::User,
                    content: "How hot should the water be?".to_string(),
                    reasoning_content: None,
                },
                Turn {
                    node_id: "2".to_string(),
                    role: SpeakerRole::Assistant,
                    content: "About 80C for green tea.".to_string(),
                    reasoning_content: Some("Green tea is delicate.\n\nLower temperature.".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_transcript_to_markdown() {
        let md = transcript_to_markdown(&sample_transcript(), &MarkdownConfig::default());

        assert!(md.starts_with("## Tea brewing\n"));
        assert!(md.contains("_2025-03-04 08:30_"));
        assert!(md.contains("**User**:\n\nHow hot should the water be?"));
        assert!(md.contains("**Assistant**:\n\n> Green tea is delicate.\n>\n> Lower temperature."));
        assert!(md.contains("About 80C for green tea."));
    }

    #[test]
    fn test_markdown_without_reasoning() {
        let config = MarkdownConfig {
            include_reasoning: false,
            heading_level: 1,
            ..Default::default()
        };
        let md = transcript_to_markdown(&sample_transcript(), &config);
        assert!(md.starts_with("# Tea brewing"));
        assert!(!md.contains("Green tea is delicate"));
    }

    #[test]
    fn test_markdown_empty_transcript() {
        let mut t = sample_transcript();
        t.turns.clear();
        let md = transcript_to_markdown(&t, &MarkdownConfig::default());
        assert!(md.contains("_No content._"));
        assert!(!md.contains("**User**"));
    }

    #[test]
    fn test_markdown_blank_title_uses_placeholder() {
        let mut t = sample_transcript();
        t.title = String::new();

        let md = transcript_to_markdown(&t, &MarkdownConfig::default());
        assert!(md.starts_with("## Untitled conversation\n"));

        let config = MarkdownConfig {
            untitled_placeholder: "(no title)".to_string(),
            ..Default::default()
        };
        let md = transcript_to_markdown(&t, &config);
        assert!(md.starts_with("## (no title)\n"));
    }

    #[test]
    fn test_archive_to_markdown_separates_conversations() {
        let mut second = sample_transcript();
        second.id = "c2".to_string();
        second.title = "Coffee".to_string();

        let md = archive_to_markdown(&[sample_transcript(), second], &MarkdownConfig::default());
        assert_eq!(md.matches("\n---\n").count(), 1);
        assert!(md.contains("## Coffee"));
    }

    #[test]
    fn test_transcripts_to_json() {
        let json = transcripts_to_json(&[sample_transcript()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["turns"][0]["role"], "user");
        assert!(value[0]["turns"][0].get("reasoning_content").is_none());
        assert_eq!(value[0]["turns"][1]["role"], "assistant");
    }

    #[test]
    fn test_find_transcript() {
        let transcripts = vec![sample_transcript()];
        assert!(find_transcript(&transcripts, "c1").is_some());
        assert!(find_transcript(&transcripts, "missing").is_none());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 8), "a lon...");
        assert_eq!(truncate("日本語のタイトルです", 6), "日本語...");
    }
}

//! chatview - browse exported chat archives as transcripts
//!
//! An exported archive stores every conversation as a tree of message nodes
//! keyed by id. chatview walks each tree into an ordered list of
//! speaker-attributed turns, then renders them as a static HTML viewer,
//! serves them locally, or exports Markdown/JSON.
//!
//! # Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | load | [`archive`] | `Vec<Conversation>` |
//! | linearize | [`linearize`] | `Vec<Transcript>` |
//! | present | [`render`], [`export`], [`serve`] | HTML, Markdown, JSON |
//!
//! # Quick Start
//!
//! ```
//! use chatview::{linearize_archive, parse_archive, SpeakerRole};
//!
//! let json = r#"[{
//!     "id": "c1",
//!     "title": "Hello",
//!     "mapping": {
//!         "root": { "children": ["1"] },
//!         "1": { "message": { "content": "hi" }, "children": ["2"] },
//!         "2": { "message": { "content": "hello" }, "children": [] }
//!     }
//! }]"#;
//!
//! let conversations = parse_archive(json).unwrap();
//! let transcripts = linearize_archive(&conversations);
//!
//! assert_eq!(transcripts[0].turns.len(), 2);
//! assert_eq!(transcripts[0].turns[0].role, SpeakerRole::User);
//! assert_eq!(transcripts[0].turns[1].content, "hello");
//! ```

pub mod archive;
pub mod config;
pub mod export;
pub mod linearize;
pub mod logging;
pub mod render;
pub mod serve;

pub use archive::{load_archive, parse_archive, ArchiveError, Conversation, Mapping, Message, Node};
pub use config::Config;
pub use export::{archive_to_markdown, transcript_to_markdown, transcripts_to_json, MarkdownConfig};
pub use linearize::{
    linearize, linearize_archive, linearize_conversation, speaker_role, SpeakerRole, Transcript,
    Turn, NO_CONTENT_PLACEHOLDER, ROOT_ID,
};
pub use render::RenderOptions;

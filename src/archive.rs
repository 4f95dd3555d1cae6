//! Archive loading
//!
//! An exported archive is a JSON array of conversation records. Each record
//! carries a `mapping` of node id -> node, where nodes form a tree rooted at
//! the synthetic id `"root"`. Parsing is lenient: absent titles, mappings,
//! children and messages all fall back to defaults so that a truncated export
//! still loads.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Title used when a conversation record has none
pub const UNTITLED: &str = "Untitled conversation";

/// Node id -> node for one conversation
pub type Mapping = HashMap<String, Node>;

/// One exported chat session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default = "default_title", deserialize_with = "title_or_placeholder")]
    pub title: String,
    /// Creation timestamp, kept exactly as exported
    #[serde(default, deserialize_with = "null_as_default")]
    pub inserted_at: String,
    /// Last-update timestamp, kept exactly as exported
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mapping: Mapping,
}

/// A vertex in a conversation's mapping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    /// Id as recorded inside the node. The mapping key is authoritative.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Absent for structural nodes such as the synthetic root
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<String>,
}

/// Payload of a node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub content: Option<String>,
    /// Model "thinking" trace, shown next to the content when present
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

#[cfg(test)]
impl Node {
    /// Build a structural node with no payload
    pub fn structural(children: &[&str]) -> Self {
        Self {
            id: String::new(),
            message: None,
            children: children.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Build a node carrying message text
    pub fn with_content(content: &str, children: &[&str]) -> Self {
        Self {
            id: String::new(),
            message: Some(Message {
                content: Some(content.to_string()),
                reasoning_content: None,
            }),
            children: children.iter().map(|c| c.to_string()).collect(),
        }
    }
}

fn default_title() -> String {
    UNTITLED.to_string()
}

fn title_or_placeholder<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_title))
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Error type for archive loading
#[derive(Debug)]
pub enum ArchiveError {
    Io(std::io::Error),
    Json(serde_json::Error),
    NotAnArchive(String),
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveError::Io(e) => write!(f, "IO error: {}", e),
            ArchiveError::Json(e) => write!(f, "Invalid JSON: {}", e),
            ArchiveError::NotAnArchive(msg) => write!(f, "Not a chat archive: {}", msg),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::Io(e) => Some(e),
            ArchiveError::Json(e) => Some(e),
            ArchiveError::NotAnArchive(_) => None,
        }
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(e: std::io::Error) -> Self {
        ArchiveError::Io(e)
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(e: serde_json::Error) -> Self {
        ArchiveError::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Parse archive JSON text.
///
/// Accepts either a bare array of conversations or an object wrapping one
/// under a `conversations` key.
pub fn parse_archive(json: &str) -> Result<Vec<Conversation>> {
    let document: Value = serde_json::from_str(json)?;

    let records = match document {
        list @ Value::Array(_) => list,
        Value::Object(mut obj) => match obj.remove("conversations") {
            Some(list @ Value::Array(_)) => list,
            Some(_) => {
                return Err(ArchiveError::NotAnArchive(
                    "`conversations` is not an array".to_string(),
                ))
            }
            None => {
                return Err(ArchiveError::NotAnArchive(
                    "expected an array of conversations".to_string(),
                ))
            }
        },
        other => {
            return Err(ArchiveError::NotAnArchive(format!(
                "expected an array of conversations, found {}",
                json_kind(&other)
            )))
        }
    };

    Ok(serde_json::from_value(records)?)
}

/// Read and parse an archive file
pub fn load_archive<P: AsRef<Path>>(path: P) -> Result<Vec<Conversation>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let conversations = parse_archive(&contents)?;
    tracing::debug!(
        path = %path.display(),
        conversations = conversations.len(),
        "loaded archive"
    );
    Ok(conversations)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

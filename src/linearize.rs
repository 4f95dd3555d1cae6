//! Conversation linearization
//!
//! Flattens a conversation's node mapping into the ordered list of turns a
//! reader sees. Exports encode one dominant path through each tree via
//! first-child pointers: the walk starts at the first child of `"root"` and
//! always descends into `children[0]`. Sibling branches (regenerated or
//! edited replies) are dropped.
//!
//! Linearization never fails. Missing roots, dangling child ids and
//! message-less leaves end the walk; message-less interior nodes are
//! stepped over. A conversation that yields no turns is a normal result.

use crate::archive::{Conversation, Mapping, Message};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Id of the synthetic node every mapping hangs off
pub const ROOT_ID: &str = "root";

/// Shown in place of empty or missing message content
pub const NO_CONTENT_PLACEHOLDER: &str = "[no content]";

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerRole {
    User,
    Assistant,
}

impl SpeakerRole {
    pub fn label(&self) -> &'static str {
        match self {
            SpeakerRole::User => "User",
            SpeakerRole::Assistant => "Assistant",
        }
    }
}

impl std::fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Infer the speaker of a node from its id.
///
/// Exported ids count up from 1 under the root and alternate between the two
/// speakers, so odd ids are user turns and even ids are assistant turns.
/// The archive carries no explicit role field; if it ever does, this is the
/// only place that needs to change.
///
/// Ids that are not plain decimal numbers are attributed to the assistant.
pub fn speaker_role(node_id: &str) -> SpeakerRole {
    let id = node_id.trim();
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return SpeakerRole::Assistant;
    }

    // Last digit decides parity, so ids wider than u64 still work
    match id.as_bytes()[id.len() - 1] % 2 {
        1 => SpeakerRole::User,
        _ => SpeakerRole::Assistant,
    }
}

/// One speaker-attributed message, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Mapping id this turn came from
    pub node_id: String,
    pub role: SpeakerRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

impl Turn {
    fn from_message(node_id: &str, message: &Message) -> Self {
        let content = message
            .content
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(NO_CONTENT_PLACEHOLDER)
            .to_string();

        let reasoning_content = message
            .reasoning_content
            .as_ref()
            .filter(|r| !r.is_empty())
            .cloned();

        Self {
            node_id: node_id.to_string(),
            role: speaker_role(node_id),
            content,
            reasoning_content,
        }
    }
}

/// A linearized conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub id: String,
    pub title: String,
    pub inserted_at: String,
    pub updated_at: String,
    pub turns: Vec<Turn>,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Title to show, falling back to `placeholder` when blank
    pub fn display_title<'a>(&'a self, placeholder: &'a str) -> &'a str {
        if self.title.trim().is_empty() {
            placeholder
        } else {
            &self.title
        }
    }

    /// Timestamp to show in listings: creation time, else last update
    pub fn display_date(&self) -> &str {
        if self.inserted_at.is_empty() {
            &self.updated_at
        } else {
            &self.inserted_at
        }
    }
}

/// Walk a mapping from `"root"` along first children, emitting a turn for
/// every node that carries a message.
pub fn linearize(mapping: &Mapping) -> Vec<Turn> {
    let mut turns = Vec::new();

    let Some(root) = mapping.get(ROOT_ID) else {
        return turns;
    };

    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(ROOT_ID);

    let mut next = root.children.first();
    while let Some(id) = next {
        let Some(node) = mapping.get(id.as_str()) else {
            tracing::trace!(node_id = %id, "dangling child reference, stopping");
            break;
        };

        if !visited.insert(id.as_str()) {
            tracing::warn!(node_id = %id, "cycle in conversation mapping, stopping");
            break;
        }

        if let Some(message) = &node.message {
            turns.push(Turn::from_message(id, message));
        }

        next = node.children.first();
    }

    turns
}

/// Linearize a single conversation, carrying its metadata along
pub fn linearize_conversation(conversation: &Conversation) -> Transcript {
    Transcript {
        id: conversation.id.clone(),
        title: conversation.title.clone(),
        inserted_at: conversation.inserted_at.clone(),
        updated_at: conversation.updated_at.clone(),
        turns: linearize(&conversation.mapping),
    }
}

/// Linearize every conversation in an archive, in archive order.
///
/// Conversations are independent so they are processed in parallel.
pub fn linearize_archive(conversations: &[Conversation]) -> Vec<Transcript> {
    conversations
        .par_iter()
        .map(linearize_conversation)
        .collect()
}

use std::{collections::HashSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PollError, Result};

pub const POLL_ID_LEN: usize = 21;
pub const MAX_POLL_ID_LEN: usize = 64;
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_OPTIONS: usize = 32;
pub const MAX_LABEL_LEN: usize = 100;

/// Opaque, URL-safe poll identifier (21 characters when generated here).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollId(String);

impl PollId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        use rand::{Rng, rng};

        const ALPHABET: &[u8] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

        let mut rng = rng();
        let id = (0..POLL_ID_LEN)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    /// Accept an identifier supplied by a client.
    ///
    /// Anything that could never have been issued yields `None`, which callers
    /// treat the same as an unknown poll.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > MAX_POLL_ID_LEN {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PollId> for String {
    fn from(id: PollId) -> Self {
        id.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionId(pub Uuid);

impl OptionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for OptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A labeled choice. Label is unique within its poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: OptionId,
    pub label: String,
    pub position: i32,
}

/// A titled question with a fixed set of options. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: PollId,
    pub title: String,
    pub options: Vec<PollOption>,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// Build a poll with fresh identifiers from validated input.
    pub fn create(new_poll: NewPoll) -> Result<Self> {
        let NewPoll { title, options } = new_poll.validate()?;

        let options = options
            .into_iter()
            .enumerate()
            .map(|(position, label)| PollOption {
                id: OptionId::new(),
                label,
                position: position as i32,
            })
            .collect();

        Ok(Self {
            id: PollId::generate(),
            title,
            options,
            created_at: Utc::now(),
        })
    }

    pub fn option_by_label(&self, label: &str) -> Option<&PollOption> {
        self.options.iter().find(|option| option.label == label)
    }
}

/// Request to create a poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPoll {
    pub title: String,
    pub options: Vec<String>,
}

impl NewPoll {
    pub fn new<I, S>(title: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Trim and check the title and labels; labels must be unique.
    pub fn validate(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(PollError::InvalidRequest("Poll title is required".into()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(PollError::InvalidRequest(format!(
                "Poll title exceeds {MAX_TITLE_LEN} characters"
            )));
        }

        if self.options.is_empty() {
            return Err(PollError::InvalidRequest(
                "At least one option is required".into(),
            ));
        }
        if self.options.len() > MAX_OPTIONS {
            return Err(PollError::InvalidRequest(format!(
                "A poll may have at most {MAX_OPTIONS} options"
            )));
        }

        let mut seen = HashSet::with_capacity(self.options.len());
        let mut options = Vec::with_capacity(self.options.len());
        for label in self.options {
            let label = label.trim().to_string();
            if label.is_empty() {
                return Err(PollError::InvalidRequest(
                    "Option labels must not be empty".into(),
                ));
            }
            if label.chars().count() > MAX_LABEL_LEN {
                return Err(PollError::InvalidRequest(format!(
                    "Option label exceeds {MAX_LABEL_LEN} characters"
                )));
            }
            if !seen.insert(label.clone()) {
                return Err(PollError::InvalidRequest(format!(
                    "Duplicate option label: {label}"
                )));
            }
            options.push(label);
        }

        Ok(Self { title, options })
    }
}

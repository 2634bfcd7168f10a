use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every entry is written on behalf of this single pseudo-user.
pub const PLACEHOLDER_USER_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub title: String,
    pub body: String,
    pub user_id: i64,
    pub id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must not be blank")]
    BlankTitle,
    #[error("body must not be blank")]
    BlankBody,
}

/// Trimmed title and body that passed validation, ready to become a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    title: String,
    body: String,
}

impl EntryDraft {
    pub fn new(title: &str, body: &str) -> Result<Self, ValidationError> {
        let title = title.trim();
        let body = body.trim();
        if title.is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        if body.is_empty() {
            return Err(ValidationError::BlankBody);
        }
        Ok(EntryDraft {
            title: title.to_string(),
            body: body.to_string(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_entry(self, id: i64, user_id: i64) -> JournalEntry {
        JournalEntry {
            title: self.title,
            body: self.body,
            user_id,
            id,
        }
    }
}

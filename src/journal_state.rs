use crate::api_service::FetchError;
use crate::journal_entry::JournalEntry;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Only this many entries from the initial load are kept.
pub const INITIAL_ENTRY_LIMIT: usize = 10;

pub const NOTICE_TTL: Duration = Duration::from_secs(4);

pub const LOAD_FAILED: &str = "Failed to load journal entries. Please try again.";
pub const DELETE_FAILED: &str = "Failed to delete entry. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    Loading,
    Ready,
    Errored(String),
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    raised_at: Instant,
}

/// The entry list and everything the list view renders from it.
#[derive(Debug)]
pub struct JournalState {
    status: ListStatus,
    entries: Vec<JournalEntry>,
    important: HashSet<i64>,
    notice: Option<Notice>,
    last_synced: Option<DateTime<Local>>,
}

impl Default for JournalState {
    fn default() -> Self {
        JournalState::new()
    }
}

impl JournalState {
    pub fn new() -> Self {
        JournalState {
            status: ListStatus::Loading,
            entries: Vec::new(),
            important: HashSet::new(),
            notice: None,
            last_synced: None,
        }
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    pub fn get_entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn last_synced(&self) -> Option<DateTime<Local>> {
        self.last_synced
    }

    pub fn begin_load(&mut self) {
        self.status = ListStatus::Loading;
    }

    pub fn finish_load(&mut self, result: Result<Vec<JournalEntry>, FetchError>) {
        match result {
            Ok(mut entries) => {
                entries.truncate(INITIAL_ENTRY_LIMIT);
                debug!(count = entries.len(), "journal entries loaded");
                self.entries = entries;
                self.status = ListStatus::Ready;
                self.touch();
            }
            Err(err) => {
                warn!(error = %err, "loading journal entries failed");
                self.status = ListStatus::Errored(LOAD_FAILED.to_string());
            }
        }
    }

    pub fn insert_created(&mut self, entry: JournalEntry) {
        self.entries.insert(0, entry);
        self.touch();
    }

    pub fn replace_updated(&mut self, updated_entry: JournalEntry) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == updated_entry.id) {
            *entry = updated_entry;
            self.touch();
        } else {
            debug!(id = updated_entry.id, "updated entry is no longer listed");
        }
    }

    pub fn remove_deleted(&mut self, id: i64) {
        self.entries.retain(|e| e.id != id);
        self.important.remove(&id);
        self.touch();
    }

    pub fn toggle_important(&mut self, id: i64) {
        if !self.important.insert(id) {
            self.important.remove(&id);
        }
    }

    pub fn is_important(&self, id: i64) -> bool {
        self.important.contains(&id)
    }

    /// Placeholder id for a new entry's payload. The server assigns the real one.
    pub fn next_synthetic_id(&self) -> i64 {
        let count = self.entries.len() as i64;
        let highest = self.entries.iter().map(|e| e.id).max().unwrap_or(0);
        highest.max(count).checked_add(1).unwrap_or_else(|| {
            // Top of the range is taken; pick the smallest id not in the view.
            (1..=count + 1)
                .find(|id| self.entries.iter().all(|e| e.id != *id))
                .unwrap_or(count + 1)
        })
    }

    pub fn raise_notice(&mut self, message: &str, now: Instant) {
        self.notice = Some(Notice {
            message: message.to_string(),
            raised_at: now,
        });
    }

    pub fn expire_notice(&mut self, now: Instant) {
        if let Some(notice) = &self.notice {
            if now.duration_since(notice.raised_at) >= NOTICE_TTL {
                self.notice = None;
            }
        }
    }

    fn touch(&mut self) {
        self.last_synced = Some(Local::now());
    }
}

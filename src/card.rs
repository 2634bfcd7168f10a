use crate::journal_entry::JournalEntry;
use std::collections::{HashMap, HashSet};
use unicode_width::UnicodeWidthChar;

/// Delete flow of a single card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePhase {
    #[default]
    Idle,
    Confirming,
    Deleting,
}

/// Per-card delete phases, keyed by entry id. Cards not present are idle.
#[derive(Debug, Default)]
pub struct CardStates {
    phases: HashMap<i64, DeletePhase>,
}

impl CardStates {
    pub fn phase(&self, id: i64) -> DeletePhase {
        self.phases.get(&id).copied().unwrap_or_default()
    }

    /// Idle -> Confirming. A card already deleting stays as it is.
    pub fn request_delete(&mut self, id: i64) -> bool {
        match self.phase(id) {
            DeletePhase::Idle => {
                self.phases.insert(id, DeletePhase::Confirming);
                true
            }
            DeletePhase::Confirming | DeletePhase::Deleting => false,
        }
    }

    pub fn cancel(&mut self, id: i64) {
        if self.phase(id) == DeletePhase::Confirming {
            self.phases.remove(&id);
        }
    }

    /// Confirming -> Deleting. Returns whether the delete call should go out.
    pub fn confirm(&mut self, id: i64) -> bool {
        if self.phase(id) == DeletePhase::Confirming {
            self.phases.insert(id, DeletePhase::Deleting);
            true
        } else {
            false
        }
    }

    pub fn finish(&mut self, id: i64) {
        self.phases.remove(&id);
    }

    /// Forgets phases of cards that are no longer listed.
    pub fn retain_live(&mut self, live: &HashSet<i64>) {
        self.phases.retain(|id, _| live.contains(id));
    }
}

pub fn meta_line(entry: &JournalEntry) -> String {
    format!("User ID: {} | Post ID: {}", entry.user_id, entry.id)
}

/// Flattens `text` onto one line and cuts it to `max_width` terminal columns,
/// ending in an ellipsis when anything was dropped.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let full_width: usize = flat.chars().filter_map(|c| c.width()).sum();
    if full_width <= max_width {
        return flat;
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in flat.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

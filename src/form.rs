use crate::journal_entry::{EntryDraft, JournalEntry};

pub const SAVE_FAILED: &str = "Failed to save journal entry. Please check your connection.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(JournalEntry),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Body,
}

/// The modal used both to write a new entry and to edit an existing one.
#[derive(Debug, Clone)]
pub struct EntryForm {
    mode: FormMode,
    pub title: String,
    pub body: String,
    focus: Field,
    saving: bool,
    error: Option<String>,
}

impl EntryForm {
    pub fn new_entry() -> Self {
        EntryForm {
            mode: FormMode::Create,
            title: String::new(),
            body: String::new(),
            focus: Field::Title,
            saving: false,
            error: None,
        }
    }

    pub fn edit(entry: &JournalEntry) -> Self {
        EntryForm {
            mode: FormMode::Edit(entry.clone()),
            title: entry.title.clone(),
            body: entry.body.clone(),
            focus: Field::Title,
            saving: false,
            error: None,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn is_new(&self) -> bool {
        self.mode == FormMode::Create
    }

    pub fn heading(&self) -> &'static str {
        if self.is_new() {
            "New Journal Entry"
        } else {
            "Edit Entry"
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_new() {
            "Create Entry"
        } else {
            "Update Entry"
        }
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn can_submit(&self) -> bool {
        !self.saving && EntryDraft::new(&self.title, &self.body).is_ok()
    }

    pub fn can_close(&self) -> bool {
        !self.saving
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Title => Field::Body,
            Field::Body => Field::Title,
        };
    }

    pub fn input_char(&mut self, c: char) {
        if self.saving {
            return;
        }
        self.focused_text().push(c);
    }

    pub fn backspace(&mut self) {
        if self.saving {
            return;
        }
        self.focused_text().pop();
    }

    /// Enter: moves on from the title, starts a new line in the body.
    pub fn enter(&mut self) {
        match self.focus {
            Field::Title => self.focus = Field::Body,
            Field::Body => self.input_char('\n'),
        }
    }

    /// Validates and marks the form as saving. `None` means nothing should be sent.
    pub fn submit(&mut self) -> Option<EntryDraft> {
        if self.saving {
            return None;
        }
        let draft = EntryDraft::new(&self.title, &self.body).ok()?;
        self.error = None;
        self.saving = true;
        Some(draft)
    }

    /// Records the save result. Returns `true` when the form should close.
    pub fn finish_save<E>(&mut self, result: Result<(), E>) -> bool {
        self.saving = false;
        match result {
            Ok(()) => true,
            Err(_) => {
                self.error = Some(SAVE_FAILED.to_string());
                false
            }
        }
    }

    fn focused_text(&mut self) -> &mut String {
        match self.focus {
            Field::Title => &mut self.title,
            Field::Body => &mut self.body,
        }
    }
}

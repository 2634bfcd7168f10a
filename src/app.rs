use crate::api_service::FetchError;
use crate::card::{CardStates, DeletePhase};
use crate::form::{EntryForm, FormMode};
use crate::journal_api::JournalApi;
use crate::journal_entry::{JournalEntry, PLACEHOLDER_USER_ID};
use crate::journal_state::{JournalState, ListStatus, DELETE_FAILED};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashSet;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// Result of a request task, delivered back to the UI loop.
#[derive(Debug)]
pub enum Outcome {
    Loaded(Result<Vec<JournalEntry>, FetchError>),
    Created(Result<JournalEntry, FetchError>),
    Updated(Result<JournalEntry, FetchError>),
    Deleted {
        id: i64,
        result: Result<(), FetchError>,
    },
}

pub struct App {
    journal: JournalState,
    cards: CardStates,
    form: Option<EntryForm>,
    selected: usize,
    spinner_frame: usize,
    should_quit: bool,
    api: JournalApi,
    outcomes: UnboundedSender<Outcome>,
}

impl App {
    pub fn new(api: JournalApi, outcomes: UnboundedSender<Outcome>) -> Self {
        App {
            journal: JournalState::new(),
            cards: CardStates::default(),
            form: None,
            selected: 0,
            spinner_frame: 0,
            should_quit: false,
            api,
            outcomes,
        }
    }

    pub fn journal(&self) -> &JournalState {
        &self.journal
    }

    pub fn cards(&self) -> &CardStates {
        &self.cards
    }

    pub fn form(&self) -> Option<&EntryForm> {
        self.form.as_ref()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn selected_entry(&self) -> Option<&JournalEntry> {
        self.journal.get_entries().get(self.selected)
    }

    pub fn start_load(&mut self) {
        self.journal.begin_load();
        let api = self.api.clone();
        self.dispatch(async move { Outcome::Loaded(api.list().await) });
    }

    pub fn tick(&mut self, now: Instant) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
        self.journal.expire_notice(now);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.form.is_some() {
            self.handle_form_key(key);
        } else {
            self.handle_list_key(key);
        }
    }

    pub fn apply(&mut self, outcome: Outcome) {
        let selected_id = self.selected_entry().map(|e| e.id);
        match outcome {
            Outcome::Loaded(result) => {
                self.journal.finish_load(result);
                self.prune_cards();
                self.selected = 0;
                return;
            }
            Outcome::Created(result) => {
                let saved = match result {
                    Ok(entry) => {
                        info!(id = entry.id, "journal entry created");
                        self.journal.insert_created(entry);
                        Ok(())
                    }
                    Err(err) => Err(err),
                };
                self.finish_save(saved);
            }
            Outcome::Updated(result) => {
                let saved = match result {
                    Ok(entry) => {
                        info!(id = entry.id, "journal entry updated");
                        self.journal.replace_updated(entry);
                        Ok(())
                    }
                    Err(err) => Err(err),
                };
                self.finish_save(saved);
            }
            Outcome::Deleted { id, result } => {
                self.cards.finish(id);
                match result {
                    Ok(()) => {
                        info!(id, "journal entry deleted");
                        self.journal.remove_deleted(id);
                        self.prune_cards();
                    }
                    Err(err) => {
                        warn!(id, error = %err, "deleting journal entry failed");
                        self.journal.raise_notice(DELETE_FAILED, Instant::now());
                    }
                }
            }
        }
        self.follow_selection(selected_id);
    }

    fn finish_save(&mut self, result: Result<(), FetchError>) {
        if let Err(err) = &result {
            warn!(error = %err, "saving journal entry failed");
        }
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if form.finish_save(result) {
            self.form = None;
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        if let Some(id) = self.selected_entry().map(|e| e.id) {
            if self.cards.phase(id) == DeletePhase::Confirming {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => self.confirm_delete(id),
                    KeyCode::Char('n') | KeyCode::Esc => self.cards.cancel(id),
                    KeyCode::Char('q') => self.should_quit = true,
                    _ => {}
                }
                return;
            }
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('n') => self.form = Some(EntryForm::new_entry()),
            KeyCode::Char('r') if matches!(self.journal.status(), ListStatus::Errored(_)) => {
                self.start_load()
            }
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.journal.get_entries().len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('e') => {
                if let Some(entry) = self.selected_entry() {
                    self.form = Some(EntryForm::edit(entry));
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_entry().map(|e| e.id) {
                    self.cards.request_delete(id);
                }
            }
            KeyCode::Char('i') | KeyCode::Char(' ') => {
                if let Some(id) = self.selected_entry().map(|e| e.id) {
                    self.journal.toggle_important(id);
                }
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.submit_form()
            }
            KeyCode::Esc => {
                if form.can_close() {
                    self.form = None;
                }
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_focus(),
            KeyCode::Enter => form.enter(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.input_char(c),
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let next_id = self.journal.next_synthetic_id();
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let Some(draft) = form.submit() else {
            return;
        };

        let api = self.api.clone();
        match form.mode().clone() {
            FormMode::Create => {
                let entry = draft.into_entry(next_id, PLACEHOLDER_USER_ID);
                self.dispatch(async move { Outcome::Created(api.create(&entry).await) });
            }
            FormMode::Edit(original) => {
                let entry = draft.into_entry(original.id, original.user_id);
                self.dispatch(async move { Outcome::Updated(api.update(&entry).await) });
            }
        }
    }

    fn confirm_delete(&mut self, id: i64) {
        if !self.cards.confirm(id) {
            return;
        }
        let api = self.api.clone();
        self.dispatch(async move {
            Outcome::Deleted {
                id,
                result: api.delete(id).await,
            }
        });
    }

    fn dispatch<F>(&self, request: F)
    where
        F: std::future::Future<Output = Outcome> + Send + 'static,
    {
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            if outcomes.send(request.await).is_err() {
                warn!("UI loop is gone, dropping request outcome");
            }
        });
    }

    /// Keeps the cursor on the same entry after the list shifted under it.
    fn follow_selection(&mut self, selected_id: Option<i64>) {
        let entries = self.journal.get_entries();
        if let Some(index) = selected_id.and_then(|id| entries.iter().position(|e| e.id == id)) {
            self.selected = index;
        } else if self.selected >= entries.len() {
            self.selected = entries.len().saturating_sub(1);
        }
    }

    fn prune_cards(&mut self) {
        let live: HashSet<i64> = self.journal.get_entries().iter().map(|e| e.id).collect();
        self.cards.retain_live(&live);
    }
}

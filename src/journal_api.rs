use crate::api_service::{FetchError, Method, RequestOptions, ResilientFetch};
use crate::journal_entry::JournalEntry;
use tracing::info;

/// CRUD calls against the remote posts collection.
#[derive(Clone)]
pub struct JournalApi {
    fetch: ResilientFetch,
    base_url: String,
}

impl JournalApi {
    pub fn new(base_url: &str, fetch: ResilientFetch) -> Self {
        JournalApi {
            fetch,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn entry_url(&self, id: i64) -> String {
        format!("{}/{}", self.base_url, id)
    }

    pub async fn list(&self) -> Result<Vec<JournalEntry>, FetchError> {
        info!(url = %self.base_url, "loading journal entries");
        self.fetch
            .request_json(&self.base_url, &RequestOptions::default())
            .await
    }

    pub async fn create(&self, entry: &JournalEntry) -> Result<JournalEntry, FetchError> {
        info!(synthesized_id = entry.id, "creating journal entry");
        let options = RequestOptions::json(Method::Post, entry)?;
        self.fetch.request_json(&self.base_url, &options).await
    }

    pub async fn update(&self, entry: &JournalEntry) -> Result<JournalEntry, FetchError> {
        info!(id = entry.id, "updating journal entry");
        let options = RequestOptions::json(Method::Put, entry)?;
        self.fetch
            .request_json(&self.entry_url(entry.id), &options)
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), FetchError> {
        info!(id, "deleting journal entry");
        self.fetch
            .request(&self.entry_url(id), &RequestOptions::method(Method::Delete))
            .await?;
        Ok(())
    }
}

//! Persistence of selection history and named field templates.
//!
//! Backends implement [`SelectionStore`] and differ only in where the
//! data lives: [`MemStore`] is the fallback mode for running without
//! storage, [`FileStore`] keeps a JSON document on disk. Both share the
//! same in-memory [`State`] so the retention and ordering invariants are
//! written once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod file;
mod mem;

pub use file::FileStore;
pub use mem::MemStore;

/// Most recent history entries a store retains.
pub const MAX_HISTORY: usize = 10;

/// One recorded field selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub name: String,
    pub fields: Vec<String>,
    pub field_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// A named, reusable field selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub fields: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub usage_count: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error while accessing store: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("a template named '{0}' already exists")]
    DuplicateName(String),

    #[error("no template with id {0}")]
    NotFound(u64),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Selection persistence.
///
/// Name uniqueness for templates is checked case-insensitively; the
/// stored name keeps its original case.
pub trait SelectionStore: Send + Sync {
    fn add_history(&self, name: &str, fields: &[String]) -> StoreResult<HistoryEntry>;

    /// Most-recent-first, at most [`MAX_HISTORY`] entries.
    fn list_history(&self) -> StoreResult<Vec<HistoryEntry>>;

    fn get_history(&self, id: u64) -> StoreResult<Option<HistoryEntry>>;

    /// Fails with [`StoreError::DuplicateName`] when `name` collides
    /// case-insensitively with an existing template.
    fn add_template(
        &self,
        name: &str,
        description: &str,
        fields: &[String],
    ) -> StoreResult<Template>;

    /// Ordered by usage count, then creation time, both descending.
    fn list_templates(&self) -> StoreResult<Vec<Template>>;

    fn get_template(&self, id: u64) -> StoreResult<Option<Template>>;

    /// Fails with [`StoreError::NotFound`] for an unknown id.
    fn increment_usage(&self, id: u64) -> StoreResult<()>;

    /// Returns the removed template, `None` for an unknown id.
    fn delete_template(&self, id: u64) -> StoreResult<Option<Template>>;
}

/// The store's complete contents. Ids are assigned monotonically so they
/// stay unique for the lifetime of the state, including across reloads
/// of a persisted store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct State {
    history: Vec<HistoryEntry>,
    templates: Vec<Template>,
    next_id: u64,
}

impl State {
    fn take_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn add_history(&mut self, name: &str, fields: &[String]) -> HistoryEntry {
        let entry = HistoryEntry {
            id: self.take_id(),
            name: name.trim().to_string(),
            fields: fields.to_vec(),
            field_count: fields.len(),
            timestamp: Utc::now(),
        };
        self.history.insert(0, entry.clone());
        self.history.truncate(MAX_HISTORY);
        entry
    }

    pub(crate) fn list_history(&self) -> Vec<HistoryEntry> {
        self.history.clone()
    }

    pub(crate) fn get_history(&self, id: u64) -> Option<HistoryEntry> {
        self.history.iter().find(|entry| entry.id == id).cloned()
    }

    pub(crate) fn add_template(
        &mut self,
        name: &str,
        description: &str,
        fields: &[String],
    ) -> StoreResult<Template> {
        let name = name.trim();
        let lowered = name.to_lowercase();
        if self
            .templates
            .iter()
            .any(|template| template.name.to_lowercase() == lowered)
        {
            return Err(StoreError::DuplicateName(name.to_string()));
        }

        let template = Template {
            id: self.take_id(),
            name: name.to_string(),
            description: description.trim().to_string(),
            fields: fields.to_vec(),
            created_at: Utc::now(),
            usage_count: 0,
        };
        self.templates.push(template.clone());
        Ok(template)
    }

    pub(crate) fn list_templates(&self) -> Vec<Template> {
        let mut templates = self.templates.clone();
        templates.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then(b.created_at.cmp(&a.created_at))
        });
        templates
    }

    pub(crate) fn get_template(&self, id: u64) -> Option<Template> {
        self.templates.iter().find(|template| template.id == id).cloned()
    }

    pub(crate) fn increment_usage(&mut self, id: u64) -> StoreResult<()> {
        match self.templates.iter_mut().find(|template| template.id == id) {
            Some(template) => {
                template.usage_count += 1;
                Ok(())
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    pub(crate) fn delete_template(&mut self, id: u64) -> Option<Template> {
        let index = self
            .templates
            .iter()
            .position(|template| template.id == id)?;
        Some(self.templates.remove(index))
    }
}

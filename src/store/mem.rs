use std::sync::Mutex;

use super::{HistoryEntry, SelectionStore, State, StoreResult, Template};

/// In-memory store, the fallback mode for running without persistent
/// storage. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemStore {
    state: Mutex<State>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStore for MemStore {
    fn add_history(&self, name: &str, fields: &[String]) -> StoreResult<HistoryEntry> {
        let mut state = self.state.lock().unwrap();
        Ok(state.add_history(name, fields))
    }

    fn list_history(&self) -> StoreResult<Vec<HistoryEntry>> {
        Ok(self.state.lock().unwrap().list_history())
    }

    fn get_history(&self, id: u64) -> StoreResult<Option<HistoryEntry>> {
        Ok(self.state.lock().unwrap().get_history(id))
    }

    fn add_template(
        &self,
        name: &str,
        description: &str,
        fields: &[String],
    ) -> StoreResult<Template> {
        let mut state = self.state.lock().unwrap();
        state.add_template(name, description, fields)
    }

    fn list_templates(&self) -> StoreResult<Vec<Template>> {
        Ok(self.state.lock().unwrap().list_templates())
    }

    fn get_template(&self, id: u64) -> StoreResult<Option<Template>> {
        Ok(self.state.lock().unwrap().get_template(id))
    }

    fn increment_usage(&self, id: u64) -> StoreResult<()> {
        self.state.lock().unwrap().increment_usage(id)
    }

    fn delete_template(&self, id: u64) -> StoreResult<Option<Template>> {
        Ok(self.state.lock().unwrap().delete_template(id))
    }
}

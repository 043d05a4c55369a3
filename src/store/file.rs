use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{HistoryEntry, SelectionStore, State, StoreResult, Template};

/// JSON-file-backed store. The whole state lives in one document that is
/// loaded per operation and rewritten atomically (tmp file + rename) on
/// every mutation. A missing file is an empty store.
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileStore {
            path: path.as_ref().to_path_buf(),
            guard: Mutex::new(()),
        }
    }

    fn load(&self) -> StoreResult<State> {
        if !self.path.exists() {
            return Ok(State::default());
        }
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, state: &State) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SelectionStore for FileStore {
    fn add_history(&self, name: &str, fields: &[String]) -> StoreResult<HistoryEntry> {
        let _guard = self.guard.lock().unwrap();
        let mut state = self.load()?;
        let entry = state.add_history(name, fields);
        self.save(&state)?;
        Ok(entry)
    }

    fn list_history(&self) -> StoreResult<Vec<HistoryEntry>> {
        let _guard = self.guard.lock().unwrap();
        Ok(self.load()?.list_history())
    }

    fn get_history(&self, id: u64) -> StoreResult<Option<HistoryEntry>> {
        let _guard = self.guard.lock().unwrap();
        Ok(self.load()?.get_history(id))
    }

    fn add_template(
        &self,
        name: &str,
        description: &str,
        fields: &[String],
    ) -> StoreResult<Template> {
        let _guard = self.guard.lock().unwrap();
        let mut state = self.load()?;
        let template = state.add_template(name, description, fields)?;
        self.save(&state)?;
        Ok(template)
    }

    fn list_templates(&self) -> StoreResult<Vec<Template>> {
        let _guard = self.guard.lock().unwrap();
        Ok(self.load()?.list_templates())
    }

    fn get_template(&self, id: u64) -> StoreResult<Option<Template>> {
        let _guard = self.guard.lock().unwrap();
        Ok(self.load()?.get_template(id))
    }

    fn increment_usage(&self, id: u64) -> StoreResult<()> {
        let _guard = self.guard.lock().unwrap();
        let mut state = self.load()?;
        state.increment_usage(id)?;
        self.save(&state)
    }

    fn delete_template(&self, id: u64) -> StoreResult<Option<Template>> {
        let _guard = self.guard.lock().unwrap();
        let mut state = self.load()?;
        let removed = state.delete_template(id);
        if removed.is_some() {
            self.save(&state)?;
        }
        Ok(removed)
    }
}

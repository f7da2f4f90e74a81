use color_eyre::Result;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Load history entries from `path`, oldest first. A missing file is empty history.
pub fn load_history(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(fs::File::open(path)?);
    let mut history = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            history.push(line);
        }
    }
    Ok(history)
}

/// Write the most recent `limit` entries to `path`.
pub fn save_history(path: &Path, history: &[String], limit: usize) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut file = fs::File::create(path)?;
    let start = history.len().saturating_sub(limit);
    for entry in history.iter().skip(start) {
        writeln!(file, "{}", entry)?;
    }
    Ok(())
}

/// Add entry to history, skipping consecutive duplicates
pub fn add_to_history(history: &mut Vec<String>, entry: String) {
    if history.last() == Some(&entry) {
        return;
    }
    history.push(entry);
}

/// Submitted prompts with Up/Down navigation, persisted to a cache file.
#[derive(Debug, Default)]
pub struct PromptHistory {
    path: Option<PathBuf>,
    entries: Vec<String>,
    limit: usize,
    /// Position while navigating; `None` when editing a fresh prompt.
    index: Option<usize>,
    /// The unsent prompt, restored when navigating past the newest entry.
    draft: Option<String>,
    loaded: bool,
}

impl PromptHistory {
    /// History kept in memory only.
    pub fn in_memory(limit: usize) -> Self {
        Self {
            limit,
            loaded: true,
            ..Self::default()
        }
    }

    /// History backed by `path`, read on first navigation.
    pub fn persistent(path: PathBuf, limit: usize) -> Self {
        Self {
            path: Some(path),
            limit,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        if let Some(path) = &self.path {
            match load_history(path) {
                Ok(mut stored) => {
                    stored.append(&mut self.entries);
                    self.entries = stored;
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not load prompt history"),
            }
        }
    }

    /// Record a submitted prompt and persist it.
    pub fn record(&mut self, prompt: &str) {
        self.ensure_loaded();
        self.reset_navigation();
        add_to_history(&mut self.entries, prompt.to_string());
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        if let Some(path) = &self.path {
            if let Err(e) = save_history(path, &self.entries, self.limit) {
                tracing::warn!(path = %path.display(), error = %e, "could not save prompt history");
            }
        }
    }

    /// Step to an older entry. `current` is the text being edited.
    pub fn older(&mut self, current: &str) -> Option<String> {
        self.ensure_loaded();
        if self.entries.is_empty() {
            return None;
        }
        let index = match self.index {
            None => {
                self.draft = Some(current.to_string());
                self.entries.len() - 1
            }
            Some(i) => i.saturating_sub(1),
        };
        self.index = Some(index);
        self.entries.get(index).cloned()
    }

    /// Step to a newer entry, ending at the saved draft.
    pub fn newer(&mut self) -> Option<String> {
        let index = self.index?;
        if index + 1 >= self.entries.len() {
            self.index = None;
            return Some(self.draft.take().unwrap_or_default());
        }
        self.index = Some(index + 1);
        self.entries.get(index + 1).cloned()
    }

    pub fn reset_navigation(&mut self) {
        self.index = None;
        self.draft = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_to_history() {
        let mut history = Vec::new();
        add_to_history(&mut history, "query1".to_string());
        add_to_history(&mut history, "query2".to_string());
        add_to_history(&mut history, "query2".to_string());
        assert_eq!(history.len(), 2);

        // Non-consecutive duplicates are preserved
        add_to_history(&mut history, "query1".to_string());
        assert_eq!(history, vec!["query1", "query2", "query1"]);
    }

    #[test]
    fn navigation_restores_draft() {
        let mut h = PromptHistory::in_memory(10);
        h.record("first");
        h.record("second");
        assert_eq!(h.older("typing").as_deref(), Some("second"));
        assert_eq!(h.older("").as_deref(), Some("first"));
        assert_eq!(h.older("").as_deref(), Some("first"));
        assert_eq!(h.newer().as_deref(), Some("second"));
        assert_eq!(h.newer().as_deref(), Some("typing"));
        assert_eq!(h.newer(), None);
    }

    #[test]
    fn history_persists_and_respects_limit() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("prompt_history.txt");
        let mut h = PromptHistory::persistent(path.clone(), 2);
        for p in ["a", "b", "c"] {
            h.record(p);
        }
        assert_eq!(load_history(&path).unwrap(), vec!["b", "c"]);

        let mut reloaded = PromptHistory::persistent(path, 2);
        assert_eq!(reloaded.older("").as_deref(), Some("c"));
    }
}

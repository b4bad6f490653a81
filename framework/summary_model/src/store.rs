use crate::{store_run_result, ResultHistory, RunResult};
use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File holding the most recently published [RunResult]
pub const LATEST_FILE_NAME: &str = "latest.json";
/// File holding every published [RunResult] as a JSON array
pub const HISTORY_FILE_NAME: &str = "history.json";

/// Append-only store of run results on the local filesystem.
///
/// The directory is what gets served to the summariser, so the two documents are always replaced
/// atomically with a rename and a reader never sees a partially written file. A store expects a
/// single writer at a time; concurrent runs must use distinct run ids.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    /// Open a store in `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create result directory {}", dir.display()))?;

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_latest(&self) -> anyhow::Result<Option<RunResult>> {
        let path = self.dir.join(LATEST_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }

        let file = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        crate::load_run_result(file)
            .with_context(|| format!("Failed to parse {}", path.display()))
            .map(Some)
    }

    /// Load the full history. A store that has never been published to has an empty history.
    pub fn load_history(&self) -> anyhow::Result<ResultHistory> {
        let path = self.dir.join(HISTORY_FILE_NAME);
        if !path.exists() {
            return Ok(ResultHistory::new());
        }

        let file = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Append `result` to the history and make it the latest result.
    ///
    /// The history is written first so that `latest.json` never refers to a run missing from
    /// `history.json`. If the run id is already in the history nothing is written.
    pub fn publish(&self, result: &RunResult) -> anyhow::Result<()> {
        let mut history = self.load_history()?;
        history.append(result.clone())?;

        self.replace_document(HISTORY_FILE_NAME, |w| {
            serde_json::to_writer_pretty(w, &history).map_err(Into::into)
        })?;
        self.replace_document(LATEST_FILE_NAME, |w| store_run_result(result, w))?;

        log::info!(
            "Published run [{}] to {} ({} runs in history)",
            result.run_id,
            self.dir.display(),
            history.len()
        );

        Ok(())
    }

    fn replace_document<F>(&self, name: &str, write: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut tempfile::NamedTempFile) -> anyhow::Result<()>,
    {
        let target = self.dir.join(name);
        let mut file = tempfile::NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("Failed to create temporary file for {name}"))?;
        write(&mut file)?;
        file.flush()?;
        file.persist(&target)
            .with_context(|| format!("Failed to replace {}", target.display()))?;

        Ok(())
    }
}

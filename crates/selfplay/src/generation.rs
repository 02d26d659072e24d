//! Model generation naming: `{dir}/{base}_{size}_{generation}.onnx`.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const MODEL_EXTENSION: &str = "onnx";

/// Locates numbered model generations for one board size.
#[derive(Clone, Debug, Serialize)]
pub struct GenerationStore {
    dir: PathBuf,
    base_name: String,
    board_size: usize,
}

impl GenerationStore {
    pub fn new(dir: impl Into<PathBuf>, base_name: impl Into<String>, board_size: usize) -> Self {
        Self {
            dir: dir.into(),
            base_name: base_name.into(),
            board_size,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    fn stem(&self, generation: u32) -> String {
        format!("{}_{}_{}", self.base_name, self.board_size, generation)
    }

    pub fn model_path(&self, generation: u32) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.stem(generation), MODEL_EXTENSION))
    }

    /// Where the training batch for `generation` is written.
    pub fn samples_path(&self, generation: u32) -> PathBuf {
        self.dir.join(format!("{}.msgpack", self.stem(generation)))
    }

    /// Where the JSON report for training from `generation` is written.
    pub fn report_path(&self, generation: u32) -> PathBuf {
        self.dir.join(format!("{}.json", self.stem(generation)))
    }

    /// Generation number of a model file of this store, if it is one.
    pub fn parse_generation(&self, path: impl AsRef<Path>) -> Option<u32> {
        let path = path.as_ref();
        if path.extension()? != MODEL_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let prefix = format!("{}_{}_", self.base_name, self.board_size);
        stem.strip_prefix(&prefix)?.parse().ok()
    }

    /// Generations present on disk, ascending.
    pub fn list(&self) -> Result<Vec<u32>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read model directory {:?}", self.dir))?;

        let mut generations = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to list {:?}", self.dir))?;
            if let Some(generation) = self.parse_generation(entry.path()) {
                generations.push(generation);
            }
        }
        generations.sort_unstable();
        generations.dedup();
        Ok(generations)
    }

    pub fn latest(&self) -> Result<Option<u32>> {
        Ok(self.list()?.last().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gomoku-generations-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_model_path_format() {
        let store = GenerationStore::new("models", "gomoku", 15);
        assert_eq!(store.model_path(7), PathBuf::from("models/gomoku_15_7.onnx"));
        assert_eq!(store.parse_generation(store.model_path(7)), Some(7));
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        let store = GenerationStore::new("models", "gomoku", 15);
        assert_eq!(store.parse_generation("models/gomoku_9_3.onnx"), None);
        assert_eq!(store.parse_generation("models/gomoku_15_3.json"), None);
        assert_eq!(store.parse_generation("models/gomoku_15_x.onnx"), None);
        assert_eq!(store.parse_generation("models/other_15_3.onnx"), None);
    }

    #[test]
    fn test_list_is_sorted() {
        let dir = scratch_dir("list");
        let store = GenerationStore::new(&dir, "gomoku", 9);
        for generation in [10, 2, 1] {
            fs::write(store.model_path(generation), b"").unwrap();
        }
        fs::write(store.report_path(4), b"{}").unwrap();
        fs::write(dir.join("gomoku_15_99.onnx"), b"").unwrap();

        assert_eq!(store.list().unwrap(), vec![1, 2, 10]);
        assert_eq!(store.latest().unwrap(), Some(10));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let store = GenerationStore::new("/nonexistent/gomoku-models", "gomoku", 15);
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.latest().unwrap(), None);
    }
}

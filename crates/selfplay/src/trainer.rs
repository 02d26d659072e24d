//! Hand-off of a sample batch to an external training program.

use crate::generation::GenerationStore;
use anyhow::{ensure, Context};
use gomoku_core::{GomokuError, Result};
use gomoku_mcts::TrainingSample;
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Produces the next model generation from a batch of samples.
pub trait Trainer: Send + Sync {
    /// Train from `source_generation`, returning the new generation number.
    fn train(&self, source_generation: u32, samples: &[TrainingSample]) -> Result<u32>;
}

/// Batch file read by the training program.
#[derive(Serialize)]
struct TrainingBatch<'a> {
    board_size: usize,
    source_generation: u32,
    target_generation: u32,
    samples: &'a [TrainingSample],
}

/// Runs `program [args..] --source <onnx> --target <onnx> --data <msgpack>`.
#[derive(Clone, Debug)]
pub struct CommandTrainer {
    program: PathBuf,
    args: Vec<String>,
    store: GenerationStore,
}

impl CommandTrainer {
    pub fn new(program: impl Into<PathBuf>, store: GenerationStore) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            store,
        }
    }

    /// Extra arguments placed before the generated ones.
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    fn run(&self, source: u32, samples: &[TrainingSample]) -> anyhow::Result<u32> {
        let target = source + 1;
        let data_path = self.store.samples_path(source);
        let source_path = self.store.model_path(source);
        let target_path = self.store.model_path(target);

        write_batch(
            &data_path,
            &TrainingBatch {
                board_size: self.store.board_size(),
                source_generation: source,
                target_generation: target,
                samples,
            },
        )?;

        info!(
            "Training generation {} from {} samples with {:?}",
            target,
            samples.len(),
            self.program
        );
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg("--source")
            .arg(&source_path)
            .arg("--target")
            .arg(&target_path)
            .arg("--data")
            .arg(&data_path)
            .status()
            .with_context(|| format!("Failed to start trainer {:?}", self.program))?;

        ensure!(status.success(), "Trainer exited with {}", status);
        ensure!(
            target_path.exists(),
            "Trainer did not produce {:?}",
            target_path
        );
        Ok(target)
    }
}

impl Trainer for CommandTrainer {
    fn train(&self, source_generation: u32, samples: &[TrainingSample]) -> Result<u32> {
        self.run(source_generation, samples)
            .map_err(|e| GomokuError::Training(format!("{e:#}")))
    }
}

fn write_batch(path: &Path, batch: &TrainingBatch) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    // Named fields keep structs as maps for the training program.
    rmp_serde::encode::write_named(&mut writer, batch)
        .with_context(|| format!("Failed to serialize training batch to {:?}", path))?;
    Ok(())
}

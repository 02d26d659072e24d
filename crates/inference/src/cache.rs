//! Process-wide cache of loaded models keyed by path.
//!
//! Loading an ONNX session is expensive and every concurrent game of a
//! generation plays with the same network, so each path is loaded once and
//! handed out as an `Arc`.

use crate::session::OnnxModel;
use anyhow::Result;
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

type Loader<M> = Box<dyn Fn(&Path) -> Result<M> + Send + Sync>;

/// Read-mostly map from model path to loaded model.
pub struct ModelCache<M = OnnxModel> {
    models: RwLock<HashMap<PathBuf, Arc<M>>>,
    loader: Loader<M>,
}

impl ModelCache<OnnxModel> {
    /// Cache of ONNX models for `board_size`.
    pub fn onnx(board_size: usize) -> Self {
        Self::with_loader(move |path| OnnxModel::load(path, board_size))
    }
}

impl<M> ModelCache<M> {
    pub fn with_loader(loader: impl Fn(&Path) -> Result<M> + Send + Sync + 'static) -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
            loader: Box::new(loader),
        }
    }

    /// The model at `path`, loading it on first use.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<M>> {
        let path = path.as_ref();
        if let Some(model) = self.read()?.get(path) {
            return Ok(Arc::clone(model));
        }

        let mut models = self
            .models
            .write()
            .map_err(|_| anyhow::anyhow!("Model cache lock poisoned"))?;
        // Another thread may have loaded it while we waited for the lock.
        if let Some(model) = models.get(path) {
            return Ok(Arc::clone(model));
        }

        info!("Loading model {:?}", path);
        let model = Arc::new((self.loader)(path)?);
        models.insert(path.to_path_buf(), Arc::clone(&model));
        Ok(model)
    }

    /// Drop the cached entry; outstanding `Arc`s stay valid.
    pub fn unload(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        let removed = self
            .models
            .write()
            .map_err(|_| anyhow::anyhow!("Model cache lock poisoned"))?
            .remove(path)
            .is_some();
        if removed {
            debug!("Unloaded model {:?}", path);
        }
        Ok(removed)
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.read()
            .map(|models| models.contains_key(path.as_ref()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.read().map(|models| models.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<PathBuf, Arc<M>>>> {
        self.models
            .read()
            .map_err(|_| anyhow::anyhow!("Model cache lock poisoned"))
    }
}

//! Model cache: load a previously trained network or persist a new one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use hobli_nn::{Mlp, NnError};
use tracing::{debug, warn};

/// External store for a trained model.
///
/// `load` returning `None` means "train from scratch"; a store never
/// reports a failed read as an error.
pub trait ModelStore {
    /// Fetch the cached model, if a usable one exists.
    fn load(&self) -> Option<Mlp>;

    /// Persist `model`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`NnError`] if the model cannot be written.
    fn save(&self, model: &Mlp) -> Result<(), NnError>;
}

/// Store backed by a single bincode file.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    path: PathBuf,
}

impl FileModelStore {
    /// Create a store for the given model file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Path of the model file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelStore for FileModelStore {
    fn load(&self) -> Option<Mlp> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no cached model");
            return None;
        }
        match Mlp::load(&self.path) {
            Ok(model) => Some(model),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unusable cached model");
                None
            }
        }
    }

    fn save(&self, model: &Mlp) -> Result<(), NnError> {
        model.save(&self.path)
    }
}

/// In-process store, useful for sessions that should not touch disk.
#[derive(Debug, Default)]
pub struct MemoryModelStore {
    slot: Mutex<Option<Mlp>>,
    saves: AtomicUsize,
}

impl MemoryModelStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `model`.
    #[must_use]
    pub fn with_model(model: Mlp) -> Self {
        Self {
            slot: Mutex::new(Some(model)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful `save` calls.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    /// Remove the cached model.
    pub fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl ModelStore for MemoryModelStore {
    fn load(&self) -> Option<Mlp> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, model: &Mlp) -> Result<(), NnError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(model.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

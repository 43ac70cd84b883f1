use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::env;
use sha2::{Sha256, Digest};

use crate::models::{BuiltinModel, ModelInfo};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact not found at {0:?}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {path:?}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

/// Locates bundled model artifacts and checks them before they are loaded.
#[derive(Debug, Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("CAT_OR_DOG_MODELS") {
            return PathBuf::from(path);
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("cat-or-dog").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("cat-or-dog").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("cat-or-dog").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self { models_dir })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self, info: &ModelInfo) -> PathBuf {
        self.models_dir.join(&info.name).join(&info.file_name)
    }

    pub fn is_model_available(&self, model: BuiltinModel) -> bool {
        let model_path = self.get_model_path(&model.get_model_info());
        log::debug!("Model path: {:?} (exists: {})", model_path, model_path.exists());
        model_path.exists()
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        log::debug!("Verifying file: {:?}", path);
        let bytes = fs::read(path)?;
        let hash = Self::hash_bytes(&bytes);
        log::debug!("Calculated hash: {}", hash);
        log::debug!("Expected hash:   {}", expected_hash);
        Ok(hash.eq_ignore_ascii_case(expected_hash))
    }

    fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    /// Returns whether the artifact exists and, when a hash is pinned, matches it.
    pub fn verify_model(&self, info: &ModelInfo) -> Result<bool, ModelError> {
        let model_path = self.get_model_path(info);
        if !model_path.exists() {
            log::info!("Model file {:?} does not exist", model_path);
            return Ok(false);
        }
        match &info.model_hash {
            Some(expected) => self.verify_file(&model_path, expected),
            None => Ok(true),
        }
    }

    /// Resolves the artifact path for `info`, failing if it is missing or corrupted.
    pub fn locate_model(&self, info: &ModelInfo) -> Result<PathBuf, ModelError> {
        let model_path = self.get_model_path(info);
        if !model_path.exists() {
            log::error!("Model {} not found at {:?}", info.name, model_path);
            return Err(ModelError::NotFound(model_path));
        }

        if let Some(expected) = &info.model_hash {
            Self::check_hash(&model_path, expected)?;
            log::info!("Model {} verified", info.name);
        }

        Ok(model_path)
    }

    /// Fails with `HashMismatch` unless the SHA-256 of the file at `path` is `expected`.
    pub fn check_hash(path: &Path, expected: &str) -> Result<(), ModelError> {
        let actual = Self::hash_bytes(&fs::read(path)?);
        if !actual.eq_ignore_ascii_case(expected) {
            log::error!("Hash mismatch for {:?}: expected {}, got {}", path, expected, actual);
            return Err(ModelError::HashMismatch {
                path: path.to_path_buf(),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }
}

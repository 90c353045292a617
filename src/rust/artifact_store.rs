use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

/// File names making up a model artifact
pub const MODEL_FILE: &str = "model.onnx";
pub const SYMPTOMS_FILE: &str = "symptoms.json";
pub const DISEASES_FILE: &str = "diseases.json";
pub const DOCTORS_FILE: &str = "doctors.json";

/// Environment variable that overrides the artifact root
pub const HOME_ENV: &str = "MEDPREDICT_HOME";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not available: {0}")]
    NotAvailable(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Artifact verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file} file")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

/// Where an artifact can be fetched from and how to check it
#[derive(Debug, Clone)]
pub struct ArtifactInfo {
    /// Directory name of the artifact inside the store
    pub name: String,
    /// Base URL the artifact files are served under, if it can be downloaded
    pub base_url: Option<String>,
    /// Expected SHA-256 of the model file, hex encoded
    pub model_hash: Option<String>,
}

impl ArtifactInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: None,
            model_hash: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model_hash(mut self, hash: impl Into<String>) -> Self {
        self.model_hash = Some(hash.into());
        self
    }
}

/// Locates, verifies and fetches the classifier artifacts loaded at startup.
///
/// Each artifact lives in its own directory holding the ONNX model, the symptom
/// vocabulary, the disease labels and an optional doctor table.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ArtifactStore {
    /// Creates a new ArtifactStore with the default artifact root
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::default_root())
    }

    /// Returns the default artifact root
    pub fn default_root() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(HOME_ENV) {
            return PathBuf::from(path).join("artifacts");
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("medpredict").join("artifacts");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".medpredict").join("artifacts");
        }

        env::temp_dir().join("medpredict").join("artifacts")
    }

    pub fn new<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn model_path(&self, name: &str) -> PathBuf {
        self.artifact_dir(name).join(MODEL_FILE)
    }

    pub fn symptoms_path(&self, name: &str) -> PathBuf {
        self.artifact_dir(name).join(SYMPTOMS_FILE)
    }

    pub fn diseases_path(&self, name: &str) -> PathBuf {
        self.artifact_dir(name).join(DISEASES_FILE)
    }

    pub fn doctors_path(&self, name: &str) -> PathBuf {
        self.artifact_dir(name).join(DOCTORS_FILE)
    }

    fn required_paths(&self, name: &str) -> [PathBuf; 3] {
        [self.model_path(name), self.symptoms_path(name), self.diseases_path(name)]
    }

    /// Whether the model, vocabulary and label files are all on disk
    pub fn is_artifact_present(&self, name: &str) -> bool {
        let paths = self.required_paths(name);
        for path in &paths {
            log::debug!("  {:?} (exists: {})", path, path.exists());
        }
        paths.iter().all(|p| p.exists())
    }

    fn file_hash(path: &Path) -> Result<String, ArtifactError> {
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Checks that the artifact is complete and, when a hash is known, that the
    /// model file matches it
    pub fn verify_artifact(&self, info: &ArtifactInfo) -> Result<bool, ArtifactError> {
        if !self.is_artifact_present(&info.name) {
            log::info!("Artifact '{}' is incomplete", info.name);
            return Ok(false);
        }

        match &info.model_hash {
            Some(expected) => {
                let actual = Self::file_hash(&self.model_path(&info.name))?;
                log::info!("Model hash for '{}': {} (expected {})", info.name, actual, expected);
                Ok(actual.eq_ignore_ascii_case(expected))
            }
            None => Ok(true),
        }
    }

    /// Downloads every artifact file, verifying the model against its hash
    pub async fn download_artifact(&self, info: &ArtifactInfo) -> Result<(), ArtifactError> {
        let base_url = info.base_url.as_deref().ok_or_else(|| {
            ArtifactError::NotAvailable(format!("no download URL for artifact '{}'", info.name))
        })?;
        let _lock = self.download_lock.lock().await;

        let dir = self.artifact_dir(&info.name);
        log::info!("Creating artifact directory at {:?}", dir);
        fs::create_dir_all(&dir)?;

        let base_url = base_url.trim_end_matches('/');
        let result = async {
            self.download_file(&format!("{}/{}", base_url, MODEL_FILE), &self.model_path(&info.name), info.model_hash.as_deref()).await?;
            self.download_file(&format!("{}/{}", base_url, SYMPTOMS_FILE), &self.symptoms_path(&info.name), None).await?;
            self.download_file(&format!("{}/{}", base_url, DISEASES_FILE), &self.diseases_path(&info.name), None).await?;
            if let Err(e) = self.download_file(&format!("{}/{}", base_url, DOCTORS_FILE), &self.doctors_path(&info.name), None).await {
                log::warn!("Doctor directory not downloaded: {}", e);
            }
            Ok::<(), ArtifactError>(())
        }
        .await;

        if let Err(e) = result {
            log::error!("Failed to download artifact '{}': {}", info.name, e);
            let _ = self.remove_artifact(&info.name);
            return Err(e);
        }

        log::info!("Artifact '{}' ready to use", info.name);
        Ok(())
    }

    async fn download_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
    ) -> Result<(), ArtifactError> {
        log::info!("Downloading {} to {:?}", url, path);
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = expected_hash {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            let actual = format!("{:x}", hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                log::error!("Hash mismatch for {:?}: expected {}, got {}", path, expected, actual);
                return Err(ArtifactError::HashMismatch {
                    file: path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        fs::write(path, &bytes)?;

        if let Some(expected) = expected_hash {
            if !Self::file_hash(path)?.eq_ignore_ascii_case(expected) {
                return Err(ArtifactError::VerificationFailed);
            }
        }
        Ok(())
    }

    /// Removes every file of an artifact
    pub fn remove_artifact(&self, name: &str) -> Result<(), ArtifactError> {
        let mut paths = self.required_paths(name).to_vec();
        paths.push(self.doctors_path(name));
        for path in &paths {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    /// Ensures that an artifact is present and verified.
    /// If it is missing it is downloaded; if verification fails it is re-downloaded.
    pub async fn ensure_artifact(&self, info: &ArtifactInfo) -> Result<(), ArtifactError> {
        log::info!("Checking artifact '{}'...", info.name);
        if self.verify_artifact(info)? {
            log::info!("Artifact verification successful");
            return Ok(());
        }

        if info.base_url.is_none() {
            return Err(ArtifactError::NotAvailable(format!(
                "'{}' is missing or corrupt in {:?} and has no download URL",
                info.name,
                self.artifact_dir(&info.name)
            )));
        }

        log::info!("Artifact missing or corrupt, downloading...");
        self.remove_artifact(&info.name)?;
        self.download_artifact(info).await?;
        if !self.verify_artifact(info)? {
            return Err(ArtifactError::VerificationFailed);
        }
        Ok(())
    }
}

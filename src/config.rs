use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `SCENEDIT_CONFIG` is unset.
pub const CONFIG_FILE_NAME: &str = "scenedit.json";
pub const CONFIG_ENV_VAR: &str = "SCENEDIT_CONFIG";

/// Tried in order when neither the command line nor the config names a
/// models-textures directory.
pub const DEFAULT_DATA_DIRS: [&str; 3] = [
    "models-textures",
    "/c/temp/models-textures",
    "/tmp/models-textures",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("json error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
    #[error("models-textures directory not found (tried {tried:?})")]
    DataDirNotFound { tried: Vec<PathBuf> },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub data_dir: Option<PathBuf>,
    pub save_dir: PathBuf,
    pub max_objects: usize,
    pub mesh_count: u32,
    pub texture_count: u32,
    pub slot_count: u32,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            save_dir: PathBuf::from("."),
            max_objects: 1024,
            mesh_count: 59,
            texture_count: 31,
            slot_count: 30,
            window_width: 960,
            window_height: 640,
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str, path: &Path) -> Result<Self> {
        let config: EditorConfig =
            serde_json::from_str(text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Reads `$SCENEDIT_CONFIG`, else `./scenedit.json` if present, else
    /// the defaults. A path named by the variable must exist.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            log::info!("Reading config from {}", path.display());
            return Self::load_from_file(&path);
        }
        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            log::info!("Reading config from {}", local.display());
            return Self::load_from_file(local);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.mesh_count <= crate::scene::LIGHT_MESH_ID {
            return Err(ConfigError::Invalid {
                field: "mesh_count",
                reason: format!(
                    "{} leaves no room for the light sphere (mesh {})",
                    self.mesh_count,
                    crate::scene::LIGHT_MESH_ID
                ),
            });
        }
        if self.texture_count < 2 {
            return Err(ConfigError::Invalid {
                field: "texture_count",
                reason: format!("need at least 2 textures, got {}", self.texture_count),
            });
        }
        if self.max_objects < crate::scene::RESERVED_COUNT {
            return Err(ConfigError::Invalid {
                field: "max_objects",
                reason: format!(
                    "must hold the {} reserved objects, got {}",
                    crate::scene::RESERVED_COUNT,
                    self.max_objects
                ),
            });
        }
        if self.slot_count == 0 {
            return Err(ConfigError::Invalid {
                field: "slot_count",
                reason: "need at least one slot".to_string(),
            });
        }
        Ok(())
    }

    /// Picks the models-textures directory: the command-line argument, then
    /// `data_dir`, then the first default that exists.
    pub fn resolve_data_dir(&self, cli_arg: Option<&Path>) -> Result<PathBuf> {
        let mut tried = Vec::new();
        let candidates = cli_arg
            .map(Path::to_path_buf)
            .into_iter()
            .chain(self.data_dir.clone())
            .chain(DEFAULT_DATA_DIRS.into_iter().map(PathBuf::from));
        for candidate in candidates {
            if candidate.is_dir() {
                return Ok(candidate);
            }
            tried.push(candidate);
        }
        Err(ConfigError::DataDirNotFound { tried })
    }
}

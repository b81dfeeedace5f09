//! # Configuração
//!
//! Camadas, da menor para a maior prioridade:
//!
//! ```text
//! AppConfig::default()  →  amyeou.toml (opcional)  →  AMYEOU_* (env)
//! ```
//!
//! Chaves aninhadas no ambiente usam `__`: `AMYEOU_SERVER__PORT=8080`,
//! `AMYEOU_CLASSIFIER__ENABLED=false`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "amyeou.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] Box<figment::Error>),

    #[error("server.port não pode ser 0")]
    InvalidPort,

    #[error("storage.database_path está vazio")]
    MissingDatabasePath,

    #[error("{0}.timeout_ms deve ser maior que zero")]
    ZeroTimeout(&'static str),

    #[error("speech.cache_capacity deve ser maior que zero")]
    ZeroCacheCapacity,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/amyeou.db"),
        }
    }
}

/// Classificador zero-shot. Desligado, o chat usa só keywords.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub enabled: bool,
    pub model_repo: String,
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_repo: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            timeout_ms: 2000,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub timeout_ms: u64,
    /// Máximo de clipes MP3 mantidos em memória.
    pub cache_capacity: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 5000,
            cache_capacity: 256,
        }
    }
}

impl SpeechConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Diretiva do `EnvFilter` quando `RUST_LOG` não está definida.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub classifier: ClassifierConfig,
    pub speech: SpeechConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Carrega de `amyeou.toml` + ambiente.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Carrega usando `path` como arquivo TOML (ausente = só defaults + env).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("AMYEOU_").split("__"))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.storage.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingDatabasePath);
        }
        if self.classifier.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("classifier"));
        }
        if self.speech.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("speech"));
        }
        if self.speech.cache_capacity == 0 {
            return Err(ConfigError::ZeroCacheCapacity);
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

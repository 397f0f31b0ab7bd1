use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Where the relational and document stores live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Supabase (PostgREST) for doctors, patients and appointments, Redis for prescriptions.
    Supabase,
    /// Everything kept in process memory. Used for local runs and tests.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(StorageBackend::Supabase),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    pub redis_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let supabase_url = env::var("SUPABASE_URL").unwrap_or_else(|_| {
            warn!("SUPABASE_URL not set, using empty value");
            String::new()
        });
        let supabase_service_role_key = env::var("SUPABASE_SERVICE_ROLE_KEY").unwrap_or_else(|_| {
            warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
            String::new()
        });
        let redis_url = env::var("REDIS_URL").ok();

        let supabase_ready = !supabase_url.is_empty() && !supabase_service_role_key.is_empty();
        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse().unwrap_or_else(|e: String| {
                warn!("{}, falling back to memory", e);
                StorageBackend::Memory
            }),
            Err(_) if supabase_ready => StorageBackend::Supabase,
            Err(_) => {
                warn!("STORAGE_BACKEND not set and Supabase not configured, using memory");
                StorageBackend::Memory
            }
        };

        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(3000);

        let config = Self {
            supabase_url,
            supabase_service_role_key,
            redis_url,
            storage_backend,
            server_port,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// In-memory configuration with nothing external wired up.
    pub fn in_memory() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_role_key: String::new(),
            redis_url: None,
            storage_backend: StorageBackend::Memory,
            server_port: 3000,
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.storage_backend {
            StorageBackend::Memory => true,
            StorageBackend::Supabase => {
                !self.supabase_url.is_empty()
                    && !self.supabase_service_role_key.is_empty()
                    && self.redis_url.is_some()
            }
        }
    }

    pub fn redis_url_or_default(&self) -> String {
        self.redis_url
            .clone()
            .unwrap_or_else(|| "redis://localhost:6379".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parses_case_insensitively() {
        assert_eq!("Supabase".parse::<StorageBackend>(), Ok(StorageBackend::Supabase));
        assert_eq!(" memory ".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert!("mongo".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn supabase_backend_needs_all_connection_settings() {
        let mut config = AppConfig::in_memory();
        assert!(config.is_configured());

        config.storage_backend = StorageBackend::Supabase;
        assert!(!config.is_configured());

        config.supabase_url = "http://localhost:54321".to_string();
        config.supabase_service_role_key = "service-key".to_string();
        config.redis_url = Some("redis://localhost:6379".to_string());
        assert!(config.is_configured());
    }
}

use crate::engine::memory::MAX_PAGES;

#[derive(Debug, Clone)]
pub struct Config {
    pub engine: EngineConfig,
    pub workers: usize,
    pub log_level: String,
}

/// Linear memory limits for one engine instance, in 64 KiB pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub initial_pages: u32,
    pub max_pages: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_pages: 17,
            max_pages: 16 * 1024,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_pages > MAX_PAGES {
            return Err(format!(
                "max_pages {} exceeds the 32-bit address space ({MAX_PAGES} pages)",
                self.max_pages
            ));
        }
        if self.initial_pages > self.max_pages {
            return Err(format!(
                "initial_pages {} is larger than max_pages {}",
                self.initial_pages, self.max_pages
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Like [`Config::from_env`], but reads a `.env` file first if present.
    pub fn load() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, String> {
        let defaults = EngineConfig::default();

        let initial_pages: u32 = env_or(
            "ARGON2_ENGINE_INITIAL_PAGES",
            &defaults.initial_pages.to_string(),
        )
        .parse()
        .map_err(|e| format!("Invalid ARGON2_ENGINE_INITIAL_PAGES: {e}"))?;

        let max_pages: u32 = env_or("ARGON2_ENGINE_MAX_PAGES", &defaults.max_pages.to_string())
            .parse()
            .map_err(|e| format!("Invalid ARGON2_ENGINE_MAX_PAGES: {e}"))?;

        let engine = EngineConfig {
            initial_pages,
            max_pages,
        };
        engine.validate()?;

        let workers: usize = env_or("ARGON2_WORKERS", "1")
            .parse()
            .map_err(|e| format!("Invalid ARGON2_WORKERS: {e}"))?;
        if workers == 0 {
            return Err("ARGON2_WORKERS must be at least 1".to_string());
        }

        let log_level = env_or("ARGON2_LOG_LEVEL", "info");

        Ok(Config {
            engine,
            workers,
            log_level,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

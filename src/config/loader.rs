//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/quizforge/config.toml)
//! 3. Project config (quizforge.toml in the working directory)
//! 4. Environment variables (QUIZFORGE_* prefix)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::{debug, info};

use super::types::Config;
use crate::types::{QuizError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. QUIZFORGE_LLM_MODEL -> llm.model
        //
        // Every underscore becomes a nesting level, so snake_case leaves
        // are not addressable this way: QUIZFORGE_LLM_TIMEOUT_SECS maps
        // to llm.timeout.secs and is ignored. Env overrides work for
        // single-word keys (SECRET, MODEL, PROVIDER, SCOPE); multi-word
        // settings belong in a config file.
        figment = figment.merge(Env::prefixed("QUIZFORGE_").split('_').lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| QuizError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| QuizError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/quizforge/)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "quizforge").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("quizforge.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Show current effective configuration (secrets never serialized)
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| QuizError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write a default project config if none exists
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let config_path = Self::project_config_path();

        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_project_config())?;
            info!("Created project config: {}", config_path.display());
        } else {
            info!("Project config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Generate default project config content (TOML)
    fn default_project_config() -> String {
        r#"# quizforge Project Configuration
# Settings here override global defaults (~/.config/quizforge/config.toml).
# The auth secret can also be supplied via QUIZFORGE_LLM_SECRET.

version = "1.0"

[llm]
provider = "gigachat"
# model = "GigaChat-Max"
# secret = ""
timeout_secs = 60
upload_timeout_secs = 120
temperature = 0.7

[generation]
question_count = 10
max_attempts = 5
retry_pause_ms = 500
"#
        .to_string()
    }
}

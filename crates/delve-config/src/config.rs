//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Search tuning.
    pub search: SearchConfig,
    /// World generation and the route to compute.
    pub world: WorldConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Which node sizes a search may use.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Large nodes only, refined near the goal.
    #[default]
    Coarse,
    /// Subdivide down to single voxels wherever terrain requires it.
    Fine,
}

/// Search tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub mode: SearchMode,
    /// Node expansions before a search returns a segment.
    pub max_expansions: usize,
    /// Wall-clock limit in milliseconds (0 = none).
    pub timeout_ms: u64,
    /// Chunk rings generated ahead of the search frontier.
    pub prefetch_radius: i32,
    /// Distance from the goal at which a route counts as finished.
    pub goal_tolerance: f64,
}

/// World generation and the route to compute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: u64,
    /// Generation worker threads (0 = one less than the CPU count).
    pub threads: usize,
    pub start: [i32; 3],
    pub goal: [i32; 3],
    /// Noise value above which rock is solid; higher carves wider caves.
    pub cave_threshold: f64,
    /// Base noise frequency; lower gives longer tunnels.
    pub cave_frequency: f64,
    pub cave_octaves: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Directory for the JSON log file written by debug builds.
    pub log_dir: Option<PathBuf>,
    /// Log every waypoint of the computed route, not just the summary.
    pub log_waypoints: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Coarse,
            max_expansions: 2_000_000,
            timeout_ms: 0,
            prefetch_radius: 2,
            goal_tolerance: 1.0,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            threads: 0,
            start: [0, 40, 0],
            goal: [256, 40, 0],
            cave_threshold: 0.1,
            cave_frequency: 0.03,
            cave_octaves: 3,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
            log_waypoints: false,
        }
    }
}

/// Platform config directory for delve (`~/.config/delve` on Linux), or the
/// working directory when the platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("delve"))
        .unwrap_or_else(|| PathBuf::from("."))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join(CONFIG_FILE), serialized).map_err(ConfigError::WriteError)
    }

    /// Re-reads the file. Returns `Some(new_config)` only if it differs from
    /// `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;
        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }
}

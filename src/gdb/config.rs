//! Driver configuration

use crate::gdb::error::{DriverError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Environment variable naming a JSON configuration file
pub const CONFIG_ENV: &str = "GDB_DRIVER_CONFIG";
/// Environment variable overriding the debugger executable
pub const GDB_PATH_ENV: &str = "GDB_DRIVER_GDB_PATH";
/// Prompt installed with `set prompt`. It cannot be confused with program
/// output the way `(gdb) ` can.
pub const DEFAULT_PROMPT: &str = ">>>>>>cb_gdb:";

/// GDB configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GdbConfig {
    pub gdb_path: String,
    pub gdb_args: Vec<String>,
    /// Text GDB prints when it is ready for the next command
    pub prompt: String,
    /// Install `prompt` with `set prompt` before GDB reads its init files.
    /// Turn off when the debugger already prints `prompt` on its own.
    pub set_prompt: bool,
    /// How long the transport waits for more output
    pub timeout_ms: u64,
    /// User-defined GDB command printing composite strings
    pub string_printer: String,
    /// Types dumped as character arrays that need reconstruction
    pub string_types: Vec<String>,
    /// Types displayed with the `/c` modifier
    pub char_types: Vec<String>,
    /// Commands queued right after the debugger starts
    pub init_commands: Vec<String>,
}

impl Default for GdbConfig {
    fn default() -> Self {
        Self {
            gdb_path: "gdb".to_string(),
            gdb_args: vec!["-nw".to_string(), "-q".to_string()],
            prompt: DEFAULT_PROMPT.to_string(),
            set_prompt: true,
            timeout_ms: 30000,
            string_printer: "print_wxstring".to_string(),
            string_types: vec!["wxString".to_string()],
            char_types: vec!["wxChar".to_string()],
            init_commands: vec![
                "set confirm off".to_string(),
                "set pagination off".to_string(),
                "set width 0".to_string(),
                "set height 0".to_string(),
            ],
        }
    }
}

impl GdbConfig {
    /// Load a configuration file; missing fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_err = |reason: String| DriverError::Config {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| config_err(e.to_string()))?;
        config.validate().map_err(|reason| config_err(reason.to_string()))?;
        Ok(config)
    }

    /// Build the configuration from the environment.
    ///
    /// Reads the file named by `GDB_DRIVER_CONFIG` when set, then applies
    /// `GDB_DRIVER_GDB_PATH`.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                debug!("Loading configuration from {}", path);
                Self::load(path)?
            }
            Err(_) => Self::default(),
        };
        if let Ok(gdb_path) = std::env::var(GDB_PATH_ENV) {
            config.gdb_path = gdb_path;
        }
        config.validate().map_err(|reason| DriverError::Config {
            path: GDB_PATH_ENV.to_string(),
            reason: reason.to_string(),
        })?;
        Ok(config)
    }

    /// Reject settings the driver cannot work with. An empty prompt would
    /// match at every position of the output.
    fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.prompt.is_empty() {
            return Err("prompt must not be empty");
        }
        if self.gdb_path.trim().is_empty() {
            return Err("gdb_path must not be empty");
        }
        Ok(())
    }

    /// Command line handed to the debugger
    pub fn debugger_args(&self) -> Vec<String> {
        let mut args = self.gdb_args.clone();
        if self.set_prompt {
            // -iex runs before the banner, so even the first prompt matches
            args.push("-iex".to_string());
            args.push(format!("set prompt {}", self.prompt));
        }
        args
    }
}

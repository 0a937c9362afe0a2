use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cmd::parser::{OutputFormat, ToolOpts};
use crate::errors::{ErrorDetails, ErrorLayer, Result, ToolError};

/// Schema for the optional JSON config file.  Every field is optional and
/// only supplies a default; command line flags win.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigJson {
    /// Directories searched for modules after any `--python-path` ones.
    #[serde(default)]
    pub python_path: Vec<PathBuf>,
    pub all_paths: Option<bool>,
    pub compact: Option<bool>,
    pub output_format: Option<OutputFormat>,
}

/// Everything a run needs, with config file and environment folded in.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolConfig {
    pub target: String,
    /// In lookup order.
    pub search_paths: Vec<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub all_paths: bool,
    pub compact: bool,
    pub output_format: OutputFormat,
}

pub fn load(path: &Path) -> Result<ConfigJson> {
    let config_error = |message: String| {
        ToolError::Config(ErrorDetails::new(
            ErrorLayer::ConfigLayer,
            format!("{}: {}", path.display(), message),
        ))
    };
    let text = fs::read_to_string(path).map_err(|err| config_error(err.to_string()))?;
    serde_json::from_str(&text).map_err(|err| config_error(err.to_string()))
}

impl ToolConfig {
    /// Combine parsed options with the config file (if any), `PYTHONPATH` and
    /// the working directory of the process.
    pub fn from_opts(opts: &ToolOpts) -> Result<ToolConfig> {
        let config = match &opts.config {
            Some(path) => Some(load(path)?),
            None => None,
        };
        let cwd = env::current_dir()?;
        Ok(ToolConfig::resolve(
            opts,
            config.unwrap_or_default(),
            env::var_os("PYTHONPATH"),
            cwd,
        ))
    }

    pub fn resolve(opts: &ToolOpts, config: ConfigJson, pythonpath: Option<OsString>, cwd: PathBuf) -> ToolConfig {
        let mut search_paths: Vec<PathBuf> = opts.python_path.clone();
        search_paths.extend(config.python_path);
        if let Some(pythonpath) = pythonpath {
            search_paths.extend(env::split_paths(&pythonpath).filter(|dir| !dir.as_os_str().is_empty()));
        }
        search_paths.push(cwd);

        let resolved = ToolConfig {
            target: opts.module.clone(),
            search_paths,
            manifest: opts.manifest.clone(),
            all_paths: opts.all_paths || config.all_paths.unwrap_or(false),
            compact: opts.compact || config.compact.unwrap_or(false),
            output_format: opts.output_format.or(config.output_format).unwrap_or_default(),
        };
        debug!(?resolved, "resolved configuration");
        resolved
    }
}

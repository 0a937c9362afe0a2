use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Deserialize;

const AFTER_HELP: &str = "Classes marked with '*' indicate classes inheriting from multiple \
Exception bases. Use -a or --all-paths to see them.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The box-drawing tree.
    #[default]
    Text,
    /// The same tree as nested JSON objects.
    Json,
}

/// Display the hierarchy of exceptions defined in a Python module or package.
#[derive(Debug, Parser)]
#[command(name = "exctree", version, about, after_help = AFTER_HELP)]
pub struct ToolOpts {
    /// Module or package to inspect, e.g. `requests` or `package.submodule`.
    #[arg(value_name = "MODULE")]
    pub module: String,

    /// List classes with several exception bases under every one of them.
    #[arg(short, long)]
    pub all_paths: bool,

    /// Leave out the `|` separator lines.
    #[arg(short, long)]
    pub compact: bool,

    /// Extra directory to search for modules; may be repeated.  Searched
    /// before the config file's paths, `PYTHONPATH` and the current directory.
    #[arg(short = 'p', long = "python-path", value_name = "DIR")]
    pub python_path: Vec<PathBuf>,

    /// Read classes from a JSON manifest instead of scanning Python sources.
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// JSON config file supplying defaults for the options above.
    #[arg(long, value_name = "FILE", env = "EXCTREE_CONFIG")]
    pub config: Option<PathBuf>,
}

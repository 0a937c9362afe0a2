use std::io::{self, Write};
use std::process::ExitCode;

use crate::cmd::parser::{OutputFormat, ToolOpts};
use crate::config::ToolConfig;
use crate::discovery::{make_manifest_discovery, make_source_discovery, DiscoveryAdapter};
use crate::errors::{Result, ToolError};
use crate::hierarchy::json::tree_to_json;
use crate::hierarchy::{build, write_tree, RenderOptions};

/// Run the whole command, printing the tree to stdout and any failure to
/// stderr.
pub fn run(opts: &ToolOpts) -> ExitCode {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match execute(opts, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

/// Print `err` the way the command line presents it and pick the exit code.
pub fn report(err: &ToolError) -> ExitCode {
    match err {
        ToolError::EmptyResult { .. } => eprintln!("{}", err),
        _ => eprintln!("Error: {}", err),
    }
    ExitCode::from(err.exit_code())
}

pub fn execute<W: Write>(opts: &ToolOpts, out: &mut W) -> Result<()> {
    let config = ToolConfig::from_opts(opts)?;
    let mut adapter: Box<dyn DiscoveryAdapter> = match &config.manifest {
        Some(manifest) => make_manifest_discovery(manifest.clone()),
        None => make_source_discovery(config.search_paths.clone()),
    };
    render_target(&config, adapter.as_mut(), out)
}

/// Discover, build and render `config.target` using `adapter`.
pub fn render_target<W: Write>(config: &ToolConfig, adapter: &mut dyn DiscoveryAdapter, out: &mut W) -> Result<()> {
    let discovery = adapter.discover(&config.target)?;
    if discovery.is_empty() {
        return Err(ToolError::EmptyResult {
            target: config.target.clone(),
        });
    }

    let tree = build(
        &discovery.registry,
        discovery.root,
        &discovery.discovered,
        config.all_paths,
    );
    info!(
        target = config.target.as_str(),
        nodes = tree.node_count(),
        "rendering exception tree"
    );

    match config.output_format {
        OutputFormat::Text => {
            let options = RenderOptions {
                compact: config.compact,
            };
            write_tree(&tree, &discovery.registry, options, out)?;
        }
        OutputFormat::Json => {
            let value = tree_to_json(&tree, &discovery.registry);
            serde_json::to_writer_pretty(&mut *out, &value).map_err(io::Error::from)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::manifest::{discover_from_manifest, ManifestJson};
    use crate::discovery::Discovery;
    use std::path::PathBuf;

    struct FixedManifest(ManifestJson);

    impl DiscoveryAdapter for FixedManifest {
        fn discover(&mut self, target: &str) -> Result<Discovery> {
            discover_from_manifest(&self.0, target)
        }
    }

    fn adapter() -> FixedManifest {
        FixedManifest(
            serde_json::from_str(
                r#"{"classes": [
                    {"module": "m", "name": "A", "bases": ["Exception"]},
                    {"module": "m", "name": "B", "bases": ["m.A"]},
                    {"module": "m", "name": "C", "bases": ["m.A", "ValueError"]}
                ], "modules": ["empty"]}"#,
            )
            .unwrap(),
        )
    }

    fn config(target: &str, output_format: OutputFormat) -> ToolConfig {
        ToolConfig {
            target: target.to_string(),
            search_paths: vec![PathBuf::from(".")],
            manifest: None,
            all_paths: true,
            compact: false,
            output_format,
        }
    }

    fn render(config: &ToolConfig) -> Result<String> {
        let mut out = vec![];
        render_target(config, &mut adapter(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_text_output() {
        let text = render(&config("m", OutputFormat::Text)).unwrap();
        assert_eq!(
            text,
            "Exception\n\
             |\n\
             ├── m.A\n\
             │   ├── m.B\n\
             │   └── m.C *\n\
             |\n\
             └── ValueError\n\
             \x20   └── m.C *\n"
        );
    }

    #[test]
    fn test_json_output() {
        let text = render(&config("m", OutputFormat::Json)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["name"], "Exception");
        assert_eq!(value["children"][0]["name"], "m.A");
        assert_eq!(value["children"][1]["children"][0]["multi_parent"], true);
    }

    #[test]
    fn test_empty_and_missing_targets() {
        let err = render(&config("empty", OutputFormat::Text)).unwrap_err();
        assert!(matches!(err, ToolError::EmptyResult { .. }));
        assert_eq!(err.exit_code(), 1);

        let err = render(&config("nope", OutputFormat::Text)).unwrap_err();
        assert_eq!(err.to_string(), "could not import 'nope': No module named 'nope'");
        assert_eq!(err.exit_code(), 10);
    }
}

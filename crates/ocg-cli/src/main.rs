use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use ocg_core::GeneratedFile;
use ocg_core::config::{self, CONFIG_FILE_NAME, GeneratorOptions};
use ocg_core::pipeline::{self, PipelineOutput};
use ocg_python_client::PythonClientGenerator;

#[derive(Parser)]
#[command(
    name = "openapi-client-gen",
    about = "Generate a typed async Python client from an OpenAPI 3.x document",
    version
)]
struct Cli {
    /// Location of the OpenAPI document: an http(s):// or file:// URI, or a path
    uri: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let options = try_load_config()?.unwrap_or_default();
    cmd_generate(&cli.uri, &options)
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<GeneratorOptions>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn cmd_generate(uri: &str, options: &GeneratorOptions) -> Result<()> {
    let content = read_document(uri)?;
    let output = pipeline::run(&content, options, &PythonClientGenerator)
        .with_context(|| format!("failed to generate a client from {uri}"))?;

    report(&output);

    let output_dir = PathBuf::from(&options.output);
    eprintln!("Generating {uri} → {}", output_dir.display());
    write_files(&output_dir, &output.files)?;
    eprintln!(
        "Generated {} files in {}",
        output.files.len(),
        output_dir.display()
    );
    Ok(())
}

/// Fetch `http(s)://` URIs; read `file://` URIs and bare paths from disk.
fn read_document(uri: &str) -> Result<String> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        debug!("fetching {uri}");
        let response = reqwest::blocking::get(uri)
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("failed to fetch {uri}"))?;
        return response
            .text()
            .with_context(|| format!("failed to read the response body from {uri}"));
    }
    let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Print what was renamed or left out.
fn report(output: &PipelineOutput) {
    for diagnostic in &output.diagnostics {
        eprintln!("  warning: {diagnostic}");
    }
    if output.is_partial() {
        eprintln!("Some items were skipped; the generated client is partial.");
    }
}

/// Write generated files to disk under the given base directory.
fn write_files(base: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = base.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, &file.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("  wrote {}", path.display());
    }
    Ok(())
}

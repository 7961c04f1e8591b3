//! The end-to-end driver: parse, resolve, extract, plan, render.

use log::{debug, info};

use crate::config::GeneratorOptions;
use crate::error::{Diagnostic, PipelineError};
use crate::ir::ParseResult;
use crate::{CodeGenerator, GeneratedFile, parse, synth, transform};

/// Files produced by one run plus everything that was reported along the way.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub files: Vec<GeneratedFile>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PipelineOutput {
    /// Whether some type or operation was left out of the files.
    pub fn is_partial(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_skip)
    }
}

/// Parse and extract a document without rendering it.
pub fn analyze(input: &str, options: &GeneratorOptions) -> Result<ParseResult, PipelineError> {
    let document = parse::from_json(input)?;
    let result = transform::extract(&document, options)?;
    debug!(
        "`{}` {}: {} operations, {} types, {} diagnostics",
        result.api_title(),
        result.api_version(),
        result.operations.len(),
        result.types.len(),
        result.diagnostics.len()
    );
    Ok(result)
}

/// Run every stage on `input` and render the result with `generator`.
pub fn run<G: CodeGenerator + ?Sized>(
    input: &str,
    options: &GeneratorOptions,
    generator: &G,
) -> Result<PipelineOutput, PipelineError> {
    let result = analyze(input, options)?;
    let plan = synth::plan(&result);
    let files = generator.generate(&plan, options)?;
    info!("generated {} files", files.len());
    Ok(PipelineOutput {
        files,
        diagnostics: result.diagnostics,
    })
}

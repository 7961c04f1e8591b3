pub mod config;
pub mod error;
pub mod ir;
pub mod parse;
pub mod pipeline;
pub mod resolve;
pub mod synth;
pub mod transform;

use config::GeneratorOptions;
use error::GeneratorError;
use synth::SynthesisPlan;

/// A generated file with path and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// Trait for backends that render a [`SynthesisPlan`] into source files.
///
/// Rendering is pure: the same plan and options always yield the same files.
pub trait CodeGenerator {
    fn generate(
        &self,
        plan: &SynthesisPlan<'_>,
        options: &GeneratorOptions,
    ) -> Result<Vec<GeneratedFile>, GeneratorError>;
}

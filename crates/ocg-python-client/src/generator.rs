use log::debug;
use ocg_core::config::GeneratorOptions;
use ocg_core::error::GeneratorError;
use ocg_core::synth::SynthesisPlan;
use ocg_core::{CodeGenerator, GeneratedFile};

use crate::emitters;
use crate::type_mapper::ClassNames;

/// Pydantic models plus an async `httpx` client.
pub struct PythonClientGenerator;

impl CodeGenerator for PythonClientGenerator {
    fn generate(
        &self,
        plan: &SynthesisPlan<'_>,
        options: &GeneratorOptions,
    ) -> Result<Vec<GeneratedFile>, GeneratorError> {
        let client_class = emitters::client::client_class_name(options, plan.result.api_title());
        let classes = ClassNames::new(&plan.result.types, &client_class)?;
        let files = vec![
            GeneratedFile {
                path: "models.py".to_string(),
                content: emitters::models::emit_models(plan, &classes, options)?,
            },
            GeneratedFile {
                path: "client.py".to_string(),
                content: emitters::client::emit_client(plan, &classes, options)?,
            },
        ];
        debug!(
            "rendered {} types and {} operations",
            plan.types.len(),
            plan.operations.len()
        );
        Ok(files)
    }
}

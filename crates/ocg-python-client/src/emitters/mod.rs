pub mod client;
pub mod models;

use ocg_core::error::GeneratorError;

/// Escape sequences that would end a Python docstring early or be read as
/// escapes.
fn escape_docstring(value: String) -> String {
    value.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}

fn template_error(err: minijinja::Error) -> GeneratorError {
    GeneratorError::Template(err.to_string())
}

//! JSON pointer helpers. Every schema location in the pipeline is a local
//! pointer (`#/components/schemas/Pet/properties/id`), so a `$ref` and the
//! inline slot it designates share one key.

/// Root pointer of the `paths` object.
pub const PATHS: &str = "#/paths";

/// Escape a single pointer segment (`~` → `~0`, `/` → `~1`).
pub fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Undo [`escape`].
pub fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Pointer to `segment` below `parent`.
pub fn child(parent: &str, segment: &str) -> String {
    format!("{parent}/{}", escape(segment))
}

/// Pointer to a registry entry, e.g. `#/components/schemas/Pet`.
pub fn component(section: &str, name: &str) -> String {
    child(&format!("#/components/{section}"), name)
}

/// Dotted breadcrumb for a pointer: `#/components/schemas/Pet` → `components.schemas.Pet`.
pub fn breadcrumb(pointer: &str) -> String {
    pointer
        .trim_start_matches('#')
        .trim_start_matches('/')
        .split('/')
        .map(unescape)
        .collect::<Vec<_>>()
        .join(".")
}

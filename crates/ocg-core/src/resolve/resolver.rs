use log::debug;

use super::arena::{SchemaArena, SchemaId, SchemaNode};
use super::pointer;
use crate::error::ResolveError;
use crate::parse::components::Components;
use crate::parse::document::OpenApiDocument;
use crate::parse::parameter::{Header, Parameter};
use crate::parse::reference::{RefOr, StrMap};
use crate::parse::request_body::RequestBody;
use crate::parse::response::Response;
use crate::parse::schema::SchemaOrRef;
use crate::parse::{COMPONENTS_PREFIX, is_component_pointer};

/// A non-schema registry that `$ref` pointers may target.
pub trait Component: Sized {
    /// Registry section under `#/components/`.
    const SECTION: &'static str;

    fn registry(components: &Components) -> &StrMap<RefOr<Self>>;
}

impl Component for Parameter {
    const SECTION: &'static str = "parameters";

    fn registry(components: &Components) -> &StrMap<RefOr<Self>> {
        &components.parameters
    }
}

impl Component for Header {
    const SECTION: &'static str = "headers";

    fn registry(components: &Components) -> &StrMap<RefOr<Self>> {
        &components.headers
    }
}

impl Component for RequestBody {
    const SECTION: &'static str = "requestBodies";

    fn registry(components: &Components) -> &StrMap<RefOr<Self>> {
        &components.request_bodies
    }
}

impl Component for Response {
    const SECTION: &'static str = "responses";

    fn registry(components: &Components) -> &StrMap<RefOr<Self>> {
        &components.responses
    }
}

/// Outcome of resolving one schema slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub id: SchemaId,
    /// The target is still being resolved further up the current walk, i.e.
    /// this use site closes a cycle.
    pub recursive: bool,
}

/// Resolves `$ref` pointers against one document.
///
/// Schema targets are memoized by pointer in a [`SchemaArena`], so every
/// reference to the same location yields the same [`SchemaId`]. Callers bracket
/// the walk of a schema body with [`enter`](Self::enter) and
/// [`leave`](Self::leave); a reference to a schema on that stack comes back
/// marked `recursive` instead of being walked again.
#[derive(Debug)]
pub struct RefResolver<'doc> {
    document: &'doc OpenApiDocument,
    arena: SchemaArena<'doc>,
    components: Vec<SchemaId>,
    active: Vec<SchemaId>,
}

impl<'doc> RefResolver<'doc> {
    /// Register every component schema as a placeholder, then reject pure
    /// reference cycles among them.
    pub fn new(document: &'doc OpenApiDocument) -> Result<Self, ResolveError> {
        let mut arena = SchemaArena::default();
        let components = document
            .components
            .schemas
            .iter()
            .map(|(name, slot)| {
                arena.intern(
                    &pointer::component("schemas", name),
                    slot,
                    Some(name.as_str()),
                )
            })
            .collect();

        let mut resolver = Self {
            document,
            arena,
            components,
            active: Vec::new(),
        };
        for id in resolver.components.clone() {
            resolver.concrete(id)?;
        }
        debug!("registered {} component schemas", resolver.components.len());
        Ok(resolver)
    }

    pub fn document(&self) -> &'doc OpenApiDocument {
        self.document
    }

    /// Component schema ids in document order.
    pub fn component_ids(&self) -> &[SchemaId] {
        &self.components
    }

    pub fn node(&self, id: SchemaId) -> &SchemaNode<'doc> {
        self.arena.get(id)
    }

    pub fn slot(&self, id: SchemaId) -> &'doc SchemaOrRef {
        self.arena.get(id).slot
    }

    pub fn arena(&self) -> &SchemaArena<'doc> {
        &self.arena
    }

    /// Resolve a schema slot found at `location` (a local pointer).
    ///
    /// Inline schemas are interned under their own location; references are
    /// interned under their target pointer.
    pub fn resolve_schema(
        &mut self,
        slot: &'doc SchemaOrRef,
        location: &str,
    ) -> Result<Resolution, ResolveError> {
        let id = match slot {
            RefOr::Item(_) => self.arena.intern(location, slot, None),
            RefOr::Ref { ref_path } => self.lookup_schema(ref_path, location)?,
        };
        Ok(Resolution {
            id,
            recursive: self.is_active(id),
        })
    }

    /// Follow a chain of schema references from `id` to the first inline
    /// schema.
    pub fn concrete(&mut self, id: SchemaId) -> Result<SchemaId, ResolveError> {
        let mut chain = vec![id];
        let mut current = id;
        loop {
            let node = self.arena.get(current);
            let slot: &'doc SchemaOrRef = node.slot;
            let RefOr::Ref { ref_path } = slot else {
                break;
            };
            let location = node.pointer.clone();
            let next = self.lookup_schema(ref_path, &location)?;
            if chain.contains(&next) {
                chain.push(next);
                return Err(ResolveError::AliasCycle {
                    chain: chain
                        .into_iter()
                        .map(|id| self.arena.get(id).pointer.clone())
                        .collect(),
                });
            }
            chain.push(next);
            current = next;
        }
        Ok(current)
    }

    pub fn enter(&mut self, id: SchemaId) {
        self.active.push(id);
    }

    pub fn leave(&mut self, id: SchemaId) {
        if let Some(pos) = self.active.iter().rposition(|active| *active == id) {
            self.active.remove(pos);
        }
    }

    pub fn is_active(&self, id: SchemaId) -> bool {
        self.active.contains(&id)
    }

    /// Resolve a parameter, header, request body or response reference,
    /// following chained references.
    pub fn resolve_component<T: Component>(
        &self,
        item: &'doc RefOr<T>,
        location: &str,
    ) -> Result<&'doc T, ResolveError> {
        self.locate_component(item, location).map(|(target, _)| target)
    }

    /// Like [`resolve_component`](Self::resolve_component), also returning the
    /// pointer of the inline object that was reached.
    pub fn locate_component<T: Component>(
        &self,
        item: &'doc RefOr<T>,
        location: &str,
    ) -> Result<(&'doc T, String), ResolveError> {
        let mut current = item;
        let mut current_location = location.to_string();
        let mut chain: Vec<&str> = Vec::new();
        loop {
            match current {
                RefOr::Item(target) => return Ok((target, current_location)),
                RefOr::Ref { ref_path } => {
                    if chain.contains(&ref_path.as_str()) {
                        chain.push(ref_path);
                        return Err(ResolveError::AliasCycle {
                            chain: chain.into_iter().map(str::to_string).collect(),
                        });
                    }
                    chain.push(ref_path);
                    let name = component_name(ref_path, T::SECTION, &current_location)?;
                    current = T::registry(&self.document.components)
                        .get(&name)
                        .ok_or_else(|| ResolveError::Unresolved {
                            pointer: ref_path.clone(),
                            location: pointer::breadcrumb(&current_location),
                        })?;
                    current_location = ref_path.clone();
                }
            }
        }
    }

    fn lookup_schema(&mut self, ref_path: &str, location: &str) -> Result<SchemaId, ResolveError> {
        if let Some(id) = self.arena.find(ref_path) {
            return Ok(id);
        }
        if !ref_path.starts_with('#') {
            return Err(ResolveError::External {
                pointer: ref_path.to_string(),
                location: pointer::breadcrumb(location),
            });
        }
        if is_component_pointer(ref_path) {
            // Every component schema was registered up front, so a miss here
            // is either the wrong section or a missing entry.
            component_name(ref_path, "schemas", location)?;
            return Err(ResolveError::Unresolved {
                pointer: ref_path.to_string(),
                location: pointer::breadcrumb(location),
            });
        }
        let document = self.document;
        match document.pointer_targets.get(ref_path) {
            Some(target) => Ok(self.arena.intern(ref_path, target, None)),
            None => Err(ResolveError::Unresolved {
                pointer: ref_path.to_string(),
                location: pointer::breadcrumb(location),
            }),
        }
    }
}

/// Extract the registry key from `#/components/<section>/<name>`.
fn component_name(ref_path: &str, section: &str, location: &str) -> Result<String, ResolveError> {
    let invalid = |reason: String| ResolveError::InvalidPointer {
        pointer: ref_path.to_string(),
        location: pointer::breadcrumb(location),
        reason,
    };
    let rest = ref_path
        .strip_prefix(COMPONENTS_PREFIX)
        .ok_or_else(|| invalid(format!("expected a pointer into `#/components/{section}`")))?;
    let (found, name) = rest
        .split_once('/')
        .ok_or_else(|| invalid("missing component name".to_string()))?;
    if found != section {
        return Err(invalid(format!(
            "expected section `{section}`, found `{found}`"
        )));
    }
    Ok(pointer::unescape(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn document(json: &str) -> OpenApiDocument {
        parse::from_json(json).unwrap()
    }

    const CYCLIC: &str = r##"{
        "openapi": "3.0.0",
        "info": {"title": "T", "version": "1"},
        "paths": {},
        "components": {"schemas": {
            "Node": {
                "type": "object",
                "properties": {"next": {"$ref": "#/components/schemas/Node"}}
            }
        }}
    }"##;

    #[test]
    fn test_same_pointer_same_identity() {
        let doc = document(CYCLIC);
        let mut resolver = RefResolver::new(&doc).unwrap();
        let slot = &doc.components.schemas["Node"];
        let Some(schema) = slot.as_item() else {
            panic!("expected inline schema");
        };
        let next = &schema.properties["next"];
        let a = resolver.resolve_schema(next, "#/x").unwrap();
        let b = resolver.resolve_schema(next, "#/y").unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, resolver.component_ids()[0]);
    }

    #[test]
    fn test_recursive_marked_while_active() {
        let doc = document(CYCLIC);
        let mut resolver = RefResolver::new(&doc).unwrap();
        let node = resolver.component_ids()[0];
        let Some(schema) = doc.components.schemas["Node"].as_item() else {
            panic!("expected inline schema");
        };
        let next = &schema.properties["next"];

        resolver.enter(node);
        assert!(resolver.resolve_schema(next, "#/n").unwrap().recursive);
        resolver.leave(node);
        assert!(!resolver.resolve_schema(next, "#/n").unwrap().recursive);
    }

    #[test]
    fn test_missing_target_fails() {
        let doc = document(
            r##"{
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "paths": {},
                "components": {"schemas": {"A": {"$ref": "#/components/schemas/Missing"}}}
            }"##,
        );
        let err = RefResolver::new(&doc).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Unresolved { ref pointer, .. } if pointer == "#/components/schemas/Missing"
        ));
    }

    #[test]
    fn test_alias_cycle_fails() {
        let doc = document(
            r##"{
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "paths": {},
                "components": {"schemas": {
                    "A": {"$ref": "#/components/schemas/B"},
                    "B": {"$ref": "#/components/schemas/A"}
                }}
            }"##,
        );
        assert!(matches!(
            RefResolver::new(&doc).unwrap_err(),
            ResolveError::AliasCycle { .. }
        ));
    }

    #[test]
    fn test_component_chain() {
        let doc = document(
            r##"{
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "paths": {},
                "components": {"parameters": {
                    "Limit": {"$ref": "#/components/parameters/PageLimit"},
                    "PageLimit": {"name": "limit", "in": "query"}
                }}
            }"##,
        );
        let resolver = RefResolver::new(&doc).unwrap();
        let (param, location) = resolver
            .locate_component(&doc.components.parameters["Limit"], "#/p")
            .unwrap();
        assert_eq!(param.name, "limit");
        assert_eq!(location, "#/components/parameters/PageLimit");
    }

    #[test]
    fn test_wrong_section_is_invalid() {
        let doc = document(
            r##"{
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "paths": {},
                "components": {"parameters": {
                    "Limit": {"$ref": "#/components/schemas/PageLimit"}
                }}
            }"##,
        );
        let resolver = RefResolver::new(&doc).unwrap();
        let err = resolver
            .resolve_component(&doc.components.parameters["Limit"], "#/p")
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidPointer { .. }));
    }
}

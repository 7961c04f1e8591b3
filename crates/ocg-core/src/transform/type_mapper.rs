use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;

use crate::error::{Diagnostic, NameCollisionError, PipelineError, ResolveError};
use crate::ir::{
    EnumBase, EnumDecl, EnumMember, ExtraFields, FieldDecl, FormatTag, RecordDecl, Scalar,
    TypeDecl, TypeDeclKind, TypeId, TypeRef, TypeTable, UnionDecl,
};
use crate::parse::reference::RefOr;
use crate::parse::schema::{AdditionalProperties, Schema, SchemaOrRef, SchemaType};
use crate::resolve::{RefResolver, SchemaId, pointer};

use super::name_normalizer::{TypeNames, member_name, normalize_name, type_name};

enum MapError {
    Fatal(PipelineError),
    /// Fails the declaration being built, not the run.
    Unsupported { location: String, reason: String },
}

impl From<ResolveError> for MapError {
    fn from(err: ResolveError) -> Self {
        MapError::Fatal(err.into())
    }
}

impl From<NameCollisionError> for MapError {
    fn from(err: NameCollisionError) -> Self {
        MapError::Fatal(err.into())
    }
}

impl From<PipelineError> for MapError {
    fn from(err: PipelineError) -> Self {
        MapError::Fatal(err)
    }
}

fn unsupported(location: &str, reason: impl Into<String>) -> MapError {
    MapError::Unsupported {
        location: pointer::breadcrumb(location),
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclState {
    Pending,
    Building,
    Done,
    Skipped,
}

/// How a schema is represented where it is used.
enum Shape<'doc> {
    /// Object with properties.
    Record,
    /// `allOf` merged into one record.
    Merged,
    Enum,
    /// `oneOf`/`anyOf` with at least two non-null branches.
    Union {
        keyword: &'static str,
        branches: Vec<(usize, &'doc SchemaOrRef)>,
    },
    /// Needs no declaration of its own.
    Inline,
}

fn shape(schema: &Schema) -> Shape<'_> {
    if !schema.all_of.is_empty() {
        return if schema.all_of.len() == 1 && schema.properties.is_empty() {
            Shape::Inline
        } else {
            Shape::Merged
        };
    }
    let (keyword, branches) = union_branches(schema);
    if !branches.is_empty() {
        return if branches.len() > 1 {
            Shape::Union { keyword, branches }
        } else {
            Shape::Inline
        };
    }
    if schema.enum_values.iter().any(|v| !v.is_null()) {
        return Shape::Enum;
    }
    if !schema.properties.is_empty() {
        return Shape::Record;
    }
    Shape::Inline
}

/// Non-null `oneOf` (else `anyOf`) branches with their positions.
fn union_branches(schema: &Schema) -> (&'static str, Vec<(usize, &SchemaOrRef)>) {
    let (keyword, branches) = if schema.one_of.is_empty() {
        ("anyOf", &schema.any_of)
    } else {
        ("oneOf", &schema.one_of)
    };
    let branches = branches
        .iter()
        .enumerate()
        .filter(|(_, branch)| !is_null_schema(branch))
        .collect();
    (keyword, branches)
}

fn is_null_schema(slot: &SchemaOrRef) -> bool {
    slot.as_item().is_some_and(|schema| schema.is_null_only())
}

/// Whether `null` is admitted beside the schema's main shape.
fn admits_null(schema: &Schema) -> bool {
    schema.is_nullable()
        || schema.enum_values.iter().any(Value::is_null)
        || schema
            .one_of
            .iter()
            .chain(&schema.any_of)
            .any(is_null_schema)
}

/// Python-style literal types only admit strings, integers, booleans and null.
fn literal(value: &Value) -> Option<TypeRef> {
    match value {
        Value::String(_) | Value::Bool(_) | Value::Null => Some(TypeRef::Literal(value.clone())),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(TypeRef::Literal(value.clone())),
        _ => None,
    }
}

fn field_decl(wire_name: &str, slot: &SchemaOrRef, field_type: TypeRef, required: bool) -> FieldDecl {
    let schema = slot.as_item();
    FieldDecl {
        name: normalize_name(wire_name),
        wire_name: wire_name.to_string(),
        field_type,
        required,
        description: schema.and_then(|s| s.description.clone()),
        default_value: schema.and_then(|s| s.default_value.clone()),
        read_only: schema.and_then(|s| s.read_only).unwrap_or(false),
        write_only: schema.and_then(|s| s.write_only).unwrap_or(false),
        deprecated: schema.and_then(|s| s.deprecated).unwrap_or(false),
    }
}

#[derive(Default)]
struct Merge {
    fields: IndexMap<String, FieldDecl>,
    required: Vec<String>,
}

impl Merge {
    fn finish(self, extra: ExtraFields) -> RecordDecl {
        let required = self.required;
        let fields = self
            .fields
            .into_values()
            .map(|mut field| {
                field.required = required.contains(&field.wire_name);
                field
            })
            .collect();
        RecordDecl { fields, extra }
    }
}

/// Maps resolved schemas to declarations and use-site types.
///
/// Component schemas are allocated up front in document order, so they own
/// their registry names and come first in first-seen order; their bodies are
/// built depth-first the first time they are needed. A declaration is entered
/// on the resolver while it is built, which is what marks back edges as
/// recursive use sites.
pub struct TypeMapper<'doc> {
    resolver: RefResolver<'doc>,
    names: TypeNames,
    decls: Vec<TypeDecl>,
    states: Vec<DeclState>,
    /// Use sites of the declaration are wrapped in `Nullable`.
    nullable: Vec<bool>,
    schemas: Vec<SchemaId>,
    by_schema: HashMap<SchemaId, TypeId>,
    components: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'doc> TypeMapper<'doc> {
    pub fn new(resolver: RefResolver<'doc>) -> Result<Self, NameCollisionError> {
        let components = resolver.component_ids().to_vec();
        let mut mapper = Self {
            resolver,
            names: TypeNames::default(),
            decls: Vec::new(),
            states: Vec::new(),
            nullable: Vec::new(),
            schemas: Vec::new(),
            by_schema: HashMap::new(),
            components: components.len(),
            diagnostics: Vec::new(),
        };
        for schema_id in components {
            let node = mapper.resolver.node(schema_id);
            let slot = node.slot;
            let location = pointer::breadcrumb(&node.pointer);
            let key = node.component.clone().unwrap_or_default();
            let name = mapper.names.claim(&type_name(&key), &location)?;
            mapper.allocate(schema_id, name, location, slot);
        }
        Ok(mapper)
    }

    pub fn resolver(&self) -> &RefResolver<'doc> {
        &self.resolver
    }

    /// Record a non-fatal problem.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Build every component schema not built yet.
    pub fn map_components(&mut self) -> Result<(), PipelineError> {
        for index in 0..self.components {
            self.build(TypeId(index))?;
        }
        debug!("mapped {} types", self.decls.len());
        Ok(())
    }

    /// Map the schema slot at `location` to a use-site type, declaring a type
    /// named after `context` when the schema needs one.
    pub fn map_schema(
        &mut self,
        slot: &'doc SchemaOrRef,
        location: &str,
        context: &str,
    ) -> Result<TypeRef, PipelineError> {
        match self.map_slot(slot, location, context) {
            Ok(ty) => Ok(ty),
            Err(MapError::Fatal(err)) => Err(err),
            Err(MapError::Unsupported { location, reason }) => {
                self.report(Diagnostic::UnsupportedConstruct { location, reason });
                Ok(TypeRef::Any)
            }
        }
    }

    /// Whether the slot resolves to a record-shaped schema.
    pub fn is_object_schema(
        &mut self,
        slot: &'doc SchemaOrRef,
        location: &str,
    ) -> Result<bool, PipelineError> {
        let resolution = self.resolver.resolve_schema(slot, location)?;
        let concrete = self.resolver.concrete(resolution.id)?;
        Ok(self
            .resolver
            .node(concrete)
            .slot
            .as_item()
            .is_some_and(|schema| schema.is_object_like() || !schema.all_of.is_empty()))
    }

    /// Drop skipped declarations and renumber the rest.
    ///
    /// The returned [`TypeRemap`] must be applied to every use site held
    /// outside the table.
    pub fn finish(self) -> (TypeTable, TypeRemap, Vec<Diagnostic>) {
        let mut entries = vec![None; self.decls.len()];
        let mut kept = Vec::with_capacity(self.decls.len());
        for (mut decl, state) in self.decls.into_iter().zip(self.states) {
            if state == DeclState::Skipped {
                continue;
            }
            let id = TypeId(kept.len());
            entries[decl.id.0] = Some((id, decl.name.clone()));
            decl.id = id;
            decl.first_seen = id.0;
            kept.push(decl);
        }

        let remap = TypeRemap { entries };
        for decl in &mut kept {
            for ty in decl.kind.type_refs_mut() {
                remap.apply(ty);
            }
        }
        (TypeTable::from_decls(kept), remap, self.diagnostics)
    }

    fn allocate(
        &mut self,
        schema_id: SchemaId,
        name: String,
        location: String,
        slot: &'doc SchemaOrRef,
    ) -> TypeId {
        let schema: Option<&Schema> = slot.as_item().map(|s| s.as_ref());
        let id = TypeId(self.decls.len());
        self.decls.push(TypeDecl {
            id,
            name,
            kind: TypeDeclKind::Alias(TypeRef::Any),
            description: schema.and_then(|s| s.description.clone().or_else(|| s.title.clone())),
            location,
            first_seen: id.0,
            deprecated: schema.and_then(|s| s.deprecated).unwrap_or(false),
        });
        self.states.push(DeclState::Pending);
        self.nullable
            .push(schema.is_some_and(|s| !matches!(shape(s), Shape::Inline) && admits_null(s)));
        self.schemas.push(schema_id);
        self.by_schema.insert(schema_id, id);
        id
    }

    fn build(&mut self, id: TypeId) -> Result<(), PipelineError> {
        if self.states[id.0] != DeclState::Pending {
            return Ok(());
        }
        self.states[id.0] = DeclState::Building;

        let schema_id = self.schemas[id.0];
        let node = self.resolver.node(schema_id);
        let slot = node.slot;
        let location = node.pointer.clone();
        let owner = self.decls[id.0].name.clone();

        self.resolver.enter(schema_id);
        let result = self.build_kind(schema_id, slot, &location, &owner);
        self.resolver.leave(schema_id);

        match result {
            Ok(kind) => {
                self.decls[id.0].kind = kind;
                self.states[id.0] = DeclState::Done;
            }
            Err(MapError::Unsupported { location, reason }) => {
                self.states[id.0] = DeclState::Skipped;
                self.report(Diagnostic::UnsupportedConstruct {
                    location,
                    reason: format!("type `{owner}` skipped: {reason}"),
                });
            }
            Err(MapError::Fatal(err)) => return Err(err),
        }
        Ok(())
    }

    fn build_kind(
        &mut self,
        schema_id: SchemaId,
        slot: &'doc SchemaOrRef,
        location: &str,
        owner: &str,
    ) -> Result<TypeDeclKind, MapError> {
        let schema: &'doc Schema = match slot {
            RefOr::Item(schema) => schema.as_ref(),
            RefOr::Ref { .. } => {
                return Ok(TypeDeclKind::Alias(self.map_slot(slot, location, owner)?));
            }
        };
        Ok(match shape(schema) {
            Shape::Record => TypeDeclKind::Record(self.record(schema, location, owner)?),
            Shape::Merged => {
                TypeDeclKind::Record(self.merged_record(schema_id, schema, location, owner)?)
            }
            Shape::Enum => TypeDeclKind::Enum(self.enumeration(schema, location)?),
            Shape::Union { keyword, branches } => {
                TypeDeclKind::Union(self.union(keyword, branches, location, owner)?)
            }
            Shape::Inline => TypeDeclKind::Alias(self.inline(schema, location, owner)?),
        })
    }

    fn map_slot(
        &mut self,
        slot: &'doc SchemaOrRef,
        location: &str,
        context: &str,
    ) -> Result<TypeRef, MapError> {
        let resolution = self.resolver.resolve_schema(slot, location)?;
        if let Some(&id) = self.by_schema.get(&resolution.id) {
            return self.named(id, resolution.recursive);
        }

        let node = self.resolver.node(resolution.id);
        let target = node.slot;
        let target_location = node.pointer.clone();
        let schema: &'doc Schema = match target {
            RefOr::Item(schema) => schema.as_ref(),
            RefOr::Ref { .. } => {
                // A pointer into the middle of the document that is itself a
                // reference; reject cycles before following it.
                self.resolver.concrete(resolution.id)?;
                return self.map_slot(target, &target_location, context);
            }
        };

        match shape(schema) {
            Shape::Inline => {
                if resolution.recursive {
                    return Ok(TypeRef::Any);
                }
                self.resolver.enter(resolution.id);
                let ty = self.inline(schema, &target_location, context);
                self.resolver.leave(resolution.id);
                ty
            }
            _ => {
                let breadcrumb = pointer::breadcrumb(&target_location);
                let name = self.names.claim(&type_name(context), &breadcrumb)?;
                let id = self.allocate(resolution.id, name, breadcrumb, target);
                self.build(id)?;
                self.named(id, false)
            }
        }
    }

    fn named(&mut self, id: TypeId, recursive: bool) -> Result<TypeRef, MapError> {
        if !recursive {
            self.build(id)?;
        }
        let ty = TypeRef::Named {
            id,
            name: self.decls[id.0].name.clone(),
            recursive,
        };
        Ok(if self.nullable[id.0] { ty.nullable() } else { ty })
    }

    fn record(
        &mut self,
        schema: &'doc Schema,
        location: &str,
        owner: &str,
    ) -> Result<RecordDecl, MapError> {
        let properties = pointer::child(location, "properties");
        let mut fields = Vec::with_capacity(schema.properties.len());
        for (prop, slot) in &schema.properties {
            let context = format!("{owner}{}", type_name(prop));
            let field_type = self.map_slot(slot, &pointer::child(&properties, prop), &context)?;
            fields.push(field_decl(prop, slot, field_type, schema.required.contains(prop)));
        }
        let extra = self.extra_fields(schema, location, owner)?;
        Ok(RecordDecl { fields, extra })
    }

    fn extra_fields(
        &mut self,
        schema: &'doc Schema,
        location: &str,
        owner: &str,
    ) -> Result<ExtraFields, MapError> {
        Ok(match &schema.additional_properties {
            None => ExtraFields::Unspecified,
            Some(AdditionalProperties::Bool(false)) => ExtraFields::Forbidden,
            Some(AdditionalProperties::Bool(true)) => ExtraFields::Typed(TypeRef::Any),
            Some(AdditionalProperties::Schema(slot)) => ExtraFields::Typed(self.map_slot(
                slot,
                &pointer::child(location, "additionalProperties"),
                &format!("{owner}Value"),
            )?),
        })
    }

    fn merged_record(
        &mut self,
        schema_id: SchemaId,
        schema: &'doc Schema,
        location: &str,
        owner: &str,
    ) -> Result<RecordDecl, MapError> {
        let mut merge = Merge::default();
        let mut chain = vec![schema_id];
        let branches = pointer::child(location, "allOf");
        for (i, branch) in schema.all_of.iter().enumerate() {
            let branch_location = pointer::child(&branches, &i.to_string());
            self.merge_branch(branch, &branch_location, owner, &mut merge, &mut chain)?;
        }
        self.merge_properties(schema, location, owner, &mut merge)?;
        let extra = self.extra_fields(schema, location, owner)?;
        Ok(merge.finish(extra))
    }

    fn merge_branch(
        &mut self,
        slot: &'doc SchemaOrRef,
        location: &str,
        owner: &str,
        merge: &mut Merge,
        chain: &mut Vec<SchemaId>,
    ) -> Result<(), MapError> {
        let resolution = self.resolver.resolve_schema(slot, location)?;
        let schema_id = self.resolver.concrete(resolution.id)?;
        if chain.contains(&schema_id) {
            return Err(unsupported(location, "allOf includes itself"));
        }

        let node = self.resolver.node(schema_id);
        let branch_location = node.pointer.clone();
        let is_component = node.component.is_some();
        let slot: &'doc SchemaOrRef = node.slot;
        let RefOr::Item(branch) = slot else {
            return Ok(());
        };
        let branch: &'doc Schema = branch.as_ref();

        if !branch.one_of.is_empty() || !branch.any_of.is_empty() {
            return Err(unsupported(
                location,
                "an allOf branch with oneOf/anyOf cannot be merged into a record",
            ));
        }
        let types = branch.declared_types();
        if !types.is_empty() && types != [SchemaType::Object] {
            return Err(unsupported(location, "allOf branch is not an object schema"));
        }

        // Inline types under a component branch are named after the component.
        let owner = match self.by_schema.get(&schema_id) {
            Some(id) if is_component => self.decls[id.0].name.clone(),
            _ => owner.to_string(),
        };

        chain.push(schema_id);
        let nested = pointer::child(&branch_location, "allOf");
        for (i, inner) in branch.all_of.iter().enumerate() {
            let inner_location = pointer::child(&nested, &i.to_string());
            self.merge_branch(inner, &inner_location, &owner, merge, chain)?;
        }
        self.merge_properties(branch, &branch_location, &owner, merge)?;
        chain.pop();
        Ok(())
    }

    fn merge_properties(
        &mut self,
        schema: &'doc Schema,
        location: &str,
        owner: &str,
        merge: &mut Merge,
    ) -> Result<(), MapError> {
        let properties = pointer::child(location, "properties");
        for (prop, slot) in &schema.properties {
            let prop_location = pointer::child(&properties, prop);
            let context = format!("{owner}{}", type_name(prop));
            let field_type = self.map_slot(slot, &prop_location, &context)?;
            match merge.fields.get_mut(prop) {
                None => {
                    merge
                        .fields
                        .insert(prop.clone(), field_decl(prop, slot, field_type, false));
                }
                Some(existing) if existing.field_type == TypeRef::Any => {
                    existing.field_type = field_type;
                }
                Some(existing) if field_type == TypeRef::Any || existing.field_type == field_type => {}
                Some(_) => {
                    return Err(unsupported(
                        &prop_location,
                        format!("allOf branches disagree on the type of property `{prop}`"),
                    ));
                }
            }
        }
        merge.required.extend(schema.required.iter().cloned());
        Ok(())
    }

    fn enumeration(&mut self, schema: &'doc Schema, location: &str) -> Result<EnumDecl, MapError> {
        let values: Vec<&Value> = schema.enum_values.iter().filter(|v| !v.is_null()).collect();
        let base = if values.iter().all(|v| v.is_string()) {
            EnumBase::String
        } else if values.iter().all(|v| v.is_i64() || v.is_u64()) {
            EnumBase::Integer
        } else {
            EnumBase::Mixed
        };

        let breadcrumb = pointer::breadcrumb(location);
        let mut names = TypeNames::default();
        let mut members = Vec::with_capacity(values.len());
        for value in values {
            members.push(EnumMember {
                name: names.claim(&member_name(value), &breadcrumb)?,
                value: value.clone(),
            });
        }
        Ok(EnumDecl { base, members })
    }

    fn union(
        &mut self,
        keyword: &'static str,
        branches: Vec<(usize, &'doc SchemaOrRef)>,
        location: &str,
        owner: &str,
    ) -> Result<UnionDecl, MapError> {
        let base = pointer::child(location, keyword);
        let mut variants = Vec::with_capacity(branches.len());
        for (n, (i, branch)) in branches.into_iter().enumerate() {
            let context = format!("{owner}Option{}", n + 1);
            let variant = self.map_slot(branch, &pointer::child(&base, &i.to_string()), &context)?;
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }
        Ok(UnionDecl {
            variants,
            any_of: keyword == "anyOf",
        })
    }

    /// Map a schema that needs no declaration of its own.
    fn inline(
        &mut self,
        schema: &'doc Schema,
        location: &str,
        context: &str,
    ) -> Result<TypeRef, MapError> {
        let (keyword, branches) = union_branches(schema);
        let ty = if let [only] = schema.all_of.as_slice() {
            let branch = pointer::child(&pointer::child(location, "allOf"), "0");
            self.map_slot(only, &branch, context)?
        } else if let [(i, only)] = branches.as_slice() {
            let branch = pointer::child(&pointer::child(location, keyword), &i.to_string());
            self.map_slot(*only, &branch, context)?
        } else if !schema.one_of.is_empty() || !schema.any_of.is_empty() {
            TypeRef::Literal(Value::Null)
        } else if let Some(ty) = schema.const_value.as_ref().and_then(literal) {
            ty
        } else if !schema.enum_values.is_empty() {
            TypeRef::Literal(Value::Null)
        } else {
            self.by_types(schema, location, context)?
        };
        Ok(if admits_null(schema) { ty.nullable() } else { ty })
    }

    fn by_types(
        &mut self,
        schema: &'doc Schema,
        location: &str,
        context: &str,
    ) -> Result<TypeRef, MapError> {
        let types = schema.declared_types();
        match types.as_slice() {
            [] if schema.is_null_only() => Ok(TypeRef::Literal(Value::Null)),
            [] if schema.items.is_some() => self.single(SchemaType::Array, schema, location, context),
            [] if schema.additional_properties.is_some() => {
                self.single(SchemaType::Object, schema, location, context)
            }
            [] => Ok(TypeRef::Any),
            [only] => self.single(*only, schema, location, context),
            many => {
                let mut variants = Vec::with_capacity(many.len());
                for t in many {
                    variants.push(self.single(*t, schema, location, context)?);
                }
                Ok(TypeRef::Union(variants))
            }
        }
    }

    fn single(
        &mut self,
        schema_type: SchemaType,
        schema: &'doc Schema,
        location: &str,
        context: &str,
    ) -> Result<TypeRef, MapError> {
        Ok(match schema_type {
            SchemaType::String => TypeRef::Scalar {
                scalar: Scalar::String,
                format: schema.format.as_deref().and_then(FormatTag::from_format),
            },
            SchemaType::Integer => TypeRef::scalar(Scalar::Integer),
            SchemaType::Number => TypeRef::scalar(Scalar::Number),
            SchemaType::Boolean => TypeRef::scalar(Scalar::Boolean),
            SchemaType::Null => TypeRef::Literal(Value::Null),
            SchemaType::Array => match &schema.items {
                Some(items) => TypeRef::Array(Box::new(self.map_slot(
                    items,
                    &pointer::child(location, "items"),
                    &format!("{context}Item"),
                )?)),
                None => TypeRef::Array(Box::new(TypeRef::Any)),
            },
            SchemaType::Object => match &schema.additional_properties {
                Some(AdditionalProperties::Schema(value)) => TypeRef::Map(Box::new(self.map_slot(
                    value,
                    &pointer::child(location, "additionalProperties"),
                    &format!("{context}Value"),
                )?)),
                _ => TypeRef::Map(Box::new(TypeRef::Any)),
            },
        })
    }
}

/// Renumbering produced by [`TypeMapper::finish`].
#[derive(Debug, Clone)]
pub struct TypeRemap {
    entries: Vec<Option<(TypeId, String)>>,
}

impl TypeRemap {
    /// Point use sites at the renumbered ids; skipped types become `Any`.
    pub fn apply(&self, ty: &mut TypeRef) {
        ty.rewrite_named(&mut |id| self.entries.get(id.0).cloned().flatten());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{self, document::OpenApiDocument};

    fn document(schemas: &str) -> OpenApiDocument {
        parse::from_json(&format!(
            r#"{{
                "openapi": "3.0.3",
                "info": {{"title": "T", "version": "1"}},
                "paths": {{}},
                "components": {{"schemas": {schemas}}}
            }}"#
        ))
        .unwrap()
    }

    fn map(doc: &OpenApiDocument) -> (TypeTable, Vec<Diagnostic>) {
        let resolver = RefResolver::new(doc).unwrap();
        let mut mapper = TypeMapper::new(resolver).unwrap();
        mapper.map_components().unwrap();
        let (table, _, diagnostics) = mapper.finish();
        (table, diagnostics)
    }

    fn record<'a>(table: &'a TypeTable, name: &str) -> &'a RecordDecl {
        match &table.find(name).unwrap().kind {
            TypeDeclKind::Record(record) => record,
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn test_fields_match_properties() {
        let doc = document(
            r#"{"Pet": {
                "type": "object",
                "required": ["id"],
                "properties": {"id": {"type": "integer"}, "name": {"type": "string"}}
            }}"#,
        );
        let (table, diagnostics) = map(&doc);
        assert!(diagnostics.is_empty());
        let pet = record(&table, "Pet");
        let fields: Vec<_> = pet
            .fields
            .iter()
            .map(|f| (f.wire_name.as_str(), f.required))
            .collect();
        assert_eq!(fields, vec![("id", true), ("name", false)]);
        assert_eq!(pet.fields[0].field_type, TypeRef::scalar(Scalar::Integer));
    }

    #[test]
    fn test_self_reference_declared_once() {
        let doc = document(
            r##"{"Node": {
                "type": "object",
                "properties": {
                    "value": {"type": "string"},
                    "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
                }
            }}"##,
        );
        let (table, _) = map(&doc);
        assert_eq!(table.len(), 1);
        let node = table.find("Node").unwrap();
        assert!(node.is_recursive());
        assert!(node.dependencies().is_empty());
        let TypeDeclKind::Record(record) = &node.kind else {
            panic!("expected record");
        };
        assert_eq!(
            record.fields[1].field_type,
            TypeRef::Array(Box::new(TypeRef::Named {
                id: node.id,
                name: "Node".to_string(),
                recursive: true,
            }))
        );
    }

    #[test]
    fn test_mutual_recursion_marks_back_edge() {
        let doc = document(
            r##"{
                "A": {"type": "object", "properties": {"b": {"$ref": "#/components/schemas/B"}}},
                "B": {"type": "object", "properties": {"a": {"$ref": "#/components/schemas/A"}}}
            }"##,
        );
        let (table, _) = map(&doc);
        let a = table.find("A").unwrap();
        let b = table.find("B").unwrap();
        assert_eq!(a.dependencies(), vec![b.id]);
        assert!(b.dependencies().is_empty());
        assert!(b.is_recursive());
    }

    #[test]
    fn test_enum_members_in_order() {
        let doc = document(r#"{"Status": {"type": "string", "enum": ["a", "b", "c"]}}"#);
        let (table, _) = map(&doc);
        let TypeDeclKind::Enum(decl) = &table.find("Status").unwrap().kind else {
            panic!("expected enum");
        };
        let names: Vec<_> = decl.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(decl.base, EnumBase::String);
    }

    #[test]
    fn test_inline_types_named_from_context() {
        let doc = document(
            r#"{"Pet": {
                "type": "object",
                "properties": {
                    "status": {"type": "string", "enum": ["available", "sold"]},
                    "owner": {"type": "object", "properties": {"name": {"type": "string"}}},
                    "tags": {"type": "array", "items": {"type": "object", "properties": {"id": {"type": "integer"}}}}
                }
            }}"#,
        );
        let (table, _) = map(&doc);
        let names: Vec<_> = table.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Pet", "PetStatus", "PetOwner", "PetTagsItem"]);
    }

    #[test]
    fn test_component_name_wins_over_context_name() {
        let doc = document(
            r#"{
                "Pet": {"type": "object", "properties": {"status": {"enum": ["a"]}}},
                "PetStatus": {"type": "string"}
            }"#,
        );
        let (table, _) = map(&doc);
        assert!(matches!(
            table.find("PetStatus").unwrap().kind,
            TypeDeclKind::Alias(_)
        ));
        assert!(matches!(
            table.find("PetStatus1").unwrap().kind,
            TypeDeclKind::Enum(_)
        ));
    }

    #[test]
    fn test_all_of_merges_branches() {
        let doc = document(
            r##"{
                "Base": {"type": "object", "required": ["id"], "properties": {"id": {"type": "integer"}}},
                "Dog": {"allOf": [
                    {"$ref": "#/components/schemas/Base"},
                    {"type": "object", "required": ["bark"], "properties": {"bark": {"type": "boolean"}}}
                ]}
            }"##,
        );
        let (table, diagnostics) = map(&doc);
        assert!(diagnostics.is_empty());
        let dog = record(&table, "Dog");
        let fields: Vec<_> = dog
            .fields
            .iter()
            .map(|f| (f.wire_name.as_str(), f.required))
            .collect();
        assert_eq!(fields, vec![("id", true), ("bark", true)]);
    }

    #[test]
    fn test_all_of_conflict_skips_type_and_degrades_uses() {
        let doc = document(
            r##"{
                "Bad": {"allOf": [
                    {"type": "object", "properties": {"id": {"type": "integer"}}},
                    {"type": "object", "properties": {"id": {"type": "string"}}}
                ]},
                "Holder": {"type": "object", "properties": {"bad": {"$ref": "#/components/schemas/Bad"}}}
            }"##,
        );
        let (table, diagnostics) = map(&doc);
        assert!(table.find("Bad").is_none());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_skip());
        let holder = record(&table, "Holder");
        assert_eq!(holder.fields[0].field_type, TypeRef::Any);
        assert_eq!(table.find("Holder").unwrap().id.index(), 0);
    }

    #[test]
    fn test_nullable_and_formats() {
        let doc = document(
            r#"{"Event": {
                "type": "object",
                "properties": {
                    "at": {"type": "string", "format": "date-time", "nullable": true},
                    "tags": {"type": ["array", "null"], "items": {"type": "string"}},
                    "kind": {"const": "event"},
                    "extra": {"type": "object", "additionalProperties": {"type": "number"}}
                }
            }}"#,
        );
        let (table, _) = map(&doc);
        let event = record(&table, "Event");
        assert_eq!(
            event.fields[0].field_type,
            TypeRef::Nullable(Box::new(TypeRef::Scalar {
                scalar: Scalar::String,
                format: Some(FormatTag::DateTime),
            }))
        );
        assert_eq!(
            event.fields[1].field_type,
            TypeRef::Nullable(Box::new(TypeRef::Array(Box::new(TypeRef::scalar(
                Scalar::String
            )))))
        );
        assert_eq!(
            event.fields[2].field_type,
            TypeRef::Literal(Value::from("event"))
        );
        assert_eq!(
            event.fields[3].field_type,
            TypeRef::Map(Box::new(TypeRef::scalar(Scalar::Number)))
        );
    }

    #[test]
    fn test_union_with_null_branch() {
        let doc = document(
            r##"{
                "Cat": {"type": "object", "properties": {"meow": {"type": "boolean"}}},
                "Dog": {"type": "object", "properties": {"bark": {"type": "boolean"}}},
                "Pet": {"oneOf": [
                    {"$ref": "#/components/schemas/Cat"},
                    {"$ref": "#/components/schemas/Dog"}
                ]},
                "MaybeCat": {"anyOf": [{"$ref": "#/components/schemas/Cat"}, {"type": "null"}]}
            }"##,
        );
        let (table, _) = map(&doc);
        let TypeDeclKind::Union(union) = &table.find("Pet").unwrap().kind else {
            panic!("expected union");
        };
        assert_eq!(union.variants.len(), 2);
        let TypeDeclKind::Alias(TypeRef::Nullable(inner)) = &table.find("MaybeCat").unwrap().kind
        else {
            panic!("expected nullable alias");
        };
        assert!(matches!(**inner, TypeRef::Named { ref name, .. } if name == "Cat"));
    }
}

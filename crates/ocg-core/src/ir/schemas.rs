use serde_json::Value;

use super::types::NormalizedName;

/// Index of a declaration in its [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Target-independent primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    String,
    Integer,
    Number,
    Boolean,
}

/// Semantic hint carried over from a schema `format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    DateTime,
    Date,
    Time,
    Email,
    Uri,
    Uuid,
    Binary,
    Byte,
}

impl FormatTag {
    /// The tag for a `format` keyword, if it is one we keep.
    pub fn from_format(format: &str) -> Option<Self> {
        Some(match format {
            "date-time" => FormatTag::DateTime,
            "date" => FormatTag::Date,
            "time" => FormatTag::Time,
            "email" | "idn-email" => FormatTag::Email,
            "uri" | "url" | "iri" => FormatTag::Uri,
            "uuid" => FormatTag::Uuid,
            "binary" => FormatTag::Binary,
            "byte" => FormatTag::Byte,
            _ => return None,
        })
    }
}

/// A use site of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Scalar {
        scalar: Scalar,
        format: Option<FormatTag>,
    },
    Array(Box<TypeRef>),
    /// String-keyed map of the value type.
    Map(Box<TypeRef>),
    Named {
        id: TypeId,
        name: String,
        /// The use site closes a reference cycle and must be forward-declared.
        recursive: bool,
    },
    Nullable(Box<TypeRef>),
    /// Inline union of types that need no declaration of their own.
    Union(Vec<TypeRef>),
    Literal(Value),
    Any,
}

impl TypeRef {
    pub fn scalar(scalar: Scalar) -> Self {
        TypeRef::Scalar {
            scalar,
            format: None,
        }
    }

    /// Wrap in `Nullable` unless already nullable.
    pub fn nullable(self) -> Self {
        match self {
            TypeRef::Nullable(_) | TypeRef::Any | TypeRef::Literal(Value::Null) => self,
            other => TypeRef::Nullable(Box::new(other)),
        }
    }

    /// Whether `null` is an accepted value.
    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Nullable(_) | TypeRef::Any)
            || matches!(self, TypeRef::Literal(Value::Null))
    }

    /// Declarations this use site depends on, in order of appearance.
    ///
    /// Recursive use sites are forward references and are left out.
    pub fn dependencies(&self, out: &mut Vec<TypeId>) {
        match self {
            TypeRef::Named {
                id,
                recursive: false,
                ..
            } => out.push(*id),
            TypeRef::Array(inner) | TypeRef::Map(inner) | TypeRef::Nullable(inner) => {
                inner.dependencies(out)
            }
            TypeRef::Union(variants) => variants.iter().for_each(|v| v.dependencies(out)),
            _ => {}
        }
    }

    /// Whether any use site below this one is a forward reference.
    pub fn has_recursive(&self) -> bool {
        match self {
            TypeRef::Named { recursive, .. } => *recursive,
            TypeRef::Array(inner) | TypeRef::Map(inner) | TypeRef::Nullable(inner) => {
                inner.has_recursive()
            }
            TypeRef::Union(variants) => variants.iter().any(TypeRef::has_recursive),
            _ => false,
        }
    }

    /// Rewrite every named use site through `f`; `None` degrades it to `Any`.
    pub fn rewrite_named(&mut self, f: &mut impl FnMut(TypeId) -> Option<(TypeId, String)>) {
        match self {
            TypeRef::Named { id, name, .. } => match f(*id) {
                Some((new_id, new_name)) => {
                    *id = new_id;
                    *name = new_name;
                }
                None => *self = TypeRef::Any,
            },
            TypeRef::Array(inner) | TypeRef::Map(inner) | TypeRef::Nullable(inner) => {
                inner.rewrite_named(f);
                if matches!(self, TypeRef::Nullable(inner) if **inner == TypeRef::Any) {
                    *self = TypeRef::Any;
                }
            }
            TypeRef::Union(variants) => {
                variants.iter_mut().for_each(|v| v.rewrite_named(f));
                if variants.contains(&TypeRef::Any) {
                    *self = TypeRef::Any;
                }
            }
            _ => {}
        }
    }
}

/// A generated type declaration.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub id: TypeId,
    /// Unique, already sanitized identifier.
    pub name: String,
    pub kind: TypeDeclKind,
    pub description: Option<String>,
    /// Breadcrumb of the schema the type came from.
    pub location: String,
    /// Position in first-seen order across the document.
    pub first_seen: usize,
    pub deprecated: bool,
}

impl TypeDecl {
    /// Declarations this one depends on, without forward references.
    pub fn dependencies(&self) -> Vec<TypeId> {
        let mut out = Vec::new();
        for type_ref in self.kind.type_refs() {
            type_ref.dependencies(&mut out);
        }
        out.dedup();
        out
    }

    /// Whether the declaration refers back to itself or to a type declared
    /// after it in a cycle.
    pub fn is_recursive(&self) -> bool {
        self.kind.type_refs().any(TypeRef::has_recursive)
    }
}

#[derive(Debug, Clone)]
pub enum TypeDeclKind {
    Record(RecordDecl),
    Enum(EnumDecl),
    Union(UnionDecl),
    Alias(TypeRef),
}

impl TypeDeclKind {
    /// Every use site inside the declaration.
    pub fn type_refs(&self) -> Box<dyn Iterator<Item = &TypeRef> + '_> {
        match self {
            TypeDeclKind::Record(record) => Box::new(
                record
                    .fields
                    .iter()
                    .map(|f| &f.field_type)
                    .chain(record.extra.type_ref()),
            ),
            TypeDeclKind::Enum(_) => Box::new(std::iter::empty()),
            TypeDeclKind::Union(union) => Box::new(union.variants.iter()),
            TypeDeclKind::Alias(target) => Box::new(std::iter::once(target)),
        }
    }

    pub(crate) fn type_refs_mut(&mut self) -> Vec<&mut TypeRef> {
        match self {
            TypeDeclKind::Record(record) => {
                let mut refs: Vec<&mut TypeRef> =
                    record.fields.iter_mut().map(|f| &mut f.field_type).collect();
                if let ExtraFields::Typed(value) = &mut record.extra {
                    refs.push(value);
                }
                refs
            }
            TypeDeclKind::Enum(_) => Vec::new(),
            TypeDeclKind::Union(union) => union.variants.iter_mut().collect(),
            TypeDeclKind::Alias(target) => vec![target],
        }
    }
}

/// An object schema with typed fields.
#[derive(Debug, Clone)]
pub struct RecordDecl {
    pub fields: Vec<FieldDecl>,
    pub extra: ExtraFields,
}

/// How keys beyond the declared properties are treated.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExtraFields {
    /// `additionalProperties` absent.
    #[default]
    Unspecified,
    /// `additionalProperties: false`.
    Forbidden,
    /// `additionalProperties: true` (as `Any`) or a schema.
    Typed(TypeRef),
}

impl ExtraFields {
    fn type_ref(&self) -> Option<&TypeRef> {
        match self {
            ExtraFields::Typed(value) => Some(value),
            _ => None,
        }
    }
}

/// A field on a record.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Casing variants derived from the wire name.
    pub name: NormalizedName,
    /// Property key as it appears on the wire.
    pub wire_name: String,
    pub field_type: TypeRef,
    pub required: bool,
    pub description: Option<String>,
    pub default_value: Option<Value>,
    pub read_only: bool,
    pub write_only: bool,
    pub deprecated: bool,
}

/// An enumeration with members in declared order.
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub base: EnumBase,
    pub members: Vec<EnumMember>,
}

/// Primitive kind shared by the members of an enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumBase {
    String,
    Integer,
    /// Members of differing or non-primitive kinds.
    Mixed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    /// Sanitized, unique member identifier.
    pub name: String,
    pub value: Value,
}

/// A tagged union of branch types.
#[derive(Debug, Clone)]
pub struct UnionDecl {
    pub variants: Vec<TypeRef>,
    /// `anyOf` rather than `oneOf`.
    pub any_of: bool,
}

/// Every generated declaration, indexed by [`TypeId`].
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    decls: Vec<TypeDecl>,
}

impl TypeTable {
    /// Build from declarations whose ids are their positions.
    pub(crate) fn from_decls(decls: Vec<TypeDecl>) -> Self {
        debug_assert!(decls.iter().enumerate().all(|(i, d)| d.id.0 == i));
        Self { decls }
    }

    pub fn get(&self, id: TypeId) -> &TypeDecl {
        &self.decls[id.0]
    }

    pub fn find(&self, name: &str) -> Option<&TypeDecl> {
        self.decls.iter().find(|decl| decl.name == name)
    }

    /// Declarations in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.iter()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

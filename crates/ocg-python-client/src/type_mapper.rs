use std::collections::{BTreeMap, BTreeSet};

use ocg_core::error::NameCollisionError;
use ocg_core::ir::{FormatTag, Scalar, TypeId, TypeRef, TypeTable};
use ocg_core::transform::name_normalizer::TypeNames;
use serde_json::Value;

use crate::reserved::is_reserved_type_name;

/// Python class names for every declaration, indexed by [`TypeId`].
///
/// Declarations whose name would shadow a keyword, an imported helper or the
/// client class get a `Model` suffix.
#[derive(Debug, Clone)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    pub fn new(types: &TypeTable, client_class: &str) -> Result<Self, NameCollisionError> {
        let mut taken = TypeNames::default();
        taken.reserve(client_class);
        for decl in types.iter() {
            taken.reserve(&decl.name);
        }
        let names = types
            .iter()
            .map(|decl| {
                if !is_reserved_type_name(&decl.name) && decl.name != client_class {
                    return Ok(decl.name.clone());
                }
                taken.claim(&format!("{}Model", decl.name), &decl.location)
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { names })
    }

    pub fn get(&self, id: TypeId) -> &str {
        &self.names[id.index()]
    }
}

/// Import lines a rendered module needs.
#[derive(Debug, Default)]
pub struct Imports {
    stdlib: BTreeMap<&'static str, BTreeSet<&'static str>>,
    third_party: BTreeMap<&'static str, BTreeSet<&'static str>>,
    /// Third-party modules imported whole.
    modules: BTreeSet<&'static str>,
}

impl Imports {
    pub fn stdlib(&mut self, module: &'static str, name: &'static str) {
        self.stdlib.entry(module).or_default().insert(name);
    }

    pub fn typing(&mut self, name: &'static str) {
        self.stdlib("typing", name);
    }

    pub fn pydantic(&mut self, name: &'static str) {
        self.third_party.entry("pydantic").or_default().insert(name);
    }

    pub fn module(&mut self, module: &'static str) {
        self.modules.insert(module);
    }

    /// `import` lines in isort order: stdlib first, then third party.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .stdlib
            .iter()
            .map(|(module, names)| format!("from {module} import {}", join(names)))
            .collect();
        if !self.modules.is_empty() || !self.third_party.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(self.modules.iter().map(|module| format!("import {module}")));
            lines.extend(
                self.third_party
                    .iter()
                    .map(|(module, names)| format!("from {module} import {}", join(names))),
            );
        }
        lines
    }
}

fn join(names: &BTreeSet<&'static str>) -> String {
    names.iter().copied().collect::<Vec<_>>().join(", ")
}

/// Renders [`TypeRef`]s as Python annotations, recording what they import.
pub struct PythonTypes<'a> {
    classes: &'a ClassNames,
    strict_formats: bool,
    imports: Imports,
}

impl<'a> PythonTypes<'a> {
    pub fn new(classes: &'a ClassNames, strict_formats: bool) -> Self {
        Self {
            classes,
            strict_formats,
            imports: Imports::default(),
        }
    }

    pub fn imports_mut(&mut self) -> &mut Imports {
        &mut self.imports
    }

    pub fn into_imports(self) -> Imports {
        self.imports
    }

    pub fn class_name(&self, id: TypeId) -> &'a str {
        self.classes.get(id)
    }

    /// The annotation for a use site.
    pub fn annotation(&mut self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Scalar { scalar, format } => self.scalar(*scalar, *format),
            TypeRef::Array(inner) => format!("list[{}]", self.annotation(inner)),
            TypeRef::Map(inner) => format!("dict[str, {}]", self.annotation(inner)),
            TypeRef::Named { id, recursive, .. } => {
                let name = self.classes.get(*id);
                if *recursive {
                    format!("\"{name}\"")
                } else {
                    name.to_string()
                }
            }
            TypeRef::Nullable(inner) => {
                self.imports.typing("Optional");
                format!("Optional[{}]", self.annotation(inner))
            }
            TypeRef::Union(variants) => {
                self.imports.typing("Union");
                let variants: Vec<_> = variants.iter().map(|v| self.annotation(v)).collect();
                format!("Union[{}]", variants.join(", "))
            }
            TypeRef::Literal(value) => {
                self.imports.typing("Literal");
                format!("Literal[{}]", python_literal(value))
            }
            TypeRef::Any => {
                self.imports.typing("Any");
                "Any".to_string()
            }
        }
    }

    /// The annotation for a value that may also be left out.
    pub fn optional(&mut self, ty: &TypeRef) -> String {
        if ty.is_nullable() {
            self.annotation(ty)
        } else {
            self.annotation(&ty.clone().nullable())
        }
    }

    fn scalar(&mut self, scalar: Scalar, format: Option<FormatTag>) -> String {
        let name = match scalar {
            Scalar::Integer => "int",
            Scalar::Number => "float",
            Scalar::Boolean => "bool",
            Scalar::String if self.strict_formats => match format {
                Some(FormatTag::DateTime) => {
                    self.imports.stdlib("datetime", "datetime");
                    "datetime"
                }
                Some(FormatTag::Date) => {
                    self.imports.stdlib("datetime", "date");
                    "date"
                }
                Some(FormatTag::Time) => {
                    self.imports.stdlib("datetime", "time");
                    "time"
                }
                Some(FormatTag::Uuid) => {
                    self.imports.stdlib("uuid", "UUID");
                    "UUID"
                }
                Some(FormatTag::Uri) => {
                    self.imports.pydantic("AnyUrl");
                    "AnyUrl"
                }
                Some(FormatTag::Email) => {
                    self.imports.pydantic("EmailStr");
                    "EmailStr"
                }
                Some(FormatTag::Binary | FormatTag::Byte) => "bytes",
                None => "str",
            },
            Scalar::String => "str",
        };
        name.to_string()
    }
}

/// A Python expression for a JSON value.
pub fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => python_str(s),
        Value::Array(items) => {
            let items: Vec<_> = items.iter().map(python_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<_> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", python_str(k), python_literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// A double-quoted Python string literal.
///
/// JSON string escapes are a subset of Python's.
pub fn python_str(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocg_core::ir::{TypeDecl, TypeDeclKind};

    fn table(names: &[&str]) -> TypeTable {
        let json = names
            .iter()
            .map(|n| format!(r#""{n}": {{"type": "string"}}"#))
            .collect::<Vec<_>>()
            .join(", ");
        let input = format!(
            r#"{{"openapi": "3.0.3", "info": {{"title": "T", "version": "1"}}, "paths": {{}},
                "components": {{"schemas": {{{json}}}}}}}"#
        );
        ocg_core::pipeline::analyze(&input, &Default::default())
            .unwrap()
            .types
    }

    fn first(types: &TypeTable) -> &TypeDecl {
        types.iter().next().unwrap()
    }

    #[test]
    fn test_scalars() {
        let classes = ClassNames::new(&TypeTable::default(), "ApiClient").unwrap();
        let mut py = PythonTypes::new(&classes, false);
        assert_eq!(py.annotation(&TypeRef::scalar(Scalar::Integer)), "int");
        assert_eq!(py.annotation(&TypeRef::scalar(Scalar::Number)), "float");
        assert_eq!(
            py.annotation(&TypeRef::Scalar {
                scalar: Scalar::String,
                format: Some(FormatTag::DateTime),
            }),
            "str"
        );
        assert!(py.into_imports().lines().is_empty());
    }

    #[test]
    fn test_strict_formats() {
        let classes = ClassNames::new(&TypeTable::default(), "ApiClient").unwrap();
        let mut py = PythonTypes::new(&classes, true);
        let fmt = |format| TypeRef::Scalar {
            scalar: Scalar::String,
            format: Some(format),
        };
        assert_eq!(py.annotation(&fmt(FormatTag::DateTime)), "datetime");
        assert_eq!(py.annotation(&fmt(FormatTag::Uuid)), "UUID");
        assert_eq!(py.annotation(&fmt(FormatTag::Email)), "EmailStr");
        assert_eq!(py.annotation(&fmt(FormatTag::Binary)), "bytes");
        assert_eq!(
            py.into_imports().lines(),
            vec![
                "from datetime import datetime",
                "from uuid import UUID",
                "",
                "from pydantic import EmailStr",
            ]
        );
    }

    #[test]
    fn test_containers_and_unions() {
        let classes = ClassNames::new(&TypeTable::default(), "ApiClient").unwrap();
        let mut py = PythonTypes::new(&classes, false);
        let ty = TypeRef::Nullable(Box::new(TypeRef::Map(Box::new(TypeRef::Array(Box::new(
            TypeRef::Union(vec![
                TypeRef::scalar(Scalar::String),
                TypeRef::scalar(Scalar::Integer),
            ]),
        ))))));
        assert_eq!(
            py.annotation(&ty),
            "Optional[dict[str, list[Union[str, int]]]]"
        );
        assert_eq!(
            py.annotation(&TypeRef::Literal(Value::from("cat"))),
            "Literal[\"cat\"]"
        );
        assert_eq!(
            py.into_imports().lines(),
            vec!["from typing import Literal, Optional, Union"]
        );
    }

    #[test]
    fn test_optional_does_not_double_wrap() {
        let classes = ClassNames::new(&TypeTable::default(), "ApiClient").unwrap();
        let mut py = PythonTypes::new(&classes, false);
        assert_eq!(py.optional(&TypeRef::scalar(Scalar::String)), "Optional[str]");
        assert_eq!(
            py.optional(&TypeRef::Nullable(Box::new(TypeRef::scalar(Scalar::String)))),
            "Optional[str]"
        );
        assert_eq!(py.optional(&TypeRef::Any), "Any");
    }

    #[test]
    fn test_named_and_recursive() {
        let types = table(&["Pet"]);
        let classes = ClassNames::new(&types, "ApiClient").unwrap();
        let mut py = PythonTypes::new(&classes, false);
        let id = first(&types).id;
        let named = |recursive| TypeRef::Named {
            id,
            name: "Pet".to_string(),
            recursive,
        };
        assert_eq!(py.annotation(&named(false)), "Pet");
        assert_eq!(py.annotation(&named(true)), "\"Pet\"");
        assert!(matches!(first(&types).kind, TypeDeclKind::Alias(_)));
    }

    #[test]
    fn test_reserved_class_names_renamed() {
        let types = table(&["Field", "FieldModel"]);
        let classes = ClassNames::new(&types, "ApiClient").unwrap();
        let names: Vec<_> = types.iter().map(|d| classes.get(d.id)).collect();
        assert_eq!(names, vec!["FieldModel1", "FieldModel"]);
    }

    #[test]
    fn test_client_class_name_is_taken() {
        let types = table(&["PetsClient", "Pet"]);
        let classes = ClassNames::new(&types, "PetsClient").unwrap();
        let names: Vec<_> = types.iter().map(|d| classes.get(d.id)).collect();
        assert_eq!(names, vec!["PetsClientModel", "Pet"]);
    }

    #[test]
    fn test_python_literals() {
        assert_eq!(python_literal(&Value::Null), "None");
        assert_eq!(python_literal(&Value::Bool(true)), "True");
        assert_eq!(python_literal(&serde_json::json!([1, "a"])), "[1, \"a\"]");
        assert_eq!(python_str("say \"hi\"\n"), r#""say \"hi\"\n""#);
    }
}

use std::collections::BTreeSet;

use minijinja::{Environment, context};
use ocg_core::config::GeneratorOptions;
use ocg_core::error::GeneratorError;
use ocg_core::ir::{
    EnumBase, EnumDecl, ExtraFields, FieldDecl, RecordDecl, TypeDecl, TypeDeclKind, TypeRef,
};
use ocg_core::synth::SynthesisPlan;
use ocg_core::transform::name_normalizer::TypeNames;
use serde_json::Value;

use super::{escape_docstring, template_error};
use crate::reserved::field_identifier;
use crate::type_mapper::{ClassNames, PythonTypes, python_literal, python_str};

/// Emit `models.py`: Pydantic v2 models, enums and aliases in plan order.
pub fn emit_models(
    plan: &SynthesisPlan<'_>,
    classes: &ClassNames,
    options: &GeneratorOptions,
) -> Result<String, GeneratorError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("escape_docstring", escape_docstring);
    env.add_template("models.py.j2", include_str!("../../templates/models.py.j2"))
        .map_err(template_error)?;
    let tmpl = env.get_template("models.py.j2").map_err(template_error)?;

    let docstrings = !options.client.no_docstrings;
    let mut py = PythonTypes::new(classes, options.client.strict_formats);
    let mut decls = Vec::with_capacity(plan.types.len());
    let mut rebuild = Vec::new();
    for decl in &plan.types {
        let name = py.class_name(decl.id).to_string();
        let docstring = decl.description.clone().filter(|_| docstrings);
        let ctx = match &decl.kind {
            TypeDeclKind::Record(record) => {
                if decl.is_recursive() {
                    rebuild.push(name.clone());
                }
                record_to_ctx(&mut py, decl, record, &name, docstring, docstrings)?
            }
            TypeDeclKind::Enum(enumeration) => enum_to_ctx(&mut py, enumeration, &name, docstring),
            TypeDeclKind::Union(union) => {
                py.imports_mut().typing("TypeAlias");
                py.imports_mut().typing("Union");
                let variants: Vec<_> = union.variants.iter().map(|v| py.annotation(v)).collect();
                context! {
                    kind => "alias",
                    name => name,
                    docstring => docstring,
                    target => format!("Union[{}]", variants.join(", ")),
                }
            }
            TypeDeclKind::Alias(target) => {
                py.imports_mut().typing("TypeAlias");
                context! {
                    kind => "alias",
                    name => name,
                    docstring => docstring,
                    target => py.annotation(target),
                }
            }
        };
        decls.push(ctx);
    }

    let result = plan.result;
    tmpl.render(context! {
        title => result.api_title(),
        version => result.api_version(),
        imports => py.into_imports().lines(),
        decls => decls,
        rebuild => rebuild,
    })
    .map_err(template_error)
}

fn record_to_ctx(
    py: &mut PythonTypes<'_>,
    decl: &TypeDecl,
    record: &RecordDecl,
    name: &str,
    docstring: Option<String>,
    docstrings: bool,
) -> Result<minijinja::Value, GeneratorError> {
    py.imports_mut().pydantic("BaseModel");
    py.imports_mut().pydantic("ConfigDict");

    let mut idents = TypeNames::default();
    let mut fields = Vec::with_capacity(record.fields.len());
    for field in &record.fields {
        let ident = idents.claim(&field_identifier(&field.wire_name), &decl.location)?;
        let annotation = if field.required {
            py.annotation(&field.field_type)
        } else {
            py.optional(&field.field_type)
        };
        let value = field_value(py, field, &ident, docstrings);
        fields.push(context! {
            name => ident,
            annotation => annotation,
            value => value,
        });
    }

    let mut config = vec!["populate_by_name=True".to_string()];
    match &record.extra {
        ExtraFields::Unspecified => {}
        ExtraFields::Forbidden => config.push("extra=\"forbid\"".to_string()),
        ExtraFields::Typed(_) => config.push("extra=\"allow\"".to_string()),
    }

    Ok(context! {
        kind => "record",
        name => name,
        docstring => docstring,
        config => config.join(", "),
        fields => fields,
    })
}

/// The right-hand side of a field assignment, if any.
fn field_value(
    py: &mut PythonTypes<'_>,
    field: &FieldDecl,
    ident: &str,
    docstrings: bool,
) -> Option<String> {
    let default = if field.required {
        None
    } else {
        Some(
            field
                .default_value
                .as_ref()
                .filter(|value| renders_default(&field.field_type, value))
                .map_or_else(|| "None".to_string(), python_literal),
        )
    };

    let mut args = Vec::new();
    if ident != field.wire_name {
        args.push(format!("alias={}", python_str(&field.wire_name)));
    }
    if let Some(description) = field.description.as_ref().filter(|_| docstrings) {
        args.push(format!("description={}", python_str(description)));
    }
    if field.deprecated {
        args.push("deprecated=True".to_string());
    }

    if args.is_empty() {
        return default;
    }
    py.imports_mut().pydantic("Field");
    if let Some(default) = default {
        args.insert(0, format!("default={default}"));
    }
    Some(format!("Field({})", args.join(", ")))
}

/// Defaults are only written out for plain scalar fields.
fn renders_default(ty: &TypeRef, value: &Value) -> bool {
    let ty = match ty {
        TypeRef::Nullable(inner) => inner.as_ref(),
        other => other,
    };
    matches!(ty, TypeRef::Scalar { .. })
        && matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn enum_to_ctx(
    py: &mut PythonTypes<'_>,
    enumeration: &EnumDecl,
    name: &str,
    docstring: Option<String>,
) -> minijinja::Value {
    let values: Vec<_> = enumeration.members.iter().map(|m| &m.value).collect();
    if has_equal_values(&values) {
        // Enum would fold the later members into aliases of the earlier ones.
        py.imports_mut().typing("Literal");
        py.imports_mut().typing("TypeAlias");
        let literals: Vec<_> = values.iter().map(|v| python_literal(v)).collect();
        return context! {
            kind => "alias",
            name => name,
            docstring => docstring,
            target => format!("Literal[{}]", literals.join(", ")),
        };
    }

    py.imports_mut().stdlib("enum", "Enum");
    let bases = match enumeration.base {
        EnumBase::String => "str, Enum",
        EnumBase::Integer => "int, Enum",
        EnumBase::Mixed => "Enum",
    };
    let members: Vec<_> = enumeration
        .members
        .iter()
        .map(|member| {
            context! {
                name => member.name.clone(),
                value => python_literal(&member.value),
            }
        })
        .collect();
    context! {
        kind => "enum",
        name => name,
        docstring => docstring,
        bases => bases,
        members => members,
    }
}

/// Whether two values compare equal in Python, where `True == 1 == 1.0`.
fn has_equal_values(values: &[&Value]) -> bool {
    let mut seen = BTreeSet::new();
    !values.iter().all(|value| seen.insert(python_eq_key(value)))
}

fn python_eq_key(value: &Value) -> String {
    match value {
        Value::Bool(b) => format!("n:{}", u8::from(*b)),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => format!("n:{i}"),
            (_, Some(u), _) => format!("n:{u}"),
            (_, _, Some(f)) => format!("n:{f}"),
            _ => format!("n:{n}"),
        },
        other => other.to_string(),
    }
}

use std::collections::BTreeSet;

use heck::ToPascalCase;
use minijinja::{Environment, context};
use ocg_core::config::GeneratorOptions;
use ocg_core::error::GeneratorError;
use ocg_core::ir::{
    BodyBinding, IrOperation, IrParameter, IrParameterLocation, IrReturnType, ParseResult,
    TypeRef,
};
use ocg_core::synth::SynthesisPlan;
use ocg_core::transform::name_normalizer::TypeNames;

use super::{escape_docstring, template_error};
use crate::reserved::{field_identifier, is_keyword};
use crate::type_mapper::{ClassNames, PythonTypes, python_str};

/// Members of the generated client class other than operation methods.
const CLIENT_MEMBERS: &[&str] = &[
    "close",
    "_client",
    "_owns_client",
    "_params",
    "_headers",
    "_cookies",
];

/// Identifiers every generated method already uses.
const METHOD_LOCALS: &[&str] = &["self", "body", "response", "path", "params", "headers", "cookies"];

/// Emit `client.py`: an async `httpx` client with one method per operation.
pub fn emit_client(
    plan: &SynthesisPlan<'_>,
    classes: &ClassNames,
    options: &GeneratorOptions,
) -> Result<String, GeneratorError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("escape_docstring", escape_docstring);
    env.add_template("client.py.j2", include_str!("../../templates/client.py.j2"))
        .map_err(template_error)?;
    let tmpl = env.get_template("client.py.j2").map_err(template_error)?;

    let result = plan.result;
    let docstrings = !options.client.no_docstrings;
    let mut py = PythonTypes::new(classes, options.client.strict_formats);
    let imports = py.imports_mut();
    imports.typing("Any");
    imports.typing("Optional");
    for name in ["date", "datetime", "time"] {
        imports.stdlib("datetime", name);
    }
    imports.stdlib("enum", "Enum");
    imports.stdlib("urllib.parse", "quote");
    imports.module("httpx");
    imports.pydantic("TypeAdapter");

    let mut models = BTreeSet::new();
    let common: Vec<&IrParameter> = result
        .common_headers
        .iter()
        .chain(&result.common_params)
        .collect();

    let mut common_idents = TypeNames::default();
    for local in ["self", "base_url", "headers", "timeout", "client"] {
        common_idents.reserve(local);
    }
    let mut common_ctx = Vec::with_capacity(common.len());
    for param in &common {
        collect_models(&param.param_type, &py, &mut models);
        let ident = common_idents
            .claim(&field_identifier(&param.original_name), "common parameters")
?;
        common_ctx.push(param_ctx(&mut py, param, ident));
    }

    let mut methods = TypeNames::default();
    for member in CLIENT_MEMBERS {
        methods.reserve(member);
    }
    let mut operations = Vec::with_capacity(plan.operations.len());
    for op in &plan.operations {
        let name = methods.claim(&method_name(op), &op.location)?;
        operations.push(operation_ctx(&mut py, op, name, &common, &mut models, docstrings)?);
    }

    let base_url = options
        .client
        .base_url
        .clone()
        .or_else(|| result.base_url.clone());
    let security: Vec<String> = result
        .security
        .iter()
        .map(|requirement| requirement.keys().cloned().collect::<Vec<_>>().join(" + "))
        .filter(|names| !names.is_empty())
        .collect();

    tmpl.render(context! {
        title => result.api_title(),
        version => result.api_version(),
        doc => if docstrings { class_docstring(result, &security) } else { Vec::new() },
        imports => py.into_imports().lines(),
        models => models.into_iter().collect::<Vec<_>>(),
        class_name => client_class_name(options, result.api_title()),
        base_url => python_str(base_url.as_deref().unwrap_or_default()),
        common => common_ctx,
        operations => operations,
    })
    .map_err(template_error)
}

fn class_docstring(result: &ParseResult, security: &[String]) -> Vec<String> {
    let mut lines = vec![format!(
        "Async client for {} {}.",
        result.api_title(),
        result.api_version()
    )];
    if let Some(description) = result.info.description.as_deref().map(str::trim)
        && !description.is_empty()
    {
        lines.push(String::new());
        lines.extend(description.lines().map(|l| l.trim_end().to_string()));
    }
    if !security.is_empty() {
        lines.push(String::new());
        lines.push(format!("Security: {}", security.join(" or ")));
    }
    lines
}

/// Configured class name, else `<Title>Client`.
pub(crate) fn client_class_name(options: &GeneratorOptions, title: &str) -> String {
    if let Some(name) = &options.client.class_name {
        return name.clone();
    }
    let base = title.to_pascal_case();
    let base: String = base.chars().filter(char::is_ascii_alphanumeric).collect();
    match base.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => format!("{base}Client"),
        _ => "ApiClient".to_string(),
    }
}

/// Model classes a use site needs imported.
fn collect_models(ty: &TypeRef, py: &PythonTypes<'_>, out: &mut BTreeSet<String>) {
    match ty {
        TypeRef::Named { id, .. } => {
            out.insert(py.class_name(*id).to_string());
        }
        TypeRef::Array(inner) | TypeRef::Map(inner) | TypeRef::Nullable(inner) => {
            collect_models(inner, py, out)
        }
        TypeRef::Union(variants) => variants.iter().for_each(|v| collect_models(v, py, out)),
        _ => {}
    }
}

fn param_ctx(py: &mut PythonTypes<'_>, param: &IrParameter, ident: String) -> minijinja::Value {
    let required = param.required || param.location == IrParameterLocation::Path;
    let annotation = if required {
        py.annotation(&param.param_type)
    } else {
        py.optional(&param.param_type)
    };
    context! {
        name => ident,
        wire_name => python_str(&param.original_name),
        annotation => annotation,
        required => required,
        location => location_name(param.location),
        description => param.description.clone(),
    }
}

fn location_name(location: IrParameterLocation) -> &'static str {
    match location {
        IrParameterLocation::Path => "path",
        IrParameterLocation::Query => "query",
        IrParameterLocation::Header => "header",
        IrParameterLocation::Cookie => "cookie",
    }
}

fn operation_ctx(
    py: &mut PythonTypes<'_>,
    op: &IrOperation,
    name: String,
    common: &[&IrParameter],
    models: &mut BTreeSet<String>,
    docstrings: bool,
) -> Result<minijinja::Value, GeneratorError> {
    let mut idents = TypeNames::default();
    for local in METHOD_LOCALS {
        idents.reserve(local);
    }

    let mut path_params = Vec::new();
    let mut keyword_params = Vec::new();
    let mut path_idents = Vec::new();
    for param in &op.parameters {
        if common.iter().any(|c| c.key() == param.key()) {
            continue;
        }
        collect_models(&param.param_type, py, models);
        let ident = idents
            .claim(&field_identifier(&param.original_name), &op.location)
?;
        if param.location == IrParameterLocation::Path {
            path_idents.push((param.original_name.as_str(), ident.clone()));
            path_params.push(param_ctx(py, param, ident));
        } else {
            keyword_params.push(param_ctx(py, param, ident));
        }
    }

    let body = match &op.request_body {
        Some(body) => {
            let (kind, annotation, adapter) = match &body.binding {
                BodyBinding::Json(ty) => {
                    collect_models(ty, py, models);
                    let annotation = py.annotation(ty);
                    ("json", annotation.clone(), Some(annotation))
                }
                BodyBinding::Text => ("text", "str".to_string(), None),
                BodyBinding::Binary => ("binary", "bytes".to_string(), None),
            };
            Some(context! {
                kind => kind,
                annotation => if body.required { annotation } else { format!("Optional[{annotation}]") },
                adapter => adapter,
                required => body.required,
                content_type => python_str(&body.content_type),
                description => body.description.clone(),
            })
        }
        None => None,
    };

    let (returns, return_kind, adapter) = match &op.return_type {
        IrReturnType::Void => ("None".to_string(), "void", None),
        IrReturnType::Body(BodyBinding::Text) => ("str".to_string(), "text", None),
        IrReturnType::Body(BodyBinding::Binary) => ("bytes".to_string(), "binary", None),
        IrReturnType::Body(BodyBinding::Json(TypeRef::Any)) => {
            ("Any".to_string(), "json_any", None)
        }
        IrReturnType::Body(BodyBinding::Json(ty)) => {
            collect_models(ty, py, models);
            let annotation = py.annotation(ty);
            (annotation.clone(), "json", Some(annotation))
        }
    };

    let doc = if docstrings {
        docstring_lines(op)
    } else {
        Vec::new()
    };

    Ok(context! {
        name => name,
        http_method => op.method.as_str(),
        path => path_expression(&op.path, &path_idents),
        path_params => path_params,
        keyword_params => keyword_params,
        body => body,
        returns => returns,
        return_kind => return_kind,
        adapter => adapter,
        doc => doc,
    })
}

/// The method identifier before uniqueness is claimed against the class.
fn method_name(op: &IrOperation) -> String {
    let name = field_identifier(&op.name.snake_case);
    if is_keyword(&name)
        || METHOD_LOCALS.contains(&name.as_str())
        || CLIENT_MEMBERS.contains(&name.as_str())
    {
        format!("{name}_")
    } else {
        name
    }
}

/// Docstring lines: summary, description, the HTTP route, then a deprecation note.
fn docstring_lines(op: &IrOperation) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(summary) = &op.summary {
        lines.push(summary.trim().to_string());
    }
    if let Some(description) = op.description.as_deref().map(str::trim)
        && Some(description) != op.summary.as_deref().map(str::trim)
    {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(description.lines().map(|l| l.trim_end().to_string()));
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!("{} {}", op.method.as_str(), op.path));
    if op.deprecated {
        lines.push(String::new());
        lines.push("Deprecated.".to_string());
    }
    lines
}

/// A Python expression for the request path, interpolating path parameters.
///
/// Template segments without a matching parameter are sent literally.
fn path_expression(path: &str, params: &[(&str, String)]) -> String {
    let mut out = String::new();
    let mut interpolated = false;
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let (literal, tail) = rest.split_at(start);
        out.push_str(&escape_path_literal(literal));
        match tail.find('}') {
            Some(end) => {
                let segment = &tail[1..end];
                match params.iter().find(|(wire, _)| *wire == segment) {
                    Some((_, ident)) => {
                        out.push_str(&format!("{{_path({ident})}}"));
                        interpolated = true;
                    }
                    None => out.push_str(&escape_path_literal(&tail[..=end])),
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push_str(&escape_path_literal(tail));
                rest = "";
            }
        }
    }
    out.push_str(&escape_path_literal(rest));

    if interpolated {
        format!("f\"{out}\"")
    } else {
        python_str(path)
    }
}

fn escape_path_literal(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('{', "{{")
        .replace('}', "}}")
}

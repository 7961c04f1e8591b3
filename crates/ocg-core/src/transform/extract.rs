use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;

use crate::config::{GeneratorOptions, NamingStrategy};
use crate::error::{Diagnostic, PipelineError};
use crate::ir::*;
use crate::parse::document::OpenApiDocument;
use crate::parse::media_type::MediaType;
use crate::parse::operation::{Operation, PathItem};
use crate::parse::parameter::{Header, Parameter, ParameterLocation, ParameterOrRef};
use crate::parse::reference::StrMap;
use crate::parse::request_body::RequestBody;
use crate::parse::response::{Response, ResponseOrRef};
use crate::resolve::{RefResolver, pointer};

use super::name_normalizer::{TypeNames, normalize_name, route_to_name, type_name};
use super::type_mapper::{TypeMapper, TypeRemap};

/// Media types whose payload is a set of named fields rather than one value.
const FORM_MEDIA_TYPES: [&str; 2] = ["multipart/form-data", "application/x-www-form-urlencoded"];

/// Turn a parsed document into the fully resolved IR.
///
/// Component schemas are mapped first, then every path × method in document
/// order. Operations that cannot be represented are left out and reported in
/// [`ParseResult::diagnostics`].
pub fn extract(
    document: &OpenApiDocument,
    options: &GeneratorOptions,
) -> Result<ParseResult, PipelineError> {
    let resolver = RefResolver::new(document)?;
    let mut mapper = TypeMapper::new(resolver)?;
    mapper.map_components()?;

    let mut extractor = Extractor {
        mapper,
        options,
        method_names: TypeNames::default(),
        operation_ids: HashMap::new(),
    };
    let mut operations = Vec::new();
    for (path, item) in &document.paths {
        extractor.path_item(path, item, &mut operations)?;
    }

    let (types, remap, diagnostics) = extractor.mapper.finish();
    for op in &mut operations {
        remap_operation(&remap, op);
    }

    let (common_headers, common_params) = common_parameters(&operations);
    debug!(
        "extracted {} operations, {} types, {} common headers, {} common params",
        operations.len(),
        types.len(),
        common_headers.len(),
        common_params.len()
    );

    Ok(ParseResult {
        info: IrInfo {
            title: document.info.title.clone(),
            description: document.info.description.clone(),
            version: document.info.version.clone(),
        },
        base_url: document.servers.first().map(|server| server.default_url()),
        servers: document
            .servers
            .iter()
            .map(|s| IrServer {
                url: s.default_url(),
                description: s.description.clone(),
            })
            .collect(),
        security: document.security.clone(),
        common_headers,
        common_params,
        operations,
        types,
        diagnostics,
    })
}

struct Extractor<'doc, 'o> {
    mapper: TypeMapper<'doc>,
    options: &'o GeneratorOptions,
    /// Method identifiers, keyed by snake_case form.
    method_names: TypeNames,
    /// First location of every declared `operationId`.
    operation_ids: HashMap<&'doc str, String>,
}

/// An operation left out of the output.
struct Skip {
    location: String,
    reason: String,
}

impl<'doc> Extractor<'doc, '_> {
    fn resolver(&self) -> &RefResolver<'doc> {
        self.mapper.resolver()
    }

    fn path_item(
        &mut self,
        path: &'doc str,
        item: &'doc PathItem,
        out: &mut Vec<IrOperation>,
    ) -> Result<(), PipelineError> {
        let path_location = pointer::child(pointer::PATHS, path);
        for (key, op) in item.operations() {
            let Some(method) = HttpMethod::from_key(key) else {
                continue;
            };
            let location = pointer::child(&path_location, key);
            match self.operation(method, path, item, op, &path_location, &location)? {
                Ok(ir_op) => out.push(ir_op),
                Err(skip) => self.mapper.report(Diagnostic::UnsupportedConstruct {
                    location: skip.location,
                    reason: format!(
                        "operation {} {path} skipped: {}",
                        method.as_str(),
                        skip.reason
                    ),
                }),
            }
        }
        Ok(())
    }

    fn operation(
        &mut self,
        method: HttpMethod,
        path: &'doc str,
        item: &'doc PathItem,
        op: &'doc Operation,
        path_location: &str,
        location: &str,
    ) -> Result<Result<IrOperation, Skip>, PipelineError> {
        let name = self.operation_name(method, path, op, location)?;
        let context = name.pascal_case.clone();

        let parameters =
            self.parameters(&item.parameters, path_location, &op.parameters, location, &context)?;

        let request_body = match &op.request_body {
            Some(body) => {
                let body_location = pointer::child(location, "requestBody");
                let (body, body_location) =
                    self.resolver().locate_component::<RequestBody>(body, &body_location)?;
                match self.request_body(body, &body_location, &context)? {
                    Ok(body) => body,
                    Err(skip) => return Ok(Err(skip)),
                }
            }
            None => None,
        };

        let success_status = success_status(&op.responses);
        let responses =
            self.responses(&op.responses, location, &context, success_status.as_deref())?;
        let return_type = responses
            .iter()
            .find(|r| Some(r.status.as_str()) == success_status.as_deref())
            .and_then(|r| r.binding.clone())
            .map_or(IrReturnType::Void, IrReturnType::Body);

        Ok(Ok(IrOperation {
            name,
            operation_id: op.operation_id.clone(),
            method,
            path: path.to_string(),
            location: pointer::breadcrumb(location),
            summary: op.summary.clone(),
            description: op.description.clone(),
            tags: op.tags.clone(),
            parameters,
            request_body,
            responses,
            success_status,
            return_type,
            deprecated: op.deprecated,
        }))
    }

    /// Pick the operation's name and make it unique among methods.
    fn operation_name(
        &mut self,
        method: HttpMethod,
        path: &str,
        op: &'doc Operation,
        location: &str,
    ) -> Result<NormalizedName, PipelineError> {
        let naming = &self.options.naming;
        let raw = match (naming.strategy, &op.operation_id) {
            (NamingStrategy::UseOperationId, Some(id)) => id.clone(),
            _ => route_to_name(method.as_str(), path),
        };
        let raw = naming.aliases.get(&raw).cloned().unwrap_or(raw);

        let base = normalize_name(&raw).snake_case;
        let claimed = self
            .method_names
            .claim(&base, &pointer::breadcrumb(location))?;
        let name = format!("{raw}{}", &claimed[base.len()..]);

        if let Some(id) = op.operation_id.as_deref() {
            let here = pointer::breadcrumb(location);
            match self.operation_ids.get(id) {
                Some(first) => {
                    let diagnostic = Diagnostic::DuplicateOperationId {
                        operation_id: id.to_string(),
                        first: first.clone(),
                        second: here,
                        renamed_to: name.clone(),
                    };
                    self.mapper.report(diagnostic);
                }
                None => {
                    self.operation_ids.insert(id, here);
                }
            }
        }
        Ok(normalize_name(&name))
    }

    /// Merge path-level and operation-level parameters by `(name, in)`; an
    /// operation-level entry replaces the path-level one.
    fn parameters(
        &mut self,
        path_params: &'doc [ParameterOrRef],
        path_location: &str,
        op_params: &'doc [ParameterOrRef],
        location: &str,
        context: &str,
    ) -> Result<Vec<IrParameter>, PipelineError> {
        let mut merged: IndexMap<(String, IrParameterLocation), IrParameter> = IndexMap::new();
        let levels = [(path_params, path_location), (op_params, location)];
        for (params, owner) in levels {
            let base = pointer::child(owner, "parameters");
            for (i, param) in params.iter().enumerate() {
                let param_location = pointer::child(&base, &i.to_string());
                let (param, param_location) = self
                    .resolver()
                    .locate_component::<Parameter>(param, &param_location)?;
                let ir_param = self.parameter(param, &param_location, context)?;
                merged.insert(
                    (ir_param.original_name.clone(), ir_param.location),
                    ir_param,
                );
            }
        }
        Ok(merged.into_values().collect())
    }

    fn parameter(
        &mut self,
        param: &'doc Parameter,
        location: &str,
        context: &str,
    ) -> Result<IrParameter, PipelineError> {
        let param_type = match &param.schema {
            Some(schema) => self.mapper.map_schema(
                schema,
                &pointer::child(location, "schema"),
                &format!("{context}{}", type_name(&param.name)),
            )?,
            None => TypeRef::Any,
        };
        Ok(IrParameter {
            name: normalize_name(&param.name),
            original_name: param.name.clone(),
            location: match param.location {
                ParameterLocation::Path => IrParameterLocation::Path,
                ParameterLocation::Query => IrParameterLocation::Query,
                ParameterLocation::Header => IrParameterLocation::Header,
                ParameterLocation::Cookie => IrParameterLocation::Cookie,
            },
            param_type,
            required: param.required,
            description: param.description.clone(),
            deprecated: param.deprecated,
        })
    }

    fn request_body(
        &mut self,
        body: &'doc RequestBody,
        location: &str,
        context: &str,
    ) -> Result<Result<Option<IrRequestBody>, Skip>, PipelineError> {
        let Some((content_type, media)) = pick_media_type(&body.content) else {
            return Ok(Ok(None));
        };
        let media_location = pointer::child(&pointer::child(location, "content"), content_type);

        if is_form(content_type)
            && let Some(schema) = &media.schema
        {
            let schema_location = pointer::child(&media_location, "schema");
            if self.mapper.is_object_schema(schema, &schema_location)? {
                return Ok(Err(Skip {
                    location: pointer::breadcrumb(&media_location),
                    reason: format!("`{content_type}` body needs structural modeling"),
                }));
            }
        }

        let binding = self.binding(
            content_type,
            media,
            &media_location,
            &format!("{context}Request"),
        )?;
        Ok(Ok(Some(IrRequestBody {
            content_type: content_type.clone(),
            binding,
            required: body.required,
            description: body.description.clone(),
        })))
    }

    fn responses(
        &mut self,
        responses: &'doc StrMap<ResponseOrRef>,
        location: &str,
        context: &str,
        success: Option<&str>,
    ) -> Result<Vec<IrResponse>, PipelineError> {
        let base = pointer::child(location, "responses");
        let mut out = Vec::with_capacity(responses.len());
        for (status, response) in responses {
            let response_location = pointer::child(&base, status);
            let (response, response_location) = self
                .resolver()
                .locate_component::<Response>(response, &response_location)?;
            let is_success = Some(status.as_str()) == success;
            let type_context = if is_success {
                format!("{context}Response")
            } else {
                format!("{context}{}Response", type_name(status))
            };
            out.push(self.response(
                status,
                response,
                &response_location,
                &type_context,
                is_success,
            )?);
        }
        Ok(out)
    }

    fn response(
        &mut self,
        status: &str,
        response: &'doc Response,
        location: &str,
        context: &str,
        with_headers: bool,
    ) -> Result<IrResponse, PipelineError> {
        let (content_type, binding) = match pick_media_type(&response.content) {
            Some((content_type, media)) => {
                let media_location =
                    pointer::child(&pointer::child(location, "content"), content_type);
                let binding = self.binding(content_type, media, &media_location, context)?;
                (Some(content_type.clone()), Some(binding))
            }
            None => (None, None),
        };

        let mut headers = Vec::new();
        if with_headers {
            let base = pointer::child(location, "headers");
            for (name, header) in &response.headers {
                let header_location = pointer::child(&base, name);
                let (header, header_location) = self
                    .resolver()
                    .locate_component::<Header>(header, &header_location)?;
                let header_type = match &header.schema {
                    Some(schema) => self.mapper.map_schema(
                        schema,
                        &pointer::child(&header_location, "schema"),
                        &format!("{context}{}", type_name(name)),
                    )?,
                    None => TypeRef::Any,
                };
                headers.push(IrResponseHeader {
                    name: name.clone(),
                    header_type,
                    required: header.required,
                    description: header.description.clone(),
                });
            }
        }

        Ok(IrResponse {
            status: status.to_string(),
            description: Some(response.description.clone()).filter(|d| !d.is_empty()),
            content_type,
            binding,
            headers,
        })
    }

    fn binding(
        &mut self,
        content_type: &str,
        media: &'doc MediaType,
        location: &str,
        context: &str,
    ) -> Result<BodyBinding, PipelineError> {
        if !is_json(content_type) {
            return Ok(if essence(content_type).starts_with("text/") {
                BodyBinding::Text
            } else {
                BodyBinding::Binary
            });
        }
        let ty = match &media.schema {
            Some(schema) => {
                self.mapper
                    .map_schema(schema, &pointer::child(location, "schema"), context)?
            }
            None => TypeRef::Any,
        };
        Ok(BodyBinding::Json(ty))
    }
}

/// The media type essence, lowercased and without parameters.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_json(content_type: &str) -> bool {
    let essence = essence(content_type);
    essence == "application/json" || essence.ends_with("+json")
}

fn is_form(content_type: &str) -> bool {
    FORM_MEDIA_TYPES.contains(&essence(content_type).as_str())
}

/// The first JSON media type, else the first declared one.
fn pick_media_type(content: &StrMap<MediaType>) -> Option<(&String, &MediaType)> {
    content
        .iter()
        .find(|(content_type, _)| is_json(content_type))
        .or_else(|| content.first())
}

/// The lowest explicit 2xx status, else a `2XX` range, else `default`.
fn success_status<T>(responses: &StrMap<T>) -> Option<String> {
    let explicit = responses
        .keys()
        .filter_map(|status| status.parse::<u16>().ok().map(|code| (code, status)))
        .filter(|(code, _)| (200..300).contains(code))
        .min_by_key(|(code, _)| *code)
        .map(|(_, status)| status.clone());
    explicit
        .or_else(|| {
            responses
                .keys()
                .find(|status| status.eq_ignore_ascii_case("2XX"))
                .cloned()
        })
        .or_else(|| responses.keys().find(|status| *status == "default").cloned())
}

fn remap_operation(remap: &TypeRemap, op: &mut IrOperation) {
    fn remap_binding(remap: &TypeRemap, binding: &mut BodyBinding) {
        if let BodyBinding::Json(ty) = binding {
            remap.apply(ty);
        }
    }

    for param in &mut op.parameters {
        remap.apply(&mut param.param_type);
    }
    if let Some(body) = &mut op.request_body {
        remap_binding(remap, &mut body.binding);
    }
    for response in &mut op.responses {
        if let Some(binding) = &mut response.binding {
            remap_binding(remap, binding);
        }
        for header in &mut response.headers {
            remap.apply(&mut header.header_type);
        }
    }
    if let IrReturnType::Body(binding) = &mut op.return_type {
        remap_binding(remap, binding);
    }
}

/// Parameters present identically in every operation, split into headers and
/// query/cookie parameters. With a single operation that is all of its
/// non-path parameters.
fn common_parameters(operations: &[IrOperation]) -> (Vec<IrParameter>, Vec<IrParameter>) {
    let mut headers = Vec::new();
    let mut params = Vec::new();
    let [first, rest @ ..] = operations else {
        return (headers, params);
    };

    for candidate in &first.parameters {
        if candidate.location == IrParameterLocation::Path {
            continue;
        }
        let shared = rest.iter().all(|op| {
            op.parameters.iter().any(|p| {
                p.key() == candidate.key()
                    && p.required == candidate.required
                    && p.param_type == candidate.param_type
            })
        });
        if !shared {
            continue;
        }
        match candidate.location {
            IrParameterLocation::Header => headers.push(candidate.clone()),
            _ => params.push(candidate.clone()),
        }
    }
    (headers, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn extract_json(json: &str) -> ParseResult {
        let doc = parse::from_json(json).unwrap();
        extract(&doc, &GeneratorOptions::default()).unwrap()
    }

    #[test]
    fn test_success_status_selection() {
        let statuses = |keys: &[&str]| -> StrMap<()> {
            keys.iter().map(|k| (k.to_string(), ())).collect()
        };
        assert_eq!(
            success_status(&statuses(&["404", "201", "200"])).as_deref(),
            Some("200")
        );
        assert_eq!(
            success_status(&statuses(&["default", "2XX"])).as_deref(),
            Some("2XX")
        );
        assert_eq!(
            success_status(&statuses(&["400", "default"])).as_deref(),
            Some("default")
        );
        assert_eq!(success_status(&statuses(&["404"])), None);
    }

    #[test]
    fn test_media_type_helpers() {
        assert!(is_json("application/json; charset=utf-8"));
        assert!(is_json("application/problem+json"));
        assert!(!is_json("text/plain"));
        assert!(is_form("multipart/form-data"));
    }

    #[test]
    fn test_route_names_without_operation_id() {
        let result = extract_json(
            r#"{
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "paths": {
                    "/pets/{id}": {
                        "get": {"responses": {"204": {"description": "none"}}},
                        "delete": {"responses": {"204": {"description": "none"}}}
                    }
                }
            }"#,
        );
        let names: Vec<_> = result
            .operations
            .iter()
            .map(|op| op.name.original.as_str())
            .collect();
        assert_eq!(names, vec!["getPet", "deletePet"]);
        assert_eq!(result.operations[0].return_type, IrReturnType::Void);
    }

    #[test]
    fn test_aliases_rename_operations() {
        let doc = parse::from_json(
            r#"{
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "paths": {"/pets": {"get": {"operationId": "listPets", "responses": {"200": {"description": "ok"}}}}}
            }"#,
        )
        .unwrap();
        let mut options = GeneratorOptions::default();
        options
            .naming
            .aliases
            .insert("listPets".to_string(), "pets".to_string());
        let result = extract(&doc, &options).unwrap();
        assert_eq!(result.operations[0].name.original, "pets");
        assert_eq!(result.operations[0].operation_id.as_deref(), Some("listPets"));
    }

    #[test]
    fn test_opaque_bodies() {
        let result = extract_json(
            r#"{
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "paths": {"/files": {"post": {
                    "operationId": "upload",
                    "requestBody": {"content": {"application/octet-stream": {"schema": {"type": "string", "format": "binary"}}}},
                    "responses": {"200": {"description": "ok", "content": {"text/plain": {"schema": {"type": "string"}}}}}
                }}}
            }"#,
        );
        let op = &result.operations[0];
        assert_eq!(
            op.request_body.as_ref().map(|b| &b.binding),
            Some(&BodyBinding::Binary)
        );
        assert_eq!(op.return_type, IrReturnType::Body(BodyBinding::Text));
        assert!(result.types.is_empty());
    }

    #[test]
    fn test_form_object_body_skips_operation() {
        let result = extract_json(
            r#"{
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "paths": {
                    "/upload": {"post": {
                        "operationId": "upload",
                        "requestBody": {"content": {"multipart/form-data": {"schema": {
                            "type": "object",
                            "properties": {"file": {"type": "string", "format": "binary"}}
                        }}}},
                        "responses": {"200": {"description": "ok"}}
                    }},
                    "/ping": {"get": {"operationId": "ping", "responses": {"200": {"description": "ok"}}}}
                }
            }"#,
        );
        assert_eq!(result.operations.len(), 1);
        assert_eq!(result.operations[0].name.original, "ping");
        assert!(result.is_partial());
        assert!(matches!(
            &result.diagnostics[0],
            Diagnostic::UnsupportedConstruct { location, .. }
                if location == "paths./upload.post.requestBody.content.multipart/form-data"
        ));
    }

    #[test]
    fn test_common_parameters() {
        let result = extract_json(
            r##"{
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "components": {"parameters": {
                    "ApiKey": {"name": "X-Api-Key", "in": "header", "required": true, "schema": {"type": "string"}},
                    "Locale": {"name": "locale", "in": "query", "schema": {"type": "string"}}
                }},
                "paths": {
                    "/a": {"get": {
                        "operationId": "a",
                        "parameters": [
                            {"$ref": "#/components/parameters/ApiKey"},
                            {"$ref": "#/components/parameters/Locale"},
                            {"name": "page", "in": "query", "schema": {"type": "integer"}}
                        ],
                        "responses": {"200": {"description": "ok"}}
                    }},
                    "/b": {"get": {
                        "operationId": "b",
                        "parameters": [
                            {"$ref": "#/components/parameters/Locale"},
                            {"$ref": "#/components/parameters/ApiKey"}
                        ],
                        "responses": {"200": {"description": "ok"}}
                    }}
                }
            }"##,
        );
        let headers: Vec<_> = result
            .common_headers
            .iter()
            .map(|p| p.original_name.as_str())
            .collect();
        let params: Vec<_> = result
            .common_params
            .iter()
            .map(|p| p.original_name.as_str())
            .collect();
        assert_eq!(headers, vec!["X-Api-Key"]);
        assert_eq!(params, vec!["locale"]);
    }

    #[test]
    fn test_single_operation_parameters_are_common() {
        let result = extract_json(
            r#"{
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "paths": {"/a/{id}": {"get": {
                    "operationId": "a",
                    "parameters": [
                        {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}},
                        {"name": "X-Trace", "in": "header", "schema": {"type": "string"}},
                        {"name": "page", "in": "query", "schema": {"type": "integer"}}
                    ],
                    "responses": {"200": {"description": "ok"}}
                }}}
            }"#,
        );
        let headers: Vec<_> = result.common_headers.iter().map(|p| p.original_name.as_str()).collect();
        let params: Vec<_> = result.common_params.iter().map(|p| p.original_name.as_str()).collect();
        assert_eq!(headers, vec!["X-Trace"]);
        assert_eq!(params, vec!["page"]);
    }

    #[test]
    fn test_no_operations_no_common_parameters() {
        let result = extract_json(
            r#"{"openapi": "3.0.0", "info": {"title": "T", "version": "1"}, "paths": {}}"#,
        );
        assert!(result.common_headers.is_empty());
        assert!(result.common_params.is_empty());
    }

    #[test]
    fn test_base_url_from_first_server() {
        let result = extract_json(
            r#"{
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "servers": [
                    {"url": "https://{env}.example.com/v1", "variables": {"env": {"default": "api"}}},
                    {"url": "https://sandbox.example.com/v1"}
                ],
                "paths": {}
            }"#,
        );
        assert_eq!(result.base_url.as_deref(), Some("https://api.example.com/v1"));
        assert_eq!(result.servers.len(), 2);
    }

    #[test]
    fn test_success_response_headers_recorded() {
        let result = extract_json(
            r#"{
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "paths": {"/pets": {"get": {
                    "operationId": "listPets",
                    "responses": {
                        "200": {
                            "description": "ok",
                            "headers": {"X-Next": {"schema": {"type": "string"}}},
                            "content": {"application/json": {"schema": {"type": "array", "items": {"type": "string"}}}}
                        },
                        "default": {
                            "description": "error",
                            "content": {"application/json": {"schema": {
                                "type": "object", "properties": {"message": {"type": "string"}}
                            }}}
                        }
                    }
                }}}
            }"#,
        );
        let op = &result.operations[0];
        let success = op.success_response().unwrap();
        assert_eq!(success.headers.len(), 1);
        assert_eq!(success.headers[0].name, "X-Next");
        assert!(result.types.find("ListPetsDefaultResponse").is_some());
    }
}

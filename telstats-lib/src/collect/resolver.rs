use super::{ApiRequest, CollectionContext, EndpointDescriptor, Failure, FailureKind};
use crate::schema::{EndpointTemplate, LeafProperty, Replacement, SchemaRegistry};
use ohno::{IntoAppError, app_err};
use regex::{NoExpand, Regex};
use std::sync::LazyLock;

const LOG_TARGET: &str = " resolve";

static UNRESOLVED_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[A-Za-z_][A-Za-z0-9_]*\}|\$[A-Za-z_][A-Za-z0-9_]*").expect("invalid regex"));

/// A property's request plus the path to its value within the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub descriptor: EndpointDescriptor,
    pub path: Vec<String>,
}

/// Turn a leaf property into the concrete request it needs.
///
/// Each `replaceStrings` pattern is replaced throughout the path, body string values
/// or command line, after filling `${hostname}` and `${version}` in the replacement
/// text from the context. Tokens left over afterwards are reported; in strict mode
/// they fail the property.
///
/// # Errors
///
/// Returns a schema failure if the endpoint is unknown, or a template failure if
/// tokens remain unresolved in strict mode.
pub fn resolve(
    leaf: &LeafProperty,
    registry: &SchemaRegistry,
    context: &CollectionContext,
    strict: bool,
) -> Result<ResolvedRequest, Failure> {
    let template = registry
        .lookup_endpoint(leaf.key.endpoint())
        .map_err(|e| Failure::new(FailureKind::Schema, e))?;

    let replacements: Vec<(&Replacement, String)> = leaf
        .key_args
        .iter()
        .flat_map(|args| &args.replace_strings)
        .map(|r| (r, fill_placeholders(&r.value, context)))
        .collect();

    let substitute = |text: &str| {
        replacements.iter().fold(text.to_string(), |acc, (r, value)| {
            r.pattern.regex().replace_all(&acc, NoExpand(value)).into_owned()
        })
    };

    let descriptor = match template.as_ref() {
        EndpointTemplate::Api { path, body: None } => EndpointDescriptor::Api(ApiRequest::get(substitute(path))),
        EndpointTemplate::Api { path, body: Some(body) } => {
            let body = substitute_body(body, &substitute).map_err(|e| Failure::new(FailureKind::Template, e))?;
            EndpointDescriptor::Api(ApiRequest::post(substitute(path), &body))
        }
        EndpointTemplate::Command(command) => EndpointDescriptor::Command(substitute(command)),
    };

    let leftover = unresolved_tokens(&descriptor);
    if !leftover.is_empty() {
        if strict {
            return Err(Failure::new(
                FailureKind::Template,
                app_err!("unresolved token(s) {} in {descriptor}", leftover.join(", ")),
            ));
        }
        log::warn!(target: LOG_TARGET, "Unresolved token(s) {} in {descriptor}", leftover.join(", "));
    }

    Ok(ResolvedRequest {
        descriptor,
        path: leaf.key.path().to_vec(),
    })
}

fn fill_placeholders(value: &str, context: &CollectionContext) -> String {
    let mut value = value.to_string();
    if let Some(hostname) = context.hostname() {
        value = value.replace("${hostname}", hostname);
    }
    if let Some(version) = context.version_text() {
        value = value.replace("${version}", version);
    }
    value
}

/// Replace tokens in the serialized body, so keys and values are both covered.
fn substitute_body(body: &serde_json::Value, substitute: &impl Fn(&str) -> String) -> crate::Result<serde_json::Value> {
    let text = serde_json::to_string(body).into_app_err("serializing request body")?;
    serde_json::from_str(&substitute(&text)).into_app_err("parsing request body after substitution")
}

fn unresolved_tokens(descriptor: &EndpointDescriptor) -> Vec<String> {
    let texts: Vec<&str> = match descriptor {
        EndpointDescriptor::Api(request) => [Some(request.path()), request.body()].into_iter().flatten().collect(),
        EndpointDescriptor::Command(command) => vec![command.as_str()],
    };

    texts
        .into_iter()
        .flat_map(|text| UNRESOLVED_TOKEN.find_iter(text).map(|m| m.as_str().to_string()))
        .collect()
}

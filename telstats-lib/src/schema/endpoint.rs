use serde::Deserialize;

/// A named request template declared in the schema.
///
/// API templates are a path plus an optional JSON body. Command templates are a
/// shell command line run through the configured command channel. Both may contain
/// tokens that a property's `keyArgs` replace before the request is issued.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEndpoint")]
pub enum EndpointTemplate {
    Api { path: String, body: Option<serde_json::Value> },
    Command(String),
}

impl EndpointTemplate {
    #[must_use]
    pub fn api(path: impl Into<String>) -> Self {
        Self::Api {
            path: path.into(),
            body: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawEndpoint {
    endpoint: Option<String>,
    body: Option<serde_json::Value>,
    command: Option<String>,

    #[serde(default, rename = "comment")]
    _comment: Option<String>,
}

impl TryFrom<RawEndpoint> for EndpointTemplate {
    type Error = String;

    fn try_from(raw: RawEndpoint) -> Result<Self, Self::Error> {
        match (raw.endpoint, raw.command) {
            (Some(path), None) => {
                if !path.starts_with('/') {
                    return Err(format!("endpoint path '{path}' must start with '/'"));
                }
                Ok(Self::Api { path, body: raw.body })
            }
            (None, Some(command)) => {
                if raw.body.is_some() {
                    return Err("a command endpoint cannot have a body".to_string());
                }
                if command.trim().is_empty() {
                    return Err("command endpoint is empty".to_string());
                }
                Ok(Self::Command(command))
            }
            (Some(_), Some(_)) => Err("an endpoint declares either 'endpoint' or 'command', not both".to_string()),
            (None, None) => Err("an endpoint must declare 'endpoint' or 'command'".to_string()),
        }
    }
}

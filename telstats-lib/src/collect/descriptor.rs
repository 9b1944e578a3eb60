use core::fmt::{Display, Formatter};
use strum::{Display as StrumDisplay, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, StrumDisplay)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// A fully resolved management API request.
///
/// The body is kept in canonical JSON text so that two properties producing the
/// same request compare equal and share one fetch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiRequest {
    path: String,
    method: HttpMethod,
    body: Option<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: HttpMethod::Get,
            body: None,
        }
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: &serde_json::Value) -> Self {
        Self {
            path: path.into(),
            method: HttpMethod::Post,
            body: Some(canonical_json(body)),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Serialize with object keys sorted at every depth.
fn canonical_json(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            let members: Vec<_> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), canonical_json(v)))
                .collect();
            format!("{{{}}}", members.join(","))
        }
        Value::Array(items) => {
            let items: Vec<_> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}

/// The kinds of request a cycle issues, for accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum RequestKind {
    Api,
    Command,
}

/// A concrete request, used as the deduplication key of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EndpointDescriptor {
    Api(ApiRequest),
    Command(String),
}

impl EndpointDescriptor {
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::Api(_) => RequestKind::Api,
            Self::Command(_) => RequestKind::Command,
        }
    }
}

impl Display for EndpointDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Api(request) => write!(f, "{} {}", request.method, request.path),
            Self::Command(command) => write!(f, "command '{command}'"),
        }
    }
}

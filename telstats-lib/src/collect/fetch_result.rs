use std::sync::Arc;
use strum::Display;

/// The stage at which collecting a property went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FailureKind {
    /// The property definition could not be reduced or resolved.
    Schema,

    /// Placeholders in the endpoint template were left unresolved.
    Template,

    /// The request or command failed.
    Transport,

    /// A transform step failed on the response.
    Normalization,
}

/// A classified error, cheap to share between every property that depends on it.
#[derive(Debug, Clone)]
pub struct Failure {
    pub kind: FailureKind,
    pub error: Arc<ohno::AppError>,
}

impl Failure {
    #[must_use]
    pub fn new(kind: FailureKind, error: ohno::AppError) -> Self {
        Self {
            kind,
            error: Arc::new(error),
        }
    }
}

/// The outcome of fetching one endpoint descriptor.
#[derive(Debug, Clone)]
pub enum FetchResult<T> {
    /// The request succeeded and produced data.
    Found(T),

    /// The request failed.
    Failed(Failure),
}

impl<T> FetchResult<T> {
    /// Returns `true` if the result is `Found`.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Returns a reference to the contained data if `Found`, otherwise `None`.
    #[must_use]
    pub const fn as_ref(&self) -> Option<&T> {
        match self {
            Self::Found(data) => Some(data),
            Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Found(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

//! Declarative description of what to collect
//!
//! A schema document names endpoint templates (API paths or shell commands) and the
//! properties built from them. Each property either reads one value through a key
//! (`endpoint::sub::path`), groups other properties as a folder, or is conditional
//! on the collection context through an `if`/`then`/`else` clause. Normalization is a
//! list of typed [`TransformStep`]s applied in order.
//!
//! Everything is parsed and validated up front by [`SchemaRegistry`], which is then
//! shared read-only across cycles.

mod condition;
mod endpoint;
mod pattern;
mod property_def;
mod registry;
mod transform_step;

pub use condition::{Condition, Predicate};
pub use endpoint::EndpointTemplate;
pub use pattern::{KeyMatcher, Pattern};
pub use property_def::{
    Branch, ConditionalProperty, KeyArgs, LeafProperty, PropertyDefinition, PropertyFields, PropertyKey, PropertyPatch,
    ReducedProperty, Replacement, Structure,
};
pub use registry::{BUILTIN_SCHEMA, SchemaRegistry};
pub use transform_step::{
    AddTags, Aggregate, CoerceNumbers, ConvertArrayToMap, DefaultMissing, FilterKeys, KeyStyle, PercentFromKeys, RenameKeys,
    RenameRule, ReshapeKeys, TransformStep,
};

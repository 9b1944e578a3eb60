//! Conditional property evaluation
//!
//! Properties may carry `if`/`then`/`else` clauses that depend on the device: which
//! modules are provisioned, which software version it runs, or an arbitrary CEL
//! expression over the bootstrap context. Before a cycle resolves any request, every
//! property is reduced to an unconditional leaf, folder or disabled marker.
//!
//! # Implementation Model
//!
//! A [`ConditionEvaluator`] is created per cycle around the [`CollectionContext`]
//! gathered at the start of that cycle. Built-in conditions are evaluated directly;
//! CEL expressions share one lazily built CEL context. Conditions whose inputs are
//! unknown evaluate to `None`, which [`reduce`] turns into a disabled property.
//!
//! [`CollectionContext`]: crate::collect::CollectionContext

mod evaluator;
mod expression;
mod reducer;

pub use evaluator::ConditionEvaluator;
pub use expression::Expression;
pub use reducer::reduce;

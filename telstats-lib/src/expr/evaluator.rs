//! Evaluation of property conditions against the collection context

use crate::collect::{CollectionContext, DeviceVersion};
use crate::schema::{Condition, Predicate};
use crate::tree::StatsValue;
use cel_interpreter::{Context, Program, Value, objects::Map};
use std::cell::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

const LOG_TARGET: &str = "    expr";

/// Evaluates conditions for one cycle.
///
/// The CEL context is built on first use and shared by every expression evaluated
/// through this instance.
pub struct ConditionEvaluator<'a> {
    context: &'a CollectionContext,
    cel: OnceCell<Context<'static>>,
}

impl core::fmt::Debug for ConditionEvaluator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConditionEvaluator").field("context", &self.context).finish_non_exhaustive()
    }
}

impl<'a> ConditionEvaluator<'a> {
    #[must_use]
    pub const fn new(context: &'a CollectionContext) -> Self {
        Self {
            context,
            cel: OnceCell::new(),
        }
    }

    #[must_use]
    pub const fn context(&self) -> &'a CollectionContext {
        self.context
    }

    /// Evaluate every condition of a predicate.
    ///
    /// Returns `Some(false)` if any condition is false, `None` if none is false but
    /// some depend on context that is not available, and `Some(true)` otherwise.
    #[must_use]
    pub fn evaluate(&self, predicate: &Predicate) -> Option<bool> {
        let mut unknown = false;
        for condition in predicate.conditions() {
            match self.evaluate_condition(condition) {
                Some(false) => return Some(false),
                Some(true) => {}
                None => unknown = true,
            }
        }

        if unknown { None } else { Some(true) }
    }

    /// Evaluate one condition, or `None` when the context it needs is unknown.
    #[must_use]
    pub fn evaluate_condition(&self, condition: &Condition) -> Option<bool> {
        match condition {
            Condition::ModuleProvisioned(module) => self.context.is_provisioned(module),
            Condition::ModuleNotProvisioned(module) => self.context.is_provisioned(module).map(|p| !p),
            Condition::VersionAtLeast(v) => self.compare_version(v).map(|device_is_lower| !device_is_lower),
            Condition::VersionBelow(v) => self.compare_version(v),
            Condition::Expression(expr) => self.evaluate_program(expr.program(), expr.source()),
        }
    }

    /// Whether the device version is below `operand`.
    fn compare_version(&self, operand: &str) -> Option<bool> {
        let device = self.context.version()?;
        let operand = DeviceVersion::parse(operand)?;
        Some(device < operand)
    }

    fn evaluate_program(&self, program: &Program, source: &str) -> Option<bool> {
        let cel = self.cel.get_or_init(|| build_cel_context(self.context));
        match program.execute(cel) {
            Ok(Value::Bool(b)) => Some(b),
            Ok(other) => {
                log::warn!(target: LOG_TARGET, "Expression '{source}' did not return a boolean, got '{other:?}' instead");
                None
            }
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Expression '{source}' could not be evaluated: {e}");
                None
            }
        }
    }
}

fn build_cel_context(context: &CollectionContext) -> Context<'static> {
    let mut cel = Context::default();

    let text = |s: Option<&str>| s.map_or(Value::Null, |s| Value::String(Arc::new(s.to_string())));
    cel.add_variable_from_value("hostname", text(context.hostname()));
    cel.add_variable_from_value("version", text(context.version_text()));

    let provisioning = context.provisioning().map_or(Value::Null, |modules| {
        let fields: HashMap<Arc<String>, Value> = modules
            .iter()
            .map(|(module, level)| (Arc::new(module.clone()), Value::String(Arc::new(level.clone()))))
            .collect();
        Value::Map(Map::from(fields))
    });
    cel.add_variable_from_value("provisioning", provisioning);

    let values: HashMap<Arc<String>, Value> = context
        .values()
        .iter()
        .map(|(name, value)| (Arc::new(name.clone()), convert_stats_value(value)))
        .collect();
    cel.add_variable_from_value("context", Value::Map(Map::from(values)));

    cel
}

/// Convert a `StatsValue` to a CEL Value
fn convert_stats_value(value: &StatsValue) -> Value {
    match value {
        StatsValue::Undefined | StatsValue::Null => Value::Null,
        StatsValue::Bool(b) => Value::Bool(*b),
        StatsValue::UInt(u) => Value::UInt(*u),
        StatsValue::Int(i) => Value::Int(*i),
        StatsValue::Float(f) => Value::Float(*f),
        StatsValue::Text(s) => Value::String(Arc::new(s.to_string())),
        StatsValue::List(items) => Value::List(Arc::new(items.iter().map(convert_stats_value).collect())),
        StatsValue::Map(map) => {
            let fields: HashMap<Arc<String>, Value> = map
                .iter()
                .map(|(k, v)| (Arc::new(k.clone()), convert_stats_value(v)))
                .collect();
            Value::Map(Map::from(fields))
        }
    }
}

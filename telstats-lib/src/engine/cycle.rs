use super::{CollectionFailure, EngineOptions, log_failures};
use crate::collect::{
    CollectionContext, CommandRunner, CycleStats, Executor, Failure, FailureKind, FetchResult, ResolvedRequest, ResponseCache,
    Transport, resolve,
};
use crate::expr::{ConditionEvaluator, reduce};
use crate::normalize::{extract, normalize};
use crate::schema::{LeafProperty, ReducedProperty, SchemaRegistry};
use crate::tree::{PropertyOutcome, StatsMap, StatsTree, StatsValue};
use chrono::{DateTime, Utc};
use ohno::EnrichableExt;
use std::sync::Arc;

const LOG_TARGET: &str = "  engine";

/// Everything one collection cycle produced.
#[derive(Debug)]
pub struct CycleOutput {
    pub collected_at: DateTime<Utc>,
    pub context: CollectionContext,

    /// Structurally complete: every schema property is present.
    pub tree: StatsTree,

    pub failures: Vec<CollectionFailure>,
    pub stats: CycleStats,
}

/// Runs collection cycles against one device.
#[derive(Debug)]
pub struct Engine {
    registry: Arc<SchemaRegistry>,
    executor: Executor,
    options: EngineOptions,
}

/// A property after reduction and resolution, waiting for its response.
enum Planned {
    Folder,
    Ready(StatsValue),
    Fetch(LeafProperty, Result<ResolvedRequest, Failure>),
}

impl Engine {
    #[must_use]
    pub fn new(
        registry: Arc<SchemaRegistry>,
        transport: Arc<dyn Transport>,
        commands: Arc<dyn CommandRunner>,
        options: EngineOptions,
    ) -> Self {
        Self {
            registry,
            executor: Executor::new(transport, commands),
            options,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn options(&self) -> EngineOptions {
        self.options
    }

    /// Run one complete cycle.
    ///
    /// The context properties are collected first, then every statistic property is
    /// reduced against that context, resolved, fetched once per distinct request,
    /// normalized and placed in the tree. Failures degrade individual properties and
    /// never abort the cycle.
    pub async fn run_cycle(&self) -> CycleOutput {
        let collected_at = Utc::now();
        let stats = CycleStats::new();
        let mut cache = ResponseCache::new();
        let mut failures = Vec::new();

        let context = self.collect_context(&mut cache, &stats, &mut failures).await;
        log::debug!(
            target: LOG_TARGET,
            "Collection context: hostname={:?} version={:?}",
            context.hostname(),
            context.version_text()
        );

        let planned = self.plan(&context, &mut failures);

        let descriptors: Vec<_> = planned
            .iter()
            .filter_map(|(_, plan)| match plan {
                Planned::Fetch(_, Ok(request)) => Some(request.descriptor.clone()),
                _ => None,
            })
            .collect();
        self.executor.collect_into(descriptors, &mut cache, &stats).await;

        let outcomes: Vec<_> = planned
            .into_iter()
            .map(|(name, plan)| match plan {
                Planned::Folder => PropertyOutcome::Folder { name: name.to_string() },
                Planned::Ready(value) => PropertyOutcome::Value {
                    name: name.to_string(),
                    parent_key: None,
                    value,
                },
                Planned::Fetch(leaf, request) => PropertyOutcome::Value {
                    name: name.to_string(),
                    parent_key: leaf.parent_key.clone(),
                    value: property_value(name, &leaf, request, &cache, &mut failures),
                },
            })
            .collect();

        let tree = StatsTree::assemble(outcomes);

        log_failures(&failures, self.options.failure_reporting);
        log::info!(target: LOG_TARGET, "Cycle complete: {}", stats.summary());

        CycleOutput {
            collected_at,
            context,
            tree,
            failures,
            stats,
        }
    }

    /// Run one cycle unless `shutdown` completes first, in which case the in-flight
    /// cycle is dropped and `None` is returned.
    pub async fn run_cycle_until(&self, shutdown: impl Future<Output = ()>) -> Option<CycleOutput> {
        tokio::select! {
            biased;

            () = shutdown => {
                log::info!(target: LOG_TARGET, "Collection cycle abandoned");
                None
            }
            output = self.run_cycle() => Some(output),
        }
    }

    async fn collect_context(
        &self,
        cache: &mut ResponseCache,
        stats: &CycleStats,
        failures: &mut Vec<CollectionFailure>,
    ) -> CollectionContext {
        let bootstrap = CollectionContext::default();
        let requests: Vec<_> = self
            .registry
            .context_properties()
            .map(|(name, leaf)| (name, leaf, resolve(leaf, &self.registry, &bootstrap, self.options.strict_templates)))
            .collect();

        let descriptors: Vec<_> = requests
            .iter()
            .filter_map(|(_, _, request)| request.as_ref().ok().map(|r| r.descriptor.clone()))
            .collect();
        self.executor.collect_into(descriptors, cache, stats).await;

        let values: StatsMap = requests
            .into_iter()
            .map(|(name, leaf, request)| (name.to_string(), property_value(name, leaf, request, cache, failures)))
            .collect();

        CollectionContext::from_values(values)
    }

    fn plan(&self, context: &CollectionContext, failures: &mut Vec<CollectionFailure>) -> Vec<(&str, Planned)> {
        let evaluator = ConditionEvaluator::new(context);

        self.registry
            .properties()
            .map(|(name, definition)| {
                let plan = match reduce(definition, &evaluator) {
                    Ok(ReducedProperty::Folder) => Planned::Folder,
                    Ok(ReducedProperty::Disabled) => Planned::Ready(StatsValue::Undefined),
                    Ok(ReducedProperty::Leaf(leaf)) => {
                        let request = resolve(&leaf, &self.registry, context, self.options.strict_templates);
                        Planned::Fetch(leaf, request)
                    }
                    Err(e) => {
                        failures.push(CollectionFailure {
                            property: name.to_string(),
                            descriptor: None,
                            failure: Failure::new(FailureKind::Schema, e),
                        });
                        Planned::Ready(StatsValue::missing_data())
                    }
                };
                (name, plan)
            })
            .collect()
    }
}

/// Read one property's value out of the response cache.
fn property_value(
    name: &str,
    leaf: &LeafProperty,
    request: Result<ResolvedRequest, Failure>,
    cache: &ResponseCache,
    failures: &mut Vec<CollectionFailure>,
) -> StatsValue {
    let mut fail = |descriptor, failure| {
        failures.push(CollectionFailure {
            property: name.to_string(),
            descriptor,
            failure,
        });
        StatsValue::missing_data()
    };

    let request = match request {
        Ok(request) => request,
        Err(failure) => return fail(None, failure),
    };

    let raw = match cache.get(&request.descriptor) {
        Some(FetchResult::Found(raw)) => raw,
        Some(FetchResult::Failed(failure)) => return fail(Some(request.descriptor), failure.clone()),
        None => return StatsValue::missing_data(),
    };

    match normalize(extract(raw, &request.path), &leaf.normalization) {
        Ok(value) => value,
        Err(e) => fail(
            Some(request.descriptor),
            Failure::new(FailureKind::Normalization, e.enrich_with(|| format!("normalizing '{name}'"))),
        ),
    }
}

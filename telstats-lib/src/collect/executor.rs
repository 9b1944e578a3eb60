use super::response::{RawResponse, shape};
use super::{CommandRunner, CycleStats, EndpointDescriptor, Failure, FailureKind, FetchResult, Transport};
use crate::tree::StatsValue;
use futures_util::future::join_all;
use ohno::EnrichableExt;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

const LOG_TARGET: &str = "    exec";

/// The shaped response of every descriptor fetched during a cycle.
///
/// Each descriptor is written at most once and then shared by every property
/// that resolved to it.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<EndpointDescriptor, FetchResult<Arc<StatsValue>>>,
}

impl ResponseCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, descriptor: &EndpointDescriptor) -> Option<&FetchResult<Arc<StatsValue>>> {
        self.entries.get(descriptor)
    }

    #[must_use]
    pub fn contains(&self, descriptor: &EndpointDescriptor) -> bool {
        self.entries.contains_key(descriptor)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, descriptor: EndpointDescriptor, result: FetchResult<Arc<StatsValue>>) {
        let _ = self.entries.entry(descriptor).or_insert(result);
    }
}

/// Issues the requests of a cycle.
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
    commands: Arc<dyn CommandRunner>,
}

impl core::fmt::Debug for Executor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Executor")
            .field("transport", &"<dyn Transport>")
            .field("commands", &"<dyn CommandRunner>")
            .finish()
    }
}

impl Executor {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, commands: Arc<dyn CommandRunner>) -> Self {
        Self { transport, commands }
    }

    /// Fetch every distinct descriptor once, concurrently.
    pub async fn collect(&self, descriptors: impl IntoIterator<Item = EndpointDescriptor>, stats: &CycleStats) -> ResponseCache {
        let mut cache = ResponseCache::new();
        self.collect_into(descriptors, &mut cache, stats).await;
        cache
    }

    /// Like [`Executor::collect`], skipping descriptors already present in `cache`.
    pub async fn collect_into(
        &self,
        descriptors: impl IntoIterator<Item = EndpointDescriptor>,
        cache: &mut ResponseCache,
        stats: &CycleStats,
    ) {
        let pending: BTreeSet<EndpointDescriptor> = descriptors.into_iter().filter(|d| !cache.contains(d)).collect();
        if pending.is_empty() {
            return;
        }

        for descriptor in &pending {
            stats.add_requests(descriptor.kind(), 1);
        }

        log::debug!(target: LOG_TARGET, "Issuing {} distinct request(s)", pending.len());

        let results = join_all(pending.iter().map(|descriptor| self.fetch(descriptor, stats))).await;
        for (descriptor, result) in pending.into_iter().zip(results) {
            cache.insert(descriptor, result);
        }
    }

    async fn fetch(&self, descriptor: &EndpointDescriptor, stats: &CycleStats) -> FetchResult<Arc<StatsValue>> {
        let raw = match descriptor {
            EndpointDescriptor::Api(request) => self.transport.request(request).await.map(RawResponse::Json),
            EndpointDescriptor::Command(command) => self.commands.run_command(command).await.map(RawResponse::Text),
        };

        match raw {
            Ok(raw) => {
                stats.complete_request(descriptor.kind());
                log::trace!(target: LOG_TARGET, "Fetched {descriptor}");
                FetchResult::Found(Arc::new(shape(raw)))
            }
            Err(e) => {
                stats.fail_request(descriptor.kind());
                log::debug!(target: LOG_TARGET, "Could not fetch {descriptor}: {e}");
                FetchResult::Failed(Failure::new(
                    FailureKind::Transport,
                    e.enrich_with(|| format!("could not fetch {descriptor}")),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{ApiRequest, RequestKind};
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use ohno::app_err;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingTransport {
        calls: Mutex<Vec<String>>,
    }

    impl Transport for CountingTransport {
        fn request<'a>(&'a self, request: &'a ApiRequest) -> BoxFuture<'a, crate::Result<serde_json::Value>> {
            self.calls.lock().unwrap().push(request.path().to_string());
            let path = request.path().to_string();
            async move {
                if path.contains("broken") {
                    Err(app_err!("connection reset"))
                } else {
                    Ok(json!({"path": path}))
                }
            }
            .boxed()
        }
    }

    struct EchoCommands;

    impl CommandRunner for EchoCommands {
        fn run_command<'a>(&'a self, _command: &'a str) -> BoxFuture<'a, crate::Result<String>> {
            async { Ok("a,b\n1,2\n".to_string()) }.boxed()
        }
    }

    fn executor(transport: &Arc<CountingTransport>) -> Executor {
        Executor::new(Arc::clone(transport) as Arc<dyn Transport>, Arc::new(EchoCommands))
    }

    fn api(path: &str) -> EndpointDescriptor {
        EndpointDescriptor::Api(ApiRequest::get(path))
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
    async fn test_duplicates_are_fetched_once() {
        let transport = Arc::new(CountingTransport::default());
        let stats = CycleStats::new();

        let cache = executor(&transport)
            .collect([api("/a"), api("/b"), api("/a"), api("/a")], &stats)
            .await;

        assert_eq!(cache.len(), 2);
        assert_eq!(transport.calls.lock().unwrap().len(), 2);
        assert_eq!(stats.counts(RequestKind::Api).issued, 2);

        let value = cache.get(&api("/a")).and_then(FetchResult::as_ref).unwrap();
        assert_eq!(value.to_json(), json!({"path": "/a"}));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
    async fn test_failures_are_recorded_per_descriptor() {
        let transport = Arc::new(CountingTransport::default());
        let stats = CycleStats::new();

        let cache = executor(&transport).collect([api("/broken"), api("/ok")], &stats).await;

        let failure = cache.get(&api("/broken")).and_then(FetchResult::failure).unwrap();
        assert_eq!(failure.kind, FailureKind::Transport);
        assert!(failure.error.to_string().contains("connection reset"));
        assert!(cache.get(&api("/ok")).unwrap().is_found());
        assert_eq!(stats.counts(RequestKind::Api).failed, 1);
        assert_eq!(stats.counts(RequestKind::Api).completed, 1);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
    async fn test_collect_into_skips_cached_descriptors() {
        let transport = Arc::new(CountingTransport::default());
        let stats = CycleStats::new();
        let executor = executor(&transport);

        let mut cache = executor.collect([api("/a")], &stats).await;
        executor.collect_into([api("/a"), api("/b")], &mut cache, &stats).await;

        assert_eq!(cache.len(), 2);
        assert_eq!(*transport.calls.lock().unwrap(), vec!["/a".to_string(), "/b".to_string()]);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
    async fn test_command_output_is_parsed_as_table() {
        let transport = Arc::new(CountingTransport::default());
        let stats = CycleStats::new();
        let command = EndpointDescriptor::Command("tmctl -c x".into());

        let cache = executor(&transport).collect([command.clone()], &stats).await;

        let value = cache.get(&command).and_then(FetchResult::as_ref).unwrap();
        assert_eq!(value.to_json(), json!([{"a": "1", "b": "2"}]));
        assert_eq!(stats.summary(), "1/1 command");
    }
}

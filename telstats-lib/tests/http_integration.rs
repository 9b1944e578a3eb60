//! Collection cycles over HTTP against a mock management API.

use core::time::Duration;
use serde_json::json;
use std::sync::Arc;
use telstats_lib::collect::{CommandRunner, FailureKind, HttpSettings, HttpTransport, RemoteShell, Transport};
use telstats_lib::engine::{Engine, EngineOptions, FailureReporting};
use telstats_lib::reports::{generate_lines, metric_prefix};
use telstats_lib::schema::SchemaRegistry;
use telstats_lib::tree::StatsValue;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_engine(server: &MockServer, registry: SchemaRegistry) -> Engine {
    let settings = HttpSettings {
        base_url: Url::parse(&server.uri()).unwrap(),
        username: Some("admin".into()),
        password: Some("admin".into()),
        max_concurrent_requests: 4,
        request_timeout: Duration::from_secs(5),
        accept_invalid_certs: false,
    };

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&settings).unwrap());
    let commands: Arc<dyn CommandRunner> = Arc::new(RemoteShell::new(Arc::clone(&transport)));

    Engine::new(
        Arc::new(registry),
        transport,
        commands,
        EngineOptions {
            strict_templates: false,
            failure_reporting: FailureReporting::PerProperty,
        },
    )
}

async fn mount_json(server: &MockServer, url_path: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
async fn test_builtin_schema_cycle() {
    let server = MockServer::start().await;

    mount_json(&server, "/mgmt/tm/sys/global-settings", json!({"hostname": "bigip1.example.com"})).await;
    mount_json(
        &server,
        "/mgmt/shared/identified-devices/config/device-info",
        json!({"version": "15.1.0", "build": "0.0.6", "machineId": "abc-123", "platformMarketingName": "BIG-IP Virtual Edition"}),
    )
    .await;
    mount_json(
        &server,
        "/mgmt/tm/sys/provision",
        json!({"items": [{"name": "ltm", "level": "nominal"}, {"name": "asm", "level": "none"}]}),
    )
    .await;
    mount_json(
        &server,
        "/mgmt/tm/ltm/virtual/stats",
        json!({
            "kind": "tm:ltm:virtual:virtualcollectionstats",
            "entries": {
                "https://localhost/mgmt/tm/ltm/virtual/~Common~vs1/stats": {
                    "nestedStats": {
                        "entries": {
                            "clientside.bitsIn": {"value": 100},
                            "status.availabilityState": {"description": "available"},
                            "tmName": {"description": "/Common/vs1"}
                        }
                    }
                }
            }
        }),
    )
    .await;

    let output = http_engine(&server, SchemaRegistry::builtin().unwrap()).run_cycle().await;

    assert_eq!(output.context.hostname(), Some("bigip1.example.com"));
    assert_eq!(output.context.is_provisioned("asm"), Some(false));

    let tree = output.tree.collapse_folders().to_json();
    assert_eq!(tree["system"]["hostname"], "bigip1.example.com");
    assert_eq!(tree["system"]["version"], "15.1.0");
    assert_eq!(tree["system"]["machineId"], "abc-123");
    assert_eq!(
        tree["virtualServers"],
        json!({
            "/Common/vs1": {
                "clientside.bitsIn": 100,
                "availabilityState": "available",
                "name": "/Common/vs1",
                "tenant": "Common"
            }
        })
    );

    // unprovisioned modules are left out, unreachable endpoints are marked
    assert!(tree.get("asmPolicies").is_none());
    assert_eq!(output.tree.get("asmPolicies"), Some(&StatsValue::Undefined));
    assert_eq!(tree["pools"], "missing data");
    assert!(output.failures.iter().all(|f| f.kind() == FailureKind::Transport));

    let mut lines = String::new();
    generate_lines(&output.tree, &metric_prefix("telstats", &output.context), &mut lines).unwrap();
    assert!(lines.contains("telstats.bigip1-example-com.virtualServers./Common/vs1.clientside.bitsIn 100\n"));
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
async fn test_commands_run_through_util_bash() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mgmt/tm/util/bash"))
        .and(body_json(json!({"command": "run", "utilCmdArgs": "-c 'tmctl -c -a cpu_info_stat'"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "tm:util:bash:runstate",
            "command": "run",
            "commandResult": "cpu_id,one_min_avg_system\n0,4\n1,6\n"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = SchemaRegistry::from_json(
        r#"{
            "endpoints": {"tmctl": {"command": "tmctl -c -a $args"}},
            "stats": {
                "cpuTotal": {
                    "key": "tmctl",
                    "keyArgs": {"replaceStrings": {"\\$args": "cpu_info_stat"}},
                    "normalization": [
                        {"coerceNumbers": {"keys": ["one_min_avg_system"]}},
                        {"sum": {"key": "one_min_avg_system"}}
                    ]
                },
                "cpuAverage": {
                    "key": "tmctl",
                    "keyArgs": {"replaceStrings": {"\\$args": "cpu_info_stat"}},
                    "normalization": [
                        {"coerceNumbers": {"keys": ["one_min_avg_system"]}},
                        {"average": {"key": "one_min_avg_system"}}
                    ]
                }
            }
        }"#,
    )
    .unwrap();

    let output = http_engine(&server, registry).run_cycle().await;

    assert_eq!(output.tree.get("cpuTotal").map(StatsValue::to_json), Some(json!(10)));
    assert_eq!(output.tree.get("cpuAverage").map(StatsValue::to_json), Some(json!(5)));
    assert!(output.failures.is_empty());
}

//! Shutdown idempotence and graceful shutdown under concurrent load.

use fleet_agent_client::{FakeAgentTransport, ScriptedReply};
use fleet_core::{ActivityLogSink, FleetError, NodeListEntry, NoOpActivityLogSink};
use fleet_service::{FleetService, FleetServiceConfig};
use std::sync::Arc;
use std::time::Duration;

fn node(name: &str) -> NodeListEntry {
    NodeListEntry {
        name: name.to_string(),
        environment: "prod".to_string(),
        host: "10.0.0.1".to_string(),
        port: 9001,
        username: None,
        password: None,
    }
}

fn service(transport: FakeAgentTransport) -> FleetService {
    let sink: Arc<dyn ActivityLogSink> = Arc::new(NoOpActivityLogSink);
    FleetService::new(FleetServiceConfig::default(), Arc::new(transport), Arc::new(fleet_core::SystemClock), sink)
}

fn success_reply() -> String {
    "<methodResponse><params><param><value><array><data></data></array></value></param></params></methodResponse>".to_string()
}

/// Invariant 5 — `stop` is safe to call repeatedly, and every public
/// operation after the first `stop` returns the Shutdown error.
#[tokio::test]
async fn shutdown_is_idempotent_and_poisons_subsequent_calls() {
    let svc = service(FakeAgentTransport::new());
    svc.add_node(&node("n1")).unwrap();

    for _ in 0..3 {
        svc.stop(Duration::from_millis(50)).await;
    }

    assert!(matches!(svc.add_node(&node("n2")), Err(FleetError::Shutdown)));
    assert!(matches!(svc.get_node("n1"), Err(FleetError::Shutdown)));
    assert!(matches!(svc.get_all_nodes(), Err(FleetError::Shutdown)));
}

/// S6 — five nodes, ten concurrent readers/writers hammering
/// `GetAllNodes`/`StartProcess`, shutdown completing inside its deadline
/// with no call returning success after `stop` has returned.
#[tokio::test]
async fn graceful_shutdown_under_concurrent_load() {
    let transport = FakeAgentTransport::new();
    transport.set_default(ScriptedReply::ok(success_reply()));
    let svc = Arc::new(service(transport));
    for i in 0..5 {
        svc.add_node(&node(&format!("n{i}"))).unwrap();
    }

    let mut joins = tokio::task::JoinSet::new();
    for i in 0..10 {
        let svc = svc.clone();
        joins.spawn(async move {
            loop {
                let node = format!("n{}", i % 5);
                match svc.start_process(&node, "p").await {
                    Ok(()) | Err(FleetError::Shutdown) | Err(FleetError::NotFound(_)) => {}
                    Err(other) => panic!("unexpected error: {other}"),
                }
                let _ = svc.get_all_nodes();
                tokio::task::yield_now().await;
            }
        });
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    let stopped = tokio::time::timeout(Duration::from_secs(3), svc.stop(Duration::from_millis(200))).await;
    assert!(stopped.is_ok(), "shutdown must complete within its deadline");

    joins.abort_all();
    while joins.join_next().await.is_some() {}

    assert!(matches!(svc.get_all_nodes(), Err(FleetError::Shutdown)));
}

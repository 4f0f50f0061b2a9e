//! Circuit isolation and the timeout/retry discipline every outbound
//! agent call runs under.

use fleet_agent_client::{AgentClient, FakeAgentTransport, ScriptedReply};
use fleet_core::SystemClock;
use fleet_engine::{AdmissionGate, GovernorConfig, TimeoutGovernor};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn array_of_structs() -> String {
    "<methodResponse><params><param><value><array><data></data></array></value></param></params></methodResponse>".to_string()
}

fn governor(config: GovernorConfig) -> Arc<TimeoutGovernor> {
    let shutdown = CancellationToken::new();
    let admission = AdmissionGate::with_default_capacity(shutdown);
    Arc::new(TimeoutGovernor::new(config, admission, Arc::new(SystemClock)))
}

/// Failures of one breaker key never open another's.
#[tokio::test]
async fn circuit_isolation_between_two_targets() {
    let g = governor(GovernorConfig {
        retry_interval: Duration::from_millis(1),
        max_retries: 1,
        ..GovernorConfig::default()
    });
    let shutdown = CancellationToken::new();

    for _ in 0..5 {
        let _ = g
            .call("agent_a", Duration::from_millis(50), &shutdown, || async {
                Err(fleet_core::FleetError::Connection("down".into()))
            })
            .await;
    }

    let b_result = g
        .call("agent_b", Duration::from_millis(50), &shutdown, || async { Ok::<_, fleet_core::FleetError>(()) })
        .await;
    assert!(b_result.is_ok(), "target b must be unaffected by target a's failures");
}

/// S3 — breaker opens after the configured number of consecutive
/// failures, then half-opens and closes again once `reset_timeout`
/// (`retry_interval * max_retries`) has elapsed.
#[tokio::test]
async fn breaker_opens_then_recovers_after_reset_timeout() {
    let transport = FakeAgentTransport::new();
    for _ in 0..3 {
        transport.push("supervisor.startProcess", ScriptedReply::connection_refused());
    }
    transport.set_default(ScriptedReply::ok(array_of_structs()));
    let client = AgentClient::new("host", 9001, None, None, Arc::new(transport));

    let g = governor(GovernorConfig {
        retry_interval: Duration::from_millis(10),
        max_retries: 3,
        single_op: Duration::from_millis(500),
        ..GovernorConfig::default()
    });
    let shutdown = CancellationToken::new();

    let first = g
        .call("start_process_p", Duration::from_millis(500), &shutdown, || {
            let client = client.clone();
            async move { client.start_process("p").await }
        })
        .await;
    assert!(first.is_err(), "every scripted attempt failed; the call must surface an error");

    let second_too_soon = g
        .call("start_process_p", Duration::from_millis(500), &shutdown, || {
            let client = client.clone();
            async move { client.start_process("p").await }
        })
        .await;
    assert!(
        matches!(second_too_soon, Err(fleet_core::FleetError::CircuitOpen(_))),
        "breaker should still be open immediately after it tripped"
    );

    tokio::time::sleep(Duration::from_millis(40)).await;

    let third = g
        .call("start_process_p", Duration::from_millis(500), &shutdown, || {
            let client = client.clone();
            async move { client.start_process("p").await }
        })
        .await;
    assert!(third.is_ok(), "breaker should half-open and close once reset_timeout has elapsed");
}

/// Invariant 7 — no single attempt takes longer than the per-op timeout,
/// and a batch of slow operations completes within its own batch-level
/// deadline rather than the sum of each member's timeout.
#[tokio::test]
async fn nested_timeouts_bound_both_op_and_batch() {
    let g = governor(GovernorConfig {
        single_op: Duration::from_millis(30),
        batch_op: Duration::from_millis(200),
        max_retries: 0,
        ..GovernorConfig::default()
    });
    let shutdown = CancellationToken::new();

    let started = std::time::Instant::now();
    let ops = (0..5)
        .map(|i| fleet_engine::BatchOp {
            name: format!("slow_{i}"),
            run: || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, fleet_core::FleetError>(())
            },
        })
        .collect();
    let results = g.run_batch(ops, &shutdown).await;
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(400), "batch must not wait out every slow member serially");
    assert_eq!(results.len(), 5);
    for (_, result) in &results {
        assert!(matches!(result, Err(fleet_core::FleetError::Timeout(_)) | Err(fleet_core::FleetError::Shutdown)));
    }
}

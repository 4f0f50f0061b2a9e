use super::*;
use fleet_core::SystemClock;
use std::sync::atomic::{AtomicU32, Ordering};

fn governor(config: GovernorConfig) -> TimeoutGovernor {
    let shutdown = CancellationToken::new();
    TimeoutGovernor::new(config, AdmissionGate::with_default_capacity(shutdown), Arc::new(SystemClock))
}

#[tokio::test]
async fn succeeds_without_retry_on_first_try() {
    let gov = governor(GovernorConfig::default());
    let shutdown = CancellationToken::new();
    let result = gov
        .call("op", Duration::from_secs(1), &shutdown, || async { Ok::<_, FleetError>(42) })
        .await;
    assert_eq!(result.unwrap(), 42);
}

#[tokio::test]
async fn retries_then_succeeds_and_closes_breaker() {
    let mut config = GovernorConfig::default();
    config.retry_interval = Duration::from_millis(5);
    config.max_retries = 3;
    let gov = governor(config);
    let shutdown = CancellationToken::new();
    let attempts = Arc::new(AtomicU32::new(0));
    let attempts2 = attempts.clone();
    let result = gov
        .call("flaky", Duration::from_secs(1), &shutdown, move || {
            let attempts = attempts2.clone();
            async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(FleetError::Connection("boom".into()))
                } else {
                    Ok(99)
                }
            }
        })
        .await;
    assert_eq!(result.unwrap(), 99);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn non_retryable_error_fails_immediately() {
    let gov = governor(GovernorConfig::default());
    let shutdown = CancellationToken::new();
    let attempts = Arc::new(AtomicU32::new(0));
    let attempts2 = attempts.clone();
    let result: Result<(), FleetError> = gov
        .call("bad", Duration::from_secs(1), &shutdown, move || {
            let attempts = attempts2.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(FleetError::NotFound("ghost".into()))
            }
        })
        .await;
    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn breaker_opens_after_exhausting_retries_and_blocks_next_call() {
    let mut config = GovernorConfig::default();
    config.retry_interval = Duration::from_millis(1);
    config.max_retries = 2;
    let gov = governor(config);
    let shutdown = CancellationToken::new();
    let result: Result<(), FleetError> = gov
        .call("always_fails", Duration::from_secs(1), &shutdown, || async {
            Err(FleetError::Connection("down".into()))
        })
        .await;
    assert!(result.is_err());

    let blocked: Result<(), FleetError> = gov
        .call("always_fails", Duration::from_secs(1), &shutdown, || async { Ok(()) })
        .await;
    assert!(matches!(blocked, Err(FleetError::CircuitOpen(_))));
}

#[tokio::test]
async fn per_call_timeout_is_honored() {
    let gov = governor(GovernorConfig::default());
    let shutdown = CancellationToken::new();
    let result: Result<(), FleetError> = gov
        .call("slow", Duration::from_millis(20), &shutdown, || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
    assert!(matches!(result, Err(FleetError::Timeout(_))));
}

#[tokio::test]
async fn batch_runs_all_ops_and_preserves_index_order() {
    let gov = governor(GovernorConfig::default());
    let shutdown = CancellationToken::new();
    let ops = vec![
        BatchOp { name: "op0".into(), run: || async { Ok::<_, FleetError>(0) } },
        BatchOp { name: "op1".into(), run: || async { Err::<i32, _>(FleetError::NotFound("x".into())) } },
        BatchOp { name: "op2".into(), run: || async { Ok::<_, FleetError>(2) } },
    ];
    let results = gov.run_batch(ops, &shutdown).await;
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, 0);
    assert!(results[0].1.is_ok());
    assert!(results[1].1.is_err());
    assert_eq!(results[2].0, 2);
}

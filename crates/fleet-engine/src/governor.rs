// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `TimeoutGovernor`: per-call timeout, retry with circuit breaking, and
//! batch composition for every outbound agent operation.

use crate::admission::AdmissionGate;
use crate::breaker::CircuitBreakerRegistry;
use fleet_core::{Clock, FleetError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Numeric knobs governing every outbound agent call. Field names mirror
/// the operation they time.
#[derive(Debug, Clone)]
pub struct GovernorConfig {
    pub single_op: Duration,
    pub batch_op: Duration,
    pub connect: Duration,
    pub health: Duration,
    pub retry_interval: Duration,
    pub max_retries: u32,
    pub intra_batch_concurrency: usize,
    /// Pause between stop and start inside `RestartProcess`.
    pub restart_pause: Duration,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            single_op: Duration::from_secs(30),
            batch_op: Duration::from_secs(5 * 60),
            connect: Duration::from_secs(10),
            health: Duration::from_secs(5),
            retry_interval: Duration::from_secs(1),
            max_retries: 3,
            intra_batch_concurrency: 10,
            restart_pause: Duration::from_millis(100),
        }
    }
}

/// One entry of a batch: a breaker/retry key plus the operation itself.
pub struct BatchOp<F> {
    pub name: String,
    pub run: F,
}

pub struct TimeoutGovernor {
    config: GovernorConfig,
    breakers: Arc<CircuitBreakerRegistry>,
    admission: AdmissionGate,
}

impl TimeoutGovernor {
    pub fn new(config: GovernorConfig, admission: AdmissionGate, clock: Arc<dyn Clock>) -> Self {
        let reset_timeout = config.retry_interval * config.max_retries;
        let breakers = Arc::new(CircuitBreakerRegistry::new(
            config.max_retries,
            reset_timeout,
            clock,
        ));
        Self {
            config,
            breakers,
            admission,
        }
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Run one operation under the full per-call discipline: breaker
    /// check, admission gate, timeout, and bounded retry. `operation_name`
    /// keys both the breaker and the admission/retry bookkeeping.
    pub async fn call<F, Fut, T>(
        &self,
        operation_name: &str,
        timeout: Duration,
        shutdown: &CancellationToken,
        f: F,
    ) -> Result<T, FleetError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, FleetError>> + Send + 'static,
        T: Send + 'static,
    {
        if !self.breakers.allow(operation_name) {
            return Err(FleetError::CircuitOpen(operation_name.to_string()));
        }
        if shutdown.is_cancelled() {
            return Err(FleetError::Shutdown);
        }

        let mut last_err: Option<FleetError> = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 && !self.breakers.allow(operation_name) {
                return Err(FleetError::CircuitOpen(operation_name.to_string()));
            }

            let _admission = self.admission.acquire().await?;
            let outcome = self.run_once(timeout, shutdown, &f).await;
            drop(_admission);

            match outcome {
                Ok(value) => {
                    self.breakers.record_success(operation_name);
                    return Ok(value);
                }
                Err(FleetError::Shutdown) => return Err(FleetError::Shutdown),
                Err(err) => {
                    self.breakers.record_failure(operation_name);
                    if !err.retryable() {
                        return Err(err);
                    }
                    let is_last_attempt = attempt == self.config.max_retries;
                    last_err = Some(err);
                    if !is_last_attempt {
                        tokio::select! {
                            biased;
                            _ = shutdown.cancelled() => return Err(FleetError::Shutdown),
                            _ = tokio::time::sleep(self.config.retry_interval) => {}
                        }
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| FleetError::Internal("retry loop exhausted".into())))
    }

    async fn run_once<F, Fut, T>(
        &self,
        timeout: Duration,
        shutdown: &CancellationToken,
        f: &F,
    ) -> Result<T, FleetError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FleetError>> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::spawn(f());
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                handle.abort();
                Err(FleetError::Shutdown)
            }
            result = tokio::time::timeout(timeout, handle) => {
                match result {
                    Err(_elapsed) => Err(FleetError::Timeout(timeout)),
                    Ok(Err(join_err)) => {
                        if join_err.is_cancelled() {
                            Err(FleetError::Shutdown)
                        } else {
                            Err(FleetError::Internal(format!("operation panicked: {join_err}")))
                        }
                    }
                    Ok(Ok(inner)) => inner,
                }
            }
        }
    }

    /// Run a batch of named operations concurrently (bounded by
    /// `intra_batch_concurrency`), each under its own per-op timeout, the
    /// whole batch under `batch_op`. Returns one `(index, result)` per
    /// input, in input order, regardless of completion order.
    pub async fn run_batch<F, Fut, T>(
        &self,
        ops: Vec<BatchOp<F>>,
        shutdown: &CancellationToken,
    ) -> Vec<(usize, Result<T, FleetError>)>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FleetError>> + Send + 'static,
        T: Send + 'static,
    {
        let batch_shutdown = shutdown.child_token();
        let limiter = Arc::new(Semaphore::new(self.config.intra_batch_concurrency.max(1)));
        let single_op_timeout = self.config.single_op;

        let mut joins = JoinSet::new();
        for (index, op) in ops.into_iter().enumerate() {
            let limiter = limiter.clone();
            let breakers = self.breakers.clone();
            let admission = self.admission.clone();
            let name = op.name;
            let run = Arc::new(op.run);
            let inner_shutdown = batch_shutdown.clone();
            joins.spawn(async move {
                let _permit = match limiter.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, Err(FleetError::Internal("batch limiter closed".into()))),
                };
                if !breakers.allow(&name) {
                    return (index, Err(FleetError::CircuitOpen(name)));
                }
                let admitted = match admission.acquire().await {
                    Ok(a) => a,
                    Err(e) => return (index, Err(e)),
                };
                let run_for_spawn = run.clone();
                let handle = tokio::spawn(async move { (run_for_spawn.as_ref())().await });
                let outcome = tokio::select! {
                    biased;
                    _ = inner_shutdown.cancelled() => {
                        handle.abort();
                        Err(FleetError::Shutdown)
                    }
                    result = tokio::time::timeout(single_op_timeout, handle) => {
                        match result {
                            Err(_elapsed) => Err(FleetError::Timeout(single_op_timeout)),
                            Ok(Err(join_err)) if join_err.is_cancelled() => Err(FleetError::Shutdown),
                            Ok(Err(join_err)) => Err(FleetError::Internal(format!("operation panicked: {join_err}"))),
                            Ok(Ok(inner)) => inner,
                        }
                    }
                };
                drop(admitted);
                match &outcome {
                    Ok(_) => breakers.record_success(&name),
                    Err(FleetError::Shutdown) => {}
                    Err(_) => breakers.record_failure(&name),
                }
                (index, outcome)
            });
        }

        let mut results = Vec::new();
        let batch_deadline = tokio::time::sleep(self.config.batch_op);
        tokio::pin!(batch_deadline);
        loop {
            tokio::select! {
                biased;
                _ = &mut batch_deadline => {
                    batch_shutdown.cancel();
                    while let Some(joined) = joins.join_next().await {
                        if let Ok(pair) = joined {
                            results.push(pair);
                        }
                    }
                    break;
                }
                joined = joins.join_next() => {
                    match joined {
                        Some(Ok(pair)) => results.push(pair),
                        Some(Err(_)) => {}
                        None => break,
                    }
                }
            }
        }
        results.sort_by_key(|(index, _)| *index);
        results
    }
}

#[cfg(test)]
#[path = "governor_tests.rs"]
mod tests;

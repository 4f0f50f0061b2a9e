//! S5 — state transition events, in order, with no extraneous noise.

use fleet_agent_client::{AgentClient, FakeAgentTransport, ScriptedReply};
use fleet_core::{ActivityLevel, ActivityLogSink, Clock, FakeActivityLogSink, SystemClock};
use fleet_engine::{AdmissionGate, GovernorConfig, NodeHandle, NodeSource, StateMonitor, TimeoutGovernor};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn process_reply(state_code: i64) -> String {
    format!(
        "<methodResponse><params><param><value><array><data>\
<value><struct><member><name>name</name><value>p</value></member>\
<member><name>state</name><value><int>{state_code}</int></value></member></struct></value>\
</data></array></value></param></params></methodResponse>"
    )
}

fn handle(transport: FakeAgentTransport) -> Arc<NodeHandle> {
    let client = AgentClient::new("host", 9001, None, None, Arc::new(transport));
    let shutdown = CancellationToken::new();
    let admission = AdmissionGate::with_default_capacity(shutdown);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let governor = Arc::new(TimeoutGovernor::new(GovernorConfig::default(), admission, clock.clone()));
    Arc::new(NodeHandle::new("web1", "prod", "host", 9001, client, governor, clock))
}

#[tokio::test]
async fn process_started_then_failed_emits_exactly_those_two_events() {
    let transport = FakeAgentTransport::new();
    transport.set_default(ScriptedReply::ok(process_reply(0))); // STOPPED — seeds the baseline
    let h = handle(transport.clone());
    let source: Arc<dyn NodeSource> = Arc::new(parking_lot::RwLock::new(vec![h]));
    let sink = Arc::new(FakeActivityLogSink::new());
    let sink_dyn: Arc<dyn ActivityLogSink> = sink.clone();
    let shutdown = CancellationToken::new();
    let mut connected = HashMap::new();
    let mut process_states = HashMap::new();

    StateMonitor::tick_once(&source, &sink_dyn, &shutdown, &mut connected, &mut process_states).await;

    transport.set_default(ScriptedReply::ok(process_reply(20))); // RUNNING
    StateMonitor::tick_once(&source, &sink_dyn, &shutdown, &mut connected, &mut process_states).await;

    transport.set_default(ScriptedReply::ok(process_reply(200))); // FATAL
    StateMonitor::tick_once(&source, &sink_dyn, &shutdown, &mut connected, &mut process_states).await;

    let events: Vec<_> = sink.events().into_iter().filter(|e| e.resource == "process").collect();
    assert_eq!(events.len(), 2, "only the running and fatal transitions should be reported, got {events:?}");
    assert_eq!(events[0].action, "process_started");
    assert_eq!(events[0].level, ActivityLevel::Info);
    assert_eq!(events[1].action, "process_failed");
    assert_eq!(events[1].level, ActivityLevel::Error);
}

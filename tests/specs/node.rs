//! Node lifecycle, idempotent start/stop, and PID normalization.

use fleet_agent_client::{AgentClient, FakeAgentTransport, RpcResponse, ScriptedReply};
use fleet_core::{ActivityLogSink, NodeListEntry, NoOpActivityLogSink, SystemClock};
use fleet_service::{FleetService, FleetServiceConfig};
use std::sync::Arc;

fn array_of_structs(entries: &[&[(&str, &str)]]) -> String {
    let values: String = entries
        .iter()
        .map(|members| {
            let body: String = members
                .iter()
                .map(|(k, v)| format!("<member><name>{k}</name><value>{v}</value></member>"))
                .collect();
            format!("<value><struct>{body}</struct></value>")
        })
        .collect();
    format!("<methodResponse><params><param><value><array><data>{values}</data></array></value></param></params></methodResponse>")
}

fn fault_reply(code: i64, message: &str) -> String {
    format!(
        "<methodResponse><fault><value><struct>\
<member><name>faultCode</name><value><int>{code}</int></value></member>\
<member><name>faultString</name><value><string>{message}</string></value></member>\
</struct></value></fault></methodResponse>"
    )
}

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
    FleetService::new(FleetServiceConfig::default(), Arc::new(transport), Arc::new(SystemClock), sink)
}

#[tokio::test]
async fn start_process_already_started_fault_is_idempotent_success() {
    let transport = FakeAgentTransport::new();
    transport.push(
        "supervisor.startProcess",
        ScriptedReply::ok(fault_reply(60, "ALREADY_STARTED: p")),
    );
    let svc = service(transport);
    svc.add_node(&node("n1")).unwrap();

    svc.start_process("n1", "p").await.unwrap();
}

#[tokio::test]
async fn stop_process_on_exited_process_skips_the_agent_call() {
    let transport = FakeAgentTransport::new();
    transport.push(
        "supervisor.getProcessInfo",
        ScriptedReply::ok(array_of_structs(&[&[("name", "<string>p</string>"), ("state", "<int>100</int>")]])),
    );
    let svc = service(transport.clone());
    svc.add_node(&node("n1")).unwrap();

    svc.stop_process("n1", "p").await.unwrap();

    assert_eq!(
        transport.call_count("supervisor.stopProcess"),
        0,
        "stopProcess must not be invoked once the process is already terminal-stopped"
    );
}

#[tokio::test]
async fn pid_is_normalized_to_zero_outside_running_and_starting() {
    let transport = FakeAgentTransport::new();
    transport.set_default(ScriptedReply::ok(array_of_structs(&[
        &[("name", "<string>a</string>"), ("state", "<int>20</int>"), ("pid", "<int>4242</int>")],
        &[("name", "<string>b</string>"), ("state", "<int>100</int>"), ("pid", "<int>4242</int>")],
    ])));
    let client = AgentClient::new("host", 9001, None, None, Arc::new(transport));
    let processes = client.get_all_process_info().await.unwrap();

    let running = processes.iter().find(|p| p.name == "a").unwrap();
    let exited = processes.iter().find(|p| p.name == "b").unwrap();
    assert_eq!(running.pid, 4242);
    assert_eq!(exited.pid, 0, "EXITED must never carry a stale pid forward");
}

#[tokio::test]
async fn fault_round_trip_preserves_code_and_escaped_message() {
    let escaped = "timeout & <retry>".replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
    let body = fault_reply(42, &escaped);
    match fleet_agent_client::parse_response(&body).unwrap() {
        RpcResponse::Fault { code, message } => {
            assert_eq!(code, 42);
            assert_eq!(message, escaped);
        }
        RpcResponse::Success(_) => panic!("expected a fault"),
    }
}

#[tokio::test]
async fn add_node_is_rejected_once_shut_down() {
    let svc = service(FakeAgentTransport::new());
    svc.add_node(&node("n1")).unwrap();
    svc.stop(std::time::Duration::from_millis(50)).await;

    let err = svc.add_node(&node("n2")).unwrap_err();
    assert!(matches!(err, fleet_core::FleetError::Shutdown));
}

/// `GetAllNodes`/`AddNode` never observe a partially-inserted node: the
/// map is either empty or holds exactly the nodes added so far, under
/// concurrent access.
#[tokio::test]
async fn concurrent_add_and_list_never_observes_a_torn_map() {
    let svc = Arc::new(service(FakeAgentTransport::new()));
    let mut joins = tokio::task::JoinSet::new();
    for i in 0..20 {
        let svc = svc.clone();
        joins.spawn(async move {
            let _ = svc.add_node(&node(&format!("n{i}")));
        });
    }
    let svc_reader = svc.clone();
    joins.spawn(async move {
        for _ in 0..50 {
            let all = svc_reader.get_all_nodes().unwrap();
            assert!(all.len() <= 20);
        }
    });
    while joins.join_next().await.is_some() {}

    assert_eq!(svc.get_all_nodes().unwrap().len(), 20);
}

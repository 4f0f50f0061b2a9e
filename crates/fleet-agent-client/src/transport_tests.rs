use super::*;

#[test]
fn reqwest_transport_constructs() {
    let _transport = ReqwestAgentTransport::new();
}

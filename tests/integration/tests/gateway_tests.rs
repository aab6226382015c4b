//! Gateway Integration Tests
//!
//! Runs the real client (REST bootstrap plus WebSocket transport) against
//! the in-process mock server.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use chat_gateway::{Client, GatewayError, GatewayEvent, OpCode, Phase, TerminalError, TERMINATED_EVENT};
use integration_tests::{event_channel, wait_for, TestServer, TEST_SESSION, TEST_TOKEN};

// ============================================================================
// Bootstrap
// ============================================================================

#[tokio::test]
async fn test_bootstrap_identify_and_ready() {
    let mut server = TestServer::start().await.expect("Failed to start server");
    let client = Client::new(&server.client_config(TEST_TOKEN).unwrap()).unwrap();
    let mut events = event_channel(&client);

    let info = client.start().await.expect("Bootstrap failed");
    assert_eq!(info.url, server.gateway_url());
    assert_eq!(info.session_start_limit.remaining, 999);

    let (socket, identify) = server.next_frame().await.unwrap();
    assert_eq!(socket, 0);
    assert_eq!(identify.opcode(), Some(OpCode::Identify));
    assert_eq!(identify.d["token"], TEST_TOKEN);
    assert_eq!(identify.d["intents"], 513);
    assert_eq!(identify.d["presence"]["activities"][0]["name"], "Botting");

    let ready = wait_for(&mut events, "READY").await.unwrap();
    assert_eq!(ready.as_dispatch().unwrap().sequence, Some(1));

    let message = wait_for(&mut events, "MESSAGE_CREATE").await.unwrap();
    assert_eq!(message.as_dispatch().unwrap().data["content"], "hello");

    let gateway = client.gateway();
    assert_eq!(gateway.phase(), Phase::Ready);
    assert_eq!(gateway.session_id().as_deref(), Some(TEST_SESSION));
    assert_eq!(gateway.sequence(), Some(2));
    assert_eq!(gateway.session_start_limit().unwrap().remaining, 998);

    client.close(1000, "test finished");
}

#[tokio::test]
async fn test_bootstrap_rejects_bad_token() {
    let server = TestServer::start().await.expect("Failed to start server");
    let client = Client::new(&server.client_config("wrong-token").unwrap()).unwrap();

    match client.start().await {
        Err(GatewayError::Bootstrap(e)) => assert!(e.is_unauthorized()),
        other => panic!("Expected bootstrap failure, got {other:?}"),
    }
    assert_eq!(server.connections(), 0);
}

// ============================================================================
// Reconnection
// ============================================================================

#[tokio::test]
async fn test_resume_after_server_close() {
    let mut server = TestServer::start().await.expect("Failed to start server");
    let client = Client::new(&server.client_config(TEST_TOKEN).unwrap()).unwrap();
    let mut events = event_channel(&client);

    client.start().await.unwrap();
    server.next_frame().await.unwrap();
    wait_for(&mut events, "MESSAGE_CREATE").await.unwrap();

    server.disconnect(4000);

    let (socket, resume) = server.next_frame().await.unwrap();
    assert_eq!(socket, 1);
    assert_eq!(resume.opcode(), Some(OpCode::Resume));
    assert_eq!(resume.d["session_id"], TEST_SESSION);
    assert_eq!(resume.d["seq"], 2);

    let resumed = wait_for(&mut events, "RESUMED").await.unwrap();
    assert_eq!(resumed.as_dispatch().unwrap().sequence, Some(3));
    assert_eq!(client.gateway().phase(), Phase::Resumed);

    client.close(1000, "test finished");
}

#[tokio::test]
async fn test_fresh_identify_after_normal_close() {
    let mut server = TestServer::start().await.expect("Failed to start server");
    let client = Client::new(&server.client_config(TEST_TOKEN).unwrap()).unwrap();
    let mut events = event_channel(&client);

    client.start().await.unwrap();
    server.next_frame().await.unwrap();
    wait_for(&mut events, "READY").await.unwrap();

    server.disconnect(1000);

    let (socket, identify) = server.next_frame().await.unwrap();
    assert_eq!(socket, 1);
    assert_eq!(identify.opcode(), Some(OpCode::Identify));

    wait_for(&mut events, "READY").await.unwrap();
    client.close(1000, "test finished");
}

#[tokio::test]
async fn test_fatal_close_terminates() {
    let mut server = TestServer::start().await.expect("Failed to start server");
    let client = Client::new(&server.client_config(TEST_TOKEN).unwrap()).unwrap();
    let mut events = event_channel(&client);

    client.start().await.unwrap();
    server.next_frame().await.unwrap();
    wait_for(&mut events, "READY").await.unwrap();

    server.disconnect(4014);

    let terminated = wait_for(&mut events, TERMINATED_EVENT).await.unwrap();
    match terminated {
        GatewayEvent::Terminated(TerminalError::FatalClose { code, .. }) => assert_eq!(code, 4014),
        other => panic!("Expected fatal close, got {other:?}"),
    }
    assert!(client.gateway().is_closed());
    assert_eq!(server.connections(), 1);
}

// ============================================================================
// Heartbeat
// ============================================================================

#[tokio::test]
async fn test_heartbeat_acknowledged() {
    let mut server = TestServer::start_with_interval(100).await.expect("Failed to start server");
    let client = Client::new(&server.client_config(TEST_TOKEN).unwrap()).unwrap();
    let mut events = event_channel(&client);

    client.start().await.unwrap();
    server.next_frame().await.unwrap();
    wait_for(&mut events, "READY").await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    assert!(client.gateway().latency().is_some());
    assert_eq!(server.connections(), 1);

    client.close(1000, "test finished");
}

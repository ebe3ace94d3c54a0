use std::path::PathBuf;
use std::time::Duration;

use tokio_test::assert_ok;

use operator_agent_tools::{Client, ClientConfig, Error, ServerLocator, ServerState};

fn stub_locator() -> ServerLocator {
    ServerLocator::new(vec![PathBuf::from(env!("CARGO_BIN_EXE_operator-stub-server"))])
}

fn config() -> ClientConfig {
    ClientConfig::new("test-key")
        .with_start_timeout(Duration::from_secs(15))
        .with_shutdown_grace(Duration::from_secs(5))
}

async fn wait_until_dead(client: &Client) {
    for _ in 0..100 {
        if !client.is_server_alive().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("server did not exit");
}

#[tokio::test]
async fn test_auto_start_on_free_port_and_stop() {
    let client = Client::with_locator(config(), stub_locator()).await.unwrap();

    let handle = client.server_handle().await;
    assert_eq!(handle.state, ServerState::Ready);
    assert!(handle.owned);
    assert!(handle.port.is_some());
    assert!(handle.pid.is_some());

    let screenshot = client.screenshot().take().await.unwrap();
    assert!(!assert_ok!(screenshot.image_bytes()).is_empty());

    let overview = client.system().get_overview().await.unwrap();
    assert!(overview.windows.is_empty());

    assert_ok!(client.stop_server().await);
    assert_eq!(client.server_state().await, ServerState::Stopped);
    assert!(!client.is_server_alive().await);

    assert_ok!(client.stop_server().await);
    assert_eq!(client.server_state().await, ServerState::Stopped);
}

#[tokio::test]
async fn test_manual_start_moves_not_started_to_ready() {
    let client = Client::with_locator(config().with_auto_start(false), stub_locator())
        .await
        .unwrap();
    assert_eq!(client.server_state().await, ServerState::NotStarted);
    assert!(client.server_handle().await.port.is_none());

    let handle = client.start_server().await.unwrap();
    assert_eq!(handle.state, ServerState::Ready);
    assert_eq!(client.server_state().await, ServerState::Ready);
    assert_ok!(client.mouse().click(3, 4).await);

    client.stop_server().await.unwrap();
}

#[tokio::test]
async fn test_start_is_noop_when_ready() {
    let client = Client::with_locator(config(), stub_locator()).await.unwrap();
    let first = client.server_handle().await;

    let second = client.start_server().await.unwrap();
    assert_eq!(first.pid, second.pid);
    assert_eq!(first.port, second.port);

    client.stop_server().await.unwrap();
}

#[tokio::test]
async fn test_stub_reports_no_match() {
    let client = Client::with_locator(config(), stub_locator()).await.unwrap();

    let err = client
        .screenshot()
        .find_ui_element("Nonexistent Button XYZ")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ElementNotFound { .. }));

    client.stop_server().await.unwrap();
}

#[tokio::test]
async fn test_server_exit_mid_session_then_restart() {
    let client = Client::with_locator(config(), stub_locator()).await.unwrap();
    let base_url = client.server_handle().await.base_url().unwrap();

    // Take the server down behind the client's back
    reqwest::Client::new()
        .post(format!("{}/shutdown", base_url))
        .send()
        .await
        .unwrap();
    wait_until_dead(&client).await;

    let err = client.mouse().click(10, 10).await.unwrap_err();
    assert!(err.is_server_unavailable(), "got {:?}", err);

    let handle = client.server_handle().await;
    assert_eq!(handle.state, ServerState::Crashed);
    assert!(handle.crash.is_some());

    client.start_server().await.unwrap();
    assert_eq!(client.server_state().await, ServerState::Ready);
    assert_ok!(client.mouse().click(10, 10).await);

    client.stop_server().await.unwrap();
}

#[tokio::test]
async fn test_exit_during_startup_is_lifecycle_error() {
    let config = config()
        .with_auto_start(false)
        .with_server_args(["--exit-immediately", "3"]);
    let client = Client::with_locator(config, stub_locator()).await.unwrap();

    let err = client.start_server().await.unwrap_err();
    match err {
        Error::Lifecycle(message) => assert!(message.contains("exit code 3"), "{}", message),
        other => panic!("expected Lifecycle, got {:?}", other),
    }

    let handle = client.server_handle().await;
    assert_eq!(handle.state, ServerState::Crashed);
    let crash = handle.crash.unwrap();
    assert_eq!(crash.exit_code, Some(3));
    assert!(crash
        .output
        .iter()
        .any(|line| line.contains("exiting with code 3")));

    // Never reached Ready, so this is a lifecycle failure, not a lost server
    let err = client.mouse().click(1, 1).await.unwrap_err();
    assert!(matches!(err, Error::Lifecycle(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_missing_binary_without_installer() {
    let dir = tempfile::tempdir().unwrap();
    let locator = ServerLocator::new(vec![dir.path().join("operator-server")]);

    let err = Client::with_locator(config(), locator).await.err().unwrap();
    assert!(matches!(err, Error::Installation(_)));
}

#[tokio::test]
async fn test_fixed_port_is_used() {
    let port = operator_agent_tools::server::pick_free_port().unwrap();
    let client = Client::with_locator(config().with_server_port(port), stub_locator())
        .await
        .unwrap();
    assert_eq!(client.server_handle().await.port, Some(port));
    client.stop_server().await.unwrap();
}

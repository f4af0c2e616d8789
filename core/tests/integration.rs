//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port, then drives the
//! real `Client` (ureq transport) over HTTP. Token lifetimes are set per
//! server so the refresh path can be exercised without waiting.

use std::net::SocketAddr;

use mock_server::MockConfig;
use sensu_client::{
    ApiError, AuthState, Check, Client, Namespace, ObjectMeta, Resource, ResourceKind,
    ServerEndpoint, SessionError, Token, User,
};

const USER: &str = mock_server::DEFAULT_USERNAME;
const PASSWORD: &str = mock_server::DEFAULT_PASSWORD;

/// Start a mock server on a random port and return its address.
fn start_server(config: MockConfig) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, config).await
        })
        .unwrap();
    });

    addr
}

fn endpoint(addr: SocketAddr) -> ServerEndpoint {
    ServerEndpoint::new(addr.ip().to_string()).with_port(addr.port())
}

fn logged_in(config: MockConfig) -> Client {
    let mut client = Client::new(Some(endpoint(start_server(config))));
    client.login(USER, PASSWORD).unwrap();
    client
}

fn disk_check(namespace: &str) -> Check {
    let mut check = Check::new(
        ObjectMeta::new("disk", namespace),
        "check-disk-usage -w 80 -c 90",
        vec!["linux".to_string()],
    );
    check.interval = Some(60);
    check.publish = true;
    check
}

#[test]
fn resource_lifecycle() {
    let mut client = logged_in(MockConfig::default());
    assert_eq!(client.state(), AuthState::Valid);

    // Step 1: only the default namespace exists.
    let namespaces = Namespace::fetch(&mut client, None, None).unwrap();
    assert_eq!(namespaces, vec![Namespace::new("default")]);

    // Step 2: create a namespace; creating it again conflicts.
    let ops = Namespace::new("ops");
    ops.create(&mut client).unwrap();
    let err = ops.create(&mut client).unwrap_err();
    assert!(err.is_already_exists(), "expected AlreadyExists, got {err:?}");

    // Step 3: create a check in it.
    let mut check = disk_check("ops");
    check.create(&mut client).unwrap();

    // Step 4: a single-object GET comes back as a one-element list.
    let fetched = Check::fetch(&mut client, Some("ops"), Some("disk")).unwrap();
    assert_eq!(fetched, vec![check.clone()]);

    // Step 5: update.
    check.interval = Some(30);
    check.update(&mut client).unwrap();
    let fetched = Check::fetch(&mut client, Some("ops"), Some("disk")).unwrap();
    assert_eq!(fetched[0].interval, Some(30));

    // Step 6: list through the runtime registry.
    let any = client
        .fetch_kind(ResourceKind::Check, Some("ops"), None)
        .unwrap();
    assert_eq!(any.len(), 1);
    assert_eq!(any[0].name(), "disk");

    // Step 7: delete, then it is gone.
    check.delete(&mut client).unwrap();
    let err = Check::fetch(&mut client, Some("ops"), Some("disk")).unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
    let err = check.delete(&mut client).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn invalid_resource_is_rejected_locally() {
    let mut client = logged_in(MockConfig::default());
    let mut check = disk_check("default");
    check.subscriptions.clear();

    let err = check.create(&mut client).unwrap_err();
    assert!(matches!(err, ApiError::ResourceValidation(_)));
    assert!(Check::fetch(&mut client, None, None).unwrap().is_empty());
}

#[test]
fn bad_credentials_fail_login() {
    let mut client = Client::new(Some(endpoint(start_server(MockConfig::default()))));
    let err = client.login(USER, "wrong").unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationFailed(_)));
    assert_eq!(client.state(), AuthState::Unauthenticated);

    let err = Namespace::fetch(&mut client, None, None).unwrap_err();
    assert!(matches!(err, ApiError::Session(SessionError::NoSession)));
}

#[test]
fn short_lived_token_is_refreshed_before_the_call() {
    // 30s tokens are always inside the default 60s refresh threshold.
    let mut client = logged_in(MockConfig {
        token_ttl_secs: 30,
        ..MockConfig::default()
    });
    assert_eq!(client.state(), AuthState::NeedsRefresh);
    let first = client.token().unwrap().clone();

    let namespaces = Namespace::fetch(&mut client, None, None).unwrap();
    assert_eq!(namespaces.len(), 1);

    let second = client.token().unwrap().clone();
    assert_ne!(first.access_token(), second.access_token());
    assert_ne!(first.refresh_token(), second.refresh_token());

    // The next call refreshes again with the rotated refresh token.
    Namespace::fetch(&mut client, None, None).unwrap();
    assert_ne!(client.token().unwrap().access_token(), second.access_token());
}

#[test]
fn rejected_refresh_surfaces_authentication_failure() {
    let addr = start_server(MockConfig {
        token_ttl_secs: 30,
        ..MockConfig::default()
    });
    let mut first = Client::new(Some(endpoint(addr)));
    first.login(USER, PASSWORD).unwrap();
    let saved = first.token().unwrap().clone();

    // Spend the refresh token on the first client.
    first.refresh_token().unwrap();

    let mut second = Client::new(Some(endpoint(addr)));
    second.restore_token(saved.clone());
    let err = Namespace::fetch(&mut second, None, None).unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationFailed(_)), "got {err:?}");
    assert_eq!(second.token().unwrap().access_token(), saved.access_token());
}

#[test]
fn restored_token_is_used_for_calls() {
    let addr = start_server(MockConfig::default());
    let mut first = Client::new(Some(endpoint(addr)));
    first.login(USER, PASSWORD).unwrap();

    let saved = serde_json::to_string(first.token().unwrap()).unwrap();
    let token: Token = serde_json::from_str(&saved).unwrap();

    let mut second = Client::new(Some(endpoint(addr)));
    second.restore_token(token);
    assert_eq!(second.state(), AuthState::Valid);
    assert_eq!(Namespace::fetch(&mut second, None, None).unwrap().len(), 1);
}

#[test]
fn user_disable_and_reinstate() {
    let mut client = logged_in(MockConfig::default());
    let mut user = User::new("bob", vec!["ops".to_string()]);
    user.password = Some("hunter22".to_string());
    user.create(&mut client).unwrap();

    user.disable(&mut client).unwrap();
    let fetched = User::fetch(&mut client, None, Some("bob")).unwrap();
    assert!(fetched[0].disabled);
    assert!(fetched[0].password.is_none());

    let mut bob = Client::new(client.endpoint().cloned());
    assert!(bob.login("bob", "hunter22").is_err());

    user.reinstate(&mut client).unwrap();
    let fetched = User::fetch(&mut client, None, Some("bob")).unwrap();
    assert!(!fetched[0].disabled);
    bob.login("bob", "hunter22").unwrap();
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut client = Client::new(Some(ServerEndpoint::new("127.0.0.1").with_port(port)));
    let err = client.login(USER, PASSWORD).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

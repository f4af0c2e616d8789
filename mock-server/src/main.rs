use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("127.0.0.1:{port}");
    let config = mock_server::MockConfig::from_env();
    let listener = TcpListener::bind(&addr).await?;
    println!(
        "listening on {addr} (user {}, token ttl {}s)",
        config.username, config.token_ttl_secs
    );
    mock_server::run_with(listener, config).await
}

//! In-process HTTP servers standing in for the speech provider APIs

use axum::Router;
use tokio::net::TcpListener;

/// Bind an ephemeral local port; returns the listener and its base URL
pub async fn bind_mock_server() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("No local address");
    (listener, format!("http://{}", addr))
}

/// Serve `router` on `listener` in the background
pub fn serve_mock(listener: TcpListener, router: Router) {
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Mock server failed");
    });
}

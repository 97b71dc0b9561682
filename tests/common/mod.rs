//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;

use trellis::api::{Dispatcher, RouteTable};
use trellis::app::{build_api, Services};
use trellis::config::AppConfig;
use trellis::http::HttpServer;
use trellis::mail::RecordingMailer;

/// A server on an ephemeral port, shut down on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub mailer: Arc<RecordingMailer>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Boot the full server (account tree, in-memory collaborators,
/// recording mailer) on a free local port.
pub async fn start_server() -> TestServer {
    let config = AppConfig::default();
    let mailer = Arc::new(RecordingMailer::new());
    let services = Services::with_mailer(&config, mailer.clone());

    let table = build_api(&config.api.prefix)
        .bind(RouteTable::new())
        .install()
        .expect("route table installs");
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(table), services));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    let server = HttpServer::new(&config, dispatcher);
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = server
            .run(listener, async {
                let _ = rx.await;
            })
            .await;
    });

    TestServer {
        addr,
        mailer,
        shutdown: Some(tx),
    }
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("client builds")
}

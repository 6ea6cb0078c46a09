//! HTTP/1.1 server loop

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use crate::app::App;

pub struct Server {
    app: Arc<App>,
}

impl Server {
    pub fn new(app: App) -> Self {
        Self { app: Arc::new(app) }
    }

    pub async fn serve(self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener).await
    }

    /// Accept connections on an already bound listener until it fails
    pub async fn serve_listener(self, listener: TcpListener) -> std::io::Result<()> {
        info!("{} service listening on {}", self.app.name(), listener.local_addr()?);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            debug!("New connection from {}", remote_addr);

            let app = Arc::clone(&self.app);
            tokio::spawn(async move {
                Self::handle_connection(stream, app, remote_addr).await;
            });
        }
    }

    async fn handle_connection(stream: TcpStream, app: Arc<App>, remote_addr: SocketAddr) {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let app = Arc::clone(&app);
            async move { Ok::<_, Infallible>(app.handle(req).await) }
        });

        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
            error!("HTTP/1 connection error from {}: {}", remote_addr, err);
        }
    }
}

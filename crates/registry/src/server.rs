//! Registry server lifecycle: bind, serve, graceful shutdown

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use contracts::ServerConfig;

use crate::lines::LineCatalog;
use crate::router::build_router;
use crate::state::AppState;
use crate::store::PositionStore;
use crate::sweeper::ExpirySweeper;

/// A bound, not yet serving, registry
pub struct RegistryServer {
    listener: TcpListener,
    store: Arc<PositionStore>,
    lines: Arc<LineCatalog>,
    sweep_interval: Duration,
}

impl RegistryServer {
    /// Bind to `config.host:config.port` with a fresh store.
    ///
    /// The line catalog is loaded from `config.lines_path` when set; a
    /// missing or invalid file fails the bind with `InvalidData`.
    #[instrument(name = "registry_bind", skip(config), fields(addr = %config.bind_addr()))]
    pub async fn bind(config: &ServerConfig) -> io::Result<Self> {
        let lines = match config.lines_path.as_deref() {
            Some(path) => LineCatalog::from_path(path)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
            None => LineCatalog::default(),
        };
        let listener = TcpListener::bind(config.bind_addr()).await?;
        let store = Arc::new(PositionStore::with_ttl(config.record_ttl()));
        Ok(Self::from_listener(listener, store, config.sweep_interval())
            .with_lines(Arc::new(lines)))
    }

    /// Serve an injected store on an already bound listener
    pub fn from_listener(
        listener: TcpListener,
        store: Arc<PositionStore>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            listener,
            store,
            lines: Arc::new(LineCatalog::default()),
            sweep_interval,
        }
    }

    /// Serve `lines` on `GET /api/line/{code}`
    pub fn with_lines(mut self, lines: Arc<LineCatalog>) -> Self {
        self.lines = lines;
        self
    }

    pub fn lines(&self) -> &Arc<LineCatalog> {
        &self.lines
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn store(&self) -> Arc<PositionStore> {
        Arc::clone(&self.store)
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn run_until<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.listener.local_addr()?;
        let sweeper = self.store.ttl().map(|ttl| {
            info!(ttl_secs = ttl.as_secs(), "Record expiry enabled");
            ExpirySweeper::spawn(Arc::clone(&self.store), self.sweep_interval)
        });

        info!(%addr, "Registry listening");
        let app = build_router(AppState::new(Arc::clone(&self.store)).with_lines(self.lines));
        let result = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Some(sweeper) = sweeper {
            sweeper.shutdown().await;
        }
        info!(records = self.store.len(), "Registry stopped");
        result
    }

    /// Serve on a background task
    pub fn spawn(self) -> io::Result<RegistryHandle> {
        let addr = self.local_addr()?;
        let store = self.store();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let join = tokio::spawn(self.run_until(async move {
            let _ = shutdown_rx.await;
        }));
        Ok(RegistryHandle {
            addr,
            store,
            shutdown_tx: Some(shutdown_tx),
            join,
        })
    }
}

/// Handle to a registry running on a background task
pub struct RegistryHandle {
    addr: SocketAddr,
    store: Arc<PositionStore>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<io::Result<()>>,
}

impl RegistryHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `http://ip:port`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn store(&self) -> &Arc<PositionStore> {
        &self.store
    }

    /// Signal shutdown and wait for the server task
    pub async fn shutdown(mut self) -> io::Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        match (&mut self.join).await {
            Ok(result) => result,
            Err(e) => Err(io::Error::other(e)),
        }
    }
}

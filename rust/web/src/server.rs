use crate::config::ServerSettings;
use crate::events::EventBus;
use crate::handlers;
use crate::metrics::MetricsCollector;
use crate::middleware::with_request_logging;
use crate::registry::GameRegistry;
use std::convert::Infallible;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use warp::filters::BoxedFilter;
use warp::reply::{Reply, Response};
use warp::Filter;

const METRICS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Shared state handed to every route.
#[derive(Debug, Clone)]
pub struct AppContext {
    settings: ServerSettings,
    event_bus: Arc<EventBus>,
    registry: Arc<GameRegistry>,
    metrics: MetricsCollector,
}

impl AppContext {
    pub fn new(settings: ServerSettings) -> Self {
        let event_bus = Arc::new(EventBus::new());
        let metrics = MetricsCollector::new();
        let registry = Arc::new(GameRegistry::new(
            settings.table,
            Arc::clone(&event_bus),
            metrics.clone(),
        ));
        Self {
            settings,
            event_bus,
            registry,
            metrics,
        }
    }

    pub fn new_for_tests() -> Self {
        let settings = ServerSettings {
            port: 0,
            ..ServerSettings::default()
        };
        Self::new(settings)
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn registry(&self) -> Arc<GameRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn metrics(&self) -> MetricsCollector {
        self.metrics.clone()
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[derive(Debug, Clone)]
pub struct WebServer {
    context: AppContext,
}

impl WebServer {
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            context: AppContext::new(settings),
        }
    }

    pub fn from_context(context: AppContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let WebServer { context } = self;
        let bind_addr = Self::bind_addr(context.settings())?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let routes = Self::routes(&context);
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        let (addr, server_future) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(bind_addr, shutdown_signal)
            .map_err(Self::map_warp_error)?;

        tracing::info!(address = %addr, "web server listening");

        let metrics = context.metrics();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(METRICS_LOG_INTERVAL);
            ticker.tick().await;
            tokio::pin!(server_future);
            loop {
                tokio::select! {
                    _ = &mut server_future => break,
                    _ = ticker.tick() => metrics.log_metrics(),
                }
            }
            Ok(())
        });

        Ok(ServerHandle::new(addr, shutdown_tx, task, context))
    }

    fn bind_addr(settings: &ServerSettings) -> Result<SocketAddr, ServerError> {
        let host = settings.host.as_str();

        if let Ok(addr) = host.parse::<SocketAddr>() {
            return Ok(addr);
        }

        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            return Ok(SocketAddr::new(ip, settings.port));
        }

        let candidate = format!("{}:{}", host, settings.port);
        let mut addrs = candidate.to_socket_addrs().map_err(|err| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`: {err}"))
        })?;

        addrs.next().ok_or_else(|| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`"))
        })
    }

    fn map_warp_error(err: warp::Error) -> ServerError {
        use std::error::Error as StdError;

        if let Some(source) = err.source() {
            if let Some(io_err) = source.downcast_ref::<std::io::Error>() {
                let recreated = std::io::Error::new(io_err.kind(), io_err.to_string());
                return ServerError::BindError(recreated);
            }
        }

        ServerError::ConfigError(err.to_string())
    }

    /// Every route of the server, wrapped in request logging.
    pub fn routes(context: &AppContext) -> BoxedFilter<(Response,)> {
        let health = warp::path("health")
            .and(warp::get())
            .and(warp::path::end())
            .map(handlers::health);

        let routes = health
            .or(Self::api_routes(context))
            .unify()
            .or(Self::metrics_route(context))
            .unify()
            .or(Self::ws_route(context))
            .unify();

        with_request_logging(routes, context.metrics()).boxed()
    }

    fn api_routes(context: &AppContext) -> BoxedFilter<(Response,)> {
        let registry = context.registry();

        let new_code = warp::path!("api" / "games")
            .and(warp::post())
            .and(Self::with_registry(Arc::clone(&registry)))
            .and_then(|registry: Arc<GameRegistry>| async move {
                Ok::<_, Infallible>(handlers::new_game_code(registry).await)
            });

        let lobby = warp::path!("api" / "games")
            .and(warp::get())
            .and(Self::with_registry(Arc::clone(&registry)))
            .and_then(|registry: Arc<GameRegistry>| async move {
                Ok::<_, Infallible>(handlers::lobby(registry).await)
            });

        let state = warp::path!("api" / "games" / String)
            .and(warp::get())
            .and(Self::with_registry(registry))
            .and_then(|game_code: String, registry: Arc<GameRegistry>| async move {
                Ok::<_, Infallible>(handlers::game_state(registry, game_code).await)
            });

        new_code.or(lobby).unify().or(state).unify().boxed()
    }

    fn metrics_route(context: &AppContext) -> BoxedFilter<(Response,)> {
        let metrics = context.metrics();
        let registry = context.registry();

        warp::path!("metrics")
            .and(warp::get())
            .and(warp::any().map(move || metrics.clone()))
            .and(Self::with_registry(registry))
            .and_then(
                |metrics: MetricsCollector, registry: Arc<GameRegistry>| async move {
                    Ok::<_, Infallible>(handlers::metrics(metrics, registry).await)
                },
            )
            .boxed()
    }

    fn ws_route(context: &AppContext) -> BoxedFilter<(Response,)> {
        let registry = context.registry();
        let metrics = context.metrics();
        let buffer = context.settings().event_buffer;

        warp::path!("ws")
            .and(warp::ws())
            .and(Self::with_registry(registry))
            .map(move |ws: warp::ws::Ws, registry: Arc<GameRegistry>| {
                let metrics = metrics.clone();
                ws.on_upgrade(move |socket| {
                    handlers::handle_socket(socket, registry, metrics, buffer)
                })
                .into_response()
            })
            .boxed()
    }

    fn with_registry(
        registry: Arc<GameRegistry>,
    ) -> impl Filter<Extract = (Arc<GameRegistry>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&registry))
    }
}

#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
    context: AppContext,
}

impl ServerHandle {
    fn new(
        addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<Result<(), ServerError>>,
        context: AppContext,
    ) -> Self {
        Self {
            addr,
            shutdown: Some(shutdown),
            task: Some(task),
            context,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(result) => result?,
                Err(err) => {
                    return Err(ServerError::ConfigError(format!(
                        "server task join error: {err}"
                    )))
                }
            }
        }

        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

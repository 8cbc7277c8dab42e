// crates/taryahan-server/src/server.rs
// ============================================================================
// Module: Taryahan HTTP Server
// Description: Router assembly, shared state, and server lifecycle.
// Purpose: Expose the record services over JSON HTTP routes.
// Dependencies: axum, taryahan-config, taryahan-core, taryahan-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! [`TaryahanServer`] builds the record stores named by configuration, wraps
//! each in a [`ResourceService`], and mounts the public and admin routes.
//! Every admin route passes the [`AdminAuthz`] gate; the public enquiry
//! route passes the [`EnquiryRateLimiter`] instead. Security posture: every
//! request body and query parameter is untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::routing::post;
use taryahan_config::ServerAuditConfig;
use taryahan_config::ServerAuthMode;
use taryahan_config::StoreConfig;
use taryahan_config::StoreType;
use taryahan_config::TaryahanConfig;
use taryahan_core::InMemoryRecordStore;
use taryahan_core::PartnerEnquiries;
use taryahan_core::PubRecords;
use taryahan_core::RecordStore;
use taryahan_core::Resource;
use taryahan_core::ResourceService;
use taryahan_core::SharedRecordStore;
use taryahan_core::TournamentMatches;
use taryahan_store_sqlite::SqlResource;
use taryahan_store_sqlite::SqliteDatabase;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::auth::AdminAuthz;
use crate::auth::DefaultAdminAuthz;
use crate::handlers;
use crate::rate_limit::EnquiryRateLimiter;
use crate::rate_limit::RateLimitPolicy;
use crate::seed::AdminSeedHook;
use crate::seed::LoggingAdminSeedHook;
use crate::streamers::StaticStreamerSource;
use crate::streamers::StreamerSource;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup and transport failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
    /// A store or sink could not be initialized.
    #[error("init error: {0}")]
    Init(String),
    /// The listener failed.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Shared State
// ============================================================================

/// State shared by every handler.
pub(crate) struct AppState {
    /// Dota2 pub record service.
    pub(crate) pub_records: ResourceService<PubRecords>,
    /// Tournament match service.
    pub(crate) matches: ResourceService<TournamentMatches>,
    /// Partner enquiry service.
    pub(crate) enquiries: ResourceService<PartnerEnquiries>,
    /// Admin gate.
    pub(crate) authz: Arc<dyn AdminAuthz>,
    /// Public enquiry limiter.
    pub(crate) limiter: EnquiryRateLimiter,
    /// Audit sink.
    pub(crate) audit: Arc<dyn AuditSink>,
    /// Streamer listing source.
    pub(crate) streamers: Arc<dyn StreamerSource>,
    /// Maximum accepted request body.
    pub(crate) max_body_bytes: usize,
    /// Whether 500 responses carry error detail.
    pub(crate) expose_error_details: bool,
}

/// Typed access to the service for one resource.
pub(crate) trait ServiceFor<R: Resource> {
    /// Returns the service for `R`.
    fn service(&self) -> &ResourceService<R>;
}

impl ServiceFor<PubRecords> for AppState {
    fn service(&self) -> &ResourceService<PubRecords> {
        &self.pub_records
    }
}

impl ServiceFor<TournamentMatches> for AppState {
    fn service(&self) -> &ResourceService<TournamentMatches> {
        &self.matches
    }
}

impl ServiceFor<PartnerEnquiries> for AppState {
    fn service(&self) -> &ResourceService<PartnerEnquiries> {
        &self.enquiries
    }
}

// ============================================================================
// SECTION: Components
// ============================================================================

/// Pluggable collaborators wired into the server.
pub struct ServerComponents {
    /// Audit sink.
    pub audit: Arc<dyn AuditSink>,
    /// Admin seed hook.
    pub seed: Arc<dyn AdminSeedHook>,
    /// Streamer listing source.
    pub streamers: Arc<dyn StreamerSource>,
}

impl ServerComponents {
    /// Builds the default collaborators for a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Init`] when the audit file cannot be opened.
    pub fn from_config(config: &TaryahanConfig) -> Result<Self, ServerError> {
        Ok(Self {
            audit: build_audit_sink(&config.server.audit)?,
            seed: Arc::new(LoggingAdminSeedHook),
            streamers: Arc::new(StaticStreamerSource::new(config.streamers.clone())),
        })
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server instance.
pub struct TaryahanServer {
    /// Validated configuration.
    config: TaryahanConfig,
    /// Handler state.
    state: Arc<AppState>,
}

impl TaryahanServer {
    /// Builds a server with default collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or initialization fails.
    pub fn from_config(config: TaryahanConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let components = ServerComponents::from_config(&config)?;
        Self::with_components(config, components)
    }

    /// Builds a server with explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or initialization fails.
    pub fn with_components(
        config: TaryahanConfig,
        components: ServerComponents,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let (pub_records, matches, enquiries) = build_services(&config.store)?;
        components.seed.seed(&config.admins);
        let state = Arc::new(AppState {
            pub_records,
            matches,
            enquiries,
            authz: Arc::new(DefaultAdminAuthz::from_config(&config.server.auth)),
            limiter: EnquiryRateLimiter::new(RateLimitPolicy::from(&config.enquiry_rate_limit)),
            audit: components.audit,
            streamers: components.streamers,
            max_body_bytes: config.server.max_body_bytes,
            expose_error_details: config.server.expose_error_details,
        });
        emit_local_only_warning(config.server.auth.mode);
        Ok(Self { config, state })
    }

    /// Builds the route table.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/partner-enquiries", post(handlers::submit_enquiry))
            .route("/api/partner-enquiries", get(handlers::list::<PartnerEnquiries>))
            .route(
                "/api/partner-enquiries/statistics",
                get(handlers::statistics::<PartnerEnquiries>),
            )
            .route(
                "/api/partner-enquiries/{id}",
                axum::routing::delete(handlers::destroy::<PartnerEnquiries>),
            )
            .route(
                "/api/dota-pub-records",
                get(handlers::list::<PubRecords>).post(handlers::create::<PubRecords>),
            )
            .route("/api/dota-pub-records/statistics", get(handlers::statistics::<PubRecords>))
            .route(
                "/api/dota-pub-records/{id}",
                get(handlers::show::<PubRecords>)
                    .put(handlers::update::<PubRecords>)
                    .delete(handlers::destroy::<PubRecords>),
            )
            .route(
                "/api/taryahan/matches",
                get(handlers::list::<TournamentMatches>)
                    .post(handlers::create::<TournamentMatches>),
            )
            .route(
                "/api/taryahan/matches/statistics",
                get(handlers::statistics::<TournamentMatches>),
            )
            .route(
                "/api/taryahan/matches/{id}",
                get(handlers::show::<TournamentMatches>)
                    .put(handlers::update::<TournamentMatches>)
                    .delete(handlers::destroy::<TournamentMatches>),
            )
            .route("/api/streamers", get(handlers::streamer_summaries))
            .route("/api/streamers/detailed", get(handlers::streamers))
            .layer(DefaultBodyLimit::max(self.state.max_body_bytes))
            .with_state(Arc::clone(&self.state))
    }

    /// Binds the configured address and serves until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr =
            self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        tracing::info!(%addr, "taryahan server listening");
        self.serve_listener(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when the server fails.
    pub async fn serve_listener<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))?;
        tracing::info!("taryahan server stopped");
        Ok(())
    }
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Service triple for the three resources.
pub type Services = (
    ResourceService<PubRecords>,
    ResourceService<TournamentMatches>,
    ResourceService<PartnerEnquiries>,
);

/// Builds the record services from store configuration.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when a store cannot be opened or is not ready.
pub fn build_services(config: &StoreConfig) -> Result<Services, ServerError> {
    match config.store_type {
        StoreType::Memory => Ok((memory_service(), memory_service(), memory_service())),
        StoreType::Sqlite => {
            let sqlite = config
                .sqlite()
                .ok_or_else(|| ServerError::Config("sqlite store requires path".to_string()))?;
            let database =
                SqliteDatabase::open(&sqlite).map_err(|err| ServerError::Init(err.to_string()))?;
            tracing::info!(path = %sqlite.path.display(), "sqlite store opened");
            Ok((
                sqlite_service(&database)?,
                sqlite_service(&database)?,
                sqlite_service(&database)?,
            ))
        }
    }
}

/// Builds a service over a fresh in-memory store.
fn memory_service<R: Resource>() -> ResourceService<R> {
    ResourceService::new(SharedRecordStore::from_store(InMemoryRecordStore::<R>::new()))
}

/// Builds a service over one SQLite table and checks readiness.
fn sqlite_service<R: SqlResource>(database: &SqliteDatabase) -> Result<ResourceService<R>, ServerError> {
    let store = SharedRecordStore::from_store(database.store::<R>());
    store.readiness().map_err(|err| ServerError::Init(err.to_string()))?;
    Ok(ResourceService::new(store))
}

/// Builds the audit sink named by configuration.
fn build_audit_sink(config: &ServerAuditConfig) -> Result<Arc<dyn AuditSink>, ServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match config.path.as_deref() {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ServerError::Init(format!("audit log: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

/// Logs a warning when admin routes rely on loopback access alone.
fn emit_local_only_warning(mode: ServerAuthMode) {
    if mode == ServerAuthMode::LocalOnly {
        tracing::warn!(
            "server running in local-only mode without explicit auth; configure server.auth to \
             enable bearer_token"
        );
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
            Err(err) => {
                tracing::error!(error = %err, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!("received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

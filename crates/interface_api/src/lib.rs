//! HTTP API Layer
//!
//! REST interface for the collection service using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: cases, scheduled runs, reports, enforcement, webhooks
//! - **Middleware**: audit logging, webhook signature verification
//! - **DTOs**: request/response data transfer objects
//! - **Error Handling**: one domain-to-HTTP error mapping
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::RetryPolicy;
use domain_collection::{
    CaseRepository, CorrespondenceSender, EscalationEngine, InvoiceGateway, LedgerPoster,
    PaymentLedger, ReportingService, WorkflowConfigRegistry,
};
use domain_enforcement::{
    CallbackProcessor, DebtorDirectory, EnforcementService, FilingSubmitter, OfficeRegistry,
};
use infra_store::InMemoryStore;

use crate::config::ApiConfig;
use crate::handlers::{cases, cycle, enforcement, health, reports, webhooks};
use crate::middleware::audit_middleware;

/// Outbound integrations the service is wired with
pub struct Integrations {
    pub correspondence: Arc<dyn CorrespondenceSender>,
    pub ledger: Arc<dyn LedgerPoster>,
    pub invoices: Arc<dyn InvoiceGateway>,
    pub submitter: Arc<dyn FilingSubmitter>,
    pub directory: Arc<dyn DebtorDirectory>,
}

impl Integrations {
    /// The default wiring: logging stand-ins, e-filing deferred
    pub fn offline() -> Self {
        Self {
            correspondence: Arc::new(adapters::LoggingCorrespondence),
            ledger: Arc::new(adapters::LoggingLedger),
            invoices: Arc::new(adapters::LoggingInvoices),
            submitter: Arc::new(adapters::OfflineSubmitter),
            directory: Arc::new(adapters::EmptyDirectory),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<InMemoryStore>,
    pub engine: Arc<EscalationEngine>,
    pub payments: Arc<PaymentLedger>,
    pub reporting: Arc<ReportingService>,
    pub enforcement: Arc<EnforcementService>,
    pub callbacks: Arc<CallbackProcessor>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the services over one shared store
    pub fn new(
        config: ApiConfig,
        store: Arc<InMemoryStore>,
        configs: WorkflowConfigRegistry,
        offices: OfficeRegistry,
        integrations: Integrations,
    ) -> Self {
        let repo: Arc<dyn CaseRepository> = store.clone();

        let enforcement = Arc::new(EnforcementService::new(
            store.clone(),
            repo.clone(),
            integrations.directory,
            integrations.submitter,
            offices,
            RetryPolicy::default(),
        ));
        let engine = Arc::new(EscalationEngine::new(
            repo.clone(),
            integrations.correspondence,
            enforcement.clone(),
            configs.clone(),
        ));
        let payments = Arc::new(PaymentLedger::new(
            repo.clone(),
            integrations.ledger,
            integrations.invoices,
            configs.clone(),
        ));
        let reporting = Arc::new(ReportingService::new(
            repo,
            configs.default_config().currency,
        ));
        let callbacks = Arc::new(CallbackProcessor::new(
            store.clone(),
            store.clone(),
            payments.clone(),
        ));

        Self {
            store,
            engine,
            payments,
            reporting,
            enforcement,
            callbacks,
            config,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Case routes
    let case_routes = Router::new()
        .route("/", post(cases::create_case))
        .route("/", get(cases::list_cases))
        .route("/:id", get(cases::get_case))
        .route("/:id/events", get(cases::get_case_events))
        .route("/:id/payments", get(cases::get_case_payments))
        .route("/:id/payments", post(cases::record_payment))
        .route("/:id/suspend", post(cases::suspend_case))
        .route("/:id/resume", post(cases::resume_case))
        .route("/:id/write-off", post(cases::write_off_case))
        .route("/:id/enforcement", get(enforcement::get_case_filing));

    // Reporting routes
    let report_routes = Router::new()
        .route("/aging", get(reports::aging))
        .route("/top-debtors", get(reports::top_debtors))
        .route("/summary", get(reports::summary));

    // Enforcement routes
    let enforcement_routes = Router::new()
        .route("/:id", get(enforcement::get_filing))
        .route("/:id/continuation", post(enforcement::request_continuation));

    let api_routes = Router::new()
        .nest("/cases", case_routes)
        .nest("/reports", report_routes)
        .nest("/enforcement", enforcement_routes)
        .route("/cycle/run", post(cycle::run_cycle))
        .route("/webhooks/enforcement", post(webhooks::enforcement_callback))
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

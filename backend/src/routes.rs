use std::sync::Arc;

use rocket::form::Form;
use rocket::http::{ContentType, Cookie, CookieJar, Status};
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{get, post, FromForm, State};
use tracing::{error, instrument};

use shared::models::{Dependency, HealthResponse, StatsResponse, VoterSession};
use crate::{
    aggregator::MetricsAggregator,
    config::Config,
    health,
    metrics::VoteMetrics,
    page,
    processor::VoteProcessor,
    queue::QueueStore,
    session::{SessionManager, SESSION_COOKIE},
    store::VoteStore,
};

pub struct AppState {
    pub config: Config,
    pub queue: Arc<dyn QueueStore>,
    pub store: Arc<dyn VoteStore>,
    pub sessions: SessionManager,
    pub metrics: Arc<VoteMetrics>,
    pub aggregator: Arc<MetricsAggregator>,
}

impl AppState {
    pub fn new(
        config: Config,
        queue: Arc<dyn QueueStore>,
        store: Arc<dyn VoteStore>,
    ) -> Result<Self, prometheus::Error> {
        let metrics = Arc::new(VoteMetrics::new()?);
        let aggregator = Arc::new(MetricsAggregator::new(
            Arc::clone(&store),
            Arc::clone(&metrics),
            config.dependency_timeout,
        ));
        Ok(Self {
            config,
            queue,
            store,
            sessions: SessionManager::new(),
            metrics,
            aggregator,
        })
    }

    /// Resolves the visitor from the `voter_id` cookie and writes it back.
    fn session(&self, cookies: &CookieJar<'_>) -> Option<VoterSession> {
        let incoming = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string());
        match self.sessions.resolve(incoming.as_deref()) {
            Ok(session) => {
                if session.is_new {
                    let seen = i64::try_from(self.sessions.sessions_seen()).unwrap_or(i64::MAX);
                    self.metrics.active_sessions.set(seen);
                }
                cookies.add(Cookie::new(SESSION_COOKIE, session.voter_id.clone()));
                Some(session)
            }
            Err(e) => {
                error!("Serving page without a session: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, FromForm)]
pub struct VoteForm {
    pub vote: Option<String>,
}

#[get("/")]
pub async fn index(state: &State<AppState>, cookies: &CookieJar<'_>) -> RawHtml<String> {
    state.session(cookies);
    RawHtml(page::render(&state.config, None))
}

/// Always answers with the page; the outcome only changes which option is marked.
#[instrument(skip_all)]
#[post("/", data = "<form>")]
pub async fn cast_vote(
    state: &State<AppState>,
    cookies: &CookieJar<'_>,
    form: Option<Form<VoteForm>>,
) -> RawHtml<String> {
    let raw = form.and_then(|f| f.into_inner().vote);

    let voted = match state.session(cookies) {
        Some(session) => VoteProcessor::submit(state, &session.voter_id, raw.as_deref())
            .await
            .recorded(),
        None => None,
    };

    RawHtml(page::render(&state.config, voted))
}

#[get("/stats")]
pub async fn stats(state: &State<AppState>) -> Json<StatsResponse> {
    // A failed refresh keeps the last published snapshot.
    let _ = state.aggregator.refresh().await;
    let snapshot = state.aggregator.snapshot();
    Json(StatsResponse::new(&snapshot, state.config.current_options()))
}

#[get("/healthz")]
pub async fn healthz(state: &State<AppState>) -> Json<HealthResponse> {
    Json(health::health_report(state).await)
}

#[get("/metrics")]
pub async fn metrics(state: &State<AppState>) -> Result<(ContentType, String), Status> {
    let _ = futures::join!(
        state.aggregator.refresh(),
        health::probe(state, Dependency::Queue)
    );

    state
        .metrics
        .render()
        .map(|body| (ContentType::new("text", "plain").with_params(("version", "0.0.4")), body))
        .map_err(|e| {
            error!("Error generating metrics: {}", e);
            Status::InternalServerError
        })
}

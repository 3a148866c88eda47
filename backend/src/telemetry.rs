use std::time::Instant;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request, Response};

use crate::routes::AppState;

#[derive(Clone, Copy)]
struct RequestStart(Option<Instant>);

/// Counts and times every request into the per-instance registry.
pub struct RequestMetrics;

#[rocket::async_trait]
impl Fairing for RequestMetrics {
    fn info(&self) -> Info {
        Info {
            name: "Request metrics",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        req.local_cache(|| RequestStart(Some(Instant::now())));
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let Some(state) = req.rocket().state::<AppState>() else {
            return;
        };

        let route = req
            .route()
            .map(|r| r.uri.to_string())
            .unwrap_or_else(|| "unmatched".to_string());
        let status = res.status().code.to_string();
        let labels = [req.method().as_str(), route.as_str(), status.as_str()];

        state.metrics.http_requests_total.with_label_values(&labels).inc();
        if let RequestStart(Some(start)) = *req.local_cache(|| RequestStart(None)) {
            state
                .metrics
                .http_request_duration
                .with_label_values(&labels)
                .observe(start.elapsed().as_secs_f64());
        }
    }
}

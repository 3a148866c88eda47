pub mod aggregator;
pub mod catchers;
pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod page;
pub mod processor;
pub mod queries;
pub mod queue;
pub mod routes;
pub mod session;
pub mod store;
pub mod telemetry;
pub use shared::{models::*, validation::*};

use rocket::{catchers, routes, Build, Rocket};

use crate::routes::AppState;

pub fn build(state: AppState) -> Rocket<Build> {
    rocket::build()
        .attach(telemetry::RequestMetrics)
        .manage(state)
        .mount(
            "/",
            routes![
                routes::index,
                routes::cast_vote,
                routes::stats,
                routes::healthz,
                routes::metrics
            ],
        )
        .register("/", catchers![catchers::not_found, catchers::internal_error])
}

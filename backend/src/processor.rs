use tracing::{error, info, instrument, warn};

use shared::models::{Dependency, VoteEvent, VoteOption};
use shared::validation::{parse_vote_option, ValidationError};
use crate::{
    error::{deadline, ServiceError},
    metrics::UNKNOWN_VOTE_TYPE,
    routes::AppState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Appended to the queue and counted.
    Recorded(VoteOption),
    /// Counted in the fallback bucket, never queued.
    Unrecognized(String),
    /// Blank or missing option.
    Rejected,
    /// The queue could not be reached; nothing was recorded.
    QueueUnavailable,
}

impl VoteOutcome {
    pub fn recorded(&self) -> Option<VoteOption> {
        match self {
            VoteOutcome::Recorded(option) => Some(*option),
            _ => None,
        }
    }
}

pub struct VoteProcessor;

impl VoteProcessor {
    /// Ingests one vote. Every failure is absorbed here: the caller always
    /// renders a normal page and only the outcome tells what happened.
    #[instrument(skip(state, voter_id))]
    pub async fn submit(state: &AppState, voter_id: &str, raw: Option<&str>) -> VoteOutcome {
        let _timer = state.metrics.vote_processing_duration.start_timer();
        info!("Received vote for {:?}", raw.unwrap_or_default());

        let option = match parse_vote_option(raw) {
            Ok(option) => option,
            Err(ValidationError::UnrecognizedOption(value)) => {
                warn!("Unrecognized vote option {:?}, counted as {}", value, UNKNOWN_VOTE_TYPE);
                state.metrics.record_vote(UNKNOWN_VOTE_TYPE);
                return VoteOutcome::Unrecognized(value);
            }
            Err(e) => {
                let e = ServiceError::InvalidInput(e.to_string());
                warn!("Vote rejected: {}", e);
                return VoteOutcome::Rejected;
            }
        };

        if let Err(e) = Self::publish(state, voter_id, option).await {
            if let Some(dependency) = e.dependency() {
                state.metrics.set_dependency_up(dependency, false);
            }
            error!("Error processing vote: {}", e);
            return VoteOutcome::QueueUnavailable;
        }

        state.metrics.set_dependency_up(Dependency::Queue, true);
        state.metrics.record_vote(option.key());
        info!("Vote processed: {}", option);

        // Best effort; a failed refresh is already logged and gauged.
        let _ = state.aggregator.refresh().await;

        VoteOutcome::Recorded(option)
    }

    async fn publish(state: &AppState, voter_id: &str, option: VoteOption) -> Result<(), ServiceError> {
        let event = VoteEvent {
            voter_id: voter_id.to_string(),
            vote: option,
        };
        let payload = serde_json::to_string(&event)
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        deadline(Dependency::Queue, state.config.dependency_timeout, state.queue.publish(&payload)).await
    }
}

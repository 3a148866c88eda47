use std::sync::atomic::{AtomicU64, Ordering};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{debug, error};

use shared::{models::VoterSession, validation::is_well_formed_token};
use crate::error::ServiceError;

pub const SESSION_COOKIE: &str = "voter_id";
const TOKEN_BYTES: usize = 16;

/// Issues anonymous voter tokens. The counter is advisory telemetry: it only
/// grows and is lost on restart.
pub struct SessionManager {
    rng: SystemRandom,
    sessions_seen: AtomicU64,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
            sessions_seen: AtomicU64::new(0),
        }
    }

    pub fn resolve(&self, incoming: Option<&str>) -> Result<VoterSession, ServiceError> {
        if let Some(token) = incoming.filter(|t| is_well_formed_token(t)) {
            return Ok(VoterSession {
                voter_id: token.to_string(),
                is_new: false,
            });
        }

        let mut bytes = [0u8; TOKEN_BYTES];
        self.rng.fill(&mut bytes).map_err(|_| {
            error!("System RNG failed while issuing a session token");
            ServiceError::SessionUnavailable
        })?;

        let seen = self.sessions_seen.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Issued new voter session ({} seen)", seen);

        Ok(VoterSession {
            voter_id: URL_SAFE_NO_PAD.encode(bytes),
            is_new: true,
        })
    }

    pub fn sessions_seen(&self) -> u64 {
        self.sessions_seen.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn reuses_well_formed_tokens() {
        let sessions = SessionManager::new();
        let first = sessions.resolve(None).unwrap();
        assert!(first.is_new);
        assert!(is_well_formed_token(&first.voter_id));

        let again = sessions.resolve(Some(&first.voter_id)).unwrap();
        assert!(!again.is_new);
        assert_eq!(again.voter_id, first.voter_id);
        assert_eq!(sessions.sessions_seen(), 1);
    }

    #[test]
    fn replaces_malformed_tokens() {
        let sessions = SessionManager::new();
        let session = sessions.resolve(Some("not a token!")).unwrap();
        assert!(session.is_new);
        assert_ne!(session.voter_id, "not a token!");
        assert_eq!(sessions.sessions_seen(), 1);
    }

    #[test]
    fn concurrent_issuance_counts_every_session() {
        let sessions = Arc::new(SessionManager::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sessions = Arc::clone(&sessions);
                std::thread::spawn(move || {
                    (0..50)
                        .map(|_| sessions.resolve(None).unwrap().voter_id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: HashSet<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 400);
        assert_eq!(sessions.sessions_seen(), 400);
    }
}

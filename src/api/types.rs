//! Shared types for the HTTP API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::authorization::{AuthState, RoleSet};
use crate::core_state::CoreState;

// ═══════════════════════════════════════════════════════════
// API context — shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus API-specific caches.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub sessions: Arc<Mutex<SessionStore>>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        let ttl = Duration::from_secs(core.config.session_ttl_secs);
        Self {
            core,
            sessions: Arc::new(Mutex::new(SessionStore::new(ttl))),
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new())),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Caller — injected by the session middleware
// ═══════════════════════════════════════════════════════════

/// Who is making the request, resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct Caller {
    pub auth: AuthState,
    /// Hash of the presented token when it matched a live session.
    pub token_hash: Option<[u8; 32]>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self {
            auth: AuthState::Anonymous,
            token_hash: None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match &self.auth {
            AuthState::SignedIn { user_id, .. } => Some(*user_id),
            _ => None,
        }
    }

    pub fn roles(&self) -> RoleSet {
        match &self.auth {
            AuthState::SignedIn { roles, .. } => *roles,
            _ => RoleSet::EMPTY,
        }
    }

    /// Label used in the audit trail.
    pub fn actor(&self) -> String {
        match self.user_id() {
            Some(id) => format!("user:{id}"),
            None => "anonymous".to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tokens and sessions
// ═══════════════════════════════════════════════════════════

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Clone)]
struct Session {
    user_id: Uuid,
    expires_at: Instant,
}

/// Login sessions keyed by token hash. Raw tokens are never stored.
pub struct SessionStore {
    sessions: HashMap<[u8; 32], Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session and return its bearer token.
    pub fn create(&mut self, user_id: Uuid) -> String {
        if self.sessions.len() > 1000 {
            self.cleanup();
        }
        let token = generate_token();
        self.sessions.insert(
            hash_token(&token),
            Session {
                user_id,
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    /// The user behind a live session. Expired sessions are dropped.
    pub fn resolve(&mut self, token_hash: &[u8; 32]) -> Option<Uuid> {
        let session = self.sessions.get(token_hash)?;
        if Instant::now() >= session.expires_at {
            self.sessions.remove(token_hash);
            return None;
        }
        Some(session.user_id)
    }

    pub fn revoke(&mut self, token_hash: &[u8; 32]) -> bool {
        self.sessions.remove(token_hash).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn cleanup(&mut self) {
        let now = Instant::now();
        self.sessions.retain(|_, s| s.expires_at > now);
    }
}

// ═══════════════════════════════════════════════════════════
// Rate limiter — per-client sliding window
// ═══════════════════════════════════════════════════════════

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Per-client rate limiter with per-minute and per-hour limits.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
    per_hour: u32,
    last_sweep: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(100, 1000)
    }

    pub fn with_limits(per_minute: u32, per_hour: u32) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute,
            per_hour,
            last_sweep: Instant::now(),
        }
    }

    /// Check if a client is within rate limits. Returns `Ok(())` or
    /// `Err(retry_after_secs)` if exceeded.
    pub fn check(&mut self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&mut self, key: &str, now: Instant) -> Result<(), u64> {
        if now.duration_since(self.last_sweep) >= MINUTE {
            self.sweep(now);
        }

        let entries = self.windows.entry(key.to_string()).or_default();

        // Clean entries older than 1 hour
        entries.retain(|ts| now.duration_since(*ts) < HOUR);

        let last_minute = entries
            .iter()
            .filter(|ts| now.duration_since(**ts) < MINUTE)
            .count() as u32;
        if last_minute >= self.per_minute {
            return Err(60);
        }

        if entries.len() as u32 >= self.per_hour {
            return Err(3600);
        }

        entries.push(now);
        Ok(())
    }

    /// Drops clients whose whole window has expired.
    fn sweep(&mut self, now: Instant) {
        self.windows
            .retain(|_, entries| entries.last().is_some_and(|ts| now.duration_since(*ts) < HOUR));
        self.last_sweep = now;
        tracing::debug!(clients = self.windows.len(), "Rate limiter swept");
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_deterministic() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), hash_token("other"));
    }

    #[test]
    fn generated_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn session_resolves_until_revoked() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        let user = Uuid::new_v4();
        let token = store.create(user);
        let hash = hash_token(&token);

        assert_eq!(store.resolve(&hash), Some(user));
        assert!(store.revoke(&hash));
        assert_eq!(store.resolve(&hash), None);
        assert!(!store.revoke(&hash));
    }

    #[test]
    fn expired_session_is_dropped() {
        let mut store = SessionStore::new(Duration::ZERO);
        let token = store.create(Uuid::new_v4());
        assert_eq!(store.resolve(&hash_token(&token)), None);
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_token_resolves_to_nothing() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        assert_eq!(store.resolve(&hash_token("forged")), None);
    }

    #[test]
    fn rate_limiter_allows_within_limit() {
        let mut limiter = RateLimiter::new();
        for _ in 0..100 {
            assert!(limiter.check("client-1").is_ok());
        }
    }

    #[test]
    fn rate_limiter_blocks_over_minute_limit() {
        let mut limiter = RateLimiter::new();
        for _ in 0..100 {
            limiter.check("client-1").unwrap();
        }
        assert_eq!(limiter.check("client-1"), Err(60));
    }

    #[test]
    fn rate_limiter_per_client() {
        let mut limiter = RateLimiter::with_limits(1, 10);
        limiter.check("client-1").unwrap();
        assert!(limiter.check("client-1").is_err());
        assert!(limiter.check("client-2").is_ok());
    }

    #[test]
    fn rate_limiter_forgets_idle_clients() {
        let mut limiter = RateLimiter::with_limits(5, 10);
        let start = Instant::now();
        for i in 0..50 {
            limiter.check_at(&format!("peer:10.0.0.{i}"), start).unwrap();
        }
        assert_eq!(limiter.windows.len(), 50);

        let later = start + HOUR + MINUTE;
        limiter.check_at("peer:10.0.1.1", later).unwrap();
        assert_eq!(limiter.windows.len(), 1);
    }

    #[test]
    fn caller_actor_labels() {
        assert_eq!(Caller::anonymous().actor(), "anonymous");
        let id = Uuid::new_v4();
        let caller = Caller {
            auth: AuthState::SignedIn {
                user_id: id,
                roles: RoleSet::EMPTY,
            },
            token_hash: None,
        };
        assert_eq!(caller.actor(), format!("user:{id}"));
        assert!(caller.roles().is_empty());
    }
}

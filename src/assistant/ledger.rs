use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::config::Config;

/// Rate-limiting unit of account: a signed-in user, or the network origin of an
/// anonymous caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    User(i64),
    Origin(String),
}

impl IdentityKey {
    pub fn identify(principal: Option<i64>, network_origin: &str) -> Self {
        match principal {
            Some(user_id) => IdentityKey::User(user_id),
            None => IdentityKey::Origin(network_origin.to_string()),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::User(id) => write!(f, "user_{id}"),
            IdentityKey::Origin(origin) => write!(f, "ip_{origin}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    TooSoon,
    WindowFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denial {
    pub kind: DenialKind,
    pub retry_after_secs: u64,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DenialKind::TooSoon => write!(
                f,
                "Please wait {} seconds before making another request.",
                self.retry_after_secs
            ),
            DenialKind::WindowFull => write!(
                f,
                "Rate limit exceeded. Please wait {} seconds before making another request.",
                self.retry_after_secs
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied(Denial),
}

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub max_requests: usize,
    pub window: Duration,
    pub min_delay: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
            min_delay: Duration::from_secs(2),
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 100,
        }
    }
}

impl From<&Config> for LedgerConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_requests: config.ai_rate_limit_requests,
            window: config.ai_rate_limit_window(),
            min_delay: config.ai_min_delay(),
            cache_ttl: config.ai_cache_ttl(),
            cache_capacity: config.ai_cache_capacity,
        }
    }
}

struct RateRecord {
    timestamps: VecDeque<Instant>,
    last_request: Instant,
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

struct LedgerState<V> {
    requests: HashMap<IdentityKey, RateRecord>,
    cache: HashMap<String, CacheEntry<V>>,
}

/// Per-identity request timing plus a bounded, expiring response cache.
///
/// One mutex guards both maps, so every operation is atomic with respect to
/// concurrent callers. The lock is never held across an `.await`.
pub struct Ledger<V> {
    config: LedgerConfig,
    state: Mutex<LedgerState<V>>,
}

impl<V: Clone> Ledger<V> {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LedgerState {
                requests: HashMap::new(),
                cache: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState<V>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn admit(&self, identity: &IdentityKey, now: Instant) -> Admission {
        let mut state = self.lock();
        let window = self.config.window;

        if let Some(record) = state.requests.get_mut(identity) {
            let elapsed = now.saturating_duration_since(record.last_request);
            if elapsed < self.config.min_delay {
                return Admission::Denied(Denial {
                    kind: DenialKind::TooSoon,
                    retry_after_secs: self
                        .config
                        .min_delay
                        .as_secs()
                        .saturating_sub(elapsed.as_secs()),
                });
            }

            record
                .timestamps
                .retain(|t| now.saturating_duration_since(*t) < window);

            if record.timestamps.len() >= self.config.max_requests {
                let oldest = record.timestamps.front().copied().unwrap_or(now);
                let retry_after = window.saturating_sub(now.saturating_duration_since(oldest));
                return Admission::Denied(Denial {
                    kind: DenialKind::WindowFull,
                    retry_after_secs: retry_after.as_secs(),
                });
            }

            record.timestamps.push_back(now);
            record.last_request = now;
            self.forget_idle(&mut state, now);
            return Admission::Allowed;
        }

        if self.config.max_requests == 0 {
            return Admission::Denied(Denial {
                kind: DenialKind::WindowFull,
                retry_after_secs: window.as_secs(),
            });
        }

        state.requests.insert(
            identity.clone(),
            RateRecord {
                timestamps: VecDeque::from([now]),
                last_request: now,
            },
        );
        self.forget_idle(&mut state, now);
        Admission::Allowed
    }

    /// Drops identities whose last request is past both the window and the
    /// minimum delay; such a record can no longer cause a denial.
    fn forget_idle(&self, state: &mut LedgerState<V>, now: Instant) {
        let horizon = self.config.window.max(self.config.min_delay);
        state
            .requests
            .retain(|_, record| now.saturating_duration_since(record.last_request) < horizon);
    }

    /// Number of identities currently holding rate-limit state.
    pub fn tracked_identities(&self) -> usize {
        self.lock().requests.len()
    }

    /// Admitted requests still counted against `identity` at `now`.
    pub fn recorded_requests(&self, identity: &IdentityKey, now: Instant) -> usize {
        let state = self.lock();
        state.requests.get(identity).map_or(0, |record| {
            record
                .timestamps
                .iter()
                .filter(|t| now.saturating_duration_since(**t) < self.config.window)
                .count()
        })
    }

    pub fn cache_get(&self, key: &str, now: Instant) -> Option<V> {
        let mut state = self.lock();
        let expired = match state.cache.get(key) {
            Some(entry) if now.saturating_duration_since(entry.inserted_at) < self.config.cache_ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            state.cache.remove(key);
        }
        None
    }

    pub fn cache_put(&self, key: String, value: V, now: Instant) {
        let mut state = self.lock();
        state.cache.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
            },
        );

        if state.cache.len() > self.config.cache_capacity {
            let oldest = state
                .cache
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                state.cache.remove(&oldest);
            }
        }
    }

    pub fn cache_len(&self) -> usize {
        self.lock().cache.len()
    }
}

/// Digest of the normalized message used as the response cache key.
pub fn cache_key(message: &str) -> String {
    let normalized = message.trim().to_lowercase();
    format!("{:x}", Sha256::digest(normalized.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn ledger() -> Ledger<String> {
        Ledger::new(LedgerConfig::default())
    }

    #[test]
    fn identify_prefers_authenticated_principal() {
        assert_eq!(IdentityKey::identify(Some(7), "10.0.0.1").to_string(), "user_7");
        assert_eq!(IdentityKey::identify(None, "10.0.0.1").to_string(), "ip_10.0.0.1");
    }

    #[test]
    fn window_fills_then_reopens_after_oldest_expires() {
        let ledger = ledger();
        let who = IdentityKey::User(1);
        let t0 = Instant::now();

        for i in 0..10 {
            assert_eq!(ledger.admit(&who, t0 + secs(i * 2)), Admission::Allowed);
        }

        match ledger.admit(&who, t0 + secs(20)) {
            Admission::Denied(denial) => {
                assert_eq!(denial.kind, DenialKind::WindowFull);
                assert_eq!(denial.retry_after_secs, 40);
                assert_eq!(
                    denial.to_string(),
                    "Rate limit exceeded. Please wait 40 seconds before making another request."
                );
            }
            other => panic!("expected denial, got {other:?}"),
        }

        assert_eq!(ledger.admit(&who, t0 + secs(60)), Admission::Allowed);
    }

    #[test]
    fn min_delay_denies_regardless_of_window() {
        let ledger = ledger();
        let who = IdentityKey::Origin("127.0.0.1".into());
        let t0 = Instant::now();

        assert_eq!(ledger.admit(&who, t0), Admission::Allowed);
        match ledger.admit(&who, t0 + Duration::from_millis(500)) {
            Admission::Denied(denial) => {
                assert_eq!(denial.kind, DenialKind::TooSoon);
                assert_eq!(denial.retry_after_secs, 2);
                assert_eq!(
                    denial.to_string(),
                    "Please wait 2 seconds before making another request."
                );
            }
            other => panic!("expected denial, got {other:?}"),
        }
        assert_eq!(ledger.recorded_requests(&who, t0 + secs(1)), 1);
        assert_eq!(ledger.admit(&who, t0 + secs(2)), Admission::Allowed);
    }

    #[test]
    fn identities_are_limited_independently() {
        let ledger = ledger();
        let t0 = Instant::now();
        assert_eq!(ledger.admit(&IdentityKey::User(1), t0), Admission::Allowed);
        assert_eq!(ledger.admit(&IdentityKey::User(2), t0), Admission::Allowed);
    }

    #[test]
    fn idle_identities_are_forgotten_once_window_passes() {
        let ledger = ledger();
        let t0 = Instant::now();
        for origin in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            ledger.admit(&IdentityKey::Origin(origin.into()), t0);
        }
        assert_eq!(ledger.tracked_identities(), 3);

        ledger.admit(&IdentityKey::Origin("10.0.0.2".into()), t0 + secs(30));
        assert_eq!(ledger.tracked_identities(), 3);

        ledger.admit(&IdentityKey::User(4), t0 + secs(60));
        assert_eq!(ledger.tracked_identities(), 2);
        assert_eq!(
            ledger.recorded_requests(&IdentityKey::Origin("10.0.0.2".into()), t0 + secs(60)),
            1
        );

        ledger.admit(&IdentityKey::User(4), t0 + secs(120));
        assert_eq!(ledger.tracked_identities(), 1);
    }

    #[test]
    fn forgotten_identity_starts_fresh() {
        let ledger = Ledger::<String>::new(LedgerConfig {
            max_requests: 1,
            ..LedgerConfig::default()
        });
        let who = IdentityKey::User(9);
        let t0 = Instant::now();

        assert_eq!(ledger.admit(&who, t0), Admission::Allowed);
        assert!(matches!(ledger.admit(&who, t0 + secs(59)), Admission::Denied(_)));
        ledger.admit(&IdentityKey::User(10), t0 + secs(61));
        assert_eq!(ledger.admit(&who, t0 + secs(61)), Admission::Allowed);
    }

    #[test]
    fn cached_value_expires_after_ttl() {
        let ledger = ledger();
        let t0 = Instant::now();
        ledger.cache_put("k".into(), "v".into(), t0);

        assert_eq!(ledger.cache_get("k", t0), Some("v".to_string()));
        assert_eq!(ledger.cache_get("k", t0 + secs(299)), Some("v".to_string()));
        assert_eq!(ledger.cache_get("k", t0 + secs(300)), None);
        assert_eq!(ledger.cache_len(), 0);
    }

    #[test]
    fn overflow_evicts_oldest_insertion() {
        let ledger = ledger();
        let t0 = Instant::now();
        for i in 0..100u64 {
            ledger.cache_put(format!("k{i}"), format!("v{i}"), t0 + Duration::from_millis(i));
        }
        // reading does not refresh insertion time
        assert!(ledger.cache_get("k0", t0 + secs(1)).is_some());

        ledger.cache_put("k100".into(), "v100".into(), t0 + secs(1));

        assert_eq!(ledger.cache_len(), 100);
        assert_eq!(ledger.cache_get("k0", t0 + secs(1)), None);
        assert!(ledger.cache_get("k1", t0 + secs(1)).is_some());
        assert!(ledger.cache_get("k100", t0 + secs(1)).is_some());
    }

    #[test]
    fn cache_key_ignores_case_and_surrounding_whitespace() {
        assert_eq!(cache_key("  Show Rooms "), cache_key("show rooms"));
        assert_ne!(cache_key("show rooms"), cache_key("show properties"));
    }
}

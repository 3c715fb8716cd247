//! Fixed-window request limiter keyed by `<scope>:<client identity>`.
//!
//! State is process-local. Each call locks the map for the whole
//! read-modify-write, so two concurrent requests from one client can never both
//! slip past the ceiling inside a single process. Horizontal scaling needs an
//! external atomic counter behind the same `check_and_consume` contract.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use axum::http::HeaderMap;

/// Identity used when a request carries no forwarding headers.
/// All such clients share one bucket; this keeps the fallback fail-safe-low.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Logical operations with independent quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitScope {
    Chat,
    ResumeAnalysis,
    SkillRecommendation,
    InsightGeneration,
    SectionQa,
    DemoCvParse,
}

impl RateLimitScope {
    pub const ALL: [RateLimitScope; 6] = [
        RateLimitScope::Chat,
        RateLimitScope::ResumeAnalysis,
        RateLimitScope::SkillRecommendation,
        RateLimitScope::InsightGeneration,
        RateLimitScope::SectionQa,
        RateLimitScope::DemoCvParse,
    ];

    /// Suffix of the `RATE_LIMIT_<SCOPE>` override variable.
    pub fn env_suffix(self) -> &'static str {
        match self {
            RateLimitScope::Chat => "CHAT",
            RateLimitScope::ResumeAnalysis => "RESUME_ANALYSIS",
            RateLimitScope::SkillRecommendation => "SKILL_RECOMMENDATION",
            RateLimitScope::InsightGeneration => "INSIGHTS",
            RateLimitScope::SectionQa => "SECTION_QA",
            RateLimitScope::DemoCvParse => "DEMO_PARSE",
        }
    }

    pub fn key_prefix(self) -> &'static str {
        match self {
            RateLimitScope::Chat => "chat",
            RateLimitScope::ResumeAnalysis => "analyze-resume",
            RateLimitScope::SkillRecommendation => "recommend-skills",
            RateLimitScope::InsightGeneration => "insights",
            RateLimitScope::SectionQa => "section-qa",
            RateLimitScope::DemoCvParse => "demo-parse",
        }
    }

    /// Composite map key for a client within this scope.
    pub fn key_for(self, identity: &str) -> String {
        format!("{}:{identity}", self.key_prefix())
    }
}

/// `max` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub const fn per_minute(max: u32) -> Self {
        Self {
            max,
            window: Duration::from_secs(60),
        }
    }

    /// Parses `"<max>/<window_secs>"`, e.g. `"20/60"`.
    pub fn parse(raw: &str) -> Result<Self> {
        let (max, window) = raw
            .split_once('/')
            .with_context(|| format!("expected '<max>/<window_secs>', got '{raw}'"))?;
        let max: u32 = max.trim().parse().context("invalid max")?;
        let window_secs: u64 = window.trim().parse().context("invalid window")?;
        if max == 0 || window_secs == 0 {
            bail!("max and window must both be positive, got '{raw}'");
        }
        Ok(Self {
            max,
            window: Duration::from_secs(window_secs),
        })
    }
}

/// Per-endpoint policies.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub chat: RateLimitPolicy,
    pub resume_analysis: RateLimitPolicy,
    pub skill_recommendation: RateLimitPolicy,
    pub insight_generation: RateLimitPolicy,
    pub section_qa: RateLimitPolicy,
    pub demo_cv_parse: RateLimitPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            chat: RateLimitPolicy::per_minute(20),
            resume_analysis: RateLimitPolicy::per_minute(12),
            skill_recommendation: RateLimitPolicy::per_minute(12),
            insight_generation: RateLimitPolicy::per_minute(15),
            section_qa: RateLimitPolicy::per_minute(20),
            demo_cv_parse: RateLimitPolicy::per_minute(8),
        }
    }
}

impl RateLimitConfig {
    pub fn policy(&self, scope: RateLimitScope) -> RateLimitPolicy {
        match scope {
            RateLimitScope::Chat => self.chat,
            RateLimitScope::ResumeAnalysis => self.resume_analysis,
            RateLimitScope::SkillRecommendation => self.skill_recommendation,
            RateLimitScope::InsightGeneration => self.insight_generation,
            RateLimitScope::SectionQa => self.section_qa,
            RateLimitScope::DemoCvParse => self.demo_cv_parse,
        }
    }

    pub fn policy_mut(&mut self, scope: RateLimitScope) -> &mut RateLimitPolicy {
        match scope {
            RateLimitScope::Chat => &mut self.chat,
            RateLimitScope::ResumeAnalysis => &mut self.resume_analysis,
            RateLimitScope::SkillRecommendation => &mut self.skill_recommendation,
            RateLimitScope::InsightGeneration => &mut self.insight_generation,
            RateLimitScope::SectionQa => &mut self.section_qa,
            RateLimitScope::DemoCvParse => &mut self.demo_cv_parse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Entry left untouched; the window resets after `retry_after`.
    Rejected { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u32,
    reset_at: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check_and_consume(&self, key: &str, policy: RateLimitPolicy) -> RateDecision {
        self.check_and_consume_at(key, policy, Instant::now())
    }

    pub fn check_and_consume_at(
        &self,
        key: &str,
        policy: RateLimitPolicy,
        now: Instant,
    ) -> RateDecision {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get_mut(key) {
            if entry.reset_at > now {
                if entry.count < policy.max {
                    entry.count += 1;
                    return RateDecision::Allowed;
                }
                return RateDecision::Rejected {
                    retry_after: entry.reset_at - now,
                };
            }
        }

        entries.insert(
            key.to_string(),
            Entry {
                count: 1,
                reset_at: now + policy.window,
            },
        );
        RateDecision::Allowed
    }

    /// Drops entries whose window has elapsed. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.reset_at > now);
        before - entries.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Derives the client identity: first `x-forwarded-for` value, then
/// `x-real-ip`, then the shared [`UNKNOWN_CLIENT`] bucket.
pub fn client_identity(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        let first = forwarded.split(',').next().unwrap_or_default().trim();
        return if first.is_empty() {
            UNKNOWN_CLIENT.to_string()
        } else {
            first.to_string()
        };
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn policy(max: u32, window_ms: u64) -> RateLimitPolicy {
        RateLimitPolicy {
            max,
            window: Duration::from_millis(window_ms),
        }
    }

    #[test]
    fn test_window_reset() {
        let limiter = RateLimiter::new();
        let p = policy(2, 1000);
        let t0 = Instant::now();
        let key = RateLimitScope::Chat.key_for("1.2.3.4");

        assert_eq!(limiter.check_and_consume_at(&key, p, t0), RateDecision::Allowed);
        assert_eq!(
            limiter.check_and_consume_at(&key, p, t0 + Duration::from_millis(100)),
            RateDecision::Allowed
        );
        assert_eq!(
            limiter.check_and_consume_at(&key, p, t0 + Duration::from_millis(200)),
            RateDecision::Rejected {
                retry_after: Duration::from_millis(800)
            }
        );
        assert_eq!(
            limiter.check_and_consume_at(&key, p, t0 + Duration::from_millis(1100)),
            RateDecision::Allowed
        );
    }

    #[test]
    fn test_window_boundary_is_inclusive_reset() {
        let limiter = RateLimiter::new();
        let p = policy(1, 1000);
        let t0 = Instant::now();

        assert_eq!(limiter.check_and_consume_at("k", p, t0), RateDecision::Allowed);
        // reset_at <= now starts a fresh window
        assert_eq!(
            limiter.check_and_consume_at("k", p, t0 + Duration::from_millis(1000)),
            RateDecision::Allowed
        );
    }

    #[test]
    fn test_scopes_do_not_share_quota() {
        let limiter = RateLimiter::new();
        let p = policy(1, 60_000);
        let now = Instant::now();
        let chat = RateLimitScope::Chat.key_for("1.2.3.4");
        let insights = RateLimitScope::InsightGeneration.key_for("1.2.3.4");

        assert_eq!(chat, "chat:1.2.3.4");
        assert_eq!(insights, "insights:1.2.3.4");

        assert_eq!(limiter.check_and_consume_at(&chat, p, now), RateDecision::Allowed);
        assert!(matches!(
            limiter.check_and_consume_at(&chat, p, now),
            RateDecision::Rejected { .. }
        ));
        assert_eq!(
            limiter.check_and_consume_at(&insights, p, now),
            RateDecision::Allowed
        );
    }

    #[test]
    fn test_rejection_leaves_entry_unchanged() {
        let limiter = RateLimiter::new();
        let p = policy(1, 1000);
        let t0 = Instant::now();

        limiter.check_and_consume_at("k", p, t0);
        for ms in [10, 20, 30] {
            assert!(matches!(
                limiter.check_and_consume_at("k", p, t0 + Duration::from_millis(ms)),
                RateDecision::Rejected { .. }
            ));
        }
        // Rejections did not extend the window.
        assert_eq!(
            limiter.check_and_consume_at("k", p, t0 + Duration::from_millis(1000)),
            RateDecision::Allowed
        );
    }

    #[test]
    fn test_demo_parse_ninth_request_rejected() {
        let limiter = RateLimiter::new();
        let p = RateLimitConfig::default().policy(RateLimitScope::DemoCvParse);
        let key = RateLimitScope::DemoCvParse.key_for("9.9.9.9");
        let t0 = Instant::now();

        for i in 0..8 {
            assert_eq!(
                limiter.check_and_consume_at(&key, p, t0 + Duration::from_secs(i)),
                RateDecision::Allowed
            );
        }
        assert!(matches!(
            limiter.check_and_consume_at(&key, p, t0 + Duration::from_secs(9)),
            RateDecision::Rejected { .. }
        ));
    }

    #[test]
    fn test_purge_expired() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        limiter.check_and_consume_at("short", policy(5, 100), t0);
        limiter.check_and_consume_at("long", policy(5, 10_000), t0);
        assert_eq!(limiter.tracked_keys(), 2);

        let removed = limiter.purge_expired(t0 + Duration::from_millis(500));
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_policy_parse() {
        let p = RateLimitPolicy::parse("20/60").unwrap();
        assert_eq!(p, RateLimitPolicy::per_minute(20));
        assert!(RateLimitPolicy::parse("20").is_err());
        assert!(RateLimitPolicy::parse("0/60").is_err());
        assert!(RateLimitPolicy::parse("a/b").is_err());
    }

    #[test]
    fn test_default_policies() {
        let config = RateLimitConfig::default();
        assert_eq!(config.policy(RateLimitScope::Chat).max, 20);
        assert_eq!(config.policy(RateLimitScope::ResumeAnalysis).max, 12);
        assert_eq!(config.policy(RateLimitScope::SkillRecommendation).max, 12);
        assert_eq!(config.policy(RateLimitScope::InsightGeneration).max, 15);
        assert_eq!(config.policy(RateLimitScope::SectionQa).max, 20);
        assert_eq!(config.policy(RateLimitScope::DemoCvParse).max, 8);
    }

    #[test]
    fn test_client_identity_resolution() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_identity(&headers), UNKNOWN_CLIENT);

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_identity(&headers), "10.0.0.2");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"),
        );
        assert_eq!(client_identity(&headers), "203.0.113.7");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" , 10.0.0.1"));
        assert_eq!(client_identity(&headers), UNKNOWN_CLIENT);
    }
}

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::services::retry::RetryPolicy;

pub const DEFAULT_XP_REWARD: i64 = 100;
pub const DEFAULT_QR_TOKEN_TTL_MINUTES: i64 = 0;
pub const DEFAULT_REWARD_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_REWARD_MAX_RETRIES: usize = 3;

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub xp_reward: i64,
    /// Lifetime of freshly issued QR tokens. `None` means tokens never expire.
    pub qr_token_ttl: Option<chrono::Duration>,
    pub reward_queue_capacity: usize,
    pub reward_retry: RetryPolicy,
    /// Lower-cased emails honoured by the emergency admin override.
    pub emergency_admin_emails: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            xp_reward: DEFAULT_XP_REWARD,
            qr_token_ttl: None,
            reward_queue_capacity: DEFAULT_REWARD_QUEUE_CAPACITY,
            reward_retry: RetryPolicy::builder()
                .max_retries(DEFAULT_REWARD_MAX_RETRIES)
                .build(),
            emergency_admin_emails: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let xp_reward = parse_env("CHECKIN_XP_REWARD", DEFAULT_XP_REWARD);
        let ttl_minutes = parse_env("QR_TOKEN_TTL_MINUTES", DEFAULT_QR_TOKEN_TTL_MINUTES);
        let reward_queue_capacity =
            parse_env("REWARD_QUEUE_CAPACITY", DEFAULT_REWARD_QUEUE_CAPACITY).max(1);
        let max_retries = parse_env("REWARD_MAX_RETRIES", DEFAULT_REWARD_MAX_RETRIES);
        let initial_delay_ms = parse_env("REWARD_RETRY_INITIAL_DELAY_MS", 200u64);

        AppConfig {
            xp_reward,
            qr_token_ttl: token_ttl(ttl_minutes),
            reward_queue_capacity,
            reward_retry: RetryPolicy::builder()
                .max_retries(max_retries)
                .initial_delay(Duration::from_millis(initial_delay_ms))
                .build(),
            emergency_admin_emails: parse_email_list(
                &env::var("EMERGENCY_ADMIN_EMAILS").unwrap_or_default(),
            ),
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}; using {}", key, raw, default);
            default
        }),
        _ => default,
    }
}

/// `0` or less means tokens never expire. Values too large for a duration fall
/// back to the default.
fn token_ttl(minutes: i64) -> Option<chrono::Duration> {
    if minutes <= 0 {
        return None;
    }
    chrono::Duration::try_minutes(minutes).or_else(|| {
        warn!(
            "Ignoring QR_TOKEN_TTL_MINUTES={}; too large, using {}",
            minutes, DEFAULT_QR_TOKEN_TTL_MINUTES
        );
        token_ttl(DEFAULT_QR_TOKEN_TTL_MINUTES)
    })
}

pub fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|email| email.trim().to_ascii_lowercase())
        .filter(|email| !email.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_list_is_trimmed_and_lowercased() {
        assert_eq!(
            parse_email_list(" Ops@Example.com, ,root@example.com "),
            vec!["ops@example.com".to_string(), "root@example.com".to_string()]
        );
        assert!(parse_email_list("").is_empty());
    }

    #[test]
    fn oversized_token_ttl_falls_back_to_default() {
        assert_eq!(token_ttl(0), None);
        assert_eq!(token_ttl(-5), None);
        assert_eq!(token_ttl(90), Some(chrono::Duration::minutes(90)));
        assert_eq!(token_ttl(i64::MAX), None);
    }

    #[test]
    fn defaults_award_one_hundred_xp() {
        let config = AppConfig::default();
        assert_eq!(config.xp_reward, 100);
        assert!(config.qr_token_ttl.is_none());
        assert_eq!(config.reward_retry.max_retries, 3);
    }
}

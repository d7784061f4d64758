use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::warn;

use crate::Error;

/// Self-imposed suspension after a platform refuses us (403/429/quota).
///
/// Until the stored timestamp passes, [`ApiCooldown::check`] fails fast so no
/// request leaves the process.
pub struct ApiCooldown {
    platform: &'static str,
    window: Duration,
    until: Mutex<Option<DateTime<Utc>>>,
}

impl ApiCooldown {
    pub fn new(platform: &'static str, window: Duration) -> Self {
        Self {
            platform,
            window,
            until: Mutex::new(None),
        }
    }

    pub fn check(&self, now: DateTime<Utc>) -> Result<(), Error> {
        match *self.until.lock() {
            Some(until) if now < until => Err(Error::RateLimited {
                platform: self.platform.to_string(),
                until,
            }),
            _ => Ok(()),
        }
    }

    /// Start (or extend) the cooldown and return the error to propagate.
    pub fn trip(&self, now: DateTime<Utc>) -> Error {
        let until = now + self.window;
        *self.until.lock() = Some(until);
        warn!(
            "{} API refused the request; suspending calls until {}",
            self.platform, until
        );
        Error::RateLimited {
            platform: self.platform.to_string(),
            until,
        }
    }

    pub fn suspended_until(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.until.lock().filter(|until| *until > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_fails_until_window_passes() {
        let cooldown = ApiCooldown::new("youtube", Duration::hours(1));
        let now = Utc::now();
        assert!(cooldown.check(now).is_ok());

        let err = cooldown.trip(now);
        assert!(matches!(err, Error::RateLimited { .. }));
        assert!(cooldown.check(now + Duration::minutes(59)).is_err());
        assert!(cooldown.check(now + Duration::hours(1)).is_ok());
        assert_eq!(cooldown.suspended_until(now), Some(now + Duration::hours(1)));
        assert_eq!(cooldown.suspended_until(now + Duration::hours(2)), None);
    }
}

// File: src/services/stream_notifier/transition.rs
//
// Edge detection for one tracked streamer. Kept free of I/O so the whole table
// can be tested against plain timestamps.

use chrono::{DateTime, Duration, Utc};

use livecord_common::models::live_state::LiveState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierSettings {
    /// How long a Live entry may read offline before it is declared Offline.
    pub offline_grace: Duration,
    /// Minimum time between two live notifications for the same entry.
    pub renotify_cooldown: Duration,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            offline_grace: Duration::minutes(5),
            renotify_cooldown: Duration::minutes(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Offline (or unknown) to Live. `notify` is false inside the re-notify cooldown.
    GoLive { notify: bool },
    /// Live and still live; clears any pending grace window.
    StillLive,
    /// First offline reading while Live.
    StartGrace,
    /// Offline again but the grace window has not elapsed.
    InGrace,
    /// Offline past the grace window.
    GoOffline,
    NoChange,
}

pub fn decide(
    prev: Option<&LiveState>,
    live: bool,
    now: DateTime<Utc>,
    settings: &NotifierSettings,
) -> Transition {
    match (prev, live) {
        (Some(state), true) if state.is_live() => Transition::StillLive,
        (prev, true) => {
            let notify = match prev.and_then(|s| s.last_notified_at) {
                Some(at) => now - at >= settings.renotify_cooldown,
                None => true,
            };
            Transition::GoLive { notify }
        }
        (Some(state), false) if state.is_live() => match state.offline_since {
            None => Transition::StartGrace,
            Some(since) if now - since >= settings.offline_grace => Transition::GoOffline,
            Some(_) => Transition::InGrace,
        },
        (_, false) => Transition::NoChange,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecord_common::models::live_state::LiveStatus;

    fn live_state(now: DateTime<Utc>) -> LiveState {
        let mut s = LiveState::offline(now);
        s.status = LiveStatus::Live;
        s.last_notified_at = Some(now);
        s
    }

    #[test]
    fn unknown_and_offline_entries_go_live_with_notification() {
        let now = Utc::now();
        let settings = NotifierSettings::default();
        assert_eq!(decide(None, true, now, &settings), Transition::GoLive { notify: true });
        let off = LiveState::offline(now);
        assert_eq!(decide(Some(&off), true, now, &settings), Transition::GoLive { notify: true });
        assert_eq!(decide(Some(&off), false, now, &settings), Transition::NoChange);
        assert_eq!(decide(None, false, now, &settings), Transition::NoChange);
    }

    #[test]
    fn renotify_cooldown_suppresses_quick_restarts() {
        let start = Utc::now();
        let settings = NotifierSettings::default();
        let mut off = LiveState::offline(start);
        off.last_notified_at = Some(start);

        let soon = start + Duration::minutes(9);
        assert_eq!(decide(Some(&off), true, soon, &settings), Transition::GoLive { notify: false });
        let later = start + Duration::minutes(10);
        assert_eq!(decide(Some(&off), true, later, &settings), Transition::GoLive { notify: true });
    }

    #[test]
    fn offline_needs_grace_and_a_second_reading() {
        let start = Utc::now();
        let settings = NotifierSettings::default();
        let mut state = live_state(start);

        assert_eq!(decide(Some(&state), false, start, &settings), Transition::StartGrace);
        state.offline_since = Some(start);
        assert_eq!(
            decide(Some(&state), false, start + Duration::minutes(3), &settings),
            Transition::InGrace
        );
        assert_eq!(
            decide(Some(&state), true, start + Duration::minutes(3), &settings),
            Transition::StillLive
        );
        assert_eq!(
            decide(Some(&state), false, start + Duration::minutes(5), &settings),
            Transition::GoOffline
        );
    }
}

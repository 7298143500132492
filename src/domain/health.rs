// Health evaluation - staleness and title checks for the displayed surface
use chrono::NaiveDateTime;

/// Outcome of one health check. Produced fresh every check, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthVerdict {
    Healthy,
    Stale(String),
    Unreachable(String),
}

/// Judge the currently displayed surface.
///
/// Two independent signals, checked in order: elapsed time since the last
/// healthy observation (a frozen page keeps its title while its data stops
/// refreshing), then an expected-title substring match (a crashed or
/// navigated-away page can still look "fresh" from the outside). On
/// `Healthy` the caller must set `last_healthy_at = now`.
pub fn evaluate(
    last_healthy_at: NaiveDateTime,
    now: NaiveDateTime,
    refresh_interval_minutes: u32,
    tolerance_minutes: u32,
    expected_title: &str,
    observed_title: &str,
) -> HealthVerdict {
    let allowed_seconds = i64::from(refresh_interval_minutes + tolerance_minutes) * 60;
    let elapsed_seconds = (now - last_healthy_at).num_seconds();

    if elapsed_seconds > allowed_seconds {
        return HealthVerdict::Stale("no refresh observed".to_string());
    }

    if !observed_title.contains(expected_title) {
        return HealthVerdict::Unreachable("title mismatch".to_string());
    }

    HealthVerdict::Healthy
}

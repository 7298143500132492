// Rotation schedule - maps wall-clock time to the dashboard that belongs on screen
use super::dashboard::DashboardSpec;
use chrono::{NaiveTime, Timelike};

/// Pick the dashboard for a given wall-clock time.
///
/// Minutes since local midnight are divided into fixed-length slots of
/// `switch_interval_minutes`; the slot number cycles through `dashboards`
/// with modulo. The same time within a slot always yields the same
/// dashboard, independent of process restarts. When 1440 is not divisible
/// by the interval the last slot of the day is shorter; that is accepted,
/// not corrected.
///
/// `dashboards` must be non-empty; this is validated once at startup.
pub fn select_dashboard<'a>(
    now: NaiveTime,
    dashboards: &'a [DashboardSpec],
    switch_interval_minutes: u32,
) -> &'a DashboardSpec {
    let minutes_since_midnight = now.hour() * 60 + now.minute();
    let slot = minutes_since_midnight / switch_interval_minutes;
    let index = slot as usize % dashboards.len();
    &dashboards[index]
}

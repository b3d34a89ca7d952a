//! Window scheduler
//! Sleeps until each occurrence of a floating period begins, runs a hook once
//! per occurrence, then sleeps until the occurrence ends.

use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::period::{FloatingPeriod, Window};

/// Floor for any sleep, so boundary rounding never spins the loop
pub const MIN_SLEEP: Duration = Duration::from_millis(250);

/// What the loop does next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Inside this occurrence right now
    Enter(Window),
    /// Outside; the next occurrence starts after this long
    Wait(Duration),
}

/// Testable version: decide the next step at `now`.
/// Returns None only if no occurrence starts within the lookahead.
pub fn next_step(period: &FloatingPeriod, now: DateTime<Utc>) -> Option<Step> {
    if let Some(window) = period.window_at(&now) {
        return Some(Step::Enter(window));
    }
    let next = period.next_window(&now)?;
    Some(Step::Wait(sleep_duration(now, &next.start)))
}

/// Span from `from` to `to`, zero if `to` is already past
pub fn sleep_duration<T: TimeZone>(from: DateTime<Utc>, to: &DateTime<T>) -> Duration {
    to.with_timezone(&Utc)
        .signed_duration_since(from)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Format duration for logging
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Run the scheduler loop until `cancel` fires
pub async fn run_scheduler<F, Fut>(
    period: FloatingPeriod,
    label: &str,
    cancel: CancellationToken,
    mut on_enter: F,
) where
    F: FnMut(Window) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    info!("Scheduler started for {} ({})", label, period);

    // Timers can fire a hair early; never run the hook twice for one occurrence
    let mut last_entered: Option<Window> = None;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let now = Utc::now();
        let wait = match next_step(&period, now) {
            Some(Step::Enter(window)) => {
                if last_entered != Some(window) {
                    info!("{} active until {}", label, window.end.to_rfc3339());
                    on_enter(window).await;
                    last_entered = Some(window);
                } else {
                    debug!("Already handled {} window starting {}", label, window.start.to_rfc3339());
                }
                sleep_duration(Utc::now(), &window.end)
            }
            Some(Step::Wait(wait)) => {
                info!("Next {} window in {}", label, format_duration(wait));
                wait
            }
            None => {
                warn!("No upcoming {} window found, stopping scheduler", label);
                break;
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(wait.max(MIN_SLEEP)) => {}
        }
    }

    info!("Scheduler stopped for {}", label);
}

/*!
 * Build Timing
 * The final status line printed after a build action
 */

use std::time::Duration;

/// `Time: 1m 5.250s` from one minute up, `Time: 42.000s` below
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    let minutes = (total / 60.0).floor() as u64;
    let seconds = total - (minutes as f64 * 60.0);

    if minutes > 0 {
        format!("Time: {}m {:05.3}s", minutes, seconds)
    } else {
        format!("Time: {:05.3}s", seconds)
    }
}

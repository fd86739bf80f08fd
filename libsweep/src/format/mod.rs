//! Human-readable formatting of ages and durations.

use chrono::Duration;


/// Formats a tag age as `"N days, M hours"`.
///
/// # Examples
///
/// ```
/// use libsweep::format::format_age;
///
/// assert_eq!(format_age(3, 4), "3 days, 4 hours");
/// assert_eq!(format_age(1, 1), "1 day, 1 hour");
/// ```
pub fn format_age(days: i64, hours: i64) -> String {
    format!(
        "{} {}, {} {}",
        days,
        plural(days, "day"),
        hours,
        plural(hours, "hour")
    )
}

/// Formats a grace period back into the `<N>hr<N>m<N>s` form it is parsed
/// from, omitting zero components.
///
/// # Examples
///
/// ```
/// use libsweep::format::format_grace;
/// use chrono::Duration;
///
/// assert_eq!(format_grace(Duration::minutes(90)), "1hr30m");
/// assert_eq!(format_grace(Duration::zero()), "0s");
/// ```
pub fn format_grace(grace: Duration) -> String {
    let total = grace.num_seconds();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}hr"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 || out.is_empty() {
        out.push_str(&format!("{seconds}s"));
    }
    out
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

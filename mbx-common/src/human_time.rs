//! Human-readable time formatting
//!
//! Used for uptime display in the host diagnostics endpoint.

/// Seconds in a day; values at or above this switch to the day-prefixed format
const DAY_FORMAT_MIN: u64 = 86_400;

/// Format a duration in seconds as `H:MM:SS`, or `Dd-H:MM:SS` for
/// durations of a day or more.
///
/// # Examples
///
/// ```
/// use mbx_common::human_time::format_uptime;
///
/// assert_eq!(format_uptime(45), "0:00:45");
/// assert_eq!(format_uptime(3661), "1:01:01");
/// assert_eq!(format_uptime(90000), "1d-1:00:00");
/// ```
pub fn format_uptime(seconds: u64) -> String {
    let (days, rem) = (seconds / DAY_FORMAT_MIN, seconds % DAY_FORMAT_MIN);
    let hours = rem / 3600;
    let mins = (rem % 3600) / 60;
    let secs = rem % 60;

    if days > 0 {
        format!("{}d-{}:{:02}:{:02}", days, hours, mins, secs)
    } else {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    }
}

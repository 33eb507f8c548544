//! Human-readable time formatting for log output

/// Format a millisecond position as `HH:MM:SS`
///
/// Negative values are prefixed with `-`.
///
/// # Examples
///
/// ```
/// use fling_common::human_time::format_clock;
///
/// assert_eq!(format_clock(0), "00:00:00");
/// assert_eq!(format_clock(5_000), "00:00:05");
/// assert_eq!(format_clock(3_723_000), "01:02:03");
/// ```
pub fn format_clock(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let total_secs = ms.unsigned_abs() / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)
}

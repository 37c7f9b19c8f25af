//! Wall-clock helper for the `get_current_date_and_time` tool.

/// `strftime` pattern of [`current_timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time as `YYYY-MM-DD HH:MM:SS`.
pub fn current_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

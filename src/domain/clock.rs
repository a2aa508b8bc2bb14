use std::time::SystemTime;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// `MM-DD HH:MM` in the given offset, as shown in list rows and listing output.
pub fn format_list_time(moment: SystemTime, offset: UtcOffset) -> String {
    let format = format_description!("[month]-[day] [hour]:[minute]");
    OffsetDateTime::from(moment)
        .to_offset(offset)
        .format(&format)
        .unwrap_or_else(|_| "??-?? ??:??".to_string())
}

/// The local offset, falling back to UTC where it cannot be determined.
///
/// Must run before any other thread is spawned for the lookup to succeed on Unix.
pub fn resolve_local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

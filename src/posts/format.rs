//! Display formatting for the pt-BR site.

use chrono::{DateTime, Datelike, Timelike, Utc};

const MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

const TITLE_PREVIEW_CHARS: usize = 15;

/// `25 mar 2021`
pub fn format_date(date: &DateTime<Utc>) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

/// `25 mar 2021, às 19:25`
pub fn format_datetime(date: &DateTime<Utc>) -> String {
    format!(
        "{}, às {:02}:{:02}",
        format_date(date),
        date.hour(),
        date.minute()
    )
}

pub fn format_optional_date(date: Option<&DateTime<Utc>>) -> String {
    date.map(format_date).unwrap_or_default()
}

/// First characters of a title for the previous/next links.
pub fn truncate_title(title: &str) -> String {
    let mut preview: String = title.chars().take(TITLE_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

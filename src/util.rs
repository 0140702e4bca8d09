use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

/// Parse the backend's timestamps: RFC 3339 when a zone is present,
/// otherwise a naive ISO timestamp interpreted in local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

pub fn format_relative(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    let seconds = elapsed.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    if seconds < 3600 {
        return format!("{} min ago", elapsed.num_minutes());
    }
    if seconds < 86_400 {
        return format!("{} h ago", elapsed.num_hours());
    }
    if seconds < 604_800 {
        return format!("{} d ago", elapsed.num_days());
    }
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .expect("fixture timestamp should parse")
            .with_timezone(&Utc)
    }

    #[test]
    fn relative_time_buckets() {
        let now = now();
        assert_eq!(format_relative(now - Duration::seconds(30), now), "just now");
        assert_eq!(format_relative(now - Duration::minutes(5), now), "5 min ago");
        assert_eq!(format_relative(now - Duration::hours(3), now), "3 h ago");
        assert_eq!(format_relative(now - Duration::days(2), now), "2 d ago");
    }

    #[test]
    fn old_timestamps_fall_back_to_a_full_date() {
        let now = now();
        let formatted = format_relative(now - Duration::days(30), now);
        // Rendered in local time, so the day may shift by one around the fixture.
        assert!(formatted.starts_with("2025-05-0"));
    }

    #[test]
    fn parses_rfc3339_and_naive_iso_timestamps() {
        assert!(parse_timestamp("2025-06-01T12:00:00Z").is_some());
        assert!(parse_timestamp("2025-06-01T12:00:00.123456").is_some());
        assert!(parse_timestamp("not a timestamp").is_none());
    }

    #[test]
    fn truncate_respects_character_boundaries() {
        assert_eq!(truncate_text("short", 25), "short");
        assert_eq!(truncate_text("abcdefghij", 4), "abcd...");
        assert_eq!(truncate_text("héllo wörld", 5), "héllo...");
    }
}

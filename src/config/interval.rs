use std::time::Duration;

/// Parse an interval such as `1h`, `30m`, `45s`, `1d` or raw seconds.
pub fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();

    let secs = if let Some(hours) = s.strip_suffix('h') {
        scaled(hours, 3600, "hours")?
    } else if let Some(minutes) = s.strip_suffix('m') {
        scaled(minutes, 60, "minutes")?
    } else if let Some(days) = s.strip_suffix('d') {
        scaled(days, 86400, "days")?
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>()
            .map_err(|_| format!("Invalid seconds: {}", secs))?
    } else {
        s.parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '1h', '30m', '1d'", s))?
    };

    if secs == 0 {
        return Err("Interval must be greater than zero".to_string());
    }
    Ok(Duration::from_secs(secs))
}

fn scaled(count: &str, unit_secs: u64, unit: &str) -> Result<u64, String> {
    count
        .parse::<u64>()
        .map_err(|_| format!("Invalid {}: {}", unit, count))?
        .checked_mul(unit_secs)
        .ok_or_else(|| format!("Interval too large: {}{}", count, &unit[..1]))
}

/// Render an interval for log lines, using the largest whole unit.
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if interval.subsec_millis() != 0 || secs == 0 {
        format!("{}ms", interval.as_millis())
    } else if secs.is_multiple_of(86400) {
        format!("{}d", secs / 86400)
    } else if secs.is_multiple_of(3600) {
        format!("{}h", secs / 3600)
    } else if secs.is_multiple_of(60) {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

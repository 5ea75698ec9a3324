/// Renders seconds as a `M:SS` clock face.
pub fn format_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Toast text shown after an extension is granted. `granted_seconds` is
/// what was actually added, which is less than the increment when clamped.
pub fn time_added_message(granted_seconds: u64, remaining_seconds: u64) -> String {
    format!(
        "Added {} ({} total)",
        duration_label(granted_seconds),
        remaining_seconds.div_ceil(60)
    )
}

/// Toast text shown when a request lands inside the cooldown.
pub fn cooldown_message(cooldown_ms: u64) -> String {
    match cooldown_ms.div_ceil(1000) {
        60 => "You can only request time once a minute".to_string(),
        seconds => format!("You can only request time every {}", duration_label(seconds)),
    }
}

pub fn at_maximum_message(max_minutes: u64) -> String {
    format!("This call is already at the {max_minutes} minute limit")
}

/// Whole minutes when the value divides evenly, seconds otherwise.
fn duration_label(seconds: u64) -> String {
    let (amount, unit) = if seconds > 0 && seconds % 60 == 0 {
        (seconds / 60, "minute")
    } else {
        (seconds, "second")
    };
    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_face_pads_seconds_only() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(59), "0:59");
        assert_eq!(format_time(300), "5:00");
        assert_eq!(format_time(1199), "19:59");
    }

    #[test]
    fn added_message_reports_rounded_total() {
        assert_eq!(time_added_message(300, 600), "Added 5 minutes (10 total)");
        assert_eq!(time_added_message(300, 1150), "Added 5 minutes (20 total)");
        assert_eq!(time_added_message(60, 61), "Added 1 minute (2 total)");
        assert_eq!(time_added_message(45, 1200), "Added 45 seconds (20 total)");
    }

    #[test]
    fn cooldown_message_uses_minutes() {
        assert_eq!(
            cooldown_message(300_000),
            "You can only request time every 5 minutes"
        );
        assert_eq!(
            cooldown_message(60_000),
            "You can only request time once a minute"
        );
        assert_eq!(
            cooldown_message(90_000),
            "You can only request time every 90 seconds"
        );
    }

    #[test]
    fn short_cooldown_is_rendered_in_seconds() {
        assert_eq!(
            cooldown_message(30_000),
            "You can only request time every 30 seconds"
        );
        assert_eq!(
            cooldown_message(1),
            "You can only request time every 1 second"
        );
    }

    #[test]
    fn at_maximum_message_names_the_limit() {
        assert_eq!(
            at_maximum_message(20),
            "This call is already at the 20 minute limit"
        );
    }
}

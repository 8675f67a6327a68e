//! 距离与时长的展示格式。

pub fn format_distance(meters: f64) -> String {
    if !meters.is_finite() || meters <= 0.0 {
        return "0 km".to_string();
    }

    if meters < 1_000.0 {
        return format!("{} m", meters.round() as u64);
    }

    let kilometers = meters / 1_000.0;
    if kilometers < 10.0 {
        return format!("{kilometers:.1} km");
    }

    format!("{} km", kilometers.round() as u64)
}

pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0m".to_string();
    }

    let total = seconds as u64;
    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;

    match (hours, minutes) {
        (0, minutes) => format!("{minutes}m"),
        (hours, 0) => format!("{hours}h"),
        (hours, minutes) => format!("{hours}h {minutes}m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_switches_units_at_one_kilometer() {
        assert_eq!(format_distance(0.0), "0 km");
        assert_eq!(format_distance(-5.0), "0 km");
        assert_eq!(format_distance(130.0), "130 m");
        assert_eq!(format_distance(1_240.0), "1.2 km");
        assert_eq!(format_distance(12_600.0), "13 km");
    }

    #[test]
    fn duration_drops_empty_components() {
        assert_eq!(format_duration(0.0), "0m");
        assert_eq!(format_duration(80.0), "1m");
        assert_eq!(format_duration(7_200.0), "2h");
        assert_eq!(format_duration(5_460.0), "1h 31m");
    }
}

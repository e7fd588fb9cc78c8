//! Number formatting shared by axis ticks and bar annotations.

/// Axis tick label: `1.5M`, `2.3K`, `42`
pub fn format_axis(value: f64) -> String {
    if value.abs() >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value.abs() >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{value:.0}")
    }
}

/// Short label drawn above a bar, coarser than [`format_axis`] from 10K up
pub fn format_bar(value: f64) -> String {
    if value.abs() >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value.abs() >= 10_000.0 {
        format!("{:.0}K", value / 1_000.0)
    } else if value.abs() >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else if value.abs() >= 10.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Latency annotation, never abbreviated
pub fn format_millis(value: f64) -> String {
    format!("{value:.1}ms")
}

/// Tick label for latency axes
pub fn format_fixed(value: f64) -> String {
    if value.abs() >= 10.0 {
        format!("{value:.0}")
    } else if value.abs() >= 1.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_labels() {
        assert_eq!(format_axis(1_500_000.0), "1.5M");
        assert_eq!(format_axis(2_300.0), "2.3K");
        assert_eq!(format_axis(42.0), "42");
        assert_eq!(format_axis(999.4), "999");
        assert_eq!(format_axis(-12_500.0), "-12.5K");
        assert_eq!(format_axis(0.0), "0");
    }

    #[test]
    fn bar_labels() {
        assert_eq!(format_bar(1_500_000.0), "1.5M");
        assert_eq!(format_bar(23_400.0), "23K");
        assert_eq!(format_bar(2_300.0), "2.3K");
        assert_eq!(format_bar(42.0), "42");
        assert_eq!(format_bar(4.257), "4.26");
    }

    #[test]
    fn latency_labels() {
        assert_eq!(format_millis(12.345), "12.3ms");
        assert_eq!(format_fixed(0.5), "0.50");
        assert_eq!(format_fixed(2.5), "2.5");
        assert_eq!(format_fixed(120.0), "120");
    }
}

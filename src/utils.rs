use chrono::Duration;
use tracing_subscriber::{EnvFilter, fmt};

#[macro_export]
macro_rules! dlog {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

/// Initialize colorful logging.
///
/// Default level is INFO.
/// - `-v` => DEBUG
/// - `-vv` => TRACE
/// - `-q` => WARN
/// - `-qq` => ERROR
///
/// `RUST_LOG` overrides everything (e.g. `RUST_LOG=trace`).
pub fn init_logging(verbose: u8, quiet: u8) {
    let net = i16::from(verbose) - i16::from(quiet);
    let level = match net {
        i16::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        2..=i16::MAX => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,trailmark={level}")));

    let show_src = matches!(level, "debug" | "trace");

    fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_file(show_src)
        .with_line_number(show_src)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Round to one decimal place.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// `HH:MM:SS` for a duration given in (possibly fractional) minutes;
/// `--:--:--` when it does not fit a clock.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn format_minutes(minutes: f64) -> String {
    let ms = (minutes * 60_000.0).round();
    // NaN fails both comparisons.
    if !(ms > i64::MIN as f64 && ms < i64::MAX as f64) {
        return "--:--:--".to_string();
    }
    Duration::try_milliseconds(ms as i64).map_or_else(|| "--:--:--".to_string(), format_duration)
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds().unsigned_abs();
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Parse one form field the way a user types it: surrounding blanks are
/// ignored, an empty field is not a number.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_one_decimal() {
        assert!((round1(6.0) - 6.0).abs() < f64::EPSILON);
        assert!((round1(5.476) - 5.5).abs() < f64::EPSILON);
        assert!((round1(0.333_33) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn formats_minutes_as_clock() {
        assert_eq!(format_minutes(30.0), "00:30:00");
        assert_eq!(format_minutes(95.5), "01:35:30");
        assert_eq!(format_minutes(-1e300), "--:--:--");
        assert_eq!(format_minutes(1e300), "--:--:--");
        assert_eq!(format_minutes(f64::NAN), "--:--:--");
    }

    #[test]
    fn parses_form_numbers() {
        assert_eq!(parse_number(" 5 "), Some(5.0));
        assert_eq!(parse_number("-200"), Some(-200.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert!(parse_number("inf").is_some_and(f64::is_infinite));
    }
}

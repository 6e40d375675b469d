use crate::dlog;
use crate::error::GeolocationError;
use crate::session::{FormValues, Geolocation, MapView, Notifier, WorkoutForm, WorkoutList};
use crate::types::{ActivityType, Coords, Workout, WorkoutKind};
use crate::utils::format_minutes;

/// Position given up front (command line), or none at all.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Option<Coords>);

impl Geolocation for FixedPosition {
    fn request_position(&mut self) -> Result<Coords, GeolocationError> {
        self.0
            .ok_or_else(|| GeolocationError::new("no position given (use --lat/--lng or --gpx)"))
    }
}

#[derive(Debug, Default)]
pub struct TerminalMap;

impl MapView for TerminalMap {
    fn initialize(&mut self, center: Coords, zoom: f64) {
        println!("🗺  map at {center} (zoom {zoom})");
    }

    fn set_view(&mut self, center: Coords, zoom: f64, animate: bool) {
        dlog!("set_view animate={animate}");
        println!("🗺  map moved to {center} (zoom {zoom})");
    }

    fn add_marker(&mut self, coords: Coords, popup: &str, style_class: &str) {
        dlog!("marker class={style_class}");
        println!("📍 {coords}  {popup}");
    }

    fn listen_for_clicks(&mut self) {
        dlog!("map clicks enabled");
    }
}

/// Form whose fields were filled in on the command line.
#[derive(Debug, Default)]
pub struct PresetForm {
    values: FormValues,
}

impl PresetForm {
    pub const fn new(values: FormValues) -> Self {
        Self { values }
    }
}

impl WorkoutForm for PresetForm {
    fn values(&self) -> FormValues {
        self.values.clone()
    }

    fn show(&mut self) {
        dlog!("form shown");
    }

    fn hide(&mut self) {
        dlog!("form hidden");
    }

    fn reset(&mut self) {
        self.values = FormValues {
            activity: self.values.activity,
            ..FormValues::default()
        };
    }

    fn focus_first_field(&mut self) {
        dlog!("focus distance field");
    }

    fn show_fields_for(&mut self, activity: ActivityType) {
        dlog!("form fields for {activity}");
        self.values.activity = activity;
    }
}

#[derive(Debug, Default)]
pub struct TerminalList;

impl WorkoutList for TerminalList {
    fn append_entry(&mut self, workout: &Workout) {
        println!("{}", render_entry(workout));
    }
}

/// Prints notices to stderr, or only logs them at debug level when `quiet`
/// (read-only listing, where a missing position does not matter).
#[derive(Debug, Default)]
pub struct TerminalNotifier {
    pub quiet: bool,
}

impl TerminalNotifier {
    fn line(&self, message: &str) -> Option<String> {
        (!self.quiet).then(|| format!("⚠️  {message}"))
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&mut self, message: &str) {
        match self.line(message) {
            Some(line) => eprintln!("{line}"),
            None => dlog!("notice: {message}"),
        }
    }
}

/// Two-line list entry: title with id, then the numbers.
pub fn render_entry(w: &Workout) -> String {
    let activity = w.activity();
    let details = match *w.kind() {
        WorkoutKind::Running { cadence, pace } => {
            format!("⚡️ {pace:.1} min/km  🦶🏼 {cadence} spm")
        }
        WorkoutKind::Cycling {
            elevation_gain,
            speed,
        } => format!("⚡️ {speed:.1} km/h  ⛰ {elevation_gain} m"),
    };
    format!(
        "[{}] {} {}\n    {} {} km  ⏱ {}  {details}  👆 {}",
        w.id(),
        activity.emoji(),
        w.description(),
        activity.emoji(),
        w.distance(),
        format_minutes(w.duration()),
        w.interaction_count()
    )
}

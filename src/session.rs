use crate::dlog;
use crate::error::{GeolocationError, InvalidInputError, SessionError};
use crate::store::WorkoutStore;
use crate::types::{ActivityType, Coords, Workout, WorkoutId, create_cycling, create_running};
use crate::utils::parse_number;
use std::fmt;

/// Zoom level for the initial view and for every pan to a workout.
pub const MAP_ZOOM: f64 = 13.0;

pub trait Geolocation {
    fn request_position(&mut self) -> Result<Coords, GeolocationError>;
}

pub trait MapView {
    fn initialize(&mut self, center: Coords, zoom: f64);
    fn set_view(&mut self, center: Coords, zoom: f64, animate: bool);
    fn add_marker(&mut self, coords: Coords, popup: &str, style_class: &str);
    /// Start delivering surface clicks as [`Event::MapClicked`].
    fn listen_for_clicks(&mut self);
}

/// Raw field contents of the workout form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    pub activity: ActivityType,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation_gain: String,
}

pub trait WorkoutForm {
    fn values(&self) -> FormValues;
    fn show(&mut self);
    fn hide(&mut self);
    fn reset(&mut self);
    fn focus_first_field(&mut self);
    /// Show cadence for running, elevation gain for cycling.
    fn show_fields_for(&mut self, activity: ActivityType);
}

pub trait WorkoutList {
    fn append_entry(&mut self, workout: &Workout);
}

/// User-visible notices (rejected input, no position).
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

pub struct Ui {
    pub map: Box<dyn MapView>,
    pub form: Box<dyn WorkoutForm>,
    pub list: Box<dyn WorkoutList>,
    pub notifier: Box<dyn Notifier>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub zoom: f64,
    /// Persist the collection after each list selection so interaction counts
    /// survive a restart.
    pub persist_on_select: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            zoom: MAP_ZOOM,
            persist_on_select: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Locating,
    MapReady,
    FormOpen,
    Submitting,
    /// No position fix; existing workouts can be browsed, none can be added.
    Unavailable,
}

impl Phase {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Locating => "locating",
            Self::MapReady => "map ready",
            Self::FormOpen => "form open",
            Self::Submitting => "submitting",
            Self::Unavailable => "position unavailable",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    PositionFixed(Coords),
    PositionFailed(GeolocationError),
    MapClicked(Coords),
    FormSubmitted,
    ActivityToggled(ActivityType),
    EntrySelected(WorkoutId),
}

impl Event {
    const fn name(&self) -> &'static str {
        match self {
            Self::PositionFixed(_) => "position fix",
            Self::PositionFailed(_) => "position failure",
            Self::MapClicked(_) => "map click",
            Self::FormSubmitted => "form submit",
            Self::ActivityToggled(_) => "activity toggle",
            Self::EntrySelected(_) => "list selection",
        }
    }
}

pub struct SessionController {
    phase: Phase,
    store: WorkoutStore,
    geolocation: Box<dyn Geolocation>,
    ui: Ui,
    config: SessionConfig,
    pending: Option<Coords>,
    center: Option<Coords>,
    location_error: Option<GeolocationError>,
}

impl SessionController {
    pub fn new(
        store: WorkoutStore,
        geolocation: Box<dyn Geolocation>,
        ui: Ui,
        config: SessionConfig,
    ) -> Self {
        Self {
            phase: Phase::Idle,
            store,
            geolocation,
            ui,
            config,
            pending: None,
            center: None,
            location_error: None,
        }
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn store(&self) -> &WorkoutStore {
        &self.store
    }

    /// Coordinates of the map click the open form belongs to.
    pub const fn pending_coords(&self) -> Option<Coords> {
        self.pending
    }

    /// Position fix the map was opened at.
    pub const fn map_center(&self) -> Option<Coords> {
        self.center
    }

    /// Restore and list stored workouts, then ask for a position once.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Idle {
            return Err(self.not_accepted("start"));
        }

        self.store.restore();
        for workout in self.store.all() {
            self.ui.list.append_entry(workout);
        }

        self.enter(Phase::Locating);
        let event = match self.geolocation.request_position() {
            Ok(center) => Event::PositionFixed(center),
            Err(e) => Event::PositionFailed(e),
        };
        self.handle(event)
    }

    pub fn handle(&mut self, event: Event) -> Result<(), SessionError> {
        dlog!("event={} phase={}", event.name(), self.phase);
        match event {
            Event::PositionFixed(center) => {
                self.on_position(Ok(center));
                Ok(())
            }
            Event::PositionFailed(e) => {
                self.on_position(Err(e));
                Ok(())
            }
            Event::MapClicked(coords) => self.on_map_click(coords),
            Event::FormSubmitted => self.on_submit(),
            Event::ActivityToggled(activity) => {
                self.on_toggle(activity);
                Ok(())
            }
            Event::EntrySelected(id) => {
                self.on_select(id);
                Ok(())
            }
        }
    }

    fn on_position(&mut self, result: Result<Coords, GeolocationError>) {
        if self.phase != Phase::Locating {
            dlog!("ignoring late position result in phase={}", self.phase);
            return;
        }

        match result {
            Ok(center) => {
                self.ui.map.initialize(center, self.config.zoom);
                self.center = Some(center);
                for workout in self.store.all() {
                    add_marker(self.ui.map.as_mut(), workout);
                }
                self.ui.map.listen_for_clicks();
                tracing::info!(center = %center, markers = self.store.len(), "map ready");
                self.enter(Phase::MapReady);
            }
            Err(e) => {
                tracing::warn!(err = %e, "geolocation failed; new workouts disabled");
                self.ui.notifier.notify(&e.to_string());
                self.location_error = Some(e);
                self.enter(Phase::Unavailable);
            }
        }
    }

    fn on_map_click(&mut self, coords: Coords) -> Result<(), SessionError> {
        self.ensure_located()?;
        if !matches!(self.phase, Phase::MapReady | Phase::FormOpen) {
            return Err(self.not_accepted("map click"));
        }
        self.pending = Some(coords);
        self.ui.form.show();
        self.ui.form.focus_first_field();
        self.enter(Phase::FormOpen);
        Ok(())
    }

    fn on_toggle(&mut self, activity: ActivityType) {
        self.ui.form.show_fields_for(activity);
    }

    fn on_submit(&mut self) -> Result<(), SessionError> {
        self.ensure_located()?;
        if self.phase != Phase::FormOpen {
            return Err(self.not_accepted("form submit"));
        }
        let Some(coords) = self.pending else {
            return Err(self.not_accepted("form submit"));
        };
        self.enter(Phase::Submitting);

        let values = self.ui.form.values();
        let workout = match build_workout(&values, coords) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(err = %e, activity = %values.activity, "workout rejected");
                self.ui.notifier.notify(&e.to_string());
                self.enter(Phase::FormOpen);
                return Err(e.into());
            }
        };
        self.commit(workout)
    }

    /// Append, render, close the form, then persist.
    fn commit(&mut self, workout: Workout) -> Result<(), SessionError> {
        if let Err(e) = self.store.append(workout.clone()) {
            tracing::error!(err = %e, "workout id collision");
            self.enter(Phase::FormOpen);
            return Err(e.into());
        }
        tracing::info!(
            id = %workout.id(),
            kind = %workout.activity(),
            description = workout.description(),
            "workout created"
        );

        self.ui.list.append_entry(&workout);
        add_marker(self.ui.map.as_mut(), &workout);
        self.ui.form.hide();
        self.ui.form.reset();
        self.pending = None;
        self.enter(Phase::MapReady);

        if let Err(e) = self.store.persist() {
            tracing::error!(err = %e, "saving workouts failed");
            self.ui.notifier.notify("Could not save your workouts.");
            return Err(e.into());
        }
        Ok(())
    }

    fn on_select(&mut self, id: WorkoutId) {
        let Some(workout) = self.store.record_interaction(id) else {
            dlog!("selection of unknown workout id={id}");
            return;
        };
        let (coords, clicks) = (workout.coords(), workout.interaction_count());
        dlog!("selected id={id} clicks={clicks}");

        if self.center.is_some() {
            self.ui.map.set_view(coords, self.config.zoom, true);
        }

        if self.config.persist_on_select
            && let Err(e) = self.store.persist()
        {
            tracing::warn!(err = %e, "saving interaction count failed");
        }
    }

    /// New workouts need a map, and the map needs a position fix.
    fn ensure_located(&self) -> Result<(), SessionError> {
        match &self.location_error {
            Some(e) => Err(e.clone().into()),
            None => Ok(()),
        }
    }

    fn enter(&mut self, next: Phase) {
        dlog!("phase {} -> {}", self.phase, next);
        self.phase = next;
    }

    const fn not_accepted(&self, event: &'static str) -> SessionError {
        SessionError::NotAccepted {
            event,
            phase: self.phase.name(),
        }
    }
}

fn add_marker(map: &mut dyn MapView, workout: &Workout) {
    let activity = workout.activity();
    let popup = format!("{} {}", activity.emoji(), workout.description());
    map.add_marker(workout.coords(), &popup, &format!("{activity}-popup"));
}

fn form_number(field: &'static str, raw: &str) -> Result<f64, InvalidInputError> {
    parse_number(raw).ok_or_else(|| InvalidInputError::NotANumber {
        field,
        raw: raw.to_string(),
    })
}

/// Validate the form and create the workout it describes. Only the field
/// belonging to the selected activity is read.
pub fn build_workout(values: &FormValues, coords: Coords) -> Result<Workout, InvalidInputError> {
    let distance = form_number("distance", &values.distance)?;
    let duration = form_number("duration", &values.duration)?;
    match values.activity {
        ActivityType::Running => {
            let cadence = form_number("cadence", &values.cadence)?;
            create_running(distance, duration, coords, cadence)
        }
        ActivityType::Cycling => {
            let elevation = form_number("elevation gain", &values.elevation_gain)?;
            create_cycling(distance, duration, coords, elevation)
        }
    }
}

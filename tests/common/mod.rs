#![allow(dead_code)]

use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use trailmark::error::GeolocationError;
use trailmark::session::{
    FormValues, Geolocation, MapView, Notifier, SessionConfig, SessionController, Ui, WorkoutForm,
    WorkoutList,
};
use trailmark::store::{BlobStorage, MemoryStorage, WorkoutStore};
use trailmark::types::{ActivityType, Coords, Workout, WorkoutId};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    MapInit(Coords, f64),
    SetView(Coords, f64, bool),
    Marker(Coords, String, String),
    ListenClicks,
    FormShow,
    FormHide,
    FormReset,
    FormFocus,
    FormFields(ActivityType),
    Entry(WorkoutId),
    Notice(String),
    PositionRequested,
}

/// Shared log of everything the controller asked the collaborators to do.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<Call>>>);

impl Recorder {
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn notices(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Notice(m) => Some(m),
                _ => None,
            })
            .collect()
    }
}

pub struct FakeGeolocation {
    pub answer: Result<Coords, GeolocationError>,
    pub rec: Recorder,
}

impl Geolocation for FakeGeolocation {
    fn request_position(&mut self) -> Result<Coords, GeolocationError> {
        self.rec.push(Call::PositionRequested);
        self.answer.clone()
    }
}

pub struct FakeMap(pub Recorder);

impl MapView for FakeMap {
    fn initialize(&mut self, center: Coords, zoom: f64) {
        self.0.push(Call::MapInit(center, zoom));
    }

    fn set_view(&mut self, center: Coords, zoom: f64, animate: bool) {
        self.0.push(Call::SetView(center, zoom, animate));
    }

    fn add_marker(&mut self, coords: Coords, popup: &str, style_class: &str) {
        self.0
            .push(Call::Marker(coords, popup.to_string(), style_class.to_string()));
    }

    fn listen_for_clicks(&mut self) {
        self.0.push(Call::ListenClicks);
    }
}

/// Form whose fields the test edits through a shared handle.
pub struct FakeForm {
    pub values: Rc<RefCell<FormValues>>,
    pub rec: Recorder,
}

impl WorkoutForm for FakeForm {
    fn values(&self) -> FormValues {
        self.values.borrow().clone()
    }

    fn show(&mut self) {
        self.rec.push(Call::FormShow);
    }

    fn hide(&mut self) {
        self.rec.push(Call::FormHide);
    }

    fn reset(&mut self) {
        let mut v = self.values.borrow_mut();
        let activity = v.activity;
        *v = FormValues {
            activity,
            ..FormValues::default()
        };
        self.rec.push(Call::FormReset);
    }

    fn focus_first_field(&mut self) {
        self.rec.push(Call::FormFocus);
    }

    fn show_fields_for(&mut self, activity: ActivityType) {
        self.values.borrow_mut().activity = activity;
        self.rec.push(Call::FormFields(activity));
    }
}

pub struct FakeList(pub Recorder);

impl WorkoutList for FakeList {
    fn append_entry(&mut self, workout: &Workout) {
        self.0.push(Call::Entry(workout.id()));
    }
}

pub struct FakeNotifier(pub Recorder);

impl Notifier for FakeNotifier {
    fn notify(&mut self, message: &str) {
        self.0.push(Call::Notice(message.to_string()));
    }
}

/// Memory storage whose writes can be switched to fail.
pub struct FailingStorage {
    pub inner: MemoryStorage,
    pub fail_writes: Rc<Cell<bool>>,
}

impl BlobStorage for FailingStorage {
    fn write_blob(&mut self, key: &str, blob: &str) -> Result<()> {
        if self.fail_writes.get() {
            anyhow::bail!("disk full");
        }
        self.inner.write_blob(key, blob)
    }

    fn read_blob(&self, key: &str) -> Result<Option<String>> {
        self.inner.read_blob(key)
    }
}

pub const HOME: Coords = Coords::new(48.8566, 2.3522);

pub struct Harness {
    pub session: SessionController,
    pub rec: Recorder,
    pub form: Rc<RefCell<FormValues>>,
    pub storage: MemoryStorage,
}

impl Harness {
    pub fn new(storage: MemoryStorage, position: Result<Coords, GeolocationError>) -> Self {
        Self::with_config(storage, position, SessionConfig::default())
    }

    pub fn with_config(
        storage: MemoryStorage,
        position: Result<Coords, GeolocationError>,
        config: SessionConfig,
    ) -> Self {
        Self::assemble(storage.clone(), storage, position, config)
    }

    /// Writes start failing once the returned flag is set.
    pub fn with_failing_writes(storage: MemoryStorage) -> (Self, Rc<Cell<bool>>) {
        let fail_writes = Rc::new(Cell::new(false));
        let backend = FailingStorage {
            inner: storage.clone(),
            fail_writes: Rc::clone(&fail_writes),
        };
        let h = Self::assemble(backend, storage, Ok(HOME), SessionConfig::default());
        (h, fail_writes)
    }

    fn assemble(
        backend: impl BlobStorage + 'static,
        storage: MemoryStorage,
        position: Result<Coords, GeolocationError>,
        config: SessionConfig,
    ) -> Self {
        let rec = Recorder::default();
        let form = Rc::new(RefCell::new(FormValues::default()));
        let ui = Ui {
            map: Box::new(FakeMap(rec.clone())),
            form: Box::new(FakeForm {
                values: Rc::clone(&form),
                rec: rec.clone(),
            }),
            list: Box::new(FakeList(rec.clone())),
            notifier: Box::new(FakeNotifier(rec.clone())),
        };
        let geolocation = Box::new(FakeGeolocation {
            answer: position,
            rec: rec.clone(),
        });
        let session = SessionController::new(WorkoutStore::new(backend), geolocation, ui, config);
        Self {
            session,
            rec,
            form,
            storage,
        }
    }

    pub fn started(storage: MemoryStorage) -> Self {
        let mut h = Self::new(storage, Ok(HOME));
        h.session.start().unwrap();
        h
    }

    pub fn fill(&self, activity: ActivityType, distance: &str, duration: &str, extra: &str) {
        let mut v = self.form.borrow_mut();
        v.activity = activity;
        v.distance = distance.to_string();
        v.duration = duration.to_string();
        match activity {
            ActivityType::Running => v.cadence = extra.to_string(),
            ActivityType::Cycling => v.elevation_gain = extra.to_string(),
        }
    }
}

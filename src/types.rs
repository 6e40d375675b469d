use crate::error::InvalidInputError;
use crate::utils::round1;
use chrono::{DateTime, Datelike, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Highest id handed out (or observed on restore) in this process.
static LAST_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(pub u64);

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Time-derived id that never repeats within the process: the current unix
/// millisecond, bumped past the last issued id when two creations share a
/// millisecond (or the clock steps backwards).
fn next_id(now: DateTime<Utc>) -> WorkoutId {
    let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    let bump = |last: u64| now_ms.max(last.saturating_add(1));
    let prev = LAST_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(bump(last)))
        .unwrap_or_else(|last| last);
    WorkoutId(bump(prev))
}

/// Make sure ids issued from now on are greater than `id`.
pub(crate) fn reserve_ids_through(id: WorkoutId) {
    LAST_ID.fetch_max(id.0, Ordering::SeqCst);
}

/// A `(latitude, longitude)` pair, stored as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    #[default]
    Running,
    Cycling,
}

impl ActivityType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♂️",
            Self::Cycling => "🚴‍♀️",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant payload. Derived metrics are computed once by the constructors and
/// stored; nothing recomputes them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum WorkoutKind {
    Running {
        /// steps/min
        cadence: u32,
        /// min/km
        pace: f64,
    },
    Cycling {
        /// meters; negative for net descent
        elevation_gain: f64,
        /// km/h
        speed: f64,
    },
}

impl WorkoutKind {
    pub const fn activity(&self) -> ActivityType {
        match self {
            Self::Running { .. } => ActivityType::Running,
            Self::Cycling { .. } => ActivityType::Cycling,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    id: WorkoutId,
    created_at: DateTime<Utc>,
    /// km
    distance: f64,
    /// minutes
    duration: f64,
    coords: Coords,
    description: String,
    interaction_count: u32,
    #[serde(flatten)]
    kind: WorkoutKind,
}

impl Workout {
    fn new(
        distance: f64,
        duration: f64,
        coords: Coords,
        kind: WorkoutKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: next_id(now),
            created_at: now,
            distance,
            duration,
            coords,
            description: describe(kind.activity(), now),
            interaction_count: 0,
            kind,
        }
    }

    pub const fn id(&self) -> WorkoutId {
        self.id
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn distance(&self) -> f64 {
        self.distance
    }

    pub const fn duration(&self) -> f64 {
        self.duration
    }

    pub const fn coords(&self) -> Coords {
        self.coords
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn interaction_count(&self) -> u32 {
        self.interaction_count
    }

    pub const fn kind(&self) -> &WorkoutKind {
        &self.kind
    }

    pub const fn activity(&self) -> ActivityType {
        self.kind.activity()
    }

    pub(crate) fn record_interaction(&mut self) {
        self.interaction_count = self.interaction_count.saturating_add(1);
    }
}

fn describe(activity: ActivityType, created_at: DateTime<Utc>) -> String {
    let local = created_at.with_timezone(&Local);
    let month = MONTHS[local.month0() as usize];
    format!("{activity} on {month} {}", local.day())
}

fn finite(field: &'static str, value: f64) -> Result<f64, InvalidInputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InvalidInputError::NonFinite { field })
    }
}

fn positive(field: &'static str, value: f64) -> Result<f64, InvalidInputError> {
    let value = finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(InvalidInputError::NotPositive { field, value })
    }
}

fn checked_coords(coords: Coords) -> Result<Coords, InvalidInputError> {
    finite("latitude", coords.lat)?;
    finite("longitude", coords.lng)?;
    Ok(coords)
}

pub fn create_running(
    distance: f64,
    duration: f64,
    coords: Coords,
    cadence: f64,
) -> Result<Workout, InvalidInputError> {
    create_running_at(distance, duration, coords, cadence, Utc::now())
}

/// Same as [`create_running`] with an explicit creation instant.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn create_running_at(
    distance: f64,
    duration: f64,
    coords: Coords,
    cadence: f64,
    now: DateTime<Utc>,
) -> Result<Workout, InvalidInputError> {
    let distance = positive("distance", distance)?;
    let duration = positive("duration", duration)?;
    let cadence = positive("cadence", cadence)?;
    if cadence.fract() != 0.0 {
        return Err(InvalidInputError::NotWhole {
            field: "cadence",
            value: cadence,
        });
    }
    if cadence > f64::from(u32::MAX) {
        return Err(InvalidInputError::OutOfRange {
            field: "cadence",
            value: cadence,
        });
    }
    let coords = checked_coords(coords)?;

    let kind = WorkoutKind::Running {
        cadence: cadence as u32,
        pace: round1(duration / distance),
    };
    Ok(Workout::new(distance, duration, coords, kind, now))
}

/// Elevation gain may be zero or negative; it only has to be finite.
pub fn create_cycling(
    distance: f64,
    duration: f64,
    coords: Coords,
    elevation_gain: f64,
) -> Result<Workout, InvalidInputError> {
    create_cycling_at(distance, duration, coords, elevation_gain, Utc::now())
}

pub fn create_cycling_at(
    distance: f64,
    duration: f64,
    coords: Coords,
    elevation_gain: f64,
    now: DateTime<Utc>,
) -> Result<Workout, InvalidInputError> {
    let distance = positive("distance", distance)?;
    let duration = positive("duration", duration)?;
    let elevation_gain = finite("elevation gain", elevation_gain)?;
    let coords = checked_coords(coords)?;

    let kind = WorkoutKind::Cycling {
        elevation_gain,
        speed: round1(distance / (duration / 60.0)),
    };
    Ok(Workout::new(distance, duration, coords, kind, now))
}

use crate::session::FormValues;
use crate::types::{ActivityType, Coords};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_DB: &str = "trailmark.db";

#[derive(Parser, Debug)]
#[command(
    name = "trailmark",
    about = "Log running and cycling workouts on a map position"
)]
pub struct Cli {
    /// SQLite file holding the workouts (`:memory:` for a throwaway session).
    #[arg(long, default_value = DEFAULT_DB, global = true)]
    pub db: PathBuf,

    /// Current latitude.
    #[arg(long, requires = "lng", allow_hyphen_values = true, global = true)]
    pub lat: Option<f64>,

    /// Current longitude.
    #[arg(long, requires = "lat", allow_hyphen_values = true, global = true)]
    pub lng: Option<f64>,

    /// Take the current position from the last point of a GPX file.
    #[arg(long, conflicts_with_all = ["lat", "lng"], global = true)]
    pub gpx: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Show stored workouts (default).
    List,
    /// Record a new workout.
    Add {
        #[command(subcommand)]
        workout: NewWorkout,
    },
    /// Select a workout: center the map on it and count the interaction.
    Select {
        /// Workout id as shown in brackets by `list`.
        id: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum NewWorkout {
    Running {
        #[command(flatten)]
        common: WorkoutArgs,
        /// Steps per minute.
        #[arg(long)]
        cadence: String,
    },
    Cycling {
        #[command(flatten)]
        common: WorkoutArgs,
        /// Elevation gain in meters, negative for net descent.
        #[arg(long, allow_hyphen_values = true)]
        elevation: String,
    },
}

#[derive(Args, Debug)]
pub struct WorkoutArgs {
    /// Distance in km.
    #[arg(long, allow_hyphen_values = true)]
    pub distance: String,

    /// Duration in minutes.
    #[arg(long, allow_hyphen_values = true)]
    pub duration: String,

    /// Where the workout happened, `LAT,LNG`. Defaults to the current position.
    #[arg(long, value_parser = parse_coords, allow_hyphen_values = true)]
    pub at: Option<Coords>,
}

impl Cli {
    pub fn position(&self) -> Option<Coords> {
        self.lat.zip(self.lng).map(|(lat, lng)| Coords::new(lat, lng))
    }
}

impl NewWorkout {
    pub const fn activity(&self) -> ActivityType {
        match self {
            Self::Running { .. } => ActivityType::Running,
            Self::Cycling { .. } => ActivityType::Cycling,
        }
    }

    pub const fn at(&self) -> Option<Coords> {
        match self {
            Self::Running { common, .. } | Self::Cycling { common, .. } => common.at,
        }
    }

    /// The form as the user would have filled it in.
    pub fn form_values(&self) -> FormValues {
        match self {
            Self::Running { common, cadence } => FormValues {
                activity: ActivityType::Running,
                distance: common.distance.clone(),
                duration: common.duration.clone(),
                cadence: cadence.clone(),
                elevation_gain: String::new(),
            },
            Self::Cycling { common, elevation } => FormValues {
                activity: ActivityType::Cycling,
                distance: common.distance.clone(),
                duration: common.duration.clone(),
                cadence: String::new(),
                elevation_gain: elevation.clone(),
            },
        }
    }
}

fn parse_coords(s: &str) -> Result<Coords, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got {s:?}"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("bad latitude {lat:?}: {e}"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("bad longitude {lng:?}: {e}"))?;
    Ok(Coords::new(lat, lng))
}

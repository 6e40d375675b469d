#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use trailmark::{
    cli::{self, Cmd},
    database::SqliteStorage,
    gpx::GpxGeolocation,
    session::{Event, FormValues, Geolocation, SessionConfig, SessionController, Ui},
    store::WorkoutStore,
    terminal::{FixedPosition, PresetForm, TerminalList, TerminalMap, TerminalNotifier},
    types::WorkoutId,
    utils,
};
use trailmark::dlog;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let storage = if cli.db == Path::new(":memory:") {
        SqliteStorage::open_in_memory()?
    } else {
        SqliteStorage::open(&cli.db)?
    };
    dlog!("mode={:?} db={}", cli.cmd, cli.db.display());

    let (form_values, click) = match &cli.cmd {
        Some(Cmd::Add { workout }) => (workout.form_values(), workout.at()),
        _ => (FormValues::default(), None),
    };

    let geolocation: Box<dyn Geolocation> = match (&cli.gpx, cli.position()) {
        (Some(path), _) => Box::new(GpxGeolocation::new(path)),
        (None, Some(pos)) => Box::new(FixedPosition(Some(pos))),
        // A workout added at an explicit spot can center the map there.
        (None, None) => Box::new(FixedPosition(click)),
    };

    let ui = Ui {
        map: Box::new(TerminalMap),
        form: Box::new(PresetForm::new(form_values)),
        list: Box::new(TerminalList),
        notifier: Box::new(TerminalNotifier {
            quiet: matches!(cli.cmd, None | Some(Cmd::List)),
        }),
    };
    let mut session = SessionController::new(
        WorkoutStore::new(storage),
        geolocation,
        ui,
        SessionConfig::default(),
    );
    session.start()?;

    match cli.cmd {
        None | Some(Cmd::List) => {
            if session.store().is_empty() {
                println!("No workouts yet.");
            }
        }
        Some(Cmd::Add { workout }) => {
            let center = session.map_center();
            let at = click
                .or(center)
                .context("no workout position: pass --at LAT,LNG")?;
            session.handle(Event::MapClicked(at))?;
            session.handle(Event::ActivityToggled(workout.activity()))?;
            session.handle(Event::FormSubmitted)?;
        }
        Some(Cmd::Select { id }) => {
            let id = WorkoutId(id);
            if session.store().find_by_id(id).is_none() {
                tracing::warn!(%id, "no workout with this id");
            }
            session.handle(Event::EntrySelected(id))?;
        }
    }

    Ok(())
}

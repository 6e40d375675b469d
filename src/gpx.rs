use crate::dlog;
use crate::error::GeolocationError;
use crate::session::Geolocation;
use crate::types::Coords;
use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fs;
use std::path::{Path, PathBuf};

/// Every `trkpt`, `rtept` and `wpt` position in document order.
pub fn parse_gpx_positions(bytes: &[u8]) -> Result<Vec<Coords>> {
    let mut xml = Reader::from_reader(bytes);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut out: Vec<Coords> = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e) | Event::Empty(e)) => {
                if is_point(&e)
                    && let Some(pos) = parse_lat_lon(&e)
                {
                    out.push(pos);
                }
            }
            Err(e) => anyhow::bail!("GPX XML parse error: {e}"),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// Last position recorded in a GPX file.
pub fn last_fix(path: &Path) -> Result<Option<Coords>> {
    let bytes = fs::read(path).with_context(|| format!("reading GPX: {}", path.display()))?;
    let positions = parse_gpx_positions(&bytes)
        .with_context(|| format!("parsing GPX: {}", path.display()))?;
    dlog!("gpx path={} positions={}", path.display(), positions.len());
    Ok(positions.last().copied())
}

fn is_point(e: &BytesStart<'_>) -> bool {
    matches!(e.local_name().as_ref(), b"trkpt" | b"rtept" | b"wpt")
}

fn parse_lat_lon(e: &BytesStart<'_>) -> Option<Coords> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for a in e.attributes().with_checks(false).flatten() {
        let key = a.key.as_ref();
        if key == b"lat"
            && let Ok(v) = a.unescape_value()
        {
            lat = v.trim().parse::<f64>().ok();
        } else if key == b"lon"
            && let Ok(v) = a.unescape_value()
        {
            lon = v.trim().parse::<f64>().ok();
        }
    }

    let pos = Coords::new(lat?, lon?);
    (pos.lat.is_finite() && pos.lng.is_finite()).then_some(pos)
}

/// Position provider answering with the last point of a GPX recording.
#[derive(Debug, Clone)]
pub struct GpxGeolocation {
    path: PathBuf,
}

impl GpxGeolocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Geolocation for GpxGeolocation {
    fn request_position(&mut self) -> Result<Coords, GeolocationError> {
        match last_fix(&self.path) {
            Ok(Some(pos)) => Ok(pos),
            Ok(None) => Err(GeolocationError::new(format!(
                "{} has no track or way points",
                self.path.display()
            ))),
            Err(e) => Err(GeolocationError::new(format!("{e:#}"))),
        }
    }
}

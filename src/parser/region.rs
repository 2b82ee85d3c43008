//! Region settings and the `X-TIMESTAMP-MAP` header.

use crate::cue::{Region, Scroll};

use super::settings::{Settings, Value, parse_options};
use super::timestamp::parse_timestamp;

/// Parse a region settings list. Keys and values may be separated by any of `delimiters`.
///
/// Returns `None` if the list has no `id`, since such a region could never be referenced.
#[must_use]
pub fn parse_region_settings(
    input: &str,
    delimiters: &[char],
    mut region: Region,
) -> Option<Region> {
    let mut settings = Settings::new();

    parse_options(input, delimiters, |key, value| match key {
        "id" => settings.set(key, value),
        "width" => {
            settings.percent(key, value);
        }
        "lines" => settings.integer(key, value),
        "regionanchor" | "viewportanchor" => {
            // Both halves must be valid, otherwise the whole anchor is dropped.
            let mut xy = value.split(',');
            let (Some(x), Some(y), None) = (xy.next(), xy.next(), xy.next()) else {
                return;
            };
            let mut anchor = Settings::new();
            anchor.percent("x", x);
            anchor.percent("y", y);
            if let (Some(x), Some(y)) = (anchor.get("x"), anchor.get("y")) {
                settings.set(&format!("{key}X"), x.clone());
                settings.set(&format!("{key}Y"), y.clone());
            }
        }
        "scroll" => settings.alt(key, value, &["up"]),
        _ => {}
    });

    let id = settings.get("id").and_then(Value::as_text)?;
    let number = |key: &str, default: f64| {
        settings
            .get(key)
            .and_then(Value::as_number)
            .unwrap_or(default)
    };

    id.clone_into(&mut region.id);
    region.width = number("width", 100.0);
    #[allow(
        clippy::cast_possible_truncation,
        reason = "only ever holds values parsed from an integer literal"
    )]
    let lines = number("lines", 3.0) as i64;
    region.lines = lines;
    region.region_anchor_x = number("regionanchorX", 0.0);
    region.region_anchor_y = number("regionanchorY", 100.0);
    region.viewport_anchor_x = number("viewportanchorX", 0.0);
    region.viewport_anchor_y = number("viewportanchorY", 100.0);
    region.scroll = match settings.get("scroll").and_then(Value::as_text) {
        Some("up") => Scroll::Up,
        _ => Scroll::None,
    };

    Some(region)
}

/// Mapping between MPEG-2 presentation timestamps and cue times, from an HLS
/// `X-TIMESTAMP-MAP=MPEGTS:<ticks>,LOCAL:<timestamp>` header.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct TimestampMap {
    /// 90 kHz MPEG-2 timestamp.
    pub mpegts: Option<i64>,

    /// Cue time, in seconds, that corresponds to `mpegts`.
    pub local: Option<f64>,
}

/// Parse the value of an `X-TIMESTAMP-MAP` header (everything after the `=`).
#[must_use]
pub fn parse_timestamp_map(input: &str) -> TimestampMap {
    let mut map = TimestampMap::default();

    for group in input.split(',') {
        let Some((key, value)) = group.split_once(':') else {
            continue;
        };
        match key.trim() {
            "MPEGTS" if map.mpegts.is_none() => {
                map.mpegts = value.trim().parse::<i64>().ok();
            }
            "LOCAL" if map.local.is_none() => {
                map.local = parse_timestamp(value.trim());
            }
            _ => {}
        }
    }

    map
}

//! Parsing of cue timing lines (`start --> end settings`).

use crate::cue::{Align, Cue, Line, LineAlign, Position, PositionAlign, Region, Vertical};
use super::settings::{Settings, Value, parse_options};
use super::timestamp::parse_timestamp_prefix;
use super::{CueFactory, ParsingError};

use std::rc::Rc;

use log::trace;

const LINE_ALIGN_KEYWORDS: [&str; 3] = ["start", "center", "end"];
const ALIGN_KEYWORDS: [&str; 5] = ["start", "center", "end", "left", "right"];

/// Parse a timing line into `cue`, setting its times and all of its settings.
///
/// `regions` holds the regions declared so far, oldest first.
///
/// # Errors
/// Returns [`ParsingError::BadTimeStamp`] if either timestamp is malformed or the two are not
/// separated by `-->`.
pub fn parse_cue<F: CueFactory + ?Sized>(
    input: &str,
    cue: &mut Cue,
    regions: &[(String, Rc<Region>)],
    factory: &F,
) -> Result<(), ParsingError> {
    let mut rest = input.trim_start();

    let (start_time, after_start) = consume_timestamp(rest, input)?;
    rest = after_start.trim_start();

    rest = rest.strip_prefix("-->").ok_or_else(|| {
        ParsingError::BadTimeStamp(format!(
            "Malformed time stamp (time stamps must be separated by '-->'): {input}"
        ))
    })?;

    let (end_time, after_end) = consume_timestamp(rest.trim_start(), input)?;

    cue.set_times(start_time, end_time);
    parse_cue_settings(after_end.trim_start(), cue, regions, factory);

    Ok(())
}

fn consume_timestamp<'a>(input: &'a str, line: &str) -> Result<(f64, &'a str), ParsingError> {
    let (seconds, length) = parse_timestamp_prefix(input)
        .ok_or_else(|| ParsingError::BadTimeStamp(format!("Malformed timestamp: {line}")))?;

    // Junk directly attached to the timestamp is dropped, up to the next whitespace, letter or
    // dash.
    let rest = input[length..].trim_start_matches(|char: char| {
        !(char.is_whitespace() || char.is_ascii_alphabetic() || char == '-')
    });
    Ok((seconds, rest))
}

/// Apply a cue settings list to `cue`. Unknown keys and malformed values are ignored; every
/// setting the list does not give ends up at its default.
pub fn parse_cue_settings<F: CueFactory + ?Sized>(
    input: &str,
    cue: &mut Cue,
    regions: &[(String, Rc<Region>)],
    factory: &F,
) {
    let mut settings = Settings::new();

    parse_options(input, &[':'], |key, value| match key {
        "region" => {
            if let Some((_, region)) = regions.iter().rev().find(|(id, _)| id == value) {
                settings.set(key, Value::Region(Rc::downgrade(region)));
            }
        }
        "vertical" => settings.alt(key, value, &["rl", "lr"]),
        "line" => {
            let mut values = value.split(',');
            let first = values.next().unwrap_or_default();
            let line_was_set = settings.has(key);
            settings.integer(key, first);
            if !line_was_set && settings.percent(key, first) {
                settings.set("snapToLines", false);
            }
            settings.alt(key, first, &["auto"]);
            if let (Some(second), None) = (values.next(), values.next()) {
                settings.alt("lineAlign", second, &LINE_ALIGN_KEYWORDS);
            }
        }
        "position" => {
            let mut values = value.split(',');
            settings.percent(key, values.next().unwrap_or_default());
            if let (Some(second), None) = (values.next(), values.next()) {
                settings.alt("positionAlign", second, &LINE_ALIGN_KEYWORDS);
            }
        }
        "size" => {
            settings.percent(key, value);
        }
        "align" => settings.alt(key, value, &ALIGN_KEYWORDS),
        _ => {}
    });

    cue.region = settings
        .get("region")
        .and_then(Value::as_region)
        .cloned();
    cue.vertical = settings
        .get("vertical")
        .and_then(Value::as_text)
        .and_then(Vertical::from_keyword)
        .unwrap_or_default();
    cue.line = match settings.get("line") {
        Some(Value::Number(line)) => Line::Number(*line),
        _ => Line::Auto,
    };
    cue.line_align = settings
        .get("lineAlign")
        .and_then(Value::as_text)
        .and_then(LineAlign::from_keyword)
        .unwrap_or_default();
    cue.snap_to_lines = settings
        .get_or("snapToLines", Value::Flag(true))
        .as_flag()
        .unwrap_or(true);
    cue.size = settings
        .get_or("size", Value::Number(100.0))
        .as_number()
        .unwrap_or(100.0);

    let align = settings
        .get("align")
        .and_then(Value::as_text)
        .and_then(Align::from_keyword)
        .unwrap_or(Align::Center);
    cue.align = if align == Align::Center && !factory.accepts_center_align() {
        Align::Middle
    } else {
        align
    };

    let align_keyword = cue.align.as_str();
    cue.position = if factory.accepts_auto_position() {
        settings
            .get("position")
            .and_then(Value::as_number)
            .map_or(Position::Auto, Position::Percent)
    } else {
        let defaults = ALIGN_KEYWORDS
            .iter()
            .chain(&["middle"])
            .filter_map(|keyword| {
                let position = Align::from_keyword(keyword)?.default_position();
                Some((*keyword, Value::Number(position)))
            })
            .collect::<Vec<_>>();
        settings
            .get_variant("position", &defaults, align_keyword)
            .as_ref()
            .and_then(Value::as_number)
            .map_or(Position::Auto, Position::Percent)
    };

    let position_align_defaults = [
        ("start", Value::from("start")),
        ("left", Value::from("start")),
        ("center", Value::from("center")),
        ("middle", Value::from("center")),
        ("right", Value::from("end")),
        ("end", Value::from("end")),
    ];
    cue.position_align = settings
        .get_variant("positionAlign", &position_align_defaults, align_keyword)
        .as_ref()
        .and_then(Value::as_text)
        .and_then(PositionAlign::from_keyword)
        .unwrap_or_else(|| cue.align.default_position_align());

    trace!("cue settings {input:?} resolved to {cue:?}");
}

#[cfg(test)]
mod tests {
    use assert_matches2::assert_matches;

    use super::*;
    use crate::config::ParserConfig;
    use crate::parser::DefaultFactory;

    fn parse(line: &str) -> Result<Cue, ParsingError> {
        parse_with(line, &[], &DefaultFactory::default())
    }

    fn parse_with(
        line: &str,
        regions: &[(String, Rc<Region>)],
        factory: &DefaultFactory,
    ) -> Result<Cue, ParsingError> {
        let mut cue = Cue::new(0.0, 0.0, "");
        parse_cue(line, &mut cue, regions, factory)?;
        Ok(cue)
    }

    #[test]
    fn timings_and_defaults() -> Result<(), ParsingError> {
        let cue = parse("00:00:01.000 --> 00:00:02.000")?;
        assert_eq!(cue.start_time(), 1.0);
        assert_eq!(cue.end_time(), 2.0);
        assert_eq!(cue.vertical, Vertical::Horizontal);
        assert_eq!(cue.line, Line::Auto);
        assert!(cue.snap_to_lines);
        assert_eq!(cue.line_align, LineAlign::Start);
        assert_eq!(cue.position, Position::Auto);
        assert_eq!(cue.position_align, PositionAlign::Center);
        assert_eq!(cue.size, 100.0);
        assert_eq!(cue.align, Align::Center);
        assert!(cue.region.is_none());
        Ok(())
    }

    #[test]
    fn loose_spacing() -> Result<(), ParsingError> {
        let cue = parse("  00:01.000-->00:02.500   align:start")?;
        assert_eq!(cue.start_time(), 1.0);
        assert_eq!(cue.end_time(), 2.5);
        assert_eq!(cue.align, Align::Start);
        assert_eq!(cue.position_align, PositionAlign::Start);
        Ok(())
    }

    #[test]
    fn bad_timings() {
        assert_matches!(parse("00:01.000 00:02.000"), Err(ParsingError::BadTimeStamp(message)));
        assert!(message.contains("-->"));
        assert_matches!(parse("0:01.000 --> 00:02.000"), Err(ParsingError::BadTimeStamp(_)));
        assert_matches!(parse("00:01.000 --> soon"), Err(ParsingError::BadTimeStamp(_)));
        assert_matches!(parse("00:01.000 -> 00:02.000"), Err(ParsingError::BadTimeStamp(_)));
    }

    #[test]
    fn line_snapping() -> Result<(), ParsingError> {
        let cue = parse("00:01.000 --> 00:02.000 line:50%")?;
        assert_eq!(cue.line, Line::Number(50.0));
        assert!(!cue.snap_to_lines);

        let cue = parse("00:01.000 --> 00:02.000 line:3")?;
        assert_eq!(cue.line, Line::Number(3.0));
        assert!(cue.snap_to_lines);

        let cue = parse("00:01.000 --> 00:02.000 line:-2,end")?;
        assert_eq!(cue.line, Line::Number(-2.0));
        assert_eq!(cue.line_align, LineAlign::End);

        let cue = parse("00:01.000 --> 00:02.000 line:3 line:50%")?;
        assert_eq!(cue.line, Line::Number(3.0));
        assert!(cue.snap_to_lines);
        Ok(())
    }

    #[test]
    fn duplicate_keys_keep_first() -> Result<(), ParsingError> {
        let cue = parse("00:01.000 --> 00:02.000 align:center align:end")?;
        assert_eq!(cue.align, Align::Center);

        let cue = parse("00:01.000 --> 00:02.000 align:middle align:end size:150% size:40%")?;
        assert_eq!(cue.align, Align::End);
        assert_eq!(cue.size, 40.0);
        Ok(())
    }

    #[test]
    fn position_and_vertical() -> Result<(), ParsingError> {
        let cue = parse("00:01.000 --> 00:02.000 position:10%,start vertical:rl size:35%")?;
        assert_eq!(cue.position, Position::Percent(10.0));
        assert_eq!(cue.position_align, PositionAlign::Start);
        assert_eq!(cue.vertical, Vertical::RightToLeft);
        assert_eq!(cue.size, 35.0);
        Ok(())
    }

    #[test]
    fn legacy_environment() -> Result<(), ParsingError> {
        let factory = DefaultFactory::new(ParserConfig::legacy());

        let cue = parse_with("00:01.000 --> 00:02.000", &[], &factory)?;
        assert_eq!(cue.align, Align::Middle);
        assert_eq!(cue.position, Position::Percent(50.0));
        assert_eq!(cue.position_align, PositionAlign::Center);

        let cue = parse_with("00:01.000 --> 00:02.000 align:right", &[], &factory)?;
        assert_eq!(cue.position, Position::Percent(100.0));
        assert_eq!(cue.position_align, PositionAlign::End);
        Ok(())
    }

    #[test]
    fn region_lookup_prefers_latest() -> Result<(), ParsingError> {
        let first = Rc::new(Region {
            id: "x".to_owned(),
            ..Region::default()
        });
        let second = Rc::new(Region {
            id: "x".to_owned(),
            width: 50.0,
            ..Region::default()
        });
        let regions = vec![
            ("x".to_owned(), Rc::clone(&first)),
            ("x".to_owned(), Rc::clone(&second)),
        ];

        let cue = parse_with(
            "00:01.000 --> 00:02.000 region:x",
            &regions,
            &DefaultFactory::default(),
        )?;
        assert_matches!(cue.region(), Some(region));
        assert!(Rc::ptr_eq(&region, &second));

        let cue = parse_with(
            "00:01.000 --> 00:02.000 region:y",
            &regions,
            &DefaultFactory::default(),
        )?;
        assert!(cue.region.is_none());
        Ok(())
    }
}

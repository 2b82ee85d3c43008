//! Tunable constants and the configuration structs built from them.

/// Share of the container height used as the font size hint for cue boxes.
pub const FONT_SIZE_PERCENT: f64 = 0.05;

/// Padding around the main overlay, as a percentage of the overlay width (applied on all sides).
pub const OVERLAY_PADDING_PERCENT: f64 = 1.5;

/// Height of a single region line, as a percentage of the overlay height.
pub const REGION_LINE_HEIGHT_PERCENT: f64 = 6.0;

/// Duration of the height transition renderers are expected to use for `scroll:up` regions.
pub const SCROLL_TRANSITION_SECONDS: f64 = 0.433;

/// Settings that describe the environment the parser produces cues for.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Whether the consumer accepts `center` as a cue alignment. Older consumers only know
    /// `middle`; for those, the parser falls back to it.
    pub accepts_center_align: bool,

    /// Whether the consumer accepts `auto` as a cue position. If not, a numeric default is
    /// derived from the cue's alignment.
    pub accepts_auto_position: bool,
}

impl ParserConfig {
    /// Configuration for a consumer that predates `center` and `auto`.
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            accepts_center_align: false,
            accepts_auto_position: false,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            accepts_center_align: true,
            accepts_auto_position: true,
        }
    }
}

/// Metrics used by the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub font_size_percent: f64,
    pub overlay_padding_percent: f64,
    pub region_line_height_percent: f64,
    pub scroll_transition_seconds: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_size_percent: FONT_SIZE_PERCENT,
            overlay_padding_percent: OVERLAY_PADDING_PERCENT,
            region_line_height_percent: REGION_LINE_HEIGHT_PERCENT,
            scroll_transition_seconds: SCROLL_TRANSITION_SECONDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_use_defaults() -> Result<(), serde_json::Error> {
        let layout: LayoutConfig = serde_json::from_str(r#"{ "font_size_percent": 0.1 }"#)?;
        assert!((layout.font_size_percent - 0.1).abs() < f64::EPSILON);
        assert!(
            (layout.region_line_height_percent - REGION_LINE_HEIGHT_PERCENT).abs() < f64::EPSILON
        );

        let parser: ParserConfig = serde_json::from_str(r#"{ "accepts_center_align": false }"#)?;
        assert!(!parser.accepts_center_align);
        assert!(parser.accepts_auto_position);

        Ok(())
    }
}

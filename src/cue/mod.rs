//! Cue and region records, as produced by the parser and consumed by the layout engine.

use crate::layout::{LayoutBox, Parent, RenderHandle};
use crate::markup;

use std::cell::OnceCell;
use std::fmt::Debug;
use std::rc::{Rc, Weak};

mod track;

pub use track::{CueIndex, CueTrack, Milliseconds};

/// A timed span of caption text together with its positioning settings.
///
/// All settings fields hold a legal value at all times; the parser overwrites the defaults set
/// here with whatever the cue's settings line specified.
#[derive(Clone)]
pub struct Cue {
    /// Optional label from the line preceding the timing line. Empty if there was none.
    pub id: String,

    start_time: f64,
    end_time: f64,

    text: String,
    markup: OnceCell<markup::Node>,

    pub vertical: Vertical,
    pub line: Line,

    /// `true` unless `line` was given as a percentage.
    pub snap_to_lines: bool,
    pub line_align: LineAlign,
    pub position: Position,
    pub position_align: PositionAlign,

    /// Size of the cue box along the inline axis, as a percentage of the container.
    pub size: f64,
    pub align: Align,

    /// The region this cue is displayed in, if any. Resolved once, at parse time.
    pub region: Option<Weak<Region>>,

    /// Where the cue's text track sits among the other tracks of the media element, if known.
    pub track: Option<TrackContext>,

    /// Renderer-owned state from the last layout pass that placed this cue.
    pub display_state: Option<DisplayState>,

    /// Forces the next layout pass to recompute this cue even if it has a display state.
    pub has_been_reset: bool,
}

impl Cue {
    #[must_use]
    pub fn new(start_time: f64, end_time: f64, text: &str) -> Self {
        Self {
            id: String::new(),
            start_time,
            end_time,
            text: text.to_owned(),
            markup: OnceCell::new(),
            vertical: Vertical::Horizontal,
            line: Line::Auto,
            snap_to_lines: true,
            line_align: LineAlign::Start,
            position: Position::Auto,
            position_align: PositionAlign::Center,
            size: 100.0,
            align: Align::Center,
            region: None,
            track: None,
            display_state: None,
            has_been_reset: false,
        }
    }

    /// Start time in seconds.
    #[must_use]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// End time in seconds. Not guaranteed to be after the start time.
    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub(crate) fn set_times(&mut self, start_time: f64, end_time: f64) {
        self.start_time = start_time;
        self.end_time = end_time;
    }

    /// The raw cue text, including inline markup.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the cue text. Invalidates the cached markup tree and marks the cue for
    /// relayout.
    pub fn set_text(&mut self, text: &str) {
        text.clone_into(&mut self.text);
        self.markup = OnceCell::new();
        self.has_been_reset = true;
    }

    /// The markup tree of the cue text, parsed on first access.
    pub fn markup(&self) -> &markup::Node {
        self.markup.get_or_init(|| markup::parse(&self.text))
    }

    /// The region this cue belongs to, if it still exists.
    #[must_use]
    pub fn region(&self) -> Option<Rc<Region>> {
        self.region.as_ref().and_then(Weak::upgrade)
    }

    /// The cue position as a percentage. `auto` resolves from the alignment.
    #[must_use]
    pub fn computed_position(&self) -> f64 {
        match self.position {
            Position::Percent(percent) => percent,
            Position::Auto => self.align.default_position(),
        }
    }

    pub(crate) fn append_text_line(&mut self, line: &str) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.extend(line.chars().map(|char| match char {
            '\u{2028}' | '\u{2029}' => '\n',
            other => other,
        }));
    }
}

impl Debug for Cue {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Cue")
            .field("id", &self.id)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("text", &self.text)
            .field("vertical", &self.vertical)
            .field("line", &self.line)
            .field("snap_to_lines", &self.snap_to_lines)
            .field("line_align", &self.line_align)
            .field("position", &self.position)
            .field("position_align", &self.position_align)
            .field("size", &self.size)
            .field("align", &self.align)
            .field("region", &self.region().map(|region| region.id.clone()))
            .field("display_state", &self.display_state)
            .finish_non_exhaustive()
    }
}

/// Compares everything the parser produces. Regions compare by identity, renderer state is
/// ignored.
impl PartialEq for Cue {
    fn eq(&self, other: &Self) -> bool {
        let same_region = match (&self.region, &other.region) {
            (Some(a), Some(b)) => Weak::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };

        same_region
            && self.id == other.id
            && self.start_time.to_bits() == other.start_time.to_bits()
            && self.end_time.to_bits() == other.end_time.to_bits()
            && self.text == other.text
            && self.vertical == other.vertical
            && self.line == other.line
            && self.snap_to_lines == other.snap_to_lines
            && self.line_align == other.line_align
            && self.position == other.position
            && self.position_align == other.position_align
            && self.size.to_bits() == other.size.to_bits()
            && self.align == other.align
    }
}

/// A named, independently scrolling container that cues may be assigned to.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Region {
    pub id: String,

    /// Width as a percentage of the viewport.
    pub width: f64,

    /// Height in lines.
    pub lines: i64,

    pub region_anchor_x: f64,
    pub region_anchor_y: f64,
    pub viewport_anchor_x: f64,
    pub viewport_anchor_y: f64,
    pub scroll: Scroll,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            id: String::new(),
            width: 100.0,
            lines: 3,
            region_anchor_x: 0.0,
            region_anchor_y: 100.0,
            viewport_anchor_x: 0.0,
            viewport_anchor_y: 100.0,
            scroll: Scroll::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Scroll {
    #[default]
    None,
    Up,
}

impl Scroll {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Up => "up",
        }
    }
}

/// Writing direction of a cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Vertical {
    #[default]
    Horizontal,

    /// `vertical:rl`, lines grow from right to left.
    RightToLeft,

    /// `vertical:lr`, lines grow from left to right.
    LeftToRight,
}

impl Vertical {
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "" => Some(Self::Horizontal),
            "rl" => Some(Self::RightToLeft),
            "lr" => Some(Self::LeftToRight),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "",
            Self::RightToLeft => "rl",
            Self::LeftToRight => "lr",
        }
    }

    #[must_use]
    pub fn is_horizontal(self) -> bool {
        self == Self::Horizontal
    }
}

/// The `line` cue setting.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub enum Line {
    #[default]
    Auto,

    /// A line number if the cue snaps to lines, a percentage otherwise.
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum LineAlign {
    #[default]
    Start,
    Center,
    End,
}

impl LineAlign {
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "start" => Some(Self::Start),
            "center" => Some(Self::Center),
            "end" => Some(Self::End),
            _ => None,
        }
    }
}

/// The `position` cue setting.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub enum Position {
    #[default]
    Auto,
    Percent(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum PositionAlign {
    Start,
    #[default]
    Center,
    End,
}

impl PositionAlign {
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "start" => Some(Self::Start),
            "center" => Some(Self::Center),
            "end" => Some(Self::End),
            _ => None,
        }
    }
}

/// Text alignment within the cue box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Align {
    Start,
    #[default]
    Center,

    /// Legacy spelling of `center`, used for consumers that do not know `center`.
    Middle,
    End,
    Left,
    Right,
}

impl Align {
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "start" => Some(Self::Start),
            "center" => Some(Self::Center),
            "middle" => Some(Self::Middle),
            "end" => Some(Self::End),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Center => "center",
            Self::Middle => "middle",
            Self::End => "end",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Position used when the cue does not specify one.
    #[must_use]
    pub fn default_position(self) -> f64 {
        match self {
            Self::Start | Self::Left => 0.0,
            Self::Center | Self::Middle => 50.0,
            Self::End | Self::Right => 100.0,
        }
    }

    /// Position alignment used when the cue does not specify one.
    #[must_use]
    pub fn default_position_align(self) -> PositionAlign {
        match self {
            Self::Start | Self::Left => PositionAlign::Start,
            Self::Center | Self::Middle => PositionAlign::Center,
            Self::End | Self::Right => PositionAlign::End,
        }
    }

    /// The CSS-style text alignment keyword, with `middle` normalized to `center`.
    #[must_use]
    pub fn text_align(self) -> &'static str {
        match self {
            Self::Middle => "center",
            other => other.as_str(),
        }
    }
}

/// What the renderer last did with a cue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayState {
    pub handle: RenderHandle,

    /// The cue box, relative to the top left corner of its parent container.
    pub rect: LayoutBox,
    pub parent: Parent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackMode {
    Disabled,
    Hidden,
    Showing,
}

/// The position of a cue's text track within the media element's track list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackContext {
    /// Number of showing tracks that come before this cue's track.
    pub preceding_showing: usize,
}

impl TrackContext {
    /// Builds the context for the track at `index` in a list of track modes.
    #[must_use]
    pub fn from_modes(modes: &[TrackMode], index: usize) -> Self {
        let preceding_showing = modes
            .iter()
            .take(index)
            .filter(|mode| **mode == TrackMode::Showing)
            .count();
        Self { preceding_showing }
    }
}

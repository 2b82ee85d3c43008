//! Renderer-independent tree representation of cue text markup.

use std::fmt::Display;

mod parse;

pub use parse::{parse, unescape};

/// A node in the markup tree of a cue.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),

    /// A `<hh:mm:ss.mmm>` marker, in seconds. Has no extent.
    Timestamp(f64),
}

impl Node {
    /// Concatenation of all text in this subtree.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, text: &mut String) {
        match self {
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(text);
                }
            }
            Node::Text(content) => text.push_str(content),
            Node::Timestamp(_) => {}
        }
    }

    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,

    /// Class names given with dot syntax, like `c.yellow.bg_blue`.
    pub classes: Vec<String>,

    /// Text colour set by one of the named colour classes.
    pub colour: Option<Colour>,

    /// Background colour set by one of the `bg_` colour classes.
    pub background: Option<Colour>,

    /// Voice name for `<v>`, language tag for `<lang>`.
    pub annotation: Option<String>,

    pub children: Vec<Node>,
}

impl Element {
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            classes: vec![],
            colour: None,
            background: None,
            annotation: None,
            children: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// The container holding the whole cue text.
    Root,

    /// `<c>`, a span that only carries classes.
    Class,
    Italic,
    Bold,
    Underline,
    Ruby,

    /// `<rt>`, only valid directly inside a `<ruby>`.
    RubyText,

    /// `<v>`, a span naming the speaker.
    Voice,

    /// `<lang>`, a span with a different language.
    Lang,
}

impl ElementKind {
    #[must_use]
    pub fn from_tag_name(name: &str) -> Option<Self> {
        match name {
            "c" => Some(Self::Class),
            "i" => Some(Self::Italic),
            "b" => Some(Self::Bold),
            "u" => Some(Self::Underline),
            "ruby" => Some(Self::Ruby),
            "rt" => Some(Self::RubyText),
            "v" => Some(Self::Voice),
            "lang" => Some(Self::Lang),
            _ => None,
        }
    }

    /// The kind an element of this kind must be directly nested in, if any.
    #[must_use]
    pub fn required_parent(self) -> Option<Self> {
        match self {
            Self::RubyText => Some(Self::Ruby),
            _ => None,
        }
    }

    /// Whether the annotation of a tag is kept for this kind.
    #[must_use]
    pub fn takes_annotation(self) -> bool {
        matches!(self, Self::Voice | Self::Lang)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colour {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Colour {
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    pub const LIME: Self = Self::opaque(0, 255, 0);
    pub const CYAN: Self = Self::opaque(0, 255, 255);
    pub const RED: Self = Self::opaque(255, 0, 0);
    pub const YELLOW: Self = Self::opaque(255, 255, 0);
    pub const MAGENTA: Self = Self::opaque(255, 0, 255);
    pub const BLUE: Self = Self::opaque(0, 0, 255);
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 255,
        }
    }

    /// Look up one of the colour class names WebVTT predefines.
    #[must_use]
    pub fn from_class_name(name: &str) -> Option<Self> {
        match name {
            "white" => Some(Self::WHITE),
            "lime" => Some(Self::LIME),
            "cyan" => Some(Self::CYAN),
            "red" => Some(Self::RED),
            "yellow" => Some(Self::YELLOW),
            "magenta" => Some(Self::MAGENTA),
            "blue" => Some(Self::BLUE),
            "black" => Some(Self::BLACK),
            _ => None,
        }
    }
}

/// CSS `rgba()` notation.
impl Display for Colour {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "rgba({},{},{},{})",
            self.red,
            self.green,
            self.blue,
            f64::from(self.alpha) / 255.0
        )
    }
}

/// Base direction of a cue's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

/// Determine the base direction of a markup tree from its first paragraph: right-to-left if it
/// contains a strong right-to-left character, left-to-right otherwise. Ruby is skipped.
#[must_use]
pub fn direction(root: &Node) -> Direction {
    let mut stack: Vec<&Node> = vec![root];

    while let Some(node) = stack.pop() {
        match node {
            Node::Element(element) if element.kind == ElementKind::Ruby => {}
            Node::Element(element) => stack.extend(element.children.iter().rev()),
            Node::Text(text) => {
                let paragraph_end = text.find(['\n', '\r']);
                let paragraph = paragraph_end.map_or(text.as_str(), |end| &text[..end]);
                if paragraph.chars().any(is_strong_rtl) {
                    return Direction::Rtl;
                }
                if paragraph_end.is_some() {
                    break;
                }
            }
            Node::Timestamp(_) => {}
        }
    }

    Direction::Ltr
}

fn is_strong_rtl(char: char) -> bool {
    matches!(
        u32::from(char),
        0x0590..=0x08FF
            | 0xFB1D..=0xFDFF
            | 0xFE70..=0xFEFF
            | 0x1_0800..=0x1_0FFF
            | 0x1_E800..=0x1_EFFF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colours() {
        assert_eq!(Colour::from_class_name("lime"), Some(Colour::LIME));
        assert_eq!(Colour::from_class_name("orange"), None);
        assert_eq!(Colour::WHITE.to_string(), "rgba(255,255,255,1)");
    }

    #[test]
    fn directions() {
        assert_eq!(direction(&parse("hello")), Direction::Ltr);
        assert_eq!(direction(&parse("<i>שלום</i> world")), Direction::Rtl);
        assert_eq!(direction(&parse("مرحبا")), Direction::Rtl);

        // Only the first paragraph counts
        assert_eq!(direction(&parse("hello\nשלום")), Direction::Ltr);

        // Ruby is skipped
        assert_eq!(
            direction(&parse("<ruby>שלום<rt>x</rt></ruby> text")),
            Direction::Ltr
        );
    }

    #[test]
    fn text_content() {
        let root = parse("<v Bob>Hi <b>there</b><00:01.000></v> you");
        assert_eq!(root.text_content(), "Hi there you");
    }
}

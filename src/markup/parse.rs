use crate::parser::timestamp::parse_exact_timestamp;
use super::{Colour, Element, ElementKind, Node};

use std::sync::LazyLock;

use regex::Regex;

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([^.\s/0-9>]+)(\.[^\s\\>]+)?([^>\\]+)?(\\?)>?$").unwrap()
});

/// Parse cue text into a markup tree. Always succeeds; anything that cannot be understood is
/// skipped. The result is a [`Node::Element`] of kind [`ElementKind::Root`].
#[must_use]
pub fn parse(text: &str) -> Node {
    // Open elements, innermost last, together with the tag name that opened them. The root is
    // always at the bottom.
    let mut stack: Vec<(Element, &str)> = vec![(Element::new(ElementKind::Root), "")];

    let mut slice = text;
    while !slice.is_empty() {
        let token_length = if slice.starts_with('<') {
            slice.find('>').map_or(slice.len(), |end| end + 1)
        } else {
            slice.find('<').unwrap_or(slice.len())
        };
        let token = &slice[..token_length];
        slice = &slice[token_length..];

        if !token.starts_with('<') {
            push_child(&mut stack, Node::Text(unescape(token)));
            continue;
        }

        if let Some(closing) = token.strip_prefix("</") {
            let name = closing.replacen('>', "", 1);
            if stack.len() > 1 && stack.last().is_some_and(|(_, open)| *open == name) {
                close_innermost(&mut stack);
            }
            // Anything else is ignored
            continue;
        }

        let inner = token[1..].strip_suffix('>').unwrap_or(&token[1..]);
        if let Some(seconds) = parse_exact_timestamp(inner) {
            push_child(&mut stack, Node::Timestamp(seconds));
            continue;
        }

        let Some(captures) = TAG_REGEX.captures(token) else {
            continue;
        };
        let Some(name) = captures.get(1).map(|name| name.as_str()) else {
            continue;
        };
        let Some(kind) = ElementKind::from_tag_name(name) else {
            continue;
        };
        if let Some(required_parent) = kind.required_parent()
            && stack.last().map(|(element, _)| element.kind) != Some(required_parent)
        {
            continue;
        }

        let mut element = Element::new(kind);

        if let Some(classes) = captures.get(2) {
            for class in classes.as_str().split('.').filter(|class| !class.is_empty()) {
                match class.strip_prefix("bg_") {
                    Some(colour_name) => {
                        if let Some(colour) = Colour::from_class_name(colour_name) {
                            element.background = Some(colour);
                        }
                    }
                    None => {
                        if let Some(colour) = Colour::from_class_name(class) {
                            element.colour = Some(colour);
                        }
                    }
                }
                element.classes.push(class.to_owned());
            }
        }

        if kind.takes_annotation()
            && let Some(annotation) = captures.get(3)
        {
            let annotation = annotation.as_str().trim();
            if !annotation.is_empty() {
                element.annotation = Some(annotation.to_owned());
            }
        }

        stack.push((element, name));
    }

    while stack.len() > 1 {
        close_innermost(&mut stack);
    }

    let root = stack
        .pop()
        .map_or_else(|| Element::new(ElementKind::Root), |(root, _)| root);
    Node::Element(root)
}

fn push_child(stack: &mut [(Element, &str)], node: Node) {
    if let Some((parent, _)) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn close_innermost(stack: &mut Vec<(Element, &str)>) {
    if let Some((element, _)) = stack.pop() {
        push_child(stack, Node::Element(element));
    }
}

/// Replace character references in cue text. Unknown references are kept as they are.
#[must_use]
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }

    let mut result = String::with_capacity(text.len());
    let mut slice = text;

    while let Some(start) = slice.find('&') {
        result.push_str(&slice[..start]);
        slice = &slice[start..];

        let decoded = slice.find(';').and_then(|end| {
            let reference = &slice[1..end];
            decode_reference(reference).map(|char| (char, end + 1))
        });

        match decoded {
            Some((char, length)) => {
                result.push(char);
                slice = &slice[length..];
            }
            None => {
                result.push('&');
                slice = &slice[1..];
            }
        }
    }

    result.push_str(slice);
    result
}

fn decode_reference(reference: &str) -> Option<char> {
    if let Some(number) = reference.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return match char::from_u32(code) {
            Some('\0') | None => Some(char::REPLACEMENT_CHARACTER),
            Some(char) => Some(char),
        };
    }

    match reference {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "lrm" => Some('\u{200e}'),
        "rlm" => Some('\u{200f}'),
        _ => None,
    }
}

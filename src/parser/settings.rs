//! A write-once key/value store for collecting cue and region settings.

use crate::cue::Region;

use std::rc::Weak;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

static INTEGER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());
static PERCENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3})(\.\d*)?%$").unwrap());

#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Number(f64),
    Flag(bool),
    Region(Weak<Region>),
}

impl Value {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_region(&self) -> Option<&Weak<Region>> {
        match self {
            Self::Region(region) => Some(region),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

/// Setting values, in the order they were first assigned.
///
/// Only the first assignment to a key is kept: a malformed duplicate later in a settings line
/// never replaces a valid earlier value.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: IndexMap<String, Value>,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, unless the key already has one or the value is empty text.
    pub fn set<V: Into<Value>>(&mut self, key: &str, value: V) {
        let value = value.into();
        if matches!(&value, Value::Text(text) if text.is_empty()) || self.has(key) {
            return;
        }
        self.values.insert(key.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The stored value, or `default`.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    /// The stored value, or the entry of `defaults` named by `variant`. This lets the default
    /// depend on another, already resolved setting.
    #[must_use]
    pub fn get_variant(
        &self,
        key: &str,
        defaults: &[(&str, Value)],
        variant: &str,
    ) -> Option<Value> {
        self.get(key).cloned().or_else(|| {
            defaults
                .iter()
                .find(|(name, _)| *name == variant)
                .map(|(_, value)| value.clone())
        })
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Accept `value` only if it is exactly one of `allowed`.
    pub fn alt(&mut self, key: &str, value: &str, allowed: &[&str]) {
        if allowed.contains(&value) {
            self.set(key, value);
        }
    }

    /// Accept `value` only if it is a signed decimal integer.
    pub fn integer(&mut self, key: &str, value: &str) {
        if INTEGER_REGEX.is_match(value)
            && let Ok(integer) = value.parse::<i64>()
        {
            #[allow(
                clippy::cast_precision_loss,
                reason = "setting values are small; the store keeps all numbers as f64"
            )]
            let number = integer as f64;
            self.set(key, number);
        }
    }

    /// Accept `value` only if it is a percentage between 0 and 100. Returns whether `value` was
    /// a valid percentage, whether or not an earlier value for `key` was kept instead.
    pub fn percent(&mut self, key: &str, value: &str) -> bool {
        match parse_percent(value) {
            Some(percent) => {
                self.set(key, percent);
                true
            }
            None => false,
        }
    }
}

/// Split `input` into whitespace-separated groups of `key<delimiter>value`, calling `callback`
/// with the trimmed key and value of each. Groups that do not split into exactly two parts are
/// skipped.
pub fn parse_options<F>(input: &str, delimiters: &[char], mut callback: F)
where
    F: FnMut(&str, &str),
{
    for group in input.split(char::is_whitespace) {
        let mut parts = group.split(delimiters);
        if let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) {
            callback(key.trim(), value.trim());
        }
    }
}

/// Parse a percentage of the form `50%` or `12.5%` in the range `[0, 100]`.
#[must_use]
pub fn parse_percent(value: &str) -> Option<f64> {
    if !PERCENT_REGEX.is_match(value) {
        return None;
    }

    let number = value.trim_end_matches('%').trim_end_matches('.');
    let percent = fast_float2::parse::<f64, _>(number).ok()?;
    (0.0..=100.0).contains(&percent).then_some(percent)
}

/// Turns the raw bytes handed to [`super::Parser::parse`] into text.
pub trait Decoder {
    /// Decode as much of `bytes` as possible. Bytes that might be the start of a character
    /// continuing in the next chunk are held back.
    fn decode(&mut self, bytes: &[u8]) -> String;

    /// Decode whatever is still held back. Called once the stream is complete.
    fn finish(&mut self) -> String;
}

/// Streaming UTF-8 decoder. Strips a leading byte order mark and replaces invalid sequences with
/// U+FFFD.
#[derive(Debug, Default, Clone)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
    started: bool,
}

impl Utf8Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn strip_bom(&mut self, text: &mut String) {
        if !self.started && !text.is_empty() {
            self.started = true;
            if text.starts_with('\u{feff}') {
                text.drain(..'\u{feff}'.len_utf8());
            }
        }
    }
}

impl Decoder for Utf8Decoder {
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut text = String::with_capacity(self.pending.len());
        let mut rest = self.pending.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(error) => {
                    let (valid, after) = rest.split_at(error.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match error.error_len() {
                        Some(invalid_length) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid_length..];
                        }
                        None => {
                            // Truncated sequence at the end; wait for more bytes
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        self.strip_bom(&mut text);
        text
    }

    fn finish(&mut self) -> String {
        let mut text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        self.strip_bom(&mut text);
        text
    }
}

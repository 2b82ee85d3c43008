//! Incremental WebVTT parser.
//!
//! Feed it chunks of bytes with [`Parser::parse`] as they arrive, then call [`Parser::flush`] once
//! the stream ends. Everything the parser finds is reported to a [`Handler`] as soon as it is
//! complete.

use crate::config::ParserConfig;
use crate::cue::{Align, Cue, Region};

use std::rc::Rc;

use log::{debug, trace, warn};

mod cue_settings;
mod decode;
mod error;
mod region;
pub mod settings;
pub mod timestamp;

pub use cue_settings::{parse_cue, parse_cue_settings};
pub use decode::{Decoder, Utf8Decoder};
pub use error::{Error, ParsingError};
pub use region::{TimestampMap, parse_region_settings, parse_timestamp_map};

/// Receives everything the parser produces.
///
/// All methods have defaults, so implementors only need to override what they care about.
/// Returning an error from any of them aborts the current `parse` or `flush` call.
pub trait Handler {
    /// A cue is complete.
    ///
    /// # Errors
    /// Implementation-defined.
    fn on_cue(&mut self, _cue: Cue) -> anyhow::Result<()> {
        Ok(())
    }

    /// A region with an `id` was declared.
    ///
    /// # Errors
    /// Implementation-defined.
    fn on_region(&mut self, _region: Rc<Region>) -> anyhow::Result<()> {
        Ok(())
    }

    /// The header contained an `X-TIMESTAMP-MAP`.
    ///
    /// # Errors
    /// Implementation-defined.
    fn on_timestamp_map(&mut self, _map: TimestampMap) -> anyhow::Result<()> {
        Ok(())
    }

    /// Something recoverable went wrong. Return `Ok` to continue parsing, or the error to abort
    /// the current call with it. The default aborts.
    ///
    /// # Errors
    /// Returns the error if it should not be recovered from.
    fn on_parsing_error(&mut self, error: ParsingError) -> Result<(), ParsingError> {
        Err(error)
    }

    /// The stream has been flushed; nothing more will be reported.
    ///
    /// # Errors
    /// Implementation-defined.
    fn on_flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// One [`Handler`] callback, as recorded by [`Collector`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Cue(Cue),
    Region(Rc<Region>),
    TimestampMap(TimestampMap),
    ParsingError(ParsingError),
    Flush,
}

/// Handler that records every callback. Parsing errors are recorded and recovered from.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    pub events: Vec<Event>,
}

impl Collector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> impl Iterator<Item = &Cue> {
        self.events.iter().filter_map(|event| match event {
            Event::Cue(cue) => Some(cue),
            _ => None,
        })
    }

    pub fn regions(&self) -> impl Iterator<Item = &Rc<Region>> {
        self.events.iter().filter_map(|event| match event {
            Event::Region(region) => Some(region),
            _ => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &ParsingError> {
        self.events.iter().filter_map(|event| match event {
            Event::ParsingError(error) => Some(error),
            _ => None,
        })
    }

    /// Take all recorded cues, in the order they were reported.
    #[must_use]
    pub fn into_cues(self) -> Vec<Cue> {
        self.events
            .into_iter()
            .filter_map(|event| match event {
                Event::Cue(cue) => Some(cue),
                _ => None,
            })
            .collect()
    }
}

impl Handler for Collector {
    fn on_cue(&mut self, cue: Cue) -> anyhow::Result<()> {
        self.events.push(Event::Cue(cue));
        Ok(())
    }

    fn on_region(&mut self, region: Rc<Region>) -> anyhow::Result<()> {
        self.events.push(Event::Region(region));
        Ok(())
    }

    fn on_timestamp_map(&mut self, map: TimestampMap) -> anyhow::Result<()> {
        self.events.push(Event::TimestampMap(map));
        Ok(())
    }

    fn on_parsing_error(&mut self, error: ParsingError) -> Result<(), ParsingError> {
        self.events.push(Event::ParsingError(error));
        Ok(())
    }

    fn on_flush(&mut self) -> anyhow::Result<()> {
        self.events.push(Event::Flush);
        Ok(())
    }
}

/// Creates the cue and region records the parser fills in, and describes which setting values
/// the consumer of those records understands.
pub trait CueFactory {
    fn new_cue(&self) -> Cue;
    fn new_region(&self) -> Region;

    /// Whether `center` is an acceptable cue alignment. If not, `middle` is used instead.
    fn accepts_center_align(&self) -> bool;

    /// Whether `auto` is an acceptable cue position. If not, the position defaults to a
    /// percentage derived from the alignment.
    fn accepts_auto_position(&self) -> bool;
}

/// Builds plain [`Cue`]s and [`Region`]s according to a [`ParserConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactory {
    config: ParserConfig,
}

impl DefaultFactory {
    #[must_use]
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }
}

impl CueFactory for DefaultFactory {
    fn new_cue(&self) -> Cue {
        let mut cue = Cue::new(0.0, 0.0, "");
        if !self.config.accepts_center_align {
            cue.align = Align::Middle;
        }
        cue
    }

    fn new_region(&self) -> Region {
        Region::default()
    }

    fn accepts_center_align(&self) -> bool {
        self.config.accepts_center_align
    }

    fn accepts_auto_position(&self) -> bool {
        self.config.accepts_auto_position
    }
}

/// Where the parser is within the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Waiting for the `WEBVTT` signature line.
    Initial,

    /// In the header block following the signature.
    Header,

    /// Between blocks, before or after the first cue.
    Blocks,

    /// Inside a `REGION` definition block.
    Region,

    /// Inside a `NOTE` block.
    Note,

    /// Expecting a cue identifier or timing line.
    Id,

    /// Expecting a cue timing line.
    Cue,

    /// Collecting cue text.
    CueText,

    /// Skipping the rest of a cue whose timing line was invalid.
    BadCue,

    /// The signature was invalid. Nothing will be parsed anymore.
    BadWebVtt,
}

/// What to do with a line after a state has handled it.
enum Flow {
    /// The line is done; continue with the next one.
    Advance,

    /// The state has changed and the same line must be handled again under the new state.
    Reprocess,
}

/// Why processing stopped early.
enum Abort {
    /// A recoverable error that has not been reported to the handler yet.
    Parsing(ParsingError),

    /// An error to return from the current call as-is.
    Raise(Error),
}

impl From<anyhow::Error> for Abort {
    fn from(error: anyhow::Error) -> Self {
        Self::Raise(Error::Handler(error))
    }
}

pub struct Parser<D = Utf8Decoder, F = DefaultFactory> {
    decoder: D,
    factory: F,
    state: State,

    /// Decoded text that has not been split into lines yet.
    buffer: String,

    /// The cue currently being parsed.
    cue: Option<Cue>,

    /// Settings lines of the `REGION` block currently being parsed.
    region_settings: String,

    /// Every region declared so far, in declaration order.
    regions: Vec<(String, Rc<Region>)>,

    seen_cue: bool,
}

impl Parser {
    /// Parser for UTF-8 input that produces plain cues.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ParserConfig) -> Self {
        Self::with_parts(Utf8Decoder::new(), DefaultFactory::new(config))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Decoder, F: CueFactory> Parser<D, F> {
    pub fn with_parts(decoder: D, factory: F) -> Self {
        Self {
            decoder,
            factory,
            state: State::Initial,
            buffer: String::new(),
            cue: None,
            region_settings: String::new(),
            regions: vec![],
            seen_cue: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// All regions with an `id` declared so far, in declaration order.
    pub fn regions(&self) -> impl Iterator<Item = &Rc<Region>> {
        self.regions.iter().map(|(_, region)| region)
    }

    /// Decode `chunk` and process every line that is complete. An incomplete line at the end is
    /// kept until more data arrives.
    ///
    /// # Errors
    /// Returns an error if the handler fails, or if it does not recover from a [`ParsingError`].
    pub fn parse<H: Handler + ?Sized>(
        &mut self,
        chunk: &[u8],
        handler: &mut H,
    ) -> Result<(), Error> {
        let text = self.decoder.decode(chunk);
        self.parse_str(&text, handler)
    }

    /// Like [`Parser::parse`], for text that has already been decoded.
    ///
    /// # Errors
    /// See [`Parser::parse`].
    pub fn parse_str<H: Handler + ?Sized>(
        &mut self,
        text: &str,
        handler: &mut H,
    ) -> Result<(), Error> {
        if self.state == State::BadWebVtt {
            return Ok(());
        }

        self.buffer.push_str(text);
        self.process(handler)
    }

    /// Finish the stream: decode anything the decoder held back, complete whatever block is still
    /// open, then report the flush.
    ///
    /// # Errors
    /// See [`Parser::parse`]. Input that never contained a complete signature line is reported as
    /// [`ParsingError::BadSignature`].
    pub fn flush<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<(), Error> {
        let rest = self.decoder.finish();

        if self.state != State::BadWebVtt {
            self.buffer.push_str(&rest);

            if !self.buffer.is_empty()
                || self.cue.is_some()
                || matches!(self.state, State::Initial | State::Header | State::Region)
            {
                // A blank line completes any open cue or block
                self.buffer.push_str("\n\n");
                self.process(handler)?;
            }

            if self.state == State::Initial {
                self.state = State::BadWebVtt;
                handler.on_parsing_error(ParsingError::BadSignature)?;
            }
        }

        debug!("flushed WebVTT stream, {} region(s) declared", self.regions.len());
        handler.on_flush()?;
        Ok(())
    }

    /// Parse a complete document: [`Parser::parse`] followed by [`Parser::flush`].
    ///
    /// # Errors
    /// See [`Parser::parse`].
    pub fn parse_all<H: Handler + ?Sized>(
        &mut self,
        bytes: &[u8],
        handler: &mut H,
    ) -> Result<(), Error> {
        self.parse(bytes, handler)?;
        self.flush(handler)
    }

    fn process<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<(), Error> {
        match self.process_lines(handler) {
            Ok(()) => Ok(()),
            Err(Abort::Parsing(error)) => self.abort(error, handler),
            Err(Abort::Raise(error)) => Err(error),
        }
    }

    fn abort<H: Handler + ?Sized>(
        &mut self,
        error: ParsingError,
        handler: &mut H,
    ) -> Result<(), Error> {
        warn!("WebVTT parsing stopped in state {:?}: {error}", self.state);
        let reported = handler.on_parsing_error(error);

        if self.state == State::CueText
            && let Some(cue) = self.cue.take()
        {
            handler.on_cue(cue)?;
        }
        self.cue = None;
        if self.state == State::Initial {
            self.state = State::BadWebVtt;
            self.buffer.clear();
        } else {
            self.state = State::BadCue;
        }

        reported.map_err(Error::from)
    }

    fn process_lines<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<(), Abort> {
        while let Some(line) = self.next_line() {
            loop {
                trace!("{:?}: {line:?}", self.state);
                match self.step(&line, handler)? {
                    Flow::Advance => break,
                    Flow::Reprocess => {}
                }
            }

            if self.state == State::BadWebVtt {
                self.buffer.clear();
                break;
            }
        }

        Ok(())
    }

    /// Take the next complete line out of the buffer, without its terminator.
    fn next_line(&mut self) -> Option<String> {
        let end = self.buffer.find(['\r', '\n'])?;
        let terminator_length = if self.buffer[end..].starts_with("\r\n") {
            2
        } else if self.buffer[end..].starts_with('\r') && end + 1 == self.buffer.len() {
            // Could be the first half of a CRLF split across chunks
            return None;
        } else {
            1
        };

        let line = self.buffer[..end].to_owned();
        self.buffer.drain(..end + terminator_length);
        Some(line)
    }

    fn step<H: Handler + ?Sized>(&mut self, line: &str, handler: &mut H) -> Result<Flow, Abort> {
        match self.state {
            State::Initial => self.signature(line),
            State::Header => self.header(line, handler),
            State::Blocks => Ok(self.blocks(line)),
            State::Region => self.region_block(line, handler),
            State::Note => {
                if line.is_empty() {
                    self.state = if self.seen_cue { State::Id } else { State::Blocks };
                }
                Ok(Flow::Advance)
            }
            State::Id => Ok(self.id(line)),
            State::Cue => self.timing(line, handler),
            State::CueText => self.cue_text(line, handler),
            State::BadCue => {
                if line.is_empty() {
                    self.state = State::Id;
                }
                Ok(Flow::Advance)
            }
            State::BadWebVtt => Ok(Flow::Advance),
        }
    }

    fn signature(&mut self, line: &str) -> Result<Flow, Abort> {
        match line.strip_prefix("WEBVTT") {
            Some(rest) if rest.is_empty() || rest.starts_with([' ', '\t']) => {
                self.state = State::Header;
                Ok(Flow::Advance)
            }
            _ => Err(Abort::Parsing(ParsingError::BadSignature)),
        }
    }

    fn header<H: Handler + ?Sized>(&mut self, line: &str, handler: &mut H) -> Result<Flow, Abort> {
        if line.is_empty() {
            self.state = State::Blocks;
        } else if line.contains("X-TIMESTAMP-MAP") {
            let mut parts = line.split('=');
            if let (Some("X-TIMESTAMP-MAP"), Some(value), None) =
                (parts.next().map(str::trim), parts.next(), parts.next())
            {
                let map = parse_timestamp_map(value.trim());
                debug!("timestamp map: {map:?}");
                handler.on_timestamp_map(map)?;
            }
        } else if let Some((key, value)) = line.split_once(':')
            && key.trim() == "Region"
            && !value.contains(':')
        {
            // Legacy region header, with `key=value` settings
            if let Some(region) =
                parse_region_settings(value, &['='], self.factory.new_region())
            {
                self.register_region(region, handler)?;
            }
        }

        Ok(Flow::Advance)
    }

    fn blocks(&mut self, line: &str) -> Flow {
        if line.is_empty() {
            return Flow::Advance;
        }

        if is_note(line) {
            self.state = State::Note;
            Flow::Advance
        } else if line.starts_with("REGION") && !self.seen_cue {
            self.state = State::Region;
            self.region_settings.clear();
            Flow::Advance
        } else {
            self.state = State::Id;
            Flow::Reprocess
        }
    }

    fn region_block<H: Handler + ?Sized>(
        &mut self,
        line: &str,
        handler: &mut H,
    ) -> Result<Flow, Abort> {
        if line.is_empty() {
            self.state = State::Blocks;
            let settings = std::mem::take(&mut self.region_settings);
            if let Some(region) =
                parse_region_settings(&settings, &[':', '='], self.factory.new_region())
            {
                self.register_region(region, handler)?;
            }
        } else {
            self.region_settings.push_str(line);
            self.region_settings.push(' ');
        }

        Ok(Flow::Advance)
    }

    fn register_region<H: Handler + ?Sized>(
        &mut self,
        region: Region,
        handler: &mut H,
    ) -> Result<(), Abort> {
        debug!("region {:?} declared", region.id);
        let region = Rc::new(region);
        self.regions.push((region.id.clone(), Rc::clone(&region)));
        handler.on_region(region)?;
        Ok(())
    }

    fn id(&mut self, line: &str) -> Flow {
        if is_note(line) {
            self.state = State::Note;
            return Flow::Advance;
        }
        if line.is_empty() {
            return Flow::Advance;
        }

        self.cue = Some(self.factory.new_cue());
        self.seen_cue = true;
        self.state = State::Cue;

        if line.contains("-->") {
            Flow::Reprocess
        } else {
            if let Some(cue) = &mut self.cue {
                line.clone_into(&mut cue.id);
            }
            Flow::Advance
        }
    }

    fn timing<H: Handler + ?Sized>(&mut self, line: &str, handler: &mut H) -> Result<Flow, Abort> {
        let cue = self.cue.get_or_insert_with(|| self.factory.new_cue());

        match parse_cue(line, cue, &self.regions, &self.factory) {
            Ok(()) => self.state = State::CueText,
            Err(error) => {
                warn!("discarding cue: {error}");
                self.cue = None;
                self.state = State::BadCue;
                handler
                    .on_parsing_error(error)
                    .map_err(|error| Abort::Raise(error.into()))?;
            }
        }

        Ok(Flow::Advance)
    }

    fn cue_text<H: Handler + ?Sized>(
        &mut self,
        line: &str,
        handler: &mut H,
    ) -> Result<Flow, Abort> {
        let starts_next_cue = line.contains("-->");

        if line.is_empty() || starts_next_cue {
            self.state = State::Id;
            if let Some(cue) = self.cue.take() {
                trace!("cue {:?} complete", cue.id);
                handler.on_cue(cue)?;
            }
            return Ok(if starts_next_cue {
                Flow::Reprocess
            } else {
                Flow::Advance
            });
        }

        if let Some(cue) = &mut self.cue {
            cue.append_text_line(line);
        }
        Ok(Flow::Advance)
    }
}

fn is_note(line: &str) -> bool {
    line.strip_prefix("NOTE")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
}

// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::{iter::Peekable, path::Path, vec::IntoIter};

use saphyr_parser::{Event, MarkedEventReceiver, Marker, Parser as YamlParser, TScalarStyle};

use crate::error::{Error, Result};

use super::{Mapping, Node, Scalar, ScalarStyle};

#[derive(Default)]
struct EventCollector {
    events: Vec<(Event, Marker)>,
}

impl MarkedEventReceiver for EventCollector {
    fn on_event(&mut self, event: Event, mark: Marker) {
        self.events.push((event, mark));
    }
}

/// Parses every document in `input`.
///
/// Unlike a plain YAML load, duplicate mapping keys are rejected rather than
/// silently overwritten, since an edit could otherwise land on the wrong entry.
pub fn parse_yaml_str(path: &Path, input: &str) -> Result<Vec<Node>> {
    let mut collector = EventCollector::default();
    let mut yaml_parser = YamlParser::new_from_str(input);
    yaml_parser.load(&mut collector, true).map_err(|err| Error::Syntax {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let mut loader = Loader {
        path,
        events: collector.events.into_iter().peekable(),
    };
    loader.parse_stream()
}

// Event kinds the loader needs to branch on, copied out of the peeked event so the
// iterator is free to advance.
enum NextEvent {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    Sequence,
    SequenceEnd,
    Mapping,
    MappingEnd,
    Scalar,
    Alias,
    Other,
    Eof,
}

struct Loader<'a> {
    path: &'a Path,
    events: Peekable<IntoIter<(Event, Marker)>>,
}

impl Loader<'_> {
    fn parse_stream(&mut self) -> Result<Vec<Node>> {
        // Parse StreamStart.
        if let NextEvent::StreamStart = self.peek() {
            self.events.next();
        }

        // Parse docs.
        let mut docs = Vec::new();
        loop {
            match self.peek() {
                NextEvent::DocumentStart => {
                    let doc = self.parse_doc()?;
                    docs.push(doc);
                }
                NextEvent::StreamEnd | NextEvent::Eof => break,
                _ => return Err(self.unexpected("document start")),
            }
        }

        // Return result.
        let docs = docs;
        Ok(docs)
    }

    fn parse_doc(&mut self) -> Result<Node> {
        // Parse DocumentStart.
        self.events.next();

        // Parse node.
        let node = self.parse_node()?;

        // Parse DocumentEnd.
        match self.peek() {
            NextEvent::DocumentEnd => {
                self.events.next();
            }
            _ => return Err(self.unexpected("document end")),
        }

        // Return result.
        Ok(node)
    }

    fn parse_node(&mut self) -> Result<Node> {
        if self.peek_tagged() {
            return Err(self.malformed("yaml tags are not supported"));
        }

        match self.peek() {
            NextEvent::Sequence => self.parse_sequence(),
            NextEvent::Mapping => self.parse_mapping(),
            NextEvent::Scalar => self.parse_scalar(),
            NextEvent::Alias => Err(self.malformed("yaml aliases are not supported")),
            _ => Err(self.unexpected("node")),
        }
    }

    fn parse_sequence(&mut self) -> Result<Node> {
        // Parse SequenceStart.
        self.events.next();

        // Parse nodes.
        let mut values = Vec::new();
        loop {
            match self.peek() {
                NextEvent::SequenceEnd => break,
                _ => {
                    let value = self.parse_node()?;
                    values.push(value);
                }
            }
        }

        // Parse SequenceEnd.
        self.events.next();

        // Return result.
        Ok(Node::Sequence(values))
    }

    fn parse_mapping(&mut self) -> Result<Node> {
        // Parse MappingStart.
        self.events.next();

        // Parse entries.
        let mut map = Mapping::new();
        loop {
            let line = match self.events.peek() {
                Some((_, mark)) => mark.line(),
                None => 0,
            };

            let key = match self.peek() {
                NextEvent::MappingEnd => break,
                NextEvent::Scalar => self.parse_scalar()?,
                _ => return Err(self.malformed("mapping keys must be scalars")),
            };
            let Node::Scalar(Scalar { text: key, .. }) = key else {
                return Err(self.malformed("mapping keys must be scalars"));
            };

            let value = self.parse_node()?;

            if map.contains_key(&key) {
                return Err(Error::DuplicateKey {
                    path: self.path.to_path_buf(),
                    key,
                    line,
                });
            }
            map.insert(key, value);
        }

        // Parse MappingEnd.
        self.events.next();

        // Return result.
        Ok(Node::Mapping(map))
    }

    fn parse_scalar(&mut self) -> Result<Node> {
        // Parse Scalar.
        if self.peek_tagged() {
            return Err(self.malformed("yaml tags are not supported"));
        }
        let Some((Event::Scalar(value, style, ..), _)) = self.events.next() else {
            return Err(self.unexpected("scalar"));
        };

        let style = match style {
            TScalarStyle::Plain => ScalarStyle::Plain,
            _ => ScalarStyle::Quoted,
        };
        Ok(Node::Scalar(Scalar { text: value, style }))
    }

    fn peek(&mut self) -> NextEvent {
        match self.events.peek() {
            Some((event, _)) => match event {
                Event::StreamStart => NextEvent::StreamStart,
                Event::StreamEnd => NextEvent::StreamEnd,
                Event::DocumentStart => NextEvent::DocumentStart,
                Event::DocumentEnd => NextEvent::DocumentEnd,
                Event::SequenceStart(..) => NextEvent::Sequence,
                Event::SequenceEnd => NextEvent::SequenceEnd,
                Event::MappingStart(..) => NextEvent::Mapping,
                Event::MappingEnd => NextEvent::MappingEnd,
                Event::Scalar(..) => NextEvent::Scalar,
                Event::Alias(..) => NextEvent::Alias,
                _ => NextEvent::Other,
            },
            None => NextEvent::Eof,
        }
    }

    fn peek_tagged(&mut self) -> bool {
        matches!(
            self.events.peek(),
            Some((
                Event::Scalar(_, _, _, Some(_)) | Event::SequenceStart(_, Some(_)) | Event::MappingStart(_, Some(_)),
                _
            ))
        )
    }

    fn unexpected(&mut self, expected: &str) -> Error {
        let message = match self.events.peek() {
            Some((event, mark)) => format!("line {}: expected {}, found {:?}", mark.line(), expected, event),
            None => format!("expected {}, found end of input", expected),
        };
        Error::MalformedDocument {
            path: self.path.to_path_buf(),
            message,
        }
    }

    fn malformed(&mut self, message: &str) -> Error {
        let message = match self.events.peek() {
            Some((_, mark)) => format!("line {}: {}", mark.line(), message),
            None => message.to_string(),
        };
        Error::MalformedDocument {
            path: self.path.to_path_buf(),
            message,
        }
    }
}

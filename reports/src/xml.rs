use std::io::BufRead;

use quick_xml::{events::Event, Reader};

use crate::error::ReportParseError;

/// Pulls events from a report while keeping track of element depth, so a
/// truncated document is reported instead of silently ending early.
pub(crate) struct DocumentReader<R> {
    path: String,
    reader: Reader<R>,
    buf: Vec<u8>,
    open_elements: usize,
    seen_element: bool,
}

impl<R: BufRead> DocumentReader<R> {
    pub fn new<T: Into<String>>(path: T, xml: R) -> Self {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        Self {
            path: path.into(),
            reader,
            buf: Vec::new(),
            open_elements: 0,
            seen_element: false,
        }
    }

    /// Next event with the depth of the element it belongs to (the root is at depth 1).
    /// `None` once the document is complete.
    pub fn next_event(&mut self) -> Result<Option<(Event<'_>, usize)>, ReportParseError> {
        self.buf.clear();
        let event = match self.reader.read_event_into(&mut self.buf) {
            Ok(event) => event,
            Err(source) => {
                return Err(ReportParseError::Xml {
                    path: self.path.clone(),
                    position: self.reader.buffer_position() as u64,
                    source,
                })
            }
        };

        let depth = match &event {
            Event::Start(_) => {
                self.seen_element = true;
                self.open_elements += 1;
                self.open_elements
            }
            Event::Empty(_) => {
                self.seen_element = true;
                self.open_elements + 1
            }
            Event::End(_) => {
                let depth = self.open_elements;
                self.open_elements = self.open_elements.saturating_sub(1);
                depth
            }
            Event::Eof => {
                if !self.seen_element {
                    return Err(ReportParseError::EmptyDocument {
                        path: self.path.clone(),
                    });
                }
                if self.open_elements > 0 {
                    return Err(ReportParseError::UnexpectedEof {
                        path: self.path.clone(),
                        open_elements: self.open_elements,
                    });
                }
                return Ok(None);
            }
            _ => self.open_elements,
        };
        Ok(Some((event, depth)))
    }

    /// Wraps a failure to decode the event just returned by [`Self::next_event`].
    pub fn encoding_error(&self, source: quick_xml::Error) -> ReportParseError {
        ReportParseError::Encoding {
            path: self.path.clone(),
            position: self.reader.buffer_position() as u64,
            source,
        }
    }
}

/// Attribute and text helpers. Bytes that are not valid UTF-8 and broken
/// escapes are errors, never silently dropped.
pub(crate) mod parse_attr {
    use std::str::FromStr;

    use constants::MAX_TEXT_FIELD_SIZE;
    use quick_xml::events::{BytesStart, BytesText};

    use crate::string_safety::safe_truncate_str;

    pub fn string(e: &BytesStart, attr_name: &str) -> quick_xml::Result<Option<String>> {
        let Some(attr) = e.try_get_attribute(attr_name)? else {
            return Ok(None);
        };
        let value = attr.unescape_value()?;
        let value = value.trim();
        Ok((!value.is_empty()).then(|| String::from(value)))
    }

    pub fn text_field(e: &BytesStart, attr_name: &str) -> quick_xml::Result<Option<String>> {
        Ok(string(e, attr_name)?
            .map(|value| String::from(safe_truncate_str::<MAX_TEXT_FIELD_SIZE>(&value))))
    }

    /// A value that is present but not a valid `T` reads as absent.
    pub fn number<T: FromStr>(e: &BytesStart, attr_name: &str) -> quick_xml::Result<Option<T>> {
        Ok(string(e, attr_name)?.and_then(|value| value.parse::<T>().ok()))
    }

    pub fn text(e: &BytesText) -> quick_xml::Result<String> {
        Ok(String::from(e.unescape()?.as_ref()))
    }
}

pub(crate) fn tag_name(name: &[u8]) -> quick_xml::Result<String> {
    Ok(String::from(std::str::from_utf8(name)?))
}

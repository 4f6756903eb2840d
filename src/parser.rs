use crate::models::RawPage;
use anyhow::{Context, Result};
use bzip2::read::MultiBzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufReader, Read};
use std::sync::Arc;
use thiserror::Error;

const READ_BUF_SIZE: usize = 64 * 1024;

/// How a dump read can fail.
///
/// Truncation is the expected failure mode for partial or test dumps: the
/// reader stops producing pages, and the caller treats it as end-of-stream
/// that still requires a downstream flush. Everything else is a hard error,
/// surfaced after the caller has had its flush chance.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("dump XML ends early or is malformed near the cut: {0}")]
    Truncated(String),
    #[error("undecodable content in dump")]
    Malformed(#[source] quick_xml::Error),
    #[error("I/O error reading dump")]
    Io(#[source] Arc<std::io::Error>),
}

impl DumpError {
    pub fn is_truncation(&self) -> bool {
        matches!(self, DumpError::Truncated(_))
    }
}

fn classify(err: quick_xml::Error) -> DumpError {
    use quick_xml::Error as Xml;
    match err {
        Xml::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            DumpError::Truncated(e.to_string())
        }
        Xml::Io(e) => DumpError::Io(e),
        // The input ended inside markup; a cut bz2 stream or a partial
        // download lands here
        Xml::UnexpectedEof(what) => DumpError::Truncated(what),
        other => DumpError::Malformed(other),
    }
}

#[derive(PartialEq)]
enum Capture {
    Idle,
    Title,
    Text,
}

/// Streaming reader over a Wikipedia XML dump.
///
/// Yields one [`RawPage`] per `<page>` element in document order, holding at
/// most one page's text at a time. Element names are compared by local name
/// so namespace-prefixed dumps parse the same as plain ones. The body is the
/// first `<text>` of the page's last `<revision>`.
pub struct DumpReader {
    reader: Reader<BufReader<Box<dyn Read + Send>>>,
    buf: Vec<u8>,
    done: bool,
}

impl DumpReader {
    /// Opens a dump file, decompressing transparently when the path ends in
    /// `.bz2`. Multistream archives are handled; real dumps are usually
    /// published that way.
    pub fn open(path: &str) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open dump file: {path}"))?;
        let stream: Box<dyn Read + Send> = if path.ends_with(".bz2") {
            Box::new(MultiBzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(Self::from_stream(stream))
    }

    /// Wraps an arbitrary byte stream of uncompressed dump XML.
    pub fn from_reader<R: Read + Send + 'static>(stream: R) -> Self {
        Self::from_stream(Box::new(stream))
    }

    fn from_stream(stream: Box<dyn Read + Send>) -> Self {
        let reader = Reader::from_reader(BufReader::with_capacity(READ_BUF_SIZE, stream));
        Self {
            reader,
            buf: Vec::new(),
            done: false,
        }
    }
}

impl Iterator for DumpReader {
    type Item = Result<RawPage, DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut in_page = false;
        let mut in_revision = false;
        let mut capture = Capture::Idle;
        let mut title = String::new();
        let mut body: Option<String> = None;
        // First <text> of the revision currently being read
        let mut rev_text: Option<String> = None;

        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"page" => {
                        in_page = true;
                        in_revision = false;
                        title.clear();
                        body = None;
                    }
                    b"title" if in_page => capture = Capture::Title,
                    b"revision" if in_page => {
                        in_revision = true;
                        rev_text = None;
                    }
                    b"text" if in_revision && rev_text.is_none() => {
                        rev_text = Some(String::new());
                        capture = Capture::Text;
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if capture != Capture::Idle {
                        match e.unescape() {
                            Ok(cow) => match capture {
                                Capture::Title => title.push_str(&cow),
                                Capture::Text => {
                                    if let Some(text) = rev_text.as_mut() {
                                        text.push_str(&cow);
                                    }
                                }
                                Capture::Idle => {}
                            },
                            Err(err) => {
                                self.done = true;
                                return Some(Err(classify(err)));
                            }
                        }
                    }
                }
                Ok(Event::CData(e)) => {
                    if capture == Capture::Text {
                        if let Some(text) = rev_text.as_mut() {
                            text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                        }
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"title" | b"text" => capture = Capture::Idle,
                    b"revision" => {
                        in_revision = false;
                        // A later revision's text replaces an earlier one
                        if rev_text.is_some() {
                            body = rev_text.take();
                        }
                    }
                    b"page" if in_page => {
                        return Some(Ok(RawPage {
                            title: std::mem::take(&mut title),
                            body,
                        }));
                    }
                    _ => {}
                },
                Ok(Event::Eof) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(err) => {
                    self.done = true;
                    return Some(Err(classify(err)));
                }
            }
        }
    }
}

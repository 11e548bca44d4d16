//! Result-set manifest parsing
//!
//! A manifest lists its files as repeated `file` elements, each carrying the
//! file name in a nested `filename` element. Everything else in the document
//! is opaque here.

use std::path::{Component, Path};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::error::VerifyError;

/// One file the manifest expects to exist locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub filename: String,
}

/// Parsed manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Entries in document order
    pub files: Vec<FileEntry>,
}

impl Manifest {
    /// Parse manifest XML
    pub fn parse(data: &[u8]) -> Result<Self, VerifyError> {
        parse_manifest(data)
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.filename.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Default)]
struct Slot {
    claimed: bool,
    filename: Option<String>,
}

/// A `filename` element being read, and the `file` slots it belongs to
struct Capture {
    depth: usize,
    owners: Vec<usize>,
    text: String,
}

/// Extract the expected file list from manifest XML.
///
/// Each `file` element takes the text of the first `filename` element nested
/// anywhere below it. A `file` without one, or with an empty one, makes the
/// manifest malformed.
///
/// Surrounding whitespace in a filename is not significant and is trimmed.
/// Filenames must be relative paths of plain components; absolute paths and
/// `.`/`..` components are rejected.
pub fn parse_manifest(data: &[u8]) -> Result<Manifest, VerifyError> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();

    let mut depth = 0usize;
    let mut seen_root = false;
    let mut root_closed = false;
    let mut slots: Vec<Slot> = Vec::new();
    let mut open_files: Vec<usize> = Vec::new();
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if depth == 0 && root_closed {
                    return Err(VerifyError::Parse("multiple root elements".to_string()));
                }
                depth += 1;
                seen_root = true;

                match e.name().as_ref() {
                    b"file" => {
                        slots.push(Slot::default());
                        open_files.push(slots.len() - 1);
                    }
                    b"filename" => {
                        let owners = claim(&mut slots, &open_files);
                        if capture.is_none() && !owners.is_empty() {
                            capture = Some(Capture {
                                depth,
                                owners,
                                text: String::new(),
                            });
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if depth == 0 && root_closed {
                    return Err(VerifyError::Parse("multiple root elements".to_string()));
                }
                if depth == 0 {
                    root_closed = true;
                }
                seen_root = true;

                match e.name().as_ref() {
                    // Never gets a filename; reported once the document is read
                    b"file" => slots.push(Slot::default()),
                    b"filename" => {
                        if !claim(&mut slots, &open_files).is_empty() {
                            return Err(VerifyError::Parse("empty <filename> element".to_string()));
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                if let Some(c) = capture.as_mut() {
                    c.text.push_str(&t.unescape()?);
                } else if depth == 0 && !t.iter().all(|b| b.is_ascii_whitespace()) {
                    return Err(VerifyError::Parse("text outside the root element".to_string()));
                }
            }
            Event::CData(t) => {
                if let Some(c) = capture.as_mut() {
                    let text = std::str::from_utf8(&t)
                        .map_err(|e| VerifyError::Parse(format!("invalid UTF-8 in CDATA: {}", e)))?;
                    c.text.push_str(text);
                }
            }
            Event::End(e) => {
                match e.name().as_ref() {
                    b"filename" => {
                        if let Some(c) = capture.take() {
                            if c.depth == depth {
                                finish_capture(c, &mut slots)?;
                            } else {
                                capture = Some(c);
                            }
                        }
                    }
                    b"file" => {
                        open_files.pop();
                    }
                    _ => {}
                }

                depth = depth.saturating_sub(1);
                if depth == 0 {
                    root_closed = true;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(VerifyError::Parse("no root element".to_string()));
    }
    if depth != 0 {
        return Err(VerifyError::Parse(format!(
            "document ended with {} unclosed element(s)",
            depth
        )));
    }

    let files = slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.filename
                .map(|filename| FileEntry { filename })
                .ok_or_else(|| {
                    VerifyError::Parse(format!("<file> element #{} has no <filename>", i + 1))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Manifest { files })
}

/// Mark open `file` elements that have not seen a `filename` yet as owned by
/// the one just opened
fn claim(slots: &mut [Slot], open_files: &[usize]) -> Vec<usize> {
    let mut owners = Vec::new();
    for &idx in open_files {
        if !slots[idx].claimed {
            slots[idx].claimed = true;
            owners.push(idx);
        }
    }
    owners
}

fn finish_capture(capture: Capture, slots: &mut [Slot]) -> Result<(), VerifyError> {
    let filename = capture.text.trim();
    if filename.is_empty() {
        return Err(VerifyError::Parse("empty <filename> element".to_string()));
    }
    if !is_relative_to_folder(filename) {
        return Err(VerifyError::Parse(format!(
            "filename {:?} escapes the analysis folder",
            filename
        )));
    }

    for idx in capture.owners {
        slots[idx].filename = Some(filename.to_string());
    }
    Ok(())
}

/// Joining the name onto a folder stays inside that folder
fn is_relative_to_folder(filename: &str) -> bool {
    Path::new(filename)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

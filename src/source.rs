//! Specification input: an ordered queue of named sources read one line at a
//! time. Sources may be appended while earlier ones are being read.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use grammar::{Error, Location, Result};

pub const STDIN: &str = "STDIN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    Path(PathBuf),
    /// In-memory text, mostly for tests and embedding.
    Text { name: String, text: String },
}

impl Source {
    /// `-` means standard input.
    pub fn from_arg(arg: &str) -> Source {
        if arg == "-" {
            Source::Stdin
        } else {
            Source::Path(PathBuf::from(arg))
        }
    }

    pub fn name(&self) -> String {
        match self {
            Source::Stdin => STDIN.to_owned(),
            Source::Path(path) => path.display().to_string(),
            Source::Text { name, .. } => name.clone(),
        }
    }

    fn open(&self) -> Result<Box<dyn BufRead>> {
        match self {
            Source::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
            Source::Path(path) => {
                let file = File::open(path)
                    .map_err(|_| Error::global(format!("{}: error opening file", self.name())))?;
                Ok(Box::new(BufReader::new(file)))
            }
            Source::Text { text, .. } => Ok(Box::new(io::Cursor::new(text.clone().into_bytes()))),
        }
    }
}

struct Open {
    name: String,
    reader: Box<dyn BufRead>,
    line_no: usize,
}

/// FIFO of pending sources with a single reader. The tail is checked again
/// each time a source runs dry, so sources queued mid-read are never missed.
pub struct SourceQueue {
    pending: VecDeque<Source>,
    current: Option<Open>,
}

impl SourceQueue {
    pub fn new(sources: impl IntoIterator<Item = Source>) -> Self {
        SourceQueue {
            pending: sources.into_iter().collect(),
            current: None,
        }
    }

    /// Appends a source after everything already queued.
    pub(crate) fn enqueue(&mut self, source: Source) {
        self.pending.push_back(source);
    }

    /// The next line across all sources, trailing whitespace removed.
    pub fn next_line(&mut self) -> Result<Option<Location>> {
        loop {
            if self.current.is_none() {
                let source = match self.pending.pop_front() {
                    Some(source) => source,
                    None => return Ok(None),
                };
                self.current = Some(Open {
                    name: source.name(),
                    reader: source.open()?,
                    line_no: 0,
                });
            }
            if let Some(open) = self.current.as_mut() {
                let mut buf = String::new();
                let n = open
                    .reader
                    .read_line(&mut buf)
                    .map_err(|e| Error::global(format!("{}: {}", open.name, e)))?;
                if n == 0 {
                    self.current = None;
                    continue;
                }
                open.line_no += 1;
                return Ok(Some(Location::new(
                    open.name.clone(),
                    open.line_no,
                    buf.trim_end(),
                )));
            }
        }
    }
}

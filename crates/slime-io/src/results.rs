//! The results file: one `;`-separated line per matching position.
//!
//! ```text
//! block-position;chunk-position;blockSize;chunkSize
//! 199,-37;12:7,-3:11;4862/49640;21/222
//! ```

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use slime_core::MaskRecord;
use slime_geom::Position;

use crate::format::{block_ratio, chunk_ratio};

pub const DELIMITER: char = ';';
pub const HEADER: &str = "block-position;chunk-position;blockSize;chunkSize";

#[derive(Debug)]
pub enum ResultsError {
    Io(io::Error),
}

impl fmt::Display for ResultsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultsError::Io(e) => write!(f, "results file error: {}", e),
        }
    }
}

impl std::error::Error for ResultsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResultsError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for ResultsError {
    fn from(e: io::Error) -> Self {
        ResultsError::Io(e)
    }
}

pub fn format_record(record: &MaskRecord) -> String {
    format!(
        "{}{d}{}{d}{}{d}{}",
        record.position.block_string(),
        record.position,
        block_ratio(record),
        chunk_ratio(record),
        d = DELIMITER
    )
}

/// First field of a results line that reads as a position. `None` for
/// blank lines, `#` comments and lines without a position.
pub fn parse_line(line: &str) -> Option<Position> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    line.split(DELIMITER).find_map(|field| field.parse().ok())
}

/// Writes matches as they arrive. Every line is flushed so the file is
/// usable even if the process is killed mid-search.
pub struct ResultsWriter<W: Write> {
    out: W,
    lines: u64,
}

impl ResultsWriter<BufWriter<File>> {
    /// Opens `path`, truncating it unless `append` is set. The header is
    /// written unless appending to a file that already has content.
    pub fn create(path: &Path, append: bool) -> Result<Self, ResultsError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        let has_content = append && file.metadata()?.len() > 0;
        ResultsWriter::new(BufWriter::new(file), !has_content)
    }
}

impl<W: Write> ResultsWriter<W> {
    pub fn new(out: W, header: bool) -> Result<Self, ResultsError> {
        let mut writer = Self { out, lines: 0 };
        if header {
            writer.write_line(HEADER)?;
        }
        Ok(writer)
    }

    pub fn write(&mut self, record: &MaskRecord) -> Result<(), ResultsError> {
        self.write_line(&format_record(record))?;
        self.lines += 1;
        Ok(())
    }

    /// Records written, not counting the header.
    pub fn records_written(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(mut self) -> Result<W, ResultsError> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_line(&mut self, line: &str) -> Result<(), ResultsError> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Streams positions out of a results file, counting what it skips.
pub struct ResultsReader<R: BufRead> {
    input: R,
    line: String,
    lines_read: u64,
    bytes_read: u64,
    total_bytes: u64,
    parse_errors: u64,
}

impl ResultsReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, ResultsError> {
        let file = File::open(path)?;
        let total_bytes = file.metadata()?.len();
        Ok(ResultsReader::new(BufReader::new(file), total_bytes))
    }
}

impl<R: BufRead> ResultsReader<R> {
    pub fn new(input: R, total_bytes: u64) -> Self {
        Self {
            input,
            line: String::new(),
            lines_read: 0,
            bytes_read: 0,
            total_bytes,
            parse_errors: 0,
        }
    }

    /// Next position in the file, or `None` at the end. A line with no
    /// position is counted and warned about, except the header line.
    pub fn next_position(&mut self) -> Result<Option<Position>, ResultsError> {
        loop {
            self.line.clear();
            let n = self.input.read_line(&mut self.line)?;
            if n == 0 {
                return Ok(None);
            }
            self.bytes_read += n as u64;
            self.lines_read += 1;

            let text = self.line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            match parse_line(text) {
                Some(pos) => return Ok(Some(pos)),
                None if self.lines_read == 1 => {}
                None => {
                    self.parse_errors += 1;
                    log::warn!(
                        target: "results",
                        "line {}: no position in '{}'",
                        self.lines_read,
                        text
                    );
                }
            }
        }
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn parse_errors(&self) -> u64 {
        self.parse_errors
    }
}

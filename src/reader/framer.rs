use std::io::BufRead;

use crate::error::{CustomError, Result};
use crate::reader::Header;

const FILE_FORMAT_PREFIX: &str = "##fileformat=VCFv4";
const HEADER_PREFIX: &str = "#CHROM";

/// A batch of raw data lines with terminators removed.
pub type Batch = Vec<Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    Cr,
}

impl LineEnding {
    /// Decided by the first `\n` or `\r` in `bytes`; defaults to `\n`.
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(idx) if bytes[idx] == b'\r' => {
                if bytes.get(idx + 1) == Some(&b'\n') {
                    LineEnding::CrLf
                } else {
                    LineEnding::Cr
                }
            }
            _ => LineEnding::Lf,
        }
    }

    fn terminator(self) -> u8 {
        match self {
            LineEnding::Lf | LineEnding::CrLf => b'\n',
            LineEnding::Cr => b'\r',
        }
    }
}

/// Splits a VCF byte stream into header and raw data lines.
pub struct LineFramer<R: BufRead> {
    reader: R,
    ending: LineEnding,
}

impl<R: BufRead> LineFramer<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let buffer = reader
            .fill_buf()
            .map_err(|e| CustomError::ReadWithoutPath { source: e })?;
        if buffer.is_empty() {
            return Err(CustomError::EmptyInput);
        }
        let ending = LineEnding::detect(buffer);
        Ok(Self { reader, ending })
    }

    pub fn line_ending(&self) -> LineEnding {
        self.ending
    }

    /// Reads one line into `buf`, replacing its contents. Returns false at end of stream.
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<bool> {
        buf.clear();
        let n = self
            .reader
            .read_until(self.ending.terminator(), buf)
            .map_err(|e| CustomError::ReadWithoutPath { source: e })?;
        if n == 0 {
            return Ok(false);
        }
        if buf.last() == Some(&self.ending.terminator()) {
            buf.pop();
        }
        if self.ending == LineEnding::CrLf && buf.last() == Some(&b'\r') {
            buf.pop();
        }
        Ok(true)
    }

    /// Checks the file format line, skips metadata and parses the `#CHROM` line.
    pub fn read_header(&mut self) -> Result<Header> {
        let mut line = Vec::with_capacity(10_000);
        if !self.read_line(&mut line)? {
            return Err(CustomError::EmptyInput);
        }
        if !line.starts_with(FILE_FORMAT_PREFIX.as_bytes()) {
            return Err(CustomError::FileFormat {
                line: String::from_utf8_lossy(&line).into_owned(),
            });
        }

        loop {
            if !self.read_line(&mut line)? {
                return Err(CustomError::MissingHeader {
                    line: String::new(),
                });
            }
            if line.starts_with(HEADER_PREFIX.as_bytes()) {
                break;
            }
            if !line.starts_with(b"#") {
                return Err(CustomError::MissingHeader {
                    line: String::from_utf8_lossy(&line).into_owned(),
                });
            }
        }

        let text = std::str::from_utf8(&line).map_err(|e| CustomError::HeaderUtf8 { source: e })?;
        Header::parse(text.trim_end())
    }

    /// Reads up to `batch_size` non-empty data lines. Returns `None` once the stream is exhausted.
    pub fn next_batch(&mut self, batch_size: usize) -> Result<Option<Batch>> {
        let mut batch = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            let mut line = Vec::new();
            if !self.read_line(&mut line)? {
                break;
            }
            if line.is_empty() {
                continue;
            }
            batch.push(line);
        }
        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }
}

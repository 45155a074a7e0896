// SPDX-License-Identifier: MIT

//! A hex dump of the report descriptor bytes.
//!
//! The source accepts whitespace-separated groups of hex digit pairs,
//! optionally `0x`-prefixed and `,`-terminated, with `#` starting a
//! comment that runs to the end of the line. This reads the output of
//! e.g. `hid-decode` or the `code` sink with comments stripped.
//!
//! The sink writes 16 bytes per line separated by single spaces.

use super::SinkBuf;
use crate::hid::{HidError, Item};
use crate::strm::{OutBuf, Sink, Source};
use crate::{Error, Position, Result};

use hex::FromHexError;

const BYTES_PER_LINE: usize = 16;

pub struct HexSource {
    bytes: Vec<u8>,
    /// Line and column of every byte
    positions: Vec<Position>,
    offset: usize,
    position: Position,
}

impl HexSource {
    /// Parses the complete text, failing on the first malformed token.
    pub fn new(text: &[u8]) -> Result<HexSource> {
        let mut bytes = Vec::new();
        let mut positions = Vec::new();

        for (lineno, line) in text.split(|b| *b == b'\n').enumerate() {
            let line = match line.iter().position(|b| *b == b'#') {
                Some(idx) => &line[..idx],
                None => line,
            };
            let mut col = 0;
            while col < line.len() {
                if line[col].is_ascii_whitespace() {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < line.len() && !line[col].is_ascii_whitespace() {
                    col += 1;
                }
                let position = |offset: usize| Position::LineColumn {
                    line: lineno + 1,
                    column: start + offset + 1,
                };

                let mut token = &line[start..col];
                let mut skip = 0;
                if let Some(rest) = token.strip_prefix(b"0x") {
                    token = rest;
                    skip = 2;
                }
                if let Some(rest) = token.strip_suffix(b",") {
                    token = rest;
                }
                let decoded = hex::decode(token).map_err(|e| {
                    let column = match e {
                        FromHexError::InvalidHexCharacter { index, .. } => skip + index,
                        _ => 0,
                    };
                    Error::InvalidItem {
                        position: position(column),
                        message: format!("Invalid hex \"{}\": {e}", String::from_utf8_lossy(token)),
                    }
                })?;
                bytes.try_reserve(decoded.len())?;
                positions.try_reserve(decoded.len())?;
                for idx in 0..decoded.len() {
                    positions.push(position(skip + idx * 2));
                }
                bytes.extend(decoded);
            }
        }

        Ok(HexSource {
            bytes,
            positions,
            offset: 0,
            position: Position::LineColumn { line: 1, column: 1 },
        })
    }
}

impl Source for HexSource {
    fn get(&mut self) -> Result<Option<Item>> {
        if self.offset >= self.bytes.len() {
            return Ok(None);
        }
        self.position = self.positions[self.offset];
        let (item, size) = Item::decode(&self.bytes[self.offset..]).map_err(|e| match e {
            HidError::InsufficientData => Error::Incomplete {
                position: self.position,
            },
            HidError::InvalidData { message } => Error::InvalidItem {
                position: self.position,
                message,
            },
        })?;
        self.offset += size;
        Ok(Some(item))
    }

    fn position(&self) -> Position {
        self.position
    }
}

pub struct HexSink<'a> {
    out: SinkBuf<'a>,
    column: usize,
}

impl<'a> HexSink<'a> {
    pub fn new(out: OutBuf<'a>) -> HexSink<'a> {
        HexSink {
            out: SinkBuf::new(out),
            column: 0,
        }
    }
}

impl Sink for HexSink<'_> {
    fn put(&mut self, item: &Item) -> Result<()> {
        for byte in item.encode() {
            let sep = match self.column {
                0 => "",
                _ => " ",
            };
            self.out.write_str(sep)?;
            self.out.write_str(&hex::encode([byte]))?;
            self.column += 1;
            if self.column == BYTES_PER_LINE {
                self.out.write_str("\n")?;
                self.column = 0;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.column > 0 {
            self.out.write_str("\n")?;
            self.column = 0;
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        self.out.cleanup();
        self.column = 0;
    }

    fn take(&mut self) -> Option<Vec<u8>> {
        self.out.take()
    }
}

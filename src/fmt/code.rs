// SPDX-License-Identifier: MIT

//! The descriptor bytes as the body of a C array initializer, each item
//! on its own line and followed by its description:
//!
//! ```text
//! 0x05, 0x01, /* Usage Page (Generic Desktop) */
//! 0x09, 0x02, /* Usage (Mouse)                */
//! 0xA1, 0x01, /* Collection (Application)     */
//! 0xC0        /* End Collection               */
//! ```
//!
//! Comments start at the first tab stop past the longest byte list and
//! are indented by collection depth, one tab stop per level.

use super::spec::Rows;
use super::SinkBuf;
use crate::hid::Item;
use crate::opt::{OptList, OptSpec, OptType, Options};
use crate::strm::{OutBuf, Sink};
use crate::Result;

/// The widest tab stop, wider ones are cut down to it.
pub const MAX_TABSTOP: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSinkConfig {
    /// Spaces per tab stop, 1 to [MAX_TABSTOP]
    pub tabstop: u32,
    pub comments: bool,
}

impl Default for CodeSinkConfig {
    fn default() -> Self {
        CodeSinkConfig {
            tabstop: 4,
            comments: true,
        }
    }
}

impl Options for CodeSinkConfig {
    const SPEC: &'static [OptSpec] = &[
        OptSpec::new("tabstop", OptType::U32, Some("4"), "number of spaces per tab"),
        OptSpec::new("comments", OptType::Boolean, Some("yes"), "describe each item"),
    ];

    fn from_opts(list: &OptList) -> Self {
        CodeSinkConfig {
            tabstop: list.get_u32("tabstop").unwrap_or(4).clamp(1, MAX_TABSTOP),
            comments: list.get_bool("comments").unwrap_or(true),
        }
    }
}

pub struct CodeSink<'a> {
    out: SinkBuf<'a>,
    config: CodeSinkConfig,
    rows: Rows,
}

impl<'a> CodeSink<'a> {
    pub fn new(out: OutBuf<'a>, config: CodeSinkConfig) -> CodeSink<'a> {
        CodeSink {
            out: SinkBuf::new(out),
            config,
            rows: Rows::default(),
        }
    }
}

impl Sink for CodeSink<'_> {
    fn put(&mut self, item: &Item) -> Result<()> {
        self.rows.put(item)
    }

    fn flush(&mut self) -> Result<()> {
        let rows = self.rows.take();
        let tabstop = self.config.tabstop.clamp(1, MAX_TABSTOP) as usize;
        let last = rows.len().saturating_sub(1);

        let code: Vec<String> = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let bytes: Vec<String> = row.bytes.iter().map(|b| format!("0x{b:02X}")).collect();
                let mut line = bytes.join(", ");
                if idx != last {
                    line.push(',');
                }
                line
            })
            .collect();

        if !self.config.comments {
            for line in code {
                self.out.write_str(&format!("{line}\n"))?;
            }
            return Ok(());
        }

        let column = (code.iter().map(|c| c.len()).max().unwrap_or(0) / tabstop + 1) * tabstop;
        let texts: Vec<String> = rows
            .iter()
            .map(|row| format!("{}{}", " ".repeat(row.depth as usize * tabstop), row.text))
            .collect();
        let width = texts.iter().map(|t| t.len()).max().unwrap_or(0);
        for (line, text) in code.iter().zip(texts.iter()) {
            self.out
                .write_str(&format!("{line:<column$}/* {text:<width$} */\n"))?;
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        self.rows = Rows::default();
        self.out.cleanup();
    }

    fn take(&mut self) -> Option<Vec<u8>> {
        self.out.take()
    }
}

// SPDX-License-Identifier: MIT

//! The format backends.
//!
//! Every format provides a [Source], a [Sink] or both, configured with an
//! option string (see [crate::opt]):
//!
//! | Format | Source | Sink | Description |
//! |--------|--------|------|-------------|
//! | `natv` | yes    | yes  | binary report descriptor |
//! | `xml`  | yes    | yes  | XML document with nested collections |
//! | `hex`  | yes    | yes  | hexadecimal bytes |
//! | `spec` | no     | yes  | item list as in the HID specification examples |
//! | `code` | no     | yes  | C array initializer with comments |
//!
//! ```
//! # use hidrd::fmt::Format;
//! let format: Format = "XML".parse().unwrap();
//! assert_eq!(format, Format::Xml);
//! assert!(!Format::Spec.has_source());
//! ```

pub mod code;
pub mod hex;
pub mod natv;
pub mod spec;
pub mod xml;

use crate::opt::{NoOptions, OptSpec, Options};
use crate::strm::{OutBuf, Sink, Source};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Natv,
    Xml,
    Hex,
    Spec,
    Code,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Natv,
        Format::Xml,
        Format::Hex,
        Format::Spec,
        Format::Code,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Format::Natv => "natv",
            Format::Xml => "xml",
            Format::Hex => "hex",
            Format::Spec => "spec",
            Format::Code => "code",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Format::Natv => "native binary",
            Format::Xml => "XML",
            Format::Hex => "hex dump",
            Format::Spec => "specification example",
            Format::Code => "C source code",
        }
    }

    pub fn has_source(&self) -> bool {
        matches!(self, Format::Natv | Format::Xml | Format::Hex)
    }

    pub fn has_sink(&self) -> bool {
        true
    }

    /// The options accepted by the source of this format.
    pub fn source_options(&self) -> &'static [OptSpec] {
        NoOptions::SPEC
    }

    /// The options accepted by the sink of this format.
    pub fn sink_options(&self) -> &'static [OptSpec] {
        match self {
            Format::Natv | Format::Hex => NoOptions::SPEC,
            Format::Xml => xml::XmlSinkConfig::SPEC,
            Format::Spec => spec::SpecSinkConfig::SPEC,
            Format::Code => code::CodeSinkConfig::SPEC,
        }
    }

    /// Open a source reading `input`, configured by the option string
    /// `opts`.
    pub fn source<'a>(&self, input: &'a [u8], opts: &str) -> Result<Box<dyn Source + 'a>> {
        NoOptions::parse(opts)?;
        let source: Box<dyn Source + 'a> = match self {
            Format::Natv => Box::new(natv::NatvSource::new(input)),
            Format::Xml => Box::new(xml::XmlSource::new(input)?),
            Format::Hex => Box::new(hex::HexSource::new(input)?),
            Format::Spec | Format::Code => {
                return Err(Error::Unsupported {
                    format: self.name(),
                    direction: "source",
                })
            }
        };
        Ok(source)
    }

    /// Open a sink writing to `out`, configured by the option string
    /// `opts`.
    pub fn sink<'a>(&self, out: OutBuf<'a>, opts: &str) -> Result<Box<dyn Sink + 'a>> {
        let sink: Box<dyn Sink + 'a> = match self {
            Format::Natv => {
                NoOptions::parse(opts)?;
                Box::new(natv::NatvSink::new(out))
            }
            Format::Hex => {
                NoOptions::parse(opts)?;
                Box::new(hex::HexSink::new(out))
            }
            Format::Xml => Box::new(xml::XmlSink::new(out, xml::XmlSinkConfig::parse(opts)?)),
            Format::Spec => Box::new(spec::SpecSink::new(out, spec::SpecSinkConfig::parse(opts)?)),
            Format::Code => Box::new(code::CodeSink::new(out, code::CodeSinkConfig::parse(opts)?)),
        };
        Ok(sink)
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Format, String> {
        let s = s.trim();
        Format::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown format \"{s}\""))
    }
}

/// Output buffer bookkeeping shared by the sinks: everything written
/// after `start` is discarded on cleanup.
#[derive(Debug)]
pub(crate) struct SinkBuf<'a> {
    out: OutBuf<'a>,
    start: usize,
}

impl<'a> SinkBuf<'a> {
    pub(crate) fn new(out: OutBuf<'a>) -> SinkBuf<'a> {
        let start = out.len();
        SinkBuf { out, start }
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write(bytes)
    }

    pub(crate) fn write_str(&mut self, s: &str) -> Result<()> {
        self.out.write_str(s)
    }

    pub(crate) fn cleanup(&mut self) {
        self.out.truncate(self.start);
    }

    pub(crate) fn take(&mut self) -> Option<Vec<u8>> {
        let buf = self.out.take()?;
        self.start = 0;
        Some(buf)
    }
}

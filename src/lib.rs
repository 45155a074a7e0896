// SPDX-License-Identifier: MIT

//! A codec for HID Report Descriptors.
//!
//! This crate splits a binary HID Report Descriptor into its items
//! ([hid]), interprets those items ([item]) and converts the resulting item
//! stream between the binary wire format and a number of textual
//! representations ([fmt]).
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).
//!
//! # Converting a report descriptor
//!
//! ```
//! # use hidrd::fmt::Format;
//! # use hidrd::strm::OutBuf;
//! let bytes: &[u8] = &[0x05, 0x0d, 0x09, 0x02, 0xa1, 0x01, 0x85, 0x07, 0xc0];
//! let mut source = Format::Natv.source(bytes, "").unwrap();
//! let mut sink = Format::Xml.sink(OutBuf::default(), "format=no").unwrap();
//! hidrd::strm::copy(source.as_mut(), sink.as_mut()).unwrap();
//! let xml = String::from_utf8(sink.take().unwrap()).unwrap();
//! assert!(xml.contains("<collection type=\"application\">"));
//! ```
//!
//! # Tree-shaped formats
//!
//! Collections, Push/Pop and Delimiter sets are nested in tree formats. See
//! [fold] for how the three bracket constructs are projected onto one tree
//! even when a descriptor interleaves them.

use thiserror::Error;

pub mod context;
pub mod element;
pub mod fmt;
pub mod fold;
pub mod hid;
pub mod item;
pub mod opt;
pub mod strm;
pub mod tree;
pub mod types;
pub mod unit;
pub mod usage;

pub use context::Context;
pub use hid::{Item, ShortType};
pub use item::{CollectionItem, DataFlags, GlobalItem, LocalItem, MainItem, SemanticItem};
pub use types::*;
pub use unit::Unit;

/// Returns early with the given error if the condition does not hold.
#[macro_export]
#[doc(hidden)]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

/// The location of an item in its source, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    /// Byte offset into a binary descriptor
    Offset(usize),
    /// 1-based line and column in a text document
    LineColumn { line: usize, column: usize },
    /// Index of a node in depth-first order
    Node(usize),
    #[default]
    Unknown,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Offset(offset) => write!(f, "offset {offset:#x}"),
            Position::LineColumn { line, column } => write!(f, "line {line}, column {column}"),
            Position::Node(index) => write!(f, "node {index}"),
            Position::Unknown => write!(f, "unknown position"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Incomplete item at {position}")]
    Incomplete { position: Position },
    #[error("Invalid item at {position}: {message}")]
    InvalidItem { position: Position, message: String },
    #[error("Unknown element <{name}> at {position}")]
    UnknownElement { name: String, position: Position },
    #[error("Invalid <{name}> element at {position}: {message}")]
    InvalidNode {
        name: String,
        position: Position,
        message: String,
    },
    #[error("XML error at {position}: {message}")]
    Xml { position: Position, message: String },
    #[error("Format \"{format}\" cannot be used as a {direction}")]
    Unsupported {
        format: &'static str,
        direction: &'static str,
    },
    #[error("Memory allocation failed")]
    Alloc(#[from] std::collections::TryReserveError),
    #[error("Invalid options: {0}")]
    Option(#[from] opt::OptError),
    #[error("{0}")]
    Hid(#[from] hid::HidError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

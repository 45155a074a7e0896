// SPDX-License-Identifier: MIT

//! The native format: the binary report descriptor as sent by the device.

use super::SinkBuf;
use crate::hid::{HidError, Item};
use crate::strm::{OutBuf, Sink, Source};
use crate::{Error, Position, Result};

use log::trace;

pub struct NatvSource<'a> {
    bytes: &'a [u8],
    offset: usize,
    position: Position,
}

impl<'a> NatvSource<'a> {
    pub fn new(bytes: &'a [u8]) -> NatvSource<'a> {
        NatvSource {
            bytes,
            offset: 0,
            position: Position::Offset(0),
        }
    }
}

impl Source for NatvSource<'_> {
    fn get(&mut self) -> Result<Option<Item>> {
        if self.offset >= self.bytes.len() {
            return Ok(None);
        }
        self.position = Position::Offset(self.offset);
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

pub struct NatvSink<'a> {
    out: SinkBuf<'a>,
}

impl<'a> NatvSink<'a> {
    pub fn new(out: OutBuf<'a>) -> NatvSink<'a> {
        NatvSink {
            out: SinkBuf::new(out),
        }
    }
}

impl Sink for NatvSink<'_> {
    fn put(&mut self, item: &Item) -> Result<()> {
        trace!("natv: {:02x?}", item.encode());
        self.out.write(&item.encode())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn cleanup(&mut self) {
        self.out.cleanup()
    }

    fn take(&mut self) -> Option<Vec<u8>> {
        self.out.take()
    }
}

// SPDX-License-Identifier: MIT

//! The stream interface every format backend implements.
//!
//! A [Source] produces [Item]s one at a time, a [Sink] consumes them.
//! [copy] connects the two:
//!
//! ```
//! # use hidrd::fmt::Format;
//! # use hidrd::strm::{copy, OutBuf};
//! let mut out = Vec::new();
//! let mut source = Format::Natv.source(&[0x05, 0x01, 0xa4, 0xb4], "").unwrap();
//! let mut sink = Format::Hex.sink(OutBuf::from(&mut out), "").unwrap();
//! assert_eq!(copy(source.as_mut(), sink.as_mut()).unwrap(), 3);
//! drop(sink);
//! assert_eq!(String::from_utf8(out).unwrap(), "05 01 a4 b4\n");
//! ```

use crate::hid::Item;
use crate::{Position, Result};

use log::trace;

/// A pull interface producing items.
pub trait Source {
    /// The next item, or `None` at the end of the input.
    fn get(&mut self) -> Result<Option<Item>>;

    /// The position of the most recently read item for diagnostics.
    fn position(&self) -> Position;
}

/// A push interface consuming items.
pub trait Sink {
    fn put(&mut self, item: &Item) -> Result<()>;

    /// Render any buffered output. Sinks that write as they go only
    /// make sure their output is complete.
    fn flush(&mut self) -> Result<()>;

    /// Discard any output that has not been flushed yet.
    fn cleanup(&mut self);

    /// Hand a library-owned output buffer to the caller. Returns `None`
    /// if the buffer was supplied by the caller.
    fn take(&mut self) -> Option<Vec<u8>>;
}

/// The output buffer of a [Sink], either owned by the sink or
/// borrowed from the caller.
#[derive(Debug)]
pub enum OutBuf<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a mut Vec<u8>),
}

impl Default for OutBuf<'_> {
    fn default() -> Self {
        OutBuf::Owned(Vec::new())
    }
}

impl<'a> From<&'a mut Vec<u8>> for OutBuf<'a> {
    fn from(buf: &'a mut Vec<u8>) -> Self {
        OutBuf::Borrowed(buf)
    }
}

impl OutBuf<'_> {
    pub fn buf(&mut self) -> &mut Vec<u8> {
        match self {
            OutBuf::Owned(buf) => buf,
            OutBuf::Borrowed(buf) => buf,
        }
    }

    /// Append `bytes`, reporting allocation failure instead of aborting.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let buf = self.buf();
        buf.try_reserve(bytes.len())?;
        buf.extend_from_slice(bytes);
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write(s.as_bytes())
    }

    /// Truncate the buffer to `len` bytes.
    pub fn truncate(&mut self, len: usize) {
        self.buf().truncate(len)
    }

    pub fn len(&self) -> usize {
        match self {
            OutBuf::Owned(buf) => buf.len(),
            OutBuf::Borrowed(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn take(&mut self) -> Option<Vec<u8>> {
        match self {
            OutBuf::Owned(buf) => Some(std::mem::take(buf)),
            OutBuf::Borrowed(_) => None,
        }
    }
}

/// Read all items from `source` into `sink` and flush it. On error the
/// sink is cleaned up and the error is returned. Returns the number of
/// items copied.
pub fn copy(source: &mut dyn Source, sink: &mut dyn Sink) -> Result<usize> {
    let mut count = 0;
    let result = loop {
        match source.get() {
            Ok(Some(item)) => {
                trace!("{}: {:02x?}", source.position(), item.encode());
                if let Err(e) = sink.put(&item) {
                    break Err(e);
                }
                count += 1;
            }
            Ok(None) => break sink.flush(),
            Err(e) => break Err(e),
        }
    };
    if result.is_err() {
        sink.cleanup();
    }
    result.map(|_| count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct VecSource {
        items: Vec<Item>,
        idx: usize,
        fail_at: Option<usize>,
    }

    impl Source for VecSource {
        fn get(&mut self) -> Result<Option<Item>> {
            if Some(self.idx) == self.fail_at {
                return Err(Error::Incomplete {
                    position: self.position(),
                });
            }
            let item = self.items.get(self.idx).cloned();
            self.idx += 1;
            Ok(item)
        }

        fn position(&self) -> Position {
            Position::Node(self.idx)
        }
    }

    #[derive(Default)]
    struct CountingSink {
        items: usize,
        flushed: bool,
        cleaned: bool,
    }

    impl Sink for CountingSink {
        fn put(&mut self, _item: &Item) -> Result<()> {
            self.items += 1;
            Ok(())
        }
        fn flush(&mut self) -> Result<()> {
            self.flushed = true;
            Ok(())
        }
        fn cleanup(&mut self) {
            self.cleaned = true;
        }
        fn take(&mut self) -> Option<Vec<u8>> {
            None
        }
    }

    fn items() -> Vec<Item> {
        [[0x05u8, 0x01], [0x09, 0x02]]
            .iter()
            .map(|b| Item::decode(b).unwrap().0)
            .collect()
    }

    #[test]
    fn copy_all() {
        let mut source = VecSource {
            items: items(),
            idx: 0,
            fail_at: None,
        };
        let mut sink = CountingSink::default();
        assert_eq!(copy(&mut source, &mut sink).unwrap(), 2);
        assert!(sink.flushed);
        assert!(!sink.cleaned);
    }

    #[test]
    fn copy_error_cleans_up() {
        let mut source = VecSource {
            items: items(),
            idx: 0,
            fail_at: Some(1),
        };
        let mut sink = CountingSink::default();
        assert!(matches!(
            copy(&mut source, &mut sink),
            Err(Error::Incomplete {
                position: Position::Node(1)
            })
        ));
        assert_eq!(sink.items, 1);
        assert!(!sink.flushed);
        assert!(sink.cleaned);
    }

    #[test]
    fn outbuf() {
        let mut owned = OutBuf::default();
        owned.write_str("abc").unwrap();
        assert_eq!(owned.len(), 3);
        assert_eq!(owned.take(), Some(b"abc".to_vec()));
        assert!(owned.is_empty());

        let mut vec = vec![b'x'];
        {
            let mut borrowed = OutBuf::from(&mut vec);
            borrowed.write(b"yz").unwrap();
            assert_eq!(borrowed.take(), None);
        }
        assert_eq!(vec, b"xyz");
    }
}

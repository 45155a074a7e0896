// SPDX-License-Identifier: MIT

//! The binary item codec. This module handles splitting a report
//! descriptor byte stream into its individual [Item]s and serializing
//! them back. Interpretation of the tags is left to [crate::item].
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).
//!
//! # Itemizing HID Report Descriptors
//!
//! Entry point is usually [`ReportDescriptorItems::try_from(bytes)`](ReportDescriptorItems::try_from):
//!
//! ```
//! # use hidrd::hid::*;
//! # fn parse(bytes: &[u8]) {
//! let rdesc_items = ReportDescriptorItems::try_from(bytes).unwrap();
//! for rdesc_item in rdesc_items.iter() {
//!     println!("Item at offset {:02x}", rdesc_item.offset());
//!     let item = rdesc_item.item();
//!     match item {
//!         Item::Short(s) if s.item_type() == ShortType::Main => println!("A main item"),
//!         Item::Long(_) => println!("A long item"),
//!         _ => {}
//!     }
//! }
//! # }
//! ```
//!
//! A single item is decoded with [Item::decode] which also returns
//! the number of bytes consumed:
//!
//! ```
//! # use hidrd::hid::*;
//! let (item, consumed) = Item::decode(&[0x15, 0x81, 0x25, 0x7f]).unwrap();
//! assert_eq!(consumed, 2);
//! assert_eq!(item.data(), &[0x81]);
//! assert_eq!(item.encode(), vec![0x15, 0x81]);
//! ```

use crate::ensure;

use thiserror::Error;

/// The prefix byte introducing a long item: size 2, type reserved, tag 0xF.
pub const LONG_ITEM_PREFIX: u8 = 0xFE;

/// The maximum number of data bytes in a long item.
pub const LONG_ITEM_MAX_DATA: usize = 255;

/// The data bytes of a HID item, guaranteed to
/// be of length 1, 2, or 4 bytes depending on the
/// input and in LE byte order.
///
/// This struct only exists for conversion from numbers to
/// a hid-compatible byte array.
pub(crate) struct HidBytes(Vec<u8>);

impl HidBytes {
    pub(crate) fn take(self) -> Vec<u8> {
        self.0
    }

    /// Encode the given raw value over exactly `width` bytes. Values
    /// wider than `width` are truncated.
    pub(crate) fn with_width(value: u32, width: usize) -> HidBytes {
        HidBytes(value.to_le_bytes()[0..width.min(4)].to_vec())
    }
}

impl std::ops::Deref for HidBytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u32> for HidBytes {
    fn from(value: u32) -> HidBytes {
        let bytes = value.to_le_bytes();
        let cutoff = match value {
            0..=255 => 1,
            256..=0xffff => 2,
            _ => 4,
        };
        HidBytes(bytes[0..cutoff].to_vec())
    }
}

impl From<u16> for HidBytes {
    fn from(value: u16) -> HidBytes {
        let bytes = value.to_le_bytes();
        let cutoff = match value {
            0..=255 => 1,
            _ => 2,
        };
        HidBytes(bytes[0..cutoff].to_vec())
    }
}

impl From<u8> for HidBytes {
    fn from(value: u8) -> HidBytes {
        HidBytes(vec![value])
    }
}

impl From<i32> for HidBytes {
    fn from(value: i32) -> HidBytes {
        const MIN16: i32 = i16::MIN as i32;
        const MAX16: i32 = i16::MAX as i32;
        let bytes = match value {
            -128..=127 => (value as i8).to_le_bytes().to_vec(),
            MIN16..=MAX16 => (value as i16).to_le_bytes().to_vec(),
            _ => value.to_le_bytes().to_vec(),
        };
        HidBytes(bytes)
    }
}

/// Represents one value extracted from a set of (LE) bytes.
/// An empty set of bytes is the value zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HidValue {
    value: u32,
    nbytes: usize,
}

impl HidValue {
    /// The length of the value in bytes, required to
    /// determine if the actual value may be signed
    pub(crate) fn len(&self) -> usize {
        self.nbytes
    }
}

impl From<&ShortItem> for HidValue {
    fn from(item: &ShortItem) -> HidValue {
        let mut le = [0u8; 4];
        le[..item.data.len()].copy_from_slice(&item.data);
        HidValue {
            value: u32::from_le_bytes(le),
            nbytes: item.data.len(),
        }
    }
}

impl From<&HidValue> for u32 {
    fn from(v: &HidValue) -> u32 {
        v.value
    }
}

impl From<HidValue> for u32 {
    fn from(v: HidValue) -> u32 {
        u32::from(&v)
    }
}

impl From<&HidValue> for u16 {
    fn from(v: &HidValue) -> u16 {
        (v.value & 0xFFFF) as u16
    }
}

impl From<HidValue> for u16 {
    fn from(v: HidValue) -> u16 {
        u16::from(&v)
    }
}

impl From<&HidValue> for u8 {
    fn from(v: &HidValue) -> u8 {
        (v.value & 0xFF) as u8
    }
}

impl From<HidValue> for u8 {
    fn from(v: HidValue) -> u8 {
        u8::from(&v)
    }
}

impl From<&HidValue> for i32 {
    fn from(v: &HidValue) -> i32 {
        match v.len() {
            1 => ((v.value & 0xFF) as i8) as i32,
            2 => ((v.value & 0xFFFF) as i16) as i32,
            _ => v.value as i32,
        }
    }
}

impl From<HidValue> for i32 {
    fn from(v: HidValue) -> i32 {
        i32::from(&v)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HidError {
    #[error("Invalid data: {message}")]
    InvalidData { message: String },
    #[error("Insufficient data")]
    InsufficientData,
}

type Result<T> = std::result::Result<T, HidError>;

/// The two-bit type field of a short item, see Section 6.2.2.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortType {
    Main,
    Global,
    Local,
    Reserved,
}

impl ShortType {
    /// The type bits already shifted into their position in the prefix byte.
    pub fn prefix(&self) -> u8 {
        u8::from(self) << 2
    }
}

impl From<u8> for ShortType {
    /// Converts the two lowest bits of the given value.
    fn from(bits: u8) -> ShortType {
        match bits & 0b11 {
            0 => ShortType::Main,
            1 => ShortType::Global,
            2 => ShortType::Local,
            _ => ShortType::Reserved,
        }
    }
}

impl From<&ShortType> for u8 {
    fn from(t: &ShortType) -> u8 {
        match t {
            ShortType::Main => 0,
            ShortType::Global => 1,
            ShortType::Local => 2,
            ShortType::Reserved => 3,
        }
    }
}

impl From<ShortType> for u8 {
    fn from(t: ShortType) -> u8 {
        u8::from(&t)
    }
}

/// A short item (Section 6.2.2.2) with a data payload of 0, 1, 2 or 4 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShortItem {
    item_type: ShortType,
    tag: u8,
    data: Vec<u8>,
}

impl ShortItem {
    /// Create a new short item. The tag must fit into 4 bits and the
    /// data must be 0, 1, 2 or 4 bytes long. The combination that
    /// makes up the long item prefix is rejected.
    pub fn new(item_type: ShortType, tag: u8, data: &[u8]) -> Result<ShortItem> {
        ensure!(
            tag <= 0xF,
            HidError::InvalidData {
                message: format!("Short item tag {tag:#x} exceeds 4 bits"),
            }
        );
        ensure!(
            matches!(data.len(), 0 | 1 | 2 | 4),
            HidError::InvalidData {
                message: format!("Short item cannot hold {} data bytes", data.len()),
            }
        );
        let item = ShortItem {
            item_type,
            tag,
            data: data.to_vec(),
        };
        ensure!(
            item.header() != LONG_ITEM_PREFIX,
            HidError::InvalidData {
                message: "Short item would encode as a long item prefix".into(),
            }
        );
        Ok(item)
    }

    /// Assemble a short item from parts already known to be valid.
    pub(crate) fn from_parts(item_type: ShortType, tag: u8, data: Vec<u8>) -> ShortItem {
        debug_assert!(tag <= 0xF && matches!(data.len(), 0 | 1 | 2 | 4));
        ShortItem {
            item_type,
            tag,
            data,
        }
    }

    pub fn item_type(&self) -> ShortType {
        self.item_type
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The header byte comprising data size, type and tag.
    pub fn header(&self) -> u8 {
        let size = match self.data.len() {
            0 => 0b00,
            1 => 0b01,
            2 => 0b10,
            _ => 0b11,
        };
        (self.tag << 4) | self.item_type.prefix() | size
    }
}

impl TryFrom<&[u8]> for ShortItem {
    type Error = HidError;

    fn try_from(bytes: &[u8]) -> Result<ShortItem> {
        ensure!(!bytes.is_empty(), HidError::InsufficientData);
        ensure!(
            bytes[0] != LONG_ITEM_PREFIX,
            HidError::InvalidData {
                message: "Item is a long item".into(),
            }
        );
        let size = match bytes[0] & 0b0011 {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        };
        ensure!(bytes.len() > size, HidError::InsufficientData);

        Ok(ShortItem {
            item_type: ShortType::from(bytes[0] >> 2),
            tag: (bytes[0] & 0b11110000) >> 4,
            data: bytes[1..size + 1].to_owned(),
        })
    }
}

// 6.2.2.3. Items in a HID report descriptor are represented as short items (1-5 bytes)
// and long items as 3 to 258 bytes.
//
// Note that Section 6.2.2.3 states:
//
// > **Important** No long item tags are defined in this document. These tags are
// > reserved for future use. Tags xF0–xFF are vendor defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LongItem {
    tag: u8,
    data: Vec<u8>,
}

impl LongItem {
    pub fn new(tag: u8, data: &[u8]) -> Result<LongItem> {
        ensure!(
            data.len() <= LONG_ITEM_MAX_DATA,
            HidError::InvalidData {
                message: format!("Long item cannot hold {} data bytes", data.len()),
            }
        );
        Ok(LongItem {
            tag,
            data: data.to_vec(),
        })
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl TryFrom<&[u8]> for LongItem {
    type Error = HidError;

    fn try_from(bytes: &[u8]) -> Result<LongItem> {
        ensure!(!bytes.is_empty(), HidError::InsufficientData);
        ensure!(
            bytes[0] == LONG_ITEM_PREFIX,
            HidError::InvalidData {
                message: "Item is not a long item".into(),
            }
        );
        ensure!(bytes.len() >= 3, HidError::InsufficientData);
        let size = bytes[1] as usize;
        ensure!(bytes.len() >= size + 3, HidError::InsufficientData);

        Ok(LongItem {
            tag: bytes[2],
            data: bytes[3..size + 3].to_owned(),
        })
    }
}

/// One raw item of a report descriptor, with no interpretation of its tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    Short(ShortItem),
    Long(LongItem),
}

impl Item {
    /// Decode the first item in `bytes`, returning the item and the number
    /// of bytes it occupies. Trailing bytes are ignored.
    ///
    /// Returns [HidError::InsufficientData] if `bytes` is shorter than the
    /// length declared by the item's prefix.
    pub fn decode(bytes: &[u8]) -> Result<(Item, usize)> {
        ensure!(!bytes.is_empty(), HidError::InsufficientData);
        let item = if bytes[0] == LONG_ITEM_PREFIX {
            Item::Long(LongItem::try_from(bytes)?)
        } else {
            Item::Short(ShortItem::try_from(bytes)?)
        };
        let size = item.size();
        Ok((item, size))
    }

    /// The bytes representing this item on the wire.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        self.write_to(&mut bytes);
        bytes
    }

    /// Append the wire bytes of this item to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Item::Short(item) => {
                out.push(item.header());
                out.extend_from_slice(&item.data);
            }
            Item::Long(item) => {
                out.push(LONG_ITEM_PREFIX);
                out.push(item.data.len() as u8);
                out.push(item.tag);
                out.extend_from_slice(&item.data);
            }
        }
    }

    /// The length of this item in bytes, inclusive of the header byte.
    /// For short items this is the length of the data in bytes plus 1 for the header byte.
    /// For long items this is the length of the data plus 3 (header byte, data size
    /// byte and the long item tag).
    pub fn size(&self) -> usize {
        match self {
            Item::Short(item) => 1 + item.data.len(),
            Item::Long(item) => 3 + item.data.len(),
        }
    }

    /// The header byte of this item. For long items this is always
    /// [LONG_ITEM_PREFIX].
    pub fn header(&self) -> u8 {
        match self {
            Item::Short(item) => item.header(),
            Item::Long(_) => LONG_ITEM_PREFIX,
        }
    }

    /// The 4-bit tag for short items, the 8-bit tag for long items.
    pub fn tag(&self) -> u8 {
        match self {
            Item::Short(item) => item.tag,
            Item::Long(item) => item.tag,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Item::Short(item) => &item.data,
            Item::Long(item) => &item.data,
        }
    }

    pub fn is_long_item(&self) -> bool {
        matches!(self, Item::Long(_))
    }
}

impl From<ShortItem> for Item {
    fn from(item: ShortItem) -> Item {
        Item::Short(item)
    }
}

impl From<LongItem> for Item {
    fn from(item: LongItem) -> Item {
        Item::Long(item)
    }
}

/// A single item in a parsed (but not yet interpreted) report descriptor.
#[derive(Debug, Clone)]
pub struct ReportDescriptorItem {
    offset: usize,
    item: Item,
}

impl ReportDescriptorItem {
    /// The offset of this item in the Report Descriptor it was extracted from.
    pub fn offset(&self) -> usize {
        self.offset
    }
    /// The item that is this report descriptor item.
    pub fn item(&self) -> &Item {
        &self.item
    }
}

/// A set of items extracted from a report descriptor byte array. This is the
/// result of parsing a report descriptor without *interpreting* it.
#[derive(Debug, Default)]
pub struct ReportDescriptorItems {
    items: Vec<ReportDescriptorItem>,
}

impl ReportDescriptorItems {
    /// Serialize all items back into a report descriptor.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for rdesc_item in self.items.iter() {
            rdesc_item.item.write_to(&mut bytes);
        }
        bytes
    }
}

impl std::ops::Deref for ReportDescriptorItems {
    type Target = [ReportDescriptorItem];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl TryFrom<&[u8]> for ReportDescriptorItems {
    type Error = crate::Error;

    /// Attempts to itemize the given HID report descriptor into its
    /// set of [ReportDescriptorItem]s.
    fn try_from(bytes: &[u8]) -> crate::Result<Self> {
        itemize(bytes)
    }
}

/// Split the HID Report Descriptor represented by bytes into its set of
/// items.
fn itemize(bytes: &[u8]) -> crate::Result<ReportDescriptorItems> {
    let mut offset = 0;
    let mut items: Vec<ReportDescriptorItem> = Vec::new();
    while offset < bytes.len() {
        let (item, size) = match Item::decode(&bytes[offset..]) {
            Ok(decoded) => decoded,
            Err(HidError::InsufficientData) => {
                return Err(crate::Error::Incomplete {
                    position: crate::Position::Offset(offset),
                });
            }
            Err(e) => {
                return Err(crate::Error::InvalidItem {
                    position: crate::Position::Offset(offset),
                    message: format!("{e}"),
                });
            }
        };
        items.try_reserve(1)?;
        items.push(ReportDescriptorItem { offset, item });
        offset += size;
    }
    Ok(ReportDescriptorItems { items })
}

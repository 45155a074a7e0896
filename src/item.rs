// SPDX-License-Identifier: MIT

//! The semantic view of a HID [Item]: main, global and local items with
//! their tag interpreted and their payload converted to a typed value.
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).
//!
//! ```
//! # use hidrd::hid::Item;
//! # use hidrd::item::*;
//! # use hidrd::types::*;
//! let (item, _) = Item::decode(&[0x15, 0x81]).unwrap();
//! let semantic = SemanticItem::from(&item);
//! assert_eq!(semantic, GlobalItem::LogicalMinimum(LogicalMinimum(-127)).into());
//! assert_eq!(semantic.lower(), item);
//! ```
//!
//! Interpretation never fails: tags that are not defined by the HID
//! specification end up in the `Reserved` variants with their raw
//! [ShortItem], and [Item::Long] items end up as [SemanticItem::Long].

use crate::context::Context;
use crate::hid::{HidBytes, HidError, HidValue, Item, LongItem, ShortItem, ShortType};
use crate::types::*;
use crate::unit::Unit;

use bitflags::bitflags;

bitflags! {
    /// The flags of an Input, Output or Feature item, Section 6.2.2.5.
    ///
    /// Bit 7 is Volatile for Output and Feature items and reserved for
    /// Input items. Bits 9 to 31 are reserved but preserved.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DataFlags: u32 {
        const CONSTANT = 1 << 0;
        const VARIABLE = 1 << 1;
        const RELATIVE = 1 << 2;
        const WRAP = 1 << 3;
        const NON_LINEAR = 1 << 4;
        const NO_PREFERRED = 1 << 5;
        const NULL_STATE = 1 << 6;
        const VOLATILE = 1 << 7;
        const BUFFERED_BYTES = 1 << 8;

        const _ = !0;
    }
}

const FLAG_NAMES: [&str; 9] = [
    "constant",
    "variable",
    "relative",
    "wrap",
    "non_linear",
    "no_preferred",
    "null_state",
    "volatile",
    "buffered_bytes",
];

impl DataFlags {
    /// The names of all set bits, lowest bit first. Bit 7 is named
    /// `volatile` only if `has_volatile` is true, otherwise it is `bit7`
    /// like all other unnamed bits.
    pub fn names(&self, has_volatile: bool) -> Vec<String> {
        (0usize..32)
            .filter(|bit| self.bits() & (1u32 << bit) != 0)
            .map(|bit| match bit {
                7 if !has_volatile => String::from("bit7"),
                0..=8 => String::from(FLAG_NAMES[bit]),
                _ => format!("bit{bit}"),
            })
            .collect()
    }

    /// The reverse of [DataFlags::names], accepting a comma-separated
    /// list. Returns the offending name if one is unknown.
    pub fn parse_names(text: &str, has_volatile: bool) -> std::result::Result<DataFlags, String> {
        let mut bits = 0u32;
        for name in text.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let bit = match FLAG_NAMES.iter().position(|n| *n == name) {
                Some(7) if !has_volatile => None,
                Some(bit) => Some(bit as u32),
                None => name
                    .strip_prefix("bit")
                    .and_then(|n| n.parse::<u32>().ok())
                    .filter(|n| *n < 32 && (*n > 8 || (*n == 7 && !has_volatile))),
            };
            match bit {
                Some(bit) => bits |= 1 << bit,
                None => return Err(name.to_string()),
            }
        }
        Ok(DataFlags::from_bits_retain(bits))
    }
}

/// Main Data Item, see Section 6.2.5.
///
/// A data item is a [MainItem] that "create a field within a report and include Input,
/// Output, and Feature.". These have shared properties provided by this trait.
///
/// These properties come in pairs (bit set or unset in the HID report descriptor item),
/// for readability in the caller, a function is provided for each state.
pub trait MainDataItem {
    /// All flags of this item, including reserved bits.
    fn flags(&self) -> DataFlags;

    /// True if the data is constant and never changes. This typically means the data
    /// can be ignored.
    fn is_constant(&self) -> bool {
        self.flags().contains(DataFlags::CONSTANT)
    }

    fn is_data(&self) -> bool {
        !self.is_constant()
    }

    /// True if the data is a variable field.
    fn is_variable(&self) -> bool {
        self.flags().contains(DataFlags::VARIABLE)
    }

    fn is_array(&self) -> bool {
        !self.is_variable()
    }

    /// True if the data is relative compared to a previous report
    fn is_relative(&self) -> bool {
        self.flags().contains(DataFlags::RELATIVE)
    }

    fn is_absolute(&self) -> bool {
        !self.is_relative()
    }

    /// True if the data wraps around at the logical
    /// minimum/maximum (e.g. a dial that can spin at 360 degrees).
    fn wraps(&self) -> bool {
        self.flags().contains(DataFlags::WRAP)
    }

    fn does_not_wrap(&self) -> bool {
        !self.wraps()
    }

    /// True if the data was pre-processed on the device
    /// and the logical range is not linear.
    fn is_nonlinear(&self) -> bool {
        self.flags().contains(DataFlags::NON_LINEAR)
    }

    fn is_linear(&self) -> bool {
        !self.is_nonlinear()
    }

    /// True if the control does not have a preferred state it
    /// returns to when the user stops interacting (e.g. a joystick
    /// may return to a neutral position)
    fn has_no_preferred_state(&self) -> bool {
        self.flags().contains(DataFlags::NO_PREFERRED)
    }

    fn has_preferred_state(&self) -> bool {
        !self.has_no_preferred_state()
    }

    /// True if the control has a null state where it does not send
    /// data (e.g. a joystick in neutral state)
    fn has_null_state(&self) -> bool {
        self.flags().contains(DataFlags::NULL_STATE)
    }

    fn has_no_null_state(&self) -> bool {
        !self.has_null_state()
    }

    /// True if the control emits a fixed size stream of bytes.
    fn is_buffered_bytes(&self) -> bool {
        self.flags().contains(DataFlags::BUFFERED_BYTES)
    }

    fn is_bitfield(&self) -> bool {
        !self.is_buffered_bytes()
    }
}

macro_rules! impl_data_item {
    ($(#[$meta:meta])* $tipo:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $tipo(pub DataFlags);

        impl MainDataItem for $tipo {
            fn flags(&self) -> DataFlags {
                self.0
            }
        }

        impl From<DataFlags> for $tipo {
            fn from(flags: DataFlags) -> $tipo {
                $tipo(flags)
            }
        }
    };
}

impl_data_item!(
    /// An Input item describes information about the data provided by one or more
    /// physical controls.
    InputItem
);
impl_data_item!(
    /// The Output item is used to define an output data field in a report, for
    /// example LED states.
    OutputItem
);
impl_data_item!(
    /// Feature items describe device configuration information that can be sent to
    /// the device.
    FeatureItem
);

impl OutputItem {
    pub fn is_volatile(&self) -> bool {
        self.0.contains(DataFlags::VOLATILE)
    }
}

impl FeatureItem {
    pub fn is_volatile(&self) -> bool {
        self.0.contains(DataFlags::VOLATILE)
    }
}

/// See Section 6.2.2.6. A collection groups several items together.
///
/// > A Collection item identifies a relationship between two or more data (Input,
/// > Output, or Feature.) For example, a mouse could be described as a collection of
/// > two to four data (x, y, button 1, button 2). While the Collection item opens a
/// > collection of data, the [MainItem::EndCollection] item closes a collection.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionItem {
    Physical,
    Application,
    Logical,
    Report,
    NamedArray,
    UsageSwitch,
    UsageModifier,
    Reserved { value: u8 },
    VendorDefined { value: u8 },
}

impl CollectionItem {
    /// The lowercase token used in tree formats. Reserved and
    /// vendor-defined collections have no token.
    pub fn token(&self) -> Option<&'static str> {
        match self {
            CollectionItem::Physical => Some("physical"),
            CollectionItem::Application => Some("application"),
            CollectionItem::Logical => Some("logical"),
            CollectionItem::Report => Some("report"),
            CollectionItem::NamedArray => Some("named_array"),
            CollectionItem::UsageSwitch => Some("usage_switch"),
            CollectionItem::UsageModifier => Some("usage_modifier"),
            CollectionItem::Reserved { .. } | CollectionItem::VendorDefined { .. } => None,
        }
    }

    /// Parses a token as returned by [CollectionItem::token] or a decimal
    /// or `0x`-prefixed hexadecimal type value.
    pub fn from_token(token: &str) -> Option<CollectionItem> {
        let token = token.trim();
        let by_name = (0u8..=6)
            .map(CollectionItem::from)
            .find(|c| c.token().is_some_and(|t| t.eq_ignore_ascii_case(token)));
        by_name.or_else(|| {
            let value = match token.strip_prefix("0x") {
                Some(hex) => u8::from_str_radix(hex, 16).ok()?,
                None => token.parse::<u8>().ok()?,
            };
            Some(CollectionItem::from(value))
        })
    }
}

impl std::fmt::Display for CollectionItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionItem::Physical => write!(f, "Physical"),
            CollectionItem::Application => write!(f, "Application"),
            CollectionItem::Logical => write!(f, "Logical"),
            CollectionItem::Report => write!(f, "Report"),
            CollectionItem::NamedArray => write!(f, "Named Array"),
            CollectionItem::UsageSwitch => write!(f, "Usage Switch"),
            CollectionItem::UsageModifier => write!(f, "Usage Modifier"),
            CollectionItem::Reserved { value } => write!(f, "Reserved ({value:#04x})"),
            CollectionItem::VendorDefined { value } => write!(f, "Vendor Defined ({value:#04x})"),
        }
    }
}

impl From<&CollectionItem> for u8 {
    fn from(c: &CollectionItem) -> u8 {
        match c {
            CollectionItem::Physical => 0x00,
            CollectionItem::Application => 0x01,
            CollectionItem::Logical => 0x02,
            CollectionItem::Report => 0x03,
            CollectionItem::NamedArray => 0x04,
            CollectionItem::UsageSwitch => 0x05,
            CollectionItem::UsageModifier => 0x06,
            CollectionItem::Reserved { value } => *value,
            CollectionItem::VendorDefined { value } => *value,
        }
    }
}

impl From<CollectionItem> for u8 {
    fn from(c: CollectionItem) -> u8 {
        u8::from(&c)
    }
}

impl From<u8> for CollectionItem {
    fn from(b: u8) -> CollectionItem {
        match b {
            0x00 => CollectionItem::Physical,
            0x01 => CollectionItem::Application,
            0x02 => CollectionItem::Logical,
            0x03 => CollectionItem::Report,
            0x04 => CollectionItem::NamedArray,
            0x05 => CollectionItem::UsageSwitch,
            0x06 => CollectionItem::UsageModifier,
            value @ 0x07..=0x7F => CollectionItem::Reserved { value },
            value @ 0x80..=0xFF => CollectionItem::VendorDefined { value },
        }
    }
}

/// From Section 6.2.2.4:
///
/// > Main items are used to either define or group certain types of data fields within a
/// > Report descriptor. There are two types of Main items: data and non-data. Data-
/// > type Main items are used to create a field within a report and include Input,
/// > Output, and Feature. Other items do not create fields and are subsequently
/// > referred to as non-data Main items.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MainItem {
    Input(InputItem),
    Output(OutputItem),
    Feature(FeatureItem),
    Collection(CollectionItem),
    EndCollection,
    Reserved(ShortItem),
}

/// See Section 6.2.2.7, a global item applies to all subsequently identified items.
///
/// > Global items describe rather than define data from a control. A new Main item
/// > assumes the characteristics of the item state table. Global items can change the
/// > state table. As a result Global item tags apply to all subsequently defined items
/// > unless overridden by another Global item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GlobalItem {
    UsagePage(UsagePage),
    LogicalMinimum(LogicalMinimum),
    LogicalMaximum(LogicalMaximum),
    PhysicalMinimum(PhysicalMinimum),
    PhysicalMaximum(PhysicalMaximum),
    UnitExponent(UnitExponent),
    Unit(Unit),
    ReportSize(ReportSize),
    ReportId(ReportId),
    ReportCount(ReportCount),
    Push,
    Pop,
    Reserved(ShortItem),
}

/// See Section 6.2.2.8, a local item applies to the current [MainItem].
///
/// > Local item tags define characteristics of controls. These items do not carry over to
/// > the next Main item. If a Main item defines more than one control, it may be
/// > preceded by several similar Local item tags.
///
/// Tag 0x6 is not defined by the HID specification and is [LocalItem::Reserved].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocalItem {
    Usage(Usage),
    UsageMinimum(Usage),
    UsageMaximum(Usage),
    DesignatorIndex(DesignatorIndex),
    DesignatorMinimum(DesignatorMinimum),
    DesignatorMaximum(DesignatorMaximum),
    StringIndex(StringIndex),
    StringMinimum(StringMinimum),
    StringMaximum(StringMaximum),
    Delimiter(Delimiter),
    Reserved(ShortItem),
}

/// A HID [Item] with its tag interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticItem {
    Main(MainItem),
    Global(GlobalItem),
    Local(LocalItem),
    /// A short item of the reserved item type
    Reserved(ShortItem),
    Long(LongItem),
}

impl From<MainItem> for SemanticItem {
    fn from(item: MainItem) -> SemanticItem {
        SemanticItem::Main(item)
    }
}

impl From<GlobalItem> for SemanticItem {
    fn from(item: GlobalItem) -> SemanticItem {
        SemanticItem::Global(item)
    }
}

impl From<LocalItem> for SemanticItem {
    fn from(item: LocalItem) -> SemanticItem {
        SemanticItem::Local(item)
    }
}

/// How the payload of an item is encoded.
enum Payload<'a> {
    None,
    Unsigned(u32),
    Signed(i32),
    /// Always four bytes wide
    Wide(u32),
    Raw(&'a ShortItem),
}

impl From<&Item> for SemanticItem {
    fn from(item: &Item) -> SemanticItem {
        let short = match item {
            Item::Long(long) => return SemanticItem::Long(long.clone()),
            Item::Short(short) => short,
        };
        let value = HidValue::from(short);
        let unsigned = u32::from(&value);
        let signed = i32::from(&value);
        let usage = || match value.len() {
            4 => Usage::from(unsigned),
            _ => Usage::from_id(u16::from(&value)),
        };
        let reserved = || short.clone();

        match short.item_type() {
            ShortType::Main => SemanticItem::Main(match short.tag() {
                0x8 => MainItem::Input(InputItem(DataFlags::from_bits_retain(unsigned))),
                0x9 => MainItem::Output(OutputItem(DataFlags::from_bits_retain(unsigned))),
                0xA => MainItem::Collection(CollectionItem::from(u8::from(&value))),
                0xB => MainItem::Feature(FeatureItem(DataFlags::from_bits_retain(unsigned))),
                0xC => MainItem::EndCollection,
                _ => MainItem::Reserved(reserved()),
            }),
            ShortType::Global => SemanticItem::Global(match short.tag() {
                0x0 => GlobalItem::UsagePage(UsagePage(u16::from(&value))),
                0x1 => GlobalItem::LogicalMinimum(LogicalMinimum(signed)),
                0x2 => GlobalItem::LogicalMaximum(LogicalMaximum(signed)),
                0x3 => GlobalItem::PhysicalMinimum(PhysicalMinimum(signed)),
                0x4 => GlobalItem::PhysicalMaximum(PhysicalMaximum(signed)),
                0x5 => GlobalItem::UnitExponent(UnitExponent(signed)),
                0x6 => GlobalItem::Unit(Unit(unsigned)),
                0x7 => GlobalItem::ReportSize(ReportSize(unsigned)),
                0x8 => GlobalItem::ReportId(ReportId(unsigned)),
                0x9 => GlobalItem::ReportCount(ReportCount(unsigned)),
                0xA => GlobalItem::Push,
                0xB => GlobalItem::Pop,
                _ => GlobalItem::Reserved(reserved()),
            }),
            ShortType::Local => SemanticItem::Local(match short.tag() {
                0x0 => LocalItem::Usage(usage()),
                0x1 => LocalItem::UsageMinimum(usage()),
                0x2 => LocalItem::UsageMaximum(usage()),
                0x3 => LocalItem::DesignatorIndex(DesignatorIndex(unsigned)),
                0x4 => LocalItem::DesignatorMinimum(DesignatorMinimum(unsigned)),
                0x5 => LocalItem::DesignatorMaximum(DesignatorMaximum(unsigned)),
                0x7 => LocalItem::StringIndex(StringIndex(unsigned)),
                0x8 => LocalItem::StringMinimum(StringMinimum(unsigned)),
                0x9 => LocalItem::StringMaximum(StringMaximum(unsigned)),
                0xA => LocalItem::Delimiter(Delimiter(unsigned)),
                _ => LocalItem::Reserved(reserved()),
            }),
            ShortType::Reserved => SemanticItem::Reserved(reserved()),
        }
    }
}

impl From<&SemanticItem> for Item {
    fn from(item: &SemanticItem) -> Item {
        item.lower()
    }
}

impl SemanticItem {
    /// Interpret `item` and apply it to `context`.
    pub fn interpret(item: &Item, context: &mut Context) -> SemanticItem {
        let semantic = SemanticItem::from(item);
        context.update(&semantic);
        semantic
    }

    /// The short item type and tag of this item, `None` for long items.
    pub fn short_tag(&self) -> Option<(ShortType, u8)> {
        self.parts().ok()
    }

    fn parts(&self) -> std::result::Result<(ShortType, u8), &LongItem> {
        let parts = match self {
            SemanticItem::Main(item) => match item {
                MainItem::Input(_) => (ShortType::Main, 0x8),
                MainItem::Output(_) => (ShortType::Main, 0x9),
                MainItem::Collection(_) => (ShortType::Main, 0xA),
                MainItem::Feature(_) => (ShortType::Main, 0xB),
                MainItem::EndCollection => (ShortType::Main, 0xC),
                MainItem::Reserved(raw) => (raw.item_type(), raw.tag()),
            },
            SemanticItem::Global(item) => match item {
                GlobalItem::UsagePage(_) => (ShortType::Global, 0x0),
                GlobalItem::LogicalMinimum(_) => (ShortType::Global, 0x1),
                GlobalItem::LogicalMaximum(_) => (ShortType::Global, 0x2),
                GlobalItem::PhysicalMinimum(_) => (ShortType::Global, 0x3),
                GlobalItem::PhysicalMaximum(_) => (ShortType::Global, 0x4),
                GlobalItem::UnitExponent(_) => (ShortType::Global, 0x5),
                GlobalItem::Unit(_) => (ShortType::Global, 0x6),
                GlobalItem::ReportSize(_) => (ShortType::Global, 0x7),
                GlobalItem::ReportId(_) => (ShortType::Global, 0x8),
                GlobalItem::ReportCount(_) => (ShortType::Global, 0x9),
                GlobalItem::Push => (ShortType::Global, 0xA),
                GlobalItem::Pop => (ShortType::Global, 0xB),
                GlobalItem::Reserved(raw) => (raw.item_type(), raw.tag()),
            },
            SemanticItem::Local(item) => match item {
                LocalItem::Usage(_) => (ShortType::Local, 0x0),
                LocalItem::UsageMinimum(_) => (ShortType::Local, 0x1),
                LocalItem::UsageMaximum(_) => (ShortType::Local, 0x2),
                LocalItem::DesignatorIndex(_) => (ShortType::Local, 0x3),
                LocalItem::DesignatorMinimum(_) => (ShortType::Local, 0x4),
                LocalItem::DesignatorMaximum(_) => (ShortType::Local, 0x5),
                LocalItem::StringIndex(_) => (ShortType::Local, 0x7),
                LocalItem::StringMinimum(_) => (ShortType::Local, 0x8),
                LocalItem::StringMaximum(_) => (ShortType::Local, 0x9),
                LocalItem::Delimiter(_) => (ShortType::Local, 0xA),
                LocalItem::Reserved(raw) => (raw.item_type(), raw.tag()),
            },
            SemanticItem::Reserved(raw) => (raw.item_type(), raw.tag()),
            SemanticItem::Long(long) => return Err(long),
        };
        Ok(parts)
    }

    fn payload(&self) -> Payload<'_> {
        let usage = |u: &Usage| match u.usage_page {
            Some(_) => Payload::Wide(u32::from(u)),
            None => Payload::Unsigned(u32::from(u)),
        };
        match self {
            SemanticItem::Main(item) => match item {
                MainItem::Input(i) => Payload::Unsigned(i.0.bits()),
                MainItem::Output(o) => Payload::Unsigned(o.0.bits()),
                MainItem::Feature(f) => Payload::Unsigned(f.0.bits()),
                MainItem::Collection(c) => Payload::Unsigned(u8::from(c) as u32),
                MainItem::EndCollection => Payload::None,
                MainItem::Reserved(raw) => Payload::Raw(raw),
            },
            SemanticItem::Global(item) => match item {
                GlobalItem::UsagePage(page) => Payload::Unsigned(u16::from(page) as u32),
                GlobalItem::LogicalMinimum(v) => Payload::Signed(v.into()),
                GlobalItem::LogicalMaximum(v) => Payload::Signed(v.into()),
                GlobalItem::PhysicalMinimum(v) => Payload::Signed(v.into()),
                GlobalItem::PhysicalMaximum(v) => Payload::Signed(v.into()),
                GlobalItem::UnitExponent(v) => Payload::Signed(v.into()),
                GlobalItem::Unit(unit) => Payload::Unsigned(unit.into()),
                GlobalItem::ReportSize(v) => Payload::Unsigned(v.into()),
                GlobalItem::ReportId(v) => Payload::Unsigned(v.into()),
                GlobalItem::ReportCount(v) => Payload::Unsigned(v.into()),
                GlobalItem::Push | GlobalItem::Pop => Payload::None,
                GlobalItem::Reserved(raw) => Payload::Raw(raw),
            },
            SemanticItem::Local(item) => match item {
                LocalItem::Usage(u) | LocalItem::UsageMinimum(u) | LocalItem::UsageMaximum(u) => {
                    usage(u)
                }
                LocalItem::DesignatorIndex(v) => Payload::Unsigned(v.into()),
                LocalItem::DesignatorMinimum(v) => Payload::Unsigned(v.into()),
                LocalItem::DesignatorMaximum(v) => Payload::Unsigned(v.into()),
                LocalItem::StringIndex(v) => Payload::Unsigned(v.into()),
                LocalItem::StringMinimum(v) => Payload::Unsigned(v.into()),
                LocalItem::StringMaximum(v) => Payload::Unsigned(v.into()),
                LocalItem::Delimiter(v) => Payload::Unsigned(v.into()),
                LocalItem::Reserved(raw) => Payload::Raw(raw),
            },
            SemanticItem::Reserved(raw) => Payload::Raw(raw),
            SemanticItem::Long(_) => Payload::None,
        }
    }

    /// Convert back into a raw [Item] using the smallest payload that
    /// represents the value. Signed values >= 128 use two bytes to keep
    /// their sign bit clear, extended usages always use four bytes.
    pub fn lower(&self) -> Item {
        let (item_type, tag) = match self.parts() {
            Ok(parts) => parts,
            Err(long) => return Item::Long(long.clone()),
        };
        let data = match self.payload() {
            Payload::None => vec![],
            Payload::Unsigned(v) => HidBytes::from(v).take(),
            Payload::Signed(v) => HidBytes::from(v).take(),
            Payload::Wide(v) => HidBytes::with_width(v, 4).take(),
            Payload::Raw(raw) => return Item::Short(raw.clone()),
        };
        Item::Short(ShortItem::from_parts(item_type, tag, data))
    }

    /// Convert back into a raw [Item] with a payload of exactly `width`
    /// bytes, sign- or zero-extending the value as its field requires.
    ///
    /// Fails if `width` is not a valid short item payload size or if the
    /// value does not fit into `width` bytes.
    pub fn lower_with_size(&self, width: usize) -> std::result::Result<Item, HidError> {
        let invalid = |message: String| HidError::InvalidData { message };
        if !matches!(width, 0 | 1 | 2 | 4) {
            return Err(invalid(format!("Invalid item size {width}")));
        }
        let (item_type, tag) = match self.short_tag() {
            Some(parts) => parts,
            None => return Err(invalid("Long items have no fixed size".into())),
        };
        let fits = match self.payload() {
            Payload::None => true,
            Payload::Unsigned(v) => match width {
                0 => v == 0,
                1 => v <= 0xFF,
                2 => v <= 0xFFFF,
                _ => true,
            },
            Payload::Signed(v) => match width {
                0 => v == 0,
                1 => (i8::MIN as i32..=i8::MAX as i32).contains(&v),
                2 => (i16::MIN as i32..=i16::MAX as i32).contains(&v),
                _ => true,
            },
            Payload::Wide(_) => width == 4,
            Payload::Raw(raw) => raw.data().len() == width,
        };
        if !fits {
            return Err(invalid(format!("Value does not fit into {width} bytes")));
        }
        let data = match self.payload() {
            Payload::None => vec![0; width],
            Payload::Unsigned(v) | Payload::Wide(v) => HidBytes::with_width(v, width).take(),
            Payload::Signed(v) => HidBytes::with_width(v as u32, width).take(),
            Payload::Raw(raw) => return Ok(Item::Short(raw.clone())),
        };
        Ok(Item::Short(ShortItem::from_parts(item_type, tag, data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret(bytes: &[u8]) -> SemanticItem {
        let (item, _) = Item::decode(bytes).unwrap();
        SemanticItem::from(&item)
    }

    #[test]
    fn sign_extension() {
        assert_eq!(
            interpret(&[0x15, 0x81]),
            GlobalItem::LogicalMinimum(LogicalMinimum(-127)).into()
        );
        assert_eq!(
            interpret(&[0x16, 0x81, 0xff]),
            GlobalItem::LogicalMinimum(LogicalMinimum(-127)).into()
        );
        assert_eq!(
            interpret(&[0x17, 0, 0, 0, 0]),
            GlobalItem::LogicalMinimum(LogicalMinimum(0)).into()
        );
        assert_eq!(
            interpret(&[0x14]),
            GlobalItem::LogicalMinimum(LogicalMinimum(0)).into()
        );
        assert_eq!(
            interpret(&[0x55, 0x0e]),
            GlobalItem::UnitExponent(UnitExponent(14)).into()
        );
        assert_eq!(
            interpret(&[0x55, 0xfe]),
            GlobalItem::UnitExponent(UnitExponent(-2)).into()
        );
    }

    #[test]
    fn zero_extension() {
        assert_eq!(
            interpret(&[0x75, 0x81]),
            GlobalItem::ReportSize(ReportSize(0x81)).into()
        );
        assert_eq!(
            interpret(&[0x96, 0x00, 0x80]),
            GlobalItem::ReportCount(ReportCount(0x8000)).into()
        );
    }

    #[test]
    fn data_items() {
        let SemanticItem::Main(MainItem::Output(o)) = interpret(&[0x92, 0b10101010, 0b1]) else {
            panic!("Expected an output item");
        };
        assert!(!o.is_constant());
        assert!(o.is_variable());
        assert!(!o.is_relative());
        assert!(o.wraps());
        assert!(!o.is_nonlinear());
        assert!(o.has_no_preferred_state());
        assert!(!o.has_null_state());
        assert!(o.is_volatile());
        assert!(o.is_buffered_bytes());

        let SemanticItem::Main(MainItem::Input(i)) = interpret(&[0x83, 0x83, 0, 0, 0x80]) else {
            panic!("Expected an input item");
        };
        assert_eq!(i.flags().bits(), 0x80000083);
        assert_eq!(i.flags().names(false), ["constant", "variable", "bit7", "bit31"]);
        assert_eq!(
            i.flags().names(true),
            ["constant", "variable", "volatile", "bit31"]
        );
    }

    #[test]
    fn flag_names() {
        let flags = DataFlags::parse_names("variable, bit7,bit12", false).unwrap();
        assert_eq!(flags.bits(), 0x1082);
        let flags = DataFlags::parse_names("", true).unwrap();
        assert!(flags.is_empty());
        assert!(DataFlags::parse_names("volatile", false).is_err());
        assert!(DataFlags::parse_names("bit7", true).is_err());
        assert!(DataFlags::parse_names("bit2", true).is_err());
        assert!(DataFlags::parse_names("bit32", true).is_err());
        assert!(DataFlags::parse_names("shiny", true).is_err());
        let flags = DataFlags::parse_names("volatile,buffered_bytes", true).unwrap();
        assert_eq!(flags, DataFlags::VOLATILE | DataFlags::BUFFERED_BYTES);
    }

    #[test]
    fn collection_types() {
        for value in 0u8..=255 {
            let item = SemanticItem::from(MainItem::Collection(CollectionItem::from(value)));
            assert_eq!(item.lower().encode(), [0xa1, value]);
        }
        assert_eq!(
            interpret(&[0xa0]),
            MainItem::Collection(CollectionItem::Physical).into()
        );
        assert_eq!(
            CollectionItem::from(0x80),
            CollectionItem::VendorDefined { value: 0x80 }
        );
        assert_eq!(
            CollectionItem::from_token("Application"),
            Some(CollectionItem::Application)
        );
        assert_eq!(
            CollectionItem::from_token("0x7f"),
            Some(CollectionItem::Reserved { value: 0x7f })
        );
        assert_eq!(CollectionItem::from_token("bogus"), None);
    }

    #[test]
    fn local_tags() {
        assert_eq!(
            interpret(&[0xa9, 0x01]),
            LocalItem::Delimiter(Delimiter::OPEN).into()
        );
        assert_eq!(
            interpret(&[0x79, 0x04]),
            LocalItem::StringIndex(StringIndex(4)).into()
        );
        assert!(matches!(
            interpret(&[0x69, 0x04]),
            SemanticItem::Local(LocalItem::Reserved(_))
        ));
        assert_eq!(
            interpret(&[0x0b, 0x38, 0x02, 0x0c, 0x00]),
            LocalItem::Usage(Usage::extended(0x0c, 0x0238)).into()
        );
        assert_eq!(
            interpret(&[0x1a, 0xe0, 0x00]),
            LocalItem::UsageMinimum(Usage::from_id(0xe0)).into()
        );
    }

    #[test]
    fn reserved_items() {
        for bytes in [
            &[0xd1, 0x42][..],
            &[0xc4][..],
            &[0xf8, 0x01][..],
            &[0x0d, 0x01][..],
            &[0xfe, 0x01, 0xf0, 0x01][..],
        ] {
            let (item, _) = Item::decode(bytes).unwrap();
            let semantic = SemanticItem::from(&item);
            assert_eq!(semantic.lower(), item);
            assert_eq!(
                semantic.lower_with_size(item.data().len()).is_ok(),
                !item.is_long_item()
            );
        }
    }

    #[test]
    fn minimal_lowering() {
        let item = SemanticItem::from(GlobalItem::LogicalMaximum(LogicalMaximum(255)));
        assert_eq!(item.lower().encode(), [0x26, 0xff, 0x00]);
        let item = SemanticItem::from(GlobalItem::LogicalMaximum(LogicalMaximum(-1)));
        assert_eq!(item.lower().encode(), [0x25, 0xff]);
        let item = SemanticItem::from(GlobalItem::Push);
        assert_eq!(item.lower().encode(), [0xa4]);
        let item = SemanticItem::from(LocalItem::Usage(Usage::extended(0, 1)));
        assert_eq!(item.lower().encode(), [0x0b, 0x01, 0x00, 0x00, 0x00]);
        let item = SemanticItem::from(GlobalItem::Unit(Unit(0x21)));
        assert_eq!(item.lower().encode(), [0x65, 0x21]);
    }

    #[test]
    fn sized_lowering() {
        let item = SemanticItem::from(GlobalItem::LogicalMinimum(LogicalMinimum(-127)));
        assert_eq!(
            item.lower_with_size(4).unwrap().encode(),
            [0x17, 0x81, 0xff, 0xff, 0xff]
        );
        assert_eq!(item.lower_with_size(2).unwrap().encode(), [0x16, 0x81, 0xff]);
        assert!(item.lower_with_size(0).is_err());
        assert!(item.lower_with_size(3).is_err());

        let item = SemanticItem::from(GlobalItem::ReportCount(ReportCount(0x100)));
        assert!(item.lower_with_size(1).is_err());
        assert_eq!(item.lower_with_size(4).unwrap().encode(), [0x97, 0, 1, 0, 0]);

        let item = SemanticItem::from(MainItem::EndCollection);
        assert_eq!(item.lower_with_size(1).unwrap().encode(), [0xc1, 0x00]);

        let item = SemanticItem::from(LocalItem::Usage(Usage::extended(0x0c, 1)));
        assert!(item.lower_with_size(2).is_err());
    }

    #[test]
    fn interpret_updates_context() {
        let mut context = Context::default();
        let (item, _) = Item::decode(&[0x05, 0x0d]).unwrap();
        SemanticItem::interpret(&item, &mut context);
        assert_eq!(context.usage_page(), UsagePage(0x0d));
    }
}

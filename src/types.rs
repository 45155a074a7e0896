// SPDX-License-Identifier: MIT

//! A collection of standalone HID types that exist for type safety only.
//! These are all simple wrappers around their underlying integer data type.
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).

/// Creates a `From<Foo> for u32` and `From<u32> for Foo` implementation for the given `Foo` type.
/// Use like this: `impl_from(Foo, Foo, u32)`.
macro_rules! impl_from {
    ($tipo:ty, $tipo_expr:expr, $to:ty) => {
        impl From<$tipo> for $to {
            fn from(f: $tipo) -> $to {
                f.0
            }
        }
        impl From<&$tipo> for $to {
            fn from(f: &$tipo) -> $to {
                f.0
            }
        }
        impl From<$to> for $tipo {
            fn from(f: $to) -> Self {
                $tipo_expr(f)
            }
        }
    };
}

/// Creates a `impl Display for Foo` that just converts into the underlying number.
/// Use like this: `impl_fmt(Foo, u32)`.
macro_rules! impl_fmt {
    ($tipo:ty, $to:ty) => {
        impl std::fmt::Display for $tipo {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let v: $to = self.into();
                write!(f, "{v}")
            }
        }
    };
}

/// Declares a newtype around `$to` with the conversions above.
macro_rules! hid_newtype {
    ($(#[$meta:meta])* $tipo:ident, $to:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $tipo(pub $to);

        impl_from!($tipo, $tipo, $to);
        impl_fmt!($tipo, $to);
    };
}

// ---------- GLOBAL ITEMS ---------------------
hid_newtype!(UsagePage, u16);
hid_newtype!(LogicalMinimum, i32);
hid_newtype!(LogicalMaximum, i32);
hid_newtype!(PhysicalMinimum, i32);
hid_newtype!(PhysicalMaximum, i32);
hid_newtype!(
    /// The base 10 exponent applied to the [crate::Unit], Section 6.2.2.7.
    UnitExponent,
    i32
);
hid_newtype!(ReportSize, u32);
hid_newtype!(ReportId, u32);
hid_newtype!(ReportCount, u32);

// ----------------- LOCAL ITEMS --------------------

hid_newtype!(UsageId, u16);
hid_newtype!(DesignatorIndex, u32);
hid_newtype!(DesignatorMinimum, u32);
hid_newtype!(DesignatorMaximum, u32);
hid_newtype!(StringIndex, u32);
hid_newtype!(StringMinimum, u32);
hid_newtype!(StringMaximum, u32);
hid_newtype!(
    /// The value of a Delimiter item. `1` opens a delimiter set, `0` closes it.
    Delimiter,
    u32
);

impl Delimiter {
    pub const CLOSE: Delimiter = Delimiter(0);
    pub const OPEN: Delimiter = Delimiter(1);

    pub fn is_open(&self) -> bool {
        *self == Delimiter::OPEN
    }

    pub fn is_close(&self) -> bool {
        *self == Delimiter::CLOSE
    }
}

/// The value of a Usage, Usage Minimum or Usage Maximum item.
///
/// A usage with a 4-byte payload is *extended* and carries its own
/// [UsagePage] in the upper 16 bits. Shorter payloads only carry the
/// [UsageId] and refer to the current Usage Page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Usage {
    pub usage_page: Option<UsagePage>,
    pub usage_id: UsageId,
}

impl Usage {
    /// A usage that refers to the current Usage Page.
    pub fn from_id(id: u16) -> Usage {
        Usage {
            usage_page: None,
            usage_id: UsageId(id),
        }
    }

    /// An extended usage carrying its own Usage Page.
    pub fn extended(page: u16, id: u16) -> Usage {
        Usage {
            usage_page: Some(UsagePage(page)),
            usage_id: UsageId(id),
        }
    }

    pub fn is_extended(&self) -> bool {
        self.usage_page.is_some()
    }

    /// The Usage Page this usage refers to, using `current` if
    /// the usage is not extended.
    pub fn page_or(&self, current: UsagePage) -> UsagePage {
        self.usage_page.unwrap_or(current)
    }
}

impl From<u32> for Usage {
    /// Splits a 32-bit value into an extended usage.
    fn from(value: u32) -> Usage {
        Usage::extended((value >> 16) as u16, (value & 0xFFFF) as u16)
    }
}

impl From<&Usage> for u32 {
    /// The raw value as it appears in the item payload.
    fn from(usage: &Usage) -> u32 {
        match usage.usage_page {
            Some(page) => (u32::from(page.0) << 16) | u32::from(usage.usage_id.0),
            None => u32::from(usage.usage_id.0),
        }
    }
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.usage_page {
            Some(page) => write!(f, "{:04x}{:04x}", page.0, self.usage_id.0),
            None => write!(f, "{:02x}", self.usage_id.0),
        }
    }
}

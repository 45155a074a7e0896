// SPDX-License-Identifier: MIT

//! The Unit global item value, Section 6.2.2.7.
//!
//! A unit is packed into eight nibbles. The lowest nibble selects the
//! [UnitSystem], the next six nibbles are signed 4-bit exponents for
//! each [Quantity] and the topmost nibble is reserved.
//!
//! ```
//! # use hidrd::unit::*;
//! let unit = Unit::default()
//!     .with_system(UnitSystem::SiLinear)
//!     .with_exponent(Quantity::Length, 2);
//! assert_eq!(u32::from(unit), 0x21);
//! assert_eq!(unit.length(), 2);
//! assert_eq!(format!("{unit}"), "SI Linear: centimeter^2");
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitSystem {
    None,
    SiLinear,
    SiRotation,
    EnglishLinear,
    EnglishRotation,
    /// Values 0x5 to 0xE
    Reserved(u8),
    Vendor,
}

impl From<u8> for UnitSystem {
    /// Converts the lowest nibble of the given value.
    fn from(nibble: u8) -> UnitSystem {
        match nibble & 0xF {
            0x0 => UnitSystem::None,
            0x1 => UnitSystem::SiLinear,
            0x2 => UnitSystem::SiRotation,
            0x3 => UnitSystem::EnglishLinear,
            0x4 => UnitSystem::EnglishRotation,
            0xF => UnitSystem::Vendor,
            n => UnitSystem::Reserved(n),
        }
    }
}

impl From<UnitSystem> for u8 {
    fn from(system: UnitSystem) -> u8 {
        match system {
            UnitSystem::None => 0x0,
            UnitSystem::SiLinear => 0x1,
            UnitSystem::SiRotation => 0x2,
            UnitSystem::EnglishLinear => 0x3,
            UnitSystem::EnglishRotation => 0x4,
            UnitSystem::Reserved(n) => n & 0xF,
            UnitSystem::Vendor => 0xF,
        }
    }
}

impl UnitSystem {
    /// The lowercase token of this system. Reserved systems have none
    /// and are written as their decimal value.
    pub fn token(&self) -> Option<&'static str> {
        match self {
            UnitSystem::None => Some("none"),
            UnitSystem::SiLinear => Some("si_linear"),
            UnitSystem::SiRotation => Some("si_rotation"),
            UnitSystem::EnglishLinear => Some("english_linear"),
            UnitSystem::EnglishRotation => Some("english_rotation"),
            UnitSystem::Vendor => Some("vendor"),
            UnitSystem::Reserved(_) => None,
        }
    }

    /// Parses a token as returned by [UnitSystem::token] or a decimal
    /// system value up to 15.
    pub fn from_token(token: &str) -> Option<UnitSystem> {
        let token = token.trim();
        (0u8..=0xF)
            .map(UnitSystem::from)
            .find(|s| s.token().is_some_and(|t| t.eq_ignore_ascii_case(token)))
            .or_else(|| token.parse::<u8>().ok().filter(|n| *n <= 0xF).map(UnitSystem::from))
    }

    /// Unit names per [Quantity] for the systems that define them.
    pub(crate) fn names(&self) -> Option<[&'static str; 6]> {
        match self {
            UnitSystem::SiLinear => Some(["centimeter", "gram", "seconds", "kelvin", "ampere", "candela"]),
            UnitSystem::SiRotation => Some(["radians", "gram", "seconds", "kelvin", "ampere", "candela"]),
            UnitSystem::EnglishLinear => Some(["inch", "slug", "seconds", "fahrenheit", "ampere", "candela"]),
            UnitSystem::EnglishRotation => Some(["degrees", "slug", "seconds", "fahrenheit", "ampere", "candela"]),
            _ => None,
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitSystem::None => write!(f, "None"),
            UnitSystem::SiLinear => write!(f, "SI Linear"),
            UnitSystem::SiRotation => write!(f, "SI Rotation"),
            UnitSystem::EnglishLinear => write!(f, "English Linear"),
            UnitSystem::EnglishRotation => write!(f, "English Rotation"),
            UnitSystem::Reserved(n) => write!(f, "Reserved ({n:#x})"),
            UnitSystem::Vendor => write!(f, "Vendor"),
        }
    }
}

/// The quantities whose exponents make up a [Unit], in nibble order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Length,
    Mass,
    Time,
    Temperature,
    Current,
    LuminousIntensity,
}

impl Quantity {
    pub const ALL: [Quantity; 6] = [
        Quantity::Length,
        Quantity::Mass,
        Quantity::Time,
        Quantity::Temperature,
        Quantity::Current,
        Quantity::LuminousIntensity,
    ];

    fn nibble(&self) -> u32 {
        match self {
            Quantity::Length => 1,
            Quantity::Mass => 2,
            Quantity::Time => 3,
            Quantity::Temperature => 4,
            Quantity::Current => 5,
            Quantity::LuminousIntensity => 6,
        }
    }

    pub(crate) fn generic_name(&self) -> &'static str {
        match self {
            Quantity::Length => "length",
            Quantity::Mass => "mass",
            Quantity::Time => "time",
            Quantity::Temperature => "temperature",
            Quantity::Current => "current",
            Quantity::LuminousIntensity => "luminous_intensity",
        }
    }
}

/// A 32-bit unit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Unit(pub u32);

impl From<u32> for Unit {
    fn from(value: u32) -> Unit {
        Unit(value)
    }
}

impl From<Unit> for u32 {
    fn from(unit: Unit) -> u32 {
        unit.0
    }
}

impl From<&Unit> for u32 {
    fn from(unit: &Unit) -> u32 {
        unit.0
    }
}

/// Converts a 4-bit two's complement nibble.
fn nibble_to_exp(nibble: u32) -> i8 {
    let nibble = (nibble & 0xF) as i8;
    if nibble & 0x8 != 0 {
        nibble - 16
    } else {
        nibble
    }
}

impl Unit {
    pub const NONE: Unit = Unit(0);

    fn nibble(&self, index: u32) -> u32 {
        (self.0 >> (index * 4)) & 0xF
    }

    fn with_nibble(self, index: u32, value: u32) -> Unit {
        let shift = index * 4;
        Unit((self.0 & !(0xF << shift)) | ((value & 0xF) << shift))
    }

    pub fn system(&self) -> UnitSystem {
        UnitSystem::from(self.nibble(0) as u8)
    }

    pub fn with_system(self, system: UnitSystem) -> Unit {
        self.with_nibble(0, u8::from(system) as u32)
    }

    /// The exponent of the given quantity in the range -8..=7.
    pub fn exponent(&self, quantity: Quantity) -> i8 {
        nibble_to_exp(self.nibble(quantity.nibble()))
    }

    /// Set the exponent of the given quantity. Only the lowest
    /// four bits of `exp` are kept.
    pub fn with_exponent(self, quantity: Quantity, exp: i8) -> Unit {
        self.with_nibble(quantity.nibble(), exp as u32)
    }

    pub fn length(&self) -> i8 {
        self.exponent(Quantity::Length)
    }

    pub fn mass(&self) -> i8 {
        self.exponent(Quantity::Mass)
    }

    pub fn time(&self) -> i8 {
        self.exponent(Quantity::Time)
    }

    pub fn temperature(&self) -> i8 {
        self.exponent(Quantity::Temperature)
    }

    pub fn current(&self) -> i8 {
        self.exponent(Quantity::Current)
    }

    pub fn luminous_intensity(&self) -> i8 {
        self.exponent(Quantity::LuminousIntensity)
    }

    /// True if this unit does not specify any units, i.e. the system is
    /// [UnitSystem::None] or all exponents are zero.
    pub fn is_void(&self) -> bool {
        self.system() == UnitSystem::None || (self.0 & 0xFFFFFFF0) == 0
    }

    /// True if the reserved top nibble is zero.
    pub fn is_known(&self) -> bool {
        self.nibble(7) == 0
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_void() || !self.is_known() {
            return write!(f, "{}", self.system());
        }
        write!(f, "{}:", self.system())?;
        let names = self.system().names();
        for (idx, quantity) in Quantity::ALL.iter().enumerate() {
            let exp = self.exponent(*quantity);
            if exp == 0 {
                continue;
            }
            let name = match names {
                Some(names) => names[idx],
                None => quantity.generic_name(),
            };
            match exp {
                1 => write!(f, " {name}")?,
                _ => write!(f, " {name}^{exp}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_si_linear_length() {
        let unit = Unit::NONE
            .with_system(UnitSystem::SiLinear)
            .with_exponent(Quantity::Length, 2);
        assert_eq!(u32::from(unit), 0x00000021);
        assert_eq!(unit.length(), 2);
        assert_eq!(unit.mass(), 0);
        assert!(!unit.is_void());
        assert!(unit.is_known());
    }

    #[test]
    fn negative_exponents() {
        // Velocity, cm/s
        let unit = Unit(0x0000F011);
        assert_eq!(unit.system(), UnitSystem::SiLinear);
        assert_eq!(unit.length(), 1);
        assert_eq!(unit.time(), -1);
        assert_eq!(format!("{unit}"), "SI Linear: centimeter seconds^-1");

        let unit = Unit::NONE
            .with_system(UnitSystem::EnglishRotation)
            .with_exponent(Quantity::Length, -8);
        assert_eq!(unit.length(), -8);
        assert_eq!(u32::from(unit), 0x84);
        assert_eq!(format!("{unit}"), "English Rotation: degrees^-8");
    }

    #[test]
    fn void_and_unknown() {
        assert!(Unit::NONE.is_void());
        assert!(Unit(0x1).is_void());
        assert!(Unit(0x10).is_void());
        assert!(!Unit(0x11).is_void());
        assert!(!Unit(0x10000001).is_known());
        assert_eq!(Unit(0xf).system(), UnitSystem::Vendor);
        assert_eq!(Unit(0x7).system(), UnitSystem::Reserved(7));
        assert_eq!(format!("{}", Unit(0x11f)), "Vendor: length mass");
    }

    #[test]
    fn system_tokens() {
        for nibble in 0u8..=0xF {
            let system = UnitSystem::from(nibble);
            let text = match system.token() {
                Some(token) => token.to_string(),
                None => nibble.to_string(),
            };
            assert_eq!(UnitSystem::from_token(&text), Some(system));
        }
        assert_eq!(UnitSystem::from_token("SI_Linear"), Some(UnitSystem::SiLinear));
        assert_eq!(UnitSystem::from_token("16"), None);
        assert_eq!(UnitSystem::from_token("metric"), None);
    }
}

// SPDX-License-Identifier: MIT

//! Option strings used to configure format sources and sinks.
//!
//! An option string is a comma-separated list of `name=value` pairs,
//! e.g. `"tabstop=8,comments=no"`. Each backend declares the options it
//! accepts as a list of [OptSpec]s and implements [Options] for its
//! configuration struct.
//!
//! ```
//! # use hidrd::opt::*;
//! const SPEC: &[OptSpec] = &[
//!     OptSpec::new("indent", OptType::U32, Some("2"), "indentation width"),
//!     OptSpec::new("format", OptType::Boolean, Some("yes"), "pretty-print"),
//! ];
//! let list = OptList::parse(SPEC, "indent=4").unwrap();
//! assert_eq!(list.get_u32("indent"), Some(4));
//! assert_eq!(list.get_bool("format"), Some(true));
//! assert!(OptList::parse(SPEC, "indent=four").is_err());
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptError {
    #[error("Missing '=' in option \"{0}\"")]
    Syntax(String),
    #[error("Unknown option \"{0}\"")]
    Unknown(String),
    #[error("Option \"{0}\" specified more than once")]
    Duplicate(String),
    #[error("Missing required option \"{0}\"")]
    Missing(String),
    #[error("Invalid {expected} value \"{value}\" for option \"{name}\"")]
    InvalidValue {
        name: String,
        value: String,
        expected: OptType,
    },
}

type Result<T> = std::result::Result<T, OptError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptType {
    Boolean,
    U32,
}

impl std::fmt::Display for OptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptType::Boolean => write!(f, "boolean"),
            OptType::U32 => write!(f, "unsigned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptValue {
    Boolean(bool),
    U32(u32),
}

impl OptValue {
    fn parse(opt_type: OptType, value: &str) -> Option<OptValue> {
        match opt_type {
            OptType::Boolean => parse_bool(value).map(OptValue::Boolean),
            OptType::U32 => value.trim().parse::<u32>().ok().map(OptValue::U32),
        }
    }
}

/// Parses a boolean the way option strings spell them: `yes`, `true`
/// and `on` or `no`, `false` and `off`, case-insensitive. A string of
/// digits is true if any digit is non-zero.
pub fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        "" => None,
        digits if digits.chars().all(|c| c.is_ascii_digit()) => {
            Some(digits.chars().any(|c| c != '0'))
        }
        _ => None,
    }
}

/// The declaration of one option. An option without a default value
/// is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptSpec {
    pub name: &'static str,
    pub opt_type: OptType,
    pub default: Option<&'static str>,
    pub desc: &'static str,
}

impl OptSpec {
    pub const fn new(
        name: &'static str,
        opt_type: OptType,
        default: Option<&'static str>,
        desc: &'static str,
    ) -> OptSpec {
        OptSpec {
            name,
            opt_type,
            default,
            desc,
        }
    }
}

impl std::fmt::Display for OptSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}=<{}>", self.name, self.opt_type)?;
        match self.default {
            Some(default) => write!(f, " [{default}]")?,
            None => write!(f, " (required)")?,
        }
        if !self.desc.is_empty() {
            write!(f, " - {}", self.desc)?;
        }
        Ok(())
    }
}

/// A parsed option string with defaults filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptList {
    values: Vec<(&'static str, OptValue)>,
}

impl OptList {
    /// Parse `text` against `specs`. Unknown, duplicated or missing
    /// required options and malformed values are errors.
    pub fn parse(specs: &[OptSpec], text: &str) -> Result<OptList> {
        let mut given: Vec<(&'static str, OptValue)> = Vec::new();
        for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (name, value) = token
                .split_once('=')
                .ok_or_else(|| OptError::Syntax(token.to_string()))?;
            let name = name.trim();
            let spec = specs
                .iter()
                .find(|s| s.name == name)
                .ok_or_else(|| OptError::Unknown(name.to_string()))?;
            if given.iter().any(|(n, _)| *n == spec.name) {
                return Err(OptError::Duplicate(name.to_string()));
            }
            let value = OptValue::parse(spec.opt_type, value).ok_or_else(|| {
                OptError::InvalidValue {
                    name: name.to_string(),
                    value: value.to_string(),
                    expected: spec.opt_type,
                }
            })?;
            given.push((spec.name, value));
        }

        let mut values = Vec::with_capacity(specs.len());
        for spec in specs {
            let value = match given.iter().position(|(n, _)| *n == spec.name) {
                Some(idx) => given.swap_remove(idx).1,
                None => {
                    let default = spec
                        .default
                        .ok_or_else(|| OptError::Missing(spec.name.to_string()))?;
                    OptValue::parse(spec.opt_type, default).ok_or_else(|| {
                        OptError::InvalidValue {
                            name: spec.name.to_string(),
                            value: default.to_string(),
                            expected: spec.opt_type,
                        }
                    })?
                }
            };
            values.push((spec.name, value));
        }
        Ok(OptList { values })
    }

    pub fn get(&self, name: &str) -> Option<&OptValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(OptValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_u32(&self, name: &str) -> Option<u32> {
        match self.get(name) {
            Some(OptValue::U32(v)) => Some(*v),
            _ => None,
        }
    }
}

/// A typed backend configuration that can be built from an option string.
pub trait Options: Sized {
    /// The options this configuration accepts.
    const SPEC: &'static [OptSpec];

    /// Build the configuration from an already validated list.
    fn from_opts(list: &OptList) -> Self;

    fn parse(text: &str) -> Result<Self> {
        let list = OptList::parse(Self::SPEC, text)?;
        Ok(Self::from_opts(&list))
    }
}

/// The configuration of backends that take no options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOptions;

impl Options for NoOptions {
    const SPEC: &'static [OptSpec] = &[];

    fn from_opts(_list: &OptList) -> Self {
        NoOptions
    }
}

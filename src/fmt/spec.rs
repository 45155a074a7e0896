// SPDX-License-Identifier: MIT

//! The item list in the style of the examples in the HID specification:
//!
//! ```text
//! Usage Page (Generic Desktop),
//! Usage (Mouse),
//! Collection (Application),
//!   Logical Minimum (-127),
//!   Input (Variable, Relative),
//! End Collection,
//! ```
//!
//! Items are indented by collection depth. A descriptor that closes more
//! collections than it opens is shifted right so that no line is
//! indented by a negative amount.

use super::SinkBuf;
use crate::context::Context;
use crate::hid::Item;
use crate::item::*;
use crate::opt::{OptList, OptSpec, OptType, Options};
use crate::strm::{OutBuf, Sink};
use crate::types::Usage;
use crate::usage;
use crate::Result;

/// One rendered item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Row {
    pub depth: isize,
    pub bytes: Vec<u8>,
    pub text: String,
}

/// Turns items into [Row]s, tracking the context and collection depth.
#[derive(Debug, Default)]
pub(crate) struct Rows {
    context: Context,
    depth: isize,
    rows: Vec<Row>,
}

impl Rows {
    pub(crate) fn put(&mut self, item: &Item) -> Result<()> {
        let semantic = SemanticItem::interpret(item, &mut self.context);
        if semantic == SemanticItem::Main(MainItem::EndCollection) {
            self.depth -= 1;
        }
        let row = Row {
            depth: self.depth,
            bytes: item.encode(),
            text: describe(&semantic, &self.context),
        };
        if let SemanticItem::Main(MainItem::Collection(_)) = semantic {
            self.depth += 1;
        }
        self.rows.try_reserve(1)?;
        self.rows.push(row);
        Ok(())
    }

    /// All rows with depths shifted so the smallest one is zero.
    pub(crate) fn take(&mut self) -> Vec<Row> {
        let mut rows = std::mem::take(self).rows;
        let min = rows.iter().map(|r| r.depth).min().unwrap_or(0);
        for row in rows.iter_mut() {
            row.depth -= min;
        }
        rows
    }
}

fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn data(name: &str, flags: DataFlags, has_volatile: bool) -> String {
    let names: Vec<String> = flags
        .names(has_volatile)
        .iter()
        .map(|n| title_case(n))
        .collect();
    match names.is_empty() {
        true => name.to_string(),
        false => format!("{name} ({})", names.join(", ")),
    }
}

fn usage(name: &str, u: &Usage, context: &Context) -> String {
    let value = usage::describe(u, context.usage_page()).unwrap_or_else(|| match u.usage_page {
        Some(_) => format!("{:#010x}", u32::from(u)),
        None => format!("{:#04x}", u.usage_id.0),
    });
    format!("{name} ({value})")
}

fn reserved(class: &str, tag: u8, bytes: &[u8]) -> String {
    let data: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{class} Item ({tag:#x}, [{}])", data.join(" "))
}

/// The specification example text for one item, without the trailing
/// comma.
pub fn describe(item: &SemanticItem, context: &Context) -> String {
    match item {
        SemanticItem::Main(item) => match item {
            MainItem::Input(i) => data("Input", i.0, false),
            MainItem::Output(o) => data("Output", o.0, true),
            MainItem::Feature(f) => data("Feature", f.0, true),
            MainItem::Collection(c) => format!("Collection ({c})"),
            MainItem::EndCollection => "End Collection".into(),
            MainItem::Reserved(raw) => reserved("Main", raw.tag(), raw.data()),
        },
        SemanticItem::Global(item) => match item {
            GlobalItem::UsagePage(page) => {
                let name = usage::page_name(*page).unwrap_or_else(|| format!("{:#06x}", page.0));
                format!("Usage Page ({name})")
            }
            GlobalItem::LogicalMinimum(v) => format!("Logical Minimum ({v})"),
            GlobalItem::LogicalMaximum(v) => format!("Logical Maximum ({v})"),
            GlobalItem::PhysicalMinimum(v) => format!("Physical Minimum ({v})"),
            GlobalItem::PhysicalMaximum(v) => format!("Physical Maximum ({v})"),
            GlobalItem::UnitExponent(v) => format!("Unit Exponent ({v})"),
            GlobalItem::Unit(unit) => format!("Unit ({unit})"),
            GlobalItem::ReportSize(v) => format!("Report Size ({v})"),
            GlobalItem::ReportId(v) => format!("Report ID ({v})"),
            GlobalItem::ReportCount(v) => format!("Report Count ({v})"),
            GlobalItem::Push => "Push".into(),
            GlobalItem::Pop => "Pop".into(),
            GlobalItem::Reserved(raw) => reserved("Global", raw.tag(), raw.data()),
        },
        SemanticItem::Local(item) => match item {
            LocalItem::Usage(u) => usage("Usage", u, context),
            LocalItem::UsageMinimum(u) => usage("Usage Minimum", u, context),
            LocalItem::UsageMaximum(u) => usage("Usage Maximum", u, context),
            LocalItem::DesignatorIndex(v) => format!("Designator Index ({v})"),
            LocalItem::DesignatorMinimum(v) => format!("Designator Minimum ({v})"),
            LocalItem::DesignatorMaximum(v) => format!("Designator Maximum ({v})"),
            LocalItem::StringIndex(v) => format!("String Index ({v})"),
            LocalItem::StringMinimum(v) => format!("String Minimum ({v})"),
            LocalItem::StringMaximum(v) => format!("String Maximum ({v})"),
            LocalItem::Delimiter(d) if d.is_open() => "Delimiter (Open)".into(),
            LocalItem::Delimiter(d) if d.is_close() => "Delimiter (Close)".into(),
            LocalItem::Delimiter(d) => format!("Delimiter ({d})"),
            LocalItem::Reserved(raw) => reserved("Local", raw.tag(), raw.data()),
        },
        SemanticItem::Reserved(raw) => reserved("Reserved", raw.tag(), raw.data()),
        SemanticItem::Long(long) => reserved("Long", long.tag(), long.data()),
    }
}

/// The widest indentation step, wider ones are cut down to it.
pub const MAX_INDENT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecSinkConfig {
    /// Spaces per collection level, up to [MAX_INDENT]
    pub indent: u32,
}

impl Default for SpecSinkConfig {
    fn default() -> Self {
        SpecSinkConfig { indent: 2 }
    }
}

impl Options for SpecSinkConfig {
    const SPEC: &'static [OptSpec] = &[OptSpec::new(
        "indent",
        OptType::U32,
        Some("2"),
        "number of spaces per nesting level",
    )];

    fn from_opts(list: &OptList) -> Self {
        SpecSinkConfig {
            indent: list.get_u32("indent").unwrap_or(2).min(MAX_INDENT),
        }
    }
}

pub struct SpecSink<'a> {
    out: SinkBuf<'a>,
    config: SpecSinkConfig,
    rows: Rows,
}

impl<'a> SpecSink<'a> {
    pub fn new(out: OutBuf<'a>, config: SpecSinkConfig) -> SpecSink<'a> {
        SpecSink {
            out: SinkBuf::new(out),
            config,
            rows: Rows::default(),
        }
    }
}

impl Sink for SpecSink<'_> {
    fn put(&mut self, item: &Item) -> Result<()> {
        self.rows.put(item)
    }

    fn flush(&mut self) -> Result<()> {
        let step = self.config.indent.min(MAX_INDENT) as usize;
        for row in self.rows.take() {
            let indent = " ".repeat(row.depth as usize * step);
            self.out.write_str(&format!("{indent}{},\n", row.text))?;
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

// SPDX-License-Identifier: MIT

//! Conversion between single items and tree [Node]s.
//!
//! Every item maps to a node named after the item in snake case, e.g.
//! `usage_page` or `logical_minimum`. The value is the node text:
//!
//! - data item flags as a comma-separated list of names,
//! - usage pages and usages in hexadecimal, extended usages on a page
//!   other than the current one as the full 8-digit value,
//! - units as a `0x`-prefixed 8-digit hexadecimal value,
//! - everything else in decimal.
//!
//! A Collection carries its type in the `type` attribute. If an item's
//! payload is wider than the smallest encoding of its value, the node
//! has a `size` attribute with the payload width so the item can be
//! reproduced byte for byte. Payloads the value cannot reproduce at any
//! width, e.g. a Pop with data or a three byte Usage Page, are kept as
//! hexadecimal bytes in a `data` attribute instead.
//!
//! Items with reserved tags are `main`, `global` or `local` nodes with a
//! `tag` attribute, short items of the reserved type are `short` nodes
//! and long items are `long` nodes. Their text is the payload as
//! hexadecimal bytes. Any short item may also be given as a `basic`
//! node with `type` and `tag` attributes and the payload as text.
//!
//! Usage pages are read as hexadecimal, as a token such as `desktop` or
//! by name such as `generic_desktop`.

use crate::context::Context;
use crate::hid::{Item, LongItem, ShortItem, ShortType};
use crate::item::*;
use crate::tree::Node;
use crate::types::*;
use crate::unit::Unit;
use crate::usage;
use crate::{Error, Position, Result};

/// The payload width of an item, if it differs from the minimal one.
pub const SIZE_ATTR: &str = "size";
/// The payload width of the item closing a container, if it differs
/// from the minimal one.
pub const END_SIZE_ATTR: &str = "end_size";
/// The raw payload of an item whose value does not reproduce it.
pub const DATA_ATTR: &str = "data";
/// The raw payload of the item closing a container, if its value does
/// not reproduce it.
pub const END_DATA_ATTR: &str = "end_data";

/// Record how to reproduce the payload of `item` on `node`: nothing if
/// the minimal encoding of `shown` does, the width in `size_attr` if
/// lowering `semantic` to that width does, the raw bytes in `data_attr`
/// otherwise.
pub(crate) fn record_payload(
    node: &mut Node,
    item: &Item,
    semantic: &SemanticItem,
    shown: &SemanticItem,
    size_attr: &str,
    data_attr: &str,
) {
    let Item::Short(short) = item else {
        return;
    };
    let width = short.data().len();
    if semantic.lower_with_size(width).ok().as_ref() != Some(item) {
        node.set_attr(data_attr, &hex_bytes(short.data()));
    } else if width != shown.lower().data().len() {
        node.set_attr(size_attr, &width.to_string());
    }
}

/// Drop the page of extended usages that are on the current page, they
/// are shown as plain ids.
fn shown(semantic: &SemanticItem, context: &Context) -> SemanticItem {
    let strip = |u: &Usage| match u.usage_page {
        Some(page) if page == context.usage_page() => Usage::from_id(u.usage_id.0),
        _ => *u,
    };
    match semantic {
        SemanticItem::Local(LocalItem::Usage(u)) => LocalItem::Usage(strip(u)).into(),
        SemanticItem::Local(LocalItem::UsageMinimum(u)) => LocalItem::UsageMinimum(strip(u)).into(),
        SemanticItem::Local(LocalItem::UsageMaximum(u)) => LocalItem::UsageMaximum(strip(u)).into(),
        other => other.clone(),
    }
}

/// Bytes as space separated hex pairs, e.g. "01 ff".
pub(crate) fn hex_bytes(bytes: &[u8]) -> String {
    bytes.chunks(1).map(hex::encode).collect::<Vec<_>>().join(" ")
}

fn decimal(name: &str, value: impl std::fmt::Display) -> Node {
    Node::new(name).with_text(&value.to_string())
}

fn flags(name: &str, flags: DataFlags, has_volatile: bool) -> Node {
    Node::new(name).with_text(&flags.names(has_volatile).join(","))
}

fn usage(name: &str, usage: &Usage, context: &Context) -> Node {
    Node::new(name)
        .with_text(&usage.to_string())
        .with_comment(usage::describe(usage, context.usage_page()))
}

fn reserved(name: &str, raw: &ShortItem) -> Node {
    Node::new(name)
        .with_attr("tag", &raw.tag().to_string())
        .with_text(&hex_bytes(raw.data()))
}

/// The `type` attribute value of a collection.
pub(crate) fn collection_type(c: &CollectionItem) -> String {
    match c.token() {
        Some(token) => token.to_string(),
        None => format!("{:#04x}", u8::from(c)),
    }
}

fn describe(semantic: &SemanticItem, context: &Context) -> Node {
    match semantic {
        SemanticItem::Main(item) => match item {
            MainItem::Input(i) => flags("input", i.0, false),
            MainItem::Output(o) => flags("output", o.0, true),
            MainItem::Feature(f) => flags("feature", f.0, true),
            MainItem::Collection(c) => Node::new("collection").with_attr("type", &collection_type(c)),
            MainItem::EndCollection => Node::new("end_collection"),
            MainItem::Reserved(raw) => reserved("main", raw),
        },
        SemanticItem::Global(item) => match item {
            GlobalItem::UsagePage(page) => Node::new("usage_page")
                .with_text(&format!("{:02x}", page.0))
                .with_comment(usage::page_name(*page)),
            GlobalItem::LogicalMinimum(v) => decimal("logical_minimum", v),
            GlobalItem::LogicalMaximum(v) => decimal("logical_maximum", v),
            GlobalItem::PhysicalMinimum(v) => decimal("physical_minimum", v),
            GlobalItem::PhysicalMaximum(v) => decimal("physical_maximum", v),
            GlobalItem::UnitExponent(v) => decimal("unit_exponent", v),
            GlobalItem::Unit(unit) => Node::new("unit")
                .with_text(&format!("{:#010x}", unit.0))
                .with_comment(Some(unit.to_string())),
            GlobalItem::ReportSize(v) => decimal("report_size", v),
            GlobalItem::ReportId(v) => decimal("report_id", v),
            GlobalItem::ReportCount(v) => decimal("report_count", v),
            GlobalItem::Push => Node::new("push"),
            GlobalItem::Pop => Node::new("pop"),
            GlobalItem::Reserved(raw) => reserved("global", raw),
        },
        SemanticItem::Local(item) => match item {
            LocalItem::Usage(u) => usage("usage", u, context),
            LocalItem::UsageMinimum(u) => usage("usage_minimum", u, context),
            LocalItem::UsageMaximum(u) => usage("usage_maximum", u, context),
            LocalItem::DesignatorIndex(v) => decimal("designator_index", v),
            LocalItem::DesignatorMinimum(v) => decimal("designator_minimum", v),
            LocalItem::DesignatorMaximum(v) => decimal("designator_maximum", v),
            LocalItem::StringIndex(v) => decimal("string_index", v),
            LocalItem::StringMinimum(v) => decimal("string_minimum", v),
            LocalItem::StringMaximum(v) => decimal("string_maximum", v),
            LocalItem::Delimiter(v) => decimal("delimiter", v),
            LocalItem::Reserved(raw) => reserved("local", raw),
        },
        SemanticItem::Reserved(raw) => reserved("short", raw),
        SemanticItem::Long(long) => Node::new("long")
            .with_attr("tag", &long.tag().to_string())
            .with_text(&hex_bytes(long.data())),
    }
}

/// The node for `item`, whose interpretation is `semantic`. `context`
/// must be the state the item was interpreted in.
pub fn to_node(item: &Item, semantic: &SemanticItem, context: &Context) -> Node {
    let shown = shown(semantic, context);
    let mut node = describe(&shown, context);
    record_payload(&mut node, item, semantic, &shown, SIZE_ATTR, DATA_ATTR);
    node
}

/// Parses node text and attributes for one node, producing errors that
/// name the node.
struct Parser<'a> {
    node: &'a Node,
    name: &'a str,
    position: Position,
}

impl Parser<'_> {
    fn invalid(&self, message: impl Into<String>) -> Error {
        Error::InvalidNode {
            name: self.name.to_string(),
            position: self.position,
            message: message.into(),
        }
    }

    fn text(&self) -> &str {
        self.node.text().trim()
    }

    fn unsigned(&self) -> Result<u32> {
        let text = self.text();
        let value = match text.strip_prefix("0x") {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => text.parse::<u32>(),
        };
        value.map_err(|_| self.invalid(format!("\"{text}\" is not an unsigned number")))
    }

    fn signed(&self) -> Result<i32> {
        let text = self.text();
        text.parse::<i32>()
            .map_err(|_| self.invalid(format!("\"{text}\" is not a signed number")))
    }

    fn flags(&self, has_volatile: bool) -> Result<DataFlags> {
        DataFlags::parse_names(self.text(), has_volatile)
            .map_err(|name| self.invalid(format!("Unknown flag \"{name}\"")))
    }

    fn usage_page(&self) -> Result<UsagePage> {
        let text = self.text();
        u16::from_str_radix(text.trim_start_matches("0x"), 16)
            .ok()
            .map(UsagePage)
            .or_else(|| usage::page_from_token(text))
            .or_else(|| usage::page_from_name(text))
            .ok_or_else(|| self.invalid(format!("\"{text}\" is not a usage page")))
    }

    /// A usage id of up to four hex digits, or a full 8-digit value. A
    /// plain id with a four byte payload is extended with the current
    /// page.
    fn usage(&self, context: &Context) -> Result<Usage> {
        let text = self.text();
        let hex = text.trim_start_matches("0x");
        let err = |_| self.invalid(format!("\"{text}\" is not a usage"));
        if hex.len() > 4 {
            return u32::from_str_radix(hex, 16).map(Usage::from).map_err(err);
        }
        let id = u16::from_str_radix(hex, 16).map_err(err)?;
        match self.size()? {
            Some(4) => Ok(Usage::extended(context.usage_page().0, id)),
            _ => Ok(Usage::from_id(id)),
        }
    }

    fn collection(&self) -> Result<CollectionItem> {
        let value = self
            .node
            .attr("type")
            .ok_or_else(|| self.invalid("Missing type attribute"))?;
        CollectionItem::from_token(value)
            .ok_or_else(|| self.invalid(format!("Unknown collection type \"{value}\"")))
    }

    fn tag(&self) -> Result<u8> {
        let value = self
            .node
            .attr("tag")
            .ok_or_else(|| self.invalid("Missing tag attribute"))?;
        value
            .trim()
            .parse::<u8>()
            .map_err(|_| self.invalid(format!("Invalid tag \"{value}\"")))
    }

    /// Hex bytes, optionally separated by whitespace.
    fn hex(&self, text: &str) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        for token in text.split_whitespace() {
            let decoded = hex::decode(token)
                .map_err(|e| self.invalid(format!("Invalid hex bytes \"{token}\": {e}")))?;
            bytes.try_reserve(decoded.len())?;
            bytes.extend(decoded);
        }
        Ok(bytes)
    }

    fn bytes(&self) -> Result<Vec<u8>> {
        self.hex(self.text())
    }

    fn short(&self, item_type: ShortType) -> Result<SemanticItem> {
        let raw = ShortItem::new(item_type, self.tag()?, &self.bytes()?)
            .map_err(|e| self.invalid(e.to_string()))?;
        Ok(SemanticItem::from(&Item::Short(raw)))
    }

    fn size_of(&self, attr: &str) -> Result<Option<usize>> {
        match self.node.attr(attr) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse::<usize>()
                .map(Some)
                .map_err(|_| self.invalid(format!("Invalid {attr} \"{value}\""))),
        }
    }

    fn size(&self) -> Result<Option<usize>> {
        self.size_of(SIZE_ATTR)
    }

    /// A short item given by its type, tag and payload.
    fn basic(&self) -> Result<Item> {
        let value = self
            .node
            .attr("type")
            .ok_or_else(|| self.invalid("Missing type attribute"))?;
        let item_type = match value.trim() {
            "main" => ShortType::Main,
            "global" => ShortType::Global,
            "local" => ShortType::Local,
            "reserved" => ShortType::Reserved,
            other => other
                .parse::<u8>()
                .ok()
                .filter(|t| *t <= 3)
                .map(ShortType::from)
                .ok_or_else(|| self.invalid(format!("Unknown item type \"{other}\"")))?,
        };
        let data = self.bytes()?;
        if let Some(size) = self.size()? {
            if size != data.len() {
                return Err(self.invalid(format!("Size {size} does not match {} data bytes", data.len())));
            }
        }
        let raw = ShortItem::new(item_type, self.tag()?, &data).map_err(|e| self.invalid(e.to_string()))?;
        Ok(Item::Short(raw))
    }

    fn semantic(&self, context: &Context) -> Result<SemanticItem> {
        let item: SemanticItem = match self.name {
            "input" => MainItem::Input(InputItem(self.flags(false)?)).into(),
            "output" => MainItem::Output(OutputItem(self.flags(true)?)).into(),
            "feature" => MainItem::Feature(FeatureItem(self.flags(true)?)).into(),
            "collection" => MainItem::Collection(self.collection()?).into(),
            "end_collection" => MainItem::EndCollection.into(),
            "main" => self.short(ShortType::Main)?,
            "usage_page" => GlobalItem::UsagePage(self.usage_page()?).into(),
            "logical_minimum" => GlobalItem::LogicalMinimum(LogicalMinimum(self.signed()?)).into(),
            "logical_maximum" => GlobalItem::LogicalMaximum(LogicalMaximum(self.signed()?)).into(),
            "physical_minimum" => {
                GlobalItem::PhysicalMinimum(PhysicalMinimum(self.signed()?)).into()
            }
            "physical_maximum" => {
                GlobalItem::PhysicalMaximum(PhysicalMaximum(self.signed()?)).into()
            }
            "unit_exponent" => GlobalItem::UnitExponent(UnitExponent(self.signed()?)).into(),
            "unit" => GlobalItem::Unit(Unit(self.unsigned()?)).into(),
            "report_size" => GlobalItem::ReportSize(ReportSize(self.unsigned()?)).into(),
            "report_id" => GlobalItem::ReportId(ReportId(self.unsigned()?)).into(),
            "report_count" => GlobalItem::ReportCount(ReportCount(self.unsigned()?)).into(),
            "push" => GlobalItem::Push.into(),
            "pop" => GlobalItem::Pop.into(),
            "global" => self.short(ShortType::Global)?,
            "usage" => LocalItem::Usage(self.usage(context)?).into(),
            "usage_minimum" => LocalItem::UsageMinimum(self.usage(context)?).into(),
            "usage_maximum" => LocalItem::UsageMaximum(self.usage(context)?).into(),
            "designator_index" => {
                LocalItem::DesignatorIndex(DesignatorIndex(self.unsigned()?)).into()
            }
            "designator_minimum" => {
                LocalItem::DesignatorMinimum(DesignatorMinimum(self.unsigned()?)).into()
            }
            "designator_maximum" => {
                LocalItem::DesignatorMaximum(DesignatorMaximum(self.unsigned()?)).into()
            }
            "string_index" => LocalItem::StringIndex(StringIndex(self.unsigned()?)).into(),
            "string_minimum" => LocalItem::StringMinimum(StringMinimum(self.unsigned()?)).into(),
            "string_maximum" => LocalItem::StringMaximum(StringMaximum(self.unsigned()?)).into(),
            "delimiter" => LocalItem::Delimiter(Delimiter(self.unsigned()?)).into(),
            "local" => self.short(ShortType::Local)?,
            "short" => self.short(ShortType::Reserved)?,
            "long" => {
                let long = LongItem::new(self.tag()?, &self.bytes()?)
                    .map_err(|e| self.invalid(e.to_string()))?;
                SemanticItem::Long(long)
            }
            _ => {
                return Err(Error::UnknownElement {
                    name: self.name.to_string(),
                    position: self.position,
                })
            }
        };
        Ok(item)
    }

    /// Lower `semantic` with the raw payload in attribute `data_attr`, or
    /// else with the width in attribute `size_attr`.
    fn lower(&self, semantic: &SemanticItem, size_attr: &str, data_attr: &str) -> Result<Item> {
        let size = self.size_of(size_attr)?;
        if let Some(data) = self.node.attr(data_attr) {
            let Some((item_type, tag)) = semantic.short_tag() else {
                return Err(self.invalid(format!("Unexpected {data_attr} attribute")));
            };
            let data = self.hex(data)?;
            if size.is_some_and(|size| size != data.len()) {
                return Err(self.invalid(format!("{size_attr} does not match {data_attr}")));
            }
            let raw = ShortItem::new(item_type, tag, &data).map_err(|e| self.invalid(e.to_string()))?;
            return Ok(Item::Short(raw));
        }
        match size {
            None => Ok(semantic.lower()),
            Some(width) => semantic
                .lower_with_size(width)
                .map_err(|e| self.invalid(e.to_string())),
        }
    }
}

/// Parse a leaf node back into its item. `context` must be the state
/// the item is interpreted in.
pub fn from_node(node: &Node, context: &Context, position: Position) -> Result<(SemanticItem, Item)> {
    let parser = Parser {
        node,
        name: &node.name,
        position,
    };
    if node.name == "basic" {
        let item = parser.basic()?;
        return Ok((SemanticItem::from(&item), item));
    }
    let semantic = parser.semantic(context)?;
    let item = parser.lower(&semantic, SIZE_ATTR, DATA_ATTR)?;
    match node.attr(DATA_ATTR) {
        Some(_) => Ok((SemanticItem::from(&item), item)),
        None => Ok((semantic, item)),
    }
}

/// Lower `semantic` with the payload stored in attributes `size_attr`
/// and `data_attr` of `node`, used for the items a container node
/// stands for.
pub(crate) fn lower_as(
    node: &Node,
    semantic: &SemanticItem,
    size_attr: &str,
    data_attr: &str,
    position: Position,
) -> Result<Item> {
    Parser {
        node,
        name: &node.name,
        position,
    }
    .lower(semantic, size_attr, data_attr)
}

/// The collection type stored in a container node.
pub(crate) fn container_collection(node: &Node, position: Position) -> Result<CollectionItem> {
    Parser {
        node,
        name: &node.name,
        position,
    }
    .collection()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_for(bytes: &[u8], context: &mut Context) -> Node {
        let (item, _) = Item::decode(bytes).unwrap();
        let semantic = SemanticItem::interpret(&item, context);
        to_node(&item, &semantic, context)
    }

    fn bytes_for(node: &Node, context: &Context) -> Vec<u8> {
        from_node(node, context, Position::Unknown).unwrap().1.encode()
    }

    #[test]
    fn names_and_text() {
        let mut ctx = Context::new();
        let node = node_for(&[0x05, 0x0d], &mut ctx);
        assert_eq!(node.name, "usage_page");
        assert_eq!(node.text(), "0d");
        assert!(node.attr(SIZE_ATTR).is_none());

        let node = node_for(&[0x15, 0x81], &mut ctx);
        assert_eq!((node.name.as_str(), node.text()), ("logical_minimum", "-127"));

        let node = node_for(&[0x81, 0x02], &mut ctx);
        assert_eq!((node.name.as_str(), node.text()), ("input", "variable"));

        let node = node_for(&[0xa1, 0x01], &mut ctx);
        assert_eq!(node.attr("type"), Some("application"));

        let node = node_for(&[0xa1, 0x85], &mut ctx);
        assert_eq!(node.attr("type"), Some("0x85"));

        let node = node_for(&[0x67, 0x11, 0xf0, 0x00, 0x00], &mut ctx);
        assert_eq!(node.text(), "0x0000f011");
        assert_eq!(node.attr(SIZE_ATTR), Some("4"));
    }

    #[test]
    fn sized_items() {
        let mut ctx = Context::new();
        for bytes in [
            &[0x85, 0x07][..],
            &[0x86, 0x07, 0x00][..],
            &[0x87, 0x07, 0, 0, 0][..],
            &[0xc1, 0x00][..],
            &[0x84][..],
            &[0x16, 0x81, 0xff][..],
        ] {
            let node = node_for(bytes, &mut ctx);
            assert_eq!(bytes_for(&node, &ctx), bytes, "{node:?}");
        }
        let node = node_for(&[0x86, 0x07, 0x00], &mut ctx);
        assert_eq!(node.attr(SIZE_ATTR), Some("2"));
    }

    #[test]
    fn usages() {
        let mut ctx = Context::new();
        node_for(&[0x05, 0x0d], &mut ctx);

        let node = node_for(&[0x09, 0x02], &mut ctx);
        assert_eq!(node.text(), "02");

        // Extended usage on the current page
        let bytes = [0x0b, 0x02, 0x00, 0x0d, 0x00];
        let node = node_for(&bytes, &mut ctx);
        assert_eq!(node.text(), "02");
        assert_eq!(node.attr(SIZE_ATTR), Some("4"));
        assert_eq!(bytes_for(&node, &ctx), bytes);

        // Extended usage on another page
        let bytes = [0x0b, 0x30, 0x00, 0x01, 0x00];
        let node = node_for(&bytes, &mut ctx);
        assert_eq!(node.text(), "00010030");
        assert!(node.attr(SIZE_ATTR).is_none());
        assert_eq!(bytes_for(&node, &ctx), bytes);
    }

    #[test]
    fn reserved_and_long() {
        let mut ctx = Context::new();
        for (bytes, name) in [
            (&[0xd1, 0x42][..], "main"),
            (&[0xc4][..], "global"),
            (&[0x69, 0x04][..], "local"),
            (&[0x0d, 0x01][..], "short"),
            (&[0xfe, 0x02, 0xf0, 0x01, 0x02][..], "long"),
        ] {
            let node = node_for(bytes, &mut ctx);
            assert_eq!(node.name, name);
            assert_eq!(bytes_for(&node, &ctx), bytes);
        }
        let node = node_for(&[0xfe, 0x02, 0xf0, 0x01, 0x02], &mut ctx);
        assert_eq!(node.attr("tag"), Some("240"));
        assert_eq!(node.text(), "01 02");
    }

    #[test]
    fn irreproducible_payloads() {
        let mut ctx = Context::new();
        for (bytes, data) in [
            (&[0xa5, 0x01][..], "01"),
            (&[0xb5, 0x02][..], "02"),
            (&[0xc1, 0x07][..], "07"),
            (&[0xa2, 0x01, 0x01][..], "01 01"),
            (&[0x07, 0x01, 0x00, 0x01, 0x00][..], "01 00 01 00"),
        ] {
            let node = node_for(bytes, &mut ctx);
            assert_eq!(node.attr(DATA_ATTR), Some(data), "{node:?}");
            assert!(node.attr(SIZE_ATTR).is_none());
            assert_eq!(bytes_for(&node, &ctx), bytes, "{node:?}");
        }

        let node = Node::new("pop").with_attr(DATA_ATTR, "0201");
        assert_eq!(bytes_for(&node, &ctx), [0xb6, 0x02, 0x01]);
        let node = Node::new("pop").with_attr(DATA_ATTR, "02").with_attr(SIZE_ATTR, "1");
        assert_eq!(bytes_for(&node, &ctx), [0xb5, 0x02]);
        for node in [
            Node::new("pop").with_attr(DATA_ATTR, "02").with_attr(SIZE_ATTR, "2"),
            Node::new("pop").with_attr(DATA_ATTR, "01 02 03"),
            Node::new("pop").with_attr(DATA_ATTR, "0g"),
        ] {
            assert!(
                matches!(from_node(&node, &ctx, Position::Unknown), Err(Error::InvalidNode { .. })),
                "{node:?}"
            );
        }
    }

    #[test]
    fn usage_page_names() {
        let ctx = Context::new();
        for text in ["0d", "0x0d", "digitizer", "Digitizer"] {
            let node = Node::new("usage_page").with_text(text);
            assert_eq!(bytes_for(&node, &ctx), [0x05, 0x0d], "{text}");
        }
        #[cfg(feature = "hut")]
        {
            let node = Node::new("usage_page").with_text("generic_desktop");
            assert_eq!(bytes_for(&node, &ctx), [0x05, 0x01]);
        }
        let node = Node::new("usage_page").with_text("gadgets");
        assert!(matches!(
            from_node(&node, &ctx, Position::Unknown),
            Err(Error::InvalidNode { .. })
        ));
    }

    #[test]
    fn basic_items() {
        let ctx = Context::new();
        let node = Node::new("basic")
            .with_attr("type", "global")
            .with_attr("tag", "11")
            .with_text("02");
        let (semantic, item) = from_node(&node, &ctx, Position::Unknown).unwrap();
        assert_eq!(item.encode(), [0xb5, 0x02]);
        assert_eq!(semantic, GlobalItem::Pop.into());

        let node = Node::new("basic")
            .with_attr("type", "1")
            .with_attr("tag", "0")
            .with_attr(SIZE_ATTR, "2")
            .with_text("01 00");
        assert_eq!(bytes_for(&node, &ctx), [0x06, 0x01, 0x00]);

        let node = Node::new("basic").with_attr("type", "reserved").with_attr("tag", "3");
        assert_eq!(bytes_for(&node, &ctx), [0x3c]);

        for node in [
            Node::new("basic").with_attr("tag", "0"),
            Node::new("basic").with_attr("type", "4").with_attr("tag", "0"),
            Node::new("basic").with_attr("type", "main").with_attr("tag", "16"),
            Node::new("basic")
                .with_attr("type", "main")
                .with_attr("tag", "8")
                .with_attr(SIZE_ATTR, "1")
                .with_text("01 02"),
            Node::new("basic")
                .with_attr("type", "reserved")
                .with_attr("tag", "15")
                .with_text("01 02"),
        ] {
            assert!(
                matches!(from_node(&node, &ctx, Position::Unknown), Err(Error::InvalidNode { .. })),
                "{node:?}"
            );
        }
    }

    #[test]
    fn invalid_nodes() {
        let ctx = Context::new();
        let err = from_node(&Node::new("gadget"), &ctx, Position::Node(3)).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownElement { ref name, position: Position::Node(3) } if name == "gadget"
        ));

        for node in [
            Node::new("report_id").with_text("seven"),
            Node::new("report_id").with_text("300").with_attr(SIZE_ATTR, "1"),
            Node::new("report_id").with_text("3").with_attr(SIZE_ATTR, "3"),
            Node::new("input").with_text("variable,volatile"),
            Node::new("collection"),
            Node::new("collection").with_attr("type", "bogus"),
            Node::new("main").with_text("42"),
            Node::new("short").with_attr("tag", "15").with_text("01 02"),
            Node::new("long").with_attr("tag", "1").with_text("123"),
        ] {
            assert!(
                matches!(from_node(&node, &ctx, Position::Unknown), Err(Error::InvalidNode { .. })),
                "{node:?}"
            );
        }
    }
}

// SPDX-License-Identifier: MIT

//! The XML format: the folded item tree as an XML document.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <descriptor>
//!   <usage_page>0d</usage_page>
//!   <!-- Digitizers -->
//!   <usage>02</usage>
//!   <!-- Pen -->
//!   <collection type="application">
//!     <report_id>7</report_id>
//!   </collection>
//! </descriptor>
//! ```
//!
//! See [crate::element] for the element names and values and
//! [crate::fold] for how nesting is represented. Units are written in
//! the structured form described in [unit] unless the `structured_units`
//! option is off, both forms are read. Comments are written for the
//! reader's benefit and ignored when reading.

mod unit;

use super::SinkBuf;
use crate::fold::{Folder, Unfolder, ROOT};
use crate::hid::Item;
use crate::opt::{OptList, OptSpec, OptType, Options};
use crate::strm::{OutBuf, Sink, Source};
use crate::tree::{Node, NodeId, Tree};
use crate::{Error, Position, Result};

use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

const INDENT: usize = 2;

/// Line and column tracking for a reader that only moves forward.
struct Cursor<'a> {
    text: &'a [u8],
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a [u8]) -> Cursor<'a> {
        Cursor {
            text,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Line and column of the first non-whitespace byte at or after
    /// `offset`. Offsets before the previous one yield the previous
    /// position.
    fn locate(&mut self, offset: usize) -> Position {
        let mut offset = offset.clamp(self.offset, self.text.len());
        while offset < self.text.len() && self.text[offset].is_ascii_whitespace() {
            offset += 1;
        }
        for byte in &self.text[self.offset..offset] {
            match byte {
                b'\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                _ => self.column += 1,
            }
        }
        self.offset = offset;
        Position::LineColumn {
            line: self.line,
            column: self.column,
        }
    }
}

fn xml_error(position: Position) -> impl Fn(&dyn std::fmt::Display) -> Error {
    move |e| Error::Xml {
        position,
        message: e.to_string(),
    }
}

fn element(e: &BytesStart, position: Position) -> Result<Node> {
    let err = xml_error(position);
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|e| err(&e))?
        .to_string();
    let mut node = Node::new(&name);
    node.position = Some(position);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| err(&e))?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(|e| err(&e))?;
        let value = attr.unescape_value().map_err(|e| err(&e))?;
        node.set_attr(key, &value);
    }
    Ok(node)
}

/// Parse an XML document into a tree. The document element must be
/// `descriptor`.
pub fn parse(text: &[u8]) -> Result<Tree> {
    let mut reader = Reader::from_reader(text);
    reader.config_mut().trim_text(true);
    let mut cursor = Cursor::new(text);

    let mut tree: Option<Tree> = None;
    let mut stack: Vec<NodeId> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let position = cursor.locate(reader.buffer_position() as usize);
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(position)(&e))?;

        let (e, is_empty) = match event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => {
                if let (Some(id), Some(tree)) = (stack.pop(), tree.as_mut()) {
                    unit::collapse(tree, id)?;
                }
                buf.clear();
                continue;
            }
            Event::Text(t) => {
                if let Some(top) = stack.last() {
                    let text = t.unescape().map_err(|e| xml_error(position)(&e))?;
                    if let Some(tree) = tree.as_mut() {
                        tree.node_mut(*top).text = Some(text.into_owned());
                    }
                }
                buf.clear();
                continue;
            }
            Event::Eof => break,
            _ => {
                buf.clear();
                continue;
            }
        };

        let node = element(&e, position)?;
        match tree.as_mut() {
            None => {
                if node.name != ROOT {
                    return Err(Error::UnknownElement {
                        name: node.name,
                        position,
                    });
                }
                let mut root = Tree::new(ROOT);
                let id = root.root();
                root.node_mut(id).position = Some(position);
                if !is_empty {
                    stack.push(id);
                }
                tree = Some(root);
            }
            Some(tree) => {
                let Some(parent) = stack.last() else {
                    return Err(Error::Xml {
                        position,
                        message: "Element after the document element".into(),
                    });
                };
                let id = tree.append(*parent, node)?;
                if !is_empty {
                    stack.push(id);
                }
            }
        }
        buf.clear();
    }

    let end = cursor.locate(text.len());
    if !stack.is_empty() {
        return Err(Error::Xml {
            position: end,
            message: "Unclosed element".into(),
        });
    }
    tree.ok_or(Error::Xml {
        position: end,
        message: "No document element".into(),
    })
}

pub struct XmlSource {
    unfolder: Unfolder,
}

impl XmlSource {
    pub fn new(text: &[u8]) -> Result<XmlSource> {
        let tree = parse(text)?;
        Ok(XmlSource {
            unfolder: Unfolder::new(tree),
        })
    }
}

impl Source for XmlSource {
    fn get(&mut self) -> Result<Option<Item>> {
        self.unfolder.get()
    }

    fn position(&self) -> Position {
        self.unfolder.position()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlSinkConfig {
    /// Indent nested elements and put each on its own line
    pub format: bool,
    /// Write units as a unit system element with one element per
    /// exponent instead of a hex value
    pub structured_units: bool,
}

impl Default for XmlSinkConfig {
    fn default() -> Self {
        XmlSinkConfig {
            format: true,
            structured_units: true,
        }
    }
}

impl Options for XmlSinkConfig {
    const SPEC: &'static [OptSpec] = &[
        OptSpec::new("format", OptType::Boolean, Some("yes"), "indent and break lines"),
        OptSpec::new(
            "structured_units",
            OptType::Boolean,
            Some("yes"),
            "write units as elements per exponent",
        ),
    ];

    fn from_opts(list: &OptList) -> Self {
        XmlSinkConfig {
            format: list.get_bool("format").unwrap_or(true),
            structured_units: list.get_bool("structured_units").unwrap_or(true),
        }
    }
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    tree: &Tree,
    id: NodeId,
    structured_units: bool,
) -> Result<()> {
    let err = xml_error(Position::Unknown);
    let node = tree.node(id);
    if structured_units {
        if let Some(expanded) = unit::expand(node)? {
            return write_node(writer, &expanded, expanded.root(), false);
        }
    }
    let mut start = BytesStart::new(node.name.as_str());
    for (name, value) in node.attributes.iter() {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    let children = tree.children(id);
    let text = node.text.as_deref().filter(|t| !t.is_empty());
    if children.is_empty() && text.is_none() {
        writer.write_event(Event::Empty(start)).map_err(|e| err(&e))?;
    } else {
        writer.write_event(Event::Start(start)).map_err(|e| err(&e))?;
        if let Some(text) = text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| err(&e))?;
        }
        for child in children {
            write_node(writer, tree, *child, structured_units)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(node.name.as_str())))
            .map_err(|e| err(&e))?;
    }

    if let Some(comment) = &node.comment {
        // "--" must not appear inside a comment
        let comment = format!(" {} ", comment.replace("--", "- -"));
        writer
            .write_event(Event::Comment(BytesText::from_escaped(comment)))
            .map_err(|e| err(&e))?;
    }
    Ok(())
}

/// Render a tree as an XML document.
pub fn render(tree: &Tree, config: &XmlSinkConfig) -> Result<Vec<u8>> {
    let mut writer = match config.format {
        true => Writer::new_with_indent(Vec::new(), b' ', INDENT),
        false => Writer::new(Vec::new()),
    };
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| xml_error(Position::Unknown)(&e))?;
    write_node(&mut writer, tree, tree.root(), config.structured_units)?;
    let mut doc = writer.into_inner();
    doc.try_reserve(1)?;
    doc.push(b'\n');
    Ok(doc)
}

/// Folds the items into a tree and writes the document on flush.
pub struct XmlSink<'a> {
    out: SinkBuf<'a>,
    config: XmlSinkConfig,
    folder: Folder,
}

impl<'a> XmlSink<'a> {
    pub fn new(out: OutBuf<'a>, config: XmlSinkConfig) -> XmlSink<'a> {
        XmlSink {
            out: SinkBuf::new(out),
            config,
            folder: Folder::new(),
        }
    }
}

impl Sink for XmlSink<'_> {
    fn put(&mut self, item: &Item) -> Result<()> {
        self.folder.put(item)
    }

    fn flush(&mut self) -> Result<()> {
        let tree = std::mem::take(&mut self.folder).finish()?;
        let doc = render(&tree, &self.config)?;
        debug!("xml: writing {} bytes", doc.len());
        self.out.write(&doc)
    }

    fn cleanup(&mut self) {
        self.folder = Folder::new();
        self.out.cleanup();
    }

    fn take(&mut self) -> Option<Vec<u8>> {
        self.out.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmt::natv::{NatvSink, NatvSource};
    use crate::strm::copy;

    fn to_xml(bytes: &[u8], config: XmlSinkConfig) -> String {
        let mut source = NatvSource::new(bytes);
        let mut sink = XmlSink::new(OutBuf::default(), config);
        copy(&mut source, &mut sink).unwrap();
        String::from_utf8(sink.take().unwrap()).unwrap()
    }

    fn from_xml(text: &str) -> Result<Vec<u8>> {
        let mut source = XmlSource::new(text.as_bytes())?;
        let mut sink = NatvSink::new(OutBuf::default());
        copy(&mut source, &mut sink)?;
        Ok(sink.take().unwrap_or_default())
    }

    const PEN: [u8; 9] = [0x05, 0x0d, 0x09, 0x02, 0xa1, 0x01, 0x85, 0x07, 0xc0];

    const COMPACT: XmlSinkConfig = XmlSinkConfig {
        format: false,
        structured_units: true,
    };

    #[test]
    fn compact_document() {
        let xml = to_xml(&PEN, COMPACT);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?><descriptor>"));
        assert!(xml.contains("<usage_page>0d</usage_page>"));
        assert!(xml.contains("<collection type=\"application\"><report_id>7</report_id></collection>"));
        assert!(xml.ends_with("</descriptor>\n"));
        assert_eq!(from_xml(&xml).unwrap(), PEN);
    }

    #[test]
    fn indented_document() {
        let xml = to_xml(&PEN, XmlSinkConfig::default());
        assert!(xml.contains("\n  <collection type=\"application\">\n    <report_id>7</report_id>\n  </collection>"));
        assert_eq!(from_xml(&xml).unwrap(), PEN);
    }

    #[test]
    fn interleaved_groups() {
        let bytes = [0xa1, 0x01, 0xa4, 0xc0, 0xb4, 0xa9, 0x01, 0xc1, 0x00];
        let xml = to_xml(&bytes, COMPACT);
        assert!(xml.contains("<collection type=\"application\"><push-resume/></collection><pop/>"));
        assert!(xml.contains("<delimiter-resume><end_collection size=\"1\"/></delimiter-resume>"));
        assert_eq!(from_xml(&xml).unwrap(), bytes);
    }

    #[test]
    fn irreproducible_payloads() {
        for bytes in [
            &[0xa5, 0x01, 0xb4][..],
            &[0xa4, 0xb5, 0x02][..],
            &[0xa1, 0x01, 0xc1, 0x07][..],
            &[0xa2, 0x01, 0x01, 0xc0][..],
            &[0x07, 0x01, 0x00, 0x01, 0x00][..],
            &[0xa1, 0x01, 0xa5, 0x03, 0xc0, 0xb4][..],
            &[0xb5, 0x02, 0xc2, 0x00, 0x01][..],
        ] {
            let xml = to_xml(bytes, COMPACT);
            assert_eq!(from_xml(&xml).unwrap(), bytes, "{xml}");
        }
        let xml = to_xml(&[0xa5, 0x01, 0xb4], COMPACT);
        assert!(xml.contains("<push-scope data=\"01\"/>"), "{xml}");
        let xml = to_xml(&[0xa2, 0x01, 0x01, 0xc0], COMPACT);
        assert!(xml.contains("<collection type=\"application\" data=\"01 01\"/>"), "{xml}");
    }

    #[test]
    fn structured_units() {
        let bytes = [0x66, 0x11, 0xf0, 0x65, 0x00, 0x67, 0x01, 0x00, 0x00, 0x00];
        let xml = to_xml(&bytes, COMPACT);
        assert!(xml.contains(
            "<unit><si_linear><centimeter/><seconds>-1</seconds></si_linear></unit>\
             <!-- SI Linear: centimeter seconds^-1 -->"
        ));
        assert!(xml.contains("<unit><none/></unit>"), "{xml}");
        assert!(xml.contains("<unit size=\"4\"><value>01</value></unit>"), "{xml}");
        assert_eq!(from_xml(&xml).unwrap(), bytes);

        let xml = to_xml(&bytes, XmlSinkConfig::default());
        assert_eq!(from_xml(&xml).unwrap(), bytes);

        let plain = XmlSinkConfig {
            format: false,
            structured_units: false,
        };
        let xml = to_xml(&bytes, plain);
        assert!(xml.contains("<unit>0x0000f011</unit>"), "{xml}");
        assert!(xml.contains("<unit size=\"4\">0x00000001</unit>"), "{xml}");
        assert_eq!(from_xml(&xml).unwrap(), bytes);
    }

    #[test]
    fn extended_dialect() {
        let xml = r#"<descriptor>
    <usage_page>digitizer</usage_page>
    <unit>
        <english_rotation>
            <degrees/>
            <seconds>-2</seconds>
        </english_rotation>
    </unit>
    <unit><generic system="vendor"><mass>3</mass></generic></unit>
    <basic type="global" tag="11" size="1">02</basic>
    <basic type="reserved" tag="0"/>
</descriptor>"#;
        assert_eq!(
            from_xml(xml).unwrap(),
            [0x05, 0x0d, 0x66, 0x14, 0xe0, 0x66, 0x0f, 0x03, 0xb5, 0x02, 0x0c]
        );

        assert!(matches!(
            from_xml("<descriptor>\n  <unit>\n    <metric/>\n  </unit>\n</descriptor>"),
            Err(Error::InvalidNode {
                ref name,
                position: Position::LineColumn { line: 2, column: 3 },
                ..
            }) if name == "unit"
        ));
    }

    #[test]
    fn hand_written() {
        let xml = r#"<?xml version="1.0"?>
<!-- A mouse -->
<descriptor>
    <usage_page>01</usage_page> <!-- Generic Desktop -->
    <usage>02</usage>
    <collection type="application">
        <logical_minimum>-127</logical_minimum>
        <input>variable,relative</input>
        <input/>
    </collection>
</descriptor>
"#;
        assert_eq!(
            from_xml(xml).unwrap(),
            [0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0x15, 0x81, 0x81, 0x06, 0x81, 0x00, 0xc0]
        );
    }

    #[test]
    fn errors() {
        assert!(matches!(
            from_xml("<descriptor>\n  <gizmo/>\n</descriptor>"),
            Err(Error::UnknownElement {
                ref name,
                position: Position::LineColumn { line: 2, column: 3 },
            }) if name == "gizmo"
        ));
        assert!(matches!(
            from_xml("<report>\n</report>"),
            Err(Error::UnknownElement { .. })
        ));
        assert!(matches!(
            from_xml("<descriptor>\n  <usage>01</usage_page>\n</descriptor>"),
            Err(Error::Xml {
                position: Position::LineColumn { line: 2, .. },
                ..
            })
        ));
        assert!(matches!(
            from_xml("<descriptor>\n<report_id>x</report_id></descriptor>"),
            Err(Error::InvalidNode {
                position: Position::LineColumn { line: 2, column: 1 },
                ..
            })
        ));
        assert!(matches!(from_xml("<descriptor>"), Err(Error::Xml { .. })));
        assert!(matches!(from_xml(""), Err(Error::Xml { .. })));
    }

    #[test]
    fn positions_in_long_documents() {
        let mut xml = String::from("<descriptor>\n");
        for _ in 0..200 {
            xml.push_str("  <report_id>1</report_id>\n");
        }
        xml.push_str("    <report_id>one</report_id>\n</descriptor>\n");
        assert!(matches!(
            from_xml(&xml),
            Err(Error::InvalidNode {
                position: Position::LineColumn { line: 202, column: 5 },
                ..
            })
        ));
    }

    #[test]
    fn cursor() {
        let text = b"ab\n  cd\n\nef";
        let mut cursor = Cursor::new(text);
        assert_eq!(cursor.locate(0), Position::LineColumn { line: 1, column: 1 });
        assert_eq!(cursor.locate(2), Position::LineColumn { line: 2, column: 3 });
        assert_eq!(cursor.locate(6), Position::LineColumn { line: 2, column: 4 });
        // Offsets behind the cursor do not move it back
        assert_eq!(cursor.locate(1), Position::LineColumn { line: 2, column: 4 });
        assert_eq!(cursor.locate(8), Position::LineColumn { line: 4, column: 1 });
        assert_eq!(cursor.locate(100), Position::LineColumn { line: 4, column: 3 });
    }
}

// SPDX-License-Identifier: MIT

//! The structured form of `unit` elements.
//!
//! ```xml
//! <unit>
//!   <si_linear>
//!     <centimeter/>
//!     <seconds>-1</seconds>
//!   </si_linear>
//! </unit>
//! ```
//!
//! The only child of `unit` names the unit system and holds one element
//! per non-zero exponent. An empty element stands for an exponent of 1.
//! Systems without unit names use `<generic system="vendor">` with the
//! quantity names `length`, `mass`, `time`, `temperature`, `current` and
//! `luminous_intensity`. A unit of zero is `<none/>`. Void units and
//! units with the reserved nibble set are `<value>` holding the payload
//! as little-endian hex bytes.
//!
//! A `unit` element with text instead of a child is the plain form
//! handled by [crate::element].

use crate::element;
use crate::hid::HidBytes;
use crate::tree::{Node, NodeId, Tree};
use crate::unit::{Quantity, Unit, UnitSystem};
use crate::{Error, Position, Result};

const UNIT: &str = "unit";
const NONE: &str = "none";
const VALUE: &str = "value";
const GENERIC: &str = "generic";
const SYSTEM_ATTR: &str = "system";

fn generic_names() -> [&'static str; 6] {
    Quantity::ALL.map(|q| q.generic_name())
}

fn system_text(system: UnitSystem) -> String {
    match system.token() {
        Some(token) => token.to_string(),
        None => u8::from(system).to_string(),
    }
}

/// The structured form of a plain `unit` node as a tree rooted at a
/// `unit` node with the same attributes and comment. `None` for any
/// other node.
pub(super) fn expand(node: &Node) -> Result<Option<Tree>> {
    if node.name != UNIT {
        return Ok(None);
    }
    let text = node.text();
    let Some(unit) = text
        .strip_prefix("0x")
        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
        .map(Unit)
    else {
        return Ok(None);
    };

    let mut tree = Tree::new(UNIT);
    let root = tree.root();
    let top = tree.node_mut(root);
    top.attributes = node.attributes.clone();
    top.comment = node.comment.clone();

    if unit == Unit::NONE {
        tree.append(root, Node::new(NONE))?;
        return Ok(Some(tree));
    }
    if unit.is_void() || !unit.is_known() {
        let bytes = HidBytes::from(unit.0).take();
        tree.append(root, Node::new(VALUE).with_text(&element::hex_bytes(&bytes)))?;
        return Ok(Some(tree));
    }

    let system = unit.system();
    let (child, names) = match (system.token(), system.names()) {
        (Some(token), Some(names)) => (Node::new(token), names),
        _ => (
            Node::new(GENERIC).with_attr(SYSTEM_ATTR, &system_text(system)),
            generic_names(),
        ),
    };
    let child = tree.append(root, child)?;
    for (quantity, name) in Quantity::ALL.iter().zip(names) {
        match unit.exponent(*quantity) {
            0 => continue,
            1 => tree.append(child, Node::new(name))?,
            exp => tree.append(child, Node::new(name).with_text(&exp.to_string()))?,
        };
    }
    Ok(Some(tree))
}

/// Exponents of the children of `id`, named after `names`.
fn exponents(
    tree: &Tree,
    id: NodeId,
    system: UnitSystem,
    names: [&str; 6],
) -> std::result::Result<Unit, String> {
    let mut unit = Unit::NONE.with_system(system);
    let mut seen = [false; 6];
    for child in tree.children(id) {
        let node = tree.node(*child);
        let idx = names
            .iter()
            .position(|n| *n == node.name)
            .ok_or_else(|| format!("Unknown unit element \"{}\"", node.name))?;
        if seen[idx] {
            return Err(format!("Duplicate unit element \"{}\"", node.name));
        }
        seen[idx] = true;
        let exp = match node.text().trim() {
            "" => 1,
            text => text
                .parse::<i8>()
                .ok()
                .filter(|e| (-8..=7).contains(e))
                .ok_or_else(|| format!("Invalid exponent \"{text}\" for {}", node.name))?,
        };
        unit = unit.with_exponent(Quantity::ALL[idx], exp);
    }
    Ok(unit)
}

fn read(tree: &Tree, id: NodeId) -> std::result::Result<Unit, String> {
    let node = tree.node(id);
    match node.name.as_str() {
        NONE => Ok(Unit::NONE),
        VALUE => {
            let text = node.text().split_whitespace().collect::<String>();
            let bytes =
                hex::decode(&text).map_err(|e| format!("Invalid unit value \"{text}\": {e}"))?;
            if bytes.len() > 4 {
                return Err(format!("Unit value \"{text}\" exceeds four bytes"));
            }
            let mut le = [0u8; 4];
            le[..bytes.len()].copy_from_slice(&bytes);
            Ok(Unit(u32::from_le_bytes(le)))
        }
        GENERIC => {
            let value = node
                .attr(SYSTEM_ATTR)
                .ok_or_else(|| String::from("Missing system attribute"))?;
            let system = UnitSystem::from_token(value)
                .ok_or_else(|| format!("Unknown unit system \"{value}\""))?;
            exponents(tree, id, system, generic_names())
        }
        name => {
            let (system, names) = UnitSystem::from_token(name)
                .and_then(|s| s.names().map(|names| (s, names)))
                .ok_or_else(|| format!("Unknown unit element \"{name}\""))?;
            exponents(tree, id, system, names)
        }
    }
}

/// Replace the children of a structured `unit` node with the plain
/// value text. Other nodes are left alone.
pub(super) fn collapse(tree: &mut Tree, id: NodeId) -> Result<()> {
    let node = tree.node(id);
    if node.name != UNIT || tree.children(id).is_empty() {
        return Ok(());
    }
    let position = node.position.unwrap_or(Position::Unknown);
    let invalid = |message: String| Error::InvalidNode {
        name: UNIT.to_string(),
        position,
        message,
    };
    let child = match tree.children(id) {
        [child] => *child,
        children => {
            return Err(invalid(format!(
                "Expected one unit system element, found {}",
                children.len()
            )))
        }
    };
    let unit = read(tree, child).map_err(invalid)?;
    tree.node_mut(id).text = Some(format!("{:#010x}", unit.0));
    tree.detach(child);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structured(value: u32) -> Tree {
        let node = Node::new(UNIT).with_text(&format!("{value:#010x}"));
        expand(&node).unwrap().unwrap()
    }

    /// The first child of the unit and its children as name(text) pairs
    fn shape(tree: &Tree) -> (String, Vec<String>) {
        let child = tree.children(tree.root())[0];
        let node = tree.node(child);
        let mut name = node.name.clone();
        for (attr, value) in node.attributes.iter() {
            name.push_str(&format!("[{attr}={value}]"));
        }
        if !node.text().is_empty() {
            name.push_str(&format!("({})", node.text()));
        }
        let inner = tree
            .children(child)
            .iter()
            .map(|c| {
                let n = tree.node(*c);
                format!("{}({})", n.name, n.text())
            })
            .collect();
        (name, inner)
    }

    fn collapsed(mut tree: Tree) -> Result<String> {
        let root = tree.root();
        collapse(&mut tree, root)?;
        assert!(tree.children(root).is_empty());
        Ok(tree.node(root).text().to_string())
    }

    #[test]
    fn known_systems() {
        // Velocity, cm/s
        let tree = structured(0xf011);
        assert_eq!(
            shape(&tree),
            ("si_linear".to_string(), vec!["centimeter()".to_string(), "seconds(-1)".to_string()])
        );
        assert_eq!(collapsed(tree).unwrap(), "0x0000f011");

        let tree = structured(0x0000_0e14);
        assert_eq!(shape(&tree).0, "english_rotation");
        assert_eq!(shape(&tree).1, ["degrees()", "slug(-2)"]);
        assert_eq!(collapsed(tree).unwrap(), "0x00000e14");
    }

    #[test]
    fn other_forms() {
        let tree = structured(0);
        assert_eq!(shape(&tree), ("none".to_string(), vec![]));
        assert_eq!(collapsed(tree).unwrap(), "0x00000000");

        // Void
        let tree = structured(0x01);
        assert_eq!(shape(&tree).0, "value(01)");
        assert_eq!(collapsed(tree).unwrap(), "0x00000001");

        // Reserved nibble set
        let tree = structured(0x1000_0011);
        assert_eq!(shape(&tree).0, "value(11 00 00 10)");
        assert_eq!(collapsed(tree).unwrap(), "0x10000011");

        let tree = structured(0x0000_011f);
        assert_eq!(shape(&tree).0, "generic[system=vendor]");
        assert_eq!(shape(&tree).1, ["length()", "mass()"]);
        assert_eq!(collapsed(tree).unwrap(), "0x0000011f");

        let tree = structured(0x0000_0027);
        assert_eq!(shape(&tree).0, "generic[system=7]");
        assert_eq!(collapsed(tree).unwrap(), "0x00000027");
    }

    #[test]
    fn attributes_and_plain_nodes() {
        let node = Node::new(UNIT)
            .with_text("0x00000011")
            .with_attr("size", "4")
            .with_comment(Some("SI Linear: centimeter".into()));
        let tree = expand(&node).unwrap().unwrap();
        let root = tree.node(tree.root());
        assert_eq!(root.attr("size"), Some("4"));
        assert_eq!(root.comment.as_deref(), Some("SI Linear: centimeter"));

        assert!(expand(&Node::new("usage").with_text("0x01")).unwrap().is_none());
        assert!(expand(&Node::new(UNIT).with_text("17")).unwrap().is_none());

        let mut tree = Tree::new(UNIT);
        let root = tree.root();
        tree.node_mut(root).text = Some("0x11".into());
        collapse(&mut tree, root).unwrap();
        assert_eq!(tree.node(root).text(), "0x11");
    }

    fn unit_with(children: &[Node]) -> Tree {
        let mut tree = Tree::new(UNIT);
        let root = tree.root();
        let mut parent = root;
        for (idx, child) in children.iter().enumerate() {
            let id = tree.append(parent, child.clone()).unwrap();
            if idx == 0 {
                parent = id;
            }
        }
        tree
    }

    #[test]
    fn hand_written() {
        let tree = unit_with(&[
            Node::new("si_rotation"),
            Node::new("seconds").with_text("-2"),
            Node::new("radians").with_text(" "),
        ]);
        assert_eq!(collapsed(tree).unwrap(), "0x0000e012");

        let tree = unit_with(&[Node::new("value").with_text("11f0")]);
        assert_eq!(collapsed(tree).unwrap(), "0x0000f011");

        let tree = unit_with(&[
            Node::new("generic").with_attr("system", "si_linear"),
            Node::new("length"),
        ]);
        assert_eq!(collapsed(tree).unwrap(), "0x00000011");
    }

    #[test]
    fn invalid_units() {
        for children in [
            vec![Node::new("metric")],
            vec![Node::new("si_linear"), Node::new("inch")],
            vec![Node::new("si_linear"), Node::new("gram"), Node::new("gram")],
            vec![Node::new("si_linear"), Node::new("gram").with_text("8")],
            vec![Node::new("value").with_text("0102030405")],
            vec![Node::new("value").with_text("xyz")],
            vec![Node::new("generic")],
            vec![Node::new("generic").with_attr("system", "16")],
            vec![Node::new("vendor")],
        ] {
            let tree = unit_with(&children);
            assert!(
                matches!(collapsed(tree), Err(Error::InvalidNode { .. })),
                "{children:?}"
            );
        }

        let mut tree = Tree::new(UNIT);
        let root = tree.root();
        tree.append(root, Node::new("none")).unwrap();
        tree.append(root, Node::new("none")).unwrap();
        assert!(matches!(
            collapse(&mut tree, root),
            Err(Error::InvalidNode { .. })
        ));
    }
}

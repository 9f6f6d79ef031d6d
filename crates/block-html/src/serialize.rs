//! Tree to markup serialization.

use crate::parse::is_void_element;
use crate::tree::{NodeData, NodeId, Tree};
use html_escape::{encode_double_quoted_attribute, encode_text};

impl Tree {
    /// Markup of the node's children.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let raw = self
            .tag_name(id)
            .is_some_and(|name| matches!(name, "script" | "style"));
        for child in self.children(id) {
            if raw {
                if let NodeData::Text(text) = self.data(child) {
                    out.push_str(text);
                    continue;
                }
            }
            self.write_node(child, &mut out);
        }
        out
    }

    /// Markup of the node itself, including its children.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Markup of the whole tree.
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Document => out.push_str(&self.inner_html(id)),
            NodeData::Text(text) => out.push_str(&encode_text(text)),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for (name, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if is_void_element(&element.name) {
                    return;
                }
                out.push_str(&self.inner_html(id));
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
        }
    }
}

//! Serialization of the element tree to HTML and XML text.
//!
//! Output is stable: attributes are written in name order, so two trees
//! with the same attribute sets serialize byte-identically. The HTML form
//! omits end tags for void elements; the XML form is always well-formed and
//! self-closes empty elements.

use crate::dom::html::meta;
use crate::dom::{Attribute, Document, NodeRef};

#[derive(Copy, Clone, PartialEq)]
enum Syntax {
    Html,
    Xml,
}

impl<'a> NodeRef<'a> {
    /// Serialize this element and its sub-tree as HTML.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_node(&mut out, *self, Syntax::Html, true);
        out
    }

    /// Serialize this element's content (text and children) as HTML,
    /// without the element's own tags.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        write_node(&mut out, *self, Syntax::Html, false);
        out
    }

    /// Serialize this element and its sub-tree as well-formed XML.
    pub fn outer_xml(&self) -> String {
        let mut out = String::new();
        write_node(&mut out, *self, Syntax::Xml, true);
        out
    }

    /// Serialize this element's content as XML, without the element's own
    /// tags.
    pub fn inner_xml(&self) -> String {
        let mut out = String::new();
        write_node(&mut out, *self, Syntax::Xml, false);
        out
    }
}

/// Serialize convenience methods.
impl Document {
    /// Serialize the root element (and any unparented siblings) as HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_node(&mut out, self.document_node_ref(), Syntax::Html, false);
        out
    }

    /// Serialize the root element (and any unparented siblings) as XML.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        write_node(&mut out, self.document_node_ref(), Syntax::Xml, false);
        out
    }
}

fn write_node(out: &mut String, nr: NodeRef<'_>, syntax: Syntax, with_tags: bool) {
    let elm = match nr.as_element() {
        Some(elm) => elm,
        None => {
            // the document node: content only
            for child in nr.children() {
                write_node(out, child, syntax, true);
                push_escaped(out, &child.as_element().expect("element").tail);
            }
            return;
        }
    };

    let void = syntax == Syntax::Html && meta::VOID.contains(elm.name());
    let empty = elm.text.is_empty() && nr.children().next().is_none();

    if with_tags {
        out.push('<');
        out.push_str(elm.name());
        for attr in ordered_attrs(elm.attrs()) {
            out.push(' ');
            out.push_str(&attr.name.local);
            out.push_str("=\"");
            push_escaped_attr(out, &attr.value);
            out.push('"');
        }
        if syntax == Syntax::Xml && empty {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if void {
            return;
        }
    } else if void {
        return;
    }

    push_escaped(out, &elm.text);
    for child in nr.children() {
        write_node(out, child, syntax, true);
        push_escaped(out, &child.as_element().expect("element").tail);
    }

    if with_tags {
        out.push_str("</");
        out.push_str(elm.name());
        out.push('>');
    }
}

/// Attributes in name order, for stable output.
fn ordered_attrs(attrs: &[Attribute]) -> Vec<&Attribute> {
    let mut ordered: Vec<&Attribute> = attrs.iter().collect();
    ordered.sort_by(|a, b| a.name.local.as_ref().cmp(b.name.local.as_ref()));
    ordered
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn push_escaped_attr(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

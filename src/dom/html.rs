//! Tolerant HTML parsing to `Document`.
//!
//! The tokenizer is html5ever's; tree construction is this module's own and
//! is deliberately simpler than the WHATWG tree builder. It keeps the
//! document close to the structure of the input: if a page has no `<head>`
//! or `<body>`, none appear in the tree, and content hangs directly off the
//! `<html>` root. Misnested inline formatting is recovered so that the tree
//! renders as if a stateful renderer had consumed the raw tag stream.

use std::mem;

use html5ever::buffer_queue::BufferQueue;
use html5ever::tokenizer::{
    Tag, TagKind, Token, TokenSink, TokenSinkResult,
    Tokenizer, TokenizerOpts,
};
use log::trace;
use tendril::StrTendril;

use crate::chars::is_all_ascii_ws;
use crate::decode;
use crate::dom::{
    Attribute, Document, Element, LocalName, Node, NodeData, NodeId,
};

pub(crate) mod meta;

/// Parse a complete HTML document from a string.
///
/// The root element is always `html`, even if no such tag was present in
/// the input. A leading U+FEFF is ignored. Never fails; malformed markup is
/// recovered, not rejected.
pub fn parse_str(html: &str) -> Document {
    let html = html.strip_prefix('\u{FEFF}').unwrap_or(html);

    let mut input = BufferQueue::new();
    input.push_back(StrTendril::from_slice(html));

    let mut tok = Tokenizer::new(
        TreeBuilder::new(),
        TokenizerOpts::default());
    let _ = tok.feed(&mut input);
    tok.end();
    tok.sink.finish()
}

/// Parse a complete HTML document from raw bytes, detecting the character
/// encoding first.
///
/// `hint` is charset information obtained via external means, e.g. the HTTP
/// `Content-Type` header, and overrides in-document declarations.
pub fn parse_bytes(bytes: &[u8], hint: Option<&str>) -> Document {
    let encoding = decode::detect(bytes, hint);
    parse_str(&decode::decode(bytes, encoding))
}

/// Parse an HTML fragment.
///
/// If the fragment parses to a single element — exactly one child of the
/// root, no other non-whitespace text at the top level — that element
/// becomes the root element of the returned `Document`, with its trailing
/// whitespace dropped. Otherwise the synthetic `html` root wraps the pieces.
pub fn parse_fragment(html: &str) -> Document {
    let mut doc = parse_str(html);
    let root = doc.root_element().expect("parse produces a root");

    let single = {
        let mut kids = doc.children(root);
        match (kids.next(), kids.next()) {
            (Some(child), None) => Some(child),
            _ => None,
        }
    };

    if let Some(child) = single {
        let extractable = {
            let rtext = &doc[root].as_element().expect("element").text;
            let ctail = &doc[child].as_element().expect("element").tail;
            is_all_ascii_ws(rtext) && is_all_ascii_ws(ctail)
        };
        if extractable {
            doc[child].as_element_mut().expect("element").tail =
                StrTendril::new();
            doc.fold(root);
            debug_assert_eq!(Some(child), doc.root_element());
        }
    }
    doc
}

/// A `TokenSink` building the element tree from the tokenizer's tag and
/// character stream.
struct TreeBuilder {
    doc: Document,

    /// Open-elements stack; the bottom is the synthetic `html` root.
    open: Vec<NodeId>,

    /// Active formatting elements, outermost first, tracked independently
    /// of the open stack.
    formatting: Vec<(LocalName, Vec<Attribute>)>,
}

impl TreeBuilder {
    fn new() -> TreeBuilder {
        let mut doc = Document::new();
        let root = doc.append_child(
            Document::DOCUMENT_NODE_ID,
            Element::new("html"));
        TreeBuilder {
            doc,
            open: vec![root],
            formatting: Vec::new(),
        }
    }

    /// Consume the built document, trimming whitespace-only character data
    /// around `head`/`body` at the root boundary.
    fn finish(&mut self) -> Document {
        let root = self.open[0];

        let trim_text = match self.doc[root].first_child() {
            Some(first) => {
                is_head_or_body(&self.doc, first)
                    && is_all_ascii_ws(
                        &self.doc[root].as_element().expect("element").text)
            }
            None => false,
        };
        if trim_text {
            self.doc[root].as_element_mut().expect("element").text =
                StrTendril::new();
        }

        if let Some(last) = self.doc[root].last_child() {
            if is_head_or_body(&self.doc, last)
                && is_all_ascii_ws(
                    &self.doc[last].as_element().expect("element").tail)
            {
                self.doc[last].as_element_mut().expect("element").tail =
                    StrTendril::new();
            }
        }

        mem::replace(&mut self.doc, Document::new())
    }

    #[inline]
    fn top(&self) -> NodeId {
        *self.open.last().expect("open stack is never empty")
    }

    fn elem_name(&self, id: NodeId) -> &LocalName {
        self.doc[id].as_element().expect("open stack holds elements").name()
    }

    /// True if `tag` is found on the open stack, walking from the top,
    /// before any member of `scope`.
    fn has_in_scope(
        &self,
        tag: &LocalName,
        scope: &std::collections::HashSet<LocalName>)
        -> bool
    {
        for &id in self.open.iter().rev() {
            let name = self.elem_name(id);
            if name == tag {
                return true;
            }
            if scope.contains(name) {
                break;
            }
        }
        false
    }

    /// Create an element, attach it as the last child of the current top,
    /// and push it onto the open stack.
    fn open_element(&mut self, name: LocalName, attrs: Vec<Attribute>)
        -> NodeId
    {
        let id = self.doc.append_child(
            self.top(),
            Element::with_attrs(name, attrs));
        self.open.push(id);
        id
    }

    /// Pop the open stack down to and including the first element with the
    /// given tag name. The root is never popped.
    fn close_tag(&mut self, tag: &LocalName) {
        while self.open.len() > 1 {
            let id = self.open.pop().expect("len checked");
            if self.elem_name(id) == tag {
                break;
            }
        }
    }

    /// Reconcile the active formatting list with the open stack: every
    /// formatter in the list with no remaining counterpart on the stack is
    /// reopened, in list order, under the current top.
    fn reconstruct_formatting(&mut self) {
        let mut ti = 0;
        let mut pending = Vec::new();
        for fi in 0..self.formatting.len() {
            let fname = &self.formatting[fi].0;
            while ti < self.open.len() && self.elem_name(self.open[ti]) != fname
            {
                ti += 1;
            }
            if ti < self.open.len() {
                ti += 1;
            } else {
                pending.push(fi);
            }
        }
        for fi in pending {
            let (name, attrs) = self.formatting[fi].clone();
            self.open_element(name, attrs);
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        let Tag { name, self_closing, attrs, .. } = tag;

        // <html> itself is not re-opened; its attributes merge into the
        // synthetic root.
        if name == local_name!("html") {
            let root = self.open[0];
            let elm = self.doc[root].as_element_mut().expect("element");
            for a in attrs {
                elm.set_attr(a.name.local.as_ref(), a.value);
            }
            return;
        }

        if meta::P_CLOSERS.contains(&name)
            && self.has_in_scope(&local_name!("p"), &meta::BLOCK_SCOPE)
        {
            self.close_tag(&local_name!("p"));
        }

        // Table parts, list items and options close a same-named open
        // element, provided a proper container bounds the search.
        if meta::TABLE_PARTS.contains(&name)
            && self.has_in_scope(&name, &meta::TABLE_SCOPE)
        {
            self.close_tag(&name);
        }

        if (name == local_name!("dd") || name == local_name!("dt")
                || name == local_name!("li"))
            && self.has_in_scope(&name, &meta::LIST_CONTAINERS)
        {
            self.close_tag(&name);
        }

        if (name == local_name!("optgroup") || name == local_name!("option"))
            && self.has_in_scope(&name, &meta::SELECT_CONTAINER)
        {
            self.close_tag(&name);
        }

        if meta::FORMATTING.contains(&name) {
            self.reconstruct_formatting();
            self.formatting.push((name.clone(), attrs.clone()));
        }

        self.open_element(name.clone(), attrs);

        if meta::VOID.contains(&name) {
            self.close_tag(&name);
        } else if self_closing && meta::raw_kind(&name).is_none() {
            // XHTML-style <div/>: open and close. Raw-text elements keep
            // their content scan regardless of a stray slash.
            self.end_tag(name);
        }
    }

    fn end_tag(&mut self, name: LocalName) {
        // a stray </html> never closes the root
        if name == local_name!("html") {
            return;
        }

        // </p> outside block scope records a stray end tag as an empty
        // paragraph, which the generic close below then pops.
        if name == local_name!("p")
            && !self.has_in_scope(&name, &meta::BLOCK_SCOPE)
        {
            self.open_element(local_name!("p"), Vec::new());
        }

        // list items can only be closed in list context
        if (name == local_name!("li") || name == local_name!("dd")
                || name == local_name!("dt"))
            && !self.has_in_scope(&name, &meta::LIST_SCOPE)
        {
            return;
        }

        if meta::FORMATTING.contains(&name) {
            self.end_formatting_tag(&name);
            return;
        }

        // avoid prematurely closing tables
        if self.has_in_scope(&name, &meta::DEFAULT_SCOPE) {
            self.close_tag(&name);
        }
    }

    /// Close a formatting element, resolving any misnesting so the tree
    /// renders as the raw tag stream would.
    fn end_formatting_tag(&mut self, name: &LocalName) {
        // ignore if this formatter is not active at all
        if !self.formatting.iter().any(|(n, _)| n == name) {
            return;
        }

        // If it is active but no longer on the open stack, it was already
        // closed structurally by earlier misnesting; only the list entry
        // remains to be dropped.
        if self.open.iter().any(|&id| self.elem_name(id) == name) {
            // Harmless misnesting: unwind formatting elements stacked above
            // ours. They stay in the formatting list and reopen on demand.
            while meta::FORMATTING.contains(self.elem_name(self.top()))
                && self.elem_name(self.top()) != name
            {
                self.open.pop();
            }

            if self.elem_name(self.top()) == name {
                self.open.pop();
            } else {
                // The hard case: the misnesting crosses non-formatting
                // (block) elements, so the formatter is pulled through them.
                let attrs = self.formatting.iter().rev()
                    .find(|(n, _)| n == name)
                    .map(|(_, a)| a.clone())
                    .expect("membership checked above");
                self.close_formatting_tag(name, &attrs);
            }
        }

        let last = self.formatting.iter()
            .rposition(|(n, _)| n == name)
            .expect("membership checked above");
        self.formatting.remove(last);
    }

    /// Recursive close over the open stack. The content seen before the end
    /// tag stays inside the formatter; intervening non-formatting elements
    /// remain, with the formatter re-implanted inside them.
    fn close_formatting_tag(&mut self, name: &LocalName, attrs: &[Attribute]) {
        // at least the root plus the formatter are on the stack
        debug_assert!(self.open.len() >= 2);

        let top = self.top();
        let top_name = self.elem_name(top).clone();

        if top_name == *name {
            self.open.pop();
        } else if meta::FORMATTING.contains(&top_name) {
            // Another formatter: pop it, close ours beneath, then reopen it
            // to keep the nesting order.
            let popped = self.open.pop().expect("len checked");
            let popped_attrs =
                self.doc[popped].as_element().expect("element")
                    .attrs().to_vec();
            self.close_formatting_tag(name, attrs);
            self.open_element(top_name, popped_attrs);
        } else {
            // A non-formatting element, e.g. a <div>: detach it, close ours
            // beneath, then move its content into a fresh formatter inside
            // it and reattach.
            let block = self.open.pop().expect("len checked");
            self.doc.unlink(block);

            self.close_formatting_tag(name, attrs);

            let mut fmt = Element::with_attrs(name.clone(), attrs.to_vec());
            {
                let belm = self.doc[block].as_element_mut().expect("element");
                fmt.text = mem::replace(&mut belm.text, StrTendril::new());
            }
            let fid = self.doc.push_node(Node::new(NodeData::Elem(fmt)));
            self.doc.reparent_children(block, fid);
            self.doc.append(block, fid);

            self.doc.append(self.top(), block);
            self.open.push(block);
        }
    }

    fn characters(&mut self, data: StrTendril) {
        self.reconstruct_formatting();
        let top = self.top();
        if let Some(last) = self.doc[top].last_child() {
            let elm = self.doc[last].as_element_mut().expect("element");
            elm.tail.push_tendril(&data);
        } else {
            let elm = self.doc[top].as_element_mut().expect("element");
            elm.text.push_tendril(&data);
        }
    }
}

impl TokenSink for TreeBuilder {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line: u64)
        -> TokenSinkResult<()>
    {
        match token {
            Token::TagToken(tag) => {
                match tag.kind {
                    TagKind::StartTag => {
                        let name = tag.name.clone();
                        self.start_tag(tag);
                        if name == local_name!("plaintext") {
                            return TokenSinkResult::Plaintext;
                        }
                        if let Some(kind) = meta::raw_kind(&name) {
                            return TokenSinkResult::RawData(kind);
                        }
                    }
                    TagKind::EndTag => {
                        self.end_tag(tag.name);
                    }
                }
            }
            Token::CharacterTokens(data) => {
                self.characters(data);
            }
            // Comments, doctypes and NULs have no place in the tree.
            Token::CommentToken(_)
            | Token::DoctypeToken(_)
            | Token::NullCharacterToken
            | Token::EOFToken => {}
            Token::ParseError(e) => {
                trace!("parse error: {}", e);
            }
        }
        TokenSinkResult::Continue
    }
}

fn is_head_or_body(doc: &Document, id: NodeId) -> bool {
    doc[id].is_elem(local_name!("head"))
        || doc[id].is_elem(local_name!("body"))
}

// Copyright © 2019 David Kellum
//
// This DOM-like markup tree module was originally based on `victor::dom`, as
// of commit fdb11f3e8 of the source as found here:
//
// https://github.com/SimonSapin/victor
// (No copyright notice.)
// Licensed under the Apache license v2.0, or the MIT license

//! A mutable element tree and associated tools.
//!
//! Unlike most DOM-like containers, character data is not stored in separate
//! text nodes: every tree node is an element, carrying the text that appears
//! before its first child and the _tail_ text that appears after its own end
//! tag. This mirrors the structure the tolerant parser recovers and keeps
//! the tree cheap to rearrange.

use std::collections::BTreeSet;
use std::convert::TryInto;
use std::fmt;
use std::iter;
use std::num::NonZeroU32;
use std::ops::{Deref, DerefMut};

#[doc(no_inline)]
pub use html5ever::{Attribute, LocalName, QualName};

#[doc(no_inline)]
pub use tendril::StrTendril;

mod node_ref;
mod serializer;
pub mod html;
pub mod query;


pub use node_ref::{Children, Descendants, NodeRef, TextFragments};
pub use query::Selector;

/// A container for a tree of elements.
///
/// This uses a simple vector of [`Node`]s and u32 indexes for parent/child
/// and sibling ordering, instead of individually allocated nodes. A single
/// document is limited to 4 billion (2^32 - 1) total nodes.
///
/// All `Document` instances, even logically "empty" ones as freshly
/// constructed, contain a synthetic document node at the fixed
/// [`Document::DOCUMENT_NODE_ID`] that serves as the container for the
/// [`Document::root_element`], if present.
pub struct Document {
    nodes: Vec<Node>,
}

/// A `Node` identifier as a u32 index into a `Document`s `Node` vector.
///
/// Should only be used with the `Document` it was obtained from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(NonZeroU32);

/// A typed node within a `Document`, including identifiers to parent,
/// siblings and children.
#[derive(Clone, Debug)]
pub struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
}

/// The node kind and payload data associated with that kind.
#[derive(Clone, Debug)]
pub enum NodeData {
    /// The document node which contains all other nodes.
    Document,

    /// An element.
    Elem(Element),
}

/// A markup element: lowercase tag name, ordered attributes, and the
/// character data before the first child (`text`) and after the end tag
/// (`tail`).
#[derive(Clone, Debug)]
pub struct Element {
    name: LocalName,
    attrs: Vec<Attribute>,

    /// Character data preceding the first child. Never null; the empty
    /// tendril is the zero value.
    pub text: StrTendril,

    /// Character data following this element's end tag, up to the next
    /// sibling. Never null.
    pub tail: StrTendril,
}

/// Core implementation.
impl Document {
    /// The constant `NodeId` for the document node of all `Document`s.
    pub const DOCUMENT_NODE_ID: NodeId = NodeId(
        unsafe { NonZeroU32::new_unchecked(1) }
    );

    /// Construct a new `Document` with the single empty document node.
    pub fn new() -> Self {
        Document::with_capacity(8)
    }

    /// Construct a new `Document` with the single empty document node and
    /// specified node capacity.
    pub fn with_capacity(count: u32) -> Self {
        let mut nodes = Vec::with_capacity(count as usize);
        nodes.push(Node::new(NodeData::Document)); // Index 0: padding
        nodes.push(Node::new(NodeData::Document)); // Index 1: DOCUMENT_NODE_ID
        Document { nodes }
    }

    /// Return the total number of `Node`s.
    ///
    /// This includes the document node and all occupied nodes, some of which
    /// may no longer be reachable from the document node after unlinking.
    #[inline]
    pub fn len(&self) -> u32 {
        let nodes: u32 = self.nodes.len()
            .try_into()
            .expect("Document (u32) node index overflow");
        debug_assert!(nodes > 0);
        nodes - 1 // don't count padding (index 0)
    }

    /// Return true if this document only contains the single, empty document
    /// node.
    ///
    /// Note that when "empty" the [`Document::len`] is still one (1).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() < 2
    }

    /// Return the root element `NodeId` for this Document, or None if there
    /// is no such qualified element.
    ///
    /// An element is _the_ root element if it is the sole direct child of
    /// the document node.
    pub fn root_element(&self) -> Option<NodeId> {
        let document_node = &self[Document::DOCUMENT_NODE_ID];
        debug_assert!(
            (if let NodeData::Document = document_node.data { true }
             else { false }),
            "not document node: {:?}", document_node);
        debug_assert!(document_node.parent.is_none());
        debug_assert!(document_node.next_sibling.is_none());
        debug_assert!(document_node.prev_sibling.is_none());
        let mut root = None;
        for child in self.children(Document::DOCUMENT_NODE_ID) {
            if root.is_none() {
                root = Some(child);
            } else {
                return None; // only a sole child qualifies
            }
        }
        root
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        debug_assert!(
            (if let NodeData::Document = node.data { false } else { true }),
            "Invalid push {:?}", node.data);
        let next_index = self.nodes.len()
            .try_into()
            .expect("Document (u32) node index overflow");
        debug_assert!(next_index > 1);
        self.nodes.push(node);
        NodeId(unsafe { NonZeroU32::new_unchecked(next_index) })
    }

    /// Unlink the specified node from its parent and siblings.
    ///
    /// The node and its own children remain intact and may be relinked via
    /// [`Document::append`] or [`Document::insert_before`]. Panics if called
    /// with the synthetic document node. Unlinking the root element results
    /// in a document with no root element.
    pub fn unlink(&mut self, id: NodeId) {
        assert!(
            id != Document::DOCUMENT_NODE_ID,
            "Can't unlink the synthetic document node");

        let (parent, prev_sibling, next_sibling) = {
            let node = &mut self[id];
            (node.parent.take(),
             node.prev_sibling.take(),
             node.next_sibling.take())
        };

        if let Some(next_sibling) = next_sibling {
            self[next_sibling].prev_sibling = prev_sibling
        } else if let Some(parent) = parent {
            self[parent].last_child = prev_sibling;
        }

        if let Some(prev_sibling) = prev_sibling {
            self[prev_sibling].next_sibling = next_sibling;
        } else if let Some(parent) = parent {
            self[parent].first_child = next_sibling;
        }
    }

    /// Append a new element as the last child of the given parent, returning
    /// its new ID.
    pub fn append_child(&mut self, parent: NodeId, elem: Element) -> NodeId {
        let id = self.push_node(Node::new(NodeData::Elem(elem)));
        self.append(parent, id);
        id
    }

    /// Append an existing node as the last child of the given parent.
    ///
    /// The node is unlinked from any prior position first.
    pub fn append(&mut self, parent: NodeId, new_child: NodeId) {
        self.unlink(new_child);
        self[new_child].parent = Some(parent);
        if let Some(last_child) = self[parent].last_child.take() {
            self[new_child].prev_sibling = Some(last_child);
            debug_assert!(self[last_child].next_sibling.is_none());
            self[last_child].next_sibling = Some(new_child);
        } else {
            debug_assert!(self[parent].first_child.is_none());
            self[parent].first_child = Some(new_child);
        }
        self[parent].last_child = Some(new_child);
    }

    /// Insert a new element before the given sibling, returning its new ID.
    pub fn insert_before_sibling(&mut self, sibling: NodeId, elem: Element)
        -> NodeId
    {
        let id = self.push_node(Node::new(NodeData::Elem(elem)));
        self.insert_before(sibling, id);
        id
    }

    /// Insert a new element at the given child position of parent, returning
    /// its new ID.
    ///
    /// An index of zero makes it the first child; an index at or past the
    /// current child count appends.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, elem: Element)
        -> NodeId
    {
        let sibling = self.children(parent).nth(index);
        if let Some(sibling) = sibling {
            self.insert_before_sibling(sibling, elem)
        } else {
            self.append_child(parent, elem)
        }
    }

    /// Insert an existing node before the given sibling.
    ///
    /// The node is unlinked from any prior position first.
    pub fn insert_before(&mut self, sibling: NodeId, new_sibling: NodeId) {
        self.unlink(new_sibling);
        let parent = self[sibling].parent
            .expect("insert_before sibling has no parent");
        self[new_sibling].parent = Some(parent);
        self[new_sibling].next_sibling = Some(sibling);
        if let Some(prev_sibling) = self[sibling].prev_sibling.take() {
            self[new_sibling].prev_sibling = Some(prev_sibling);
            debug_assert_eq!(
                self[prev_sibling].next_sibling,
                Some(sibling)
            );
            self[prev_sibling].next_sibling = Some(new_sibling);
        } else {
            debug_assert_eq!(self[parent].first_child, Some(sibling));
            self[parent].first_child = Some(new_sibling);
        }
        self[sibling].prev_sibling = Some(new_sibling);
    }

    /// Replace the specified node with its children.
    ///
    /// The children take the node's position in order; the node itself is
    /// unlinked and its `text` and `tail` go with it. Panics if called with
    /// the synthetic document node.
    pub fn fold(&mut self, id: NodeId) {
        assert!(
            id != Document::DOCUMENT_NODE_ID,
            "Can't fold the synthetic document node");

        let mut next_child = self[id].first_child;
        while let Some(child) = next_child {
            debug_assert_eq!(self[child].parent, Some(id));
            next_child = self[child].next_sibling;
            self.insert_before(id, child);
        }
        self.unlink(id);
    }

    /// Move all children of node `from` to the end of node `to`, preserving
    /// order.
    pub(crate) fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        let mut next_child = self[from].first_child;
        while let Some(child) = next_child {
            debug_assert_eq!(self[child].parent, Some(from));
            // Advance before `append` rewires the sibling links.
            next_child = self[child].next_sibling;
            self.append(to, child);
        }
    }

    /// Return an iterator over the given node's direct children.
    ///
    /// Will be empty if the node does not (or can not) have children.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut at = self[id].first_child;
        iter::from_fn(move || {
            let id = at?;
            at = self[id].next_sibling;
            Some(id)
        })
    }

    /// Return an iterator over all nodes, starting with the document node,
    /// and including all descendants in tree order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(Document::DOCUMENT_NODE_ID)
    }

    /// Return an iterator over all descendants in tree order, starting with
    /// the specified node.
    #[inline]
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_
    {
        NodeRef::new(self, id).descendants().map(|nr| nr.id())
    }

    /// Create a new `Document` from the ordered sub-tree rooted in the node
    /// referenced by ID.
    ///
    /// The clone of the referenced element keeps its `text` but has its
    /// `tail` cleared, as it no longer trails a sibling position.
    pub fn deep_clone(&self, id: NodeId) -> Document {
        let guess_cap = std::cmp::max(8, (self.len() - id.0.get() + 2) / 8);
        let mut ndoc = Document::with_capacity(guess_cap);

        if id == Document::DOCUMENT_NODE_ID {
            for child in self.children(id) {
                ndoc.append_deep_clone(Document::DOCUMENT_NODE_ID, self, child);
            }
        } else {
            ndoc.append_deep_clone(Document::DOCUMENT_NODE_ID, self, id);
            let root = ndoc.root_element().expect("cloned root");
            if let Some(elm) = ndoc[root].as_element_mut() {
                elm.tail = StrTendril::new();
            }
        }

        ndoc
    }

    /// Clone node oid in odoc and all its descendants, appending to id in
    /// self.
    pub fn append_deep_clone(
        &mut self,
        id: NodeId,
        odoc: &Document,
        oid: NodeId)
    {
        let nid = self.push_node(Node::new(odoc[oid].data.clone()));
        self.append(id, nid);
        for child in odoc.children(oid) {
            self.append_deep_clone(nid, odoc, child);
        }
    }
}

impl Default for Document {
    fn default() -> Document {
        Document::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.nodes[1..]).finish()
    }
}

impl std::ops::Index<NodeId> for Document {
    type Output = Node;

    #[inline]
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0.get() as usize]
    }
}

impl std::ops::IndexMut<NodeId> for Document {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0.get() as usize]
    }
}

impl Element {
    /// Construct a new element by tag name, with no attributes.
    ///
    /// The name is folded to lowercase.
    pub fn new<N>(name: N) -> Element
        where N: AsRef<str>
    {
        let name = name.as_ref();
        debug_assert!(!name.is_empty(), "empty element name");
        Element {
            name: lower_name(name),
            attrs: Vec::new(),
            text: StrTendril::new(),
            tail: StrTendril::new(),
        }
    }

    pub(crate) fn with_attrs(name: LocalName, attrs: Vec<Attribute>)
        -> Element
    {
        Element {
            name,
            attrs,
            text: StrTendril::new(),
            tail: StrTendril::new(),
        }
    }

    /// The lowercase tag name.
    #[inline]
    pub fn name(&self) -> &LocalName {
        &self.name
    }

    /// Return true if this element has the given tag name.
    pub fn is_elem<LN>(&self, lname: LN) -> bool
        where LN: Into<LocalName>
    {
        self.name == lname.into()
    }

    /// The ordered attribute list.
    #[inline]
    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Return attribute value by name, if present.
    ///
    /// Lookup is ASCII case-insensitive; attribute names are stored
    /// lowercase.
    pub fn attr(&self, name: &str) -> Option<&StrTendril> {
        self.attrs
            .iter()
            .find(|a| a.name.local.as_ref().eq_ignore_ascii_case(name))
            .map(|a| &a.value)
    }

    /// Set an attribute, returning the value it replaced, if any.
    ///
    /// The name is folded to lowercase. Should the attribute occur more
    /// than once (parsing cannot produce that, but manual edits can), the
    /// first occurrence is updated and the rest are dropped. A new
    /// attribute goes to the end of the list.
    pub fn set_attr<V>(&mut self, name: &str, value: V) -> Option<StrTendril>
        where V: Into<StrTendril>
    {
        let lname = lower_name(name);
        match self.attrs.iter().position(|a| a.name.local == lname) {
            Some(i) => {
                let prior = std::mem::replace(
                    &mut self.attrs[i].value,
                    value.into());
                let mut j = self.attrs.len();
                while j > i + 1 {
                    j -= 1;
                    if self.attrs[j].name.local == lname {
                        self.attrs.remove(j);
                    }
                }
                Some(prior)
            }
            None => {
                self.attrs.push(Attribute {
                    name: QualName::new(None, ns!(), lname),
                    value: value.into(),
                });
                None
            }
        }
    }

    /// Remove an attribute, returning the value it held, if any.
    ///
    /// Every occurrence of the name is dropped; the first occurrence's
    /// value is returned.
    pub fn remove_attr(&mut self, name: &str) -> Option<StrTendril> {
        let lname = lower_name(name);
        let first = self.attrs.iter().position(|a| a.name.local == lname)?;
        let value = self.attrs.remove(first).value;
        self.attrs.retain(|a| a.name.local != lname);
        Some(value)
    }

    /// The `id` attribute value, if present.
    pub fn id(&self) -> Option<&StrTendril> {
        self.attr("id")
    }

    /// The set of class names from the `class` attribute, split on ASCII
    /// whitespace.
    pub fn class_list(&self) -> BTreeSet<String> {
        let mut classes = BTreeSet::new();
        if let Some(v) = self.attr("class") {
            for c in v.as_ref().split(crate::chars::is_ascii_ws) {
                if !c.is_empty() {
                    classes.insert(c.to_owned());
                }
            }
        }
        classes
    }

    /// Replace the `class` attribute with the given class names, written
    /// space-separated in sorted order.
    pub fn set_class_list<I, S>(&mut self, classes: I)
        where I: IntoIterator<Item = S>, S: AsRef<str>
    {
        let sorted: BTreeSet<String> = classes.into_iter()
            .map(|c| c.as_ref().to_owned())
            .collect();
        let joined = sorted.into_iter().collect::<Vec<_>>().join(" ");
        self.set_attr("class", joined);
    }
}

fn lower_name(name: &str) -> LocalName {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        LocalName::from(name.to_ascii_lowercase().as_str())
    } else {
        LocalName::from(name)
    }
}

impl Node {
    fn new(data: NodeData) -> Self {
        Node {
            parent: None,
            prev_sibling: None,
            next_sibling: None,
            first_child: None,
            last_child: None,
            data,
        }
    }

    pub(crate) fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub(crate) fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }
}

impl Deref for Node {
    type Target = NodeData;

    #[inline]
    fn deref(&self) -> &NodeData {
        &self.data
    }
}

impl DerefMut for Node {
    #[inline]
    fn deref_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }
}

impl NodeData {
    /// Return `Element` if this is an element.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            NodeData::Elem(ref data) => Some(data),
            _ => None,
        }
    }

    /// Return mutable `Element` reference if this is an element.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            NodeData::Elem(ref mut data) => Some(data),
            _ => None,
        }
    }

    /// Return attribute value by name, if this is an element with that
    /// attribute present.
    pub fn attr(&self, name: &str) -> Option<&StrTendril> {
        if let Some(edata) = self.as_element() {
            edata.attr(name)
        } else {
            None
        }
    }

    /// Return true if this node is an element with the given tag name.
    pub fn is_elem<LN>(&self, lname: LN) -> bool
        where LN: Into<LocalName>
    {
        if let Some(edata) = self.as_element() {
            edata.is_elem(lname)
        } else {
            false
        }
    }
}

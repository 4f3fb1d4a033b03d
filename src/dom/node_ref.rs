//! Read-only node references and tree iteration.
//!
//! Traversal here is link-chasing over the arena: iterators walk the
//! first-child/next-sibling indexes directly and allocate nothing. Anything
//! fancier than plain tree order (classes, ids, text predicates) belongs to
//! the selector engine in [`crate::dom::query`].

use std::fmt;
use std::ops::Deref;

use crate::chars;
use crate::dom::{Document, Node, NodeId, StrTendril};

/// A read-only view of one node within a borrowed `Document`.
#[derive(Copy, Clone)]
pub struct NodeRef<'a>{
    doc: &'a Document,
    id: NodeId
}

impl<'a> NodeRef<'a> {
    /// Constructor.
    #[inline]
    pub fn new(doc: &'a Document, id: NodeId) -> Self {
        NodeRef { doc, id }
    }

    /// Return the associated `NodeId`.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Iterate the direct children, in document order.
    pub fn children(&self) -> Children<'a> {
        Children {
            doc: self.doc,
            next: self.doc[self.id].first_child,
        }
    }

    /// Iterate this node and every descendant, depth-first in document
    /// order.
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants {
            doc: self.doc,
            start: self.id,
            next: Some(self.id),
        }
    }

    /// The parent node, while this node is linked into the tree.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        Some(NodeRef::new(self.doc, self.doc[self.id].parent?))
    }

    /// The sibling before this node, if any.
    pub fn prev_sibling(&self) -> Option<NodeRef<'a>> {
        Some(NodeRef::new(self.doc, self.doc[self.id].prev_sibling?))
    }

    /// The sibling after this node, if any.
    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        Some(NodeRef::new(self.doc, self.doc[self.id].next_sibling?))
    }

    /// Iterate the text fragments of this sub-tree, in rendered order.
    ///
    /// Yields the node's own `text`, then for each child in order: the
    /// child's fragments recursively, followed by the child's `tail`. Empty
    /// fragments are skipped. The starting node's own `tail` is not
    /// included.
    pub fn texts(&self) -> TextFragments<'a> {
        TextFragments::new(*self)
    }

    /// The textual content of this sub-tree with markup removed and
    /// whitespace normalised.
    ///
    /// All text fragments are concatenated, split on ASCII whitespace and
    /// re-joined with single spaces.
    pub fn text_content(&self) -> String {
        let mut all = String::new();
        for t in self.texts() {
            all.push_str(t.as_ref());
        }
        chars::normalize_ws(&all)
    }

    /// Copy the sub-tree referenced by self into a new independent
    /// `Document`.
    pub fn deep_clone(&self) -> Document {
        self.doc.deep_clone(self.id)
    }
}

impl<'a> Deref for NodeRef<'a> {
    type Target = Node;

    #[inline]
    fn deref(&self) -> &Node {
        &self.doc[self.id]
    }
}

/// Two references are equal when they view the same node of the same
/// `Document` instance.
impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.doc, other.doc)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_element() {
            Some(elm) => write!(f, "NodeRef(<{}> {:?})", elm.name(), self.id),
            None => write!(f, "NodeRef(document {:?})", self.id),
        }
    }
}

/// A direct-children iterator returned by [`NodeRef::children`].
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.doc[id].next_sibling;
        Some(NodeRef::new(self.doc, id))
    }
}

/// A depth-first sub-tree iterator returned by [`NodeRef::descendants`].
///
/// Walks by following links instead of keeping a stack: after a node comes
/// its first child, else the next sibling of the nearest ancestor that has
/// one, never rising above the starting node.
pub struct Descendants<'a> {
    doc: &'a Document,
    start: NodeId,
    next: Option<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.step_from(id);
        Some(NodeRef::new(self.doc, id))
    }
}

impl<'a> Descendants<'a> {
    fn step_from(&self, id: NodeId) -> Option<NodeId> {
        if let Some(child) = self.doc[id].first_child {
            return Some(child);
        }
        let mut at = id;
        while at != self.start {
            if let Some(sibling) = self.doc[at].next_sibling {
                return Some(sibling);
            }
            at = self.doc[at].parent?;
        }
        None
    }
}

/// A document-order text fragment iterator returned by [`NodeRef::texts`].
pub struct TextFragments<'a> {
    doc: &'a Document,
    stack: Vec<TextStep>,
}

enum TextStep {
    Enter(NodeId),
    Tail(NodeId),
}

impl<'a> TextFragments<'a> {
    fn new(start: NodeRef<'a>) -> Self {
        TextFragments {
            doc: start.doc,
            stack: vec![TextStep::Enter(start.id)],
        }
    }
}

impl<'a> Iterator for TextFragments<'a> {
    type Item = &'a StrTendril;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(step) = self.stack.pop() {
            match step {
                TextStep::Enter(id) => {
                    // Children (with their tails) in reverse, so the stack
                    // pops them in document order.
                    let children: Vec<NodeId> =
                        self.doc.children(id).collect();
                    for &c in children.iter().rev() {
                        self.stack.push(TextStep::Tail(c));
                        self.stack.push(TextStep::Enter(c));
                    }
                    if let Some(elm) = self.doc[id].as_element() {
                        if !elm.text.is_empty() {
                            return Some(&elm.text);
                        }
                    }
                }
                TextStep::Tail(id) => {
                    if let Some(elm) = self.doc[id].as_element() {
                        if !elm.tail.is_empty() {
                            return Some(&elm.tail);
                        }
                    }
                }
            }
        }
        None
    }
}

/// `NodeRef` accessors.
impl Document {
    /// View the given node through a read-only reference.
    pub fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef::new(self, id)
    }

    /// The synthetic document node as a `NodeRef`.
    pub fn document_node_ref(&self) -> NodeRef<'_> {
        self.node_ref(Document::DOCUMENT_NODE_ID)
    }

    /// The root element as a `NodeRef`, if the document has one.
    pub fn root_element_ref(&self) -> Option<NodeRef<'_>> {
        self.root_element().map(move |id| self.node_ref(id))
    }
}

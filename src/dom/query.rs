//! A compiled CSS-subset selector engine.
//!
//! Supported: tag names, `*`, `.class`, `#id`, `:contains("…")` (quoted or
//! bare), the descendant (whitespace) combinator and the child (`>`)
//! combinator. Tag and id comparisons are ASCII case-insensitive; class
//! names and `:contains` text compare as-is. Anything else fails
//! compilation with [`Error::InvalidSelector`], before any traversal.

use std::collections::HashSet;

use crate::error::Error;
use crate::dom::{Document, NodeId, NodeRef};

/// A compiled selector, reusable across documents.
#[derive(Debug)]
pub struct Selector {
    steps: Vec<Step>,
}

#[derive(Debug)]
struct Step {
    axis: Axis,
    preds: Vec<Pred>,
}

#[derive(Copy, Clone, Debug)]
enum Axis {
    /// The context node or any descendant (the implicit first generator).
    SelfOrDescendant,
    /// Any strict descendant (after whitespace).
    Descendant,
    /// A direct child (after `>`).
    Child,
}

#[derive(Debug)]
enum Pred {
    Any,
    Tag(String),
    Class(String),
    Id(String),
    Contains(String),
}

impl Selector {
    /// Compile a selector string.
    ///
    /// Compilation is eager: a malformed selector fails here, with the byte
    /// position of the offending input. The empty selector is valid and
    /// selects nothing.
    pub fn compile(sel: &str) -> Result<Selector, Error> {
        // Trailing whitespace is insignificant; a trailing `>` is not.
        let sel = sel.trim_end_matches(crate::chars::is_ascii_ws);

        let mut steps = Vec::new();
        let mut axis = Axis::SelfOrDescendant;
        let mut preds: Vec<Pred> = Vec::new();
        let mut i = 0;

        while i < sel.len() {
            let rest = &sel[i..];
            let c = rest.chars().next().expect("in-bounds");

            if c == '*' {
                preds.push(Pred::Any);
                i += 1;
            } else if is_ident_char(c) {
                let len = ident_len(rest);
                preds.push(Pred::Tag(rest[..len].to_ascii_lowercase()));
                i += len;
            } else if c == '.' || c == '#' {
                let len = ident_len(&rest[1..]);
                if len == 0 {
                    return Err(Error::InvalidSelector { pos: i });
                }
                let name = rest[1..1 + len].to_owned();
                preds.push(if c == '.' {
                    Pred::Class(name)
                } else {
                    Pred::Id(name)
                });
                i += 1 + len;
            } else if rest.starts_with(":contains(") {
                let (text, len) = match contains_arg(rest) {
                    Some(ok) => ok,
                    None => return Err(Error::InvalidSelector { pos: i }),
                };
                preds.push(Pred::Contains(text));
                i += len;
            } else if crate::chars::is_ascii_ws(c) || c == '>' {
                if preds.is_empty() {
                    // a combinator with nothing on its left
                    return Err(Error::InvalidSelector { pos: i });
                }
                let mut child = false;
                let mut len = 0;
                for c in rest.chars() {
                    if crate::chars::is_ascii_ws(c) {
                        len += c.len_utf8();
                    } else if c == '>' && !child {
                        child = true;
                        len += 1;
                    } else {
                        break;
                    }
                }
                steps.push(Step { axis, preds: std::mem::take(&mut preds) });
                axis = if child { Axis::Child } else { Axis::Descendant };
                i += len;
            } else {
                return Err(Error::InvalidSelector { pos: i });
            }
        }

        if !preds.is_empty() {
            steps.push(Step { axis, preds });
        } else if !steps.is_empty() {
            // ended on a (child) combinator
            return Err(Error::InvalidSelector { pos: sel.len() });
        }

        Ok(Selector { steps })
    }

    /// Evaluate against the sub-tree at `ctx`, returning matches
    /// deduplicated in first-encountered order.
    pub fn select_from(&self, doc: &Document, ctx: NodeId) -> Vec<NodeId> {
        if self.steps.is_empty() {
            return Vec::new();
        }
        let mut current = vec![ctx];
        for step in &self.steps {
            let mut seen = HashSet::new();
            let mut next = Vec::new();
            for &base in &current {
                step.generate(doc, base, &mut seen, &mut next);
            }
            current = next;
        }
        current
    }
}

impl Step {
    fn generate(
        &self,
        doc: &Document,
        base: NodeId,
        seen: &mut HashSet<NodeId>,
        out: &mut Vec<NodeId>)
    {
        match self.axis {
            Axis::SelfOrDescendant => {
                for nr in doc.node_ref(base).descendants() {
                    self.keep(doc, nr.id(), seen, out);
                }
            }
            Axis::Descendant => {
                for child in doc.children(base) {
                    for nr in doc.node_ref(child).descendants() {
                        self.keep(doc, nr.id(), seen, out);
                    }
                }
            }
            Axis::Child => {
                for child in doc.children(base) {
                    self.keep(doc, child, seen, out);
                }
            }
        }
    }

    fn keep(
        &self,
        doc: &Document,
        id: NodeId,
        seen: &mut HashSet<NodeId>,
        out: &mut Vec<NodeId>)
    {
        if self.matches(doc.node_ref(id)) && seen.insert(id) {
            out.push(id);
        }
    }

    fn matches(&self, nr: NodeRef<'_>) -> bool {
        let elm = match nr.as_element() {
            Some(elm) => elm,
            None => return false,
        };
        self.preds.iter().all(|p| match p {
            Pred::Any => true,
            Pred::Tag(tag) => elm.name().as_ref() == tag.as_str(),
            Pred::Class(class) => {
                match elm.attr("class") {
                    Some(v) => v.as_ref()
                        .split(crate::chars::is_ascii_ws)
                        .any(|c| c == class),
                    None => false,
                }
            }
            Pred::Id(id) => {
                match elm.id() {
                    Some(v) => v.as_ref().eq_ignore_ascii_case(id),
                    None => false,
                }
            }
            Pred::Contains(text) => nr.text_content().contains(text.as_str()),
        })
    }
}

/// Parse the argument of `:contains(…)`, returning the text and total
/// consumed length including the closing parenthesis.
fn contains_arg(rest: &str) -> Option<(String, usize)> {
    let open = ":contains(".len();
    let arg = &rest[open..];
    if let Some(quoted) = arg.strip_prefix('"') {
        let end = quoted.find('"')?;
        if end == 0 || !quoted[end + 1..].starts_with(')') {
            return None;
        }
        Some((quoted[..end].to_owned(), open + 1 + end + 2))
    } else {
        let end = arg.find(')')?;
        if end == 0 || arg[..end].contains('"') {
            return None;
        }
        Some((arg[..end].to_owned(), open + end + 1))
    }
}

#[inline]
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn ident_len(s: &str) -> usize {
    s.find(|c| !is_ident_char(c)).unwrap_or_else(|| s.len())
}

/// Selector convenience methods.
impl Document {
    /// Return all elements under `ctx` (inclusive) matching the selector,
    /// in document order.
    pub fn query_selector_all(&self, ctx: NodeId, sel: &str)
        -> Result<Vec<NodeId>, Error>
    {
        Ok(Selector::compile(sel)?.select_from(self, ctx))
    }

    /// Return the first element under `ctx` (inclusive) matching the
    /// selector, if any.
    pub fn query_selector(&self, ctx: NodeId, sel: &str)
        -> Result<Option<NodeId>, Error>
    {
        Ok(self.query_selector_all(ctx, sel)?.into_iter().next())
    }
}

//! Static tag classification tables for the tree builder and serializer.

use std::collections::HashSet;

use html5ever::tokenizer::states::RawKind;
use lazy_static::lazy_static;

use crate::dom::LocalName;

lazy_static! {
    /// Scope boundaries for generic existence checks on the open stack.
    pub(crate) static ref DEFAULT_SCOPE: HashSet<LocalName> = [
        local_name!("applet"), local_name!("caption"), local_name!("table"),
        local_name!("marquee"), local_name!("object"), local_name!("template"),
    ].iter().cloned().collect();

    /// Default scope plus list containers; bounds list-item end tags.
    pub(crate) static ref LIST_SCOPE: HashSet<LocalName> = DEFAULT_SCOPE
        .iter().cloned()
        .chain(vec![local_name!("ol"), local_name!("ul")])
        .collect();

    /// Default scope plus every block-level container; bounds `<p>` checks.
    pub(crate) static ref BLOCK_SCOPE: HashSet<LocalName> = DEFAULT_SCOPE
        .iter().cloned()
        .chain(vec![local_name!("button")])
        .chain(P_CLOSERS.iter().cloned())
        .collect();

    /// Scope boundaries for re-opened table parts.
    pub(crate) static ref TABLE_SCOPE: HashSet<LocalName> = [
        local_name!("html"), local_name!("table"), local_name!("template"),
    ].iter().cloned().collect();

    /// Containers within which `dd`/`dt`/`li` start tags close a same-named
    /// open element.
    pub(crate) static ref LIST_CONTAINERS: HashSet<LocalName> = [
        local_name!("dl"), local_name!("ol"), local_name!("ul"),
    ].iter().cloned().collect();

    /// Container within which `optgroup`/`option` start tags close a
    /// same-named open element.
    pub(crate) static ref SELECT_CONTAINER: HashSet<LocalName> = [
        local_name!("select"),
    ].iter().cloned().collect();

    /// Start tags that first close any `<p>` open in block scope.
    pub(crate) static ref P_CLOSERS: HashSet<LocalName> = [
        local_name!("address"), local_name!("article"), local_name!("aside"),
        local_name!("blockquote"), local_name!("center"),
        local_name!("details"), local_name!("dialog"), local_name!("dir"),
        local_name!("div"), local_name!("dl"), local_name!("fieldset"),
        local_name!("figcaption"), local_name!("figure"),
        local_name!("footer"), local_name!("header"), local_name!("hgroup"),
        local_name!("main"), local_name!("menu"), local_name!("nav"),
        local_name!("ol"), local_name!("p"), local_name!("section"),
        local_name!("summary"), local_name!("ul"),
        local_name!("h1"), local_name!("h2"), local_name!("h3"),
        local_name!("h4"), local_name!("h5"), local_name!("h6"),
        local_name!("pre"), local_name!("listing"), local_name!("form"),
    ].iter().cloned().collect();

    /// Table parts that implicitly close a same-named open element.
    pub(crate) static ref TABLE_PARTS: HashSet<LocalName> = [
        local_name!("caption"), local_name!("colgroup"),
        local_name!("tbody"), local_name!("td"), local_name!("tfoot"),
        local_name!("th"), local_name!("thead"), local_name!("tr"),
    ].iter().cloned().collect();

    /// Inline formatting tags, subject to the active-formatting list and
    /// misnesting recovery.
    pub(crate) static ref FORMATTING: HashSet<LocalName> = [
        local_name!("b"), local_name!("big"), local_name!("code"),
        local_name!("em"), local_name!("font"), local_name!("i"),
        local_name!("s"), local_name!("small"), local_name!("strike"),
        local_name!("strong"), local_name!("tt"), local_name!("u"),
        local_name!("a"),
    ].iter().cloned().collect();

    /// Void elements: no end tag, no children; closed on open.
    pub(crate) static ref VOID: HashSet<LocalName> = [
        local_name!("area"), local_name!("br"), local_name!("embed"),
        local_name!("img"), local_name!("keygen"), local_name!("wbr"),
        local_name!("input"), local_name!("param"), local_name!("source"),
        local_name!("track"), local_name!("hr"), local_name!("image"),
        local_name!("base"), local_name!("basefont"),
        local_name!("bgsound"), local_name!("link"), local_name!("meta"),
        local_name!("col"), local_name!("frame"), local_name!("menuitem"),
    ].iter().cloned().collect();
}

/// Tokenizer state for elements whose content is character data, per the
/// tokenizer contract.
pub(crate) fn raw_kind(name: &LocalName) -> Option<RawKind> {
    if *name == local_name!("script") || *name == local_name!("style")
        || *name == local_name!("xmp") || *name == local_name!("iframe")
        || *name == local_name!("noembed") || *name == local_name!("noframes")
    {
        Some(RawKind::Rawtext)
    } else if *name == local_name!("title") || *name == local_name!("textarea")
    {
        Some(RawKind::Rcdata)
    } else {
        None
    }
}

//! Minimal, permissive HTML browsing: fetch pages through a pluggable HTTP
//! transport, decode them under WHATWG-inspired encoding sniffing, parse
//! them into a mutable element tree tolerant of malformed markup, then
//! query, fill forms and follow links — no headless browser required.
//!
//! The parser is roughly inspired by the WHATWG HTML5 tree construction
//! rules, but following them to the letter is an explicit non-goal. The
//! tree stays close to the structure of the input: a page without `<head>`
//! or `<body>` produces a tree without them, and content hangs directly off
//! the `<html>` root.

#![warn(rust_2018_idioms)]

#[macro_use] extern crate html5ever;

mod chars;

pub mod decode;

mod dom;
pub use dom::{
    html, query,
    Children, Descendants, Document, Element, Node, NodeData, NodeId,
    NodeRef, Selector, TextFragments,
    Attribute, LocalName, QualName, StrTendril,
};

mod error;
pub use error::Error;

mod forms;

mod client;
pub use client::{
    refresh_target, Headers, HttpClient, Page, Response, TransportError,
};

#[cfg(test)]
mod logger;

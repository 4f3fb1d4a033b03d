//! Charset detection and byte decoding.
//!
//! Detection follows what browsers do in practice while remaining
//! deterministic and cheap: an external hint (e.g. an HTTP `Content-Type`
//! charset) wins, then a leading Byte-Order-Mark, then the first usable
//! `<meta>` declaration, then the `windows-1252` legacy default. Labels
//! resolve through the WHATWG registry (`encoding_rs`), which already folds
//! `iso-8859-1` and `us-ascii` into `windows-1252`.

use std::borrow::Cow;

use encoding_rs as enc;

use html5ever::buffer_queue::BufferQueue;
use html5ever::tokenizer::{
    Tag, TagKind, Token, TokenSink, TokenSinkResult,
    Tokenizer, TokenizerOpts,
};
use log::debug;
use tendril::StrTendril;

/// Determine the encoding for the given document bytes.
///
/// `hint` is charset information obtained via external means, e.g. the HTTP
/// `Content-Type` header. It overrides any BOM or `<meta>` declaration, but
/// an unrecognized hint label still falls back to `windows-1252` rather than
/// to in-document sniffing. Never fails.
pub fn detect(bytes: &[u8], hint: Option<&str>) -> &'static enc::Encoding {
    if let Some(label) = hint {
        return enc::Encoding::for_label(label.trim().as_bytes())
            .unwrap_or(enc::WINDOWS_1252);
    }

    if let Some((encoding, _len)) = enc::Encoding::for_bom(bytes) {
        return encoding;
    }

    if let Some(encoding) = scan_meta(bytes) {
        return encoding;
    }

    enc::WINDOWS_1252
}

/// Decode bytes with the given encoding, replacing ill-formed sequences
/// with U+FFFD.
///
/// If the decoded stream begins with U+FEFF, that single code point is
/// stripped. Never fails.
pub fn decode(bytes: &[u8], encoding: &'static enc::Encoding) -> String {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        debug!("decode ({}): ill-formed sequences replaced", encoding.name());
    }
    match text {
        Cow::Borrowed(s) => {
            if s.starts_with('\u{FEFF}') {
                s['\u{FEFF}'.len_utf8()..].to_owned()
            } else {
                s.to_owned()
            }
        }
        Cow::Owned(mut s) => {
            if s.starts_with('\u{FEFF}') {
                s.drain(..'\u{FEFF}'.len_utf8());
            }
            s
        }
    }
}

/// Walk start tags of the ASCII-projected bytes for the first `<meta>`
/// charset declaration that resolves in the registry.
fn scan_meta(bytes: &[u8]) -> Option<&'static enc::Encoding> {
    let mut input = BufferQueue::new();
    input.push_back(ascii_project(bytes));
    let mut tok = Tokenizer::new(MetaScan::default(), TokenizerOpts::default());
    let _ = tok.feed(&mut input);
    tok.end();
    tok.sink.found
}

/// Project bytes to characters as ASCII, replacing high bytes with U+FFFD.
///
/// Charset labels are ASCII; anything else only has to survive
/// tokenization.
fn ascii_project(bytes: &[u8]) -> StrTendril {
    if bytes.is_ascii() {
        StrTendril::from_slice(
            std::str::from_utf8(bytes).expect("ASCII is UTF-8"))
    } else {
        let mut t = StrTendril::with_capacity(bytes.len() as u32);
        for &b in bytes {
            t.push_char(if b < 0x80 { b as char } else { '\u{FFFD}' });
        }
        t
    }
}

/// A `TokenSink` that does nothing but watch for `<meta charset=…>` and
/// `<meta http-equiv="content-type" content="…charset=…">` start tags.
#[derive(Default)]
struct MetaScan {
    found: Option<&'static enc::Encoding>,
}

impl TokenSink for MetaScan {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line: u64)
        -> TokenSinkResult<()>
    {
        if self.found.is_none() {
            if let Token::TagToken(ref tag) = token {
                if tag.kind == TagKind::StartTag
                    && tag.name == local_name!("meta")
                {
                    self.found = meta_charset(tag);
                }
            }
        }
        TokenSinkResult::Continue
    }
}

/// Extract a usable encoding from one `<meta>` start tag, if any.
fn meta_charset(tag: &Tag) -> Option<&'static enc::Encoding> {
    let attr = |name: &str| {
        tag.attrs.iter()
            .find(|a| a.name.local.as_ref() == name)
            .map(|a| a.value.as_ref())
    };

    let label: Cow<'_, str> = if let Some(cs) = attr("charset") {
        Cow::Borrowed(cs)
    } else {
        let equiv = attr("http-equiv")?;
        if !equiv.trim().eq_ignore_ascii_case("content-type") {
            return None;
        }
        let content = attr("content")?.to_ascii_lowercase();
        let pos = content.rfind("charset=")?;
        Cow::Owned(content[pos + "charset=".len()..].trim().to_owned())
    };

    match enc::Encoding::for_label(label.trim().as_bytes()) {
        // An ASCII-compatible read got us this far, so a UTF-16 claim is
        // taken as utf-8, matching browsers.
        Some(e) if e == enc::UTF_16LE || e == enc::UTF_16BE => {
            Some(enc::UTF_8)
        }
        Some(e) => Some(e),
        None => {
            debug!("meta charset label {:?} not recognized", label);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_from_meta() {
        assert_eq!(enc::UTF_8, detect(b"<meta charset=\"utf8\">", None));
        assert_eq!(
            enc::MACINTOSH,
            detect(b"<meta charset=mac>", None)
        );
        assert_eq!(
            enc::WINDOWS_1252,
            detect(b"<meta charset=\"trololo\">", None),
            "unknown label falls through to the default"
        );
    }

    #[test]
    fn detect_meta_anywhere() {
        assert_eq!(
            enc::KOI8_R,
            detect(b"<html><head><meta charset=koi8-r></head></html>", None)
        );
    }

    #[test]
    fn detect_first_usable_meta_wins() {
        assert_eq!(
            enc::KOI8_U,
            detect(
                b"<meta charset=bogus><meta charset=koi8-u>\
                  <meta charset=utf-8>",
                None)
        );
    }

    #[test]
    fn detect_from_http_equiv() {
        assert_eq!(
            enc::MACINTOSH,
            detect(
                b"<meta http-equiv=\"Content-Type\" \
                  content=\"text/html; charset=macintosh\">",
                None)
        );
        assert_eq!(
            enc::WINDOWS_1252,
            detect(
                b"<meta http-equiv=\"refresh\" content=\"1; url=x\">",
                None),
            "http-equiv other than content-type is no hint"
        );
    }

    #[test]
    fn detect_meta_utf16_is_utf8() {
        assert_eq!(enc::UTF_8, detect(b"<meta charset=utf-16>", None));
        assert_eq!(enc::UTF_8, detect(b"<meta charset=utf-16be>", None));
    }

    #[test]
    fn detect_bom() {
        assert_eq!(enc::UTF_8, detect(b"\xEF\xBB\xBFhello", None));
        assert_eq!(enc::UTF_16BE, detect(b"\xFE\xFF\x00h", None));
        assert_eq!(enc::UTF_16LE, detect(b"\xFF\xFEh\x00", None));
        assert_eq!(
            enc::UTF_8,
            detect(b"\xEF\xBB\xBF<meta charset=\"ascii\">", None),
            "BOM overrides any meta"
        );
    }

    #[test]
    fn detect_hint_precedence() {
        assert_eq!(
            enc::KOI8_R,
            detect(b"<meta charset=utf-8>", Some("KOI8-R"))
        );
        assert_eq!(
            enc::WINDOWS_1252,
            detect(b"<meta charset=utf-8>", Some("not-a-charset")),
            "a bad external hint does not fall through to sniffing"
        );
        assert_eq!(
            enc::UTF_8,
            detect(b"\xFF\xFEh\x00", Some("utf-8")),
            "hint overrides BOM"
        );
    }

    #[test]
    fn detect_legacy_aliases() {
        assert_eq!(enc::WINDOWS_1252, detect(b"", Some("iso-8859-1")));
        assert_eq!(enc::WINDOWS_1252, detect(b"", Some("US-ASCII")));
        assert_eq!(enc::WINDOWS_1252, detect(b"", Some("latin1")));
        assert_eq!(
            enc::WINDOWS_1252,
            detect(b"<meta charset=iso-8859-1>", None)
        );
    }

    #[test]
    fn detect_default() {
        assert_eq!(enc::WINDOWS_1252, detect(b"<p>hello</p>", None));
        assert_eq!(enc::WINDOWS_1252, detect(b"", None));
    }

    #[test]
    fn decode_replacement() {
        assert_eq!("xy\u{FFFD}z", decode(b"xy\xC0z", enc::UTF_8));
        assert_eq!("ä", decode(b"\xE4", enc::WINDOWS_1252));
    }

    #[test]
    fn decode_bom_strip() {
        assert_eq!("hi", decode(b"\xEF\xBB\xBFhi", enc::UTF_8));
        assert_eq!("hi", decode(b"\xFF\xFEh\x00i\x00", enc::UTF_16LE));
        assert_eq!(
            "ï»¿hi", decode(b"\xEF\xBB\xBFhi", enc::WINDOWS_1252),
            "a UTF-8 BOM under a single-byte encoding is just characters"
        );
        assert_eq!(
            "x\u{FEFF}y", decode(b"x\xEF\xBB\xBFy", enc::UTF_8),
            "only a leading U+FEFF is stripped"
        );
    }
}

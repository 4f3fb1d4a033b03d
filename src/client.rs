//! Fetched pages and the HTTP collaborator contract.
//!
//! The transport behind [`HttpClient`] owns everything network-shaped:
//! cookies, standard 3xx redirects, the `Refresh` header and
//! `<meta http-equiv=refresh>` policies, timeouts and cancellation. This
//! module consumes its completed responses: it detects the charset, decodes
//! and parses the body, computes the base URI, and drives link following
//! and form submission back through the collaborator.

use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

use encoding_rs as enc;
use lazy_static::lazy_static;
use log::debug;
use mime::Mime;
use regex::Regex;
use url::Url;

use crate::decode;
use crate::dom::{html, Document, NodeId};
use crate::error::Error;
use crate::forms;

/// The contract for the external HTTP transport.
///
/// `open` performs one logical navigation to an absolute URL, following any
/// redirect policy internally, and returns the final completed response.
/// Implementations typically use interior mutability for their cookie
/// state.
pub trait HttpClient {
    fn open(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Option<&[u8]>)
        -> Result<Response, TransportError>;
}

/// A completed HTTP response, as the collaborator returns it.
#[derive(Debug)]
pub struct Response {
    /// The final URL, after any transport-level redirects.
    pub url: String,
    /// The integer status of the final response.
    pub status: u16,
    /// The response headers.
    pub headers: Headers,
    /// The complete body bytes.
    pub body: Vec<u8>,
}

/// Failure of the HTTP collaborator.
#[derive(Debug)]
pub enum TransportError {
    /// The redirect limit was exceeded; carries the last hop's response.
    TooManyRedirects(Box<Response>),
    /// Any other transport failure.
    Other(Box<dyn StdError + Send + Sync + 'static>),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::TooManyRedirects(r) => {
                write!(f, "too many redirects (last: {})", r.url)
            }
            TransportError::Other(e) => e.fmt(f),
        }
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TransportError::Other(e) => Some(&**e),
            _ => None,
        }
    }
}

/// An ordered, case-insensitive header multi-map.
#[derive(Clone, Debug, Default)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Headers {
        Headers(Vec::new())
    }

    /// Append a header. Existing same-named headers are kept.
    pub fn append<K, V>(&mut self, name: K, value: V)
        where K: Into<String>, V: Into<String>
    {
        self.0.push((name.into(), value.into()));
    }

    /// The first value for the given name, compared ASCII
    /// case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for the given name, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str)
        -> impl Iterator<Item = &'a str> + 'a
    {
        self.0.iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All (name, value) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A retrieved and parsed HTML page.
///
/// Bundles the raw response, the detected charset, the element tree, and
/// the collaborator handle through which further navigation flows.
pub struct Page {
    client: Rc<dyn HttpClient>,
    url: Url,
    status: u16,
    headers: Headers,
    body: Vec<u8>,
    charset: &'static enc::Encoding,
    doc: Document,
    root: NodeId,
}

impl Page {
    /// Fetch an absolute URL and return the parsed page.
    ///
    /// The entry point for a fresh navigation with no referring page. A
    /// non-2xx final status yields [`Error::Http`] with the parsed page
    /// attached.
    pub fn fetch(client: Rc<dyn HttpClient>, url: &str)
        -> Result<Page, Error>
    {
        let url = Url::parse(url)?;
        Page::request(client, &url, Vec::new(), None)
    }

    /// Open a URL as if linked from this page.
    ///
    /// Relative URLs resolve against the base URI, and a `Referer` header
    /// carrying this page's URL (fragment stripped) is supplied.
    pub fn open(&self, url: &str) -> Result<Page, Error> {
        let target = self.base_uri().join(url)?;
        Page::request(self.client.clone(), &target, self.referer(), None)
    }

    /// Follow the given anchor element's `href`, as a click would.
    ///
    /// A missing `href` attribute reloads the base URI.
    pub fn follow(&self, anchor: NodeId) -> Result<Page, Error> {
        debug_assert!(self.doc[anchor].is_elem(local_name!("a")));
        let href = match self.doc[anchor].attr("href") {
            Some(href) => href.to_string(),
            None => String::new(),
        };
        self.open(&href)
    }

    /// Submit the given form element, returning the next page.
    ///
    /// Form data is collected per [`Document::form_data`], encoded under
    /// the form's accept charset, and sent as a query string (`GET`,
    /// replacing any existing query) or an urlencoded body (`POST`).
    pub fn submit(&self, form: NodeId) -> Result<Page, Error> {
        debug_assert!(self.doc[form].is_elem(local_name!("form")));
        let data = self.doc.form_data(form);
        let encoded = forms::urlencoded(&data, self.form_accept_charset(form));
        let mut target = self.form_action(form)?;

        if self.doc.form_method(form) == "POST" {
            let mut headers = self.referer();
            headers.push((
                "Content-Type".to_owned(),
                self.form_enctype(form).to_string(),
            ));
            Page::request(
                self.client.clone(), &target, headers,
                Some(encoded.into_bytes()))
        } else {
            target.set_query(Some(&encoded));
            Page::request(self.client.clone(), &target, self.referer(), None)
        }
    }

    /// The form's resolved action URL: the page URL when the `action`
    /// attribute is empty or missing, else the attribute joined against the
    /// base URI.
    pub fn form_action(&self, form: NodeId) -> Result<Url, Error> {
        match self.doc[form].attr("action") {
            Some(action) if !action.is_empty() => {
                Ok(self.base_uri().join(action)?)
            }
            _ => Ok(self.url.clone()),
        }
    }

    /// The MIME type for submitted form data.
    ///
    /// Always `application/x-www-form-urlencoded`, the only supported
    /// format.
    pub fn form_enctype(&self, _form: NodeId) -> Mime {
        mime::APPLICATION_WWW_FORM_URLENCODED
    }

    /// The encoding used to submit the form's data: the `accept-charset`
    /// attribute if it resolves in the registry, else the page charset.
    pub fn form_accept_charset(&self, form: NodeId)
        -> &'static enc::Encoding
    {
        self.doc[form].attr("accept-charset")
            .and_then(|a| enc::Encoding::for_label(a.trim().as_bytes()))
            .unwrap_or(self.charset)
    }

    /// All `<form>` elements, in document order.
    pub fn forms(&self) -> Vec<NodeId> {
        self.elements_named(local_name!("form"))
    }

    /// All `<a>` elements, in document order.
    pub fn links(&self) -> Vec<NodeId> {
        self.elements_named(local_name!("a"))
    }

    /// First element matching the selector, or `None`.
    pub fn query_selector(&self, sel: &str) -> Result<Option<NodeId>, Error> {
        self.doc.query_selector(self.root, sel)
    }

    /// All elements matching the selector, in document order.
    pub fn query_selector_all(&self, sel: &str)
        -> Result<Vec<NodeId>, Error>
    {
        self.doc.query_selector_all(self.root, sel)
    }

    /// The page URL (the final URL of the response).
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The HTTP status received for this page.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The HTTP headers received with this page.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The raw response body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The encoding used to decode the page.
    pub fn charset(&self) -> &'static enc::Encoding {
        self.charset
    }

    /// The parsed document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The parsed document, for mutation.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// The `<html>` root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The base URI which relative URLs resolve against: the first
    /// `<base href>` resolved against the page URL if present, else the
    /// page URL; fragment stripped.
    ///
    /// Recomputed from the tree, so mutating the `<base>` element changes
    /// it.
    pub fn base_uri(&self) -> Url {
        let mut base = self.url.clone();
        let href = self.doc.node_ref(self.root).descendants()
            .find(|n| {
                n.is_elem(local_name!("base")) && n.attr("href").is_some()
            })
            .and_then(|n| n.attr("href").map(|v| v.to_string()));
        if let Some(href) = href {
            match self.url.join(href.trim()) {
                Ok(joined) => base = joined,
                Err(e) => debug!("unusable <base href>: {}", e),
            }
        }
        base.set_fragment(None);
        base
    }

    fn referer(&self) -> Vec<(String, String)> {
        let mut referer = self.url.clone();
        referer.set_fragment(None);
        vec![("Referer".to_owned(), referer.as_str().to_owned())]
    }

    fn elements_named(&self, name: crate::dom::LocalName) -> Vec<NodeId> {
        self.doc.node_ref(self.root).descendants()
            .filter(move |n| n.is_elem(name.clone()))
            .map(|n| n.id())
            .collect()
    }

    /// Perform one collaborator round trip and parse the outcome.
    fn request(
        client: Rc<dyn HttpClient>,
        url: &Url,
        headers: Vec<(String, String)>,
        body: Option<Vec<u8>>)
        -> Result<Page, Error>
    {
        match client.open(url.as_str(), &headers, body.as_deref()) {
            Ok(response) => {
                let page = Page::build(client, response)?;
                if page.status / 100 == 2 {
                    Ok(page)
                } else {
                    let status = page.status;
                    Err(Error::Http { status, page: Box::new(page) })
                }
            }
            Err(TransportError::TooManyRedirects(response)) => {
                let page = Page::build(client, *response)?;
                Err(Error::TooManyRedirects { page: Box::new(page) })
            }
            Err(TransportError::Other(e)) => Err(Error::Transport(e)),
        }
    }

    /// Decode and parse a response into a page, regardless of status.
    fn build(client: Rc<dyn HttpClient>, response: Response)
        -> Result<Page, Error>
    {
        let Response { url, status, headers, body } = response;
        let url = Url::parse(&url)?;

        let hint = headers.get("Content-Type")
            .and_then(|v| v.parse::<Mime>().ok())
            .and_then(|m| {
                m.get_param(mime::CHARSET).map(|cs| cs.as_str().to_owned())
            });

        let charset = decode::detect(&body, hint.as_deref());
        let doc = html::parse_str(&decode::decode(&body, charset));
        let root = doc.root_element().expect("a parsed page has a root");

        debug!("built page {} (HTTP/{}, {})", url, status, charset.name());

        Ok(Page { client, url, status, headers, body, charset, doc, root })
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("url", &self.url.as_str())
            .field("status", &self.status)
            .field("charset", &self.charset.name())
            .field("nodes", &self.doc.len())
            .finish()
    }
}

lazy_static! {
    static ref REFRESH: Regex = Regex::new(
        r"(?i)^\s*\d+\s*;\s*url\s*=\s*(.+)$"
    ).expect("static pattern compiles");
}

/// Parse the target out of a `Refresh` header (or equivalent `<meta>`
/// `content`) value.
///
/// Only the strict `delay; url=target` form is accepted, case-insensitive
/// and whitespace-tolerant; anything malformed is ignored. Shared here for
/// `HttpClient` implementations, whose redirect policy owns `Refresh`
/// handling.
pub fn refresh_target(value: &str) -> Option<&str> {
    REFRESH.captures(value)
        .map(|c| c.get(1).expect("mandatory group").as_str().trim())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;
    use crate::error::Error;
    use crate::logger::ensure_logger;

    #[derive(Clone)]
    struct Scripted {
        status: u16,
        content_type: &'static str,
        body: Vec<u8>,
        redirect_limit: bool,
    }

    /// A scripted collaborator: one canned response per absolute URL, and a
    /// log of every request made through it.
    #[derive(Default)]
    struct FixtureClient {
        responses: RefCell<HashMap<String, Scripted>>,
        requests: RefCell<Vec<(String, Vec<(String, String)>, Option<Vec<u8>>)>>,
    }

    impl FixtureClient {
        fn new() -> Rc<FixtureClient> {
            Rc::new(FixtureClient::default())
        }

        fn serve(&self, url: &str, status: u16, body: &str) {
            self.responses.borrow_mut().insert(url.to_owned(), Scripted {
                status,
                content_type: "text/html; charset=utf-8",
                body: body.as_bytes().to_vec(),
                redirect_limit: false,
            });
        }

        fn serve_bytes(
            &self, url: &str, content_type: &'static str, body: &[u8])
        {
            self.responses.borrow_mut().insert(url.to_owned(), Scripted {
                status: 200,
                content_type,
                body: body.to_vec(),
                redirect_limit: false,
            });
        }

        fn serve_redirect_limit(&self, url: &str, body: &str) {
            self.responses.borrow_mut().insert(url.to_owned(), Scripted {
                status: 302,
                content_type: "text/html; charset=utf-8",
                body: body.as_bytes().to_vec(),
                redirect_limit: true,
            });
        }

        fn requested(&self, n: usize)
            -> (String, Vec<(String, String)>, Option<Vec<u8>>)
        {
            self.requests.borrow()[n].clone()
        }
    }

    impl HttpClient for FixtureClient {
        fn open(
            &self,
            url: &str,
            headers: &[(String, String)],
            body: Option<&[u8]>)
            -> Result<Response, TransportError>
        {
            self.requests.borrow_mut().push(
                (url.to_owned(), headers.to_vec(), body.map(|b| b.to_vec())));
            let scripted = self.responses.borrow().get(url)
                .unwrap_or_else(|| panic!("no fixture for {}", url))
                .clone();
            let mut h = Headers::new();
            h.append("Content-Type", scripted.content_type);
            let response = Response {
                url: url.to_owned(),
                status: scripted.status,
                headers: h,
                body: scripted.body,
            };
            if scripted.redirect_limit {
                Err(TransportError::TooManyRedirects(Box::new(response)))
            } else {
                Ok(response)
            }
        }
    }

    #[test]
    fn fetch_parses_with_header_charset() {
        ensure_logger();
        let client = FixtureClient::new();
        client.serve_bytes(
            "http://x.test/",
            "text/html; charset=KOI8-R",
            b"<p>\xF0\xD2\xC9\xD7\xC5\xD4</p>");
        let page = Page::fetch(client.clone(), "http://x.test/").unwrap();

        assert_eq!(200, page.status());
        assert_eq!("http://x.test/", page.url().as_str());
        assert_eq!("KOI8-R", page.charset().name());
        let p = page.query_selector("p").unwrap().unwrap();
        assert_eq!(
            "\u{41f}\u{440}\u{438}\u{432}\u{435}\u{442}",
            page.document().node_ref(p).text_content());
        assert_eq!(
            Some("text/html; charset=KOI8-R"),
            page.headers().get("content-type"));
    }

    #[test]
    fn fetch_http_error_attaches_page() {
        ensure_logger();
        let client = FixtureClient::new();
        client.serve("http://x.test/missing", 404, "<p>gone</p>");
        match Page::fetch(client, "http://x.test/missing") {
            Err(Error::Http { status, page }) => {
                assert_eq!(404, status);
                let p = page.query_selector("p").unwrap().unwrap();
                assert_eq!(
                    "gone", page.document().node_ref(p).text_content());
            }
            other => panic!("expected Http error, got {:?}",
                other.map(|_| ())),
        }
    }

    #[test]
    fn redirect_exhaustion_attaches_page() {
        ensure_logger();
        let client = FixtureClient::new();
        client.serve_redirect_limit("http://x.test/loop", "<p>last hop</p>");
        match Page::fetch(client, "http://x.test/loop") {
            Err(Error::TooManyRedirects { page }) => {
                assert_eq!("http://x.test/loop", page.url().as_str());
                let p = page.query_selector("p").unwrap().unwrap();
                assert_eq!(
                    "last hop", page.document().node_ref(p).text_content());
            }
            other => panic!("expected TooManyRedirects, got {:?}",
                other.map(|_| ())),
        }
    }

    #[test]
    fn open_resolves_and_sends_referer() {
        ensure_logger();
        let client = FixtureClient::new();
        client.serve(
            "http://x.test/a/b#frag", 200,
            "<base href=\"/sub/\"><p>origin</p>");
        client.serve("http://x.test/sub/next", 200, "<p>there</p>");

        let page = Page::fetch(client.clone(), "http://x.test/a/b#frag")
            .unwrap();
        assert_eq!("http://x.test/sub/", page.base_uri().as_str());

        let next = page.open("next").unwrap();
        assert_eq!("http://x.test/sub/next", next.url().as_str());

        let (url, headers, body) = client.requested(1);
        assert_eq!("http://x.test/sub/next", url);
        assert!(body.is_none());
        assert!(headers.contains(
            &("Referer".to_owned(), "http://x.test/a/b".to_owned())),
            "fragment-stripped referer in {:?}", headers);
    }

    #[test]
    fn base_uri_defaults_to_page_url() {
        ensure_logger();
        let client = FixtureClient::new();
        client.serve("http://x.test/dir/page#top", 200, "<p>x</p>");
        let page = Page::fetch(client, "http://x.test/dir/page#top").unwrap();
        assert_eq!("http://x.test/dir/page", page.base_uri().as_str());
    }

    #[test]
    fn follow_anchor() {
        ensure_logger();
        let client = FixtureClient::new();
        client.serve(
            "http://x.test/", 200,
            "<p><a href=\"two\">go</a></p>");
        client.serve("http://x.test/two", 200, "<p>two</p>");

        let page = Page::fetch(client.clone(), "http://x.test/").unwrap();
        let links = page.links();
        assert_eq!(1, links.len());
        let next = page.follow(links[0]).unwrap();
        assert_eq!("http://x.test/two", next.url().as_str());
    }

    #[test]
    fn submit_get_replaces_query() {
        ensure_logger();
        let client = FixtureClient::new();
        client.serve(
            "http://x.test/page", 200,
            "<form action=\"/search?old=1\">\
             <input name=q value=\"a b\">\
             </form>");
        client.serve("http://x.test/search?q=a+b", 200, "<p>found</p>");

        let page = Page::fetch(client.clone(), "http://x.test/page").unwrap();
        let form = page.forms()[0];
        assert_eq!("GET", page.document().form_method(form));

        let result = page.submit(form).unwrap();
        assert_eq!("http://x.test/search?q=a+b", result.url().as_str());
        let (_, _, body) = client.requested(1);
        assert!(body.is_none());
    }

    #[test]
    fn submit_post_sends_urlencoded_body() {
        ensure_logger();
        let client = FixtureClient::new();
        client.serve(
            "http://x.test/page", 200,
            "<form method=post accept-charset=UTF-8>\
             <input name=q value=\"a b\">\
             <input type=checkbox name=c checked>\
             </form>");

        let page = Page::fetch(client.clone(), "http://x.test/page").unwrap();
        let form = page.forms()[0];

        // empty action submits back to the page URL
        assert_eq!(
            "http://x.test/page",
            page.form_action(form).unwrap().as_str());

        page.submit(form).unwrap();
        let (url, headers, body) = client.requested(1);
        assert_eq!("http://x.test/page", url);
        assert_eq!(Some(b"q=a+b&c=on".to_vec()), body);
        assert!(headers.contains(&(
            "Content-Type".to_owned(),
            "application/x-www-form-urlencoded".to_owned())),
            "content type in {:?}", headers);
        assert!(headers.iter().any(|(k, _)| k == "Referer"));
    }

    #[test]
    fn form_accept_charset_fallback() {
        ensure_logger();
        let client = FixtureClient::new();
        client.serve_bytes(
            "http://x.test/",
            "text/html; charset=KOI8-R",
            b"<form accept-charset=latin1><input name=a></form>\
              <form accept-charset=bogus><input name=a></form>\
              <form><input name=a></form>");
        let page = Page::fetch(client, "http://x.test/").unwrap();
        let forms = page.forms();
        assert_eq!(3, forms.len());
        assert_eq!(
            "windows-1252",
            page.form_accept_charset(forms[0]).name());
        assert_eq!("KOI8-R", page.form_accept_charset(forms[1]).name());
        assert_eq!("KOI8-R", page.form_accept_charset(forms[2]).name());
    }

    #[test]
    fn refresh_target_parsing() {
        ensure_logger();
        assert_eq!(Some("/new"), refresh_target(" 0; url=/new "));
        assert_eq!(Some("http://e.test/"),
            refresh_target("5;URL=http://e.test/"));
        assert_eq!(Some("x"), refresh_target("0 ; Url = x"));

        assert_eq!(None, refresh_target(""));
        assert_eq!(None, refresh_target("5"));
        assert_eq!(None, refresh_target("five; url=x"));
        assert_eq!(None, refresh_target("5; uri=x"));
        assert_eq!(None, refresh_target("5; url="));
        assert_eq!(None, refresh_target("url=x"));
    }

    #[test]
    fn headers_multi_map() {
        ensure_logger();
        let mut h = Headers::new();
        h.append("Set-Cookie", "a=1");
        h.append("set-cookie", "b=2");
        h.append("Content-Type", "text/html");
        assert_eq!(Some("a=1"), h.get("SET-COOKIE"));
        assert_eq!(
            vec!["a=1", "b=2"],
            h.get_all("set-cookie").collect::<Vec<_>>());
        assert_eq!(3, h.iter().count());
    }
}

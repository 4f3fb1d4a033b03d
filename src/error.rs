//! The crate error surface.

use std::error::Error as StdError;
use std::fmt;

use crate::client::Page;

/// Error type for form access, selector compilation and page fetching.
///
/// Parsing and charset detection never fail; form accessors fail on
/// ambiguity rather than guessing.
#[derive(Debug)]
pub enum Error {
    /// A form accessor was given a name no input element has.
    InputNotFound(String),

    /// The form is in a state the accessors refuse to guess about, e.g.
    /// duplicate non-radio names or multiple checked radio buttons.
    UnsupportedForm(String),

    /// A malformed selector string, with the byte position of the first
    /// unexpected input.
    InvalidSelector { pos: usize },

    /// A link or form action did not resolve to a valid absolute URL.
    InvalidUrl(url::ParseError),

    /// The final response had a non-2xx status. The parsed page is still
    /// attached.
    Http { status: u16, page: Box<Page> },

    /// The transport gave up redirecting. The parsed page of the last hop
    /// is attached.
    TooManyRedirects { page: Box<Page> },

    /// Any other failure of the HTTP collaborator.
    Transport(Box<dyn StdError + Send + Sync + 'static>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputNotFound(name) => {
                write!(f, "no input with name {:?} exists", name)
            }
            Error::UnsupportedForm(why) => {
                write!(f, "unsupported form state: {}", why)
            }
            Error::InvalidSelector { pos } => {
                write!(f, "unexpected selector input at position {}", pos)
            }
            Error::InvalidUrl(e) => {
                write!(f, "invalid URL: {}", e)
            }
            Error::Http { status, .. } => {
                write!(f, "HTTP/{}", status)
            }
            Error::TooManyRedirects { page } => {
                write!(f, "too many redirects (last: {})", page.url())
            }
            Error::Transport(e) => {
                write!(f, "transport: {}", e)
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::InvalidUrl(e) => Some(e),
            Error::Transport(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e)
    }
}

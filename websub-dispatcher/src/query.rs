//! Query string parsing for verification requests.

use url::form_urlencoded;

use crate::error::QueryError;

/// Parsed query parameters, preserving order and repeated names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// First value of the named parameter.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values of the named parameter, in order.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Parses a raw query string into parameters.
pub trait QueryParser {
    fn parse(&self, query: Option<&str>) -> Result<QueryParams, QueryError>;
}

/// `application/x-www-form-urlencoded` query parser.
///
/// Unlike `form_urlencoded::parse` on its own, this rejects broken percent
/// escapes and escapes that decode to invalid UTF-8 instead of silently
/// passing them through.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormQueryParser;

impl QueryParser for FormQueryParser {
    fn parse(&self, query: Option<&str>) -> Result<QueryParams, QueryError> {
        let query = match query {
            Some(q) => q.strip_prefix('?').unwrap_or(q),
            None => return Ok(QueryParams::default()),
        };

        validate_escapes(query)?;

        Ok(form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect())
    }
}

fn validate_escapes(query: &str) -> Result<(), QueryError> {
    let bytes = query.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| {
                        QueryError::Malformed(format!("invalid percent escape at offset {i}"))
                    })?;
                decoded.push(hex);
                i += 3;
            }
            // Separators keep the per-component UTF-8 check honest
            b'&' | b'=' => {
                check_utf8(&decoded)?;
                decoded.clear();
                i += 1;
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }

    check_utf8(&decoded)
}

fn check_utf8(component: &[u8]) -> Result<(), QueryError> {
    std::str::from_utf8(component)
        .map(|_| ())
        .map_err(|e| QueryError::Malformed(format!("escape decodes to invalid UTF-8: {e}")))
}

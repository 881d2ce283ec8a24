//! Cache keys for page fetches.
//!
//! A key is `resource[/trash]?columns=..&pageIndex=..&pageSize=..[&filter=..]`.
//! Parameter order is fixed so equal inputs always produce equal keys, which is
//! what lets the fetch layer dedupe. `pageIndex` on the wire is one-based; the
//! `+ 1` / `- 1` shift happens here and nowhere else.

use std::fmt;

use thiserror::Error;

use crate::domain::entities::pagination::{FilterState, PaginationState};

const TRASH_SEGMENT: &str = "/trash";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RequestKey {
    fn from(value: String) -> Self {
        RequestKey(value)
    }
}

impl From<RequestKey> for String {
    fn from(value: RequestKey) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("request key has no query string: {0}")]
    MissingQuery(String),
    #[error("request key is missing `{0}`")]
    MissingParameter(&'static str),
    #[error("unknown request key parameter `{0}`")]
    UnknownParameter(String),
    #[error("invalid value for `{name}`: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Decoded form of a [`RequestKey`]. `page_index` is zero-based again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub resource: String,
    pub show_trash: bool,
    pub columns: Vec<String>,
    pub page_index: i64,
    pub page_size: i64,
    pub filter: FilterState,
}

pub struct RequestKeyBuilder;

impl RequestKeyBuilder {
    /// The filter travels inside `pagination`; only its trimmed term is
    /// encoded, and an empty filter is omitted entirely. Keys are therefore
    /// distinct per normalized filter: `" x"` and `"x"` share a key.
    pub fn build(
        resource_path: &str,
        pagination: &PaginationState,
        show_trash: bool,
        projection: &[String],
    ) -> RequestKey {
        let mut key = String::from(resource_path.trim_end_matches('/'));
        if show_trash {
            key.push_str(TRASH_SEGMENT);
        }

        let columns = projection
            .iter()
            .map(|column| urlencoding::encode(column).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        key.push_str(&format!(
            "?columns={columns}&pageIndex={}&pageSize={}",
            pagination.page_index() + 1,
            pagination.page_size()
        ));

        let filter = pagination.filter();
        if !filter.is_empty() {
            key.push_str("&filter=");
            key.push_str(&urlencoding::encode(filter.term()));
        }

        RequestKey(key)
    }

    pub fn parse(key: &str) -> Result<ParsedRequest, KeyParseError> {
        let (path, query) = key
            .split_once('?')
            .ok_or_else(|| KeyParseError::MissingQuery(key.to_string()))?;

        let (resource, show_trash) = match path.strip_suffix(TRASH_SEGMENT) {
            Some(resource) => (resource.to_string(), true),
            None => (path.to_string(), false),
        };

        let mut columns = None;
        let mut page_index = None;
        let mut page_size = None;
        let mut filter = FilterState::default();

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (name, raw) = pair.split_once('=').unwrap_or((pair, ""));
            match name {
                "columns" => {
                    let parsed = if raw.is_empty() {
                        Vec::new()
                    } else {
                        raw.split(',')
                            .map(|column| decode("columns", column))
                            .collect::<Result<Vec<_>, _>>()?
                    };
                    columns = Some(parsed);
                }
                "pageIndex" => {
                    let one_based = parse_int("pageIndex", raw)?;
                    page_index = Some(one_based - 1);
                }
                "pageSize" => {
                    let size = parse_int("pageSize", raw)?;
                    if size <= 0 {
                        return Err(KeyParseError::InvalidValue {
                            name: "pageSize",
                            value: raw.to_string(),
                        });
                    }
                    page_size = Some(size);
                }
                "filter" => filter = FilterState::new(decode("filter", raw)?),
                other => return Err(KeyParseError::UnknownParameter(other.to_string())),
            }
        }

        Ok(ParsedRequest {
            resource,
            show_trash,
            columns: columns.ok_or(KeyParseError::MissingParameter("columns"))?,
            page_index: page_index.ok_or(KeyParseError::MissingParameter("pageIndex"))?,
            page_size: page_size.ok_or(KeyParseError::MissingParameter("pageSize"))?,
            filter,
        })
    }
}

fn decode(name: &'static str, raw: &str) -> Result<String, KeyParseError> {
    urlencoding::decode(raw)
        .map(|value| value.into_owned())
        .map_err(|_| KeyParseError::InvalidValue {
            name,
            value: raw.to_string(),
        })
}

fn parse_int(name: &'static str, raw: &str) -> Result<i64, KeyParseError> {
    raw.parse::<i64>().map_err(|_| KeyParseError::InvalidValue {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn state(page_index: i64, page_size: i64, filter: &str) -> PaginationState {
        let mut state = PaginationState::new(page_index, page_size);
        state.set_filter(filter);
        state.set_page(page_index);
        state
    }

    #[test]
    fn key_uses_fixed_parameter_order_and_one_based_page() {
        let key = RequestKeyBuilder::build(
            "/datasets/3/records",
            &state(0, 10, ""),
            false,
            &columns(&["part", "qty"]),
        );

        assert_eq!(
            key.as_str(),
            "/datasets/3/records?columns=part,qty&pageIndex=1&pageSize=10"
        );
    }

    #[test]
    fn trash_segment_follows_resource_and_filter_is_encoded() {
        let key = RequestKeyBuilder::build(
            "/datasets/3/records/",
            &state(2, 25, " hex bolt "),
            true,
            &columns(&["part"]),
        );

        assert_eq!(
            key.as_str(),
            "/datasets/3/records/trash?columns=part&pageIndex=3&pageSize=25&filter=hex%20bolt"
        );
    }

    #[test]
    fn surrounding_whitespace_in_filter_shares_a_key() {
        let padded = RequestKeyBuilder::build("/r", &state(0, 10, " x"), false, &[]);
        let plain = RequestKeyBuilder::build("/r", &state(0, 10, "x"), false, &[]);
        let other = RequestKeyBuilder::build("/r", &state(0, 10, "x y"), false, &[]);

        assert_eq!(padded, plain);
        assert_ne!(plain, other);
    }

    #[test]
    fn empty_filter_is_omitted_not_sent_empty() {
        let key = RequestKeyBuilder::build("/r", &state(0, 10, "   "), false, &[]);

        assert!(!key.as_str().contains("filter"));
    }

    #[test]
    fn identical_inputs_give_identical_keys() {
        let projection = columns(&["a", "b"]);
        let first = RequestKeyBuilder::build("/r", &state(1, 10, "x"), false, &projection);
        let second = RequestKeyBuilder::build("/r", &state(1, 10, "x"), false, &projection);

        assert_eq!(first, second);
    }

    #[test]
    fn any_single_field_change_changes_the_key() {
        let projection = columns(&["a"]);
        let base = RequestKeyBuilder::build("/r", &state(1, 10, "x"), false, &projection);

        let variants = [
            RequestKeyBuilder::build("/r", &state(1, 10, "y"), false, &projection),
            RequestKeyBuilder::build("/r", &state(1, 10, "x"), true, &projection),
            RequestKeyBuilder::build("/r", &state(2, 10, "x"), false, &projection),
            RequestKeyBuilder::build("/r", &state(1, 20, "x"), false, &projection),
            RequestKeyBuilder::build("/r", &state(1, 10, "x"), false, &columns(&["b"])),
        ];

        for variant in variants {
            assert_ne!(variant, base, "{variant} should differ from {base}");
        }
    }

    #[test]
    fn separators_inside_values_do_not_collide() {
        let a = RequestKeyBuilder::build("/r", &state(0, 10, "a&pageSize=1"), false, &[]);
        let b = RequestKeyBuilder::build("/r", &state(0, 10, "a"), false, &[]);

        assert_ne!(a, b);
        let parsed = RequestKeyBuilder::parse(a.as_str()).expect("key should parse");
        assert_eq!(parsed.filter.as_str(), "a&pageSize=1");
        assert_eq!(parsed.page_size, 10);
    }

    #[test]
    fn parse_recovers_zero_based_request() {
        let key = RequestKeyBuilder::build(
            "/datasets/9/records",
            &state(4, 50, "m,8"),
            true,
            &columns(&["part no", "a,b"]),
        );

        let parsed = RequestKeyBuilder::parse(key.as_str()).expect("key should parse");

        assert_eq!(
            parsed,
            ParsedRequest {
                resource: "/datasets/9/records".to_string(),
                show_trash: true,
                columns: columns(&["part no", "a,b"]),
                page_index: 4,
                page_size: 50,
                filter: FilterState::new("m,8"),
            }
        );
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert!(matches!(
            RequestKeyBuilder::parse("/r"),
            Err(KeyParseError::MissingQuery(_))
        ));
        assert_eq!(
            RequestKeyBuilder::parse("/r?columns=&pageIndex=1"),
            Err(KeyParseError::MissingParameter("pageSize"))
        );
        assert!(matches!(
            RequestKeyBuilder::parse("/r?columns=&pageIndex=1&pageSize=0"),
            Err(KeyParseError::InvalidValue { name: "pageSize", .. })
        ));
        assert!(matches!(
            RequestKeyBuilder::parse("/r?columns=&pageIndex=1&pageSize=5&sort=a"),
            Err(KeyParseError::UnknownParameter(_))
        ));
    }
}

//! Search translation
//!
//! Converts a (field, term) pair into either an exact-match or a
//! wildcard-match store query. The field→column table and the
//! exact/wildcard decision both happen here, before any store call; the
//! store adapter only executes what this module produces.
//!
//! `*` in a term matches zero or more characters at that position and maps
//! to the store's `%` wildcard. Literal `%`, `_` and `\` in user terms are
//! escaped so they never act as wildcards. Matching is case-insensitive
//! for both exact and wildcard queries.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("'{0}' is not a searchable field (expected one of: first-name, last-name, phone, zip, city)")]
    UnknownField(String),
}

/// Which table a search column lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTarget {
    /// Column of the contacts table
    Contact,
    /// Column of the addresses table, joined back to the owning contact
    Address,
}

/// Searchable fields exposed by the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    FirstName,
    LastName,
    Phone,
    Zip,
    City,
}

impl SearchField {
    /// The store column this field maps to
    pub fn column(self) -> &'static str {
        match self {
            SearchField::FirstName => "first_name",
            SearchField::LastName => "last_name",
            SearchField::Phone => "phone",
            SearchField::Zip => "zip",
            SearchField::City => "city",
        }
    }

    /// The table the mapped column lives in
    pub fn target(self) -> FieldTarget {
        match self {
            SearchField::FirstName | SearchField::LastName | SearchField::Phone => {
                FieldTarget::Contact
            }
            SearchField::Zip | SearchField::City => FieldTarget::Address,
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchField::FirstName => "first-name",
            SearchField::LastName => "last-name",
            SearchField::Phone => "phone",
            SearchField::Zip => "zip",
            SearchField::City => "city",
        };
        f.write_str(name)
    }
}

impl FromStr for SearchField {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-name" | "first_name" | "firstname" | "first" => Ok(SearchField::FirstName),
            "last-name" | "last_name" | "lastname" | "last" => Ok(SearchField::LastName),
            "phone" => Ok(SearchField::Phone),
            "zip" | "zipcode" | "postal-code" => Ok(SearchField::Zip),
            "city" => Ok(SearchField::City),
            other => Err(SearchError::UnknownField(other.to_string())),
        }
    }
}

/// How the store should match the translated term
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// Exact match (case-insensitive)
    Exact(String),
    /// `LIKE` pattern with `\` as the escape character (case-insensitive)
    Like(String),
}

/// A translated, store-ready query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub field: SearchField,
    pub matcher: Matcher,
}

impl SearchQuery {
    /// Translates a search term for the given field
    ///
    /// A term containing `*` becomes a wildcard query; anything else is an
    /// exact match.
    pub fn translate(field: SearchField, term: &str) -> Self {
        let matcher = if term.contains('*') {
            Matcher::Like(to_like_pattern(term))
        } else {
            Matcher::Exact(term.to_string())
        };

        Self { field, matcher }
    }

    /// Returns true if this is a wildcard query
    pub fn is_wildcard(&self) -> bool {
        matches!(self.matcher, Matcher::Like(_))
    }
}

/// Maps `*` to `%` and escapes characters the store would otherwise treat
/// as wildcards
fn to_like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len());
    for ch in term.chars() {
        match ch {
            '*' => pattern.push('%'),
            '%' | '_' | '\\' => {
                pattern.push('\\');
                pattern.push(ch);
            }
            other => pattern.push(other),
        }
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_column_table() {
        assert_eq!(SearchField::FirstName.column(), "first_name");
        assert_eq!(SearchField::FirstName.target(), FieldTarget::Contact);
        assert_eq!(SearchField::Phone.target(), FieldTarget::Contact);
        assert_eq!(SearchField::Zip.column(), "zip");
        assert_eq!(SearchField::Zip.target(), FieldTarget::Address);
        assert_eq!(SearchField::City.target(), FieldTarget::Address);
    }

    #[test]
    fn unknown_field_is_an_error() {
        let err = "salary".parse::<SearchField>().unwrap_err();
        assert_eq!(err, SearchError::UnknownField("salary".to_string()));
    }

    #[test]
    fn field_names_parse_loosely() {
        assert_eq!("first-name".parse::<SearchField>().unwrap(), SearchField::FirstName);
        assert_eq!("firstName".parse::<SearchField>().unwrap(), SearchField::FirstName);
        assert_eq!("LAST".parse::<SearchField>().unwrap(), SearchField::LastName);
        assert_eq!("postal-code".parse::<SearchField>().unwrap(), SearchField::Zip);
    }

    #[test]
    fn plain_term_is_exact() {
        let query = SearchQuery::translate(SearchField::FirstName, "John");
        assert_eq!(query.matcher, Matcher::Exact("John".to_string()));
        assert!(!query.is_wildcard());
    }

    #[test]
    fn star_becomes_percent() {
        let query = SearchQuery::translate(SearchField::Zip, "123*");
        assert_eq!(query.matcher, Matcher::Like("123%".to_string()));
        assert!(query.is_wildcard());
    }

    #[test]
    fn star_in_the_middle() {
        let query = SearchQuery::translate(SearchField::City, "New*City");
        assert_eq!(query.matcher, Matcher::Like("New%City".to_string()));
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        let query = SearchQuery::translate(SearchField::Phone, "555_01%*");
        assert_eq!(query.matcher, Matcher::Like("555\\_01\\%%".to_string()));
    }
}

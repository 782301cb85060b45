//! Builder for the IGDB query mini-language (the `fields ...; where ...;` request body).

use std::{fmt, num::NonZeroU32};

use once_cell::sync::Lazy;
use regex::Regex;

/// Field sentinel sent when no explicit field list is requested.
pub const ALL_FIELDS: &str = "*";

/// Structured description of one IGDB query.
///
/// `where_clauses` are caller-supplied predicates (`"platforms = (130)"`). They
/// are AND-combined verbatim: no parsing, escaping or de-duplication happens,
/// so callers must sanitize anything that did not originate in code. Only the
/// free-text `search` term is quoted and escaped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDescription {
    pub fields: Vec<String>,
    pub where_clauses: Vec<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<NonZeroU32>,
    pub offset: Option<u32>,
}

impl QueryDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Append a predicate; repeated calls are AND-combined.
    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.where_clauses.push(clause.into());
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Sort expression in `"field direction"` form, e.g. `"name asc"`.
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// A limit of zero leaves the query unlimited.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = NonZeroU32::new(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render the request body.
    ///
    /// Clauses are emitted in the order fields, search, where, sort, limit,
    /// offset, each terminated by `;` and separated by one space.
    pub fn build(&self) -> String {
        let mut clauses = Vec::with_capacity(6);

        if self.fields.is_empty() {
            clauses.push(format!("fields {};", ALL_FIELDS));
        } else {
            clauses.push(format!("fields {};", self.fields.join(",")));
        }

        if let Some(text) = &self.search {
            clauses.push(format!("search \"{}\";", escape_search(text)));
        }

        if !self.where_clauses.is_empty() {
            clauses.push(format!("where {};", self.where_clauses.join(" & ")));
        }

        if let Some(sort) = &self.sort {
            clauses.push(format!("sort {};", sort));
        }

        if let Some(limit) = self.limit {
            clauses.push(format!("limit {};", limit));
        }

        if let Some(offset) = self.offset {
            clauses.push(format!("offset {};", offset));
        }

        clauses.join(" ")
    }
}

impl fmt::Display for QueryDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

fn escape_search(text: &str) -> String {
    static SEARCH_ESCAPE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"["\\]"#).expect("invalid search escape regex"));

    SEARCH_ESCAPE_RE.replace_all(text, r"\$0").into_owned()
}

//! Query-string builder for the content service's bracket syntax.
//!
//! Produces `filters[field][op]=value`, `populate=a,b`, `sort[i]=field:dir`
//! and `pagination[page]=N` pairs in insertion order. Filter values are
//! percent-encoded; keys keep their literal brackets.

use std::fmt;

/// Filter operators understood by the content service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    /// Case-insensitive substring match.
    ContainsI,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "$eq",
            FilterOp::ContainsI => "$containsi",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
    sorts: usize,
}

impl QueryString {
    pub fn new() -> Self {
        Self::default()
    }

    /// `filters[f0][f1]..[op]=value`. Repeating the same key ORs the clauses.
    pub fn filter(mut self, fields: &[&str], op: FilterOp, value: &str) -> Self {
        let mut key = String::from("filters");
        for field in fields {
            key.push('[');
            key.push_str(field);
            key.push(']');
        }
        key.push('[');
        key.push_str(op.as_str());
        key.push(']');
        self.pairs.push((key, urlencoding::encode(value).into_owned()));
        self
    }

    pub fn populate(mut self, fields: &[&str]) -> Self {
        self.pairs.push(("populate".to_string(), fields.join(",")));
        self
    }

    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.pairs.push((
            format!("sort[{}]", self.sorts),
            format!("{field}:{}", order.as_str()),
        ));
        self.sorts += 1;
        self
    }

    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.pairs
            .push(("pagination[page]".to_string(), page.to_string()));
        self.pairs
            .push(("pagination[pageSize]".to_string(), page_size.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_pairs_in_insertion_order() {
        let query = QueryString::new()
            .populate(&["cover"])
            .page(2, 4)
            .sort("createdAt", SortOrder::Desc);
        assert_eq!(
            query.to_string(),
            "populate=cover&pagination[page]=2&pagination[pageSize]=4&sort[0]=createdAt:desc"
        );
    }

    #[test]
    fn nested_filter_fields_become_brackets() {
        let query = QueryString::new().filter(&["tags", "slug"], FilterOp::Eq, "rust");
        assert_eq!(query.to_string(), "filters[tags][slug][$eq]=rust");
    }

    #[test]
    fn filter_values_are_percent_encoded() {
        let query = QueryString::new().filter(&["title"], FilterOp::ContainsI, "async & await");
        assert_eq!(query.to_string(), "filters[title][$containsi]=async%20%26%20await");
    }

    #[test]
    fn sort_indexes_increase() {
        let query = QueryString::new()
            .sort("createdAt", SortOrder::Desc)
            .sort("title", SortOrder::Asc);
        assert_eq!(query.to_string(), "sort[0]=createdAt:desc&sort[1]=title:asc");
    }

    #[test]
    fn empty_query_renders_nothing() {
        assert!(QueryString::new().is_empty());
        assert_eq!(QueryString::new().to_string(), "");
    }
}

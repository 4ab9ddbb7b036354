//! Predicate and option building for document searches.

/// `[document.last_publication_date desc]`, most recently edited first.
pub const ORDER_LAST_PUBLICATION_DESC: &str = "[document.last_publication_date desc]";
pub const ORDER_FIRST_PUBLICATION_DESC: &str = "[document.first_publication_date desc]";
pub const ORDER_FIRST_PUBLICATION_ASC: &str = "[document.first_publication_date]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    path: String,
    value: String,
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }

    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Self::at(format!("my.{}.uid", doc_type), uid)
    }

    pub fn id(id: &str) -> Self {
        Self::at("document.id", id)
    }

    fn render(&self) -> String {
        let value = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("[at({}, \"{}\")]", self.path, value)
    }
}

/// The `q` parameter: every predicate wrapped in one outer bracket pair.
pub fn predicate_query(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(Predicate::render).collect();
    format!("[{}]", inner)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub page_size: Option<usize>,
    /// Ordering expression, passed through unchanged.
    pub orderings: Option<String>,
    /// Only return documents after this document id in the ordering.
    pub after: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn orderings(mut self, orderings: &str) -> Self {
        self.orderings = Some(orderings.to_string());
        self
    }

    pub fn after(mut self, document_id: &str) -> Self {
        self.after = Some(document_id.to_string());
        self
    }

    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page_size) = self.page_size {
            pairs.push(("pageSize", page_size.to_string()));
        }
        if let Some(orderings) = &self.orderings {
            pairs.push(("orderings", orderings.clone()));
        }
        if let Some(after) = &self.after {
            pairs.push(("after", after.clone()));
        }
        pairs
    }
}

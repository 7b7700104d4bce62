//! Query grammar of the search endpoints (`/data/wow/search/...`).

use std::collections::BTreeMap;
use std::fmt::Display;
use url::form_urlencoded;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    params: BTreeMap<String, String>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// `field=value`
    pub fn field(mut self, field: &str, value: impl Display) -> Self {
        self.params.insert(field.to_string(), value.to_string());
        self
    }

    /// `field=a||b||c`
    pub fn or<T: Display>(mut self, field: &str, values: impl IntoIterator<Item = T>) -> Self {
        let joined = values
            .into_iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join("||");
        self.params.insert(field.to_string(), joined);
        self
    }

    /// `field!=value`
    pub fn not(mut self, field: &str, value: impl Display) -> Self {
        self.params.insert(format!("{}!", field), value.to_string());
        self
    }

    /// `field=[min,max]` when inclusive, `field=(min,max)` otherwise. Either
    /// bound may be left open.
    pub fn range<T: Display>(
        mut self,
        field: &str,
        min: Option<T>,
        max: Option<T>,
        inclusive: bool,
    ) -> Self {
        let (open, close) = if inclusive { ('[', ']') } else { ('(', ')') };
        let bound = |value: Option<T>| value.map(|v| v.to_string()).unwrap_or_default();
        let range = format!("{}{},{}{}", open, bound(min), bound(max), close);
        self.params.insert(field.to_string(), range);
        self
    }

    pub fn page(self, page: u32) -> Self {
        self.field("_page", page)
    }

    pub fn page_size(self, page_size: u32) -> Self {
        self.field("_pageSize", page_size)
    }

    /// `orderby=a,b`
    pub fn order_by<T: Display>(self, fields: impl IntoIterator<Item = T>) -> Self {
        let joined = fields
            .into_iter()
            .map(|field| field.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.field("orderby", joined)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Url-encoded query string, keys in sorted order.
    pub fn build(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }
}

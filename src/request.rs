use crate::region::Region;
use crate::search::SearchQuery;
use reqwest::Method;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use url::form_urlencoded;

/// Namespaces partition the API's documents per region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Static,
    Dynamic,
    Profile,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Static => "static",
            Namespace::Dynamic => "dynamic",
            Namespace::Profile => "profile",
        }
    }

    /// e.g. `static-eu`
    pub fn for_region(self, region: Region) -> String {
        format!("{}-{}", self.as_str(), region)
    }
}

/// One read request: resource path, region and query parameters.
///
/// Parameters are kept sorted so two descriptors built in a different order
/// compare equal and share a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestDescriptor {
    resource: String,
    region: Region,
    query: BTreeMap<String, String>,
}

impl RequestDescriptor {
    pub fn new(resource: impl Into<String>, region: Region) -> Self {
        let mut resource = resource.into();
        if !resource.starts_with('/') {
            resource.insert(0, '/');
        }

        RequestDescriptor {
            resource,
            region,
            query: BTreeMap::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Display,
    {
        for (key, value) in params {
            self.query.insert(key.into(), value.to_string());
        }
        self
    }

    pub fn locale(self, locale: &str) -> Self {
        self.param("locale", locale)
    }

    pub fn namespace(self, namespace: Namespace) -> Self {
        let value = namespace.for_region(self.region);
        self.param("namespace", value)
    }

    pub fn search(mut self, search: &SearchQuery) -> Self {
        self.query
            .extend(search.params().iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn method(&self) -> Method {
        Method::GET
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Canonical form of every argument of the call, used as memoization key.
    pub fn cache_key(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{} {} {}?{}", self.method(), self.region, self.resource, query)
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_order_does_not_change_the_key() {
        let a = RequestDescriptor::new("/data/wow/achievement/6", Region::Eu)
            .locale("en_GB")
            .namespace(Namespace::Static);
        let b = RequestDescriptor::new("/data/wow/achievement/6", Region::Eu)
            .namespace(Namespace::Static)
            .locale("en_GB");

        assert_eq!(a, b);
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(
            a.cache_key(),
            "GET eu /data/wow/achievement/6?locale=en_GB&namespace=static-eu"
        );
    }

    #[test]
    fn every_argument_is_part_of_the_key() {
        let base = RequestDescriptor::new("/data/wow/achievement/6", Region::Eu).locale("en_GB");

        assert_ne!(
            base.cache_key(),
            RequestDescriptor::new("/data/wow/achievement/6", Region::Us)
                .locale("en_GB")
                .cache_key()
        );
        assert_ne!(base.cache_key(), base.clone().locale("de_DE").cache_key());
        assert_ne!(
            base.cache_key(),
            RequestDescriptor::new("/data/wow/achievement/7", Region::Eu)
                .locale("en_GB")
                .cache_key()
        );
    }

    #[test]
    fn resource_gets_a_leading_slash() {
        let request = RequestDescriptor::new("data/wow/token/index", Region::Us);
        assert_eq!(request.resource(), "/data/wow/token/index");
    }

    #[test]
    fn namespace_follows_the_region() {
        let request = RequestDescriptor::new("/profile/wow/character/illidan/x", Region::Kr)
            .namespace(Namespace::Profile);
        assert_eq!(request.query()["namespace"], "profile-kr");
        assert_eq!(Namespace::Dynamic.for_region(Region::Cn), "dynamic-cn");
    }

    #[test]
    fn merges_search_parameters() {
        let search = SearchQuery::new().field("name.en_US", "Ragnaros").page(1);
        let request = RequestDescriptor::new("/data/wow/search/creature", Region::Us)
            .namespace(Namespace::Static)
            .search(&search);

        assert_eq!(request.query()["name.en_US"], "Ragnaros");
        assert_eq!(request.query()["_page"], "1");
        assert_eq!(request.query()["namespace"], "static-us");
    }
}

use url::{form_urlencoded, Url};

pub const INCLUDES_PARAM: &str = "includes";

/// Query string for collection endpoints: filters plus one `includes` list.
///
/// Filters keep their insertion order. Setting a key twice replaces the value
/// in place, so every key appears once. Related entity names are joined with
/// commas into a single `includes` parameter that always comes last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<(String, String)>,
    includes: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.filters.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.filters.push((key, value)),
        }
    }

    pub fn include(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        if !trimmed.is_empty() && !self.includes.iter().any(|n| n == trimmed) {
            self.includes.push(trimmed.to_string());
        }
        self
    }

    pub fn includes<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |query, name| query.include(name))
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    pub fn included(&self) -> &[String] {
        &self.includes
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.includes.is_empty()
    }

    /// Final parameter list in wire order
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .filters
            .iter()
            .filter(|(key, _)| self.includes.is_empty() || key != INCLUDES_PARAM)
            .cloned()
            .collect();

        if !self.includes.is_empty() {
            pairs.push((INCLUDES_PARAM.to_string(), self.includes.join(",")));
        }
        pairs
    }

    /// Percent-encoded `key=value&...` without the leading `?`
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }

    /// Append the parameters to `url`, after any query it already has
    pub fn apply_to(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        url.query_pairs_mut().extend_pairs(self.pairs());
    }
}

/// Parse `key=value` filter arguments as given on the command line
impl std::str::FromStr for Query {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut query = Query::new();
        for pair in s.split('&').filter(|p| !p.trim().is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected key=value, found '{}'", pair))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("empty key in '{}'", pair));
            }
            if key == INCLUDES_PARAM {
                query = query.includes(value.split(','));
            } else {
                query.set(key, value.trim());
            }
        }
        Ok(query)
    }
}

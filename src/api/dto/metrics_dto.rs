//! Metrics API DTOs

/// Raw query-string parameters, kept in the order they were supplied.
///
/// Repeated parameters may be sent either as `name[]=a&name[]=b` or as
/// `name=a&name=b`; both spellings are stored under `name`.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| {
                let key: String = k.into();
                let key = key.strip_suffix("[]").map(str::to_string).unwrap_or(key);
                (key, v.into())
            })
            .collect();

        Self { pairs }
    }

    /// First non-empty value for `name`. Empty values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, v)| k == name && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    /// Every non-empty value for `name`, in request order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, v)| k == name && !v.is_empty())
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

impl From<Vec<(String, String)>> for QueryParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::from_pairs(pairs)
    }
}

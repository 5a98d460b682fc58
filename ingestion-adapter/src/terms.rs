use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered search keywords plus the document type their results are indexed
/// under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terms {
    #[serde(rename = "type")]
    kind: String,
    values: Vec<String>,
}

impl Terms {
    pub fn new<I, S>(kind: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: kind.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Tag list handed to the search provider, in term order.
    pub fn tags(&self) -> Vec<String> {
        self.values.clone()
    }

    pub fn routing_key(&self) -> RoutingKey {
        RoutingKey::from(self)
    }
}

/// Lower-cased concatenation of all term values, in order. Addresses the
/// handler serving a [`Terms`] for both dispatch and control.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutingKey(String);

impl RoutingKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&Terms> for RoutingKey {
    fn from(terms: &Terms) -> Self {
        RoutingKey(
            terms
                .values
                .iter()
                .map(|value| value.to_lowercase())
                .collect(),
        )
    }
}

impl From<&str> for RoutingKey {
    fn from(key: &str) -> Self {
        RoutingKey(key.to_string())
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

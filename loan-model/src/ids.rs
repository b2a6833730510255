use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// A book's stable catalog code, e.g. `L0001`.
#[derive(Debug, Display, From, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookCode(pub String);

impl BookCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BookCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A library patron's identifier, e.g. `U0001`.
#[derive(Debug, Display, From, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

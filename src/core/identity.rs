use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Wire prefix marking a record the backend has not acknowledged yet.
const PENDING_PREFIX: &str = "new-";

/// Identity of a collection record.
///
/// Records created locally start out `Pending` and are promoted to
/// `Persisted` once a write that carried them succeeds. The distinction is
/// in the type, so "has this record been saved" is a `match`, not a string
/// prefix check. On the wire a pending id still serializes as
/// `new-<token>` and a persisted one as the bare token, which is what the
/// backend stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Pending { token: String },
    Persisted { token: String },
}

impl RecordId {
    /// A fresh identity for a record created in this session.
    pub fn fresh() -> Self {
        Self::Pending {
            token: Uuid::new_v4().to_string(),
        }
    }

    pub fn persisted(token: impl Into<String>) -> Self {
        Self::Persisted {
            token: token.into(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// The token without any pending marker. Stable across promotion.
    pub fn token(&self) -> &str {
        match self {
            Self::Pending { token } | Self::Persisted { token } => token,
        }
    }

    /// Marks the record as acknowledged by the backend. The token is kept,
    /// so references held by the host stay valid.
    pub fn confirm(&mut self) {
        if let Self::Pending { token } = self {
            *self = Self::Persisted {
                token: std::mem::take(token),
            };
        }
    }

    /// True when both sides name the same record, regardless of whether a
    /// confirmation has landed in between.
    pub fn same_record(&self, other: &RecordId) -> bool {
        self.token() == other.token()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { token } => write!(f, "{PENDING_PREFIX}{token}"),
            Self::Persisted { token } => write!(f, "{token}"),
        }
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.strip_prefix(PENDING_PREFIX) {
            Some(token) => Self::Pending {
                token: token.to_string(),
            },
            None => Self::Persisted {
                token: s.to_string(),
            },
        })
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Row ids are assigned by SQLite (`INTEGER PRIMARY KEY AUTOINCREMENT`),
/// so each table gets its own wrapper around the raw `i64`.
macro_rules! row_id {
    ($name:ident, $label:literal) => {
        #[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub fn from_raw(raw: i64) -> Self {
                Self(raw)
            }

            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $label, self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($label, "#")).unwrap_or(s);
                raw.parse().map(Self)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

row_id!(UserId, "user");
row_id!(StatusId, "status");
row_id!(MessageId, "message");

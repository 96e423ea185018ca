//! Identifier newtypes.
//!
//! Generated ids wrap a time-ordered UUID string, so they sort by creation
//! time. Keys declared by schema authors (schema, group and field ids) are plain
//! strings chosen by whoever writes the schema.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

macro_rules! generated_id {
    ($(#[$meta:meta])* $name:ident) => {
        string_id!($(#[$meta])* $name);

        impl $name {
            /// Creates a new time-ordered id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

generated_id!(
    /// Identity of a [`Property`](crate::property::Property).
    PropertyId
);
generated_id!(
    /// Stable identity of a group, used to address list entries.
    ItemId
);
generated_id!(SceneId);
generated_id!(DatasetId);
generated_id!(DatasetSchemaId);
generated_id!(DatasetFieldId);

string_id!(
    /// Identity of a [`PropertySchema`](crate::schema::PropertySchema).
    PropertySchemaId
);
string_id!(SchemaGroupId);
string_id!(FieldId);

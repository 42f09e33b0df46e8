//! Typed identifiers for host objects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for ids derived from names.
const NAME_NAMESPACE: Uuid = Uuid::from_u128(0x8f5c_2a61_4d0e_4b7a_9c3e_5e0b_7a1d_c4f2);

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Stable id derived from a name.
            pub fn from_name(name: &str) -> Self {
                Self(Uuid::new_v5(&NAME_NAMESPACE, name.as_bytes()))
            }

            /// Wrap an existing uuid.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Underlying uuid.
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Node in the host shading graph.
    NodeId
);
define_id!(
    /// Shader object.
    ShaderId
);
define_id!(
    /// Material being exported.
    MaterialId
);
define_id!(
    /// Selection group of faces.
    SelectionGroupId
);
define_id!(
    /// Export item in the host project.
    ExportItemId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_ids_are_stable() {
        assert_eq!(MaterialId::from_name("Metal01"), MaterialId::from_name("Metal01"));
        assert_ne!(MaterialId::from_name("Metal01"), MaterialId::from_name("Metal02"));
        assert_ne!(NodeId::new(), NodeId::new());
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = ShaderId::new();
        let parsed: ShaderId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}

// src/element/id.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DagwheelError, Result};

/// Character reserved as a separator in persisted keys.
pub const NAME_SEPARATOR: char = '|';

/// Attribute under which a dynamically spawned element sees the element
/// whose completion spawned it.
pub const DYNAMIC_ATTRIBUTE: &str = "DynamicAttribute";

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
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

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Globally unique identifier of an element.
    ElementId
);

uuid_id!(
    /// Identifier grouping the elements committed by one graph build.
    WorkflowId
);

/// Names (element names in a builder, attribute names, variable names) must
/// be non-empty and must not contain [`NAME_SEPARATOR`].
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(NAME_SEPARATOR)
}

pub fn check_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(DagwheelError::InvalidName(name.to_string()))
    }
}

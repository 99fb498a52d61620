//! Domain types for the show tracker with strong typing.
//!
//! Identifiers are newtypes so a show id can never be passed where a user id
//! is expected. The transition rules live in [`watch_state`], the read-side
//! projections in [`views`].

pub mod views;
pub mod watch_state;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::limits::{MAX_NAME_LEN, MAX_TOTAL_SEASONS};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }
    };
}

entity_id!(
    /// Identifier of a row in `shows`.
    ///
    /// ```rust
    /// use showtracker::domain::ShowId;
    ///
    /// let id = ShowId::new(42);
    /// assert_eq!(id.value(), 42);
    /// assert_eq!(id.to_string(), "42");
    /// ```
    ShowId
);

entity_id!(
    /// Identifier of a household member in `users`.
    UserId
);

entity_id!(
    /// Identifier of a streaming platform.
    PlatformId
);

/// Trims a user-supplied name, rejecting blank or oversized input.
pub fn normalize_name(kind: &str, raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(format!("{kind} name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "{kind} name must be {MAX_NAME_LEN} characters or less"
        ));
    }
    Ok(name.to_string())
}

/// A show has at least one season and a sane upper bound.
pub fn validate_total_seasons(total: i32) -> Result<i32, String> {
    if (1..=MAX_TOTAL_SEASONS).contains(&total) {
        Ok(total)
    } else {
        Err(format!(
            "Total seasons must be between 1 and {MAX_TOTAL_SEASONS}, got {total}"
        ))
    }
}

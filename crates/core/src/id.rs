//! Typed row identifiers
//!
//! The store hands out plain `i64` rowids; wrapping them keeps an
//! `AccountId` from ever being passed where a `RequestId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            #[inline]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Primary key of an `accounts` row
    AccountId
);
define_id!(
    /// Primary key of a `transactions` row
    TransactionId
);
define_id!(
    /// Primary key of a `payment_requests` row
    RequestId
);
define_id!(
    /// Primary key of a `cards` row
    CardId
);

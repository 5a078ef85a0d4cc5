use serde::{Deserialize, Serialize};

/// Declares a database-assigned numeric identifier.
///
/// Each identifier wraps the `BIGSERIAL` value of its table so that a
/// concert id can never be passed where an order id is expected.
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a raw row id.
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw row id.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

numeric_id!(
    /// Identifier of a concert row.
    ConcertId
);

numeric_id!(
    /// Identifier of a single ticket slot.
    TicketId
);

numeric_id!(
    /// Identifier of a purchase order.
    OrderId
);

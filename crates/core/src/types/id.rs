//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally passing a testimonial ID where a message ID is expected.
//! The backend hands out SQLite row ids, so the wrappers hold an `i64`.

use core::fmt;

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>`, `Into<i64>`, `Display` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use portfolio_core::define_id;
/// define_id!(PostId);
/// define_id!(CommentId);
///
/// let post_id = PostId::new(1);
/// let comment_id: CommentId = "7".parse().unwrap();
///
/// // These are different types, so this won't compile:
/// // let _: PostId = comment_id;
/// # assert_eq!(post_id.as_i64(), 1);
/// # assert_eq!(comment_id.as_i64(), 7);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(TestimonialId);
define_id!(ContactMessageId);
define_id!(ShopInquiryId);

/// A record the backend addresses by id.
///
/// Lets keyed collections replace or remove entries without knowing the
/// concrete record type.
pub trait Identified {
    /// The id type of the record.
    type Id: Copy + Eq + fmt::Debug;

    /// The record's id.
    fn id(&self) -> Self::Id;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_parse() {
        let id = TestimonialId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(" 42 ".parse::<TestimonialId>().unwrap(), id);
        assert!("forty-two".parse::<TestimonialId>().is_err());
    }

    #[test]
    fn test_id_is_transparent_on_the_wire() {
        let id = ContactMessageId::new(9);
        assert_eq!(serde_json::to_string(&id).unwrap(), "9");
        let parsed: ContactMessageId = serde_json::from_str("9").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_conversions() {
        let id: UserId = 3.into();
        let raw: i64 = id.into();
        assert_eq!(raw, 3);
        assert_eq!(ShopInquiryId::from(5).as_i64(), 5);
    }
}

/// Declares a `Copy` newtype over an integer.
///
/// - `newtype!(address Name(u64), "doc")` is an address-like value: it
///   supports `+` and `&` with the raw integer and is printed in hex.
/// - `newtype!(index Name(usize), "doc")` numbers a table slot and is
///   printed in decimal.
macro_rules! newtype {
    (address $name:ident($type:ty), $doc:expr) => {
        newtype!(@base $name($type), $doc);

        impl ::std::ops::Add<$type> for $name {
            type Output = Self;

            fn add(self, rhs: $type) -> Self {
                Self(self.0 + rhs)
            }
        }

        impl ::std::ops::BitAnd<$type> for $name {
            type Output = Self;

            fn bitand(self, rhs: $type) -> Self {
                Self(self.0 & rhs)
            }
        }

        impl ::std::fmt::LowerHex for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                ::std::fmt::LowerHex::fmt(&self.0, f)
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }
    };

    (index $name:ident($type:ty), $doc:expr) => {
        newtype!(@base $name($type), $doc);

        impl $name {
            /// Returns the position of this slot in its table.
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }
    };

    (@base $name:ident($type:ty), $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Default,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $type);

        impl From<$type> for $name {
            fn from(value: $type) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $type {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

pub(crate) use newtype;

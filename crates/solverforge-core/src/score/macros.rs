//! Declarative macro generating the level-based score types.
//!
//! Every built-in score is a struct of one to three levels sharing a number
//! type (`i64` or `Decimal`). The macro generates the struct, constructors,
//! arithmetic, ordering, text form and the `Score` impl.

/// Generates a level-based score type.
///
/// Fields are listed highest priority first; `feasible` lists the levels that
/// must be non-negative for the score to be feasible.
///
/// # Usage
/// ```ignore
/// level_score! {
///     /// Docs.
///     HardSoftScore(i64) { hard => "hard", soft => "soft" } feasible [hard]
/// }
/// ```
macro_rules! level_score {
    (
        $(#[$meta:meta])*
        $type:ident($num:ty) { $($field:ident => $suffix:literal),+ } feasible [$($feasible:ident),*]
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $type {
            $($field: $num),+
        }

        impl $type {
            /// Creates a score from its levels, highest priority first.
            #[inline]
            pub const fn of($($field: $num),+) -> Self {
                $type { $($field),+ }
            }

            $(
                #[inline]
                pub const fn $field(&self) -> $num {
                    self.$field
                }
            )+
        }

        impl std::ops::Add for $type {
            type Output = Self;

            fn add(self, other: Self) -> Self {
                $type { $($field: self.$field + other.$field),+ }
            }
        }

        impl std::ops::Sub for $type {
            type Output = Self;

            fn sub(self, other: Self) -> Self {
                $type { $($field: self.$field - other.$field),+ }
            }
        }

        impl std::ops::Neg for $type {
            type Output = Self;

            fn neg(self) -> Self {
                $type { $($field: -self.$field),+ }
            }
        }

        impl std::ops::AddAssign for $type {
            fn add_assign(&mut self, other: Self) {
                *self = *self + other;
            }
        }

        impl std::ops::SubAssign for $type {
            fn sub_assign(&mut self, other: Self) {
                *self = *self - other;
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(<$type as $crate::score::Score>::zero(), |acc, s| acc + s)
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let parts: Vec<String> = vec![$(format!("{}{}", self.$field, $suffix)),+];
                f.write_str(&parts.join("/"))
            }
        }

        impl std::fmt::Debug for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($type), self)
            }
        }

        impl std::str::FromStr for $type {
            type Err = $crate::score::ScoreParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$type as $crate::score::Score>::parse(s)
            }
        }

        impl $crate::score::Score for $type {
            const DECIMAL: bool = <$num as $crate::score::level::LevelNumber>::DECIMAL;

            #[inline]
            fn zero() -> Self {
                $type { $($field: <$num as $crate::score::level::LevelNumber>::ZERO),+ }
            }

            fn is_feasible(&self) -> bool {
                true $(&& self.$feasible >= <$num as $crate::score::level::LevelNumber>::ZERO)*
            }

            fn levels_count() -> usize {
                [$($suffix),+].len()
            }

            fn to_level_numbers(&self) -> Vec<rust_decimal::Decimal> {
                use $crate::score::level::LevelNumber;
                vec![$(self.$field.to_decimal()),+]
            }

            fn multiply(&self, multiplicand: i64) -> Self {
                use $crate::score::level::LevelNumber;
                $type { $($field: self.$field.times(multiplicand)),+ }
            }

            fn multiply_decimal(&self, multiplicand: rust_decimal::Decimal) -> Self {
                use $crate::score::level::LevelNumber;
                $type { $($field: self.$field.times_decimal(multiplicand)),+ }
            }

            fn to_short_string(&self) -> String {
                let mut parts: Vec<String> = Vec::new();
                $(
                    if self.$field != <$num as $crate::score::level::LevelNumber>::ZERO {
                        parts.push(format!("{}{}", self.$field, $suffix));
                    }
                )+
                if parts.is_empty() {
                    "0".to_string()
                } else {
                    parts.join("/")
                }
            }

            fn parse(text: &str) -> Result<Self, $crate::score::ScoreParseError> {
                use $crate::score::level::LevelNumber;
                let text = text.trim();
                let suffixes: &[&str] = &[$($suffix),+];
                let parts: Vec<&str> = text.split('/').collect();
                if parts.len() != suffixes.len() {
                    return Err($crate::score::ScoreParseError::new(format!(
                        "{} '{}' must have {} level(s) separated by '/'",
                        stringify!($type),
                        text,
                        suffixes.len()
                    )));
                }
                let mut parts = parts.into_iter();
                $(
                    let $field = {
                        let part = parts.next().unwrap_or_default().trim();
                        let number = part.strip_suffix($suffix).ok_or_else(|| {
                            $crate::score::ScoreParseError::new(format!(
                                "level '{}' of {} must end with '{}'",
                                part,
                                stringify!($type),
                                $suffix
                            ))
                        })?;
                        <$num>::parse_level(number)?
                    };
                )+
                Ok($type { $($field),+ })
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $type {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $type {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                <$type as $crate::score::Score>::parse(&text).map_err(serde::de::Error::custom)
            }
        }
    };
}

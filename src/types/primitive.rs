//! Primitive types and the numeric conversion rules between them.
//!
//! The rules implemented here are the ones that drive implicit conversion nodes in the
//! control flow graph: widening primitive conversion, unary and binary numeric promotion,
//! and the mapping between primitives and their boxed wrapper classes.

use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

/// A primitive (non-reference) type.
///
/// The declaration order is significant: [`PrimitiveKind::rank`] relies on it for the
/// numeric types to order them by the widening relation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumCount, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveKind {
    /// `boolean`
    Boolean,
    /// `byte`, 8-bit signed
    Byte,
    /// `short`, 16-bit signed
    Short,
    /// `char`, 16-bit unsigned
    Char,
    /// `int`, 32-bit signed
    Int,
    /// `long`, 64-bit signed
    Long,
    /// `float`, 32-bit IEEE 754
    Float,
    /// `double`, 64-bit IEEE 754
    Double,
}

impl PrimitiveKind {
    /// Returns `true` for every primitive except `boolean`.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean)
    }

    /// Returns `true` for `byte`, `short`, `char`, `int` and `long`.
    #[must_use]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Char
                | PrimitiveKind::Int
                | PrimitiveKind::Long
        )
    }

    /// Position of a numeric type in the promotion order, `None` for `boolean`.
    ///
    /// `byte`, `short` and `char` share rank 0 because all of them promote to `int`.
    const fn rank(self) -> Option<u8> {
        match self {
            PrimitiveKind::Boolean => None,
            PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char => Some(0),
            PrimitiveKind::Int => Some(1),
            PrimitiveKind::Long => Some(2),
            PrimitiveKind::Float => Some(3),
            PrimitiveKind::Double => Some(4),
        }
    }

    /// Returns `true` if a widening primitive conversion from `self` to `target` exists.
    ///
    /// The identity conversion is not a widening conversion, so `Int.widens_to(Int)` is
    /// `false`.
    ///
    /// # Arguments
    ///
    /// * `target` - The destination type
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use flowscope::types::PrimitiveKind;
    ///
    /// assert!(PrimitiveKind::Byte.widens_to(PrimitiveKind::Short));
    /// assert!(!PrimitiveKind::Char.widens_to(PrimitiveKind::Short));
    /// assert!(PrimitiveKind::Long.widens_to(PrimitiveKind::Float));
    /// ```
    #[must_use]
    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        use PrimitiveKind::{Byte, Char, Double, Float, Int, Long, Short};

        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            _ => false,
        }
    }

    /// The result type of unary numeric promotion: `byte`, `short` and `char` become `int`.
    #[must_use]
    pub fn unary_promotion(self) -> PrimitiveKind {
        match self {
            PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char => {
                PrimitiveKind::Int
            }
            other => other,
        }
    }

    /// The result type of binary numeric promotion of `self` and `other`.
    ///
    /// Returns `None` if either operand is `boolean`.
    #[must_use]
    pub fn binary_promotion(self, other: PrimitiveKind) -> Option<PrimitiveKind> {
        let rank = self.rank()?.max(other.rank()?);
        Some(match rank {
            0 | 1 => PrimitiveKind::Int,
            2 => PrimitiveKind::Long,
            3 => PrimitiveKind::Float,
            _ => PrimitiveKind::Double,
        })
    }

    /// Fully qualified name of the wrapper class used for boxing.
    #[must_use]
    pub const fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "java.lang.Boolean",
            PrimitiveKind::Byte => "java.lang.Byte",
            PrimitiveKind::Short => "java.lang.Short",
            PrimitiveKind::Char => "java.lang.Character",
            PrimitiveKind::Int => "java.lang.Integer",
            PrimitiveKind::Long => "java.lang.Long",
            PrimitiveKind::Float => "java.lang.Float",
            PrimitiveKind::Double => "java.lang.Double",
        }
    }

    /// Inverse of [`PrimitiveKind::boxed_name`].
    #[must_use]
    pub fn from_boxed_name(name: &str) -> Option<PrimitiveKind> {
        Some(match name {
            "java.lang.Boolean" => PrimitiveKind::Boolean,
            "java.lang.Byte" => PrimitiveKind::Byte,
            "java.lang.Short" => PrimitiveKind::Short,
            "java.lang.Character" => PrimitiveKind::Char,
            "java.lang.Integer" => PrimitiveKind::Int,
            "java.lang.Long" => PrimitiveKind::Long,
            "java.lang.Float" => PrimitiveKind::Float,
            "java.lang.Double" => PrimitiveKind::Double,
            _ => return None,
        })
    }

    /// Name of the instance method that unboxes a wrapper into this primitive,
    /// e.g. `intValue`.
    #[must_use]
    pub const fn unboxing_method(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "booleanValue",
            PrimitiveKind::Byte => "byteValue",
            PrimitiveKind::Short => "shortValue",
            PrimitiveKind::Char => "charValue",
            PrimitiveKind::Int => "intValue",
            PrimitiveKind::Long => "longValue",
            PrimitiveKind::Float => "floatValue",
            PrimitiveKind::Double => "doubleValue",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_widening_is_irreflexive() {
        for kind in PrimitiveKind::iter() {
            assert!(!kind.widens_to(kind), "{kind} must not widen to itself");
        }
    }

    #[test]
    fn test_widening_table() {
        assert!(PrimitiveKind::Byte.widens_to(PrimitiveKind::Int));
        assert!(PrimitiveKind::Char.widens_to(PrimitiveKind::Int));
        assert!(!PrimitiveKind::Char.widens_to(PrimitiveKind::Short));
        assert!(!PrimitiveKind::Short.widens_to(PrimitiveKind::Char));
        assert!(PrimitiveKind::Long.widens_to(PrimitiveKind::Double));
        assert!(!PrimitiveKind::Double.widens_to(PrimitiveKind::Float));
        assert!(!PrimitiveKind::Boolean.widens_to(PrimitiveKind::Int));
    }

    #[test]
    fn test_binary_promotion() {
        assert_eq!(
            PrimitiveKind::Byte.binary_promotion(PrimitiveKind::Char),
            Some(PrimitiveKind::Int)
        );
        assert_eq!(
            PrimitiveKind::Int.binary_promotion(PrimitiveKind::Long),
            Some(PrimitiveKind::Long)
        );
        assert_eq!(
            PrimitiveKind::Long.binary_promotion(PrimitiveKind::Float),
            Some(PrimitiveKind::Float)
        );
        assert_eq!(
            PrimitiveKind::Boolean.binary_promotion(PrimitiveKind::Int),
            None
        );
    }

    #[test]
    fn test_boxed_names_round_trip() {
        for kind in PrimitiveKind::iter() {
            assert_eq!(PrimitiveKind::from_boxed_name(kind.boxed_name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_boxed_name("java.lang.String"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(PrimitiveKind::Double.to_string(), "double");
        let name: &'static str = PrimitiveKind::Char.into();
        assert_eq!(name, "char");
    }
}

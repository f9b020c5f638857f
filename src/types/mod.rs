//! Type model and the type-query interface used during translation.
//!
//! The builder never resolves names or infers types itself. Every expression of the input
//! tree carries a resolved [`Type`], and questions that need knowledge about declared classes
//! (is `A` a subclass of `B`? is `java.lang.OutOfMemoryError` on the class path?) are answered
//! by a [`TypeHierarchy`] implementation supplied by the caller.
//!
//! # Key Components
//!
//! - [`Type`] - Structural description of a source-level type
//! - [`PrimitiveKind`] - Primitive types with promotion and boxing rules
//! - [`TypeHierarchy`] - Subtype queries and well-known type lookup
//! - [`WellKnownType`] - Platform types used for implicit exception edges
//! - [`ClassHierarchy`] - A map-backed [`TypeHierarchy`] preloaded with platform classes

mod hierarchy;
mod primitive;

pub use hierarchy::ClassHierarchy;
pub use primitive::PrimitiveKind;

use std::{fmt, sync::Arc};

use strum::{EnumCount, EnumIter, IntoStaticStr};

/// Fully qualified name of the root class.
pub const OBJECT: &str = "java.lang.Object";

/// Fully qualified name of the string class.
pub const STRING: &str = "java.lang.String";

/// A resolved source-level type.
///
/// Class types are identified by their fully qualified name. Generic arguments are not
/// modelled: they never influence the shape of the control flow graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// A primitive type such as `int`.
    Primitive(PrimitiveKind),
    /// A class or interface type, by fully qualified name.
    Class(Arc<str>),
    /// An array with the given component type.
    Array(Box<Type>),
    /// A type variable and its upper bound.
    TypeVar {
        /// Name of the variable, e.g. `E`.
        name: Arc<str>,
        /// Upper bound, `java.lang.Object` if none was declared.
        bound: Box<Type>,
    },
    /// The alternatives of a multi-catch parameter.
    Union(Vec<Type>),
    /// The type of the `null` literal.
    Null,
    /// The return type of methods that return nothing.
    Void,
}

impl Type {
    /// Shorthand for `Type::Primitive(PrimitiveKind::Boolean)`.
    #[must_use]
    pub const fn boolean() -> Type {
        Type::Primitive(PrimitiveKind::Boolean)
    }

    /// Shorthand for `Type::Primitive(PrimitiveKind::Int)`.
    #[must_use]
    pub const fn int() -> Type {
        Type::Primitive(PrimitiveKind::Int)
    }

    /// Shorthand for `Type::Primitive(PrimitiveKind::Long)`.
    #[must_use]
    pub const fn long() -> Type {
        Type::Primitive(PrimitiveKind::Long)
    }

    /// Shorthand for `Type::Primitive(PrimitiveKind::Double)`.
    #[must_use]
    pub const fn double() -> Type {
        Type::Primitive(PrimitiveKind::Double)
    }

    /// Shorthand for `Type::Primitive(PrimitiveKind::Char)`.
    #[must_use]
    pub const fn char() -> Type {
        Type::Primitive(PrimitiveKind::Char)
    }

    /// A class type with the given fully qualified name.
    #[must_use]
    pub fn class(name: &str) -> Type {
        Type::Class(Arc::from(name))
    }

    /// `java.lang.Object`
    #[must_use]
    pub fn object() -> Type {
        Type::class(OBJECT)
    }

    /// `java.lang.String`
    #[must_use]
    pub fn string() -> Type {
        Type::class(STRING)
    }

    /// An array type with component type `component`.
    #[must_use]
    pub fn array_of(component: Type) -> Type {
        Type::Array(Box::new(component))
    }

    /// The wrapper class of a primitive, e.g. `java.lang.Integer` for `int`.
    #[must_use]
    pub fn boxed(kind: PrimitiveKind) -> Type {
        Type::class(kind.boxed_name())
    }

    /// Returns the primitive kind if this is a primitive type.
    #[must_use]
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Returns the primitive this type unboxes to if it is a wrapper class.
    #[must_use]
    pub fn unboxed(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Class(name) => PrimitiveKind::from_boxed_name(name),
            _ => None,
        }
    }

    /// The primitive kind of this type, looking through wrapper classes.
    #[must_use]
    pub fn primitive_or_unboxed(&self) -> Option<PrimitiveKind> {
        self.as_primitive().or_else(|| self.unboxed())
    }

    /// Returns `true` for primitive types.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// Returns `true` for wrapper classes of primitives.
    #[must_use]
    pub fn is_boxed(&self) -> bool {
        self.unboxed().is_some()
    }

    /// Returns `true` for types whose values are references (including `null`).
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Class(_) | Type::Array(_) | Type::TypeVar { .. } | Type::Union(_) | Type::Null
        )
    }

    /// Returns `true` for primitive numeric types.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.as_primitive().is_some_and(PrimitiveKind::is_numeric)
    }

    /// Returns `true` for primitive numeric types and their wrappers.
    #[must_use]
    pub fn is_numeric_or_boxed(&self) -> bool {
        self.primitive_or_unboxed()
            .is_some_and(PrimitiveKind::is_numeric)
    }

    /// Returns `true` for primitive integral types.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        self.as_primitive().is_some_and(PrimitiveKind::is_integral)
    }

    /// Returns `true` for `boolean` and `java.lang.Boolean`.
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.primitive_or_unboxed() == Some(PrimitiveKind::Boolean)
    }

    /// Returns `true` for `java.lang.String`.
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Type::Class(name) if &**name == STRING)
    }

    /// Returns `true` for array types.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    /// The component type of an array type.
    #[must_use]
    pub fn component(&self) -> Option<&Type> {
        match self {
            Type::Array(component) => Some(component),
            _ => None,
        }
    }

    /// Follows type variable bounds until a non-variable type is reached.
    #[must_use]
    pub fn upper_bound(&self) -> &Type {
        let mut current = self;
        while let Type::TypeVar { bound, .. } = current {
            current = bound;
        }
        current
    }

    /// The class name if this is a class type.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Type::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(kind) => write!(f, "{kind}"),
            Type::Class(name) => write!(f, "{name}"),
            Type::Array(component) => write!(f, "{component}[]"),
            Type::TypeVar { name, .. } => write!(f, "{name}"),
            Type::Union(alternatives) => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{alternative}")?;
                }
                Ok(())
            }
            Type::Null => write!(f, "null"),
            Type::Void => write!(f, "void"),
        }
    }
}

impl From<PrimitiveKind> for Type {
    fn from(kind: PrimitiveKind) -> Self {
        Type::Primitive(kind)
    }
}

/// Platform types the builder refers to without seeing them in the input tree.
///
/// They are the causes of implicit exception edges (a division may throw
/// `ArithmeticException`, evaluating a class name may throw `NoClassDefFoundError`, ...)
/// plus a handful of library types needed to desugar enhanced `for` loops and string
/// conversions. A [`TypeHierarchy`] may report any of them as absent, in which case the
/// corresponding edge is omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
pub enum WellKnownType {
    /// `java.lang.ArithmeticException`
    ArithmeticException,
    /// `java.lang.ArrayIndexOutOfBoundsException`
    ArrayIndexOutOfBoundsException,
    /// `java.lang.AssertionError`
    AssertionError,
    /// `java.lang.ClassCastException`
    ClassCastException,
    /// `java.lang.NegativeArraySizeException`
    NegativeArraySizeException,
    /// `java.lang.NullPointerException`
    NullPointerException,
    /// `java.lang.OutOfMemoryError`
    OutOfMemoryError,
    /// `java.lang.ClassCircularityError`
    ClassCircularityError,
    /// `java.lang.ClassFormatError`
    ClassFormatError,
    /// `java.lang.NoClassDefFoundError`
    NoClassDefFoundError,
    /// `java.lang.String`
    String,
    /// `java.lang.Throwable`
    Throwable,
    /// `java.lang.RuntimeException`
    RuntimeException,
    /// `java.lang.Error`
    Error,
    /// `java.lang.Iterable`
    Iterable,
    /// `java.util.Iterator`
    Iterator,
}

impl WellKnownType {
    /// Fully qualified class name of the well-known type.
    #[must_use]
    pub const fn class_name(self) -> &'static str {
        match self {
            WellKnownType::ArithmeticException => "java.lang.ArithmeticException",
            WellKnownType::ArrayIndexOutOfBoundsException => {
                "java.lang.ArrayIndexOutOfBoundsException"
            }
            WellKnownType::AssertionError => "java.lang.AssertionError",
            WellKnownType::ClassCastException => "java.lang.ClassCastException",
            WellKnownType::NegativeArraySizeException => "java.lang.NegativeArraySizeException",
            WellKnownType::NullPointerException => "java.lang.NullPointerException",
            WellKnownType::OutOfMemoryError => "java.lang.OutOfMemoryError",
            WellKnownType::ClassCircularityError => "java.lang.ClassCircularityError",
            WellKnownType::ClassFormatError => "java.lang.ClassFormatError",
            WellKnownType::NoClassDefFoundError => "java.lang.NoClassDefFoundError",
            WellKnownType::String => STRING,
            WellKnownType::Throwable => "java.lang.Throwable",
            WellKnownType::RuntimeException => "java.lang.RuntimeException",
            WellKnownType::Error => "java.lang.Error",
            WellKnownType::Iterable => "java.lang.Iterable",
            WellKnownType::Iterator => "java.util.Iterator",
        }
    }
}

/// Type queries the builder needs from the front end.
///
/// Implementors provide the nominal part of the subtype relation (which class extends or
/// implements which) and the set of classes that exist. The structural rules on top of that,
/// such as primitive widening, arrays, `null`, type variable bounds and union alternatives,
/// are provided by the default methods and rarely need to be overridden.
///
/// The trait requires [`Sync`] so that one hierarchy can be shared by parallel builds.
pub trait TypeHierarchy: Sync {
    /// Returns `true` if class `sub` is `sup` or (transitively) extends or implements it.
    fn is_subclass(&self, sub: &str, sup: &str) -> bool;

    /// Returns `true` if a class with the given fully qualified name is known.
    fn is_declared(&self, name: &str) -> bool;

    /// Returns `true` if `sub` is a subtype of `sup`.
    ///
    /// # Arguments
    ///
    /// * `sub` - The candidate subtype
    /// * `sup` - The candidate supertype
    fn is_subtype(&self, sub: &Type, sup: &Type) -> bool {
        if sub == sup {
            return true;
        }

        match (sub, sup) {
            (_, Type::Union(alternatives)) => alternatives.iter().any(|alt| self.is_subtype(sub, alt)),
            (Type::Union(alternatives), _) => alternatives.iter().all(|alt| self.is_subtype(alt, sup)),
            (Type::TypeVar { bound, .. }, _) => self.is_subtype(bound, sup),
            (Type::Primitive(from), Type::Primitive(to)) => from.widens_to(*to),
            (Type::Null, sup) => sup.is_reference(),
            (Type::Class(_) | Type::Array(_), Type::Class(name)) if &**name == OBJECT => true,
            (Type::Class(sub), Type::Class(sup)) => self.is_subclass(sub, sup),
            (Type::Array(_), Type::Class(name)) => {
                matches!(&**name, "java.lang.Cloneable" | "java.io.Serializable")
            }
            (Type::Array(sub), Type::Array(sup)) => {
                if sub.is_primitive() || sup.is_primitive() {
                    sub == sup
                } else {
                    self.is_subtype(sub, sup)
                }
            }
            _ => false,
        }
    }

    /// Returns `true` if a value of type `from` may be assigned to a variable of type `to`
    /// without an explicit cast, allowing boxing and unboxing.
    fn is_assignable(&self, from: &Type, to: &Type) -> bool {
        if self.is_subtype(from, to) {
            return true;
        }
        if let Some(kind) = from.as_primitive() {
            return to.is_reference() && self.is_subtype(&Type::boxed(kind), to);
        }
        if let Some(kind) = from.unboxed() {
            return to
                .as_primitive()
                .is_some_and(|target| target == kind || kind.widens_to(target));
        }
        false
    }

    /// Returns the well-known type if the hierarchy knows it.
    fn well_known(&self, known: WellKnownType) -> Option<Type> {
        let name = known.class_name();
        self.is_declared(name).then(|| Type::class(name))
    }
}

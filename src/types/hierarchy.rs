use rustc_hash::{FxHashMap, FxHashSet};

use crate::types::{TypeHierarchy, OBJECT};

/// A [`TypeHierarchy`] backed by a map from class names to their direct supertypes.
///
/// Classes are declared with [`ClassHierarchy::declare`]. Subclass queries walk the
/// declared supertypes transitively. Every declared class is implicitly a subclass of
/// `java.lang.Object`.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::types::{ClassHierarchy, TypeHierarchy};
///
/// let mut hierarchy = ClassHierarchy::with_java_lang();
/// hierarchy.declare("com.example.MyException", &["java.lang.RuntimeException"]);
///
/// assert!(hierarchy.is_subclass("com.example.MyException", "java.lang.Throwable"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClassHierarchy {
    supers: FxHashMap<String, Vec<String>>,
}

impl ClassHierarchy {
    /// Creates an empty hierarchy. Not even `java.lang.Object` is declared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hierarchy preloaded with the platform classes the builder refers to.
    #[must_use]
    pub fn with_java_lang() -> Self {
        let mut hierarchy = Self::new();

        hierarchy.declare(OBJECT, &[]);
        hierarchy.declare("java.io.Serializable", &[]);
        hierarchy.declare("java.lang.Cloneable", &[]);
        hierarchy.declare("java.lang.AutoCloseable", &[]);
        hierarchy.declare("java.io.Closeable", &["java.lang.AutoCloseable"]);
        hierarchy.declare("java.lang.Comparable", &[]);
        hierarchy.declare("java.lang.CharSequence", &[]);
        hierarchy.declare("java.lang.Iterable", &[]);
        hierarchy.declare("java.util.Iterator", &[]);
        hierarchy.declare(
            "java.lang.String",
            &[
                "java.io.Serializable",
                "java.lang.Comparable",
                "java.lang.CharSequence",
            ],
        );

        hierarchy.declare("java.lang.Number", &["java.io.Serializable"]);
        for boxed in [
            "java.lang.Byte",
            "java.lang.Short",
            "java.lang.Integer",
            "java.lang.Long",
            "java.lang.Float",
            "java.lang.Double",
        ] {
            hierarchy.declare(boxed, &["java.lang.Number", "java.lang.Comparable"]);
        }
        hierarchy.declare(
            "java.lang.Boolean",
            &["java.io.Serializable", "java.lang.Comparable"],
        );
        hierarchy.declare(
            "java.lang.Character",
            &["java.io.Serializable", "java.lang.Comparable"],
        );

        hierarchy.declare("java.lang.Throwable", &["java.io.Serializable"]);
        hierarchy.declare("java.lang.Exception", &["java.lang.Throwable"]);
        hierarchy.declare("java.lang.Error", &["java.lang.Throwable"]);
        hierarchy.declare("java.io.IOException", &["java.lang.Exception"]);
        hierarchy.declare("java.lang.RuntimeException", &["java.lang.Exception"]);

        for unchecked in [
            "java.lang.ArithmeticException",
            "java.lang.ClassCastException",
            "java.lang.NegativeArraySizeException",
            "java.lang.NullPointerException",
            "java.lang.IndexOutOfBoundsException",
            "java.lang.IllegalStateException",
            "java.lang.IllegalArgumentException",
        ] {
            hierarchy.declare(unchecked, &["java.lang.RuntimeException"]);
        }
        hierarchy.declare(
            "java.lang.ArrayIndexOutOfBoundsException",
            &["java.lang.IndexOutOfBoundsException"],
        );

        hierarchy.declare("java.lang.AssertionError", &["java.lang.Error"]);
        hierarchy.declare("java.lang.VirtualMachineError", &["java.lang.Error"]);
        hierarchy.declare("java.lang.OutOfMemoryError", &["java.lang.VirtualMachineError"]);
        hierarchy.declare("java.lang.LinkageError", &["java.lang.Error"]);
        hierarchy.declare("java.lang.ClassCircularityError", &["java.lang.LinkageError"]);
        hierarchy.declare("java.lang.ClassFormatError", &["java.lang.LinkageError"]);
        hierarchy.declare("java.lang.NoClassDefFoundError", &["java.lang.LinkageError"]);

        hierarchy
    }

    /// Declares a class and its direct supertypes.
    ///
    /// Declaring an already known class replaces its supertypes. Supertypes do not need to
    /// be declared beforehand.
    ///
    /// # Arguments
    ///
    /// * `name` - Fully qualified name of the class
    /// * `supers` - Fully qualified names of the direct superclass and interfaces
    pub fn declare(&mut self, name: &str, supers: &[&str]) -> &mut Self {
        self.supers.insert(
            name.to_string(),
            supers.iter().map(|s| (*s).to_string()).collect(),
        );
        self
    }

    /// Number of declared classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.supers.len()
    }

    /// Returns `true` if no class has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.supers.is_empty()
    }
}

impl TypeHierarchy for ClassHierarchy {
    fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        if sub == sup || sup == OBJECT {
            return true;
        }

        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut stack = vec![sub];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(supers) = self.supers.get(current) {
                for parent in supers {
                    if parent == sup {
                        return true;
                    }
                    stack.push(parent);
                }
            }
        }

        false
    }

    fn is_declared(&self, name: &str) -> bool {
        self.supers.contains_key(name)
    }
}

use thiserror::Error;

macro_rules! internal_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Internal {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Internal {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Building a control flow graph assumes a well-formed, fully resolved input tree. Every
/// variant of this enum therefore describes a broken contract between the front end that
/// produced the tree and the builder, or a bug in the builder itself. None of them is meant
/// to be shown to the author of the analysed source code.
///
/// # Error Categories
///
/// ## Translation Errors
/// - [`Error::Internal`] - Broken internal invariant, with source location
/// - [`Error::UnexpectedTree`] - Tree shape that cannot occur in a checked program
/// - [`Error::RecursionLimit`] - Maximum nesting depth exceeded
///
/// ## Label Errors
/// - [`Error::LabelRebound`] - A label was bound to two sequence positions
/// - [`Error::UnboundLabel`] - A jump targets a label that was never bound
///
/// ## Graph Errors
/// - [`Error::GraphError`] - A structural check of the finished graph failed
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::{Error, prelude::*};
///
/// match CfgBuilder::new(&hierarchy).build(UnderlyingAst::method(&method, &class)) {
///     Ok(cfg) => println!("{} blocks", cfg.blocks().len()),
///     Err(Error::Internal { message, file, line }) => {
///         eprintln!("builder bug: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Translation errors
    /// An internal invariant of the builder was violated.
    ///
    /// This covers conditions such as a conditional jump whose condition is not of
    /// boolean type, a `break` without an enclosing target, or reading a label cell
    /// that was never filled. The error includes the source location where the
    /// violation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the violated invariant
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Internal - {file}:{line}: {message}")]
    Internal {
        /// The message to be printed for the Internal error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The input tree contains a construct that cannot appear in a type-checked body.
    ///
    /// Examples are a `yield` outside of a switch expression, or a compound
    /// assignment with an operator that has no compound form.
    #[error("Unexpected tree: {0}")]
    UnexpectedTree(String),

    /// The nesting depth of the input tree exceeded the configured limit.
    ///
    /// The translation of expressions and statements is recursive. The limit set in
    /// [`crate::BuilderOptions::max_depth`] keeps pathological inputs from exhausting
    /// the stack. The associated value is the limit that was hit.
    #[error("Reached the maximum nesting depth allowed - {0}")]
    RecursionLimit(usize),

    // Label errors
    /// A label was bound to a second position in the node sequence.
    ///
    /// Labels are write-once. The associated value is the label's name.
    #[error("Label {0} is already bound")]
    LabelRebound(String),

    /// A jump or exceptional edge refers to a label that was never bound.
    ///
    /// The associated value is the label's name.
    #[error("Label {0} is referenced but never bound")]
    UnboundLabel(String),

    // Graph errors
    /// A structural check of a control flow graph failed.
    ///
    /// Produced by [`crate::ControlFlowGraph::check_invariants`] when, for example,
    /// a predecessor set no longer mirrors the successor edges.
    #[error("{0}")]
    GraphError(String),
}

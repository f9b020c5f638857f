//! Exception scopes of the statement being translated.

use crate::{
    analysis::cfg::builder::label::Label,
    types::{Type, TypeHierarchy},
};

/// One enclosing try statement, as seen by an operation that may throw.
#[derive(Debug, Clone)]
pub enum TryFrame {
    /// The catch clauses of a try statement, in source order. A caught type may be a
    /// union of alternatives.
    Catch(Vec<(Type, Label)>),
    /// A finally block. Every exception passes through it.
    Finally(Label),
}

impl TryFrame {
    /// Adds the labels this frame may route `thrown` to and returns `true` if the frame
    /// certainly handles it.
    fn possible_labels(
        &self,
        thrown: &Type,
        hierarchy: &dyn TypeHierarchy,
        labels: &mut Vec<Label>,
    ) -> bool {
        match self {
            TryFrame::Finally(label) => {
                push_unique(labels, label);
                true
            }
            TryFrame::Catch(clauses) => {
                let thrown = thrown.upper_bound();
                for (caught, label) in clauses {
                    let alternatives = match caught {
                        Type::Union(alternatives) => alternatives.as_slice(),
                        single => std::slice::from_ref(single),
                    };

                    let mut may_apply = false;
                    for alternative in alternatives {
                        if hierarchy.is_subtype(thrown, alternative) {
                            push_unique(labels, label);
                            return true;
                        }
                        if hierarchy.is_subtype(alternative, thrown) {
                            may_apply = true;
                        }
                    }
                    if may_apply {
                        push_unique(labels, label);
                    }
                }
                false
            }
        }
    }
}

fn push_unique(labels: &mut Vec<Label>, label: &Label) {
    if !labels.contains(label) {
        labels.push(label.clone());
    }
}

/// The stack of try frames enclosing the current position, innermost last.
#[derive(Debug, Clone)]
pub struct TryStack {
    frames: Vec<TryFrame>,
    exceptional_exit: Label,
}

impl TryStack {
    /// Creates an empty stack whose uncaught exceptions go to `exceptional_exit`.
    #[must_use]
    pub fn new(exceptional_exit: Label) -> Self {
        TryStack {
            frames: Vec::new(),
            exceptional_exit,
        }
    }

    /// Enters a try frame.
    pub fn push(&mut self, frame: TryFrame) {
        self.frames.push(frame);
    }

    /// Leaves the innermost try frame.
    pub fn pop(&mut self) -> Option<TryFrame> {
        self.frames.pop()
    }

    /// Number of enclosing frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Computes where an exception of type `thrown` may go.
    ///
    /// Frames are consulted from the innermost outwards. A catch clause whose type is a
    /// supertype of `thrown` certainly handles it and ends the walk; a clause whose type is
    /// a subtype of `thrown` may handle it and is added without ending the walk. A finally
    /// frame always ends the walk, since the copy of the finally block rethrows into the
    /// outer frames. If no frame ends the walk, the exceptional exit is added.
    ///
    /// Returns the labels in the order they were found, and whether a frame certainly
    /// handles the exception.
    #[must_use]
    pub fn possible_labels(
        &self,
        thrown: &Type,
        hierarchy: &dyn TypeHierarchy,
    ) -> (Vec<Label>, bool) {
        let mut labels = Vec::new();
        for frame in self.frames.iter().rev() {
            if frame.possible_labels(thrown, hierarchy, &mut labels) {
                return (labels, true);
            }
        }
        push_unique(&mut labels, &self.exceptional_exit);
        (labels, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClassHierarchy;

    const IO: &str = "java.io.IOException";
    const FNF: &str = "java.io.FileNotFoundException";
    const NPE: &str = "java.lang.NullPointerException";

    fn hierarchy() -> ClassHierarchy {
        let mut hierarchy = ClassHierarchy::with_java_lang();
        hierarchy.declare(FNF, &[IO]);
        hierarchy
    }

    #[test]
    fn test_uncaught_goes_to_exit() {
        let hierarchy = hierarchy();
        let exit = Label::new();
        let stack = TryStack::new(exit.clone());

        let (labels, caught) = stack.possible_labels(&Type::class(NPE), &hierarchy);
        assert_eq!(labels, vec![exit]);
        assert!(!caught);
    }

    #[test]
    fn test_catch_supertype_stops_walk() {
        let hierarchy = hierarchy();
        let exit = Label::new();
        let handler = Label::new();
        let mut stack = TryStack::new(exit);
        stack.push(TryFrame::Catch(vec![(Type::class(IO), handler.clone())]));

        let (labels, caught) = stack.possible_labels(&Type::class(FNF), &hierarchy);
        assert_eq!(labels, vec![handler]);
        assert!(caught);
    }

    #[test]
    fn test_catch_subtype_is_speculative() {
        let hierarchy = hierarchy();
        let exit = Label::new();
        let handler = Label::new();
        let mut stack = TryStack::new(exit.clone());
        stack.push(TryFrame::Catch(vec![(Type::class(FNF), handler.clone())]));

        let (labels, caught) = stack.possible_labels(&Type::class(IO), &hierarchy);
        assert_eq!(labels, vec![handler, exit]);
        assert!(!caught);
    }

    #[test]
    fn test_unrelated_catch_is_skipped() {
        let hierarchy = hierarchy();
        let exit = Label::new();
        let mut stack = TryStack::new(exit.clone());
        stack.push(TryFrame::Catch(vec![(Type::class(IO), Label::new())]));

        let (labels, _) = stack.possible_labels(&Type::class(NPE), &hierarchy);
        assert_eq!(labels, vec![exit]);
    }

    #[test]
    fn test_union_alternative_matches() {
        let hierarchy = hierarchy();
        let handler = Label::new();
        let mut stack = TryStack::new(Label::new());
        stack.push(TryFrame::Catch(vec![(
            Type::Union(vec![Type::class(IO), Type::class(NPE)]),
            handler.clone(),
        )]));

        let (labels, caught) = stack.possible_labels(&Type::class(NPE), &hierarchy);
        assert_eq!(labels, vec![handler]);
        assert!(caught);
    }

    #[test]
    fn test_finally_frame_stops_walk() {
        let hierarchy = hierarchy();
        let outer = Label::new();
        let finally = Label::new();
        let mut stack = TryStack::new(Label::new());
        stack.push(TryFrame::Catch(vec![(Type::class(NPE), outer)]));
        stack.push(TryFrame::Finally(finally.clone()));

        let (labels, caught) = stack.possible_labels(&Type::class(NPE), &hierarchy);
        assert_eq!(labels, vec![finally]);
        assert!(caught);
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_type_variable_uses_bound() {
        let hierarchy = hierarchy();
        let handler = Label::new();
        let mut stack = TryStack::new(Label::new());
        stack.push(TryFrame::Catch(vec![(Type::class(IO), handler.clone())]));

        let thrown = Type::TypeVar {
            name: "E".into(),
            bound: Box::new(Type::class(FNF)),
        };
        let (labels, caught) = stack.possible_labels(&thrown, &hierarchy);
        assert_eq!(labels, vec![handler]);
        assert!(caught);
    }
}

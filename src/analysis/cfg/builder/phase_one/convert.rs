//! Implicit conversions.
//!
//! Every conversion takes the node of an already emitted operand and returns the node
//! that holds the converted value, which is the operand itself if no conversion applies.
//! Conversion nodes are synthetic, carry the tree of their operand and are recorded in the
//! converted lookup only.

use std::sync::Arc;

use crate::{
    analysis::cfg::{Node, NodeId, NodeKind},
    ast::{Expr, MethodSig},
    types::{PrimitiveKind, Type, WellKnownType},
    Error, Result,
};

use super::PhaseOne;

impl<'ast> PhaseOne<'_, 'ast> {
    /// Boxes a primitive value: `Integer.valueOf(value)`.
    pub(super) fn box_value(&mut self, value: NodeId) -> NodeId {
        let ty = self.ty_of(value);
        let Some(kind) = ty.as_primitive() else {
            return value;
        };
        let boxed = Type::boxed(kind);
        let tree = self.tree_of(value);

        let class = self.insert_node_after(
            value,
            Node::synthetic(NodeKind::ClassName, boxed.clone(), None),
        );
        let method = Arc::new(
            MethodSig::new(boxed.clone(), "valueOf", vec![ty], boxed.clone()).with_static(),
        );
        let access = self.insert_node_after(
            class,
            Node::synthetic(
                NodeKind::MethodAccess {
                    receiver: class,
                    method,
                },
                boxed.clone(),
                None,
            ),
        );
        let causes = self.invocation_causes(&[]);
        self.insert_throwing_after(
            access,
            Node::synthetic(
                NodeKind::MethodInvocation {
                    target: access,
                    args: vec![value],
                },
                boxed,
                tree,
            ),
            causes,
        )
    }

    /// Unboxes a wrapper value: `value.intValue()`. The access throws on `null`.
    pub(super) fn unbox(&mut self, value: NodeId) -> NodeId {
        let ty = self.ty_of(value);
        let Some(kind) = ty.unboxed() else {
            return value;
        };
        let primitive = Type::Primitive(kind);
        let tree = self.tree_of(value);

        let method = Arc::new(MethodSig::new(
            ty,
            kind.unboxing_method(),
            Vec::new(),
            primitive.clone(),
        ));
        let npe = self.known_causes(&[WellKnownType::NullPointerException]);
        let access = self.insert_throwing_after(
            value,
            Node::synthetic(
                NodeKind::MethodAccess {
                    receiver: value,
                    method,
                },
                primitive.clone(),
                None,
            ),
            npe,
        );
        let causes = self.invocation_causes(&[]);
        self.insert_throwing_after(
            access,
            Node::synthetic(
                NodeKind::MethodInvocation {
                    target: access,
                    args: Vec::new(),
                },
                primitive,
                tree,
            ),
            causes,
        )
    }

    /// Widens a primitive value to `target` if that is a widening conversion.
    pub(super) fn widen(&mut self, value: NodeId, target: PrimitiveKind) -> NodeId {
        let widens = self
            .ty_of(value)
            .as_primitive()
            .is_some_and(|kind| kind.widens_to(target));
        if !widens {
            return value;
        }
        let tree = self.tree_of(value);
        self.insert_node_after(
            value,
            Node::synthetic(NodeKind::WideningConversion(value), target.into(), tree),
        )
    }

    /// Narrows a primitive value to `target` if that is a narrowing conversion.
    pub(super) fn narrow(&mut self, value: NodeId, target: PrimitiveKind) -> NodeId {
        let narrows = self
            .ty_of(value)
            .as_primitive()
            .is_some_and(|kind| target.widens_to(kind));
        if !narrows {
            return value;
        }
        let tree = self.tree_of(value);
        self.insert_node_after(
            value,
            Node::synthetic(NodeKind::NarrowingConversion(value), target.into(), tree),
        )
    }

    /// Narrows to the primitive of `target` and boxes if `target` is a wrapper class.
    pub(super) fn narrow_and_box(&mut self, value: NodeId, target: &Type) -> NodeId {
        if let Some(kind) = target.unboxed() {
            let narrowed = self.narrow(value, kind);
            self.box_value(narrowed)
        } else if let Some(kind) = target.as_primitive() {
            self.narrow(value, kind)
        } else {
            value
        }
    }

    /// Converts a value to `String` unless it already is one.
    pub(super) fn string_conversion(&mut self, value: NodeId) -> NodeId {
        if self.ty_of(value).is_string() {
            return value;
        }
        let tree = self.tree_of(value);
        self.insert_node_after(
            value,
            Node::synthetic(NodeKind::StringConversion(value), Type::string(), tree),
        )
    }

    /// Unary numeric promotion: unbox, then widen `byte`, `short` and `char` to `int`.
    pub(super) fn unary_promotion(&mut self, value: NodeId) -> NodeId {
        let value = self.unbox(value);
        match self.ty_of(value).as_primitive() {
            Some(PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char) => {
                self.widen(value, PrimitiveKind::Int)
            }
            _ => value,
        }
    }

    /// The type both operands of a numeric binary operator are promoted to.
    pub(super) fn binary_promoted_type(lhs: &Type, rhs: &Type) -> Result<PrimitiveKind> {
        lhs.primitive_or_unboxed()
            .zip(rhs.primitive_or_unboxed())
            .and_then(|(left, right)| left.binary_promotion(right))
            .ok_or_else(|| {
                Error::UnexpectedTree(format!("no numeric promotion for {lhs} and {rhs}"))
            })
    }

    /// Binary numeric promotion of one operand to `target`: unbox, then widen.
    pub(super) fn binary_promotion(&mut self, value: NodeId, target: PrimitiveKind) -> NodeId {
        let value = self.unbox(value);
        if self.ty_of(value) == Type::Primitive(target) {
            value
        } else {
            self.widen(value, target)
        }
    }

    /// Assignment conversion, which allows implicit narrowing of constants.
    pub(super) fn assign_convert(&mut self, value: NodeId, target: &Type) -> NodeId {
        self.common_convert(value, target, true)
    }

    /// Method invocation conversion, which never narrows.
    pub(super) fn method_invocation_convert(&mut self, value: NodeId, target: &Type) -> NodeId {
        self.common_convert(value, target, false)
    }

    /// Returns `true` if assigning `value` to `target` needs an implicit narrowing
    /// conversion, which is only allowed for constant expressions.
    fn requires_narrowing(&self, value: NodeId, target: &Type) -> bool {
        let small = matches!(
            target.primitive_or_unboxed(),
            Some(PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char)
        );
        let constant = self.nodes.get(value).is_some_and(|node| {
            matches!(&node.kind, NodeKind::Literal(literal) if *literal != crate::ast::Literal::Null)
        });
        small && constant
    }

    fn common_convert(&mut self, value: NodeId, target: &Type, allow_narrowing: bool) -> NodeId {
        let ty = self.ty_of(value);
        if ty == *target {
            return value;
        }
        let is_subtype = self.hierarchy.is_subtype(&ty, target);

        if ty.is_numeric() && target.is_numeric() && is_subtype {
            match target.as_primitive() {
                Some(kind) => self.widen(value, kind),
                None => value,
            }
        } else if ty.is_reference() && target.is_reference() && is_subtype {
            value
        } else if ty.is_primitive() && target.is_reference() {
            if allow_narrowing && self.requires_narrowing(value, target) {
                self.narrow_and_box(value, target)
            } else {
                self.box_value(value)
            }
        } else if ty.is_boxed() && target.is_primitive() {
            let unboxed = self.unbox(value);
            match target.as_primitive() {
                Some(kind) => self.widen(unboxed, kind),
                None => unboxed,
            }
        } else if ty.is_primitive() && target.is_primitive() {
            match target.as_primitive() {
                Some(kind) if allow_narrowing && self.requires_narrowing(value, target) => {
                    self.narrow(value, kind)
                }
                _ => value,
            }
        } else {
            value
        }
    }

    /// Promotes one branch of a conditional expression to the type of the expression.
    pub(super) fn conditional_promotion(&mut self, value: NodeId, target: &Type) -> NodeId {
        let ty = self.ty_of(value);
        if ty == *target {
            return value;
        }
        if ty.is_primitive() && target.is_boxed() {
            return self.box_value(value);
        }

        if let (Some(kind), Some(target_kind)) =
            (ty.primitive_or_unboxed(), target.primitive_or_unboxed())
        {
            if kind.is_numeric() && target_kind.is_numeric() {
                let Some(target_primitive) = target.as_primitive() else {
                    return value;
                };
                if kind == PrimitiveKind::Byte && target_primitive == PrimitiveKind::Short {
                    let value = self.unbox(value);
                    return self.widen(value, PrimitiveKind::Short);
                }
                if matches!(
                    target_primitive,
                    PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char
                ) {
                    if ty.is_boxed() {
                        return self.unbox(value);
                    }
                    if kind == PrimitiveKind::Int {
                        return self.narrow(value, target_primitive);
                    }
                }
                return self.binary_promotion(value, target_primitive);
            }
            if target.is_primitive() {
                return self.unbox(value);
            }
        }

        if ty.is_primitive() && target.is_reference() {
            return self.box_value(value);
        }
        value
    }

    /// Translates and converts the actual arguments of a call to `method`.
    ///
    /// Each argument is converted before the next one is translated. For a variable arity
    /// method the trailing arguments are collected into a synthetic array, unless a single
    /// trailing argument is already assignable to the array parameter.
    pub(super) fn call_arguments(
        &mut self,
        method: &MethodSig,
        args: &'ast [Expr],
    ) -> Result<Vec<NodeId>> {
        let formals = &method.params;
        let mut converted = Vec::with_capacity(args.len());

        let Some((array_ty, fixed)) = formals.split_last().filter(|_| method.is_varargs) else {
            if args.len() != formals.len() {
                return Err(Error::UnexpectedTree(format!(
                    "{} arguments for {} with {} parameters",
                    args.len(),
                    method.name,
                    formals.len()
                )));
            }
            for (arg, formal) in args.iter().zip(formals) {
                let value = self.expr(arg)?;
                converted.push(self.method_invocation_convert(value, formal));
            }
            return Ok(converted);
        };

        let passes_array = args.len() == formals.len()
            && args
                .last()
                .is_some_and(|last| self.hierarchy.is_assignable(&last.ty, array_ty));
        if passes_array {
            for (arg, formal) in args.iter().zip(formals) {
                let value = self.expr(arg)?;
                converted.push(self.method_invocation_convert(value, formal));
            }
            return Ok(converted);
        }

        if args.len() < fixed.len() {
            return Err(Error::UnexpectedTree(format!(
                "{} arguments for variable arity {} with {} fixed parameters",
                args.len(),
                method.name,
                fixed.len()
            )));
        }
        let (leading, trailing) = args.split_at(fixed.len());
        for (arg, formal) in leading.iter().zip(fixed) {
            let value = self.expr(arg)?;
            converted.push(self.method_invocation_convert(value, formal));
        }

        let element = array_ty.component().cloned().ok_or_else(|| {
            Error::UnexpectedTree(format!(
                "variable arity parameter of {} is not an array",
                method.name
            ))
        })?;
        let mut init = Vec::with_capacity(trailing.len());
        for arg in trailing {
            let value = self.expr(arg)?;
            init.push(self.assign_convert(value, &element));
        }
        converted.push(self.extend(Node::synthetic(
            NodeKind::ArrayCreation {
                dims: Vec::new(),
                init,
            },
            array_ty.clone(),
            None,
        )));
        Ok(converted)
    }
}

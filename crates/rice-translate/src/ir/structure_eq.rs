//! Structural equality for IR types.
//!
//! `structure_eq` compares IR trees ignoring "surface hints" - fields that
//! record how something was spelled but not what it means.
//!
//! # Hint Fields (normalized during comparison)
//!
//! - `Function::arrow` - `\x -> x` and `\x { return x }` are the same lambda
//!
//! # Core Fields (must match exactly)
//!
//! - All names, literal values, operators
//! - Program form
//! - Statement order and expression trees

use super::{Expr, Function, Program, Stmt};

/// Trait for structural equality comparison.
///
/// Unlike `PartialEq`, this ignores surface hint fields.
pub trait StructureEq {
    /// Compare two values for structural equality.
    fn structure_eq(&self, other: &Self) -> bool;
}

impl StructureEq for Program {
    fn structure_eq(&self, other: &Self) -> bool {
        self.form == other.form && vec_structure_eq(&self.body, &other.body)
    }
}

impl StructureEq for Stmt {
    fn structure_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Stmt::Let { name: n1, init: i1 }, Stmt::Let { name: n2, init: i2 }) => {
                n1 == n2 && i1.structure_eq(i2)
            }
            (Stmt::Return(a), Stmt::Return(b)) => a.structure_eq(b),
            (Stmt::Block(a), Stmt::Block(b)) => vec_structure_eq(a, b),
            (Stmt::Expr(a), Stmt::Expr(b)) => a.structure_eq(b),
            (Stmt::Function(a), Stmt::Function(b)) => a.structure_eq(b),
            _ => false,
        }
    }
}

impl StructureEq for Expr {
    fn structure_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::Literal(a), Expr::Literal(b)) => a == b,
            (Expr::Ident(a), Expr::Ident(b)) => a == b,

            (
                Expr::Binary {
                    left: l1,
                    op: o1,
                    right: r1,
                },
                Expr::Binary {
                    left: l2,
                    op: o2,
                    right: r2,
                },
            ) => o1 == o2 && l1.structure_eq(l2) && r1.structure_eq(r2),

            (
                Expr::Call {
                    callee: c1,
                    args: a1,
                },
                Expr::Call {
                    callee: c2,
                    args: a2,
                },
            ) => c1.structure_eq(c2) && vec_structure_eq(a1, a2),

            (
                Expr::MethodCall {
                    receiver: r1,
                    method: m1,
                    args: a1,
                },
                Expr::MethodCall {
                    receiver: r2,
                    method: m2,
                    args: a2,
                },
            ) => m1 == m2 && r1.structure_eq(r2) && vec_structure_eq(a1, a2),

            (
                Expr::Index {
                    object: o1,
                    index: i1,
                },
                Expr::Index {
                    object: o2,
                    index: i2,
                },
            ) => o1.structure_eq(o2) && i1.structure_eq(i2),

            (Expr::List(a), Expr::List(b)) => vec_structure_eq(a, b),
            (Expr::Lambda(a), Expr::Lambda(b)) => a.structure_eq(b),
            _ => false,
        }
    }
}

// Ignore `arrow` - it's a surface hint
impl StructureEq for Function {
    fn structure_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.params == other.params
            && vec_structure_eq(&self.body, &other.body)
    }
}

fn vec_structure_eq<T: StructureEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structure_eq(y))
}

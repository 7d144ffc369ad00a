//! Intermediate representation between the rice reader and the C++ writer.
//!
//! The tree mirrors the rice grammar one-to-one: it carries source names
//! unchanged and leaves all target-language decisions (renaming,
//! parenthesization, captures) to the writer.

mod structure_eq;

pub use structure_eq::StructureEq;

use crate::dialect::ProgramForm;
use serde::{Deserialize, Serialize};

/// A whole translation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub form: ProgramForm,
    /// Top-level `def`s in module form, ordinary statements in script form.
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn new(form: ProgramForm, body: Vec<Stmt>) -> Self {
        Self { form, body }
    }

    pub fn script(body: Vec<Stmt>) -> Self {
        Self::new(ProgramForm::Script, body)
    }

    pub fn module(body: Vec<Stmt>) -> Self {
        Self::new(ProgramForm::Module, body)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `var name = init`
    Let { name: String, init: Expr },
    Return(Expr),
    Block(Vec<Stmt>),
    Expr(Expr),
    /// `def name(params) { body }`
    Function(Function),
}

impl Stmt {
    pub fn let_decl(name: impl Into<String>, init: Expr) -> Self {
        Stmt::Let {
            name: name.into(),
            init,
        }
    }

    pub fn return_stmt(expr: Expr) -> Self {
        Stmt::Return(expr)
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Stmt::Block(stmts)
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Ident(String),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// `callee(args)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `receiver.method(args)`
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    /// `object[index]`
    Index { object: Box<Expr>, index: Box<Expr> },
    /// `[items]`
    List(Vec<Expr>),
    Lambda(Box<Function>),
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Literal(Literal::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Expr::Literal(Literal::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn method_call(receiver: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            receiver: Box::new(receiver),
            method: method.into(),
            args,
        }
    }

    pub fn index(object: Expr, index: Expr) -> Self {
        Expr::Index {
            object: Box::new(object),
            index: Box::new(index),
        }
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Expr::List(items)
    }

    pub fn lambda(function: Function) -> Self {
        Expr::Lambda(Box::new(function))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

/// A named `def` or an anonymous lambda (empty name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    /// Surface hint: written as `\params -> expr`. The body is then a single
    /// `Return`.
    pub arrow: bool,
}

impl Function {
    pub fn named(name: impl Into<String>, params: Vec<String>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            params,
            body,
            arrow: false,
        }
    }

    pub fn anonymous(params: Vec<String>, body: Vec<Stmt>) -> Self {
        Self::named(String::new(), params, body)
    }

    /// `\params -> expr`
    pub fn arrow(params: Vec<String>, expr: Expr) -> Self {
        Self {
            name: String::new(),
            params,
            body: vec![Stmt::Return(expr)],
            arrow: true,
        }
    }

    /// The returned expression of an arrow lambda.
    pub fn arrow_expr(&self) -> Option<&Expr> {
        match self.body.as_slice() {
            [Stmt::Return(expr)] if self.arrow => Some(expr),
            _ => None,
        }
    }
}

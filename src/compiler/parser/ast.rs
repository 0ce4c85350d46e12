//! Abstract syntax tree for type-checked Tack programs.
//!
//! The `Op` family is closed; the backend lowers it with an exhaustive
//! match. Every op carries the position of the token it was parsed from.

use std::fmt;

use crate::compiler::parser::types::{SigTy, Signature, Type};
use crate::error::Position;

/// A built-in stack operator with a fixed, possibly generic, signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Intrinsic {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    Neq,
    BwAnd,
    BwOr,
    Lsh,
    Rsh,
    /// Logical not; defined for every type as a compare-with-zero.
    Not,
    Neg,
    Dup,
    Drop,
    Swap,
    Rot,
    Over,
    /// Reinterpret the stack top as the given type. Emits no instruction;
    /// cross-width casts are an unchecked unsafety of the language.
    Cast(Type),
}

use SigTy::{Prim, Var};
use Type::{Bool, Int, Long, Ptr};

impl Intrinsic {
    /// The intrinsic's stack effect. Argument and return lists are written
    /// bottom-to-top (last element = stack top).
    pub const fn effect(self) -> (&'static [SigTy], &'static [SigTy]) {
        match self {
            Intrinsic::Add
            | Intrinsic::Sub
            | Intrinsic::Mul
            | Intrinsic::Div
            | Intrinsic::BwAnd
            | Intrinsic::BwOr
            | Intrinsic::Lsh
            | Intrinsic::Rsh => (&[Prim(Int), Prim(Int)], &[Prim(Int)]),
            Intrinsic::Lt
            | Intrinsic::Gt
            | Intrinsic::Lte
            | Intrinsic::Gte
            | Intrinsic::Eq
            | Intrinsic::Neq => (&[Prim(Int), Prim(Int)], &[Prim(Bool)]),
            Intrinsic::Not => (&[Var('a')], &[Var('a')]),
            Intrinsic::Neg => (&[Prim(Int)], &[Prim(Int)]),
            Intrinsic::Dup => (&[Var('a')], &[Var('a'), Var('a')]),
            Intrinsic::Drop => (&[Var('a')], &[]),
            Intrinsic::Swap => (&[Var('a'), Var('b')], &[Var('b'), Var('a')]),
            Intrinsic::Rot => (
                &[Var('a'), Var('b'), Var('c')],
                &[Var('b'), Var('c'), Var('a')],
            ),
            Intrinsic::Over => (&[Var('a'), Var('b')], &[Var('a'), Var('b'), Var('a')]),
            Intrinsic::Cast(Int) => (&[Var('a')], &[Prim(Int)]),
            Intrinsic::Cast(Bool) => (&[Var('a')], &[Prim(Bool)]),
            Intrinsic::Cast(Long) => (&[Var('a')], &[Prim(Long)]),
            Intrinsic::Cast(Ptr) => (&[Var('a')], &[Prim(Ptr)]),
        }
    }
}

impl fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intrinsic::Add => "+",
            Intrinsic::Sub => "-",
            Intrinsic::Mul => "*",
            Intrinsic::Div => "/",
            Intrinsic::Lt => "<",
            Intrinsic::Gt => ">",
            Intrinsic::Lte => "<=",
            Intrinsic::Gte => ">=",
            Intrinsic::Eq => "=",
            Intrinsic::Neq => "!=",
            Intrinsic::BwAnd => "&",
            Intrinsic::BwOr => "|",
            Intrinsic::Lsh => "<<",
            Intrinsic::Rsh => ">>",
            Intrinsic::Not => "not",
            Intrinsic::Neg => "neg",
            Intrinsic::Dup => "dup",
            Intrinsic::Drop => "drop",
            Intrinsic::Swap => "swap",
            Intrinsic::Rot => "rot",
            Intrinsic::Over => "over",
            Intrinsic::Cast(Int) => "int",
            Intrinsic::Cast(Bool) => "bool",
            Intrinsic::Cast(Long) => "long",
            Intrinsic::Cast(Ptr) => "ptr",
        };

        write!(f, "{name}")
    }
}

/// One operation of a function body.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Pushes an integer literal or a named constant's value.
    PushInt { value: i64, pos: Position },
    /// Pushes the address of a pooled string literal.
    PushStr { value: String, pos: Position },
    /// Applies a built-in operator.
    Intrinsic { kind: Intrinsic, pos: Position },
    /// Calls a user or extern function. The signature is resolved at the
    /// call site so the backend does not need the symbol tables.
    Call {
        name: String,
        args: Vec<Type>,
        rets: Vec<Type>,
        pos: Position,
    },
    /// `if ... end` or `if ... else ... end`. An empty `else_ops` means no
    /// else branch was written.
    If {
        then_ops: Vec<Op>,
        else_ops: Vec<Op>,
        pos: Position,
    },
}

impl Op {
    /// The source position the op was parsed from.
    pub fn pos(&self) -> &Position {
        match self {
            Op::PushInt { pos, .. }
            | Op::PushStr { pos, .. }
            | Op::Intrinsic { pos, .. }
            | Op::Call { pos, .. }
            | Op::If { pos, .. } => pos,
        }
    }
}

/// A function definition or declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub name: String,
    /// Signature as written. For defined functions it resolved during body
    /// checking; for externs it may contain names that never resolve (they
    /// only matter if the function is called).
    pub sig: Signature,
    pub body: Vec<Op>,
    pub is_extern: bool,
    pub pos: Position,
}

/// A top-level declaration of a translation unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// `const NAME <rpn-expr>`, already evaluated.
    Const {
        name: String,
        value: i64,
        pos: Position,
    },
    /// `func NAME ... do ... end` or `func NAME ... extern`.
    Func(FuncDef),
}

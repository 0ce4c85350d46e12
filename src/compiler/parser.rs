//! Syntax Analysis and Stack Type-Checking
//!
//! Compiler pass that parses a stream of tokens into an abstract syntax
//! tree. Parsing and type-checking are fused: while a function body is
//! consumed, its stack effect is symbolically executed against a
//! [`TypeStack`], so an op that would underflow or mismatch the runtime
//! stack is rejected at the token that introduces it.
//!
//! The pass also owns the two smaller front-end concerns that run at parse
//! time: the RPN evaluator for `const` expressions and the resolution of
//! `include` directives (nested parser activations over a shared scope,
//! de-duplicated by canonical path).

pub mod ast;
pub mod types;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::compiler::lexer::{Lexer, Token, TokenKind};
use crate::compiler::parser::ast::{FuncDef, Intrinsic, Item, Op};
use crate::compiler::parser::types::{SigTy, Signature, Type, TypeName, TypeStack};
use crate::error::{DriverError, ParseError, Position, Result, TypeError};

/// What a name at top level is bound to.
///
/// Constants and functions share one namespace; a later definition of the
/// same name silently replaces the earlier one (documented undefined
/// behavior of the language).
#[derive(Debug, Clone)]
enum Binding {
    Const(i64),
    Func(Signature),
}

/// Symbol state of one translation unit, shared by every include
/// activation below it.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: HashMap<String, Binding>,
    // Canonicalized paths already processed; re-includes are no-ops, which
    // also terminates include cycles.
    include_history: HashSet<PathBuf>,
    include_dirs: Vec<PathBuf>,
}

impl Scope {
    fn new(include_dirs: Vec<PathBuf>) -> Self {
        Scope {
            include_dirs,
            ..Default::default()
        }
    }
}

/// Parses the translation unit rooted at `path`, resolving includes
/// against `include_dirs`, and returns its top-level items in flattened
/// source order.
pub fn parse_program(path: &Path, include_dirs: &[PathBuf]) -> Result<Vec<Item>> {
    let mut scope = Scope::new(include_dirs.to_vec());

    if let Ok(canonical) = fs::canonicalize(path) {
        scope.include_history.insert(canonical);
    }

    let src = fs::read_to_string(path).map_err(|source| DriverError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;

    let mut items = Vec::new();
    parse_unit(path, src.as_bytes(), &mut scope, &mut items)?;

    Ok(items)
}

/// Parses a single in-memory unit. Includes still resolve against the
/// literal path only; primarily a test and tooling entry point.
pub fn parse_source(src: &str, file: &Path) -> Result<Vec<Item>> {
    let mut scope = Scope::new(vec![]);
    let mut items = Vec::new();
    parse_unit(file, src.as_bytes(), &mut scope, &mut items)?;

    Ok(items)
}

/// One parser activation: a lexer over one file plus the shared scope and
/// output item list.
fn parse_unit(file: &Path, src: &[u8], scope: &mut Scope, items: &mut Vec<Item>) -> Result<()> {
    let mut parser = Parser {
        lexer: Lexer::new(Rc::new(file.to_path_buf()), src),
        scope,
        items,
    };

    parser.parse_unit()
}

struct Parser<'s, 'src> {
    lexer: Lexer<'src>,
    scope: &'s mut Scope,
    items: &'s mut Vec<Item>,
}

impl Parser<'_, '_> {
    /// Top-level loop: `const`, `func` and `include` declarations until the
    /// unit is exhausted.
    fn parse_unit(&mut self) -> Result<()> {
        while let Some(token) = self.lexer.next_token()? {
            match token.kind {
                TokenKind::Const => self.parse_const(token)?,
                TokenKind::Func => self.parse_func(token)?,
                TokenKind::Include => self.parse_include()?,
                kind => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "'const', 'func' or 'include'".into(),
                        found: kind.to_string(),
                        pos: token.pos,
                    }
                    .into());
                }
            }
        }

        Ok(())
    }

    /// `const NAME <rpn-expr>`.
    fn parse_const(&mut self, const_tok: Token) -> Result<()> {
        let (name, name_pos) = self.expect_ident("a constant name after 'const'")?;
        let value = self.eval_const_expr(&name_pos)?;

        tracing::debug!(name = %name, value, "parsed constant");

        self.scope.bindings.insert(name.clone(), Binding::Const(value));
        self.items.push(Item::Const {
            name,
            value,
            pos: const_tok.pos,
        });

        Ok(())
    }

    /// Evaluates an RPN constant expression: number literals and `+ - * /`
    /// over `i64`, `/` truncating toward zero. Tokens are consumed while
    /// the next token belongs to the expression; the residual evaluation
    /// stack must hold exactly one value.
    fn eval_const_expr(&mut self, at: &Position) -> Result<i64> {
        let mut stack: Vec<i64> = vec![];

        loop {
            let is_expr_token = matches!(
                self.lexer.peek()?.map(|t| &t.kind),
                Some(
                    TokenKind::Number(_)
                        | TokenKind::Plus
                        | TokenKind::Minus
                        | TokenKind::Star
                        | TokenKind::Slash
                )
            );

            if !is_expr_token {
                break;
            }

            let token = self.lexer.next_token()?.expect("peeked above");

            match token.kind {
                TokenKind::Number(v) => stack.push(v),
                kind => {
                    let (Some(rhs), Some(lhs)) = (stack.pop(), stack.pop()) else {
                        return Err(ParseError::ConstOperandMissing { pos: token.pos }.into());
                    };

                    let value = match kind {
                        TokenKind::Plus => lhs.wrapping_add(rhs),
                        TokenKind::Minus => lhs.wrapping_sub(rhs),
                        TokenKind::Star => lhs.wrapping_mul(rhs),
                        TokenKind::Slash => {
                            if rhs == 0 {
                                return Err(
                                    ParseError::ConstDivisionByZero { pos: token.pos }.into()
                                );
                            }

                            lhs.wrapping_div(rhs)
                        }
                        _ => unreachable!("only expression tokens are consumed"),
                    };

                    stack.push(value);
                }
            }
        }

        match stack.len() {
            0 => Err(ParseError::EmptyConstExpr { pos: at.clone() }.into()),
            1 => Ok(stack[0]),
            count => Err(ParseError::UnbalancedConstExpr {
                count,
                pos: at.clone(),
            }
            .into()),
        }
    }

    /// `func NAME TYPE* -> TYPE* (do OP* end | extern)`.
    fn parse_func(&mut self, func_tok: Token) -> Result<()> {
        let (name, _) = self.expect_ident("a function name after 'func'")?;

        let args = self.parse_type_names(&[TokenKind::Arrow], "a type name or '->'")?.0;
        let (rets, terminator) = self.parse_type_names(
            &[TokenKind::Do, TokenKind::Extern],
            "a type name, 'do' or 'extern'",
        )?;

        let sig = Signature { args, rets };

        // Registered before the body is parsed so the function can call
        // itself.
        self.scope
            .bindings
            .insert(name.clone(), Binding::Func(sig.clone()));

        if terminator.kind == TokenKind::Extern {
            tracing::debug!(name = %name, "parsed extern function");

            self.items.push(Item::Func(FuncDef {
                name,
                sig,
                body: vec![],
                is_extern: true,
                pos: func_tok.pos,
            }));

            return Ok(());
        }

        // Symbolic execution starts from the declared arguments, the last
        // declared argument on top.
        let (arg_types, ret_types) = sig.resolve()?;
        let mut stack = TypeStack::from_args(&arg_types);

        let (body, end_tok) = self.parse_ops_until(&mut stack, &[TokenKind::End])?;

        // The residual stack must be exactly the declared return types.
        let residual = stack.render();
        stack.validate_concrete(&ret_types, &[], &end_tok.pos)?;

        if !stack.is_empty() {
            return Err(TypeError::ResidualStack {
                name,
                got: residual,
                declared: types::render_types(&ret_types),
                pos: end_tok.pos,
            }
            .into());
        }

        tracing::debug!(name = %name, ops = body.len(), "parsed function");

        self.items.push(Item::Func(FuncDef {
            name,
            sig,
            body,
            is_extern: false,
            pos: func_tok.pos,
        }));

        Ok(())
    }

    /// Consumes type names until one of `terminators`, returning the names
    /// and the terminator token. Any identifier is accepted textually; the
    /// primitive keywords are folded back to their lexeme.
    fn parse_type_names(
        &mut self,
        terminators: &[TokenKind],
        expected: &str,
    ) -> Result<(Vec<TypeName>, Token)> {
        let mut names = vec![];

        loop {
            let token = self.next_or(expected)?;

            if terminators.contains(&token.kind) {
                return Ok((names, token));
            }

            let name = match &token.kind {
                TokenKind::Ident(name) => name.clone(),
                TokenKind::Int => "int".into(),
                TokenKind::Bool => "bool".into(),
                TokenKind::Ptr => "ptr".into(),
                TokenKind::Long => "long".into(),
                TokenKind::Str => "str".into(),
                kind => {
                    return Err(ParseError::UnexpectedToken {
                        expected: expected.into(),
                        found: kind.to_string(),
                        pos: token.pos,
                    }
                    .into());
                }
            };

            names.push(TypeName {
                name,
                pos: token.pos,
            });
        }
    }

    /// Parses ops until one of `terminators`, threading the type stack
    /// through every op. Returns the ops and the terminator token.
    fn parse_ops_until(
        &mut self,
        stack: &mut TypeStack,
        terminators: &[TokenKind],
    ) -> Result<(Vec<Op>, Token)> {
        let mut ops = vec![];

        loop {
            let Some(token) = self.lexer.next_token()? else {
                return Err(ParseError::UnexpectedEof {
                    expected: "'end'".into(),
                    pos: self.lexer.position(),
                }
                .into());
            };

            if terminators.contains(&token.kind) {
                return Ok((ops, token));
            }

            ops.push(self.parse_op(token, stack)?);
        }
    }

    /// Parses one op, validating its stack effect at the token that
    /// introduces it.
    fn parse_op(&mut self, token: Token, stack: &mut TypeStack) -> Result<Op> {
        let pos = token.pos;

        match token.kind {
            TokenKind::Number(value) => {
                stack.validate(&[], &[SigTy::Prim(Type::Int)], &pos)?;

                Ok(Op::PushInt { value, pos })
            }
            TokenKind::StrLit(value) => {
                stack.validate(&[], &[SigTy::Prim(Type::Ptr)], &pos)?;

                Ok(Op::PushStr { value, pos })
            }
            TokenKind::Ident(name) => match self.scope.bindings.get(&name) {
                Some(Binding::Const(value)) => {
                    let value = *value;
                    stack.validate(&[], &[SigTy::Prim(Type::Int)], &pos)?;

                    Ok(Op::PushInt { value, pos })
                }
                Some(Binding::Func(sig)) => {
                    let (args, rets) = sig.resolve()?;
                    stack.validate_concrete(&args, &rets, &pos)?;

                    Ok(Op::Call {
                        name,
                        args,
                        rets,
                        pos,
                    })
                }
                None => Err(TypeError::Undefined { name, pos }.into()),
            },
            TokenKind::If => self.parse_conditional(pos, stack),
            kind => match intrinsic_for(&kind) {
                Some(intrinsic) => {
                    let (args, rets) = intrinsic.effect();
                    stack.validate(args, rets, &pos)?;

                    Ok(Op::Intrinsic {
                        kind: intrinsic,
                        pos,
                    })
                }
                None => Err(ParseError::UnexpectedToken {
                    expected: "an operation or 'end'".into(),
                    found: kind.to_string(),
                    pos,
                }
                .into()),
            },
        }
    }

    /// `if OP* end` or `if OP* else OP* end`.
    ///
    /// The two arms are checked against clones of the stack at entry. With
    /// an else branch the arms must leave identical stacks; without one,
    /// the then arm must be net-neutral (the join would otherwise see two
    /// different stack shapes).
    fn parse_conditional(&mut self, pos: Position, stack: &mut TypeStack) -> Result<Op> {
        stack.validate(&[SigTy::Prim(Type::Bool)], &[], &pos)?;

        let entry = stack.clone();

        let (then_ops, terminator) =
            self.parse_ops_until(stack, &[TokenKind::End, TokenKind::Else])?;

        if terminator.kind == TokenKind::End {
            if *stack != entry {
                return Err(TypeError::BranchMismatch {
                    then_stack: stack.render(),
                    else_stack: entry.render(),
                    pos: terminator.pos,
                }
                .into());
            }

            return Ok(Op::If {
                then_ops,
                else_ops: vec![],
                pos,
            });
        }

        let after_then = stack.clone();
        *stack = entry;

        let (else_ops, end_tok) = self.parse_ops_until(stack, &[TokenKind::End])?;

        if *stack != after_then {
            return Err(TypeError::BranchMismatch {
                then_stack: after_then.render(),
                else_stack: stack.render(),
                pos: end_tok.pos,
            }
            .into());
        }

        Ok(Op::If {
            then_ops,
            else_ops,
            pos,
        })
    }

    /// `include "PATH"`: resolve, skip if already seen, otherwise parse the
    /// resolved file in a nested activation over the same scope.
    fn parse_include(&mut self) -> Result<()> {
        let token = self.next_or("a string literal after 'include'")?;

        let path = match token.kind {
            TokenKind::StrLit(path) => path,
            kind => {
                return Err(ParseError::UnexpectedToken {
                    expected: "a string literal after 'include'".into(),
                    found: kind.to_string(),
                    pos: token.pos,
                }
                .into());
            }
        };

        let Some((resolved, canonical)) = self.resolve_include(&path) else {
            return Err(ParseError::UnresolvedInclude {
                path,
                pos: token.pos,
            }
            .into());
        };

        if !self.scope.include_history.insert(canonical) {
            tracing::debug!(path = %path, "include already processed, skipping");
            return Ok(());
        }

        tracing::debug!(path = %path, resolved = %resolved.display(), "processing include");

        let src = fs::read_to_string(&resolved).map_err(|source| DriverError::ReadInput {
            path: resolved.clone(),
            source,
        })?;

        parse_unit(&resolved, src.as_bytes(), self.scope, self.items)
    }

    /// Tries the literal path, then each include directory in order.
    /// Returns the first candidate that exists, as written and
    /// canonicalized.
    fn resolve_include(&self, path: &str) -> Option<(PathBuf, PathBuf)> {
        let literal = PathBuf::from(path);

        std::iter::once(literal)
            .chain(self.scope.include_dirs.iter().map(|dir| dir.join(path)))
            .find_map(|candidate| {
                let canonical = fs::canonicalize(&candidate).ok()?;
                Some((candidate, canonical))
            })
    }

    fn next_or(&mut self, expected: &str) -> Result<Token> {
        match self.lexer.next_token()? {
            Some(token) => Ok(token),
            None => Err(ParseError::UnexpectedEof {
                expected: expected.into(),
                pos: self.lexer.position(),
            }
            .into()),
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<(String, Position)> {
        let token = self.next_or(expected)?;

        match token.kind {
            TokenKind::Ident(name) => Ok((name, token.pos)),
            kind => Err(ParseError::UnexpectedToken {
                expected: expected.into(),
                found: kind.to_string(),
                pos: token.pos,
            }
            .into()),
        }
    }
}

/// Maps an operator or keyword token to its intrinsic, if it is one.
fn intrinsic_for(kind: &TokenKind) -> Option<Intrinsic> {
    let intrinsic = match kind {
        TokenKind::Plus => Intrinsic::Add,
        TokenKind::Minus => Intrinsic::Sub,
        TokenKind::Star => Intrinsic::Mul,
        TokenKind::Slash => Intrinsic::Div,
        TokenKind::Lt => Intrinsic::Lt,
        TokenKind::Gt => Intrinsic::Gt,
        TokenKind::Lte => Intrinsic::Lte,
        TokenKind::Gte => Intrinsic::Gte,
        TokenKind::Eq => Intrinsic::Eq,
        TokenKind::Neq => Intrinsic::Neq,
        TokenKind::BwAnd => Intrinsic::BwAnd,
        TokenKind::BwOr => Intrinsic::BwOr,
        TokenKind::Lsh => Intrinsic::Lsh,
        TokenKind::Rsh => Intrinsic::Rsh,
        TokenKind::Not => Intrinsic::Not,
        TokenKind::Neg => Intrinsic::Neg,
        TokenKind::Dup => Intrinsic::Dup,
        TokenKind::Drop => Intrinsic::Drop,
        TokenKind::Swap => Intrinsic::Swap,
        TokenKind::Rot => Intrinsic::Rot,
        TokenKind::Over => Intrinsic::Over,
        TokenKind::Int => Intrinsic::Cast(Type::Int),
        TokenKind::Bool => Intrinsic::Cast(Type::Bool),
        TokenKind::Long => Intrinsic::Cast(Type::Long),
        TokenKind::Ptr | TokenKind::Str => Intrinsic::Cast(Type::Ptr),
        _ => return None,
    };

    Some(intrinsic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;

    fn parse(src: &str) -> Result<Vec<Item>> {
        parse_source(src, Path::new("test.tack"))
    }

    fn body_of(items: &[Item], name: &str) -> Vec<Op> {
        items
            .iter()
            .find_map(|item| match item {
                Item::Func(func) if func.name == name => Some(func.body.clone()),
                _ => None,
            })
            .expect("function should be present")
    }

    #[test]
    fn forth_primitives_type_check() {
        let items = parse("func test -> do 33 43 swap drop drop end").unwrap();
        let body = body_of(&items, "test");

        assert_eq!(body.len(), 5);
        assert!(matches!(body[0], Op::PushInt { value: 33, .. }));
        assert!(matches!(
            body[2],
            Op::Intrinsic {
                kind: Intrinsic::Swap,
                ..
            }
        ));
    }

    #[test]
    fn generic_swap_over_mixed_types() {
        // swap binds the deeper int to `a` and the ptr on top to `b`,
        // leaving int on top, matching the declared returns.
        parse("func h int ptr -> ptr int do swap end").unwrap();
    }

    #[test]
    fn residual_stack_rejected() {
        let err = parse("func bad -> int do 1 2 end").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Type(TypeError::ResidualStack { .. })
        ));
    }

    #[test]
    fn then_branch_must_be_net_neutral() {
        let err = parse("func bad2 bool -> do if 1 end end").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Type(TypeError::BranchMismatch { .. })
        ));
    }

    #[test]
    fn if_else_arms_must_agree() {
        parse("func ok int int bool -> int do if drop else swap drop end end").unwrap();

        let err =
            parse("func bad int int bool -> int do if drop else drop drop 1 2 end end")
                .unwrap_err();

        assert!(matches!(
            err,
            CompileError::Type(TypeError::BranchMismatch { .. })
        ));
    }

    #[test]
    fn if_condition_must_be_bool() {
        let err = parse("func bad int -> do if end end").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Type(TypeError::Mismatch { .. })
        ));
    }

    #[test]
    fn stack_underflow_rejected() {
        let err = parse("func bad -> do + end").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Type(TypeError::StackUnderflow {
                expected: 2,
                got: 0,
                ..
            })
        ));
    }

    #[test]
    fn undefined_identifier_rejected() {
        let err = parse("func bad -> do frobnicate end").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Type(TypeError::Undefined { .. })
        ));
    }

    #[test]
    fn const_definition_and_use() {
        let items = parse("const NINE 1 2 + 3 *\nfunc f -> int do NINE end").unwrap();

        assert!(matches!(
            items[0],
            Item::Const { value: 9, .. }
        ));
        assert!(matches!(
            body_of(&items, "f")[0],
            Op::PushInt { value: 9, .. }
        ));
    }

    #[test]
    fn const_division_truncates_toward_zero() {
        let items = parse("const Q 7 2 /").unwrap();
        assert!(matches!(items[0], Item::Const { value: 3, .. }));
    }

    #[test]
    fn const_empty_expression_rejected() {
        let err = parse("const X func f -> do end").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Parse(ParseError::EmptyConstExpr { .. })
        ));
    }

    #[test]
    fn const_unbalanced_expression_rejected() {
        let err = parse("const X 1 2").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Parse(ParseError::UnbalancedConstExpr { count: 2, .. })
        ));
    }

    #[test]
    fn const_division_by_zero_rejected() {
        let err = parse("const X 1 0 /").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Parse(ParseError::ConstDivisionByZero { .. })
        ));
    }

    #[test]
    fn const_missing_operand_rejected() {
        let err = parse("const X 1 +").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Parse(ParseError::ConstOperandMissing { .. })
        ));
    }

    #[test]
    fn extern_function_callable() {
        let items =
            parse("func puts ptr -> int extern\nfunc main -> int do \"hi\" puts end").unwrap();

        assert!(matches!(
            body_of(&items, "main")[1],
            Op::Call { .. }
        ));
    }

    #[test]
    fn call_argument_mismatch_rejected() {
        let err = parse("func f int -> extern\nfunc main -> do \"hi\" f end").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Type(TypeError::Mismatch { .. })
        ));
    }

    #[test]
    fn recursion_allowed() {
        parse("func down int -> do dup 0 = if drop else 1 - down end end").unwrap();
    }

    #[test]
    fn last_definition_wins() {
        // Constants and functions share a namespace; redefinition silently
        // replaces.
        let items = parse("const x 1\nfunc x -> extern\nfunc main -> do x end").unwrap();

        assert!(matches!(
            body_of(&items, "main")[0],
            Op::Call { .. }
        ));
    }

    #[test]
    fn unknown_type_name_rejected_at_do() {
        let err = parse("func f quux -> do drop end").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Type(TypeError::UnknownType { .. })
        ));
    }

    #[test]
    fn unknown_type_name_tolerated_on_unused_extern() {
        parse("func f quux -> extern").unwrap();
    }

    #[test]
    fn multi_return_type_checks() {
        // More than one return type is legal in the type system; the
        // backend rejects it when lowering.
        parse("func two -> int int do 1 2 end").unwrap();
    }

    #[test]
    fn str_in_signature_is_ptr() {
        parse("func f str -> ptr do end").unwrap();
    }

    #[test]
    fn unexpected_top_level_token() {
        let err = parse("42").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Parse(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn missing_end_rejected() {
        let err = parse("func f -> do 1 drop").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Parse(ParseError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn include_must_be_string() {
        let err = parse("include foo").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Parse(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn unresolvable_include_rejected() {
        let err = parse("include \"no/such/file.tack\"").unwrap_err();

        assert!(matches!(
            err,
            CompileError::Parse(ParseError::UnresolvedInclude { .. })
        ));
    }

    #[test]
    fn include_resolves_and_merges() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib.tack");
        fs::write(&lib, "const TEN 10\nfunc ten -> int do TEN end").unwrap();

        let main = dir.path().join("main.tack");
        fs::write(
            &main,
            "include \"lib.tack\"\nfunc main -> int do ten end",
        )
        .unwrap();

        let items = parse_program(&main, &[dir.path().to_path_buf()]).unwrap();

        // Included items come first, in flattened source order.
        let names: Vec<_> = items
            .iter()
            .map(|item| match item {
                Item::Const { name, .. } => name.clone(),
                Item::Func(func) => func.name.clone(),
            })
            .collect();
        assert_eq!(names, vec!["TEN", "ten", "main"]);
    }

    #[test]
    fn duplicate_include_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib.tack");
        fs::write(&lib, "func ten -> int do 10 end").unwrap();

        let main = dir.path().join("main.tack");
        fs::write(
            &main,
            "include \"lib.tack\"\ninclude \"lib.tack\"\nfunc main -> int do ten end",
        )
        .unwrap();

        let items = parse_program(&main, &[dir.path().to_path_buf()]).unwrap();

        let ten_count = items
            .iter()
            .filter(|item| matches!(item, Item::Func(f) if f.name == "ten"))
            .count();
        assert_eq!(ten_count, 1);
    }

    #[test]
    fn include_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.tack"), "include \"b.tack\"\nfunc fa -> do end").unwrap();
        fs::write(dir.path().join("b.tack"), "include \"a.tack\"\nfunc fb -> do end").unwrap();

        let items = parse_program(&dir.path().join("a.tack"), &[dir.path().to_path_buf()])
            .unwrap();

        assert_eq!(items.len(), 2);
    }
}

//! Code Emission
//!
//! Compiler pass that lowers the type-checked AST to textual QBE SSA.
//!
//! Lowering is function-local: each function keeps a compile-time stack of
//! `(operand, type)` pairs where an operand is an SSA temporary (`%s3`), an
//! integer literal, or a string symbol (`$s0`). Pure stack manipulation
//! (`dup`, `swap`, casts, literal pushes) only rearranges this stack and
//! emits nothing. The one global structure is the string pool, emitted as
//! `data` definitions ahead of the functions.

use crate::compiler::parser::ast::{FuncDef, Intrinsic, Item, Op};
use crate::compiler::parser::types::Type;
use crate::error::{Result, TypeError};

/// Lowers every defined function of `items` and returns the complete QBE
/// module text: `data` definitions for pooled strings, then one `export
/// function` per definition.
pub fn emit_program(items: &[Item]) -> Result<String> {
    let mut strings = StringPool::default();
    let mut functions: Vec<String> = vec![];

    for item in items {
        if let Item::Func(func) = item {
            // Externs only contribute a symbol; QBE needs no declaration.
            if func.is_extern {
                continue;
            }

            tracing::debug!(name = %func.name, "lowering function");
            functions.push(lower_function(func, &mut strings)?);
        }
    }

    let mut out = String::new();

    for (idx, literal) in strings.literals.iter().enumerate() {
        // Null-terminated so the pointers are C-compatible. Bytes are
        // forwarded verbatim; the language has no escape sequences.
        out.push_str(&format!("data $s{idx} = {{ b \"{literal}\", b 0 }}\n"));
    }

    if !strings.literals.is_empty() {
        out.push('\n');
    }

    out.push_str(&functions.join("\n"));

    Ok(out)
}

/// Interns string literals in first-appearance order; `$sK` symbols are
/// shared between identical literals across the whole module.
#[derive(Debug, Default)]
struct StringPool {
    literals: Vec<String>,
}

impl StringPool {
    fn intern(&mut self, literal: &str) -> String {
        let idx = match self.literals.iter().position(|s| s == literal) {
            Some(idx) => idx,
            None => {
                self.literals.push(literal.to_owned());
                self.literals.len() - 1
            }
        };

        format!("$s{idx}")
    }
}

fn lower_function(func: &FuncDef, strings: &mut StringPool) -> Result<String> {
    // Defined functions already resolved during body checking; this cannot
    // fail for them in practice but the raw signature is all the AST keeps.
    let (args, rets) = func.sig.resolve()?;

    // The System V convention carries a single return value.
    if rets.len() > 1 {
        return Err(TypeError::MultipleReturns {
            name: func.name.clone(),
            count: rets.len(),
            pos: func.pos.clone(),
        }
        .into());
    }

    let mut emitter = FuncEmitter {
        strings,
        body: String::new(),
        stack: vec![],
        next_ssa: args.len() as u32,
        next_block: 0,
        cur_block: String::new(),
    };

    // Arguments are %s0..%sN-1 in declared order; pushing them in that
    // order leaves the last declared argument on top.
    let params: Vec<String> = args
        .iter()
        .enumerate()
        .map(|(idx, ty)| {
            let name = format!("%s{idx}");
            emitter.stack.push((name.clone(), *ty));
            format!("{} {name}", ty.class())
        })
        .collect();

    let header = match rets.first() {
        Some(ret) => format!(
            "export function {} ${}({}) {{",
            ret.class(),
            func.name,
            params.join(", ")
        ),
        None => format!("export function ${}({}) {{", func.name, params.join(", ")),
    };

    let entry = emitter.new_block();
    emitter.start_block(&entry);
    emitter.lower_ops(&func.body)?;

    match rets.first() {
        Some(_) => {
            let (value, _) = emitter.pop();
            emitter.line(&format!("\tret {value}"));
        }
        None => emitter.line("\tret"),
    }

    Ok(format!("{header}\n{}}}\n", emitter.body))
}

/// Per-function emission state.
struct FuncEmitter<'a> {
    strings: &'a mut StringPool,
    body: String,
    // Compile-time operand stack; top is the last element. Types here
    // mirror the parser's type stack exactly.
    stack: Vec<(String, Type)>,
    next_ssa: u32,
    next_block: u32,
    cur_block: String,
}

impl FuncEmitter<'_> {
    fn lower_ops(&mut self, ops: &[Op]) -> Result<()> {
        for op in ops {
            self.lower_op(op)?;
        }

        Ok(())
    }

    fn lower_op(&mut self, op: &Op) -> Result<()> {
        match op {
            Op::PushInt { value, .. } => {
                // QBE accepts immediates as operands; no copy is emitted.
                self.stack.push((value.to_string(), Type::Int));
            }
            Op::PushStr { value, .. } => {
                let symbol = self.strings.intern(value);
                self.stack.push((symbol, Type::Ptr));
            }
            Op::Intrinsic { kind, .. } => self.lower_intrinsic(*kind),
            Op::Call {
                name,
                args,
                rets,
                pos,
            } => {
                if rets.len() > 1 {
                    return Err(TypeError::MultipleReturns {
                        name: name.clone(),
                        count: rets.len(),
                        pos: pos.clone(),
                    }
                    .into());
                }

                // The stack top is the last declared argument.
                let mut operands = Vec::with_capacity(args.len());

                for expected in args.iter().rev() {
                    let (value, ty) = self.pop();
                    assert_eq!(
                        ty, *expected,
                        "call operand disagrees with the signature of '{name}'"
                    );
                    operands.push(value);
                }

                operands.reverse();

                let arg_list = args
                    .iter()
                    .zip(&operands)
                    .map(|(ty, value)| format!("{} {value}", ty.class()))
                    .collect::<Vec<_>>()
                    .join(", ");

                match rets.first() {
                    Some(ret) => {
                        let result = self.new_ssa();
                        self.line(&format!(
                            "\t{result} ={} call ${name}({arg_list})",
                            ret.class()
                        ));
                        self.stack.push((result, *ret));
                    }
                    None => self.line(&format!("\tcall ${name}({arg_list})")),
                }
            }
            Op::If {
                then_ops,
                else_ops,
                ..
            } => self.lower_conditional(then_ops, else_ops)?,
        }

        Ok(())
    }

    fn lower_intrinsic(&mut self, kind: Intrinsic) {
        match kind {
            Intrinsic::Add
            | Intrinsic::Sub
            | Intrinsic::Mul
            | Intrinsic::Div
            | Intrinsic::BwAnd
            | Intrinsic::BwOr
            | Intrinsic::Lsh
            | Intrinsic::Rsh => {
                // The deeper operand is the left-hand side: `5 3 -` is
                // `5 - 3`, `x n <<` is `x << n`.
                let (rhs, rhs_ty) = self.pop();
                let (lhs, lhs_ty) = self.pop();
                assert_eq!(lhs_ty, rhs_ty, "binary operands disagree after checking");

                let op = match kind {
                    Intrinsic::Add => "add",
                    Intrinsic::Sub => "sub",
                    Intrinsic::Mul => "mul",
                    Intrinsic::Div => "div",
                    Intrinsic::BwAnd => "and",
                    Intrinsic::BwOr => "or",
                    Intrinsic::Lsh => "shl",
                    Intrinsic::Rsh => "shr",
                    _ => unreachable!(),
                };

                let result = self.new_ssa();
                self.line(&format!(
                    "\t{result} ={} {op} {lhs}, {rhs}",
                    lhs_ty.class()
                ));
                self.stack.push((result, lhs_ty));
            }
            Intrinsic::Lt
            | Intrinsic::Gt
            | Intrinsic::Lte
            | Intrinsic::Gte
            | Intrinsic::Eq
            | Intrinsic::Neq => {
                let (rhs, rhs_ty) = self.pop();
                let (lhs, lhs_ty) = self.pop();
                assert_eq!(lhs_ty, rhs_ty, "comparison operands disagree after checking");

                let op = match kind {
                    Intrinsic::Lt => "cslt",
                    Intrinsic::Gt => "csgt",
                    Intrinsic::Lte => "csle",
                    Intrinsic::Gte => "csge",
                    Intrinsic::Eq => "ceq",
                    Intrinsic::Neq => "cne",
                    _ => unreachable!(),
                };

                let result = self.new_ssa();
                self.line(&format!(
                    "\t{result} =w {op}{} {lhs}, {rhs}",
                    lhs_ty.class()
                ));
                self.stack.push((result, Type::Bool));
            }
            Intrinsic::Not => {
                // Logical not of any type is a compare-with-zero, typed as
                // its operand.
                let (value, ty) = self.pop();
                let result = self.new_ssa();
                self.line(&format!(
                    "\t{result} ={} ceq{} {value}, 0",
                    ty.class(),
                    ty.class()
                ));
                self.stack.push((result, ty));
            }
            Intrinsic::Neg => {
                let (value, ty) = self.pop();
                let result = self.new_ssa();
                self.line(&format!("\t{result} ={} neg {value}", ty.class()));
                self.stack.push((result, ty));
            }
            Intrinsic::Dup => {
                let top = self.top().clone();
                self.stack.push(top);
            }
            Intrinsic::Drop => {
                self.pop();
            }
            Intrinsic::Swap => {
                let len = self.stack.len();
                self.stack.swap(len - 1, len - 2);
            }
            Intrinsic::Rot => {
                let third = self.stack.len() - 3;
                let value = self.stack.remove(third);
                self.stack.push(value);
            }
            Intrinsic::Over => {
                let second = self.stack[self.stack.len() - 2].clone();
                self.stack.push(second);
            }
            Intrinsic::Cast(target) => {
                // Retype in place; no instruction. Cross-width casts are an
                // unchecked unsafety of the language.
                let top = self.top_mut();
                top.1 = target;
            }
        }
    }

    /// Lowers `if`/`else` to `jnz` plus two arm blocks and a join block.
    /// Stack slots whose operand differs between the arms are merged with a
    /// phi; the incidence labels are the blocks the arms actually end in,
    /// which is a nested join block when an arm contains another
    /// conditional.
    fn lower_conditional(&mut self, then_ops: &[Op], else_ops: &[Op]) -> Result<()> {
        let (cond, _) = self.pop();

        let then_block = self.new_block();
        let else_block = self.new_block();
        let join_block = self.new_block();

        self.line(&format!("\tjnz {cond}, @{then_block}, @{else_block}"));

        let entry_stack = self.stack.clone();

        self.start_block(&then_block);
        self.lower_ops(then_ops)?;
        self.line(&format!("\tjmp @{join_block}"));
        let then_pred = self.cur_block.clone();
        let then_stack = std::mem::replace(&mut self.stack, entry_stack);

        self.start_block(&else_block);
        self.lower_ops(else_ops)?;
        self.line(&format!("\tjmp @{join_block}"));
        let else_pred = self.cur_block.clone();

        self.start_block(&join_block);

        // The checker guarantees both arms leave equal type stacks; merge
        // any slot whose SSA operand differs.
        assert_eq!(
            then_stack.len(),
            self.stack.len(),
            "branch stacks disagree after checking"
        );

        for idx in 0..self.stack.len() {
            if then_stack[idx].0 == self.stack[idx].0 {
                continue;
            }

            let ty = then_stack[idx].1;
            let merged = self.new_ssa();
            self.line(&format!(
                "\t{merged} ={} phi @{then_pred} {}, @{else_pred} {}",
                ty.class(),
                then_stack[idx].0,
                self.stack[idx].0
            ));
            self.stack[idx] = (merged, ty);
        }

        Ok(())
    }

    fn new_ssa(&mut self) -> String {
        let name = format!("%s{}", self.next_ssa);
        self.next_ssa += 1;
        name
    }

    fn new_block(&mut self) -> String {
        let label = format!("b{}", self.next_block);
        self.next_block += 1;
        label
    }

    fn start_block(&mut self, label: &str) {
        self.line(&format!("@{label}"));
        self.cur_block = label.to_owned();
    }

    fn line(&mut self, s: &str) {
        self.body.push_str(s);
        self.body.push('\n');
    }

    fn pop(&mut self) -> (String, Type) {
        self.stack
            .pop()
            .expect("type checker guarantees stack depth")
    }

    fn top(&self) -> &(String, Type) {
        self.stack
            .last()
            .expect("type checker guarantees stack depth")
    }

    fn top_mut(&mut self) -> &mut (String, Type) {
        self.stack
            .last_mut()
            .expect("type checker guarantees stack depth")
    }
}

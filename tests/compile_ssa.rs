//! End-to-end tests: Tack source through the front end to QBE SSA text.
//! External tools are never invoked.

use std::fs;
use std::path::PathBuf;

use tack::compiler::driver::compile_to_ssa;
use tack::error::{CompileError, TypeError};

/// Writes `src` into a scratch directory and compiles it to SSA text.
fn compile(src: &str) -> Result<String, CompileError> {
    let dir = tempfile::tempdir().expect("scratch dir");
    let input = dir.path().join("main.tack");
    fs::write(&input, src).expect("write fixture");

    compile_to_ssa(&input, &[])
}

#[test]
fn compiles_a_minimal_program() {
    let ssa = compile("func main -> int do 0 end").expect("compile");

    assert!(ssa.contains("export function w $main() {"));
    assert!(ssa.contains("\tret 0\n"));
}

#[test]
fn compiles_hello_world_against_an_extern() {
    let ssa = compile(
        r#"
        func puts ptr -> int extern

        func main -> int do
            "Hello, World!" puts
        end
        "#,
    )
    .expect("compile");

    assert!(ssa.starts_with("data $s0 = { b \"Hello, World!\", b 0 }\n"));
    assert!(ssa.contains("call $puts(l $s0)"));
    assert!(!ssa.contains("$puts() {"));
}

#[test]
fn compiles_arithmetic_and_conditionals() {
    let ssa = compile(
        r#"
        # Clamp the difference of two numbers at zero.
        func clamped_sub int int -> int do
            over over > if
                -
            else
                drop drop 0
            end
        end
        "#,
    )
    .expect("compile");

    assert!(ssa.contains("csgtw"));
    assert!(ssa.contains("jnz"));
    assert!(ssa.contains("sub"));
    assert!(ssa.contains("phi"));
}

#[test]
fn constants_fold_into_pushes() {
    let ssa = compile(
        r#"
        const WIDTH 2 3 *
        func area -> int do WIDTH WIDTH * end
        "#,
    )
    .expect("compile");

    // The constant itself leaves no trace in the IR.
    assert!(!ssa.contains("WIDTH"));
    assert!(ssa.contains("mul 6, 6"));
}

#[test]
fn includes_flatten_into_one_module() {
    let dir = tempfile::tempdir().expect("scratch dir");
    fs::write(
        dir.path().join("util.tack"),
        "func double int -> int do dup + end",
    )
    .expect("write fixture");

    let input = dir.path().join("main.tack");
    fs::write(
        &input,
        "include \"util.tack\"\nfunc main -> int do 21 double end",
    )
    .expect("write fixture");

    let ssa = compile_to_ssa(&input, &[dir.path().to_path_buf()]).expect("compile");

    assert!(ssa.contains("export function w $double(w %s0) {"));
    assert!(ssa.contains("call $double(w 21)"));
}

#[test]
fn including_the_same_unit_twice_is_idempotent() {
    let dir = tempfile::tempdir().expect("scratch dir");
    fs::write(
        dir.path().join("util.tack"),
        "func double int -> int do dup + end",
    )
    .expect("write fixture");

    let input = dir.path().join("main.tack");
    fs::write(
        &input,
        "include \"util.tack\"\ninclude \"util.tack\"\nfunc main -> int do 21 double end",
    )
    .expect("write fixture");

    let ssa = compile_to_ssa(&input, &[dir.path().to_path_buf()]).expect("compile");

    assert_eq!(ssa.matches("export function w $double").count(), 1);
}

#[test]
fn residual_stack_fails_with_position() {
    let err = compile("func bad -> int do 1 2 end").unwrap_err();

    assert!(matches!(
        err,
        CompileError::Type(TypeError::ResidualStack { .. })
    ));
    assert!(err.to_string().contains("main.tack:1:24"));
}

#[test]
fn unbalanced_then_branch_fails() {
    let err = compile("func bad2 bool -> do if 1 end end").unwrap_err();

    assert!(matches!(
        err,
        CompileError::Type(TypeError::BranchMismatch { .. })
    ));
}

#[test]
fn missing_input_file_is_a_driver_error() {
    let err = compile_to_ssa(&PathBuf::from("no/such/unit.tack"), &[]).unwrap_err();

    assert!(matches!(err, CompileError::Driver(_)));
}

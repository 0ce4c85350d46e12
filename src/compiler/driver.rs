//! Compiler driver that orchestrates the multi-stage process of compiling
//! a Tack translation unit into an executable.
//!
//! The front end (parse + check + emit) runs in-process; the later stages
//! shell out to `qbe`, `as` and `cc`. Intermediate products live in a
//! scratch directory that is removed on every exit path; only the
//! requested stage's product is written to the output path.

use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::args::{Args, Stage};
use crate::compiler::{emit, parser};
use crate::error::{DriverError, Result};

/// Runs the in-process pipeline: parse and type-check the unit rooted at
/// `input`, then lower it to QBE SSA text.
pub fn compile_to_ssa(input: &Path, include_dirs: &[PathBuf]) -> Result<String> {
    let items = parser::parse_program(input, include_dirs)?;

    emit::emit_program(&items)
}

/// Executes the staged compilation pipeline described by `args`.
pub fn run(args: &Args) -> Result<()> {
    let mut include_dirs = args.include_dirs.clone();

    if !args.nostdlib {
        if let Some(dir) = exe_dir() {
            include_dirs.push(dir.join("lib").join("include"));
        }

        include_dirs.push(PathBuf::from("/usr/include"));
    }

    tracing::debug!(input = %args.in_path.display(), "compiling");

    let ssa = compile_to_ssa(&args.in_path, &include_dirs)?;

    if args.stage == Stage::Ssa {
        return write_output(&args.out_path, &ssa);
    }

    let scratch = tempfile::tempdir().map_err(|source| DriverError::WriteOutput {
        path: env::temp_dir(),
        source,
    })?;

    let ssa_path = scratch.path().join("out.ssa");
    write_output(&ssa_path, &ssa)?;

    let asm_path = if args.stage == Stage::Asm {
        args.out_path.clone()
    } else {
        scratch.path().join("out.s")
    };

    run_tool(
        "qbe",
        &[
            OsStr::new("-o"),
            asm_path.as_os_str(),
            ssa_path.as_os_str(),
        ],
    )?;

    if args.stage == Stage::Asm {
        return Ok(());
    }

    let obj_path = if args.stage == Stage::Obj {
        args.out_path.clone()
    } else {
        scratch.path().join("out.o")
    };

    run_tool(
        "as",
        &[
            OsStr::new("-o"),
            obj_path.as_os_str(),
            asm_path.as_os_str(),
        ],
    )?;

    if args.stage == Stage::Obj {
        return Ok(());
    }

    let mut link_args: Vec<OsString> = vec![
        OsString::from("-o"),
        args.out_path.clone().into(),
        obj_path.into(),
    ];

    for input in &args.link_inputs {
        link_args.push(input.clone().into());
    }

    if !args.nostdlib {
        link_args.push(find_stdlib()?.into());
    }

    run_tool("cc", &link_args)
}

/// Runs an external tool, surfacing its captured stderr on failure.
fn run_tool<S: AsRef<OsStr>>(tool: &'static str, tool_args: &[S]) -> Result<()> {
    let rendered = tool_args
        .iter()
        .map(|arg| arg.as_ref().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    tracing::debug!(tool, args = %rendered, "running external tool");

    let output = Command::new(tool)
        .args(tool_args)
        .output()
        .map_err(|source| DriverError::ToolSpawn { tool, source })?;

    if !output.status.success() {
        return Err(DriverError::ToolFailed {
            tool,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into());
    }

    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| {
        DriverError::WriteOutput {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

fn exe_dir() -> Option<PathBuf> {
    Some(env::current_exe().ok()?.parent()?.to_path_buf())
}

/// The static archive is looked for next to the executable, then under its
/// `lib/` directory.
fn find_stdlib() -> Result<PathBuf> {
    let dir = exe_dir().ok_or(DriverError::MissingStdlib)?;

    [dir.join("libtack.a"), dir.join("lib").join("libtack.a")]
        .into_iter()
        .find(|candidate| candidate.exists())
        .ok_or_else(|| DriverError::MissingStdlib.into())
}

//! Module for parsing command-line arguments passed to the compiler.

use std::path::PathBuf;
use std::process;

use crate::print_err;

/// Compilation stage to stop after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `-cssa`: emit textual QBE SSA IR.
    Ssa,
    /// `-cs`: stop after the IR assembler, emitting native assembly.
    Asm,
    /// `-c`: stop after the native assembler, emitting an object file.
    Obj,
    /// Full pipeline: link an executable.
    Exe,
}

impl Stage {
    /// Suffix the output path takes when no `-o` is given. The executable
    /// stage strips the suffix.
    fn extension(self) -> &'static str {
        match self {
            Stage::Ssa => "ssa",
            Stage::Asm => "s",
            Stage::Obj => "o",
            Stage::Exe => "",
        }
    }
}

/// Compiler command-line arguments.
#[derive(Debug)]
pub struct Args {
    /// Name of the program, for error reporting.
    pub program: String,
    /// Input file containing Tack source code.
    pub in_path: PathBuf,
    /// Output path for the selected stage's product.
    pub out_path: PathBuf,
    /// Stage to stop after. Defaults to linking an executable.
    pub stage: Stage,
    /// Extra objects/archives passed to the linker (`-l FILE`, `-lFILE`).
    pub link_inputs: Vec<PathBuf>,
    /// Include search directories (`-I DIR`, `-IDIR`).
    pub include_dirs: Vec<PathBuf>,
    /// `-nostdlib`: do not link the standard library nor add its include
    /// path.
    pub nostdlib: bool,
    /// `-v`: verbose logging to stderr.
    pub verbose: bool,
}

const FLAG_SUMMARY: &[(&str, &str)] = &[
    ("-h, --help", "print this summary and exit"),
    ("--version", "show version and exit"),
    ("-o FILE", "output path. defaults to the input path with the stage's suffix"),
    ("-cssa", "stop after emitting QBE SSA IR"),
    ("-cs", "stop after the IR assembler (emit assembly)"),
    ("-c", "stop after the native assembler (emit an object file)"),
    ("-l FILE", "append FILE to the link inputs"),
    ("-I DIR", "append DIR to the include search path"),
    ("-nostdlib", "do not link the standard library nor add its include path"),
    ("-v", "verbose logging to stderr"),
];

impl Args {
    /// Parses command-line arguments from `std::env::args()`, [exiting] on
    /// error after printing the usage summary.
    ///
    /// [exiting]: std::process::exit
    pub fn parse() -> Self {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "tack".into());

        match Self::try_parse(&program, args) {
            Ok(args) => args,
            Err(msg) => {
                print_err!(&program, "{msg}");
                print_usage(&program);
                process::exit(1);
            }
        }
    }

    fn try_parse(
        program: &str,
        mut args: impl Iterator<Item = String>,
    ) -> Result<Self, String> {
        let mut stage = Stage::Exe;
        let mut out_path: Option<PathBuf> = None;
        let mut in_path: Option<PathBuf> = None;
        let mut link_inputs = vec![];
        let mut include_dirs = vec![];
        let mut nostdlib = false;
        let mut verbose = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => {
                    print_usage(program);
                    process::exit(0);
                }
                "--version" => {
                    println!("{program} {}", env!("CARGO_PKG_VERSION"));
                    process::exit(0);
                }
                "-o" => match args.next() {
                    Some(path) => out_path = Some(PathBuf::from(path)),
                    None => return Err("missing file name after '-o'".into()),
                },
                "-cssa" => stage = Stage::Ssa,
                "-cs" => stage = Stage::Asm,
                "-c" => stage = Stage::Obj,
                "-nostdlib" => nostdlib = true,
                "-v" => verbose = true,
                "-l" => match args.next() {
                    Some(path) => link_inputs.push(PathBuf::from(path)),
                    None => return Err("missing file name after '-l'".into()),
                },
                "-I" => match args.next() {
                    Some(dir) => include_dirs.push(PathBuf::from(dir)),
                    None => return Err("missing directory after '-I'".into()),
                },
                // Fused forms: -lFILE and -IDIR.
                flag if flag.starts_with("-l") => link_inputs.push(PathBuf::from(&flag[2..])),
                flag if flag.starts_with("-I") => include_dirs.push(PathBuf::from(&flag[2..])),
                flag if flag.starts_with('-') => {
                    return Err(format!("invalid flag '{flag}'"));
                }
                _ => {
                    if in_path.is_some() {
                        return Err(format!("unexpected extra input file '{arg}'"));
                    }

                    in_path = Some(PathBuf::from(arg));
                }
            }
        }

        let Some(in_path) = in_path else {
            return Err("no input file".into());
        };

        let out_path = out_path.unwrap_or_else(|| in_path.with_extension(stage.extension()));

        Ok(Self {
            program: program.into(),
            in_path,
            out_path,
            stage,
            link_inputs,
            include_dirs,
            nostdlib,
            verbose,
        })
    }
}

/// Prints the usage information for the program to `stderr`.
pub fn print_usage(program: &str) {
    eprintln!("\x1b[1;1musage:\x1b[0m");
    eprintln!("      {program} [flags] <input.tack>");
    eprintln!("\x1b[1;1mflags:\x1b[0m");

    for (flag, description) in FLAG_SUMMARY {
        eprintln!("   {flag:<12} {description}");
    }
}

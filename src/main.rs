use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use termcore::config::{self, OutputFormat};
use termcore::symbols::parse_numeral;
use termcore::{
    CancelToken, Diagnostic, EngineConfig, Module, SymbolKind, Term, TermIndex, build_report,
    compile_module, report, tracing_config,
};

#[derive(Debug, Parser)]
#[command(name = "termcore")]
#[command(about = "Canonical type algebra over hash-consed terms")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile every type declaration and print the canonical forms.
    Check {
        file: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Print the canonical intersection of two declared types.
    Intersect {
        file: PathBuf,
        left: String,
        right: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check whether a literal value belongs to a declared type.
    Member {
        file: PathBuf,
        #[arg(value_name = "TYPE")]
        ty: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_config::init_tracing();
    let cli = Cli::parse();
    let exit_code = match cli.command {
        Command::Check {
            file,
            config,
            format,
        } => run_check(&file, config.as_deref(), format),
        Command::Intersect {
            file,
            left,
            right,
            config,
        } => run_intersect(&file, config.as_deref(), &left, &right),
        Command::Member {
            file,
            ty,
            value,
            config,
        } => run_member(&file, config.as_deref(), &ty, &value),
    };
    std::process::exit(exit_code);
}

fn load(file: &Path, config_path: Option<&Path>) -> Result<(Module, EngineConfig), i32> {
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    let config = config::resolve_config(config_path, dir).map_err(|err| {
        eprintln!("E-CONFIG: {err}");
        1
    })?;
    let module = config::load_module(file).map_err(|err| {
        eprintln!("E-IO: {err}");
        1
    })?;
    Ok((module, config))
}

fn compile(file: &Path, module: &Module, config: &EngineConfig) -> Result<TermIndex, i32> {
    compile_module(module, config, &CancelToken::new()).map_err(|diags| {
        print_diagnostics(file, diags);
        1
    })
}

fn print_diagnostics(file: &Path, diags: Vec<Diagnostic>) {
    let source = file.display().to_string();
    for d in diags {
        eprintln!("{}", d.with_source(source.clone()));
    }
}

fn run_check(file: &Path, config_path: Option<&Path>, format: Option<FormatArg>) -> i32 {
    let (module, config) = match load(file, config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let index = match compile(file, &module, &config) {
        Ok(index) => index,
        Err(code) => return code,
    };

    let report = build_report(&index, &module);
    let format = match format {
        Some(FormatArg::Text) => OutputFormat::Text,
        Some(FormatArg::Json) => OutputFormat::Json,
        None => config.format,
    };
    match format {
        OutputFormat::Text => print!("{}", report::render_text(&report)),
        OutputFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("E-IO: failed to serialize report: {err}");
                return 1;
            }
        },
    }
    0
}

fn run_intersect(file: &Path, config_path: Option<&Path>, left: &str, right: &str) -> i32 {
    let (module, config) = match load(file, config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let index = match compile(file, &module, &config) {
        Ok(index) => index,
        Err(code) => return code,
    };
    let terms = type_term(&index, left).and_then(|l| Ok((l, type_term(&index, right)?)));
    let (left, right) = match terms {
        Ok(terms) => terms,
        Err(diag) => {
            print_diagnostics(file, vec![diag]);
            return 1;
        }
    };
    match index.mk_intersection(&left, &right) {
        Some(t) => println!("{t}"),
        None => println!("empty"),
    }
    0
}

fn run_member(file: &Path, config_path: Option<&Path>, ty: &str, value: &str) -> i32 {
    let (module, config) = match load(file, config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let index = match compile(file, &module, &config) {
        Ok(index) => index,
        Err(code) => return code,
    };
    let resolved = type_term(&index, ty).and_then(|t| Ok((t, value_term(&index, value)?)));
    let (ty, value) = match resolved {
        Ok(resolved) => resolved,
        Err(diag) => {
            print_diagnostics(file, vec![diag]);
            return 1;
        }
    };
    if index.is_ground_member(&ty, &value) {
        println!("member");
    } else {
        println!("not a member");
    }
    0
}

/// The type term denoted by a declared or built-in name.
fn type_term(index: &TermIndex, name: &str) -> Result<Term, Diagnostic> {
    let sym = index.symbols().resolve(name, None)?;
    let term = match sym.kind() {
        SymbolKind::Con { .. } | SymbolKind::Map { .. } => index.sort_term(&sym),
        SymbolKind::BaseOp(_) => {
            return Err(Diagnostic::bad_id(name, "operators are not types", None));
        }
        _ => index.mk_apply(&sym, &[]).0,
    };
    Ok(index.mk_canonical_form(&term))
}

/// A literal: a numeral, a double-quoted string or a constant name.
fn value_term(index: &TermIndex, literal: &str) -> Result<Term, Diagnostic> {
    if let Some(s) = literal
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return Ok(index.mk_cnst(s));
    }
    if let Some(value) = parse_numeral(literal) {
        return Ok(index.mk_cnst(value));
    }
    let sym = index.symbols().resolve(literal, None)?;
    match sym.kind() {
        SymbolKind::UserCnst { .. } => Ok(index.mk_apply(&sym, &[]).0),
        _ => Err(Diagnostic::bad_id(literal, "values must be constants", None)),
    }
}

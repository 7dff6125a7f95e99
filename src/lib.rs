pub mod ast;
pub mod binned;
pub mod can_unn;
pub mod cancel;
pub mod config;
pub mod diagnostics;
pub mod intervals;
pub mod lattice;
pub mod report;
pub mod subterm;
pub mod symbols;
pub mod term;
pub mod term_index;
pub mod tracing_config;

pub use ast::{DeclKind, EnumElem, Module, TypeDecl, TypeExpr};
pub use can_unn::AppFreeCanUnn;
pub use cancel::CancelToken;
pub use config::{EngineConfig, LoadError, OutputFormat};
pub use diagnostics::{DiagCode, Diagnostic, Span};
pub use report::{ModuleReport, build_report, compile_module};
pub use subterm::SubtermMatcher;
pub use symbols::{BaseSortKind, CnstValue, Symbol, SymbolKind, SymbolTable};
pub use term::{Groundness, Term};
pub use term_index::{IndexStats, TermIndex};

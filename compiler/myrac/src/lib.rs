//! The Myra compiler driver.
//!
//! Recursively transpiles the entry module and its imports in dependency
//! order: source text → tokens → module AST → (recurse into imports) →
//! semantic analysis → C++ emission → `generated/<Name>.h`/`.cpp`.
//! A processed-file set guarantees each module is tokenised, parsed,
//! analysed, and emitted exactly once per compilation, even when it is
//! reachable through several import chains; cycles short-circuit.

pub mod tracing_setup;

#[cfg(test)]
mod tests;

use myra_diagnostic::{
    CompileResult, Diagnostic, DiagnosticBag, ErrorCode, FatalError, Severity,
};
use myra_ir::{Breakpoint, CompileOptions, Pos};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Driver-level failure.
#[derive(Debug, Error)]
pub enum DriverError {
    /// One or more diagnostics of severity error (or a fatal) were
    /// reported; the downstream build must not be attempted.
    #[error("build failed with {errors} error(s)")]
    BuildFailed { errors: usize },
    #[error("cannot write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a successful run produced.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub warnings: usize,
    /// Generated files, in emission order.
    pub generated: Vec<PathBuf>,
}

/// Serialised breakpoint-hint artifact.
#[derive(Serialize)]
struct BreakpointFile<'a> {
    version: &'a str,
    breakpoints: Vec<BreakpointEntry>,
}

#[derive(Serialize)]
struct BreakpointEntry {
    file: String,
    line: u32,
}

/// One compilation: owns the symbol table, options, diagnostics, and the
/// processed-file set for its lifetime.
pub struct Compiler {
    table: myra_sema::SymbolTable,
    options: CompileOptions,
    bag: DiagnosticBag,
    processed: FxHashSet<PathBuf>,
    check_only: bool,
    out_dir: PathBuf,
    generated: Vec<PathBuf>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_mode(false)
    }

    /// A compiler that analyses without writing any output files.
    pub fn check_only() -> Self {
        Self::with_mode(true)
    }

    fn with_mode(check_only: bool) -> Self {
        Compiler {
            table: myra_sema::SymbolTable::new(),
            options: CompileOptions::default(),
            bag: DiagnosticBag::new(),
            processed: FxHashSet::default(),
            check_only,
            out_dir: PathBuf::new(),
            generated: Vec::new(),
        }
    }

    /// All diagnostics reported so far, in order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.bag.diagnostics()
    }

    /// Transpile `entry` and everything it imports.
    pub fn compile(&mut self, entry: &Path) -> Result<BuildSummary, DriverError> {
        let entry = absolutize(entry);
        self.out_dir = output_dir_for(&entry);
        info!(entry = %entry.display(), out = %self.out_dir.display(), "compile");

        let result = self.compile_unit(&entry);
        match result {
            Ok(()) => {}
            Err(FatalError::Fatal(_) | FatalError::TooManyErrors) => {
                // Already recorded in the bag; unwinding discarded any
                // partial outputs for the failed unit.
            }
        }

        if self.bag.has_errors() {
            return Err(DriverError::BuildFailed {
                errors: self.bag.error_count(),
            });
        }

        if !self.check_only {
            self.write_breakpoints(&entry)?;
        }
        Ok(BuildSummary {
            warnings: self.bag.warning_count(),
            generated: std::mem::take(&mut self.generated),
        })
    }

    /// Compile one module file: lex, parse, recurse into imports, then
    /// analyze and emit.
    fn compile_unit(&mut self, path: &Path) -> CompileResult<()> {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if !self.processed.insert(canonical.clone()) {
            debug!(path = %canonical.display(), "already processed");
            return Ok(());
        }

        let file = canonical.to_string_lossy().replace('\\', "/");
        let src = match std::fs::read_to_string(&canonical) {
            Ok(src) => src,
            Err(err) => {
                return Err(self
                    .bag
                    .report(
                        Diagnostic::fatal(ErrorCode::E001)
                            .with_message(format!("cannot read '{file}': {err}"))
                            .at(file.clone(), Pos::DUMMY),
                    )
                    .expect_err("fatal diagnostics always abort"));
            }
        };

        let tokens = myra_lexer::tokenize(&src, &file, &mut self.bag)?;
        let mut module =
            myra_parse::parse_module(&tokens, &src, &file, &mut self.options, &mut self.bag)?;

        // Imports to completion before this module's semantic phase.
        let import_dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let imports: Vec<(String, Pos)> = module
            .imports
            .iter()
            .map(|i| (i.name.clone(), i.pos))
            .collect();
        for (name, pos) in imports {
            match self.resolve_import(&name, &import_dir) {
                Some(path) => self.compile_unit(&path)?,
                None => {
                    self.bag.report(
                        Diagnostic::error(ErrorCode::E300)
                            .with_message(format!("imported module '{name}' not found"))
                            .at(file.clone(), pos),
                    )?;
                }
            }
        }

        myra_sema::analyze(&mut module, &mut self.table, &self.options, &mut self.bag)?;

        // Emission is skipped when any error is present.
        if self.bag.has_errors() || self.check_only {
            return Ok(());
        }

        self.table.enter_module_scope(&module.name);
        let output = myra_codegen::emit_module(&module, &self.table, &self.options);
        self.table.leave_module_scope();

        self.write_output(&module.name, &output)?;
        Ok(())
    }

    /// Search the configured module directories, then the importing
    /// file's own directory, for `<name>.myra`.
    fn resolve_import(&self, name: &str, importing_dir: &Path) -> Option<PathBuf> {
        let file_name = format!("{name}.myra");
        for dir in &self.options.module_paths {
            let candidate = resolve_against_exe(dir).join(&file_name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        let local = importing_dir.join(&file_name);
        local.is_file().then_some(local)
    }

    fn write_output(
        &mut self,
        module_name: &str,
        output: &myra_codegen::CodegenOutput,
    ) -> CompileResult<()> {
        let header = self.out_dir.join(format!("{module_name}.h"));
        let source = self.out_dir.join(format!("{module_name}.cpp"));
        for (path, contents) in [(&header, &output.header), (&source, &output.source)] {
            if let Err(err) = std::fs::create_dir_all(&self.out_dir)
                .and_then(|()| std::fs::write(path, contents))
            {
                let file = path.to_string_lossy().into_owned();
                return Err(self
                    .bag
                    .report(
                        Diagnostic::fatal(ErrorCode::E001)
                            .with_message(format!("cannot write '{file}': {err}"))
                            .at(file.clone(), Pos::DUMMY),
                    )
                    .expect_err("fatal diagnostics always abort"));
            }
        }
        debug!(header = %header.display(), source = %source.display(), "wrote output pair");
        self.generated.push(header);
        self.generated.push(source);
        Ok(())
    }

    /// `#breakpoint` hints collected during parsing are serialised as
    /// JSON alongside the compiled artifact.
    fn write_breakpoints(&mut self, entry: &Path) -> Result<(), DriverError> {
        if self.options.breakpoints.is_empty() {
            return Ok(());
        }
        let stem = entry
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "module".to_string());
        let path = self.out_dir.join(format!("{stem}.breakpoints.json"));
        let file = BreakpointFile {
            version: "1.0",
            breakpoints: self
                .options
                .breakpoints
                .iter()
                .map(|Breakpoint { file, line }| BreakpointEntry {
                    file: file.clone(),
                    line: *line,
                })
                .collect(),
        };
        let json = serde_json::to_string(&file).unwrap_or_default();
        std::fs::write(&path, json).map_err(|source| DriverError::Io {
            path: path.clone(),
            source,
        })?;
        self.generated.push(path);
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Make a path absolute against the current directory without touching
/// the file system.
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Relative search paths resolve against the compiler executable's
/// location.
fn resolve_against_exe(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(path)))
        .unwrap_or_else(|| path.to_path_buf())
}

/// The emitter populates a `generated/` directory next to the project's
/// `src/`; when the entry module is not laid out that way, the output
/// lands in a `generated/` directory beside the entry file.
fn output_dir_for(entry: &Path) -> PathBuf {
    let entry_dir = entry.parent().unwrap_or_else(|| Path::new("."));
    let is_src = entry_dir
        .file_name()
        .is_some_and(|name| name.eq_ignore_ascii_case("src"));
    if is_src {
        entry_dir
            .parent()
            .unwrap_or(entry_dir)
            .join("generated")
    } else {
        entry_dir.join("generated")
    }
}

/// Render one diagnostic line plus the final counts, as shown to users
/// and IDE problem matchers.
pub fn render_report(diagnostics: &[Diagnostic], out: &mut impl std::io::Write) {
    for diagnostic in diagnostics {
        let _ = writeln!(out, "{diagnostic}");
    }
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    let _ = writeln!(out, "{errors} error(s), {warnings} warning(s)");
}

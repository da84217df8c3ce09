//! C++ code generation for the Myra compiler.
//!
//! Walks an analyzed module AST and produces the paired header and
//! source outputs. Static libraries wrap both in a namespace; shared
//! libraries decorate their public surface with dllexport/dllimport;
//! executables synthesize `main`. `#line` directives map generated
//! lines back to the Myra source for debuggers.
//!
//! The caller must have the module's scope entered in the symbol table
//! (the driver emits straight after analysis, with imports still set).

mod decls;
mod expr;
mod stmt;
mod types;
mod writer;

#[cfg(test)]
mod tests;

use myra_ir::{CompileOptions, ForeignTarget, Module, ModuleKind};
use myra_sema::SymbolTable;
use writer::Writer;

/// The generated header/source pair for one module.
#[derive(Debug, Clone)]
pub struct CodegenOutput {
    pub header: String,
    pub source: String,
}

/// Emit C++ for an analyzed module.
pub fn emit_module(
    module: &Module,
    table: &SymbolTable,
    options: &CompileOptions,
) -> CodegenOutput {
    let path = module.file.replace('\\', "/");
    let mut emitter = Emitter {
        module,
        table,
        options,
        path,
        current_receiver: None,
        current_routine_name: None,
    };
    emitter.run()
}

pub(crate) struct Emitter<'a> {
    pub(crate) module: &'a Module,
    pub(crate) table: &'a SymbolTable,
    pub(crate) options: &'a CompileOptions,
    /// Absolute source path, forward slashes, for `#line` directives.
    pub(crate) path: String,
    /// `Self` parameter name of the method being emitted.
    pub(crate) current_receiver: Option<String>,
    pub(crate) current_routine_name: Option<String>,
}

impl<'a> Emitter<'a> {
    fn run(&mut self) -> CodegenOutput {
        let header = self.build_header();
        let source = self.build_source();
        CodegenOutput { header, source }
    }

    fn build_header(&mut self) -> String {
        let mut w = Writer::default();
        w.line("#pragma once");
        w.blank();
        w.line("#include <cstdint>");
        w.line("#include <string>");
        w.line("#include <vector>");
        for import in &self.module.imports {
            w.line(&format!("#include \"{}.h\"", import.name));
        }
        for include in &self.options.include_headers {
            w.line(&format!("#include {include}"));
        }
        w.blank();

        for block in self
            .module
            .foreign_blocks
            .iter()
            .filter(|b| b.target == ForeignTarget::Header)
        {
            w.raw(&block.text);
            w.blank();
        }

        let wrap = self.module.kind.wraps_namespace();
        if wrap {
            w.line(&format!("namespace {} {{", self.module.name));
            w.blank();
        }

        self.emit_types(&mut w);
        self.emit_consts(&mut w);
        self.emit_var_declarations(&mut w);
        self.emit_routine_declarations(&mut w);

        if wrap {
            w.line(&format!("}} // namespace {}", self.module.name));
        }
        w.finish()
    }

    fn build_source(&mut self) -> String {
        let mut w = Writer::default();
        w.line(&format!("#include \"{}.h\"", self.module.name));
        let needs_runtime =
            self.module.kind == ModuleKind::Executable || !self.module.tests.is_empty();
        if needs_runtime {
            w.line("#include \"MyraRuntime.h\"");
        }
        if self.module.kind == ModuleKind::Executable {
            w.line(&format!(
                "#define MYRA_UNITTESTMODE {}",
                u8::from(self.options.unit_test_mode)
            ));
        }
        w.blank();

        for directive in &self.module.directives {
            w.line(&directive.text);
        }
        for block in self
            .module
            .foreign_blocks
            .iter()
            .filter(|b| b.target == ForeignTarget::Source)
        {
            w.raw(&block.text);
            w.blank();
        }

        let wrap = self.module.kind.wraps_namespace();
        if wrap {
            w.line(&format!("namespace {} {{", self.module.name));
            w.blank();
        }

        self.emit_var_definitions(&mut w);
        self.emit_routine_definitions(&mut w);
        self.emit_tests(&mut w);
        if self.module.kind == ModuleKind::Executable {
            self.emit_main(&mut w);
        }

        if wrap {
            w.line(&format!("}} // namespace {}", self.module.name));
        }
        w.finish()
    }
}

//! Declaration emission: types, constants, variables, routines, tests,
//! and the synthesized executable entry point.

use crate::types::convention_cpp;
use crate::writer::Writer;
use crate::Emitter;
use myra_ir::{ModuleKind, Routine, RoutineFlags, TypeDecl, TypeForm, VarDecl};

impl<'a> Emitter<'a> {
    // ─── Types ────────────────────────────────────────────────────────

    /// Forward declarations for every record, then the type definitions
    /// in declaration order.
    pub(crate) fn emit_types(&self, w: &mut Writer) {
        let records: Vec<&TypeDecl> = self
            .module
            .types
            .iter()
            .filter(|t| matches!(t.form, TypeForm::Record { .. }))
            .collect();
        for record in &records {
            w.line(&format!("struct {};", record.name));
        }
        if !records.is_empty() {
            w.blank();
        }
        for decl in &self.module.types {
            self.emit_type_decl(w, decl);
        }
    }

    fn emit_type_decl(&self, w: &mut Writer, decl: &TypeDecl) {
        match &decl.form {
            TypeForm::Record { parent, fields } => {
                match parent {
                    Some(parent) => w.open(&format!("struct {} : {} {{", decl.name, parent)),
                    None => w.open(&format!("struct {} {{", decl.name)),
                }
                w.line(&format!("virtual ~{}() = default;", decl.name));
                for field in fields {
                    w.line(&format!("{};", self.declarator(&field.ty, &field.name)));
                }
                w.close("};");
                w.blank();
            }
            TypeForm::RoutineType { .. } => {
                // Function-pointer alias; parameter names are dropped.
                w.line(&format!(
                    "using {} = {};",
                    decl.name,
                    self.cpp_of_form(&decl.form)
                ));
            }
            form => {
                w.line(&format!("using {} = {};", decl.name, self.cpp_of_form(form)));
            }
        }
    }

    fn param_cpp(&self, param: &myra_ir::Param) -> String {
        match param.mode {
            myra_ir::ParamMode::Var => format!("{}& {}", self.cpp_of_form(&param.ty), param.name),
            myra_ir::ParamMode::Const => {
                format!("const {}& {}", self.cpp_of_form(&param.ty), param.name)
            }
            myra_ir::ParamMode::Value => self.declarator(&param.ty, &param.name),
        }
    }

    // ─── Constants ────────────────────────────────────────────────────

    pub(crate) fn emit_consts(&self, w: &mut Writer) {
        for decl in &self.module.consts {
            let value = self.emit_expr(decl.value);
            match &decl.declared_type {
                Some(form) => w.line(&format!(
                    "inline const {} = {};",
                    self.declarator(form, &decl.name),
                    value
                )),
                None => {
                    let ty = self
                        .module
                        .arena
                        .ty(decl.value)
                        .map(|t| crate::types::cpp_type(self.table, t))
                        .unwrap_or_else(|| "auto".to_string());
                    w.line(&format!("inline const {} {} = {};", ty, decl.name, value));
                }
            }
        }
        if !self.module.consts.is_empty() {
            w.blank();
        }
    }

    // ─── Variables ────────────────────────────────────────────────────

    pub(crate) fn emit_var_declarations(&self, w: &mut Writer) {
        let dll = self.module.kind == ModuleKind::SharedLib;
        for var in self.module.vars.iter().filter(|v| v.public) {
            let declarator = self.declarator(&var.ty, &var.name);
            if dll {
                w.line(&format!("__declspec(dllimport) extern {declarator};"));
            } else {
                w.line(&format!("extern {declarator};"));
            }
        }
    }

    pub(crate) fn emit_var_definitions(&self, w: &mut Writer) {
        let dll = self.module.kind == ModuleKind::SharedLib;
        for var in &self.module.vars {
            let mut text = self.definition_text(var);
            if var.public {
                if dll {
                    text = format!("__declspec(dllexport) {text}");
                }
            } else {
                text = format!("static {text}");
            }
            if var.pos.line > 0 {
                w.line_directive(var.pos.line, &self.path);
            }
            w.line(&format!("{text};"));
        }
        if !self.module.vars.is_empty() {
            w.blank();
        }
    }

    fn definition_text(&self, var: &VarDecl) -> String {
        let declarator = self.declarator(&var.ty, &var.name);
        match var.init {
            Some(init) => format!("{declarator} = {}", self.emit_expr(init)),
            None => declarator,
        }
    }

    // ─── Routines ─────────────────────────────────────────────────────

    fn routine_signature(&self, routine: &Routine, c_variadic: bool) -> String {
        let ret = routine
            .ret
            .as_ref()
            .map_or_else(|| "void".to_string(), |r| self.cpp_of_form(r));
        let mut params: Vec<String> = routine.params.iter().map(|p| self.param_cpp(p)).collect();
        if routine.is_variadic() {
            if c_variadic {
                params.push("...".to_string());
            } else {
                params.push("Args... args".to_string());
            }
        }
        let conv = convention_cpp(routine.convention);
        format!("{ret} {conv}{}({})", routine.name, params.join(", "))
    }

    /// Header-side routine surface: declarations for public routines,
    /// full template bodies for variadics.
    pub(crate) fn emit_routine_declarations(&mut self, w: &mut Writer) {
        let dll = self.module.kind == ModuleKind::SharedLib;
        let routines: Vec<Routine> = self
            .module
            .routines
            .iter()
            .filter(|r| r.is_public())
            .cloned()
            .collect();
        for routine in &routines {
            if routine.is_variadic() && !routine.is_external() {
                // Template bodies live in the header, with no separate
                // declaration.
                w.line("template<typename... Args>");
                self.emit_routine_definition(w, routine, true);
                continue;
            }
            let signature = self.routine_signature(routine, routine.is_variadic());
            let abi_c = routine.flags.contains(RoutineFlags::ABI_C);
            let text = match (dll, abi_c) {
                (true, true) => format!("extern \"C\" __declspec(dllimport) {signature};"),
                (true, false) => format!("__declspec(dllimport) {signature};"),
                (false, true) => format!("extern \"C\" {signature};"),
                (false, false) => format!("{signature};"),
            };
            w.line(&text);
        }
        if !routines.is_empty() {
            w.blank();
        }
    }

    /// Source-side routine definitions. External routines have none;
    /// non-public ones are `static`.
    pub(crate) fn emit_routine_definitions(&mut self, w: &mut Writer) {
        let routines = self.module.routines.clone();
        for routine in &routines {
            if routine.is_external() {
                if !routine.is_public() {
                    // Module-private external surface still needs a
                    // declaration for its own callers.
                    let signature = self.routine_signature(routine, routine.is_variadic());
                    if routine.flags.contains(RoutineFlags::ABI_C) {
                        w.line(&format!("extern \"C\" {signature};"));
                    } else {
                        w.line(&format!("{signature};"));
                    }
                }
                continue;
            }
            if routine.is_variadic() {
                continue; // template body already in the header
            }
            self.emit_routine_definition(w, routine, false);
        }
    }

    fn emit_routine_definition(&mut self, w: &mut Writer, routine: &Routine, in_header: bool) {
        let dll = self.module.kind == ModuleKind::SharedLib;
        let abi_c = routine.flags.contains(RoutineFlags::ABI_C);
        let mut signature = self.routine_signature(routine, false);
        if !in_header {
            if !routine.is_public() {
                signature = format!("static {signature}");
            } else if dll {
                signature = match abi_c {
                    true => format!("extern \"C\" __declspec(dllexport) {signature}"),
                    false => format!("__declspec(dllexport) {signature}"),
                };
            }
        }

        self.current_receiver = routine
            .flags
            .contains(RoutineFlags::METHOD)
            .then(|| routine.params.first().map(|p| p.name.clone()))
            .flatten();
        self.current_routine_name = Some(routine.name.clone());

        if !in_header && routine.pos.line > 0 {
            w.line_directive(routine.pos.line, &self.path);
        }
        w.open(&format!("{signature} {{"));
        for local in &routine.locals {
            w.line(&format!("{};", self.definition_text(local)));
        }
        if let Some(body) = &routine.body {
            self.emit_block(w, body);
        }
        w.close("}");
        w.blank();

        self.current_receiver = None;
        self.current_routine_name = None;
    }

    // ─── Tests and entry point ────────────────────────────────────────

    /// Each `test 'desc'` becomes a parameterless function plus a
    /// file-scope registration initialiser.
    pub(crate) fn emit_tests(&self, w: &mut Writer) {
        for (index, test) in self.module.tests.iter().enumerate() {
            let name = format!("MyraTest_{index}");
            let desc = crate::expr::escape_cpp_string(&test.description);
            w.line(&format!("static void {name}();"));
            w.line(&format!(
                "static bool {name}_registered = UnitTest::RegisterTest(\"{desc}\", &{name}, \"{}\", {});",
                self.path, test.pos.line
            ));
            w.open(&format!("static void {name}() {{"));
            self.emit_block(w, &test.body);
            w.close("}");
            w.blank();
        }
    }

    /// `main` for executables: runtime init, optional unit-test
    /// dispatch, module body, `return 0`.
    pub(crate) fn emit_main(&self, w: &mut Writer) {
        w.open("int main(int argc, char* argv[]) {");
        w.line("SetCommandLine(argc, argv);");
        w.line("InitConsole();");
        w.raw("#if MYRA_UNITTESTMODE\n");
        w.line("return UnitTest::RunTests();");
        w.raw("#endif\n");
        if let Some(body) = &self.module.body {
            self.emit_block(w, body);
        }
        w.line("return 0;");
        w.close("}");
    }
}

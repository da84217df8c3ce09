//! Directive interpretation.
//!
//! A fixed set of `#name` directives is interpreted during parsing and
//! mutates the driver-level [`CompileOptions`]; everything else stays in
//! the output verbatim. Directive arguments are taken as the raw rest of
//! the line so that arguments like `x86_64-windows` or `"<cmath>"` do not
//! depend on how they happen to tokenize.

use crate::Parser;
use myra_diagnostic::{CompileResult, ErrorCode};
use myra_ir::{Abi, AppType, Breakpoint, ForeignTarget, OptimizationLevel, Pos, TargetTriple};
use std::path::PathBuf;

/// Strip one pair of surrounding quotes, if present.
fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

impl<'a> Parser<'a> {
    /// Interpret a directive if it is one of the recognised set.
    ///
    /// Returns `false` when the directive is unknown, in which case the
    /// caller keeps it as passthrough. `arg` is the trimmed raw remainder
    /// of the directive line.
    pub(crate) fn interpret_directive(
        &mut self,
        name: &str,
        arg: &str,
        pos: Pos,
    ) -> CompileResult<bool> {
        match name.to_ascii_lowercase().as_str() {
            "unittestmode" => {
                match arg.to_ascii_lowercase().as_str() {
                    "on" => self.options.unit_test_mode = true,
                    "off" => self.options.unit_test_mode = false,
                    _ => self.bad_directive_arg("unittestmode", arg, pos)?,
                }
                Ok(true)
            }
            "abi" => {
                match Abi::parse(arg) {
                    Some(abi) => self.options.abi = abi,
                    None => self.bad_directive_arg("abi", arg, pos)?,
                }
                Ok(true)
            }
            "emit" => {
                match arg.to_ascii_lowercase().as_str() {
                    "header" => self.options.emit_target = ForeignTarget::Header,
                    "source" => self.options.emit_target = ForeignTarget::Source,
                    _ => self.bad_directive_arg("emit", arg, pos)?,
                }
                Ok(true)
            }
            "optimization" => {
                match OptimizationLevel::parse(arg) {
                    Some(level) => self.options.optimization = level,
                    None => self.bad_directive_arg("optimization", arg, pos)?,
                }
                Ok(true)
            }
            "target" => {
                match TargetTriple::parse(arg) {
                    Some(target) => self.options.target = target,
                    None => self.bad_directive_arg("target", arg, pos)?,
                }
                Ok(true)
            }
            "apptype" => {
                match AppType::parse(arg) {
                    Some(app) => self.options.app_type = app,
                    None => self.bad_directive_arg("apptype", arg, pos)?,
                }
                Ok(true)
            }
            "include_header" => {
                self.options.include_headers.push(unquote(arg).to_string());
                Ok(true)
            }
            "include_path" => {
                self.options.include_paths.push(PathBuf::from(unquote(arg)));
                Ok(true)
            }
            "library_path" => {
                self.options.library_paths.push(PathBuf::from(unquote(arg)));
                Ok(true)
            }
            "module_path" => {
                self.options.module_paths.push(PathBuf::from(unquote(arg)));
                Ok(true)
            }
            "link" => {
                self.options.link_libraries.push(unquote(arg).to_string());
                Ok(true)
            }
            "breakpoint" => {
                self.options.breakpoints.push(Breakpoint {
                    file: self.file.to_string(),
                    line: pos.line,
                });
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn bad_directive_arg(&mut self, directive: &str, arg: &str, pos: Pos) -> CompileResult<()> {
        self.error(
            ErrorCode::E109,
            format!("invalid argument '{arg}' for #{directive}"),
            pos,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::unquote;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"<cmath>\""), "<cmath>");
        assert_eq!(unquote("  'lib/m'  "), "lib/m");
        assert_eq!(unquote("bare"), "bare");
        assert_eq!(unquote("\"unbalanced"), "\"unbalanced");
    }
}

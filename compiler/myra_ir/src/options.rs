//! Driver-level configuration collected from directives during parsing.
//!
//! The parser interprets a fixed set of `#name` directives and mutates a
//! [`CompileOptions`] that the emitter and the downstream build driver
//! read. Everything the front end does not interpret stays in the AST as
//! passthrough.

use crate::token::ForeignTarget;
use std::path::PathBuf;

/// Optimisation level requested with `#optimization`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum OptimizationLevel {
    #[default]
    Debug,
    ReleaseSafe,
    ReleaseFast,
    ReleaseSmall,
}

impl OptimizationLevel {
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "debug" => Some(OptimizationLevel::Debug),
            "releasesafe" => Some(OptimizationLevel::ReleaseSafe),
            "releasefast" => Some(OptimizationLevel::ReleaseFast),
            "releasesmall" => Some(OptimizationLevel::ReleaseSmall),
            _ => None,
        }
    }
}

/// Target triple requested with `#target`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum TargetTriple {
    #[default]
    Native,
    X86_64Windows,
    X86_64Linux,
    Aarch64Macos,
    Aarch64Linux,
    Wasm32Wasi,
}

impl TargetTriple {
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "native" => Some(TargetTriple::Native),
            "x86_64-windows" => Some(TargetTriple::X86_64Windows),
            "x86_64-linux" => Some(TargetTriple::X86_64Linux),
            "aarch64-macos" => Some(TargetTriple::Aarch64Macos),
            "aarch64-linux" => Some(TargetTriple::Aarch64Linux),
            "wasm32-wasi" => Some(TargetTriple::Wasm32Wasi),
            _ => None,
        }
    }
}

/// Application type requested with `#apptype`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum AppType {
    #[default]
    Console,
    Gui,
}

impl AppType {
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "console" => Some(AppType::Console),
            "gui" => Some(AppType::Gui),
            _ => None,
        }
    }
}

/// Foreign ABI for exported routines, toggled with `#abi`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Abi {
    C,
    #[default]
    Cpp,
}

impl Abi {
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "c" => Some(Abi::C),
            "cpp" => Some(Abi::Cpp),
            _ => None,
        }
    }
}

/// A `#breakpoint` hint, serialised alongside the compiled artifact.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Breakpoint {
    pub file: String,
    pub line: u32,
}

/// Configuration mutated during parse and consumed downstream.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// `#unittestmode on/off`; gates `test` blocks and the generated
    /// test-runner entry point.
    pub unit_test_mode: bool,
    /// Current `#abi` state; stamped onto routines at declaration.
    pub abi: Abi,
    /// Current `#emit` state; target for foreign blocks that name none.
    pub emit_target: ForeignTarget,
    pub optimization: OptimizationLevel,
    pub target: TargetTriple,
    pub app_type: AppType,
    /// `#include_header "<...>"` lines copied into generated headers.
    pub include_headers: Vec<String>,
    pub include_paths: Vec<PathBuf>,
    pub library_paths: Vec<PathBuf>,
    /// Module search directories for import resolution.
    pub module_paths: Vec<PathBuf>,
    /// `#link "..."` libraries, opaque to the front end.
    pub link_libraries: Vec<String>,
    pub breakpoints: Vec<Breakpoint>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            unit_test_mode: false,
            abi: Abi::default(),
            emit_target: ForeignTarget::Source,
            optimization: OptimizationLevel::default(),
            target: TargetTriple::default(),
            app_type: AppType::default(),
            include_headers: Vec::new(),
            include_paths: Vec::new(),
            library_paths: Vec::new(),
            module_paths: Vec::new(),
            link_libraries: Vec::new(),
            breakpoints: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimization_parse() {
        assert_eq!(
            OptimizationLevel::parse("ReleaseFast"),
            Some(OptimizationLevel::ReleaseFast)
        );
        assert_eq!(OptimizationLevel::parse("o3"), None);
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(
            TargetTriple::parse("aarch64-macos"),
            Some(TargetTriple::Aarch64Macos)
        );
        assert_eq!(TargetTriple::parse("mips"), None);
    }

    #[test]
    fn test_abi_parse() {
        assert_eq!(Abi::parse("C"), Some(Abi::C));
        assert_eq!(Abi::parse("cpp"), Some(Abi::Cpp));
        assert_eq!(Abi::parse("pascal"), None);
    }
}

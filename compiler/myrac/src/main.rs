//! Myra compiler CLI.

use myrac::{render_report, Compiler};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    myrac::tracing_setup::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }

    match args[1].as_str() {
        "build" => {
            if args.len() < 3 {
                eprintln!("Usage: myra build <file.myra>");
                return ExitCode::FAILURE;
            }
            run(Compiler::new(), &args[2])
        }
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: myra check <file.myra>");
                return ExitCode::FAILURE;
            }
            run(Compiler::check_only(), &args[2])
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn run(mut compiler: Compiler, path: &str) -> ExitCode {
    let result = compiler.compile(Path::new(path));
    let mut stderr = std::io::stderr();
    render_report(compiler.diagnostics(), &mut stderr);
    match result {
        Ok(summary) => {
            for file in &summary.generated {
                println!("{}", file.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            eprintln!("build failed");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("Myra compiler");
    println!();
    println!("Usage:");
    println!("  myra build <file.myra>   Transpile a module and its imports to C++");
    println!("  myra check <file.myra>   Analyze without writing output");
    println!("  myra help                Show this help");
    println!();
    println!("Environment:");
    println!("  MYRA_LOG    Log filter (RUST_LOG syntax), default 'warn'");
}

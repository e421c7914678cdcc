//! colgen CLI
//!
//! Commands:
//!   gen      - Scan an annotated file and write its generated sibling
//!   version  - Print version

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use colgen::{
    apply, file_stem, format_rust, parse_rules, read_file, Generator, Replacer, Result, VERSION,
};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "gen" => cmd_gen(&args[2..]),
        "version" | "--version" | "-v" => {
            println!("colgen {}", VERSION);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            Err("Unknown command".into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"
colgen - collection-method generator for Rust sources

USAGE:
    colgen <COMMAND> [OPTIONS]

COMMANDS:
    gen <file.rs>        Process //colgen directives in a file
    version              Print version

OPTIONS (gen):
    --list               Always use the List suffix for collection types
    --imports <a,b>      Extra `use` paths for the generated file
    --funcpkg <path>     Qualify the map/map_p converter helpers

EXAMPLES:
    colgen gen src/news.rs
    colgen gen src/news.rs --list --imports crate::db
"#
    );
}

fn cmd_gen(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Err("Usage: colgen gen <file.rs> [--list] [--imports a,b] [--funcpkg p]".into());
    }

    let filename = PathBuf::from(&args[0]);
    let use_list = args.contains(&"--list".to_string());
    let imports = flag_value(args, "--imports").unwrap_or_default();
    let func_pkg = flag_value(args, "--funcpkg").unwrap_or_default();

    let package_dir = filename
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let cl = read_file(&filename)?;

    if !cl.injection.is_empty() {
        eprintln!("replacing injections");
        replace_file(&filename, &package_dir, &cl.injection)?;
    }

    if cl.lines.is_empty() {
        eprintln!("no colgen lines found");
        return Ok(());
    }

    generate_file(&filename, &package_dir, &cl.lines, &cl.module_name, use_list, &imports, &func_pkg)
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == name)?;
    args.get(pos + 1).cloned()
}

fn replace_file(filename: &Path, package_dir: &Path, injection: &[String]) -> Result<()> {
    let mut rl = Replacer::new();
    rl.use_package_dir(package_dir)?;
    let rules = rl.generate(injection)?;

    let content = fs::read_to_string(filename)?;
    fs::write(filename, apply(&content, &rules))?;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn generate_file(
    filename: &Path,
    package_dir: &Path,
    lines: &[String],
    module_name: &str,
    use_list: bool,
    imports: &str,
    func_pkg: &str,
) -> Result<()> {
    let rules = parse_rules(lines, use_list)?;

    let mut g = Generator::new(module_name, imports, func_pkg);
    g.use_package_dir(package_dir)?;

    let mut data = g.generate(&rules)?;

    // formatting failure is recoverable; emit the raw buffer instead
    match format_rust(&data) {
        Ok(formatted) => data = formatted,
        Err(e) => {
            eprintln!("failed to format: {}", e);
            eprintln!("saving anyway");
        }
    }

    let out_path = filename.with_file_name(format!("{}_colgen.rs", file_stem(filename)));
    fs::write(out_path, data)?;

    Ok(())
}

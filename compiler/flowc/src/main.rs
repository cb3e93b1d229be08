//! Flow graph compiler CLI

use flowc::commands::{compile_file, list_kinds, run_file};
use flowc::options::{parse_options, CompileOptions};

fn main() {
    flowc::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "compile" => {
            if args.len() < 3 {
                eprintln!("Usage: flowc compile <graph.json> [options]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --emit=<format>     Emit: listing (default), json, bin");
                eprintln!("  -o <path>           Output file (default: stdout)");
                eprintln!("  -v, --verbose       Print unit statistics");
                std::process::exit(1);
            }
            let options = collect_options(&args[3..]);
            compile_file(&args[2], &options);
        }
        "run" => {
            if args.len() < 3 {
                eprintln!("Usage: flowc run <graph.json> [options]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --answer=<name>=<literal>  Value host function <name> returns");
                eprintln!("  -v, --verbose              Print a run summary");
                std::process::exit(1);
            }
            let options = collect_options(&args[3..]);
            run_file(&args[2], &options);
        }
        "kinds" => {
            list_kinds();
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-V" => {
            println!("flowc {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            // A bare document path means `compile`
            if std::path::Path::new(command)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            {
                compile_file(command, &CompileOptions::default());
            } else {
                eprintln!("Unknown command: {command}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
}

/// Parse options, handling -o specially (needs lookahead).
fn collect_options(args: &[String]) -> CompileOptions {
    let mut options = CompileOptions::default();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "-o" && i + 1 < args.len() {
            options.output = Some(std::path::PathBuf::from(&args[i + 1]));
            i += 2;
        } else {
            let parsed = parse_options(&args[i..=i]);
            options.merge(&parsed);
            i += 1;
        }
    }
    options
}

fn print_usage() {
    println!("Flow graph compiler");
    println!();
    println!("Usage: flowc <command> [options]");
    println!();
    println!("Commands:");
    println!("  compile <graph.json>  Compile a graph document");
    println!("  run <graph.json>      Compile and run on the reference machine");
    println!("  kinds                 List built-in node kinds and their ports");
    println!("  help                  Show this help message");
    println!("  version               Show version information");
    println!();
    println!("Compile options:");
    println!("  --emit=<format>       Emit: listing (default), json, bin");
    println!("  -o <path>             Output file path");
    println!("  -v, --verbose         Print unit statistics");
    println!();
    println!("Run options:");
    println!("  --answer=<name>=<literal>  Value host function <name> returns");
    println!("  -v, --verbose              Print a run summary");
    println!();
    println!("Environment:");
    println!("  RUST_LOG=<filter>     Enable tracing (e.g. flow_compile=trace)");
    println!();
    println!("Examples:");
    println!("  flowc compile graph.json");
    println!("  flowc compile graph.json --emit=bin -o graph.bin");
    println!("  flowc run graph.json --answer=query_number=4");
    println!("  flowc kinds");
}

mod config;
mod test_runner;

use std::path::Path;
use std::process;

use blockly::{ParseError, Parser as BlocklyParser, ParserConfig, Registry};
use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "blockly2rs", version, about = "Blockly XML to typed blocks")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML file with parser settings
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a Blockly XML file with the standard block catalogue
    Parse(ParseArgs),

    /// Run .test.xml fixture files
    Test(TestArgs),

    /// List the registered block types and their members
    List,
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Blockly XML source file
    file: String,

    /// Parse only, print nothing on success (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Print the tag tree instead of the bound blocks
    #[arg(long)]
    tree: bool,

    /// Bind every top-level block instead of only the first
    #[arg(long)]
    all: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.xml file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let parser_config = match &cli.config {
        Some(path) => match config::load(Path::new(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        },
        None => ParserConfig::default(),
    };

    let registry = match blocks::standard_registry() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Command::Parse(args) => do_parse(args, &registry, parser_config, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(
                path,
                &registry,
                &parser_config,
                cli.no_color,
                &test_args.category,
            );
            process::exit(exit_code);
        }
        Command::List => list_blocks(&registry),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn do_parse(args: ParseArgs, registry: &Registry, config: ParserConfig, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    // Read source
    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    // Set up codespan file database
    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());
    let parser = BlocklyParser::with_config(registry, ParserConfig { file_id, ..config });

    let result = if args.tree {
        parser.parse_tree(&source).map(|roots| {
            roots.iter().map(|root| root.to_string()).collect::<String>()
        })
    } else if args.all {
        parser
            .parse_all(&source)
            .map(|blocks| format!("{:#?}", blocks))
    } else {
        parser.parse(&source).map(|block| format!("{:#?}", block))
    };

    match result {
        Ok(output) => {
            if args.check {
                eprintln!("ok: {} parsed successfully", args.file);
            } else {
                print!("{}", output);
                if !output.ends_with('\n') {
                    println!();
                }
            }
        }
        Err(error) => {
            emit_parse_error(color_choice, &files, &error);
            process::exit(1);
        }
    }
}

fn emit_parse_error(color_choice: ColorChoice, files: &SimpleFiles<String, String>, error: &ParseError) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    let diagnostic = error.to_diagnostic();
    let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
}

fn list_blocks(registry: &Registry) {
    for tag in registry.tags() {
        let Some(descriptor) = registry.lookup(tag) else {
            continue;
        };
        println!("{} ({})", tag, descriptor.type_name());
        for (name, kind) in descriptor.fields() {
            println!("  field {}: {}", name, kind);
        }
        for name in descriptor.values() {
            println!("  value {}", name);
        }
        for name in descriptor.statements() {
            println!("  statement {}", name);
        }
    }
}

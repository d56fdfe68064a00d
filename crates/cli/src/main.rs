mod report;

use anyhow::{Context, Result, bail};
use argtree::{Parser as GrammarParser, TokenType, render_command_line, tokenizer};
use argtree_schema::GrammarFile;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

use crate::report::{ParseReport, outline};

#[derive(Parser)]
#[command(name = "argtree")]
#[command(version, about = "Command-line grammar engine tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a grammar file and print its outline
    Check(CheckArgs),

    /// Parse arguments against a grammar file
    Parse(ParseArgs),

    /// Print completion suggestions for a partial command line
    Suggest(SuggestArgs),
}

#[derive(Parser)]
struct CheckArgs {
    /// The grammar file to check
    #[arg(value_name = "FILE")]
    grammar: PathBuf,

    /// Print the normalized grammar as JSON instead of an outline
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ParseArgs {
    /// Grammar file describing the command tree
    #[arg(short, long, value_name = "FILE")]
    grammar: PathBuf,

    /// Print a JSON report instead of the diagram
    #[arg(long)]
    json: bool,

    /// Arguments to parse (pass them after `--`)
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Parser)]
struct SuggestArgs {
    /// Grammar file describing the command tree
    #[arg(short, long, value_name = "FILE")]
    grammar: PathBuf,

    /// Cursor position in characters (default: end of input)
    #[arg(short, long)]
    position: Option<usize>,

    /// The partial command line
    #[arg(value_name = "LINE", default_value = "", allow_hyphen_values = true)]
    line: String,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => check(args),
        Commands::Parse(args) => parse(args),
        Commands::Suggest(args) => suggest(args),
    }
}

fn load(path: &Path) -> Result<GrammarParser> {
    let grammar = GrammarFile::from_file(path)?;
    let tree = grammar
        .build()
        .with_context(|| format!("failed to compile grammar: {}", path.display()))?;
    Ok(GrammarParser::new(tree))
}

fn check(args: CheckArgs) -> Result<()> {
    tracing::debug!("executing check command");

    let parser = load(&args.grammar)?;
    if args.json {
        println!("{}", GrammarFile::from_tree(parser.tree()).to_json_pretty()?);
    } else {
        print!("{}", outline(parser.tree()));
        eprintln!("OK: {} symbol(s)", parser.tree().len());
    }
    Ok(())
}

fn parse(args: ParseArgs) -> Result<()> {
    tracing::debug!("executing parse command");

    let parser = load(&args.grammar)?;
    let result = parser.parse(args.args.iter().cloned());

    if let Some(values) = result.directive("suggest") {
        // The completion request covers everything after the directives.
        let rest: Vec<&str> = result
            .tokens()
            .iter()
            .filter(|t| t.token_type() == TokenType::Directive)
            .filter_map(|t| t.position())
            .max()
            .map(|last| args.args[last + 1..].iter().map(String::as_str).collect())
            .unwrap_or_default();
        let line = render_command_line(&rest);
        let position = match values.last() {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("invalid suggest position: {raw}"))?,
            None => line.chars().count(),
        };
        for suggestion in &parser.suggest(&line, position) {
            println!("{suggestion}");
        }
        return Ok(());
    }

    if args.json {
        let report = ParseReport::new(&result);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", result.diagram());
        for error in result.errors() {
            eprintln!("error: {error}");
        }
    }

    if result.has_errors() {
        bail!("{} parse error(s)", result.errors().len());
    }
    Ok(())
}

fn suggest(args: SuggestArgs) -> Result<()> {
    tracing::debug!("executing suggest command");

    let parser = load(&args.grammar)?;
    let position = args
        .position
        .unwrap_or_else(|| args.line.chars().count());
    if tokenizer::parse_directive(args.line.trim()).is_some() {
        bail!("directives are not allowed in a suggest request");
    }
    for suggestion in &parser.suggest(&args.line, position) {
        println!("{suggestion}");
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

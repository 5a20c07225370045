// ==============================================================================
// CLI for the OpenAPI TypeScript Generator
// ==============================================================================
//
//   openapi-typegen [--use-enums] [--namespace NS] [--used-names] INPUT [OUTPUT]
//
// Compiles INPUT (and every document it references) to TypeScript
// declarations, written to OUTPUT or stdout. With `--used-names`, prints the
// names the declarations refer to instead, one per line.

use std::fs;
use std::io;
use std::path::PathBuf;

use miette::{Context, IntoDiagnostic};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use openapi_typegen::TypeGen;

const USAGE: &str = "\
Usage: openapi-typegen [OPTIONS] INPUT [OUTPUT]

Compile an OpenAPI document and the documents it references into TypeScript
type declarations. Writes to OUTPUT, or to stdout if omitted or `-`.

Options:
      --use-enums       Emit inline enums as named `export enum` declarations
  -n, --namespace NS    Prefix references to declared types with `NS.`
      --used-names      Print the referenced type names instead of declarations
  -h, --help            Print this help

Set OPENAPI_TYPEGEN_LOG (e.g. `debug`) to control log output on stderr.";

/// Environment variable holding the `tracing` filter directives.
const LOG_ENV: &str = "OPENAPI_TYPEGEN_LOG";

// ==============================================================================
// CLI Argument Definitions
// ==============================================================================

#[derive(Debug, Default)]
struct Args {
    use_enums: bool,
    namespace: Option<String>,
    used_names: bool,
    input: Option<String>,
    output: Option<String>,
}

enum Command {
    Help,
    Run(Args),
}

fn parse_args() -> Result<Command, lexopt::Error> {
    use lexopt::prelude::*;

    let mut args = Args::default();
    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Long("use-enums") => args.use_enums = true,
            Short('n') | Long("namespace") => args.namespace = Some(parser.value()?.string()?),
            Long("used-names") => args.used_names = true,
            Short('h') | Long("help") => return Ok(Command::Help),
            Value(value) if args.input.is_none() => args.input = Some(value.string()?),
            Value(value) if args.output.is_none() => args.output = Some(value.string()?),
            _ => return Err(arg.unexpected()),
        }
    }
    Ok(Command::Run(args))
}

// ==============================================================================
// Entry Point
// ==============================================================================

fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().build())
    }))?;
    init_tracing();

    let args = match parse_args()
        .into_diagnostic()
        .wrap_err("invalid arguments (see --help)")?
    {
        Command::Help => {
            println!("{USAGE}");
            return Ok(());
        }
        Command::Run(args) => args,
    };
    run(args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_filter(filter);

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn run(args: Args) -> miette::Result<()> {
    let Some(input) = args.input else {
        miette::bail!("missing INPUT document (see --help)");
    };

    let mut generator = TypeGen::new();
    generator.use_enums(args.use_enums);
    if let Some(namespace) = args.namespace {
        generator.namespace(namespace);
    }

    let output = generator
        .generate(&input)
        .wrap_err_with(|| format!("compile {input}"))?;

    let content = if args.used_names {
        output.used_names.join("\n")
    } else {
        output.declarations.join("\n\n")
    };
    write_output(args.output.as_deref(), &content)
}

/// Write output to a file or stdout, with a trailing newline.
fn write_output(output: Option<&str>, content: &str) -> miette::Result<()> {
    let content = if content.is_empty() {
        String::new()
    } else {
        format!("{content}\n")
    };

    match output {
        None | Some("-") => {
            // Exit quietly when the reader goes away early, e.g.
            // `openapi-typegen api.yaml | head -1`.
            use std::io::Write;
            if let Err(e) = io::stdout().write_all(content.as_bytes()) {
                if e.kind() == io::ErrorKind::BrokenPipe {
                    return Ok(());
                }
                return Err(e).into_diagnostic().wrap_err("write to stdout");
            }
            Ok(())
        }
        Some(path) => {
            let path = PathBuf::from(path);
            fs::write(&path, content)
                .into_diagnostic()
                .wrap_err_with(|| format!("write {}", path.display()))
        }
    }
}

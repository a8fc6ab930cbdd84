use std::process;

use clap::Parser;

use llgen::flags;
use llgen::{emit, Compiler, Flags, Output, Source};

#[derive(Parser)]
#[command(name = "llgen")]
#[command(about = "Generates an LL(1) recursive-descent parser in Rust from a grammar specification")]
struct Args {
    /// Check that the grammar is LL(1)
    #[arg(long = "LL1", require_equals = true, num_args = 0..=1)]
    ll1: Option<Option<String>>,

    /// Generate parser stubs after the token definitions
    #[arg(long, require_equals = true, num_args = 0..=1)]
    parser: Option<Option<String>>,

    /// Read the semantic section
    #[arg(long, require_equals = true, num_args = 0..=1)]
    semantics: Option<Option<String>>,

    /// Directory the generated files are written to
    #[arg(long, require_equals = true, num_args = 0..=1)]
    destdir: Option<Option<String>>,

    /// Emit token patterns
    #[arg(long, require_equals = true, num_args = 0..=1)]
    pattern: Option<Option<String>>,

    /// Check the specification without writing anything
    #[arg(long, require_equals = true, num_args = 0..=1)]
    nowrite: Option<Option<String>>,

    /// Debug level
    #[arg(long, require_equals = true, num_args = 0..=1)]
    debug: Option<Option<String>>,

    /// Emit the token definition file
    #[arg(long = "Token", require_equals = true, num_args = 0..=1)]
    token: Option<Option<String>>,

    /// Module path the generated parser imports its runtime from
    #[arg(long, require_equals = true, num_args = 0..=1)]
    runtime: Option<Option<String>>,

    /// Specification files, `-` for standard input
    sources: Vec<String>,
}

impl Args {
    /// The flags given on the command line, in `key[=value]` form.
    fn flag_specs(&self) -> Vec<String> {
        let given = [
            (flags::LL1, &self.ll1),
            (flags::PARSER, &self.parser),
            (flags::SEMANTICS, &self.semantics),
            (flags::DESTDIR, &self.destdir),
            (flags::PATTERN, &self.pattern),
            (flags::NOWRITE, &self.nowrite),
            (flags::DEBUG, &self.debug),
            (flags::TOKEN, &self.token),
            (flags::RUNTIME, &self.runtime),
        ];
        given
            .iter()
            .filter_map(|(key, value)| match value {
                None => None,
                Some(None) => Some(key.to_string()),
                Some(Some(value)) => Some(format!("{}={}", key, value)),
            })
            .collect()
    }
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("{}", err);
    process::exit(1)
}

fn report(compiler: &Compiler, output: &Output) -> anyhow::Result<()> {
    if let Some(note) = &output.note {
        eprintln!("{}", note);
    }
    if let Some(summary) = &output.summary {
        print!("{}", summary);
    }
    let config = compiler.flags();
    if config.is_set(flags::NOWRITE) {
        return Ok(());
    }
    let dir = config.destdir()?;
    let written = emit::write_units(&dir, &output.units)?;
    println!();
    println!("Rust source files created:");
    for path in written {
        if let Some(name) = path.file_name() {
            println!("  {}", name.to_string_lossy());
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    let mut flags = Flags::new();
    for spec in args.flag_specs() {
        if let Err(err) = flags.apply(&spec) {
            fail(err);
        }
    }
    let sources: Vec<Source> = if args.sources.is_empty() {
        vec![Source::Stdin]
    } else {
        args.sources.iter().map(|s| Source::from_arg(s)).collect()
    };

    let mut compiler = Compiler::new(flags, sources);
    let output = match compiler.run() {
        Ok(output) => output,
        Err(err) => fail(err),
    };
    if let Err(err) = report(&compiler, &output) {
        fail(format!("{:#}", err));
    }
}

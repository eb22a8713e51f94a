//! dotgo command line interface

use clap::Parser;
use dotgo::{classify, driver, parser};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dotgo", version = dotgo::VERSION)]
#[command(about = "Translate Go with infix vector operators into standard Go")]
struct Cli {
    /// Input source file
    input: PathBuf,

    /// Stop after writing the translated source, skipping the compiler
    #[arg(long)]
    just_translate: bool,

    /// Inline the named top-level function (repeatable)
    #[arg(long, value_name = "FUNC")]
    inline: Vec<String>,

    /// Print the neutralized parse buffer and exit
    #[arg(long)]
    emit_classified: bool,

    /// Print the rewritten tree and exit
    #[arg(long)]
    emit_ast: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.emit_classified || cli.emit_ast {
        let source = std::fs::read_to_string(&cli.input).into_diagnostic()?;
        let buf = classify::classify(&source);
        let classified = String::from_utf8(buf).into_diagnostic()?;
        if cli.emit_classified {
            print!("{}", classified);
        }
        if cli.emit_ast {
            let (file, errors) = parser::parse_file(&classified, false);
            for err in &errors {
                eprintln!("{}: {}", cli.input.display(), err);
            }
            let file = dotgo::rewrite::rewrite(file, &source, &classified);
            println!("{:#?}", file);
        }
        return Ok(());
    }

    let opts = driver::Options {
        input: cli.input,
        just_translate: cli.just_translate,
        inline: cli.inline,
    };
    let warnings = driver::run(&opts).into_diagnostic()?;
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

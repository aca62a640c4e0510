use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::lex::Lexer;
use crate::frontend::parse::Parser;
use crate::frontend::printer;
use crate::frontend::semantic;
use crate::frontend::token::TokenKind;
use anyhow::Context;
use anyhow::Result;
use std::fs::File;
use std::path::PathBuf;
use std::process;

#[derive(clap::Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input source file
    file: PathBuf,

    /// Run the lexer, dump the tokens and stop afterwards
    #[arg(short, long)]
    lex: bool,

    /// Run the lexer and parser, dump the tree and stop afterwards
    #[arg(short, long)]
    parse: bool,

    /// Pretty-print the validated tree after analysis succeeds
    #[arg(short = 'T', long = "tree")]
    tree: bool,
}

pub fn cli() -> Result<()> {
    let args = <Cli as clap::Parser>::parse();

    let path = args.file.display().to_string();
    let file = File::open(&args.file).with_context(|| format!("could not open file {}", path))?;
    let mut lexer = Lexer::new(file, path.as_str());

    if args.lex {
        loop {
            let token = lexer.next_token();
            match token.kind {
                TokenKind::End => break,
                TokenKind::Error => {
                    report(lexer.take_failure().unwrap_or_else(|| {
                        Diagnostic::lexical(&path, token.span.start, token.text())
                    }));
                }
                _ => println!("{}", token),
            }
        }
        return Ok(());
    }

    let ast = match Parser::new(lexer).parse_program() {
        Ok(ast) => ast,
        Err(diagnostic) => report(diagnostic),
    };

    if args.parse {
        println!("{:?}", ast);
        return Ok(());
    }

    let ast = match semantic::analyze(ast, &path) {
        Ok(ast) => ast,
        Err(diagnostic) => report(diagnostic),
    };

    if args.tree {
        print!("{}", printer::render(&ast));
    }

    Ok(())
}

/// Prints the single diagnostic line and exits with a failure status; the
/// first error ends the run.
fn report(diagnostic: Diagnostic) -> ! {
    eprintln!("{}", diagnostic);
    process::exit(1);
}

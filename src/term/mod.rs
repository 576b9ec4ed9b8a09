extern crate ansi_term;
extern crate ctrlc;
extern crate linefeed;
use crate::lang::token::Token;
use crate::lang::{read_source, Error, Lexer, ReadMode, SymbolTable};
use crate::mach::{Event, Limits, Program, Runtime, Word};
use ansi_term::Style;
use linefeed::{Interface, ReadResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Options {
    listing: bool,
    tokens: bool,
    mode: Option<ReadMode>,
    filename: Option<String>,
}

impl Options {
    fn parse<I: Iterator<Item = String>>(args: I) -> Result<Options, String> {
        let mut options = Options::default();
        for arg in args {
            match arg.as_str() {
                "-s" => options.listing = true,
                "-t" => options.tokens = true,
                "--full" => options.mode = Some(ReadMode::WholeFile),
                s if s.starts_with('-') => return Err(format!("unknown option {}", s)),
                _ if options.filename.is_some() => return Err("too many files".to_string()),
                _ => options.filename = Some(arg),
            }
        }
        Ok(options)
    }
}

pub fn main() {
    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("usage: c4 [-s] [-t] [--full] [file]");
            std::process::exit(-1);
        }
    };
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    if let Err(error) = ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    }) {
        eprintln!("Error setting Ctrl-C handler: {}", error);
    }
    let status = match &options.filename {
        Some(filename) => match run_file(filename, &options, interrupted) {
            Ok(code) => code as i32,
            Err(error) => {
                print_error(&error);
                error.status()
            }
        },
        None => match token_loop() {
            Ok(()) => 0,
            Err(error) => {
                eprintln!("{}", error);
                -1
            }
        },
    };
    std::process::exit(status);
}

fn print_error(error: &Error) {
    println!("{}", Style::new().bold().paint(error.to_string()));
}

fn describe(token: &Token, symbols: &SymbolTable) -> String {
    match token {
        Token::Ident(id) => match symbols.get(*id) {
            Some(symbol) => format!("{} {}", token.code(), symbol.name()),
            None => format!("{} {}", token.code(), token),
        },
        _ => format!("{} {}", token.code(), token),
    }
}

fn run_file(
    filename: &str,
    options: &Options,
    interrupted: Arc<AtomicBool>,
) -> Result<Word, Error> {
    let limits = Limits::default();
    let mode = options.mode.unwrap_or(ReadMode::FirstLine);
    let src = read_source(filename, mode, limits.pool_size)?;
    let mut lexer = Lexer::new(&src)?;
    while let Some(token) = lexer.next() {
        if options.tokens {
            println!("{}: {}", lexer.line(), describe(&token, lexer.symbols()));
        }
    }
    let (_, data, errors) = lexer.finish();
    for error in errors.iter() {
        println!("{}", Style::new().bold().paint(format!("?{}", error)));
    }

    let program = Program::bootstrap();
    if options.listing {
        print!("{}", program);
    }
    let mut runtime = Runtime::new(limits, data)?;
    runtime.load(&program)?;
    runtime.start(0);
    let cycles = runtime.limits().cycles;
    loop {
        if interrupted.load(Ordering::SeqCst) {
            runtime.interrupt();
            interrupted.store(false, Ordering::SeqCst);
        };
        match runtime.execute(cycles) {
            Event::Running => {}
            Event::Print(s) => print!("{}", s),
            Event::Exit(code) => {
                println!("exit({})", code);
                return Ok(code);
            }
            Event::Error(error) => return Err(error),
            Event::Stopped => return Ok(0),
        }
    }
}

/// Tokenizes each line typed at the prompt.
fn token_loop() -> std::io::Result<()> {
    let interface = Interface::new("c4")?;
    interface.set_prompt("c4> ")?;
    while let ReadResult::Input(line) = interface.read_line()? {
        let mut lexer = match Lexer::new(&line) {
            Ok(lexer) => lexer,
            Err(error) => {
                print_error(&error);
                continue;
            }
        };
        let mut out = vec![];
        while let Some(token) = lexer.next() {
            out.push(describe(&token, lexer.symbols()));
        }
        for s in out.iter() {
            interface.write_fmt(format_args!("{}\n", s))?;
        }
        for error in lexer.errors() {
            interface.write_fmt(format_args!(
                "{}\n",
                Style::new().bold().paint(format!("?{}", error))
            ))?;
        }
        if !line.trim().is_empty() {
            interface.add_history_unique(line.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> impl Iterator<Item = String> + '_ {
        s.split_whitespace().map(String::from)
    }

    #[test]
    fn test_options() {
        let o = Options::parse(args("-s --full prog.c")).unwrap();
        assert!(o.listing);
        assert!(!o.tokens);
        assert_eq!(o.mode, Some(ReadMode::WholeFile));
        assert_eq!(o.filename.as_deref(), Some("prog.c"));
        assert!(Options::parse(args("-x")).is_err());
        assert!(Options::parse(args("a.c b.c")).is_err());
    }
}

use std::fs;

use clap::Parser;
use rill::{Env, Function, Functions, Script, Stopped, Value};

/// rill is a small scripting language with arbitrary-precision arithmetic
/// and line-by-line observation.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Tells rill to treat the input as a file path instead of a script.
    #[arg(short, long)]
    file: bool,

    /// Print each executed line number to stderr while the script runs.
    #[arg(short, long)]
    trace: bool,

    contents: String,
}

fn main() {
    let args = Args::parse();

    let source = if args.file {
        fs::read_to_string(&args.contents).unwrap_or_else(|_| {
            eprintln!("Failed to read the input file '{}'. Perhaps this file does not exist?",
                      &args.contents);
            std::process::exit(1);
        })
    } else {
        args.contents
    };

    let mut host = Functions::new();
    host.insert("print".to_string(), print_function(false));
    host.insert("println".to_string(), print_function(true));
    let script = Script::new(&source, host);

    let result = if args.trace {
        let mut observer = |number: usize, _vars: &Env| -> Result<(), Stopped> {
            if number > 0 {
                eprintln!("line {number}");
            }
            Ok(())
        };
        script.run_observed(&mut observer)
    } else {
        script.run()
    };

    match result {
        Ok(Value::Null) => {},
        Ok(value) => println!("Returned: {value}"),
        Err(e) if e.is_stopped() => eprintln!("Stopped"),
        Err(e) => eprintln!("{e}"),
    }
}

fn print_function(newline: bool) -> Function {
    Function::host(move |stack: &mut Vec<Value>| {
        let value = rill::pop_value(stack)?;
        if newline {
            println!("{value}");
        } else {
            print!("{value}");
        }
        Ok(None)
    })
}

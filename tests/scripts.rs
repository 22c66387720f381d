use std::{cell::RefCell, fs, rc::Rc};

use rill::{Function, Functions, Script, Value};
use walkdir::WalkDir;

/// Runs every demo script under `demos/` with capturing `print`/`println`
/// functions and expects each to finish without an error.
#[test]
fn demo_scripts_run_clean() {
    let mut count = 0;

    for entry in
        WalkDir::new("demos").into_iter()
                             .filter_map(Result::ok)
                             .filter(|e| e.path().extension().is_some_and(|ext| ext == "script"))
    {
        count += 1;
        let path = entry.path();
        let source =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));

        let output = Rc::new(RefCell::new(String::new()));
        let mut functions = Functions::new();
        for (name, newline) in [("print", false), ("println", true)] {
            let sink = Rc::clone(&output);
            functions.insert(name.to_string(),
                             Function::host(move |stack: &mut Vec<Value>| {
                                 let value = rill::pop_value(stack)?;
                                 let mut out = sink.borrow_mut();
                                 out.push_str(&value.to_string());
                                 if newline {
                                     out.push('\n');
                                 }
                                 Ok(None)
                             }));
        }

        let script = Script::new(&source, functions);
        if let Err(e) = script.run() {
            panic!("demo script {path:?} failed:\n{}\nError: {e}", source);
        }
    }

    assert!(count > 0, "No demo scripts found in demos/");
}

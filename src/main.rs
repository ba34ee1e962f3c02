//! Terminal demonstrator: highlight a source file and print it with ANSI
//! colors, exercising the registry, the import path and the scheduled
//! highlight passes exactly the way an embedding host would.

use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use limelight::{Editor, EditorConfig, Fragment, LanguageRegistry, PassOutcome, Result, Style};

fn style_color(style: Style) -> Option<&'static str> {
    let code = match style {
        Style::Keyword => "1;35",
        Style::Atom | Style::Unit | Style::ColorCode => "36",
        Style::String | Style::Attribute => "32",
        Style::Comment | Style::Cdata => "90",
        Style::LocalVariable => "4;36",
        Style::VariableDef => "1;36",
        Style::Property | Style::AttName | Style::Value => "33",
        Style::TagName | Style::At | Style::Important => "1;34",
        Style::Operator | Style::Compare | Style::SelectOp => "35",
        Style::Error => "1;31",
        _ => return None,
    };
    Some(code)
}

fn print_highlighted(editor: &Editor) {
    let seq = editor.fragments();
    for id in seq.iter() {
        match seq.get(id) {
            Some(Fragment::Break(_)) => println!(),
            Some(Fragment::Text(t)) => match style_color(t.style) {
                Some(code) => print!("\x1b[{code}m{}\x1b[0m", t.text),
                None => print!("{}", t.text),
            },
            None => {}
        }
    }
    println!();
}

fn run(path: &str, language: Option<&str>) -> Result<()> {
    let registry = LanguageRegistry::with_builtins();
    let mut config = EditorConfig::default();
    match language {
        Some(name) => config.language = name.to_string(),
        None => {
            if let Some(detected) = registry.detect(Path::new(path)) {
                config.language = detected.name().to_string();
            }
        }
    }

    let mut editor = Editor::with_registry(&registry, config)?;
    let content = fs::read_to_string(path)?;
    editor.import_text(&content);

    // Drive the background passes to completion, as a host timer would.
    while editor.run_highlight_pass()? == PassOutcome::Reschedule {}

    print_highlighted(&editor);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (path, language) = match args.as_slice() {
        [path] => (path.as_str(), None),
        [path, lang] => (path.as_str(), Some(lang.as_str())),
        _ => {
            eprintln!("usage: limelight <file> [language]");
            return ExitCode::FAILURE;
        }
    };

    match run(path, language) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("limelight: {err}");
            ExitCode::FAILURE
        }
    }
}

use anyhow::Context;
use cellml_io::{Format, Parser};
use std::env;
use std::fs::read_to_string;
use std::process::ExitCode;

/// Parse every CellML file named on the command line and report the issues
/// found in each, one block per file.
fn main() -> anyhow::Result<ExitCode> {
    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("Usage: load_cellml <model.xml>...");
        return Ok(ExitCode::FAILURE);
    }

    let mut clean = true;
    for path in paths {
        let input =
            read_to_string(&path).with_context(|| format!("Unable to read file `{path}`"))?;
        let mut parser = Parser::new(Format::Xml);
        let model = parser.parse_model(&input);
        if parser.error_count() == 0 {
            println!("Successfully parsed model `{}` from `{path}`.", model.name);
        } else {
            clean = false;
            println!(
                "Model `{}` from `{path}` has {} issue(s):",
                model.name,
                parser.error_count()
            );
            for issue in parser.error_log() {
                println!("  [{:?}] {issue}", issue.kind);
            }
        }
    }
    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

use std::fs::{read_to_string, write};
use std::io::{stdin, Read};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use template_preprocessor::logging::{init_logging, LogLevel};
use template_preprocessor::{Dialect, Evaluator, Generator, Variables};

#[derive(Parser, Debug)]
#[command(name = "template-preprocessor", version)]
struct Cli {
    /// Log level, overridden by `RUST_LOG`.
    #[arg(long, value_enum, default_value_t = LogLevel::default(), global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a condition and print `true` or `false`.
    Eval {
        expression: String,
        #[command(flatten)]
        options: Options,
    },
    /// Process one template file (`-` for stdin).
    Render {
        input: PathBuf,
        /// Write here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        options: Options,
    },
    /// Expand a template directory into a destination directory.
    Expand {
        source: PathBuf,
        destination: PathBuf,
        /// Folder receiving the template's `java` tree.
        #[arg(long, default_value = "src")]
        source_folder: PathBuf,
        #[command(flatten)]
        options: Options,
    },
}

#[derive(Args, Debug)]
struct Options {
    /// JSON object of variable values.
    #[arg(long)]
    vars: Option<PathBuf>,

    /// `name=value`, repeatable; wins over `--vars`.
    #[arg(long = "var", value_name = "NAME=VALUE")]
    assignments: Vec<String>,

    /// Make string `!=` the negation of `==`.
    #[arg(long)]
    strict: bool,
}

impl Options {
    fn evaluator(&self) -> anyhow::Result<Evaluator<Variables>> {
        let variables = load_variables(self.vars.as_deref(), &self.assignments)?;
        let dialect = if self.strict {
            Dialect::Strict
        } else {
            Dialect::Compatible
        };
        Ok(Evaluator::new(variables).with_dialect(dialect))
    }
}

/// Variables from the JSON file, then each `name=value` on top of them.
fn load_variables(file: Option<&Path>, assignments: &[String]) -> anyhow::Result<Variables> {
    let mut variables = match file {
        Some(path) => Variables::from_json_file(path)
            .with_context(|| format!("load variables '{}'", path.display()))?,
        None => Variables::new(),
    };
    for assignment in assignments {
        variables.parse_assignment(assignment)?;
    }
    info!(count = variables.len(), "variables loaded");
    Ok(variables)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    match cli.cmd {
        Command::Eval {
            expression,
            options,
        } => {
            let mut evaluator = options.evaluator()?;
            let result = evaluator
                .parse_and_evaluate(&expression)
                .with_context(|| format!("evaluate '{expression}'"))?;
            println!("{result}");
        }
        Command::Render {
            input,
            out,
            options,
        } => {
            let mut generator = Generator::new(options.evaluator()?);
            let source = read_input(&input)?;
            let rendered = generator.process_text(&source);
            match out {
                Some(path) => write(&path, rendered)
                    .with_context(|| format!("write '{}'", path.display()))?,
                None => print!("{rendered}"),
            }
        }
        Command::Expand {
            source,
            destination,
            source_folder,
            options,
        } => {
            let mut generator =
                Generator::new(options.evaluator()?).with_source_folder(source_folder);
            let report = generator.expand_dir(&source, &destination)?;
            eprintln!(
                "wrote {} files ({} binary) and {} directories to {}",
                report.files,
                report.binary_files,
                report.directories,
                destination.display()
            );
        }
    }
    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        stdin()
            .read_to_string(&mut source)
            .context("read template from stdin")?;
        return Ok(source);
    }
    read_to_string(path).with_context(|| format!("read template '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use template_preprocessor::{Value, VariableProvider};

    fn options(args: &[&str]) -> Options {
        let cli = Cli::try_parse_from(["template-preprocessor", "eval", "x"].iter().chain(args)).unwrap();
        match cli.cmd {
            Command::Eval { options, .. } => options,
            other => panic!("expected eval, got {other:?}"),
        }
    }

    #[test]
    fn assignments_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("vars.json");
        write(&file, r#"{"flag": true, "name": "file", "kept": "yes"}"#).unwrap();

        let variables = load_variables(
            Some(file.as_path()),
            &["flag=false".to_owned(), "name=cli".to_owned()],
        )
        .unwrap();

        assert_eq!(variables.value("flag"), Value::Bool(false));
        assert_eq!(variables.value("name"), Value::from("cli"));
        assert_eq!(variables.value("kept"), Value::from("yes"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = load_variables(Some(dir.path().join("none.json").as_path()), &[]).unwrap_err();
        assert!(error.to_string().contains("none.json"));
    }

    #[test]
    fn parses_repeated_assignments() {
        let parsed = options(&["--var", "a=1", "--var", "b=true"]);
        assert_eq!(parsed.assignments, vec!["a=1", "b=true"]);
        assert!(!parsed.strict);
    }

    #[test]
    fn strict_flag_selects_strict_dialect() {
        let evaluator = options(&["--strict", "--var", "b=2"]).evaluator().unwrap();
        assert_eq!(evaluator.dialect(), Dialect::Strict);

        let mut evaluator = evaluator;
        assert_eq!(evaluator.parse_and_evaluate(r#"b != "3""#), Ok(true));
    }

    #[test]
    fn compatible_dialect_is_the_default() {
        let evaluator = options(&[]).evaluator().unwrap();
        assert_eq!(evaluator.dialect(), Dialect::Compatible);
    }
}

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use crate::control::ConditionStack;
use crate::evaluator::Evaluator;
use crate::variables::VariableProvider;

/// Variable holding the Java package of generated sources.
pub const KEY_PACKAGE_NAME: &str = "packageName";
/// Fallback for [`KEY_PACKAGE_NAME`].
pub const KEY_PLUGIN_ID: &str = "pluginId";

/// Template directory placed under the package path.
const JAVA_DIR: &str = "java";
/// Template directory copied byte for byte into the destination root.
const BINARY_DIR: &str = "bin";
const DEFAULT_SOURCE_FOLDER: &str = "src";

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([^$]*)\$").unwrap_or_else(|_| unreachable!("name pattern is valid"))
});

/// Expands template text, file names and whole template directories.
///
/// Text is processed in one pass. A line starting with `%` is a directive
/// (`%if <condition>`, `%else`, `%endif`, anything else is a comment) and
/// never reaches the output; inside a directive `\` escapes the next
/// character, so `\` before a newline continues the line. Body text is kept
/// only while all open conditions hold. `$key$` is replaced with the value of
/// `key`, or with `key` itself when it has none, and `$$` yields `$`.
pub struct Generator<P> {
    conditions: ConditionStack<P>,
    source_folder: PathBuf,
}

impl<P: VariableProvider> Generator<P> {
    pub fn new(evaluator: Evaluator<P>) -> Self {
        Self {
            conditions: ConditionStack::new(evaluator),
            source_folder: PathBuf::from(DEFAULT_SOURCE_FOLDER),
        }
    }

    /// Folder, relative to the destination, that receives the `java` tree.
    pub fn with_source_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.source_folder = folder.into();
        self
    }

    pub fn process_text(&mut self, source: &str) -> String {
        self.conditions.reset();
        let mut output = String::with_capacity(source.len());
        let mut directive = String::new();
        let mut key = String::new();
        let mut new_line = true;
        let mut in_directive = false;
        let mut replacing = false;
        let mut escape = false;

        for c in source.chars() {
            if in_directive {
                if escape {
                    directive.push(c);
                    escape = false;
                } else if c == '\\' {
                    escape = true;
                } else if c == '\n' {
                    in_directive = false;
                    new_line = true;
                    self.conditions.process_line(&directive);
                } else {
                    directive.push(c);
                }
                continue;
            }
            if new_line && c == '%' {
                in_directive = true;
                directive.clear();
                continue;
            }
            if !self.conditions.current_state() {
                new_line = c == '\n';
                continue;
            }
            if c == '$' {
                if replacing {
                    output.push_str(&self.replacement(&key));
                    key.clear();
                }
                replacing = !replacing;
            } else if replacing {
                key.push(c);
            } else {
                output.push(c);
                new_line = c == '\n';
            }
        }
        if self.conditions.depth() > 0 {
            debug!(depth = self.conditions.depth(), "template ended inside a condition");
        }
        output
    }

    /// Substitutes `$key$` references in a file or directory name. A `$` with
    /// no closing partner drops the rest of the name.
    pub fn process_name(&self, name: &str) -> String {
        let mut output = String::with_capacity(name.len());
        let mut last = 0;
        for captures in NAME_PATTERN.captures_iter(name) {
            let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            output.push_str(&name[last..whole.start()]);
            output.push_str(&self.replacement(key.as_str()));
            last = whole.end();
        }
        let tail = &name[last..];
        output.push_str(match tail.find('$') {
            Some(end) => &tail[..end],
            None => tail,
        });
        output
    }

    fn replacement(&self, key: &str) -> String {
        if key.is_empty() {
            return "$".to_owned();
        }
        self.provider()
            .value(key)
            .replacement()
            .unwrap_or_else(|| key.to_owned())
    }

    fn provider(&self) -> &P {
        self.conditions.evaluator().provider()
    }

    /// A processed name that stays a single entry inside its parent.
    fn entry_name(&self, name: &str) -> Result<String, GenerateError> {
        let processed = self.process_name(name);
        check_entry_name(&processed)?;
        Ok(processed)
    }

    /// `<source folder>/<package as path>`, from `packageName` or `pluginId`.
    fn package_path(&self) -> Result<PathBuf, GenerateError> {
        let package = [KEY_PACKAGE_NAME, KEY_PLUGIN_ID]
            .into_iter()
            .find_map(|key| self.provider().value(key).replacement());
        let mut path = self.source_folder.clone();
        if let Some(package) = package {
            for segment in package.split('.').filter(|segment| !segment.is_empty()) {
                check_entry_name(segment)?;
                path.push(segment);
            }
        }
        Ok(path)
    }

    /// Copies the template tree at `source` into `destination`, expanding
    /// names and text files on the way.
    #[tracing::instrument(skip(self))]
    pub fn expand_dir(
        &mut self,
        source: &Path,
        destination: &Path,
    ) -> Result<ExpansionReport, GenerateError> {
        let mut report = ExpansionReport::default();
        create_dir(destination)?;
        self.expand_entries(source, destination, true, false, &mut report)?;
        info!(
            files = report.files,
            binary_files = report.binary_files,
            directories = report.directories,
            "expanded template"
        );
        Ok(report)
    }

    fn expand_entries(
        &mut self,
        source: &Path,
        destination: &Path,
        first_level: bool,
        binary: bool,
        report: &mut ExpansionReport,
    ) -> Result<(), GenerateError> {
        let mut entries = fs::read_dir(source)
            .and_then(|entries| entries.collect::<Result<Vec<_>, _>>())
            .map_err(io_error(source))?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() {
                let (target, binary) = match (first_level, name.as_str()) {
                    (true, JAVA_DIR) => (destination.join(self.package_path()?), false),
                    (true, BINARY_DIR) => (destination.to_path_buf(), true),
                    (true, _) => (destination.join(self.entry_name(&name)?), false),
                    (false, _) => (destination.join(self.entry_name(&name)?), binary),
                };
                create_dir(&target)?;
                report.directories += 1;
                self.expand_entries(&path, &target, false, binary, report)?;
            } else {
                let target = destination.join(self.entry_name(&name)?);
                self.expand_file(&path, &target, binary, report)?;
            }
        }
        Ok(())
    }

    fn expand_file(
        &mut self,
        source: &Path,
        target: &Path,
        binary: bool,
        report: &mut ExpansionReport,
    ) -> Result<(), GenerateError> {
        let bytes = fs::read(source).map_err(io_error(source))?;
        let contents = match String::from_utf8(bytes) {
            Ok(text) if !binary => self.process_text(&text).into_bytes(),
            Ok(text) => text.into_bytes(),
            Err(error) => {
                debug!(path = %source.display(), "copying non-UTF-8 file verbatim");
                error.into_bytes()
            }
        };
        if binary {
            report.binary_files += 1;
        }
        report.files += 1;
        fs::write(target, contents).map_err(io_error(target))
    }
}

/// Rejects names that would leave the directory they are joined onto.
fn check_entry_name(name: &str) -> Result<(), GenerateError> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if single && !name.contains(['/', '\\']) {
        Ok(())
    } else {
        Err(GenerateError::UnsafeName(name.to_owned()))
    }
}

fn create_dir(path: &Path) -> Result<(), GenerateError> {
    fs::create_dir_all(path).map_err(io_error(path))
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> GenerateError + '_ {
    move |source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// What [`Generator::expand_dir`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    pub files: usize,
    pub binary_files: usize,
    pub directories: usize,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("I/O failed for {}.", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Expanded name {0:?} is not a single path entry.")]
    UnsafeName(String),
}

//! Minimal CLI: fmt | check
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use tracing::{debug, info};

use dyntype::{FrozenMap, IndentBuffer, Type, Value, Violation};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// parse runtime type descriptions and validate JSON/YAML documents against them
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse a type and print its canonical form
    Fmt(FmtOut),
    /// validate documents against a type
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat inputs as YAML instead of JSON
    #[arg(long, default_value_t = false)]
    yaml: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct FmtOut {
    /// type text, e.g. '{"name":string[1],"age"?:0..150}'
    ty: String,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// the type every document must satisfy
    #[arg(long = "type", short = 't')]
    ty: String,

    /// print every check performed instead of only the failures
    #[arg(long)]
    verbose: bool,
}

/// Outcome for one input file.
struct Report {
    path: PathBuf,
    violations: Vec<Violation>,
    trace: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self, path: &Path) -> anyhow::Result<FrozenMap> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source file {}", path.display()))?;
        let parsed = if self.yaml {
            FrozenMap::from_yaml(&source)
        } else {
            FrozenMap::from_json(&source)
        };
        parsed.with_context(|| format!("failed to load {}", path.display()))
    }
}

impl CheckOut {
    fn check(&self, ty: &Type, path: PathBuf) -> anyhow::Result<Report> {
        let doc = Value::Map(self.input_settings.load(&path)?);
        if self.verbose {
            let mut out = IndentBuffer::new();
            let ok = ty.validate_verbose(&doc, &mut out);
            let violations = if ok { Vec::new() } else { ty.validate(&doc) };
            return Ok(Report { path, violations, trace: Some(out.finish()) });
        }
        Ok(Report { path, violations: ty.validate(&doc), trace: None })
    }
}

impl Report {
    fn print(&self) {
        let status = if self.violations.is_empty() { "OK".green() } else { "FAILED".red() };
        println!("{}: {status}", self.path.display());
        if let Some(trace) = self.trace.as_ref() {
            for line in trace.lines() {
                println!("  {line}");
            }
            return;
        }
        for violation in &self.violations {
            println!("  {violation}");
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns `false` when at least one document failed validation.
    pub fn run(&self) -> anyhow::Result<bool> {
        match &self.cmd {
            Command::Fmt(target) => {
                let ty = dyntype::parse(&target.ty)?;
                println!("{ty}");
                Ok(true)
            }
            Command::Check(target) => {
                let ty = dyntype::parse(&target.ty)?;
                if !ty.describes_maps() {
                    bail!("type {ty} does not describe maps");
                }
                let paths = resolve_file_path_patterns(&target.input_settings.input)?;
                info!(files = paths.len(), %ty, "validating");
                let reports = paths
                    .into_par_iter()
                    .map(|path| target.check(&ty, path))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                let mut ok = true;
                for report in &reports {
                    report.print();
                    ok &= report.violations.is_empty();
                }
                debug!(ok, "validation finished");
                Ok(ok)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "dir/b.yaml"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.json"), PathBuf::from("dir/b.yaml")]);
    }

    #[test]
    fn empty_glob_is_an_error() {
        let err = resolve_file_path_patterns(["/nonexistent-dyntype-dir/*.json"]).unwrap_err();
        assert!(err.to_string().contains("matched no files"));
    }

    #[test]
    fn check_arguments_parse() {
        let cli = CommandLineInterface::try_parse_from([
            "dyntype", "check", "--type", "map[string]any", "-i", "a.json", "b.json", "--yaml",
        ])
        .unwrap();
        match cli.cmd {
            Command::Check(check) => {
                assert_eq!(check.ty, "map[string]any");
                assert_eq!(check.input_settings.input, vec!["a.json", "b.json"]);
                assert!(check.input_settings.yaml);
                assert!(!check.verbose);
            }
            Command::Fmt(_) => panic!("expected check"),
        }
    }
}

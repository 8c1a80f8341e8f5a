//! CLI: map JSON/NDJSON documents onto a schema-declared type, or check them.
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use json_binder::mapper::datetime::DATE_TIME_CLASS;
use json_binder::{
    CachedIntrospector, CamelCase, ClassRegistry, DateTimeTypeMapper, Node, ObjectMapper, Options,
    SimpleValueTypeResolver, SnakeCase, TypeRef,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// map JSON documents onto classes declared in a schema file
#[derive(Parser, Debug)]
#[command(name = "json-binder", version)]
pub struct CommandLineInterface {
    /// debug logging (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// map every document and print the mapped graph as JSON
    Map(MapOut),
    /// map every document and report pass/fail per document
    Check(CheckRun),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is mapped on its own
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct MappingSettings {
    /// JSON schema file declaring the classes
    #[arg(long, short)]
    schema: PathBuf,

    /// target type: a class name, a scalar kind, or `Name[]` for a list of them
    #[arg(long = "type", short = 't')]
    target: String,

    /// JSON options file (camelCase keys, e.g. {"strictTypes": false})
    #[arg(long)]
    options: Option<PathBuf>,

    /// disable strict types, strict collections and strict null
    #[arg(long)]
    lenient: bool,

    /// fail when a required property is missing
    #[arg(long)]
    verify_required: bool,

    /// fail on keys that match no property
    #[arg(long)]
    deny_unknown: bool,

    /// key naming conversions to try, in order, before the key as-is
    #[arg(long, value_enum)]
    naming: Vec<Naming>,

    /// value type resolution `From=To`, applied to object-shaped values
    #[arg(long = "resolve", value_parser = parse_resolution)]
    resolutions: Vec<(String, String)>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Naming {
    Camel,
    Snake,
}

#[derive(clap::Parser, Debug)]
struct MapOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    mapping: MappingSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckRun {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    mapping: MappingSettings,
}

/// One input document and where it came from.
struct Document {
    label: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(self) -> Result<ExitCode> {
        match self.cmd {
            Command::Map(target) => {
                let mapper = target.mapping.build_mapper()?;
                let ty = target.mapping.type_ref();
                let documents = target.input_settings.load()?;

                let mapped = documents
                    .par_iter()
                    .map(|doc| {
                        mapper
                            .map_with(Node::from(doc.value.clone()), Some(ty.clone()), false)
                            .map(|node| node.to_json())
                            .with_context(|| format!("failed to map {}", doc.label))
                    })
                    .collect::<Result<Vec<_>>>()?;

                let rendered = if target.input_settings.ndjson {
                    let lines = mapped.iter().map(serde_json::to_string).collect::<Result<Vec<_>, _>>()?;
                    lines.join("\n")
                } else if let [single] = mapped.as_slice() {
                    serde_json::to_string_pretty(single)?
                } else {
                    serde_json::to_string_pretty(&mapped)?
                };

                match target.out.as_ref() {
                    Some(out) => {
                        if let Some(parent) = out.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        std::fs::write(out, &rendered).with_context(|| format!("failed to write {}", out.display()))?;
                    }
                    None => println!("{rendered}"),
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::Check(target) => {
                let mapper = target.mapping.build_mapper()?;
                let ty = target.mapping.type_ref();
                let documents = target.input_settings.load()?;

                let outcomes = documents
                    .par_iter()
                    .map(|doc| mapper.map_with(Node::from(doc.value.clone()), Some(ty.clone()), false).err())
                    .collect::<Vec<_>>();

                let mut failed = 0usize;
                for (doc, outcome) in documents.iter().zip(&outcomes) {
                    match outcome {
                        None => println!("{} {}", "✓".green().bold(), doc.label),
                        Some(err) => {
                            failed += 1;
                            println!("{} {}: {}", "✗".red().bold(), doc.label, err.to_string().red());
                        }
                    }
                }

                let summary = format!("{} documents, {} failed", documents.len(), failed);
                if failed == 0 {
                    eprintln!("{}", summary.green());
                    Ok(ExitCode::SUCCESS)
                } else {
                    eprintln!("{}", summary.red());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

impl MappingSettings {
    fn type_ref(&self) -> TypeRef {
        match self.target.strip_suffix("[]") {
            Some(element) => TypeRef::list_of(TypeRef::from(element)),
            None => TypeRef::from(self.target.as_str()),
        }
    }

    fn options(&self) -> Result<Options> {
        let mut options = match self.options.as_ref() {
            Some(path) => {
                let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
                json_binder::path_de::from_slice_with_path::<Options>(&bytes)
                    .with_context(|| format!("invalid options file {}", path.display()))?
            }
            None => Options::default(),
        };
        if self.lenient {
            options.strict_types = false;
            options.strict_collections = false;
            options.strict_null = false;
        }
        if self.verify_required {
            options.verify_required_properties = true;
        }
        if self.deny_unknown {
            options.ignore_unknown_properties = false;
        }
        Ok(options)
    }

    fn build_mapper(&self) -> Result<ObjectMapper> {
        let registry = ClassRegistry::from_schema_file(&self.schema)
            .with_context(|| format!("invalid schema {}", self.schema.display()))?;
        let registry = Arc::new(registry);
        let introspector = Arc::new(CachedIntrospector::new(registry.clone()));

        let mut mapper = ObjectMapper::with_capabilities(self.options()?, introspector, registry);
        for naming in &self.naming {
            match naming {
                Naming::Camel => mapper.add_naming_mapper(CamelCase::default()),
                Naming::Snake => mapper.add_naming_mapper(SnakeCase::default()),
            };
        }
        for (from, to) in &self.resolutions {
            mapper.add_value_type_resolver(SimpleValueTypeResolver::new(from, to));
        }
        mapper.set_override_mapper(DATE_TIME_CLASS, DateTimeTypeMapper);
        tracing::debug!(?mapper, "engine ready");
        Ok(mapper)
    }
}

impl InputSettings {
    fn load(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for source in resolve_file_path_patterns(&self.input)? {
            let label = source.to_string_lossy().to_string();
            let text = read_source(&source)?;

            let values = if self.ndjson {
                text.lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(i, line)| {
                        let value = serde_json::from_str::<Value>(line)
                            .with_context(|| format!("failed to parse {label}:{}", i + 1))?;
                        Ok((format!("{label}:{}", i + 1), value))
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                let value = serde_json::from_str::<Value>(&text)
                    .with_context(|| format!("failed to parse JSON source file ({label})"))?;
                vec![(label, value)]
            };

            for (label, value) in values {
                let value = match self.json_pointer.as_deref() {
                    Some(pointer) => value
                        .pointer(pointer)
                        .cloned()
                        .ok_or_else(|| anyhow!("JSON pointer {pointer} matched nothing in {label}"))?,
                    None => value,
                };
                match self.jq_expr.as_deref() {
                    None => documents.push(Document { label, value }),
                    Some(jq_expr) => {
                        let outputs = crate::jq_exec::run_jaq(jq_expr, &value)
                            .with_context(|| format!("failed to apply jq expression to {label}"))?;
                        documents.extend(outputs.into_iter().enumerate().map(|(i, value)| Document {
                            label: format!("{label}#{i}"),
                            value,
                        }));
                    }
                }
            }
        }
        Ok(documents)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read source file {}", path.display()))
}

fn parse_resolution(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((from, to)) if !from.is_empty() && !to.is_empty() => Ok((from.to_owned(), to.to_owned())),
        _ => Err(format!("expected From=To, got `{raw}`")),
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
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

// ------------------------------- Tests ------------------------------------ //

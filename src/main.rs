use std::collections::HashMap;
use std::path::Path;

use clap::{Arg, ArgMatches, Command};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use latexmt_core::{
    AlignResult, AlignmentRelation, AnnotatedText, Diagnostic, Glossary, GlossaryMethod,
    MarkupNode, MockAligner, MockMode, PipelineConfig, TranslationPipeline, UnitOutcome,
    apply_glossary, project_markup, replace_in_source, split_words, tokenize, words_to_annotated,
};

/// A projection job: a source unit, its translation and their word alignment
#[derive(Deserialize)]
struct Job {
    source: AnnotatedText,
    target: String,
    alignment: JobAlignment,
    #[serde(default)]
    threshold: Option<f32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JobAlignment {
    Matrix(Vec<Vec<bool>>),
    Weights(Vec<Vec<f32>>),
}

#[derive(Serialize)]
struct Report {
    text: AnnotatedText,
    rendered: String,
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    fn new(text: AnnotatedText, diagnostics: Vec<Diagnostic>) -> Self {
        Report {
            rendered: render(&text),
            text,
            diagnostics,
        }
    }
}

/// Show markup LaTeX-style: `\label{...}`, or `{...}` for anonymous groups
fn render(text: &AnnotatedText) -> String {
    let mut out = String::new();
    for node in text.to_markup_list() {
        match node {
            MarkupNode::Start(label) if label.is_empty() => out.push('{'),
            MarkupNode::Start(label) => {
                out.push('\\');
                out.push_str(&label);
                out.push('{');
            }
            MarkupNode::End(_) => out.push('}'),
            MarkupNode::Text(run) => out.push_str(&run),
        }
    }
    out
}

fn read_job(path: &str) -> AlignResult<Job> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Project the job's markup, optionally splicing a glossary into the target
fn run_job(job: Job, glossary: Option<&Glossary>, default_threshold: f32) -> AlignResult<Report> {
    let (source_words, source_spans) = tokenize(&job.source);
    let target_words = split_words(&job.target);
    let relation = match job.alignment {
        JobAlignment::Matrix(rows) => AlignmentRelation::from_matrix(rows)?,
        JobAlignment::Weights(rows) => {
            AlignmentRelation::from_weights(&rows, job.threshold.unwrap_or(default_threshold))?
        }
    };
    relation.check_dims(target_words.len(), source_words.len())?;

    let projection = project_markup(&source_words, &source_spans, &relation)?;
    let mut diagnostics = projection.diagnostics;

    let text = match glossary {
        Some(glossary) => {
            let splice = apply_glossary(
                glossary,
                &source_words,
                &target_words,
                &projection.spans,
                &relation,
            )?;
            diagnostics.extend(splice.diagnostics);
            words_to_annotated(&splice.words, &splice.spans)?
        }
        None => words_to_annotated(&target_words, &projection.spans)?,
    };

    Ok(Report::new(text, diagnostics))
}

fn load_dictionary(path: &Path) -> AlignResult<HashMap<String, String>> {
    Ok(Glossary::load(path)?
        .iter()
        .map(|entry| (entry.source.to_lowercase(), entry.target.clone()))
        .collect())
}

fn load_config(matches: &ArgMatches) -> AlignResult<PipelineConfig> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

async fn run_mock(matches: &ArgMatches) -> Result<Report, Box<dyn std::error::Error>> {
    let mut config = load_config(matches)?;
    if let Some(lang) = matches.get_one::<String>("source-lang") {
        config.source_lang = lang.clone();
    }
    if let Some(lang) = matches.get_one::<String>("target-lang") {
        config.target_lang = lang.clone();
    }
    if let Some(method) = matches.get_one::<String>("glossary-method") {
        config.glossary_method = method.parse::<GlossaryMethod>()?;
    }
    config.validate()?;

    let mode = match (
        matches.get_one::<String>("dictionary"),
        matches.get_one::<String>("mode").map(String::as_str),
    ) {
        (Some(path), _) => MockMode::Dictionary(load_dictionary(Path::new(path))?),
        (None, Some("reorder")) => MockMode::Reorder,
        (None, _) => MockMode::Identity,
    };

    let glossary = match matches.get_one::<String>("glossary") {
        Some(path) => Glossary::load(path)?,
        None => Glossary::new(),
    };

    let unit = match matches.get_one::<String>("unit") {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => AnnotatedText::plain(
            matches
                .get_one::<String>("text")
                .cloned()
                .unwrap_or_default(),
        ),
    };

    let pipeline = TranslationPipeline::new(Box::new(MockAligner::new(mode)), config)
        .with_glossary(glossary);
    let outcome = pipeline.translate_units(std::slice::from_ref(&unit)).await;

    match outcome.into_iter().next() {
        Some(UnitOutcome::Translated(translation)) => {
            Ok(Report::new(translation.text, translation.diagnostics))
        }
        Some(UnitOutcome::Failed { marker, error }) => {
            eprintln!("❌ Translation failed: {}", error);
            Ok(Report::new(marker, Vec::new()))
        }
        None => Err("no output for unit".into()),
    }
}

fn cli() -> Command {
    let job = Arg::new("job")
        .long("job")
        .short('j')
        .help("Job JSON: {source, target, alignment, threshold?}")
        .required(true);
    let glossary = Arg::new("glossary")
        .long("glossary")
        .short('g')
        .help("Glossary CSV (source,target per line)");
    let config = Arg::new("config")
        .long("config")
        .short('c')
        .help("Pipeline config JSON");

    Command::new("latexmt")
        .version("0.1.0")
        .about("Markup projection and glossary splicing for translated LaTeX paragraphs")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log alignment details")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("project")
                .about("Project source markup onto a translation")
                .arg(job.clone())
                .arg(config.clone()),
        )
        .subcommand(
            Command::new("splice")
                .about("Project markup and splice glossary phrases into a translation")
                .arg(job)
                .arg(glossary.clone().required(true))
                .arg(config.clone()),
        )
        .subcommand(
            Command::new("replace")
                .about("Replace glossary phrases in a source text before translation")
                .arg(
                    Arg::new("text")
                        .long("text")
                        .short('t')
                        .help("Source text")
                        .required(true),
                )
                .arg(glossary.clone().required(true)),
        )
        .subcommand(
            Command::new("mock")
                .about("Run the full pipeline with the mock backend")
                .arg(
                    Arg::new("text")
                        .long("text")
                        .short('t')
                        .help("Source text")
                        .required_unless_present("unit"),
                )
                .arg(
                    Arg::new("unit")
                        .long("unit")
                        .short('u')
                        .help("Source unit as AnnotatedText JSON")
                        .conflicts_with("text"),
                )
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .short('m')
                        .help("Mock mode")
                        .value_parser(["identity", "reorder"])
                        .default_value("identity"),
                )
                .arg(
                    Arg::new("dictionary")
                        .long("dictionary")
                        .short('d')
                        .help("Word dictionary CSV for the mock backend"),
                )
                .arg(glossary)
                .arg(
                    Arg::new("glossary-method")
                        .long("glossary-method")
                        .help("auto, align, srcrepl or builtin"),
                )
                .arg(
                    Arg::new("source-lang")
                        .long("source")
                        .short('s')
                        .help("Source language code"),
                )
                .arg(
                    Arg::new("target-lang")
                        .long("target")
                        .help("Target language code"),
                )
                .arg(config),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    let level = if matches.get_flag("verbose") { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let report = match matches.subcommand() {
        Some(("project", sub)) => {
            let config = load_config(sub)?;
            let job = read_job(required(sub, "job")?)?;
            run_job(job, None, config.alignment_threshold)?
        }
        Some(("splice", sub)) => {
            let config = load_config(sub)?;
            let job = read_job(required(sub, "job")?)?;
            let glossary = Glossary::load(required(sub, "glossary")?)?;
            run_job(job, Some(&glossary), config.alignment_threshold)?
        }
        Some(("replace", sub)) => {
            let glossary = Glossary::load(required(sub, "glossary")?)?;
            let text = AnnotatedText::plain(required(sub, "text")?);
            Report::new(replace_in_source(&text, &glossary)?, Vec::new())
        }
        Some(("mock", sub)) => run_mock(sub).await?,
        _ => return Err("unknown command".into()),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, String> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("missing --{}", name))
}

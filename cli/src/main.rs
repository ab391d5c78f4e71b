//! kgbridge CLI: batch RDF ingest, entity resolution and export
//!
//! Every command builds a fresh in-memory graph from its inputs, runs one
//! step of the pipeline on it and prints the resulting report.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use kgbridge::config::KgConfig;
use kgbridge::extract::{EntityImporter, EntityTriple, ImportReport, TextExtractor};
use kgbridge::graph::GraphStatistics;
use kgbridge::rdf::{GraphToRdfMapper, IngestReport, RdfFormat, RdfParser, RdfSerializer, RdfToGraphMapper};
use kgbridge::resolve::{Disambiguation, Disambiguator, EntityAligner, ResolutionReport};
use kgbridge::store::MemoryGraph;
use kgbridge_similarity::{hybrid_similarity, normalize, sequence_ratio, tfidf_cosine};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kgbridge", version, about = "RDF to property graph bridge with entity resolution")]
struct Cli {
    /// Config file (.yaml, .yml or .json)
    #[arg(long, global = true, env = "KGBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

/// Where the working graph comes from
#[derive(Args)]
struct GraphInput {
    /// RDF documents (.ttl, .nt, .rdf, .owl, .xml)
    rdf: Vec<PathBuf>,

    /// RDF syntax for every document, instead of guessing from the extension
    #[arg(long)]
    syntax: Option<RdfFormat>,

    /// Base IRI for relative references
    #[arg(long)]
    base: Option<String>,

    /// JSON files holding arrays of entity triples
    #[arg(long = "entities")]
    entities: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert RDF documents into a property graph
    Ingest {
        #[command(flatten)]
        input: GraphInput,
    },
    /// Merge near-duplicate entities
    Align {
        #[command(flatten)]
        input: GraphInput,

        /// Merge threshold, overriding the config
        #[arg(long)]
        threshold: Option<f64>,

        /// Label to align; repeatable, defaults to every label
        #[arg(long = "label")]
        labels: Vec<String>,
    },
    /// Find which same-named entity a text refers to
    Disambiguate {
        #[command(flatten)]
        input: GraphInput,

        /// Ambiguous entity name
        #[arg(long)]
        name: String,

        /// Text mentioning the entity
        #[arg(long)]
        context: String,
    },
    /// Score two names
    Similarity { a: String, b: String },
    /// Extract entity triples from text with the configured gazetteer and rules
    Extract {
        /// Input text
        text: String,
    },
    /// Write the graph as RDF
    Export {
        #[command(flatten)]
        input: GraphInput,

        /// Output file, stdout if omitted
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Output RDF syntax
        #[arg(long, default_value = "turtle")]
        to: RdfFormat,

        /// Align entities before exporting
        #[arg(long)]
        align: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => KgConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => KgConfig::default(),
    };
    let format = cli.format;

    match cli.command {
        Commands::Ingest { input } => {
            let loaded = load_graph(&input, &config)?;
            print_ingest(&loaded, format)
        }
        Commands::Align {
            input,
            threshold,
            labels,
        } => {
            let mut loaded = load_graph(&input, &config)?;
            let mut resolver = config.resolver.clone();
            if let Some(threshold) = threshold {
                resolver.threshold = threshold;
            }
            if !labels.is_empty() {
                resolver.labels = labels;
            }
            let report = EntityAligner::new(resolver)
                .with_retry(config.retry.clone())
                .align(&mut loaded.backend)?;
            print_resolution(&report, &loaded.backend.graph().statistics(), format)
        }
        Commands::Disambiguate { input, name, context } => {
            let loaded = load_graph(&input, &config)?;
            let outcome = Disambiguator::new(&config.resolver).disambiguate(loaded.backend.graph(), &name, &context)?;
            print_disambiguation(&name, &context, &outcome, format)
        }
        Commands::Similarity { a, b } => print_similarity(&a, &b, &config, format),
        Commands::Extract { text } => {
            let extractor = TextExtractor::new(config.extraction.recognizer(), config.extraction.classifier());
            let triples = extractor.extract(&text);
            info!("Extracted {} triple(s)", triples.len());
            print_entity_triples(&triples, format)
        }
        Commands::Export {
            input,
            output,
            to,
            align,
        } => {
            let mut loaded = load_graph(&input, &config)?;
            if align {
                EntityAligner::new(config.resolver.clone())
                    .with_retry(config.retry.clone())
                    .align(&mut loaded.backend)?;
            }
            let mapper = GraphToRdfMapper::with_config(config.mapping.clone());
            let triples = mapper.map_graph(loaded.backend.graph())?;
            match output {
                Some(path) => {
                    RdfSerializer::serialize_file(&triples, &path, to)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!("Wrote {} triples to {}", triples.len(), path.display());
                }
                None => print!("{}", RdfSerializer::serialize(&triples, to)?),
            }
            Ok(())
        }
    }
}

/// The working graph and how it was built
struct LoadedGraph {
    backend: MemoryGraph,
    ingested: Vec<(PathBuf, IngestReport)>,
    imported: Vec<(PathBuf, ImportReport)>,
}

fn load_graph(input: &GraphInput, config: &KgConfig) -> Result<LoadedGraph> {
    let mapper = RdfToGraphMapper::with_config(config.mapping.clone())?.with_retry(config.retry.clone());
    let importer = EntityImporter::new()
        .with_name_property(config.resolver.name_property.clone())
        .with_retry(config.retry.clone());

    let mut loaded = LoadedGraph {
        backend: MemoryGraph::new(),
        ingested: Vec::new(),
        imported: Vec::new(),
    };

    for path in &input.rdf {
        let triples = parse_rdf(path, input.syntax, input.base.as_deref())?;
        let report = mapper.ingest(&mut loaded.backend, &triples);
        loaded.ingested.push((path.clone(), report));
    }

    for path in &input.entities {
        let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let triples: Vec<EntityTriple> =
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        let report = importer.import(&mut loaded.backend, &triples);
        loaded.imported.push((path.clone(), report));
    }

    Ok(loaded)
}

fn parse_rdf(path: &Path, syntax: Option<RdfFormat>, base: Option<&str>) -> Result<Vec<kgbridge::rdf::Triple>> {
    let format = syntax
        .or_else(|| RdfFormat::from_path(path))
        .with_context(|| format!("cannot tell the RDF syntax of {}; pass --syntax", path.display()))?;
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let triples = RdfParser::parse_reader(std::io::BufReader::new(file), format, base)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(triples)
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_statistics(stats: &GraphStatistics) {
    let mut table = new_table(vec!["Label / type", "Count"]);
    for (label, count) in &stats.label_counts {
        table.add_row(vec![format!(":{}", label), count.to_string()]);
    }
    for (edge_type, count) in &stats.edge_type_counts {
        table.add_row(vec![format!("[{}]", edge_type), count.to_string()]);
    }
    println!("{}", table);
    println!("{} node(s), {} edge(s)", stats.node_count, stats.edge_count);
}

fn print_ingest(loaded: &LoadedGraph, format: OutputFormat) -> Result<()> {
    let stats = loaded.backend.graph().statistics();

    if let OutputFormat::Json = format {
        #[derive(Serialize)]
        struct Output<'a> {
            ingested: Vec<(String, &'a IngestReport)>,
            imported: Vec<(String, &'a ImportReport)>,
            graph: &'a GraphStatistics,
        }
        return print_json(&Output {
            ingested: loaded
                .ingested
                .iter()
                .map(|(p, r)| (p.display().to_string(), r))
                .collect(),
            imported: loaded
                .imported
                .iter()
                .map(|(p, r)| (p.display().to_string(), r))
                .collect(),
            graph: &stats,
        });
    }

    let mut table = new_table(vec![
        "Source", "Seen", "Applied", "Skipped", "Nodes +", "Edges +", "Properties",
    ]);
    for (path, r) in &loaded.ingested {
        table.add_row(vec![
            path.display().to_string(),
            r.triples_seen.to_string(),
            r.triples_applied.to_string(),
            r.triples_skipped.to_string(),
            r.nodes_created.to_string(),
            r.edges_created.to_string(),
            r.properties_set.to_string(),
        ]);
    }
    for (path, r) in &loaded.imported {
        table.add_row(vec![
            path.display().to_string(),
            r.triples_seen.to_string(),
            r.triples_applied.to_string(),
            r.failures.len().to_string(),
            r.nodes_created.to_string(),
            r.edges_created.to_string(),
            "-".to_string(),
        ]);
    }
    println!("{}", table);

    let mut issues = new_table(vec!["Source", "Issue", "Item", "Detail"]);
    let mut issue_count = 0;
    for (path, r) in &loaded.ingested {
        let source = path.display().to_string();
        for a in &r.ambiguous_types {
            issues.add_row(vec![
                source.clone(),
                "ambiguous type".to_string(),
                a.subject.clone(),
                format!("kept {}, ignored {}", a.kept, a.ignored),
            ]);
            issue_count += 1;
        }
        for (kind, items) in [("malformed", &r.malformed), ("store failure", &r.store_failures)] {
            for item in items {
                issues.add_row(vec![source.clone(), kind.to_string(), item.item.clone(), item.reason.clone()]);
                issue_count += 1;
            }
        }
    }
    for (path, r) in &loaded.imported {
        for f in &r.failures {
            issues.add_row(vec![
                path.display().to_string(),
                "store failure".to_string(),
                f.triple.clone(),
                f.reason.clone(),
            ]);
            issue_count += 1;
        }
    }
    if issue_count > 0 {
        println!("{}", issues);
    }

    print_statistics(&stats);
    Ok(())
}

fn print_resolution(report: &ResolutionReport, stats: &GraphStatistics, format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(report);
    }

    if report.merges.is_empty() {
        println!("(no merges)");
    } else {
        let mut table = new_table(vec!["Label", "Kept", "Merged", "Score", "Edges moved"]);
        for m in &report.merges {
            table.add_row(vec![
                m.label.clone(),
                format!("{} {}", m.kept, m.kept_name),
                format!("{} {}", m.merged, m.merged_name),
                format!("{:.3}", m.score),
                m.edges_redirected.to_string(),
            ]);
        }
        println!("{}", table);
    }

    for f in &report.failures {
        println!("failed to merge {} into {}: {}", f.merged, f.kept, f.reason);
    }
    println!(
        "{} comparison(s), {} filtered pair(s), {} merge(s)",
        report.comparisons,
        report.pairs_filtered,
        report.merges.len()
    );
    print_statistics(stats);
    Ok(())
}

fn print_disambiguation(name: &str, context: &str, outcome: &Disambiguation, format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        let mut report = ResolutionReport::default();
        report.record_disambiguation(name, context, outcome);
        #[derive(Serialize)]
        struct Output<'a> {
            outcome: &'a Disambiguation,
            report: ResolutionReport,
        }
        return print_json(&Output { outcome, report });
    }

    match outcome {
        Disambiguation::NoMatch => println!("No entity named '{}'", name),
        Disambiguation::Match(m) => {
            let mut table = new_table(vec!["", "Node", "Label", "Relationships", "Score"]);
            for c in &m.candidates {
                table.add_row(vec![
                    if c.node == m.node { "*" } else { "" }.to_string(),
                    c.node.to_string(),
                    c.label.to_string(),
                    c.feature.clone(),
                    format!("{:.3}", c.score),
                ]);
            }
            println!("{}", table);
            println!("'{}' in \"{}\" -> {} ({})", name, context, m.node, m.label);
        }
    }
    Ok(())
}

fn print_similarity(a: &str, b: &str, config: &KgConfig, format: OutputFormat) -> Result<()> {
    #[derive(Serialize)]
    struct Scores {
        a: String,
        b: String,
        sequence_ratio: f64,
        tfidf_cosine: f64,
        score: f64,
    }

    let weights = &config.resolver.similarity;
    let (na, nb) = (normalize(a), normalize(b));
    let scores = Scores {
        sequence_ratio: sequence_ratio(&na, &nb),
        tfidf_cosine: tfidf_cosine(&na, &nb, weights.tokenizer),
        score: hybrid_similarity(a, b, weights),
        a: na,
        b: nb,
    };

    if let OutputFormat::Json = format {
        return print_json(&scores);
    }
    let mut table = new_table(vec!["Normalized A", "Normalized B", "Sequence", "TF-IDF", "Score"]);
    table.add_row(vec![
        scores.a.clone(),
        scores.b.clone(),
        format!("{:.3}", scores.sequence_ratio),
        format!("{:.3}", scores.tfidf_cosine),
        format!("{:.3}", scores.score),
    ]);
    println!("{}", table);
    Ok(())
}

fn print_entity_triples(triples: &[EntityTriple], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(&triples);
    }
    if triples.is_empty() {
        println!("(no relations found)");
        return Ok(());
    }
    let mut table = new_table(vec!["Subject", "Type", "Predicate", "Object", "Type"]);
    for t in triples {
        table.add_row(vec![
            t.subject.clone(),
            t.subject_type.clone(),
            t.predicate.clone(),
            t.object.clone(),
            t.object_type.clone(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

use crate::cli::{Args, Command, GraphArgs};
use anyhow::{bail, Context};
use clap::Parser;
use graph_rdb::config::GraphConfig;
use graph_rdb::graph::GraphRdb;
use graph_rdb::sparql::BasicQuery;
use oxrdfio::{RdfFormat, RdfParser};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, stdin, stdout, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod cli;

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let matches = Args::parse();
    match matches.command {
        Command::Load {
            graph,
            file,
            format,
            base,
        } => {
            let format = if let Some(format) = format {
                rdf_format_from_name(&format)?
            } else if let Some(file) = &file {
                rdf_format_from_path(file)?
            } else {
                bail!("The --format option must be set when loading from stdin")
            };
            let mut parser = RdfParser::from_format(format);
            if let Some(base) = base {
                parser = parser
                    .with_base_iri(&base)
                    .with_context(|| format!("Invalid base IRI {base}"))?;
            }

            let mut graph = open_graph(&graph)?;
            let count = if let Some(file) = file {
                let reader = BufReader::new(
                    File::open(&file)
                        .with_context(|| format!("Not able to open {}", file.display()))?,
                );
                graph.load_from_reader(parser, reader)?
            } else {
                graph.load_from_reader(parser, stdin().lock())?
            };
            tracing::info!(count, "Loaded triples");
            Ok(())
        }
        Command::Query {
            graph,
            query,
            query_file,
        } => {
            let query = BasicQuery::parse(&read_query(query, query_file)?)?;
            let graph = open_graph(&graph)?;
            let mut stdout = stdout().lock();
            writeln!(
                stdout,
                "{}",
                query
                    .projection()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\t")
            )?;
            for solution in graph.query_basic(&query)? {
                let solution = solution?;
                let row = query
                    .projection()
                    .iter()
                    .map(|variable| {
                        solution
                            .get(variable.as_str())
                            .map(ToString::to_string)
                            .unwrap_or_default()
                    })
                    .collect::<Vec<_>>();
                writeln!(stdout, "{}", row.join("\t"))?;
            }
            stdout.flush()?;
            Ok(())
        }
        Command::Explain {
            graph,
            query,
            query_file,
        } => {
            let query = BasicQuery::parse(&read_query(query, query_file)?)?;
            let graph = open_graph(&graph)?;
            let explanation = graph.explain(query.patterns(), query.constraints())?;
            writeln!(stdout(), "{explanation}")?;
            Ok(())
        }
        Command::Count { graph } => {
            let graph = open_graph(&graph)?;
            writeln!(
                stdout(),
                "{}\t{}",
                graph.len()?,
                graph.reifier_len()?
            )?;
            Ok(())
        }
        Command::Clear { graph } => {
            open_graph(&graph)?.clear()?;
            Ok(())
        }
    }
}

fn open_graph(args: &GraphArgs) -> anyhow::Result<GraphRdb> {
    let config = GraphConfig::new()
        .with_graph_id(args.graph_id)
        .with_table_prefix(args.table_prefix.clone())
        .with_reification_behavior(args.behavior);
    GraphRdb::open(&args.db, config)
        .with_context(|| format!("Not able to open the graph in {}", args.db.display()))
}

fn read_query(query: Option<String>, query_file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(query) = query {
        Ok(query)
    } else if let Some(file) = query_file {
        fs::read_to_string(&file)
            .with_context(|| format!("Not able to read query file {}", file.display()))
    } else {
        bail!("Either --query or --query-file must be set")
    }
}

fn format_from_path<T>(
    path: &Path,
    from_extension: impl FnOnce(&str) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    if let Some(ext) = path.extension().and_then(OsStr::to_str) {
        from_extension(ext).map_err(|e| {
            e.context(format!(
                "Not able to guess the file format from file name extension '{ext}'"
            ))
        })
    } else {
        bail!(
            "The path {} has no extension to guess a file format from",
            path.display()
        )
    }
}

fn rdf_format_from_path(path: &Path) -> anyhow::Result<RdfFormat> {
    format_from_path(path, |ext| {
        RdfFormat::from_extension(ext)
            .with_context(|| format!("The file extension '{ext}' is unknown"))
    })
}

fn rdf_format_from_name(name: &str) -> anyhow::Result<RdfFormat> {
    if let Some(t) = RdfFormat::from_extension(name) {
        return Ok(t);
    }
    if let Some(t) = RdfFormat::from_media_type(name) {
        return Ok(t);
    }
    bail!("The file format '{name}' is unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clap_debug() {
        use clap::CommandFactory;

        Args::command().debug_assert()
    }
}

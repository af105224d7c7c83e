use clap::{Args as ClapArgs, Parser, Subcommand, ValueHint};
use graph_rdb::common::ReificationBehavior;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "graph-rdb")]
/// GraphRDB command line toolkit
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

/// Where the graph is stored.
#[derive(ClapArgs)]
pub struct GraphArgs {
    /// SQLite database file holding the graph
    ///
    /// The file and its tables are created if they do not exist.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub db: PathBuf,
    /// Id of the graph inside the tables
    ///
    /// Several graphs may share the same tables.
    #[arg(long, default_value_t = 1)]
    pub graph_id: i64,
    /// Prefix of the table names
    #[arg(long, default_value = "rdb")]
    pub table_prefix: String,
    /// How reification triples are exposed
    ///
    /// One of "hide-nothing", "hide-full-and-partial" or "hide-only-full".
    #[arg(long, default_value_t = ReificationBehavior::HideNothing)]
    pub behavior: ReificationBehavior,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a file into the graph
    Load {
        #[command(flatten)]
        graph: GraphArgs,
        /// File to load
        ///
        /// If no file is given, stdin is read.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// The format of the file to load
        ///
        /// It can be an extension like "nt" or a MIME type like "application/n-triples".
        ///
        /// By default the format is guessed from the loaded file extension.
        #[arg(long, required_unless_present = "file")]
        format: Option<String>,
        /// Base IRI of the file to read
        #[arg(long, value_hint = ValueHint::Url)]
        base: Option<String>,
    },
    /// Evaluate a SPARQL SELECT query made of a basic graph pattern and simple filters
    ///
    /// The solutions are written to stdout as tab-separated values.
    Query {
        #[command(flatten)]
        graph: GraphArgs,
        /// The query to evaluate
        #[arg(short, long, conflicts_with = "query_file")]
        query: Option<String>,
        /// File containing the query to evaluate
        #[arg(long, conflicts_with = "query", value_hint = ValueHint::FilePath)]
        query_file: Option<PathBuf>,
    },
    /// Print the stages a SPARQL query is planned into
    Explain {
        #[command(flatten)]
        graph: GraphArgs,
        /// The query to explain
        #[arg(short, long, conflicts_with = "query_file")]
        query: Option<String>,
        /// File containing the query to explain
        #[arg(long, conflicts_with = "query", value_hint = ValueHint::FilePath)]
        query_file: Option<PathBuf>,
    },
    /// Print the number of visible triples and of reification triples
    Count {
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Remove every triple of the graph
    Clear {
        #[command(flatten)]
        graph: GraphArgs,
    },
}

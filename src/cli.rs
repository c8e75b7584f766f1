use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::{
    chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE},
    corpus::{DEFAULT_ID_COLUMN, DEFAULT_TEXT_COLUMN},
};

/// Default LSH hash width in bits.
pub const DEFAULT_NBITS: usize = 16;

#[derive(Debug, Parser)]
#[command(
    name = "passfind",
    about = "A semantic passage search CLI for long documents"
)]
pub struct Cli {
    /// Override the data directory (default: ./data)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chunk the source table, embed every chunk, and save the snapshot
    Index(IndexArgs),
    /// Retrieve the chunks closest to a query
    Search(SearchArgs),
    /// Score LSH retrieval against exact search (recall@k)
    Eval(EvalArgs),
    /// Show the data directory and snapshot state
    Status(StatusArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

/// Options describing the source table and how to chunk it. Shared by the
/// commands that recompute chunks from source.
#[derive(Debug, Parser)]
pub struct CorpusArgs {
    /// Source table name (resolved to <data-dir>/<table>.csv)
    #[arg(long, default_value = "book_df")]
    pub table: String,

    /// Column holding the record identifier
    #[arg(long, default_value = DEFAULT_ID_COLUMN)]
    pub id_column: String,

    /// Column holding the record text
    #[arg(long, default_value = DEFAULT_TEXT_COLUMN)]
    pub text_column: String,

    /// Maximum chunk size in characters
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Target overlap between adjacent chunks in characters
    #[arg(long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
    pub overlap: usize,
}

#[derive(Debug, Parser)]
pub struct IndexArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Number of results to return
    #[arg(short = 'n', long, default_value = "5")]
    pub count: usize,

    /// Use the approximate LSH index instead of exact search
    #[arg(long)]
    pub lsh: bool,

    /// LSH hash width in bits
    #[arg(long, default_value_t = DEFAULT_NBITS)]
    pub nbits: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub corpus: CorpusArgs,
}

#[derive(Debug, Parser)]
pub struct EvalArgs {
    /// LSH hash width in bits
    #[arg(long, default_value_t = DEFAULT_NBITS)]
    pub nbits: usize,

    /// Neighbors per query
    #[arg(short = 'k', long, default_value = "5")]
    pub k: usize,

    /// Number of stored vectors to reuse as queries
    #[arg(long, default_value = "50")]
    pub queries: usize,
}

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "passfind",
            &mut std::io::stdout(),
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parse_search_defaults() {
        let cli = Cli::parse_from(["passfind", "search", "hello"]);
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.query, "hello");
                assert_eq!(args.count, 5);
                assert!(!args.lsh);
                assert_eq!(args.nbits, DEFAULT_NBITS);
                assert!(!args.json);
                assert_eq!(args.corpus.table, "book_df");
                assert_eq!(args.corpus.id_column, DEFAULT_ID_COLUMN);
                assert_eq!(args.corpus.text_column, DEFAULT_TEXT_COLUMN);
                assert_eq!(args.corpus.chunk_size, DEFAULT_CHUNK_SIZE);
                assert_eq!(args.corpus.overlap, DEFAULT_CHUNK_OVERLAP);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn parse_index_with_overrides() {
        let cli = Cli::parse_from([
            "passfind",
            "index",
            "--table",
            "passages_df",
            "--chunk-size",
            "500",
            "--overlap",
            "100",
        ]);
        match cli.command {
            Command::Index(args) => {
                assert_eq!(args.corpus.table, "passages_df");
                assert_eq!(args.corpus.chunk_size, 500);
                assert_eq!(args.corpus.overlap, 100);
            }
            _ => panic!("expected index command"),
        }
    }

    #[test]
    fn parse_eval_flags() {
        let cli = Cli::parse_from([
            "passfind", "eval", "--nbits", "64", "-k", "10", "--queries", "20",
        ]);
        match cli.command {
            Command::Eval(args) => {
                assert_eq!(args.nbits, 64);
                assert_eq!(args.k, 10);
                assert_eq!(args.queries, 20);
            }
            _ => panic!("expected eval command"),
        }
    }
}

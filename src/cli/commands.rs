//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "dsacoach")]
#[command(about = "Retrieval-augmented DSA tutor: chat API server and document indexer")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Allow cross-origin requests from any origin
        #[arg(long)]
        cors: bool,
    },
    /// Ask a single question from the terminal
    Ask {
        /// The question to answer
        question: String,
        /// Wait for the complete answer
        #[arg(long, conflicts_with = "stream")]
        batch: bool,
        /// Print the answer as it is generated
        #[arg(long)]
        stream: bool,
    },
    /// Split, embed and upsert documents into the vector index
    Index {
        /// Text files to index
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Characters per chunk (overrides ingest.chunk_size)
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Characters shared by consecutive chunks (overrides ingest.chunk_overlap)
        #[arg(long)]
        chunk_overlap: Option<usize>,
        /// Source label stored with each chunk (default: file name)
        #[arg(long)]
        source: Option<String>,
    },
    /// Show the effective configuration with secrets masked
    Config,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["dsacoach", "-v", "ask", "What is a heap?", "--batch"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Ask {
                question,
                batch,
                stream,
            } => {
                assert_eq!(question, "What is a heap?");
                assert!(batch);
                assert!(!stream);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_batch_and_stream_conflict() {
        assert!(Cli::try_parse_from(["dsacoach", "ask", "q", "--batch", "--stream"]).is_err());
    }

    #[test]
    fn test_index_requires_paths() {
        assert!(Cli::try_parse_from(["dsacoach", "index"]).is_err());
        let cli = Cli::parse_from(["dsacoach", "index", "notes.md", "--chunk-size", "500"]);
        assert!(matches!(
            cli.command,
            Commands::Index {
                chunk_size: Some(500),
                ..
            }
        ));
    }
}

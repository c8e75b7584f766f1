use clap::Parser;
use tracing_subscriber::EnvFilter;

use passfind::{
    chunking::{self, Chunk, ChunkSplitter},
    cli::{Cli, Command, CorpusArgs, EvalArgs, IndexArgs, SearchArgs},
    corpus,
    data_dir::DataDir,
    embedder::{Embedder, TextEncoder},
    embedding_store::{self, EmbeddingMatrix},
    error::{Error, Result},
    eval,
    index::{FlatIndex, LshIndex, VectorIndex},
    retriever::{self, Retriever},
};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("PASSFIND_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;

    match cli.command {
        Command::Index(args) => cmd_index(&data_dir, &args),
        Command::Search(args) => cmd_search(&data_dir, &args),
        Command::Eval(args) => cmd_eval(&data_dir, &args),
        Command::Status(args) => cmd_status(&data_dir, args.json),
        Command::Completions(args) => {
            args.generate();
            Ok(())
        }
    }
}

/// Load the source table and chunk it, writing the chunk snapshot.
///
/// Records and chunks are recomputed from source each run; only embeddings
/// are persisted between runs.
fn load_chunks(data_dir: &DataDir, args: &CorpusArgs) -> Result<Vec<Chunk>> {
    let table_path = data_dir.table(&args.table);
    let records =
        corpus::load_records(&table_path, &args.id_column, &args.text_column)?;
    let splitter = ChunkSplitter::new(args.chunk_size, args.overlap)?;
    let chunks =
        chunking::chunk_corpus(&records, &splitter, &data_dir.chunks_csv());

    eprintln!(
        "Created {} chunks from {} records",
        chunks.len(),
        records.len()
    );
    Ok(chunks)
}

fn embed_chunks(
    encoder: &mut Embedder,
    chunks: &[Chunk],
) -> Result<EmbeddingMatrix> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = encoder.encode_batch(&texts)?;
    EmbeddingMatrix::from_rows(vectors)
}

fn cmd_index(data_dir: &DataDir, args: &IndexArgs) -> Result<()> {
    let chunks = load_chunks(data_dir, &args.corpus)?;

    let mut encoder = Embedder::new();
    eprintln!("Embedding {} chunks...", chunks.len());
    let matrix = embed_chunks(&mut encoder, &chunks)?;

    let snapshot = data_dir.embeddings_file();
    embedding_store::save_embeddings(&matrix, &snapshot)?;
    eprintln!(
        "Saved {} x {} embedding matrix to {}",
        matrix.len(),
        matrix.dimension(),
        snapshot.display()
    );
    Ok(())
}

fn cmd_search(data_dir: &DataDir, args: &SearchArgs) -> Result<()> {
    let chunks = load_chunks(data_dir, &args.corpus)?;
    let mut encoder = Embedder::new();

    let snapshot = data_dir.embeddings_file();
    let matrix = if snapshot.exists() {
        embedding_store::load_embeddings(&snapshot)?
    } else {
        eprintln!("No embedding snapshot found, encoding corpus...");
        let matrix = embed_chunks(&mut encoder, &chunks)?;
        embedding_store::save_embeddings(&matrix, &snapshot)?;
        matrix
    };

    if matrix.len() != chunks.len() {
        return Err(Error::Config(format!(
            "embedding snapshot holds {} vectors but the corpus produced \
             {} chunks; re-run `passfind index`",
            matrix.len(),
            chunks.len()
        )));
    }

    let results = if args.lsh {
        let mut index = LshIndex::new(matrix.dimension(), args.nbits)?;
        index.add_batch(&matrix)?;
        Retriever::new(&index, &chunks)?.retrieve(
            &mut encoder,
            &args.query,
            args.count,
        )?
    } else {
        let mut index = FlatIndex::new(matrix.dimension());
        index.add_batch(&matrix)?;
        Retriever::new(&index, &chunks)?.retrieve(
            &mut encoder,
            &args.query,
            args.count,
        )?
    };

    if args.json {
        retriever::format_json(&results, &args.query)?;
    } else {
        retriever::format_human(&results);
    }
    Ok(())
}

fn cmd_eval(data_dir: &DataDir, args: &EvalArgs) -> Result<()> {
    let snapshot = data_dir.embeddings_file();
    if !snapshot.exists() {
        return Err(Error::Config(format!(
            "no embedding snapshot at {}; run `passfind index` first",
            snapshot.display()
        )));
    }

    let matrix = embedding_store::load_embeddings(&snapshot)?;
    if matrix.is_empty() {
        return Err(Error::Config("embedding snapshot is empty".into()));
    }

    let mut flat = FlatIndex::new(matrix.dimension());
    flat.add_batch(&matrix)?;
    let mut lsh = LshIndex::new(matrix.dimension(), args.nbits)?;
    lsh.add_batch(&matrix)?;

    // The first stored vectors double as queries, so exact search is the
    // ground truth the LSH results are scored against.
    let query_count = args.queries.min(matrix.len());
    let queries: Vec<Vec<f32>> = (0..query_count)
        .map(|i| matrix.row(i).to_vec())
        .collect();

    let ground_truth = eval::positions(&flat.search_batch(&queries, args.k)?);
    let approximate = eval::positions(&lsh.search_batch(&queries, args.k)?);
    let recall = eval::recall_at_k(&ground_truth, &approximate, args.k)?;

    println!(
        "recall@{} = {recall:.3} ({query_count} queries, {} bits, {} vectors)",
        args.k,
        args.nbits,
        matrix.len()
    );
    Ok(())
}

fn cmd_status(data_dir: &DataDir, json: bool) -> Result<()> {
    let chunks_csv = data_dir.chunks_csv();
    let snapshot = data_dir.embeddings_file();

    let matrix = if snapshot.exists() {
        Some(embedding_store::load_embeddings(&snapshot)?)
    } else {
        None
    };

    if json {
        let output = serde_json::json!({
            "data_dir": data_dir.root().display().to_string(),
            "chunk_snapshot": chunks_csv.exists(),
            "embeddings": matrix.as_ref().map(|m| serde_json::json!({
                "vectors": m.len(),
                "dimension": m.dimension(),
            })),
        });
        println!("{output}");
    } else {
        println!("Data directory: {}", data_dir.root().display());
        println!(
            "Chunk snapshot: {}",
            if chunks_csv.exists() {
                chunks_csv.display().to_string()
            } else {
                "not written".to_string()
            }
        );
        match matrix {
            Some(m) => println!(
                "Embeddings: {} vectors of dimension {}",
                m.len(),
                m.dimension()
            ),
            None => println!("Embeddings: no snapshot (run `passfind index`)"),
        }
    }
    Ok(())
}

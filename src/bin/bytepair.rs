use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bstr::BStr;
use bytepair::codec::{format_tokens, parse_tokens};
use bytepair::config::{FitConfig, IngestConfig, TokenizerConfig};
use bytepair::corpus::load_text_corpus;
use bytepair::preprocess::{
    DEFAULT_NORMALIZER_PATTERN, DEFAULT_NORMALIZER_REPLACEMENT, DEFAULT_SPLIT_PATTERN,
};
use bytepair::{TokenId, Tokenizer};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, log_enabled, Level};
use rayon::ThreadPoolBuilder;
use serde_json::json;

const DEFAULT_PARAMS: &str = "params.json";

#[derive(Parser, Debug)]
#[command(author, version, about = "Byte pair encoding toolkit", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Learn merge rules from text files or stdin
    Train(TrainArgs),
    /// Encode bytes into token ids
    Encode(EncodeArgs),
    /// Decode token ids back into bytes
    Decode(DecodeArgs),
    /// Print the byte string behind every merge token
    Vocab(VocabArgs),
    /// Inspect a vocabulary artifact
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Files or directories to ingest (reads stdin when omitted)
    inputs: Vec<PathBuf>,

    /// Output path for the vocabulary artifact
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_PARAMS)]
    output: PathBuf,

    /// Pattern cutting text into chunks
    #[arg(long, value_name = "REGEX", default_value = DEFAULT_SPLIT_PATTERN)]
    split_pattern: String,

    /// Pattern rewritten before chunking
    #[arg(long, value_name = "REGEX", default_value = DEFAULT_NORMALIZER_PATTERN)]
    normalize_pattern: String,

    /// Replacement template for --normalize-pattern
    #[arg(long, value_name = "TEMPLATE", default_value = DEFAULT_NORMALIZER_REPLACEMENT)]
    normalize_replacement: String,

    /// Train on text verbatim
    #[arg(long, conflicts_with_all = ["normalize_pattern", "normalize_replacement"])]
    no_normalize: bool,

    /// Maximum merge iterations
    #[arg(long, value_name = "COUNT", default_value_t = 1000)]
    max_iterations: usize,

    /// Highest token id that may be issued
    #[arg(long, value_name = "ID", default_value_t = 1000)]
    max_token: TokenId,

    /// Disable per-iteration logging/progress
    #[arg(long)]
    no_progress: bool,

    /// Emit pretty JSON
    #[arg(long)]
    pretty: bool,

    /// Disable recursive directory traversal
    #[arg(long)]
    no_recursive: bool,

    /// Follow symlinks during traversal
    #[arg(long)]
    follow_symlinks: bool,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Vocabulary artifact to load
    #[arg(short = 'm', long, value_name = "PATH", default_value = DEFAULT_PARAMS)]
    tokenizer: PathBuf,

    /// Files to encode (reads stdin when omitted)
    inputs: Vec<PathBuf>,

    /// Apply the artifact's normalizer before encoding
    #[arg(long)]
    normalize: bool,

    /// Emit JSON lines instead of whitespace separated ids
    #[arg(long)]
    json: bool,

    /// Limit Rayon worker threads
    #[arg(long, value_name = "N")]
    threads: Option<usize>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Vocabulary artifact to load
    #[arg(short = 'm', long, value_name = "PATH", default_value = DEFAULT_PARAMS)]
    tokenizer: PathBuf,

    /// Path to whitespace separated token ids
    #[arg(long, value_name = "PATH", conflicts_with = "tokens")]
    input: Option<PathBuf>,

    /// Token ids to decode (reads stdin when neither ids nor --input are given)
    #[arg(value_name = "ID")]
    tokens: Vec<TokenId>,

    /// Output file for decoded bytes (defaults to stdout)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct VocabArgs {
    /// Vocabulary artifact to load
    #[arg(short = 'm', long, value_name = "PATH", default_value = DEFAULT_PARAMS)]
    tokenizer: PathBuf,

    /// Emit a JSON object keyed by token id
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Vocabulary artifact to inspect
    #[arg(short = 'm', long, value_name = "PATH", default_value = DEFAULT_PARAMS)]
    tokenizer: PathBuf,

    /// Emit machine-readable JSON summary
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Encode(args) => run_encode(args),
        Commands::Decode(args) => run_decode(args),
        Commands::Vocab(args) => run_vocab(args),
        Commands::Info(args) => run_info(args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = match (quiet, verbose) {
        (0, 0) => LevelFilter::Info,
        (0, 1) => LevelFilter::Debug,
        (0, _) => LevelFilter::Trace,
        (1, _) => LevelFilter::Warn,
        _ => LevelFilter::Error,
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

/// How `train` reports progress. The spinner redraws over stderr, so it is only
/// used when per-iteration log lines cannot reach the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrainProgress {
    Hidden,
    Spinner,
    IterationLog,
}

impl TrainProgress {
    fn select(no_progress: bool, debug_logging: bool) -> Self {
        if no_progress {
            Self::Hidden
        } else if debug_logging {
            Self::IterationLog
        } else {
            Self::Spinner
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let mut builder = TokenizerConfig::builder().split_pattern(args.split_pattern.as_str());
    builder = if args.no_normalize {
        builder.without_normalizer()
    } else {
        builder.normalizer(
            args.normalize_pattern.as_str(),
            args.normalize_replacement.as_str(),
        )
    };
    let config = builder.build().context("invalid tokenizer configuration")?;
    let mut tokenizer = Tokenizer::new(config)?;

    let texts = if args.inputs.is_empty() {
        vec![read_stdin()?]
    } else {
        let ingest_cfg = IngestConfig::builder()
            .recursive(!args.no_recursive)
            .follow_symlinks(args.follow_symlinks)
            .build();
        load_text_corpus(&args.inputs, &ingest_cfg).context("failed to load training corpus")?
    };
    let corpus_bytes: usize = texts.iter().map(Vec::len).sum();
    for text in &texts {
        tokenizer.load_text(text);
    }
    drop(texts);
    info!(
        "loaded {} chunks ({} tokens) from {} bytes",
        tokenizer.corpus().len(),
        tokenizer.corpus().token_count(),
        corpus_bytes
    );

    let progress = TrainProgress::select(args.no_progress, log_enabled!(Level::Debug));
    let fit_cfg = FitConfig::builder()
        .max_iterations(args.max_iterations)
        .max_token_value(args.max_token)
        .show_progress(progress == TrainProgress::IterationLog)
        .build();

    let spinner = if progress == TrainProgress::Spinner {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} learning merge rules... {elapsed}")
            .context("invalid progress template")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let metrics = tokenizer.fit_with(&fit_cfg);
    if let Some(pb) = spinner {
        pb.finish_with_message("training complete");
    }
    let elapsed = start.elapsed();

    tokenizer
        .save(&args.output, args.pretty)
        .with_context(|| format!("failed to save tokenizer to {}", args.output.display()))?;

    let table = tokenizer.merge_table();
    info!(
        "training complete: rules={} last_token={} stop={:?} duration={elapsed:.2?}",
        table.len(),
        table.last_token(),
        metrics.stop_reason
    );
    println!(
        "wrote {} merge rules (last token {}) to {}",
        table.len(),
        table.last_token(),
        args.output.display()
    );
    println!(
        "   corpus {} bytes | stop {:?} | duration {:.2?}",
        corpus_bytes, metrics.stop_reason, elapsed
    );

    Ok(())
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("unable to configure Rayon thread pool")?;
    }
    let tokenizer = load_tokenizer(&args.tokenizer)?;

    if args.inputs.is_empty() {
        let data = read_stdin()?;
        let tokens = if args.normalize {
            tokenizer.encode_text(&data)
        } else {
            tokenizer.encode(&data)
        };
        if args.json {
            println!("{}", json!({ "path": "-", "tokens": tokens }));
        } else {
            println!("{}", format_tokens(&tokens));
        }
        return Ok(());
    }

    let mut buffers = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        buffers.push(if args.normalize {
            tokenizer.normalize(&data).into_owned()
        } else {
            data
        });
    }

    let encoded = tokenizer.encode_batch(&buffers);
    for (path, tokens) in args.inputs.iter().zip(&encoded) {
        if args.json {
            let record = json!({
                "path": path.display().to_string(),
                "tokens": tokens
            });
            println!("{record}");
        } else {
            println!("{}:\t{}", path.display(), format_tokens(tokens));
        }
    }

    Ok(())
}

fn run_decode(args: DecodeArgs) -> Result<()> {
    let tokenizer = load_tokenizer(&args.tokenizer)?;

    let tokens = if let Some(input_path) = &args.input {
        let contents = fs::read_to_string(input_path)
            .with_context(|| format!("failed to read {}", input_path.display()))?;
        parse_tokens(&contents)?
    } else if args.tokens.is_empty() {
        let contents =
            String::from_utf8(read_stdin()?).context("token list on stdin is not UTF-8")?;
        parse_tokens(&contents)?
    } else {
        args.tokens
    };

    let bytes = tokenizer
        .decode(&tokens)
        .context("failed to decode token ids")?;

    if let Some(path) = &args.output {
        let mut file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(&bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {} bytes to {}", bytes.len(), path.display());
    } else {
        io::stdout().write_all(&bytes)?;
    }

    Ok(())
}

fn run_vocab(args: VocabArgs) -> Result<()> {
    let tokenizer = load_tokenizer(&args.tokenizer)?;
    let tokens = tokenizer.string_tokens();

    if args.json {
        let entries: serde_json::Map<String, serde_json::Value> = tokens
            .iter()
            .map(|(id, bytes)| (id.to_string(), json!(String::from_utf8_lossy(bytes))))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for (id, bytes) in &tokens {
            writeln!(out, "{id}\t{:?}", BStr::new(bytes))?;
        }
    }

    Ok(())
}

fn run_info(args: InfoArgs) -> Result<()> {
    let tokenizer = load_tokenizer(&args.tokenizer)?;
    let config = tokenizer.config();
    let table = tokenizer.merge_table();
    let longest = tokenizer
        .string_tokens()
        .values()
        .map(Vec::len)
        .max()
        .unwrap_or(1);

    if args.json {
        let summary = json!({
            "path": args.tokenizer.display().to_string(),
            "rules": table.len(),
            "last_token": table.last_token(),
            "longest_token_bytes": longest,
            "split_pattern": config.split_pattern,
            "normalizer": config.normalizer,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Merge rules  : {}", table.len());
        println!("Last token   : {}", table.last_token());
        println!("Longest token: {longest} bytes");
        println!("Split pattern: {}", config.split_pattern);
        match &config.normalizer {
            Some(normalizer) => println!(
                "Normalizer   : {} -> {}",
                normalizer.pattern, normalizer.replacement
            ),
            None => println!("Normalizer   : (none)"),
        }
    }

    Ok(())
}

fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    Tokenizer::load(path)
        .with_context(|| format!("failed to load tokenizer from {}", path.display()))
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut data = Vec::new();
    io::stdin()
        .read_to_end(&mut data)
        .context("failed to read stdin")?;
    Ok(data)
}

use anyhow::{bail, Context};
use clap::Parser;
use joinx::{
    Analyzer, Columns, EncoderKind, FuzzyJoiner, JoinConfig, JoinHow, JoinOptions, JoinOutput,
    JoinWarning, MatchReport,
};
use polars::prelude::{
    CsvReadOptions, CsvWriter, DataFrame, JsonFormat, JsonReader, JsonWriter, PolarsResult,
    SerReader, SerWriter,
};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Join two tables (CSV or JSON) on approximately matching keys
#[derive(Parser, Debug)]
#[command(name = "joinx")]
#[command(about = "Fuzzy join of two tables", long_about = None)]
struct Args {
    /// Left table (.csv, otherwise a JSON array of rows)
    #[arg(long)]
    left: PathBuf,

    /// Right table (.csv, otherwise a JSON array of rows)
    #[arg(long)]
    right: PathBuf,

    /// Key columns present in both tables, comma separated
    #[arg(long, value_delimiter = ',')]
    on: Vec<String>,

    /// Key columns of the left table, comma separated
    #[arg(long, value_delimiter = ',')]
    left_on: Vec<String>,

    /// Key columns of the right table, comma separated
    #[arg(long, value_delimiter = ',')]
    right_on: Vec<String>,

    /// Table driving the search: left or right
    #[arg(long)]
    how: Option<String>,

    /// Text analyzer: word, char or char_wb
    #[arg(long)]
    analyzer: Option<String>,

    /// Text vectorizer: hashing or count
    #[arg(long)]
    encoder: Option<String>,

    /// Shortest n-gram
    #[arg(long)]
    ngram_min: Option<usize>,

    /// Longest n-gram
    #[arg(long)]
    ngram_max: Option<usize>,

    /// Minimum score for a match to be accepted
    #[arg(long)]
    match_score: Option<f64>,

    /// Remove rows whose match is rejected
    #[arg(long)]
    drop_unmatched: bool,

    /// Sort output rows by the key columns
    #[arg(long)]
    sort: bool,

    /// Append a matching_score column
    #[arg(long)]
    return_score: bool,

    /// Suffixes for overlapping column names, as "left,right"
    #[arg(long)]
    suffixes: Option<String>,

    /// JSON join configuration; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file, CSV when it ends in .csv (JSON on stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the match report and warnings along with the table
    #[arg(long)]
    report: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    table: serde_json::Value,
    report: &'a MatchReport,
    warnings: Vec<WarningEntry<'a>>,
}

#[derive(Serialize)]
struct WarningEntry<'a> {
    #[serde(flatten)]
    warning: &'a JoinWarning,
    message: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout may carry the joined table
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting joinx v{}", env!("CARGO_PKG_VERSION"));

    let options = build_options(&args)?;
    let joiner = FuzzyJoiner::new(options)?;

    let left = load_table(&args.left)?;
    let right = load_table(&args.right)?;
    info!("Left table: {} rows, {} columns", left.height(), left.width());
    info!("Right table: {} rows, {} columns", right.height(), right.width());

    let output = joiner.join(&left, &right)?;
    info!(
        "Joined {} rows ({} accepted, {} rejected)",
        output.table.height(),
        output.report.stats.accepted,
        output.report.stats.rejected
    );

    write_output(&args, &output)
}

fn build_options(args: &Args) -> anyhow::Result<JoinOptions> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            JoinConfig::from_json(&json).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => JoinConfig::default(),
    };

    if !args.on.is_empty() {
        config.on = Some(Columns::Many(args.on.clone()));
    }
    if !args.left_on.is_empty() || !args.right_on.is_empty() {
        config.on = None;
        config.left_on = Some(Columns::Many(args.left_on.clone()));
        config.right_on = Some(Columns::Many(args.right_on.clone()));
    }
    if let Some(how) = &args.how {
        config.how = how.parse::<JoinHow>()?;
    }
    if let Some(analyzer) = &args.analyzer {
        config.analyzer = analyzer.parse::<Analyzer>()?;
    }
    if let Some(encoder) = &args.encoder {
        config.encoder = encoder.parse::<EncoderKind>()?;
    }
    if let Some(min) = args.ngram_min {
        config.ngram_range.0 = min;
    }
    if let Some(max) = args.ngram_max {
        config.ngram_range.1 = max;
    }
    if let Some(score) = args.match_score {
        config.match_score = score;
    }
    config.drop_unmatched |= args.drop_unmatched;
    config.sort |= args.sort;
    config.return_score |= args.return_score;
    if let Some(suffixes) = &args.suffixes {
        let Some((left, right)) = suffixes.split_once(',') else {
            bail!(joinx::Error::InvalidConfig(format!(
                "suffixes must be given as \"left,right\", got {suffixes:?}"
            )));
        };
        config.suffixes = (left.to_string(), right.to_string());
    }

    Ok(JoinOptions::from(config))
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn load_table(path: &Path) -> anyhow::Result<DataFrame> {
    let table = if is_csv(path) {
        CsvReadOptions::default()
            .with_has_header(true)
            .map_parse_options(|opts| opts.with_try_parse_dates(true))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
    } else {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        JsonReader::new(file).finish()
    };
    table.with_context(|| format!("reading table {}", path.display()))
}

fn write_table(writer: &mut dyn Write, table: &mut DataFrame, csv: bool) -> PolarsResult<()> {
    if csv {
        CsvWriter::new(writer).include_header(true).finish(table)
    } else {
        JsonWriter::new(writer)
            .with_json_format(JsonFormat::Json)
            .finish(table)
    }
}

fn write_output(args: &Args, output: &JoinOutput) -> anyhow::Result<()> {
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut table = output.table.clone();

    if args.report {
        let mut rows = Vec::new();
        write_table(&mut rows, &mut table, false)?;
        let document = ReportDocument {
            table: serde_json::from_slice(&rows)?,
            report: &output.report,
            warnings: output
                .warnings
                .iter()
                .map(|warning| WarningEntry {
                    warning,
                    message: warning.to_string(),
                })
                .collect(),
        };
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writeln!(writer)?;
    } else {
        let csv = args.output.as_deref().is_some_and(is_csv);
        write_table(&mut writer, &mut table, csv)?;
        if !csv {
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}

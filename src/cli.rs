use crate::Args;
use crate::config::{Config, FilterSet, parse_filter_list};
use crate::error::{CustomError, Result};
use crate::output::{RunReport, header_columns, tsv_writer, write_report, write_sample_list};
use crate::pipeline::{self, OutputSink};
use crate::reader::LineFramer;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt};

const STDIO: &str = "-";
const IO_BUFFER_BYTES: usize = 1 << 20;

pub fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    match &args.log_file {
        Some(path) => {
            let file = File::create(path).map_err(|e| CustomError::LogFile {
                source: e,
                path: path.to_path_buf(),
            })?;
            fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .ok();
        }
        None => {
            fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .with_target(false)
                .try_init()
                .ok();
        }
    }
    Ok(())
}

pub fn build_config(args: &Args) -> Config {
    let allow = parse_filter_list(&args.allow_filter);
    let deny = args
        .exclude_filter
        .as_deref()
        .map(parse_filter_list)
        .filter(|set| !set.is_empty());
    Config {
        empty_field: args.empty_field.clone(),
        field_delimiter: args.field_delimiter.clone(),
        keep_id: args.keep_id,
        keep_qual: args.keep_qual,
        keep_pos: args.keep_pos,
        keep_info: args.keep_info,
        filters: FilterSet::new((!allow.is_empty()).then_some(allow), deny),
    }
}

fn open_input(input: &str) -> Result<Box<dyn BufRead>> {
    if input == STDIO {
        return Ok(Box::new(BufReader::with_capacity(
            IO_BUFFER_BYTES,
            io::stdin().lock(),
        )));
    }
    let f = File::open(input).map_err(|e| CustomError::ReadWithPath {
        source: e,
        path: PathBuf::from(input),
    })?;
    Ok(Box::new(BufReader::with_capacity(IO_BUFFER_BYTES, f)))
}

fn open_output(output: &str) -> Result<Box<dyn Write + Send>> {
    if output == STDIO {
        return Ok(Box::new(io::stdout()));
    }
    let f = File::create(output).map_err(|e| CustomError::Write {
        source: e,
        path: PathBuf::from(output),
    })?;
    Ok(Box::new(BufWriter::with_capacity(IO_BUFFER_BYTES, f)))
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {spinner} {human_pos} lines")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(200));
    pb
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

pub fn run(args: &Args) -> Result<()> {
    let started = Local::now();
    let config = build_config(args);
    let threads = args.threads.unwrap_or_else(default_threads);

    let mut framer = LineFramer::new(open_input(&args.input)?)?;
    let header = framer.read_header()?;
    tracing::info!(
        samples = header.n_samples(),
        line_ending = ?framer.line_ending(),
        threads,
        "read VCF header"
    );

    if let Some(path) = &args.sample_list {
        write_sample_list(path, &header)?;
        tracing::info!("wrote sample list to {}", path.display());
    }

    let sink = OutputSink::new(open_output(&args.output)?);
    let mut header_line = tsv_writer(Vec::new());
    header_line.write_record(header_columns(&config))?;
    header_line
        .flush()
        .map_err(|e| CustomError::WriteWithoutPath { source: e })?;
    sink.write(header_line.get_ref())?;

    let pb = progress_bar(args.quiet);
    let stats = pipeline::run(
        &mut framer,
        &config,
        &header,
        &sink,
        threads,
        args.batch_size,
        &pb,
    )?;
    pb.finish_and_clear();

    tracing::info!(
        lines = stats.lines,
        rows = stats.rows_written,
        filtered = stats.filtered,
        rejected_sites = stats.rejected_sites,
        malformed_genotypes = stats.malformed_genotypes,
        field_count_mismatches = stats.field_count_mismatches,
        "finished"
    );

    if let Some(path) = &args.report {
        let report = RunReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: started.to_rfc3339(),
            input: args.input.clone(),
            output: args.output.clone(),
            threads,
            n_samples: header.n_samples(),
            statistics: stats,
        };
        write_report(path, &report)?;
        tracing::info!("wrote run report to {}", path.display());
    }
    Ok(())
}

mod logging;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use xxhash_rust::xxh3::xxh3_64;

use silk_core::format::{DEFAULT_CHANNELS, DEFAULT_FRAMES_PER_PACKET, DEFAULT_SAMPLE_RATE};
use silk_core::{ContainerReader, ConvertConfig, DecodeConfig, DecodeOrchestrator};
use silk_decoders::decoder_by_name;

use crate::logging::{init_logging, LogFormat, LogLevel};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "silk2wav",
    about = "Decode SILK v3 voice files (#!SILK_V3) into WAV or raw PCM",
    version
)]
struct Cli {
    /// Log output format (stderr)
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr)
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

/// Backend used when `--decoder` is not given. Only builds with the
/// `native` feature can decode real SILK frames.
#[cfg(feature = "native")]
const DEFAULT_DECODER: &str = "native";
#[cfg(not(feature = "native"))]
const DEFAULT_DECODER: &str = "passthrough";

#[derive(Args, Debug)]
struct DecoderArgs {
    /// Frame decoder backend: native (needs the `native` build feature) | passthrough
    #[arg(short, long, env = "SILK2WAV_DECODER", default_value = DEFAULT_DECODER)]
    decoder: String,
    /// Output sample rate the decoder is configured with, in Hz
    #[arg(long, env = "SILK2WAV_SAMPLE_RATE", default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,
    /// Frames packed into each block
    #[arg(long, default_value_t = DEFAULT_FRAMES_PER_PACKET)]
    frames_per_packet: u32,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a SILK v3 file into a WAV file
    Convert {
        /// Source SILK file ("-" reads stdin)
        input: PathBuf,
        /// Destination WAV file ("-" writes to stdout)
        output: PathBuf,
        #[command(flatten)]
        decoder: DecoderArgs,
        /// Channel count written to the WAV header
        #[arg(short, long, env = "SILK2WAV_CHANNELS", default_value_t = DEFAULT_CHANNELS)]
        channels: u16,
    },
    /// Decode a SILK v3 file into headerless 16-bit little-endian PCM
    Decode {
        /// Source SILK file ("-" reads stdin)
        input: PathBuf,
        /// Destination PCM file ("-" writes to stdout)
        output: PathBuf,
        #[command(flatten)]
        decoder: DecoderArgs,
    },
    /// Print container header and block statistics without decoding
    Inspect {
        /// SILK file to inspect
        file: PathBuf,
        /// Print per-block details
        #[arg(long)]
        blocks: bool,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn is_std_stream(path: &Path) -> bool {
    path.to_str() == Some("-")
}

fn open_input(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    if is_std_stream(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("opening input file {:?}", path))?;
    Ok(Box::new(file))
}

fn create_output(path: &Path) -> anyhow::Result<Box<dyn Write>> {
    if is_std_stream(path) {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file = File::create(path).with_context(|| format!("creating output file {:?}", path))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

/// Playback length of `pcm_bytes` of 16-bit mono audio at `sample_rate`.
fn duration_secs(pcm_bytes: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    (pcm_bytes / 2) as f64 / f64::from(sample_rate)
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_convert(
    input: PathBuf,
    output: PathBuf,
    args: DecoderArgs,
    channels: u16,
) -> anyhow::Result<()> {
    let decoder = decoder_by_name(&args.decoder)?;
    let config = ConvertConfig {
        sample_rate: args.sample_rate,
        frames_per_packet: args.frames_per_packet,
        channels,
    };

    let src = open_input(&input)?;
    let t0 = Instant::now();
    let wav = silk_core::convert_with(src, decoder.as_ref(), &config)
        .with_context(|| format!("converting {:?}", input))?;
    let elapsed = t0.elapsed();

    let mut dst = create_output(&output)?;
    dst.write_all(&wav)?;
    dst.flush()?;

    let pcm_len = wav.len() - silk_core::WAV_HEADER_SIZE;
    eprintln!("  decoder     : {}", decoder.name());
    eprintln!("  sample rate : {} Hz", config.sample_rate);
    eprintln!("  channels    : {}", config.channels);
    eprintln!("  pcm size    : {}", human_bytes(pcm_len as u64));
    eprintln!("  wav size    : {}", human_bytes(wav.len() as u64));
    eprintln!(
        "  duration    : {:.2}s",
        duration_secs(pcm_len, config.sample_rate)
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_decode(input: PathBuf, output: PathBuf, args: DecoderArgs) -> anyhow::Result<()> {
    let decoder = decoder_by_name(&args.decoder)?;
    let config = DecodeConfig {
        sample_rate: args.sample_rate,
        frames_per_packet: args.frames_per_packet,
    };

    let src = BufReader::new(open_input(&input)?);
    let t0 = Instant::now();
    let pcm = DecodeOrchestrator::with_config(decoder.as_ref(), config)
        .decode(src)
        .with_context(|| format!("decoding {:?}", input))?;
    let elapsed = t0.elapsed();

    let mut dst = create_output(&output)?;
    dst.write_all(&pcm)?;
    dst.flush()?;

    eprintln!("  decoder     : {}", decoder.name());
    eprintln!("  pcm size    : {}", human_bytes(pcm.len() as u64));
    eprintln!(
        "  duration    : {:.2}s",
        duration_secs(pcm.len(), config.sample_rate)
    );
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

#[derive(Debug, Default)]
struct BlockStats {
    count: u64,
    payload_bytes: u64,
    min_len: Option<usize>,
    max_len: usize,
    empty: u64,
}

impl BlockStats {
    fn record(&mut self, len: usize) {
        self.count += 1;
        self.payload_bytes += len as u64;
        self.min_len = Some(self.min_len.map_or(len, |m| m.min(len)));
        self.max_len = self.max_len.max(len);
        if len == 0 {
            self.empty += 1;
        }
    }
}

fn run_inspect(file: PathBuf, show_blocks: bool) -> anyhow::Result<()> {
    let f = File::open(&file).with_context(|| format!("opening {:?}", file))?;
    let file_size = f.metadata()?.len();
    let mut reader = ContainerReader::new(BufReader::new(f));
    let header = reader
        .validate()
        .with_context(|| format!("reading header of {:?}", file))?;

    println!("=== SILK v3 File: {:?} ===", file);
    println!();
    println!(
        "  marker byte    : {}",
        if header.has_marker { "0x02 (discarded)" } else { "none" }
    );
    println!("  header bytes   : {}", header.byte_len());

    if show_blocks {
        println!();
        println!(
            "  {:>8}  {:>12}  {:>8}  {:>16}",
            "block", "offset", "bytes", "xxh3"
        );
        println!("  {}", "-".repeat(50));
    }

    let mut stats = BlockStats::default();
    while let Some(block) = reader.next_block()? {
        stats.record(block.payload.len());
        if show_blocks {
            println!(
                "  {:>8}  {:>12}  {:>8}  {:016x}",
                block.index,
                block.offset,
                block.payload.len(),
                xxh3_64(block.payload)
            );
        }
    }

    let footer = reader.footer_reached();
    let consumed = reader.position();
    let trailing = file_size.saturating_sub(consumed);

    if show_blocks {
        println!();
    }
    println!("  block count    : {}", stats.count);
    println!("  empty blocks   : {}", stats.empty);
    println!("  payload        : {}", human_bytes(stats.payload_bytes));
    println!(
        "  block size     : min {} / max {}",
        stats.min_len.unwrap_or(0),
        stats.max_len
    );
    println!("  footer         : {}", if footer { "yes" } else { "no" });
    println!("  trailing bytes : {}", trailing);
    println!("  file on disk   : {}", human_bytes(file_size));
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);
    match cli.command {
        Commands::Convert {
            input,
            output,
            decoder,
            channels,
        } => run_convert(input, output, decoder, channels),
        Commands::Decode {
            input,
            output,
            decoder,
        } => run_decode(input, output, decoder),
        Commands::Inspect { file, blocks } => run_inspect(file, blocks),
    }
}

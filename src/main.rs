use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use session_summary::{summarize_file, Channel, OutputSchema, PipelineOptions, SchemaPreset, Stat};

#[derive(Parser, Debug)]
#[command(name = "session-summary")]
#[command(about = "Summarize per-file sessions in a time-ordered sensor record CSV", long_about = None)]
struct Args {
    /// Input CSV: timestamp,sport,filename,latitude,longitude,elevation,cadence,heartrate,power
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output CSV, one row per session
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Column layout of the output rows
    #[arg(long, value_enum, default_value = "full")]
    schema: SchemaPreset,

    /// JSON layout file: {"columns": [{"channel": "power", "stats": ["mean", "max"]}]}
    #[arg(long, value_name = "PATH", conflicts_with_all = ["schema", "channels", "stats"])]
    schema_file: Option<PathBuf>,

    /// Channels to summarize (overrides the preset's channels)
    #[arg(long, value_enum, value_delimiter = ',')]
    channels: Vec<Channel>,

    /// Statistics written per channel (overrides the preset's statistics)
    #[arg(long, value_enum, value_delimiter = ',')]
    stats: Vec<Stat>,

    /// Skip the first input row
    #[arg(long)]
    input_has_headers: bool,

    /// Write a header row to the output
    #[arg(long)]
    write_header: bool,
}

impl Args {
    fn output_schema(&self) -> session_summary::Result<OutputSchema> {
        if let Some(path) = &self.schema_file {
            return OutputSchema::load(path);
        }

        let preset = OutputSchema::from_preset(self.schema);
        if self.channels.is_empty() && self.stats.is_empty() {
            return Ok(preset);
        }

        let channels: Vec<Channel> = if self.channels.is_empty() {
            preset.channels().collect()
        } else {
            self.channels.clone()
        };
        let stats: Vec<Stat> = if self.stats.is_empty() {
            Stat::ALL.to_vec()
        } else {
            self.stats.clone()
        };
        Ok(OutputSchema::uniform(&channels, &stats))
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let options = PipelineOptions {
        schema: args.output_schema()?,
        input_has_headers: args.input_has_headers,
        write_header: args.write_header,
    };

    println!("🔄 Summarizing: {}", args.input.display());
    let start_time = Instant::now();

    let stats = summarize_file(&args.input, &args.output, &options)?;

    println!(
        "✅ {} records → {} session rows in {:.2} seconds",
        stats.records_read,
        stats.groups_emitted,
        start_time.elapsed().as_secs_f64()
    );
    if stats.bad_timestamps > 0 {
        println!("⚠️  {} records had unparseable timestamps", stats.bad_timestamps);
    }
    println!("📄 Summary CSV saved to: {}", args.output.display());

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error summarizing {}: {}", args.input.display(), e);
            ExitCode::FAILURE
        }
    }
}

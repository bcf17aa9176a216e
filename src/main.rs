//! intralism-mania - converts osu!mania charts into Intralism levels and back.

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use intralism_mania::{ConversionReport, Converter, ConverterConfig};

#[derive(Parser)]
#[command(name = "intralism-mania")]
#[command(about = "Convert between osu!mania charts and Intralism levels")]
#[command(version)]
struct Cli {
    /// ffmpeg executable used to convert audio
    #[arg(long, global = true, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a .osu chart into an Intralism level directory
    ToIntralism {
        /// Source .osu file, next to its audio and images
        chart: PathBuf,

        /// Directory to write config.txt, music and images into
        out_dir: PathBuf,

        /// Approach speed of the level
        #[arg(long)]
        speed: Option<f64>,
    },

    /// Convert an Intralism config.txt into a .osu chart directory
    ToMania {
        /// Source config.txt, next to its audio and images
        config: PathBuf,

        /// Directory to write the chart, audio and images into
        out_dir: PathBuf,

        /// Milliseconds added to every note
        #[arg(long, allow_negative_numbers = true)]
        offset: Option<i32>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let converter = Converter::new(&ConverterConfig {
        ffmpeg_path: cli.ffmpeg,
        ..ConverterConfig::default()
    });
    let (out_dir, result) = match cli.command {
        Commands::ToIntralism {
            chart,
            out_dir,
            speed,
        } => {
            let result = create_dir(&out_dir)
                .and_then(|()| Ok(converter.mania_to_intralism(&chart, &out_dir, speed)?));
            (out_dir, result)
        }
        Commands::ToMania {
            config,
            out_dir,
            offset,
        } => {
            let result = create_dir(&out_dir)
                .and_then(|()| Ok(converter.intralism_to_mania(&config, &out_dir, offset)?));
            (out_dir, result)
        }
    };

    match result {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("conversion into {} failed: {err}", out_dir.display());
            ExitCode::FAILURE
        }
    }
}

fn create_dir(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)
        .map_err(|err| format!("cannot create {}: {err}", dir.display()).into())
}

fn print_report(report: &ConversionReport) {
    println!("{}", report.output.display());
    println!("{}", report.audio.display());
    for image in &report.images {
        println!("{}", image.display());
    }
    if !report.warnings.is_empty() {
        println!("{} warning(s)", report.warnings.len());
    }
}

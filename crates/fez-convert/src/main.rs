use clap::Parser;
use fez_convert::{ConversionSummary, ConvertConfig};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "fez-convert")]
#[command(about = "Convert FEZ XML scene documents to OBJ/MTL", long_about = None)]
#[command(version)]
struct Cli {
    /// Input XML document (ArtObject, TrileSet, Level or AnimatedTexturePC)
    input: PathBuf,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Content root holding "trile sets", "art objects" and
    /// "background planes" (defaults to the input's grandparent)
    #[arg(long)]
    content_root: Option<PathBuf>,

    /// Suppress progress output (only show errors)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log every fragment and staged file
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        let level = if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .init();
    }

    let mut config = ConvertConfig::new(cli.input);
    if let Some(output) = cli.output {
        config = config.with_output_dir(output);
    }
    if let Some(root) = cli.content_root {
        config = config.with_content_root(root);
    }

    match fez_convert::convert(&config) {
        Ok(summary) => {
            if !cli.quiet {
                report(&summary);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn report(summary: &ConversionSummary) {
    match summary {
        ConversionSummary::Mesh(m) => eprintln!(
            "Success: {} ({} objects, {} vertices, {} faces, {} materials)",
            m.obj_path.display(),
            m.fragments,
            m.vertices,
            m.faces,
            m.materials
        ),
        ConversionSummary::Sprites { frames_dir, frames } => {
            eprintln!("Success: {} frames -> {}", frames, frames_dir.display())
        }
        ConversionSummary::Unrecognized { root } => {
            eprintln!("Nothing converted: unknown document <{}>", root)
        }
    }
}

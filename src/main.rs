use clap::{Parser, Subcommand};
use imgconv::collection::FileCollection;
use imgconv::imaging::RustBackend;
use imgconv::{config, convert, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imgconv")]
#[command(about = "Batch image conversion driven by glob-selected passes")]
#[command(long_about = "\
Batch image conversion driven by glob-selected passes

Every file under the source directory is loaded into memory. Each [[pass]]
in the config selects files by glob and converts them; all passes run
concurrently. Outputs of one pass are never re-converted by another pass of
the same run. The resulting file set is written to the output directory.

Output names come from a template:
  %b  basename      %e  extension
  %x  width         %y  height

Run 'imgconv gen-config' to print a documented convert.toml.")]
#[command(version)]
struct Cli {
    /// Conversion config
    #[arg(long, default_value = "convert.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a directory and write the result to another directory
    Convert {
        /// Directory to read files from
        #[arg(long, default_value = "src")]
        source: PathBuf,

        /// Directory to write the converted file set to
        #[arg(long, default_value = "build")]
        output: PathBuf,
    },
    /// Validate the config without converting anything
    Check,
    /// Print a stock convert.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Convert {
            source,
            output: out_dir,
        } => {
            let conf = config::load_config(&cli.config)?;
            conf.validate()?;
            init_thread_pool(&conf.processing);

            let files = FileCollection::from_dir(&source)?;
            log::info!("Loaded {} files from {}", files.len(), source.display());

            let report = convert::convert_with_report(&RustBackend::new(), conf.passes, &files)?;
            let written = files.write_to_dir(&out_dir)?;
            output::print_convert_output(&report, written);
        }
        Command::Check => {
            let conf = config::load_config(&cli.config)?;
            conf.validate()?;
            output::print_check_output(&conf);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

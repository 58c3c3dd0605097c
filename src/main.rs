use blog_log::{fields, Command, Conventions};
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

/// A small web service scaffold.
#[derive(Debug, Parser)]
#[command(name = "blog", version, about, long_about = None)]
struct Cli {
    /// The path to the configuration file. When omitted, `~/.blog/blog.yaml` and `./blog.yaml` are
    /// tried in that order.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    Command::new(Conventions::BLOG)
        .with_config_file(cli.config)
        .run(|settings| -> Result<(), Box<dyn Error>> {
            let resolved = serde_json::to_string(&settings.all_settings())?;
            blog_log::info("resolved settings", fields!["settings" => resolved]);
            log::debug!("log crate records go through the same logger");

            Ok(())
        })
}

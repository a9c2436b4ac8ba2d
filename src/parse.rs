use crate::sheets::DEFAULT_API_BASE;
use clap::Parser;

#[derive(Parser)]
#[command(name = "fotointeracciones")]
#[command(about = "Digitize photographic observations of ecological interactions into a shared spreadsheet")]
#[command(version = "0.1")]
pub(crate) struct Args {
    /// Key of the destination spreadsheet
    #[arg(short = 'k', long, env = "FOTO_SHEET_KEY")]
    pub sheet_key: String,

    /// OAuth bearer token for the spreadsheet service
    #[arg(short, long, env = "FOTO_SHEETS_TOKEN", hide_env_values = true)]
    pub token: String,

    /// CSV file with reference lists (plantas, aves, insectos, observadores, sitios)
    #[arg(short, long, env = "FOTO_REFERENCES")]
    pub references: Option<String>,

    /// Base URL of the spreadsheet API
    #[arg(long, env = "FOTO_SHEETS_API", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Request timeout in seconds when saving a row
    #[arg(long, env = "FOTO_TIMEOUT_SECS", default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

mod error;
mod form;
mod parse;
mod record;
mod reference;
mod session;
mod sheets;
mod validate;

use crate::form::Form;
use crate::parse::Args;
use crate::reference::ReferenceLists;
use crate::session::FormSession;
use crate::sheets::SheetsClient;
use clap::Parser;
use log::info;
use std::io;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::try_parse()?;
    // Initialize logger
    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let lists = match &args.references {
        Some(path) => ReferenceLists::from_path(path)?,
        None => ReferenceLists::builtin(),
    };

    let sheet = SheetsClient::new(&args.sheet_key, &args.token)?
        .with_api_base(&args.api_base)?
        .with_timeout(args.timeout)?;

    let mut session = FormSession::new(lists);
    let stdin = io::stdin();
    let mut form = Form::new(stdin.lock(), io::stdout());
    let saved = form.run(&mut session, &sheet).await?;

    info!("Saved {} observation(s)", saved);
    println!("\n{} observación(es) guardada(s).", saved);
    Ok(())
}

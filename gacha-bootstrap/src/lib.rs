pub mod cli;
pub mod context;
pub mod lifecycle;

pub use cli::{Args, Command};

use context::AppContext;

pub async fn run(args: Args) -> anyhow::Result<()> {
    if let Some(config) = &args.config {
        std::env::set_var("GACHA_LEDGER_CONFIG", config);
    }
    let context = AppContext::new().await?;
    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => lifecycle::serve(context.state).await,
        command => cli::execute(&context.state, command).await,
    }
}

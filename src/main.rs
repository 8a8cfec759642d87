use detter::commands::Cli;
use detter::libs::error::AppError;
use detter::libs::messages::macros::is_debug_mode;
use detter::{msg_debug, msg_error};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    if is_debug_mode() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("detter=debug")))
            .with_target(false)
            .init();
    }

    match Cli::menu().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Storage internals stay in the debug log; the user gets the short form.
            match e.downcast_ref::<AppError>() {
                Some(app_error) => {
                    msg_debug!(format!("{:#}", e));
                    msg_error!(app_error.user_message());
                }
                None => eprintln!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

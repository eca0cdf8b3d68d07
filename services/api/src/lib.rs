mod cli;
mod diagnose;
mod infra;
mod routes;
mod rulebook;
mod server;

use visa_pathway::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

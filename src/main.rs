use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use yatube::config::{Cli, Command, Config};
use yatube::db;
use yatube::routes;
use yatube::state::{AppState, DbPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(pool, config).await,
        Command::CreateGroup {
            title,
            slug,
            description,
        } => create_group(&pool, &title, &slug, &description),
    }
}

async fn serve(pool: DbPool, config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = routes::app(AppState { db: pool, config });

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_group(pool: &DbPool, title: &str, slug: &str, description: &str) -> anyhow::Result<()> {
    if title.trim().is_empty() {
        anyhow::bail!("Group title must not be empty");
    }
    if !db::groups::is_valid_slug(slug) {
        anyhow::bail!("Invalid slug {:?}: use letters, digits, '-' and '_'", slug);
    }

    let conn = pool.get()?;
    if db::groups::find_by_slug(&conn, slug)?.is_some() {
        anyhow::bail!("A group with slug {:?} already exists", slug);
    }
    let id = db::groups::insert(&conn, title.trim(), slug, description.trim())
        .context("Failed to create group")?;

    tracing::info!("Created group {} ({}) with id {}", title.trim(), slug, id);
    println!("/group/{}/", slug);
    Ok(())
}

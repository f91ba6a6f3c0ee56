use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use tfc_migrate::cli::Cli;
use tfc_migrate::{GcsClient, MigrationConfig, Migrator, load_manifest, output, workspaces};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = MigrationConfig::from_cli(Cli::parse())?;
    tracing::debug!(?config, "configuration resolved");

    let targets = load_manifest(&config.manifest_path)?;
    tracing::info!(
        manifest = %config.manifest_path.display(),
        count = targets.len(),
        "manifest loaded"
    );

    let store = GcsClient::with_base_url(
        config.storage.token.clone(),
        config.storage.base_url.clone(),
    )?;
    let migrator = Migrator::new(
        &store,
        &config.storage.bucket,
        &config.statefiles_dir,
        config.existing,
    );

    let Some(tfe) = &config.tfe else {
        let plan = migrator.plan(&targets).await?;
        println!("{}", output::render_plan(&plan));

        let missing = plan.iter().filter(|entry| !entry.blob_exists).count();
        if missing > 0 {
            return Err(eyre!(
                "{} of {} blobs are missing from the bucket",
                missing,
                plan.len()
            ));
        }
        return Ok(());
    };

    let api = workspaces::connect(tfe)?;
    let report = migrator.run(api.as_ref(), targets).await?;
    println!("{}", output::render_report(&report));

    let outcomes = report.into_result()?;
    tracing::info!(count = outcomes.len(), "migration complete");

    Ok(())
}

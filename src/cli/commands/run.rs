//! Pipeline run command handler

use crate::config::Config;
use crate::db::Store;
use crate::services::{Collaborators, Pipeline, PipelineOptions};
use tracing::info;

pub async fn cmd_run(config: Config, options: PipelineOptions) -> anyhow::Result<()> {
    info!(?options, "Starting pipeline run");

    let cache = Store::new(&config.database_url()).await;
    let collaborators = Collaborators::from_config(&config);
    let pipeline = Pipeline::new(config, options, collaborators, cache);

    let summary = pipeline.run().await?;

    println!();
    println!("Catalog written: {}", summary.catalog_path.display());
    println!("{:-<60}", "");
    println!("  Movies:              {}", summary.total_movies);
    println!("  OMDB calls:          {}", summary.omdb_calls_made);
    println!("  Streaming calls:     {}", summary.streaming_calls_made);
    println!("  Recorded errors:     {}", summary.error_count);

    Ok(())
}

use anyhow::Result;
use std::sync::Arc;

use harvest::{config::Config, pipeline::Pipeline, scheduler::Scheduler, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    telemetry::init(config.log_format);

    let every = config.schedule_interval;
    let retries = config.schedule_retries;
    let pipeline = Pipeline::from_config(config)?;

    Scheduler::new(Arc::new(pipeline), every, retries).run().await;
    Ok(())
}

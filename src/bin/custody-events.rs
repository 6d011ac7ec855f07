//! Service entrypoint: wires configuration, the poll scheduler, and the
//! raw-event listener, then runs both until the process stops.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use custody_events::assembler::DomainEventAssembler;
use custody_events::clients::{HttpPrisonApiClient, HttpProbationApiClient};
use custody_events::config::ConfigManager;
use custody_events::logging::init_structured_logging;
use custody_events::messaging::{
    DomainEventPublisher, PgmqTopicPublisher, PrisonEventsListener, RawEventProcessor,
    RawEventPublisher,
};
use custody_events::poller::{PgAdvisoryLock, PgCursorStore, PollScheduler, WatermarkPollEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let manager = ConfigManager::load().context("loading configuration")?;
    let config = manager.config().clone();

    let pool = PgPoolOptions::new()
        .max_connections(config.database.pool)
        .connect(&config.database.url)
        .await
        .context("connecting to database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("running migrations")?;

    let prison_api = Arc::new(HttpPrisonApiClient::new(&config.prison_api)?);
    let probation_api = Arc::new(HttpProbationApiClient::new(&config.probation_api)?);

    let raw_topic = Arc::new(
        PgmqTopicPublisher::new(&config.database.url, &config.queues.raw_events_topic).await?,
    );
    let domain_topic = Arc::new(
        PgmqTopicPublisher::new(&config.database.url, &config.queues.domain_events_topic).await?,
    );

    let engine = Arc::new(WatermarkPollEngine::new(
        prison_api.clone(),
        Arc::new(PgCursorStore::new(pool.clone())),
        RawEventPublisher::new(raw_topic),
        config.poller.clone(),
    ));
    let scheduler = PollScheduler::new(
        engine,
        Arc::new(PgAdvisoryLock::new(pool)),
        format!("{}-poll", config.poller.poll_name),
        Duration::from_secs(config.poller.lock_lease_seconds),
        Duration::from_secs(config.poller.interval_seconds),
    );

    let assembler = DomainEventAssembler::new(
        prison_api,
        probation_api,
        config.case_notes.base_url.clone(),
    );
    let listener = PrisonEventsListener::new(
        &config.database.url,
        config.queues.clone(),
        RawEventProcessor::new(assembler, DomainEventPublisher::new(domain_topic)),
    )
    .await?;

    info!(
        environment = %manager.environment(),
        poll_name = %config.poller.poll_name,
        "🚀 Custody events pipeline starting"
    );

    tokio::select! {
        _ = scheduler.run() => {}
        _ = listener.run() => {}
    }
    Ok(())
}

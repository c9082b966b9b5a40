use outdial::application::{Dispatcher, DispatcherSettings, RetryScheduler, SchedulerSettings};
use outdial::config::Config;
use outdial::domain::call_record::CallRecordRepository;
use outdial::domain::campaign::CampaignRepository;
use outdial::domain::entitlement::StaticEntitlements;
use outdial::infrastructure::telephony::RpcTelephonyGateway;
use outdial::interface::api::{build_router, init_metrics, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};

#[cfg(feature = "postgres")]
use outdial::infrastructure::persistence::{
    create_pool, run_migrations, DatabaseConfig, PgCallRecordRepository, PgCampaignRepository,
};
#[cfg(not(feature = "postgres"))]
use outdial::infrastructure::persistence::memory::{
    InMemoryCallRecordRepository, InMemoryCampaignRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting Outdial campaign engine");

    let config = Config::load()?;

    // Stores
    #[cfg(feature = "postgres")]
    let (campaigns, call_records): (Arc<dyn CampaignRepository>, Arc<dyn CallRecordRepository>) = {
        let db_config = DatabaseConfig {
            url: config.database.url.clone(),
            ..Default::default()
        };
        let pool = create_pool(&db_config).await?;
        run_migrations(&pool).await?;
        (
            Arc::new(PgCampaignRepository::new(pool.clone())),
            Arc::new(PgCallRecordRepository::new(pool)),
        )
    };

    #[cfg(not(feature = "postgres"))]
    let (campaigns, call_records): (Arc<dyn CampaignRepository>, Arc<dyn CallRecordRepository>) = {
        info!("Postgres disabled; using in-memory stores");
        (
            Arc::new(InMemoryCampaignRepository::new()),
            Arc::new(InMemoryCallRecordRepository::new()),
        )
    };

    // Telephony gateway. Give the HTTP client some headroom over the
    // dispatcher's own per-call bound.
    let call_timeout = Duration::from_secs(config.telephony.call_timeout_secs);
    let gateway = Arc::new(RpcTelephonyGateway::connect(
        &config.telephony.endpoint,
        call_timeout + Duration::from_secs(10),
    )?);
    info!("Telephony gateway endpoint: {}", config.telephony.endpoint);

    // Entitlement gate. Billing runs outside this service; deployments swap
    // in their own adapter here.
    let entitlements = Arc::new(StaticEntitlements::allow_all());

    let dispatcher = Arc::new(Dispatcher::new(
        campaigns.clone(),
        call_records.clone(),
        gateway,
        entitlements,
        DispatcherSettings { call_timeout },
    ));

    let scheduler = Arc::new(RetryScheduler::new(
        dispatcher.clone(),
        call_records,
        campaigns.clone(),
        SchedulerSettings {
            concurrency: config.scheduler.concurrency,
            batch_limit: config.scheduler.batch_limit,
        },
    ));

    // In-process retry cadence. External crons can drive POST /scheduler/run
    // instead; both paths share the same eligibility gating.
    if config.scheduler.enabled {
        let scheduler = scheduler.clone();
        let period = Duration::from_secs(config.scheduler.interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match scheduler.run_once().await {
                    Ok(report) => {
                        if report.retried > 0 {
                            info!(
                                eligible = report.eligible,
                                retried = report.retried,
                                "Scheduled retry pass complete"
                            );
                        }
                    }
                    Err(e) => error!(error = %e, "Scheduled retry pass failed"),
                }
            }
        });
        info!(
            interval_secs = config.scheduler.interval_secs,
            "Retry scheduler task started"
        );
    }

    // REST API server
    info!("Initializing Prometheus metrics exporter");
    let prometheus_handle = init_metrics();

    let state = AppState {
        dispatcher,
        scheduler,
        campaigns,
    };
    let app = build_router(state, Some(prometheus_handle));

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;
    info!(
        "API server listening on {}:{}",
        config.server.host, config.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down...");
        })
        .await?;

    Ok(())
}

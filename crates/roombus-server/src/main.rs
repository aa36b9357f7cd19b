//! # roombus-server
//!
//! Main binary: wires the SFU Orchestrator, Mix Coordinator, Egress/Ingest
//! Supervisors and the Room Session Bus together into one process (§2
//! "every module above runs in the same process").
//!
//! Two listeners run concurrently: the bus WebSocket (`/call-center`) and a
//! minimal health façade exposing each module's `stats()`.

use std::net::SocketAddr;
use std::sync::Arc;

use roombus_bus::{bridges, build_router, BusState};
use roombus_db::Database;
use roombus_egress::supervisor::EncoderSupervisor;
use roombus_ingest::supervisor::IngestSupervisor;
use roombus_ingest::whip::WhipSupervisor;
use roombus_mixer::MixCoordinator;
use roombus_sfu::SfuOrchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = roombus_common::config::init()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roombus=debug,tower_http=debug".into()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!("starting roombus-server v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::connect(config).await?;
    db.migrate().await?;

    let bind_ip: std::net::IpAddr = config.server.host.parse()?;
    let sfu = Arc::new(SfuOrchestrator::new(config.sfu.clone(), bind_ip));
    let mixer = Arc::new(MixCoordinator::new(config.mixer.failover_timeout_secs));

    // === Egress Supervisor (§4.4) ===
    let (egress_supervisor, egress_events_rx) = EncoderSupervisor::new(sfu.clone(), db.clone(), config.egress.clone());
    let egress_supervisor = Arc::new(egress_supervisor);

    // === Ingest Supervisor (§4.5) ===
    let (ingest_supervisor, ingest_events_rx) = IngestSupervisor::new(sfu.clone(), db.clone(), config.ingest.clone());
    let ingest_supervisor = Arc::new(ingest_supervisor);

    // WHIP sessions share the same `IngestEvent` type as SRT/RIST sources
    // but carry their own sender, since a WHIP session never goes through
    // `IngestSupervisor::start_source`'s child-process lifecycle.
    let (whip_events_tx, whip_events_rx) = tokio::sync::mpsc::unbounded_channel();
    let whip_supervisor = Arc::new(WhipSupervisor::new(sfu.clone(), db.clone(), whip_events_tx));

    let bus_state = BusState::new(db.clone(), config, sfu.clone(), mixer.clone());

    bridges::spawn_egress_bridge(bus_state.hub.clone(), egress_events_rx);
    bridges::spawn_ingest_bridge(bus_state.hub.clone(), ingest_events_rx);
    bridges::spawn_ingest_bridge(bus_state.hub.clone(), whip_events_rx);

    let bus_router = build_router(bus_state);
    let bus_addr = SocketAddr::new(bind_ip, config.server.bus_port);

    let health_router = health::build_router(health::HealthState {
        sfu,
        mixer,
        egress: egress_supervisor,
        ingest: ingest_supervisor,
        whip: whip_supervisor,
    });
    let health_addr = SocketAddr::new(bind_ip, config.server.health_port);

    tracing::info!("room session bus listening on ws://{bus_addr}/call-center");
    tracing::info!("health facade listening on http://{health_addr}/healthz");

    tokio::try_join!(
        async {
            let listener = tokio::net::TcpListener::bind(bus_addr).await?;
            axum::serve(listener, bus_router).await?;
            Ok::<_, anyhow::Error>(())
        },
        async {
            let listener = tokio::net::TcpListener::bind(health_addr).await?;
            axum::serve(listener, health_router).await?;
            Ok::<_, anyhow::Error>(())
        },
    )?;

    Ok(())
}

/// Minimal health façade (§1 Non-goals exclude a management API, but every
/// long-running supervisor in this repo carries a `stats()` for exactly
/// this purpose).
mod health {
    use std::sync::Arc;

    use axum::extract::State;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use roombus_egress::supervisor::EncoderSupervisor;
    use roombus_ingest::supervisor::IngestSupervisor;
    use roombus_ingest::whip::WhipSupervisor;
    use roombus_mixer::MixCoordinator;
    use roombus_sfu::SfuOrchestrator;

    #[derive(Clone)]
    pub struct HealthState {
        pub sfu: Arc<SfuOrchestrator>,
        pub mixer: Arc<MixCoordinator>,
        pub egress: Arc<EncoderSupervisor>,
        pub ingest: Arc<IngestSupervisor>,
        #[allow(dead_code)]
        pub whip: Arc<WhipSupervisor>,
    }

    pub fn build_router(state: HealthState) -> Router {
        Router::new().route("/healthz", get(healthz)).with_state(state)
    }

    async fn healthz(State(state): State<HealthState>) -> Json<serde_json::Value> {
        Json(json!({
            "status": "ok",
            "sfu": state.sfu.stats().await,
            "mixer": state.mixer.stats().await,
            "egress": state.egress.stats().await,
            "ingest": state.ingest.stats().await,
        }))
    }
}

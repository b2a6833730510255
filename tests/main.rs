//! End-to-end scenarios from spec §8, wired against real TCP servers rather
//! than mocked collaborators — the same shape as the teacher's top-level
//! `tests` crate, which drives its HotShot nodes over real HTTP instead of
//! in-process stubs.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use loan_actors::{EventActor, LoanActor};
use loan_config::{TOPIC_DEVOLUCION, TOPIC_RENOVACION};
use loan_gateway::Gateway;
use loan_net::envelope::{OP_DEVOLUCION, OP_PRESTAMO, OP_RENOVACION};
use loan_net::reqrep::serve_reqrep;
use loan_net::topic::Publisher;
use loan_net::{Envelope, Payload, ReqClient, Reply};
use loan_storage::catchup::spawn_peer_catchup;
use loan_storage::heartbeat_emitter::spawn_heartbeat_emitter;
use loan_storage::{persistence, spawn_engine, EngineHandle, LivenessMonitor};

fn addr(port: u16) -> SocketAddr {
    format!("127.0.0.1:{port}").parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn payload(book: &str, user: &str, as_of: &str) -> Payload {
    Payload {
        book_code: book.to_string(),
        user_id: user.to_string(),
        as_of_date: date(as_of),
    }
}

/// Start a bare Storage Engine: the actor, heartbeat emission, the peer
/// catch-up watcher, and its two request/reply endpoints. Returns the
/// engine handle for direct, network-free assertions.
async fn start_storage_engine(
    site: u8,
    data_dir: &std::path::Path,
    reqrep_addr: SocketAddr,
    heartbeat_addr: SocketAddr,
    sync_addr: SocketAddr,
    peer_heartbeat_addr: SocketAddr,
    peer_sync_addr: SocketAddr,
) -> EngineHandle {
    let primary = data_dir.join(format!("primary-{site}.json"));
    let backup = data_dir.join(format!("backup-{site}.json"));
    let (catalog, _source) = persistence::recover(&primary, &backup).await;
    let engine = spawn_engine(catalog, primary, backup);

    let publisher = Publisher::bind(heartbeat_addr, true).await.unwrap();
    spawn_heartbeat_emitter(publisher, engine.clone(), site, Duration::from_millis(150));
    spawn_peer_catchup(
        engine.clone(),
        peer_heartbeat_addr,
        peer_sync_addr,
        Duration::from_millis(500),
    );

    let reqrep_engine = engine.clone();
    tokio::spawn(serve_reqrep(reqrep_addr, move |envelope: Envelope| {
        let engine = reqrep_engine.clone();
        async move {
            match envelope.payload {
                Some(payload) => engine.mutate(&envelope.operation, payload).await,
                None => Reply::err("UNKNOWN_OP"),
            }
        }
    }));

    let sync_engine = engine.clone();
    tokio::spawn(serve_reqrep(sync_addr, move |envelope: Envelope| {
        let engine = sync_engine.clone();
        async move {
            if envelope.operation != loan_net::envelope::OP_SYNC_PULL {
                return Reply::err("UNKNOWN_OP");
            }
            match engine.snapshot().await {
                Some(snapshot) => Reply {
                    ok: true,
                    version: Some(snapshot.version),
                    snapshot: Some(snapshot),
                    ..Default::default()
                },
                None => Reply::err("ENGINE_UNAVAILABLE"),
            }
        }
    }));

    engine
}

/// Seed a fresh data directory with an empty-but-for-one-book catalog so
/// tests don't depend on the bootstrap seed's exact contents.
async fn seed_single_book(data_dir: &std::path::Path, site: u8, code: &str, copies: u32) {
    let mut catalog = loan_model::Catalog::empty();
    catalog
        .books
        .insert(code.into(), loan_model::Book::new(code, "Test Title", "Test Author", copies));
    let primary = data_dir.join(format!("primary-{site}.json"));
    persistence::save_snapshot(&primary, &catalog).await.unwrap();
}

struct FullSite {
    cp_lg: SocketAddr,
    engine: EngineHandle,
}

/// Start a complete site: Storage Engine, Load Gateway, Loan Actor, and both
/// Event Actors, wired together the way `storage_engine`/`load_gateway`/
/// `loan_actor`/`event_actor` wire them in their `main`s.
async fn start_full_site(
    site: u8,
    data_dir: &std::path::Path,
    ports: [u16; 6],
    peer_se_reqrep: SocketAddr,
    peer_heartbeat_addr: SocketAddr,
    peer_sync_addr: SocketAddr,
) -> FullSite {
    let [se_reqrep_port, se_heartbeat_port, se_sync_port, lg_la_port, lg_pub_port, cp_lg_port] = ports;
    let se_reqrep = addr(se_reqrep_port);
    let se_heartbeat = addr(se_heartbeat_port);
    let se_sync = addr(se_sync_port);
    let lg_la = addr(lg_la_port);
    let lg_pub = addr(lg_pub_port);
    let cp_lg = addr(cp_lg_port);

    let engine = start_storage_engine(
        site,
        data_dir,
        se_reqrep,
        se_heartbeat,
        se_sync,
        peer_heartbeat_addr,
        peer_sync_addr,
    )
    .await;

    let loan_actor = Arc::new(LoanActor::new(se_reqrep, peer_se_reqrep, Duration::from_secs(3)));
    tokio::spawn(serve_reqrep(lg_la, move |envelope| {
        let loan_actor = loan_actor.clone();
        async move { loan_actor.handle(envelope).await }
    }));

    let lg_publisher = Publisher::bind(lg_pub, false).await.unwrap();
    let liveness = LivenessMonitor::spawn(se_heartbeat, Duration::from_millis(500));
    let gateway = Arc::new(Gateway::new(site, lg_la, lg_publisher, liveness, Duration::from_secs(3)));
    tokio::spawn(serve_reqrep(cp_lg, move |envelope| {
        let gateway = gateway.clone();
        async move { gateway.handle(envelope).await }
    }));

    let devolucion_actor = EventActor::new(TOPIC_DEVOLUCION, OP_DEVOLUCION);
    let se_reqrep_for_devolucion = se_reqrep;
    tokio::spawn(async move {
        devolucion_actor
            .run(lg_pub, se_reqrep_for_devolucion, Duration::from_secs(3), Duration::from_millis(100))
            .await
    });

    let renovacion_actor = EventActor::new(TOPIC_RENOVACION, OP_RENOVACION);
    tokio::spawn(async move {
        renovacion_actor
            .run(lg_pub, se_reqrep, Duration::from_secs(3), Duration::from_millis(100))
            .await
    });

    // Give the liveness monitor a moment to observe the first heartbeat so
    // the first PRESTAMO in each test doesn't race a still-pessimistic
    // `useBackup` hint.
    tokio::time::sleep(Duration::from_millis(400)).await;

    FullSite { cp_lg, engine }
}

#[tokio::test]
async fn happy_loan_double_loan_and_renewal_limit() {
    let dir = tempfile::tempdir().unwrap();
    seed_single_book(dir.path(), 1, "L0001", 2).await;

    // Point the peer endpoints at addresses nothing listens on; this
    // single-site test never needs a working peer.
    let dead_peer = addr(19199);
    let site = start_full_site(1, dir.path(), [19101, 19102, 19103, 19104, 19105, 19106], dead_peer, dead_peer, dead_peer).await;

    let mut cp = ReqClient::new(site.cp_lg);

    let reply = cp
        .call(
            &Envelope::domain(OP_PRESTAMO, payload("L0001", "U0001", "2025-11-20")),
            Duration::from_secs(3),
        )
        .await
        .unwrap();
    assert!(reply.ok);
    assert_eq!(reply.due_date, Some(date("2025-12-04")));

    let reply = cp
        .call(
            &Envelope::domain(OP_PRESTAMO, payload("L0001", "U0001", "2025-11-21")),
            Duration::from_secs(3),
        )
        .await
        .unwrap();
    assert!(!reply.ok);
    assert_eq!(reply.reason.as_deref(), Some("YA_TIENE_PRESTAMO"));

    for (n, expected_ok) in [(1, true), (2, true), (3, false)] {
        let reply = cp
            .call(
                &Envelope::domain(OP_RENOVACION, payload("L0001", "U0001", "2025-12-01")),
                Duration::from_secs(3),
            )
            .await
            .unwrap();
        assert_eq!(reply.ok, expected_ok, "renewal #{n}");
    }
    let final_reply = cp
        .call(
            &Envelope::domain(OP_RENOVACION, payload("L0001", "U0001", "2025-12-01")),
            Duration::from_secs(3),
        )
        .await
        .unwrap();
    assert_eq!(final_reply.reason.as_deref(), Some("MAX_RENOVACIONES"));
}

#[tokio::test]
async fn async_return_acks_immediately_and_applies_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    seed_single_book(dir.path(), 1, "L0002", 3).await;

    let dead_peer = addr(19299);
    let site = start_full_site(1, dir.path(), [19201, 19202, 19203, 19204, 19205, 19206], dead_peer, dead_peer, dead_peer).await;

    let mut cp = ReqClient::new(site.cp_lg);
    cp.call(
        &Envelope::domain(OP_PRESTAMO, payload("L0002", "U0001", "2025-11-20")),
        Duration::from_secs(3),
    )
    .await
    .unwrap();

    let started = tokio::time::Instant::now();
    let reply = cp
        .call(
            &Envelope::domain(OP_DEVOLUCION, payload("L0002", "U0001", "2025-11-22")),
            Duration::from_secs(3),
        )
        .await
        .unwrap();
    assert!(reply.ok);
    assert_eq!(reply.r#type.as_deref(), Some("devolucion"));
    assert!(started.elapsed() < Duration::from_millis(200));

    // The Event Actor applies it asynchronously; poll until it lands.
    let mut applied = false;
    for _ in 0..50 {
        if let Some(snapshot) = site.engine.snapshot().await {
            let book = snapshot.libros.iter().find(|b| b.codigo == "L0002").unwrap();
            if book.ejemplares_disponibles == 3 && book.prestamos.is_empty() {
                applied = true;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(applied, "event actor never applied the DEVOLUCION");
}

#[tokio::test]
async fn loan_actor_fails_over_to_peer_when_local_is_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    seed_single_book(dir.path(), 2, "L0003", 1).await;

    let dead_peer = addr(19399);
    let peer_reqrep = addr(19301);
    start_storage_engine(
        2,
        dir.path(),
        peer_reqrep,
        addr(19302),
        addr(19303),
        dead_peer,
        dead_peer,
    )
    .await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let unreachable_local = addr(19304); // nothing listens here
    let loan_actor = LoanActor::new(unreachable_local, peer_reqrep, Duration::from_secs(2));

    let reply = loan_actor
        .handle(Envelope::loan(payload("L0003", "U0001", "2025-11-20"), false))
        .await;
    assert!(reply.ok, "expected failover to the peer to succeed: {reply:?}");
    assert_eq!(reply.due_date, Some(date("2025-12-04")));
}

#[tokio::test]
async fn peer_catchup_converges_when_one_site_is_ahead() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    let a_reqrep = addr(19401);
    let a_heartbeat = addr(19402);
    let a_sync = addr(19403);
    let b_reqrep = addr(19404);
    let b_heartbeat = addr(19405);
    let b_sync = addr(19406);

    seed_single_book(dir_a.path(), 1, "L0004", 2).await;
    seed_single_book(dir_b.path(), 2, "L0004", 2).await;

    let engine_a = start_storage_engine(1, dir_a.path(), a_reqrep, a_heartbeat, a_sync, b_heartbeat, b_sync).await;
    let engine_b = start_storage_engine(2, dir_b.path(), b_reqrep, b_heartbeat, b_sync, a_heartbeat, a_sync).await;

    // Mutate B directly so its version runs ahead of A's, simulating a
    // PRESTAMO that only reached site B (e.g. while A was unreachable).
    let reply = engine_b
        .mutate(OP_PRESTAMO, payload("L0004", "U0009", "2025-11-20"))
        .await;
    assert!(reply.ok);
    assert!(engine_b.version() > engine_a.version());

    let mut converged = false;
    for _ in 0..40 {
        if engine_a.version() == engine_b.version() {
            converged = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(converged, "site A never caught up to site B's version");

    let snapshot_a = engine_a.snapshot().await.unwrap();
    let snapshot_b = engine_b.snapshot().await.unwrap();
    assert_eq!(snapshot_a.version, snapshot_b.version);
    assert_eq!(snapshot_a.libros.len(), snapshot_b.libros.len());
}

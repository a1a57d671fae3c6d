mod utils;
use utils::*;

use anyhow::Context;
use mock_service::MAX_USER_ID;
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::time::Duration;
use swarm::prelude::*;
use user_load::{GET_USER_WEIGHT, REQUEST_NAME, USER_ID_RANGE};

fn load_test(addr: SocketAddr, users: usize, run_time: Duration) -> anyhow::Result<Swarm> {
    let mut swarm = Swarm::new()
        .host(&format!("http://{addr}"))
        .users(users)
        .spawn_rate(100.)
        .stats_interval(Duration::from_millis(250))
        .run_time(run_time);
    user_load::register::<_, Session>(&mut swarm)?;
    Ok(swarm)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(20_000)]
async fn requests_are_grouped_under_item() -> anyhow::Result<()> {
    init();
    let (addr, recorder) = mock_service::spawn().await?;

    let swarm = load_test(addr, 5, Duration::from_secs(2))?;
    assert_eq!(swarm.tasks()[0].weight(), GET_USER_WEIGHT);

    let stats = swarm.run().await?;

    assert_eq!(stats.users, 5);
    assert_eq!(stats.requests.len(), 1);
    let item = stats.get(REQUEST_NAME).context("no statistics for /item")?;
    assert!(item.num_requests > 10);
    assert_eq!(item.num_failures, 0);
    assert_eq!(item.status_codes.keys().collect::<Vec<_>>(), vec![&200]);
    assert_eq!(stats.total.num_requests, item.num_requests);

    // Users are aborted at shutdown, so a few requests may reach the server unrecorded.
    assert!(recorder.requests() >= item.num_requests);
    assert_eq!(recorder.unmatched(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(20_000)]
async fn ids_stay_in_range() -> anyhow::Result<()> {
    init();
    let (addr, recorder) = mock_service::spawn().await?;

    let stats = load_test(addr, 10, Duration::from_secs(2))?.run().await?;
    assert!(!stats.has_failures());

    let ids = recorder.ids();
    assert!(!ids.is_empty());
    assert!(ids.iter().all(|id| USER_ID_RANGE.contains(id)));
    assert!(ids.iter().all(|id| *id < MAX_USER_ID));

    let distinct: BTreeSet<_> = ids.iter().collect();
    assert!(distinct.len() > 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ntest::timeout(20_000)]
async fn json_report_is_written() -> anyhow::Result<()> {
    init();
    let (addr, _recorder) = mock_service::spawn().await?;
    let path = std::env::temp_dir().join(format!("user-load-report-{}.json", addr.port()));

    let stats = load_test(addr, 1, Duration::from_secs(1))?
        .json_report(&path)
        .run()
        .await?;

    let report: serde_json::Value = serde_json::from_slice(&std::fs::read(&path)?)?;
    std::fs::remove_file(&path)?;

    assert_eq!(report["users"], 1);
    assert_eq!(report["requests"][0]["name"], REQUEST_NAME);
    assert_eq!(
        report["total"]["num_requests"],
        serde_json::json!(stats.total.num_requests)
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ntest::timeout(20_000)]
async fn missing_users_are_failures() -> anyhow::Result<()> {
    init();
    let (addr, _recorder) = mock_service::spawn().await?;

    let mut swarm = Swarm::new()
        .host(&format!("http://{addr}/"))
        .users(1)
        .run_time(Duration::from_millis(500));
    swarm.register_task(
        Task::new("missing", 1, |session: Session| async move {
            session.get(&format!("/users/{MAX_USER_ID}"), Some(REQUEST_NAME)).await;
        })?,
    );

    let stats = swarm.run().await?;
    let item = stats.get(REQUEST_NAME).context("no statistics for /item")?;
    assert!(item.num_requests > 0);
    assert_eq!(item.num_failures, item.num_requests);
    assert_eq!(item.errors.keys().collect::<Vec<_>>(), vec!["HTTP 404"]);
    assert!(stats.to_string().contains("HTTP 404"));
    Ok(())
}

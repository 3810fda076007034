//! Probes between real nodes over UDP on the loopback interface

use std::net::SocketAddr;
use std::time::Duration;

use meshping::network::Node;
use meshping::{Config, NodeId, Outcome};

async fn start(id: u64) -> Node {
    let config = Config {
        node_id: NodeId(id),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        sweep_interval: Duration::from_millis(20),
        ..Config::default()
    };
    Node::start(config).await.unwrap()
}

#[tokio::test]
async fn ping_over_udp() {
    let a = start(1).await;
    let b = start(2).await;
    a.resolver().insert(NodeId(2), b.local_addr());

    let outcome = a.engine().ping(NodeId(2), Duration::from_secs(2)).await;
    match outcome {
        Outcome::Success { round_trip } => assert!(round_trip < Duration::from_secs(2)),
        other => panic!("expected success, got {:?}", other),
    }

    assert_eq!(a.engine().pending(), 0);
    let stats = a.engine().stats();
    assert_eq!(stats.sent, 1);
    assert_eq!(stats.received, 1);
    assert!(stats.rtt.is_some());

    // B counts the request once its reply is queued, before A sees it
    assert_eq!(b.engine().stats().requests_answered, 1);
}

#[tokio::test]
async fn ping_silent_node_times_out() {
    let a = start(1).await;
    let mut b = start(2).await;
    let silent: SocketAddr = b.local_addr();
    b.shutdown();
    drop(b);

    a.resolver().insert(NodeId(2), silent);
    let outcome = a.engine().ping(NodeId(2), Duration::from_millis(150)).await;
    assert_eq!(outcome, Outcome::Timeout);
    assert_eq!(a.engine().stats().timeouts, 1);
}

#[tokio::test]
async fn retries_stop_at_first_success() {
    let a = start(1).await;
    let b = start(2).await;
    a.resolver().insert(NodeId(2), b.local_addr());

    let outcome = a
        .engine()
        .ping_with_retries(NodeId(2), Duration::from_secs(1), 3)
        .await;
    assert!(outcome.is_success());
    assert_eq!(a.engine().stats().sent, 1);
}

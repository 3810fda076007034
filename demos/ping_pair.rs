use meshping::network::Node;
use meshping::{Config, NodeId, Outcome};
use std::time::Duration;

#[tokio::main]
async fn main() -> meshping::Result<()> {
    meshping::init_tracing();

    let base = Config {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..Config::default()
    };
    println!("Node configuration:\n{}", base.to_json()?);

    let a = Node::start(Config {
        node_id: NodeId(1),
        ..base.clone()
    })
    .await?;
    let b = Node::start(Config {
        node_id: NodeId(2),
        ..base
    })
    .await?;
    a.resolver().insert(NodeId(2), b.local_addr());

    println!(
        "\nPinging {} at {} from {} at {}",
        NodeId(2),
        b.local_addr(),
        NodeId(1),
        a.local_addr()
    );

    for _ in 0..5 {
        match a.engine().ping(NodeId(2), Duration::from_secs(1)).await {
            Outcome::Success { round_trip } => {
                println!("reply from {}: time={:.3} ms", NodeId(2), round_trip.as_secs_f64() * 1000.0)
            }
            Outcome::Timeout => println!("request timed out"),
            Outcome::Error { kind } => println!("ping failed: {:?}", kind),
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    // a node nobody knows
    let outcome = a.engine().ping(NodeId(3), Duration::from_secs(1)).await;
    println!("ping {}: {:?}", NodeId(3), outcome);

    let stats = a.engine().stats();
    println!("\n--- {} ping statistics ---", NodeId(2));
    println!(
        "{} sent, {} received, {:.0}% loss",
        stats.sent,
        stats.received,
        stats.loss_ratio() * 100.0
    );
    if let Some(rtt) = stats.rtt {
        println!(
            "rtt min/avg/max/stddev = {:?}/{:?}/{:?}/{:?}",
            rtt.min, rtt.mean, rtt.max, rtt.stddev
        );
    }

    Ok(())
}

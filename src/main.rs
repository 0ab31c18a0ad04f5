use bookshelf::{
    run,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("bookshelf".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    run().await
}

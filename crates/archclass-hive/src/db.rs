use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

pub async fn init_db(db_url: &str) -> PgPool {
    info!("connecting to postgres...");
    connect_with_retry(db_url).await
}

async fn connect_with_retry(db_url: &str) -> PgPool {
    let max_retries = 30;
    let delay = Duration::from_secs(1);

    for i in 1..=max_retries {
        match PgPoolOptions::new()
            .max_connections(20)
            .connect(db_url)
            .await
        {
            Ok(p) => return p,
            Err(e) => {
                warn!(
                    "db connection attempt {}/{} failed: {}. retrying...",
                    i, max_retries, e
                );
                sleep(delay).await;
            }
        }
    }
    panic!("could not connect to postgres after {max_retries} seconds");
}

use user_directory::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config);

    let pool = database::connect(&config.database).await?;
    let app = router(AppState::new(config.clone(), pool.clone()));

    let outcome = Server::new(config).serve(app).await;

    pool.close().await;
    outcome
}

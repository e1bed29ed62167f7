use ecommerce_store::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    repository::OrmRepository,
    seed::{insert_sample_data, sample_data_present},
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let mut repo = OrmRepository::new(orm);
    if sample_data_present(&repo).await? {
        println!("Sample data already present, nothing to do");
        return Ok(());
    }
    let sample = insert_sample_data(&mut repo).await?;

    println!(
        "Seed completed. Giorgi ID: {}, Luka ID: {}, Order ID: {}",
        sample.giorgi, sample.luka, sample.order
    );
    Ok(())
}

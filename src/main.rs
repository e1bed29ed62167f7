use ecommerce_store::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    report::read_data,
    repository::OrmRepository,
    seed::{insert_sample_data, sample_data_present},
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let conn = create_orm_conn(&config).await?;
    run_migrations(&conn).await?;

    let mut repo = OrmRepository::new(conn);
    let sample = if config.seed_on_start && !sample_data_present(&repo).await? {
        Some(insert_sample_data(&mut repo).await?)
    } else {
        None
    };

    let report = read_data(
        &repo,
        sample.map(|s| s.giorgi),
        sample.map(|s| s.order),
    )
    .await?;

    println!();
    for line in report.lines() {
        println!("{line}");
    }
    println!("Done!");

    Ok(())
}

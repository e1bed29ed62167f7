use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Order, Payment, PaymentStatus, Product, User},
    password::hash_password,
    repository::Repository,
};

/// Ids of what [`insert_sample_data`] created.
#[derive(Debug, Clone, Copy)]
pub struct SampleData {
    pub giorgi: Uuid,
    pub luka: Uuid,
    pub soccer_ball: Uuid,
    pub cowboy_hat: Uuid,
    pub blue_pen: Uuid,
    pub order: Uuid,
    pub payment: Uuid,
}

/// Whether a previous run already inserted the sample users.
pub async fn sample_data_present<R: Repository>(repo: &R) -> AppResult<bool> {
    Ok(repo.find_user_by_username("Giorgi").await?.is_some())
}

/// Two users, three products, one order for Giorgi and its payment.
/// Saves after every step.
pub async fn insert_sample_data<R: Repository>(repo: &mut R) -> AppResult<SampleData> {
    let giorgi = User::new("Giorgi", "giorgi@email.com", hash_password("hash1")?)?;
    let luka = User::new("Luka", "luka@email.com", hash_password("hash2")?)?;
    let giorgi_id = repo.add_user(giorgi).await?;
    let luka_id = repo.add_user(luka).await?;
    repo.save().await?;

    let soccer_ball = Product::new(
        "Soccer ball",
        "A round ball for playing soccer",
        Decimal::new(2500, 2),
        100,
    )?;
    let cowboy_hat = Product::new("Cowboy hat", "A stylish cowboy hat", Decimal::new(1000, 2), 50)?;
    let blue_pen = Product::new("Blue pen", "A blue ink pen", Decimal::new(150, 2), 200)?;

    let mut order = Order::new(giorgi_id, "");
    order.add_item(&soccer_ball, 1)?;
    order.add_item(&cowboy_hat, 2)?;

    let soccer_ball_id = repo.add_product(soccer_ball).await?;
    let cowboy_hat_id = repo.add_product(cowboy_hat).await?;
    let blue_pen_id = repo.add_product(blue_pen).await?;
    repo.save().await?;

    let payment = Payment::for_order(&order, "Credit Card", PaymentStatus::Completed)?;
    let order_id = repo.add_order(order).await?;
    repo.save().await?;

    let payment_id = repo.add_payment(payment).await?;
    repo.save().await?;

    tracing::info!(order_id = %order_id, "sample data inserted");
    Ok(SampleData {
        giorgi: giorgi_id,
        luka: luka_id,
        soccer_ball: soccer_ball_id,
        cowboy_hat: cowboy_hat_id,
        blue_pen: blue_pen_id,
        order: order_id,
        payment: payment_id,
    })
}

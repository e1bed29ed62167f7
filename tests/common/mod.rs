#![allow(dead_code)]

use ecommerce_store::{
    error::{AppError, ValidationError},
    models::{
        Address, Cart, Category, Order, OrderStatus, Payment, PaymentStatus, Product, Review,
        User, Wishlist,
    },
    repository::Repository,
    seed::{insert_sample_data, sample_data_present},
};
use rust_decimal::Decimal;
use uuid::Uuid;

pub fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub fn user(name: &str) -> User {
    User::new(name, format!("{}@email.com", name.to_lowercase()), "hash").unwrap()
}

pub struct Catalog {
    pub giorgi: User,
    pub luka: User,
    pub soccer_ball: Product,
    pub cowboy_hat: Product,
}

/// Users Giorgi and Luka plus two products, committed.
pub async fn seed_catalog<R: Repository>(repo: &mut R) -> anyhow::Result<Catalog> {
    let catalog = Catalog {
        giorgi: user("Giorgi"),
        luka: user("Luka"),
        soccer_ball: Product::new("Soccer ball", "A round ball for playing soccer", money(2500), 100)?,
        cowboy_hat: Product::new("Cowboy hat", "A stylish cowboy hat", money(1000), 50)?,
    };
    repo.add_user(catalog.giorgi.clone()).await?;
    repo.add_user(catalog.luka.clone()).await?;
    repo.add_product(catalog.soccer_ball.clone()).await?;
    repo.add_product(catalog.cowboy_hat.clone()).await?;
    assert_eq!(repo.save().await?, 4);
    Ok(catalog)
}

fn giorgi_order(catalog: &Catalog) -> anyhow::Result<Order> {
    let mut order = Order::new(catalog.giorgi.id, "1 Rustaveli Ave");
    order.add_item(&catalog.soccer_ball, 1)?;
    order.add_item(&catalog.cowboy_hat, 2)?;
    Ok(order)
}

pub async fn order_with_payment_round_trip<R: Repository>(repo: &mut R) -> anyhow::Result<()> {
    let catalog = seed_catalog(repo).await?;
    let order = giorgi_order(&catalog)?;
    assert_eq!(order.total_amount(), money(4500));

    let order_id = repo.add_order(order).await?;
    repo.save().await?;

    let payment = Payment::new(order_id, money(4500), "Credit Card", PaymentStatus::Completed)?;
    let payment_id = repo.add_payment(payment).await?;
    repo.save().await?;

    let found = repo
        .find_order_with_payment(order_id)
        .await?
        .expect("order should exist");
    assert_eq!(found.order.id, order_id);
    assert_eq!(found.order.total_amount(), money(4500));
    assert_eq!(found.order.items().len(), 2);
    let payment = found.payment.expect("payment should be attached");
    assert_eq!(payment.id, payment_id);
    assert_eq!(payment.amount, money(4500));
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.method, "Credit Card");
    Ok(())
}

pub async fn order_without_payment_has_none<R: Repository>(repo: &mut R) -> anyhow::Result<()> {
    let catalog = seed_catalog(repo).await?;
    let order_id = repo.add_order(giorgi_order(&catalog)?).await?;
    repo.save().await?;

    let found = repo.find_order_with_payment(order_id).await?.expect("order");
    assert!(found.payment.is_none());
    assert!(repo.find_order_with_payment(Uuid::now_v7()).await?.is_none());
    Ok(())
}

pub async fn user_with_orders_loads_products<R: Repository>(repo: &mut R) -> anyhow::Result<()> {
    let catalog = seed_catalog(repo).await?;
    repo.add_order(giorgi_order(&catalog)?).await?;
    repo.save().await?;

    let loaded = repo
        .find_user_with_orders(catalog.giorgi.id)
        .await?
        .expect("user should exist");
    assert_eq!(loaded.user.username, "Giorgi");
    assert_eq!(loaded.orders.len(), 1);

    let order = &loaded.orders[0];
    let lines: Vec<(String, i32)> = order
        .lines()
        .map(|(item, product)| (product.name.clone(), item.quantity))
        .collect();
    assert_eq!(
        lines,
        vec![("Soccer ball".to_string(), 1), ("Cowboy hat".to_string(), 2)]
    );
    for item in order.order.items() {
        assert_eq!(item.total_price(), item.price * Decimal::from(item.quantity));
    }
    let sum: Decimal = order.order.items().iter().map(|i| i.total_price()).sum();
    assert_eq!(order.total_amount(), sum);
    Ok(())
}

pub async fn user_without_orders_has_empty_collection<R: Repository>(
    repo: &mut R,
) -> anyhow::Result<()> {
    let catalog = seed_catalog(repo).await?;
    let loaded = repo
        .find_user_with_orders(catalog.luka.id)
        .await?
        .expect("user without orders is still found");
    assert_eq!(loaded.user.id, catalog.luka.id);
    assert!(loaded.orders.is_empty());

    assert!(repo.find_user_with_orders(Uuid::now_v7()).await?.is_none());
    Ok(())
}

pub async fn unknown_product_leaves_order_uninserted<R: Repository>(
    repo: &mut R,
) -> anyhow::Result<()> {
    let catalog = seed_catalog(repo).await?;
    let mut order = Order::new(catalog.giorgi.id, "");
    order.add_item(&catalog.soccer_ball, 1)?;
    order.add_item_at_price(Uuid::now_v7(), 1, money(500))?;
    let order_id = order.id;

    let err = repo.add_order(order).await.unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)), "{err:?}");
    assert_eq!(repo.pending(), 0);
    assert_eq!(repo.save().await?, 0);

    assert!(repo.find_order_with_payment(order_id).await?.is_none());
    assert!(repo.list_orders_with_user_and_items().await?.is_empty());
    Ok(())
}

pub async fn unknown_user_is_a_constraint_violation<R: Repository>(
    repo: &mut R,
) -> anyhow::Result<()> {
    let catalog = seed_catalog(repo).await?;
    let mut order = Order::new(Uuid::now_v7(), "");
    order.add_item(&catalog.soccer_ball, 1)?;
    assert!(matches!(
        repo.add_order(order).await,
        Err(AppError::ConstraintViolation(_))
    ));

    let review = Review::new(catalog.soccer_ball.id, Uuid::now_v7(), 4, "nice")?;
    assert!(matches!(
        repo.add_review(review).await,
        Err(AppError::ConstraintViolation(_))
    ));
    assert_eq!(repo.pending(), 0);
    Ok(())
}

pub async fn staged_writes_are_invisible_until_save<R: Repository>(
    repo: &mut R,
) -> anyhow::Result<()> {
    let ana = user("Ana");
    let ana_id = repo.add_user(ana).await?;
    assert_eq!(repo.pending(), 1);
    assert!(repo.find_user(ana_id).await?.is_none());

    assert_eq!(repo.save().await?, 1);
    assert_eq!(repo.pending(), 0);
    assert_eq!(repo.find_user(ana_id).await?.map(|u| u.username), Some("Ana".into()));

    let bob_id = repo.add_user(user("Bob")).await?;
    assert_eq!(repo.discard(), 1);
    assert_eq!(repo.save().await?, 0);
    assert!(repo.find_user(bob_id).await?.is_none());
    Ok(())
}

pub async fn staged_parents_can_be_referenced<R: Repository>(
    repo: &mut R,
) -> anyhow::Result<()> {
    let nino = user("Nino");
    let pen = Product::new("Blue pen", "A blue ink pen", money(150), 200)?;
    let mut order = Order::new(nino.id, "Batumi");
    order.add_item(&pen, 4)?;
    let payment = Payment::for_order(&order, "PayPal", PaymentStatus::Pending)?;

    repo.add_user(nino).await?;
    repo.add_product(pen).await?;
    let order_id = repo.add_order(order).await?;
    repo.add_payment(payment).await?;
    assert_eq!(repo.save().await?, 4);

    let found = repo.find_order_with_payment(order_id).await?.expect("order");
    assert_eq!(found.order.total_amount(), money(600));
    assert_eq!(found.payment.map(|p| p.amount), Some(money(600)));
    Ok(())
}

pub async fn uniqueness_is_enforced<R: Repository>(repo: &mut R) -> anyhow::Result<()> {
    let catalog = seed_catalog(repo).await?;

    let same_name = User::new("Giorgi", "other@email.com", "hash")?;
    assert!(matches!(
        repo.add_user(same_name).await,
        Err(AppError::ConstraintViolation(_))
    ));
    let same_email = User::new("Someone", "giorgi@email.com", "hash")?;
    assert!(matches!(
        repo.add_user(same_email).await,
        Err(AppError::ConstraintViolation(_))
    ));

    repo.add_category(Category::new("Sports")?).await?;
    assert!(matches!(
        repo.add_category(Category::new("Sports")?).await,
        Err(AppError::ConstraintViolation(_))
    ));

    let order_id = repo.add_order(giorgi_order(&catalog)?).await?;
    repo.save().await?;

    let short = Payment::new(order_id, money(4000), "Credit Card", PaymentStatus::Completed)?;
    assert!(matches!(
        repo.add_payment(short).await,
        Err(AppError::ConstraintViolation(_))
    ));

    let full = Payment::new(order_id, money(4500), "Credit Card", PaymentStatus::Completed)?;
    repo.add_payment(full).await?;
    let again = Payment::new(order_id, money(4500), "Cash", PaymentStatus::Pending)?;
    assert!(matches!(
        repo.add_payment(again).await,
        Err(AppError::ConstraintViolation(_))
    ));

    let orphan = Payment::new(Uuid::now_v7(), money(100), "Cash", PaymentStatus::Pending)?;
    assert!(matches!(
        repo.add_payment(orphan).await,
        Err(AppError::ConstraintViolation(_))
    ));

    repo.add_wishlist(Wishlist::new(catalog.luka.id)).await?;
    assert!(matches!(
        repo.add_wishlist(Wishlist::new(catalog.luka.id)).await,
        Err(AppError::ConstraintViolation(_))
    ));

    assert_eq!(repo.save().await?, 2);

    let paid = repo.find_order_with_payment(order_id).await?.expect("order");
    assert_eq!(paid.payment.map(|p| p.amount), Some(money(4500)));
    assert!(repo.find_wishlist_for_user(catalog.luka.id).await?.is_some());
    Ok(())
}

pub async fn order_status_follows_lifecycle<R: Repository>(repo: &mut R) -> anyhow::Result<()> {
    let catalog = seed_catalog(repo).await?;
    let order_id = repo.add_order(giorgi_order(&catalog)?).await?;
    repo.save().await?;

    assert!(matches!(
        repo.update_order_status(order_id, OrderStatus::Delivered).await,
        Err(AppError::Validation(_))
    ));

    repo.update_order_status(order_id, OrderStatus::Shipped).await?;
    // The staged status counts for the next transition.
    repo.update_order_status(order_id, OrderStatus::Delivered).await?;
    repo.save().await?;

    let found = repo.find_order_with_payment(order_id).await?.expect("order");
    assert_eq!(found.order.status, OrderStatus::Delivered);

    assert!(matches!(
        repo.update_order_status(order_id, OrderStatus::Cancelled).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        repo.update_order_status(Uuid::now_v7(), OrderStatus::Shipped).await,
        Err(AppError::ConstraintViolation(_))
    ));
    Ok(())
}

pub async fn side_aggregates_round_trip<R: Repository>(repo: &mut R) -> anyhow::Result<()> {
    let catalog = seed_catalog(repo).await?;
    let sports = Category::new("Sports")?;
    let frisbee = Product::new("Frisbee", "A flying disc", money(850), 10)?.in_category(&sports);
    repo.add_category(sports.clone()).await?;
    repo.add_product(frisbee.clone()).await?;

    let mut cart = Cart::new(catalog.luka.id);
    cart.add_item(&catalog.cowboy_hat, 3)?;
    cart.add_item(&frisbee, 1)?;
    let cart_id = repo.add_cart(cart).await?;

    let mut wishlist = Wishlist::new(catalog.luka.id);
    wishlist.add_product(&catalog.soccer_ball)?;
    repo.add_wishlist(wishlist).await?;

    let address = Address::new(
        catalog.luka.id,
        "12 Chavchavadze St",
        None,
        "Tbilisi",
        "",
        "0179",
        "Georgia",
    )?;
    repo.add_address(address).await?;

    let review = Review::new(catalog.soccer_ball.id, catalog.luka.id, 5, "Bounces well")?;
    repo.add_review(review).await?;
    assert_eq!(repo.save().await?, 6);

    let product = repo.find_product(frisbee.id).await?.expect("product");
    assert_eq!(product.category_id, Some(sports.id));
    assert_eq!(product.price, money(850));

    let cart = repo.find_cart(cart_id).await?.expect("cart");
    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.total_amount(), money(3000) + money(850));

    let wishlist = repo
        .find_wishlist_for_user(catalog.luka.id)
        .await?
        .expect("wishlist");
    assert!(wishlist.contains(catalog.soccer_ball.id));
    assert!(repo.find_wishlist_for_user(catalog.giorgi.id).await?.is_none());

    let addresses = repo.list_addresses_for_user(catalog.luka.id).await?;
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0].city, "Tbilisi");
    assert_eq!(addresses[0].line2, None);

    let reviews = repo.list_reviews_for_product(catalog.soccer_ball.id).await?;
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].rating, 5);
    assert!(repo.list_reviews_for_product(frisbee.id).await?.is_empty());
    Ok(())
}

pub async fn orders_list_with_users<R: Repository>(repo: &mut R) -> anyhow::Result<()> {
    let catalog = seed_catalog(repo).await?;
    let first = repo.add_order(giorgi_order(&catalog)?).await?;
    let mut second = Order::new(catalog.luka.id, "Kutaisi");
    second.add_item(&catalog.cowboy_hat, 1)?;
    let second = repo.add_order(second).await?;
    repo.save().await?;

    let orders = repo.list_orders_with_user_and_items().await?;
    let summary: Vec<(Uuid, String, usize)> = orders
        .iter()
        .map(|o| (o.order_id(), o.user.username.clone(), o.order.lines().count()))
        .collect();
    assert_eq!(
        summary,
        vec![(first, "Giorgi".to_string(), 2), (second, "Luka".to_string(), 1)]
    );

    let users = repo.list_users_with_orders().await?;
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.orders.len() == 1));

    let prefixed = repo.find_users_by_username_prefix("Gi").await?;
    assert_eq!(prefixed.len(), 1);
    assert_eq!(prefixed[0].id, catalog.giorgi.id);
    assert!(repo.find_users_by_username_prefix("A").await?.is_empty());
    Ok(())
}

pub async fn money_round_trips_exactly<R: Repository>(repo: &mut R) -> anyhow::Result<()> {
    let buyer = user("Tamar");
    let big: Decimal = "123456789012345.6789".parse()?;
    let yacht = Product::new("Yacht", "", big, 1)?;
    let gum = Product::new("Gum", "", "0.0001".parse()?, 1000)?;
    let mut order = Order::new(buyer.id, "Marina");
    order.add_item(&yacht, 1)?;
    order.add_item(&gum, 3)?;
    let payment = Payment::for_order(&order, "Wire", PaymentStatus::Completed)?;

    repo.add_user(buyer).await?;
    repo.add_product(yacht.clone()).await?;
    repo.add_product(gum.clone()).await?;
    let order_id = repo.add_order(order).await?;
    repo.add_payment(payment).await?;
    repo.save().await?;

    let stored = repo.find_product(yacht.id).await?.expect("product");
    assert_eq!(stored.price, big);
    assert_eq!(stored.price.to_string(), "123456789012345.6789");
    assert_eq!(
        repo.find_product(gum.id).await?.map(|p| p.price),
        Some(Decimal::new(1, 4))
    );

    let expected: Decimal = "123456789012345.6792".parse()?;
    let found = repo.find_order_with_payment(order_id).await?.expect("order");
    assert_eq!(found.order.total_amount(), expected);
    assert_eq!(found.payment.map(|p| p.amount), Some(expected));
    Ok(())
}

pub async fn username_lookups_are_literal<R: Repository>(repo: &mut R) -> anyhow::Result<()> {
    for name in ["Giorgi", "Ana_b", "Anaxb"] {
        repo.add_user(user(name)).await?;
    }
    repo.save().await?;

    let names = |users: Vec<User>| -> Vec<String> {
        users.into_iter().map(|u| u.username).collect()
    };
    assert!(repo.find_users_by_username_prefix("gi").await?.is_empty());
    assert_eq!(names(repo.find_users_by_username_prefix("Gi").await?), vec!["Giorgi"]);
    assert_eq!(names(repo.find_users_by_username_prefix("Ana_").await?), vec!["Ana_b"]);
    assert_eq!(
        names(repo.find_users_by_username_prefix("Ana").await?),
        vec!["Ana_b", "Anaxb"]
    );
    assert!(repo.find_users_by_username_prefix("Ana%").await?.is_empty());

    assert!(repo.find_user_by_username("giorgi").await?.is_none());
    assert!(repo.find_user_by_username("Giorg").await?.is_none());
    assert_eq!(
        repo.find_user_by_username("Giorgi").await?.map(|u| u.username),
        Some("Giorgi".to_string())
    );
    Ok(())
}

pub async fn similar_names_do_not_block_seeding<R: Repository>(
    repo: &mut R,
) -> anyhow::Result<()> {
    repo.add_user(user("Giorgia")).await?;
    repo.add_user(user("giorgio")).await?;
    repo.save().await?;
    assert!(!sample_data_present(&*repo).await?);

    insert_sample_data(repo).await?;
    assert!(sample_data_present(&*repo).await?);
    Ok(())
}

pub async fn mutated_models_are_revalidated<R: Repository>(repo: &mut R) -> anyhow::Result<()> {
    let catalog = seed_catalog(repo).await?;

    let mut kite = Product::new("Kite", "", money(1200), 5)?;
    kite.price = money(-100);
    assert!(matches!(
        repo.add_product(kite).await,
        Err(AppError::Validation(ValidationError::NegativeAmount { .. }))
    ));

    let review = Review::new(catalog.soccer_ball.id, catalog.luka.id, 4, "ok")?;
    let inflated = Review { rating: 9, ..review };
    assert!(matches!(
        repo.add_review(inflated).await,
        Err(AppError::Validation(ValidationError::Rating(9)))
    ));

    let mut nameless = user("Nino");
    nameless.username = " ".into();
    assert!(matches!(
        repo.add_user(nameless).await,
        Err(AppError::Validation(ValidationError::Empty(_)))
    ));

    let mut payment = Payment::new(Uuid::now_v7(), money(100), "Cash", PaymentStatus::Pending)?;
    payment.method.clear();
    assert!(matches!(
        repo.add_payment(payment).await,
        Err(AppError::Validation(_))
    ));

    assert_eq!(repo.pending(), 0);
    Ok(())
}

pub async fn duplicate_ids_are_rejected<R: Repository>(repo: &mut R) -> anyhow::Result<()> {
    let ana = user("Ana");
    let mut twin = ana.clone();
    twin.username = "Ana2".into();
    twin.email = "ana2@email.com".into();

    repo.add_user(ana).await?;
    assert!(matches!(
        repo.add_user(twin.clone()).await,
        Err(AppError::ConstraintViolation(_))
    ));
    assert_eq!(repo.save().await?, 1);
    assert!(matches!(
        repo.add_user(twin).await,
        Err(AppError::ConstraintViolation(_))
    ));

    let pen = Product::new("Blue pen", "", money(150), 200)?;
    repo.add_product(pen.clone()).await?;
    repo.save().await?;
    let mut renamed = pen.clone();
    renamed.name = "Red pen".into();
    assert!(matches!(
        repo.add_product(renamed).await,
        Err(AppError::ConstraintViolation(_))
    ));

    assert_eq!(repo.pending(), 0);
    Ok(())
}

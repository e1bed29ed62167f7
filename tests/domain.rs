use ecommerce_store::{
    error::ValidationError,
    models::{
        Address, Cart, Category, Order, OrderStatus, Payment, PaymentStatus, Product, Review,
        User, Wishlist,
    },
};
use rust_decimal::Decimal;
use uuid::Uuid;

fn product(cents: i64) -> Product {
    Product::new("Widget", "", Decimal::new(cents, 2), 10).unwrap()
}

#[test]
fn order_total_is_sum_of_line_totals() {
    let ball = product(2500);
    let hat = product(1000);
    let mut order = Order::new(Uuid::now_v7(), "");
    assert_eq!(order.total_amount(), Decimal::ZERO);

    order.add_item(&ball, 1).unwrap();
    let line = order.add_item(&hat, 2).unwrap();
    assert_eq!(line.price, Decimal::new(1000, 2));
    assert_eq!(line.total_price(), Decimal::new(2000, 2));
    assert_eq!(order.total_amount(), Decimal::new(4500, 2));
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.items().iter().all(|i| i.order_id == order.id));
}

#[test]
fn cart_line_totals_follow_price() {
    let mut cart = Cart::new(Uuid::now_v7());
    let line = cart.add_item(&product(150), 4).unwrap();
    assert_eq!(line.total_price, Decimal::new(600, 2));
    assert_eq!(cart.total_amount(), Decimal::new(600, 2));
}

#[test]
fn quantities_must_be_positive() {
    let mut order = Order::new(Uuid::now_v7(), "");
    assert_eq!(
        order.add_item(&product(100), 0).unwrap_err(),
        ValidationError::Quantity(0)
    );
    assert!(Cart::new(Uuid::now_v7()).add_item(&product(100), -1).is_err());
    assert!(order.items().is_empty());
}

#[test]
fn ratings_outside_one_to_five_are_rejected() {
    let (product_id, user_id) = (Uuid::now_v7(), Uuid::now_v7());
    for rating in [0, 6, -1] {
        assert_eq!(
            Review::new(product_id, user_id, rating, "").unwrap_err(),
            ValidationError::Rating(rating)
        );
    }
    for rating in Review::MIN_RATING..=Review::MAX_RATING {
        assert!(Review::new(product_id, user_id, rating, "ok").is_ok());
    }
}

#[test]
fn prices_and_stock_cannot_be_negative() {
    assert!(Product::new("Free sample", "", Decimal::ZERO, 0).is_ok());
    assert!(matches!(
        Product::new("Broken", "", Decimal::new(-1, 2), 1),
        Err(ValidationError::NegativeAmount { .. })
    ));
    assert!(matches!(
        Product::new("Broken", "", Decimal::ONE, -3),
        Err(ValidationError::NegativeCount { .. })
    ));
    assert!(matches!(
        Payment::new(Uuid::now_v7(), Decimal::NEGATIVE_ONE, "Cash", PaymentStatus::Pending),
        Err(ValidationError::NegativeAmount { .. })
    ));
}

#[test]
fn required_text_fields() {
    assert!(matches!(User::new("", "a@b.c", "h"), Err(ValidationError::Empty(_))));
    assert!(matches!(
        User::new("nino", "not-an-email", "h"),
        Err(ValidationError::Email(_))
    ));
    assert!(matches!(Category::new("  "), Err(ValidationError::Empty(_))));
    assert!(matches!(Product::new("", "", Decimal::ONE, 1), Err(ValidationError::Empty(_))));
    assert!(matches!(
        Address::new(Uuid::now_v7(), "", None, "Tbilisi", "", "", "Georgia"),
        Err(ValidationError::Empty(_))
    ));
    let address = Address::new(
        Uuid::now_v7(),
        "1 Main St",
        Some(" ".into()),
        "Tbilisi",
        "",
        "",
        "Georgia",
    )
    .unwrap();
    assert_eq!(address.line2, None);
}

#[test]
fn wishlist_rejects_duplicates() {
    let pen = product(150);
    let mut wishlist = Wishlist::new(Uuid::now_v7());
    wishlist.add_product(&pen).unwrap();
    assert_eq!(
        wishlist.add_product(&pen).unwrap_err(),
        ValidationError::DuplicateWishlistItem(pen.id)
    );
    assert_eq!(wishlist.items().len(), 1);
    assert!(wishlist.contains(pen.id));
}

#[test]
fn status_lifecycle() {
    use OrderStatus::*;
    assert_eq!(Pending.transition_to(Shipped).unwrap(), Shipped);
    assert_eq!(Shipped.transition_to(Delivered).unwrap(), Delivered);
    assert_eq!(Pending.transition_to(Cancelled).unwrap(), Cancelled);
    assert_eq!(Shipped.transition_to(Cancelled).unwrap(), Cancelled);
    for (from, to) in [(Shipped, Pending), (Delivered, Cancelled), (Cancelled, Pending)] {
        assert_eq!(
            from.transition_to(to).unwrap_err(),
            ValidationError::StatusTransition {
                from: from.to_string(),
                to: to.to_string()
            }
        );
    }
}

#[test]
fn payment_for_order_copies_total() {
    let mut order = Order::new(Uuid::now_v7(), "");
    order.add_item(&product(2500), 1).unwrap();
    order.add_item(&product(1000), 2).unwrap();
    let payment = Payment::for_order(&order, "Credit Card", PaymentStatus::Completed).unwrap();
    assert_eq!(payment.order_id, order.id);
    assert_eq!(payment.amount, Decimal::new(4500, 2));
}

#[test]
fn models_serialize_to_json() {
    let category = Category::new("Sports").unwrap();
    let product = Product::new("Ball", "Round", Decimal::new(2500, 2), 3)
        .unwrap()
        .in_category(&category);
    let json = serde_json::to_value(&product).unwrap();
    assert_eq!(json["name"], "Ball");
    assert_eq!(json["category_id"], category.id.to_string());

    let back: Product = serde_json::from_value(json).unwrap();
    assert_eq!(back, product);

    let status = serde_json::to_value(OrderStatus::Shipped).unwrap();
    assert_eq!(status, "Shipped");
}

#[test]
fn deserialization_rejects_invalid_models() {
    let review = Review::new(Uuid::now_v7(), Uuid::now_v7(), 4, "fine").unwrap();
    let mut json = serde_json::to_value(&review).unwrap();
    json["rating"] = serde_json::json!(9);
    let err = serde_json::from_value::<Review>(json).unwrap_err();
    assert!(err.to_string().contains("rating"), "{err}");

    let mut json = serde_json::to_value(product(100)).unwrap();
    json["price"] = serde_json::json!("-1");
    assert!(serde_json::from_value::<Product>(json).is_err());

    let mut order = Order::new(Uuid::now_v7(), "");
    order.add_item(&product(100), 2).unwrap();
    let mut json = serde_json::to_value(&order).unwrap();
    json["items"][0]["quantity"] = serde_json::json!(0);
    assert!(serde_json::from_value::<Order>(json).is_err());
}

#[test]
fn amounts_must_fit_storage_precision() {
    assert!(matches!(
        Product::new("Dust", "", Decimal::new(1, 5), 1),
        Err(ValidationError::AmountOutOfRange { .. })
    ));
    let mut order = Order::new(Uuid::now_v7(), "");
    assert!(matches!(
        order.add_item_at_price(Uuid::now_v7(), 1, Decimal::MAX),
        Err(ValidationError::AmountOutOfRange { .. })
    ));
    let max_storable: Decimal = "922337203685477.5807".parse().unwrap();
    assert!(Product::new("Rare", "", max_storable, 1).is_ok());
}

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderWithProducts, distinct_products},
    entity::{
        OrderItems, Products, Users, addresses, cart_items, carts, order_items, orders, payments,
        products, reviews, users, wishlist_items, wishlists,
    },
    error::AppResult,
    money::from_minor_units,
    models::{
        Address, Cart, CartItem, Order, OrderItem, OrderStatus, Payment, PaymentStatus, Product,
        Review, User, Wishlist, WishlistItem,
    },
};

pub(super) fn user_from_entity(model: users::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        registered_at: model.registered_at.with_timezone(&Utc),
    }
}

pub(super) fn product_from_entity(model: products::Model) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: from_minor_units(model.price),
        stock_quantity: model.stock_quantity,
        category_id: model.category_id,
    }
}

fn order_item_from_entity(model: order_items::Model) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: from_minor_units(model.price),
    }
}

pub(super) fn order_from_entity(
    model: orders::Model,
    items: Vec<order_items::Model>,
) -> AppResult<Order> {
    let status = model.status.parse::<OrderStatus>()?;
    let order = Order::restore(
        model.id,
        model.user_id,
        model.order_date.with_timezone(&Utc),
        model.shipping_address,
        status,
        items.into_iter().map(order_item_from_entity).collect(),
    );
    let stored = from_minor_units(model.total_amount);
    if order.total_amount() != stored {
        tracing::warn!(
            order_id = %order.id,
            stored = %stored,
            computed = %order.total_amount(),
            "stored order total differs from its items"
        );
    }
    Ok(order)
}

pub(super) fn payment_from_entity(model: payments::Model) -> AppResult<Payment> {
    Ok(Payment {
        id: model.id,
        order_id: model.order_id,
        payment_date: model.payment_date.with_timezone(&Utc),
        amount: from_minor_units(model.amount),
        method: model.payment_method,
        status: model.payment_status.parse::<PaymentStatus>()?,
    })
}

pub(super) fn cart_from_entity(model: carts::Model, items: Vec<cart_items::Model>) -> Cart {
    let items = items
        .into_iter()
        .map(|item| CartItem {
            id: item.id,
            cart_id: item.cart_id,
            product_id: item.product_id,
            quantity: item.quantity,
            total_price: from_minor_units(item.total_price),
        })
        .collect();
    Cart::restore(model.id, model.user_id, model.created_at.with_timezone(&Utc), items)
}

pub(super) fn wishlist_from_entity(
    model: wishlists::Model,
    items: Vec<wishlist_items::Model>,
) -> Wishlist {
    let items = items
        .into_iter()
        .map(|item| WishlistItem {
            id: item.id,
            wishlist_id: item.wishlist_id,
            product_id: item.product_id,
        })
        .collect();
    Wishlist::restore(model.id, model.user_id, items)
}

pub(super) fn address_from_entity(model: addresses::Model) -> Address {
    Address {
        id: model.id,
        user_id: model.user_id,
        line1: model.address_line1,
        line2: model.address_line2,
        city: model.city,
        state: model.state,
        postal_code: model.postal_code,
        country: model.country,
    }
}

pub(super) fn review_from_entity(model: reviews::Model) -> Review {
    Review {
        id: model.id,
        product_id: model.product_id,
        user_id: model.user_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

/// Eager-loads items and their products for a batch of orders: one query for
/// the items, one for the products, joined here by key.
pub(super) async fn load_orders<C: ConnectionTrait>(
    db: &C,
    orders: Vec<orders::Model>,
) -> AppResult<Vec<OrderWithProducts>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = OrderItems::find()
        .filter(order_items::Column::OrderId.is_in(order_ids))
        .order_by_asc(order_items::Column::Id)
        .all(db)
        .await?;

    let mut product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    product_ids.sort();
    product_ids.dedup();
    let products: HashMap<Uuid, Product> = if product_ids.is_empty() {
        HashMap::new()
    } else {
        Products::find()
            .filter(products::Column::Id.is_in(product_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, product_from_entity(p)))
            .collect()
    };

    let mut items_by_order: HashMap<Uuid, Vec<order_items::Model>> = HashMap::new();
    for item in items {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    orders
        .into_iter()
        .map(|model| {
            let items = items_by_order.remove(&model.id).unwrap_or_default();
            let order = order_from_entity(model, items)?;
            let products = distinct_products(
                order
                    .items()
                    .iter()
                    .filter_map(|item| products.get(&item.product_id).cloned()),
            );
            Ok(OrderWithProducts { order, products })
        })
        .collect()
}

/// Users keyed by id, for joining onto already loaded rows.
pub(super) async fn load_users<C: ConnectionTrait>(
    db: &C,
    mut ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, User>> {
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(Users::find()
        .filter(users::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, user_from_entity(u)))
        .collect())
}

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, sea_query::Expr};
use uuid::Uuid;

use crate::{
    entity::{
        Addresses, CartItems, Carts, Categories, OrderItems, Orders, Payments, Products, Reviews,
        Users, WishlistItems, Wishlists, addresses, cart_items, carts, categories, order_items,
        orders, payments, products, reviews, users, wishlist_items, wishlists,
    },
    models::{Address, Cart, Category, Order, OrderStatus, Payment, Product, Review, User, Wishlist},
    money::to_minor_units,
};

fn units(field: &str, value: Decimal) -> Result<i64, DbErr> {
    to_minor_units(value)
        .ok_or_else(|| DbErr::Custom(format!("{field} {value} cannot be stored exactly")))
}

/// A write accepted by the unit of work and waiting for `save`.
#[derive(Debug, Clone)]
pub(super) enum PendingWrite {
    User(User),
    Category(Category),
    Product(Product),
    Cart(Cart),
    Order(Order),
    Payment(Payment),
    Address(Address),
    Wishlist(Wishlist),
    Review(Review),
    OrderStatus { order_id: Uuid, status: OrderStatus },
}

impl PendingWrite {
    pub(super) fn describe(&self) -> &'static str {
        match self {
            PendingWrite::User(_) => "insert user",
            PendingWrite::Category(_) => "insert category",
            PendingWrite::Product(_) => "insert product",
            PendingWrite::Cart(_) => "insert cart",
            PendingWrite::Order(_) => "insert order",
            PendingWrite::Payment(_) => "insert payment",
            PendingWrite::Address(_) => "insert address",
            PendingWrite::Wishlist(_) => "insert wishlist",
            PendingWrite::Review(_) => "insert review",
            PendingWrite::OrderStatus { .. } => "update order status",
        }
    }

    /// Table and primary key of the row this write inserts.
    pub(super) fn inserted(&self) -> Option<(&'static str, Uuid)> {
        match self {
            PendingWrite::User(user) => Some(("users", user.id)),
            PendingWrite::Category(category) => Some(("categories", category.id)),
            PendingWrite::Product(product) => Some(("products", product.id)),
            PendingWrite::Cart(cart) => Some(("carts", cart.id)),
            PendingWrite::Order(order) => Some(("orders", order.id)),
            PendingWrite::Payment(payment) => Some(("payments", payment.id)),
            PendingWrite::Address(address) => Some(("addresses", address.id)),
            PendingWrite::Wishlist(wishlist) => Some(("wishlists", wishlist.id)),
            PendingWrite::Review(review) => Some(("reviews", review.id)),
            PendingWrite::OrderStatus { .. } => None,
        }
    }

    pub(super) async fn apply<C: ConnectionTrait>(&self, db: &C) -> Result<(), DbErr> {
        match self {
            PendingWrite::User(user) => {
                Users::insert(users::ActiveModel {
                    id: Set(user.id),
                    username: Set(user.username.clone()),
                    email: Set(user.email.clone()),
                    password_hash: Set(user.password_hash.clone()),
                    registered_at: Set(user.registered_at.into()),
                })
                .exec_without_returning(db)
                .await?;
            }
            PendingWrite::Category(category) => {
                Categories::insert(categories::ActiveModel {
                    id: Set(category.id),
                    name: Set(category.name.clone()),
                })
                .exec_without_returning(db)
                .await?;
            }
            PendingWrite::Product(product) => {
                Products::insert(products::ActiveModel {
                    id: Set(product.id),
                    name: Set(product.name.clone()),
                    description: Set(product.description.clone()),
                    price: Set(units("price", product.price)?),
                    stock_quantity: Set(product.stock_quantity),
                    category_id: Set(product.category_id),
                })
                .exec_without_returning(db)
                .await?;
            }
            PendingWrite::Cart(cart) => {
                Carts::insert(carts::ActiveModel {
                    id: Set(cart.id),
                    user_id: Set(cart.user_id),
                    total_amount: Set(units("cart total", cart.total_amount())?),
                    created_at: Set(cart.created_at.into()),
                })
                .exec_without_returning(db)
                .await?;
                if !cart.items().is_empty() {
                    let items = cart
                        .items()
                        .iter()
                        .map(|item| {
                            Ok(cart_items::ActiveModel {
                                id: Set(item.id),
                                cart_id: Set(item.cart_id),
                                product_id: Set(item.product_id),
                                quantity: Set(item.quantity),
                                total_price: Set(units("cart item total", item.total_price)?),
                            })
                        })
                        .collect::<Result<Vec<_>, DbErr>>()?;
                    CartItems::insert_many(items)
                    .exec_without_returning(db)
                    .await?;
                }
            }
            PendingWrite::Order(order) => {
                Orders::insert(orders::ActiveModel {
                    id: Set(order.id),
                    user_id: Set(order.user_id),
                    order_date: Set(order.order_date.into()),
                    total_amount: Set(units("order total", order.total_amount())?),
                    shipping_address: Set(order.shipping_address.clone()),
                    status: Set(order.status.as_str().to_string()),
                })
                .exec_without_returning(db)
                .await?;
                if !order.items().is_empty() {
                    let items = order
                        .items()
                        .iter()
                        .map(|item| {
                            Ok(order_items::ActiveModel {
                                id: Set(item.id),
                                order_id: Set(item.order_id),
                                product_id: Set(item.product_id),
                                quantity: Set(item.quantity),
                                price: Set(units("price", item.price)?),
                            })
                        })
                        .collect::<Result<Vec<_>, DbErr>>()?;
                    OrderItems::insert_many(items)
                    .exec_without_returning(db)
                    .await?;
                }
            }
            PendingWrite::Payment(payment) => {
                Payments::insert(payments::ActiveModel {
                    id: Set(payment.id),
                    order_id: Set(payment.order_id),
                    payment_date: Set(payment.payment_date.into()),
                    amount: Set(units("amount", payment.amount)?),
                    payment_method: Set(payment.method.clone()),
                    payment_status: Set(payment.status.as_str().to_string()),
                })
                .exec_without_returning(db)
                .await?;
            }
            PendingWrite::Address(address) => {
                Addresses::insert(addresses::ActiveModel {
                    id: Set(address.id),
                    user_id: Set(address.user_id),
                    address_line1: Set(address.line1.clone()),
                    address_line2: Set(address.line2.clone()),
                    city: Set(address.city.clone()),
                    state: Set(address.state.clone()),
                    postal_code: Set(address.postal_code.clone()),
                    country: Set(address.country.clone()),
                })
                .exec_without_returning(db)
                .await?;
            }
            PendingWrite::Wishlist(wishlist) => {
                Wishlists::insert(wishlists::ActiveModel {
                    id: Set(wishlist.id),
                    user_id: Set(wishlist.user_id),
                })
                .exec_without_returning(db)
                .await?;
                if !wishlist.items().is_empty() {
                    WishlistItems::insert_many(wishlist.items().iter().map(|item| {
                        wishlist_items::ActiveModel {
                            id: Set(item.id),
                            wishlist_id: Set(item.wishlist_id),
                            product_id: Set(item.product_id),
                        }
                    }))
                    .exec_without_returning(db)
                    .await?;
                }
            }
            PendingWrite::Review(review) => {
                Reviews::insert(reviews::ActiveModel {
                    id: Set(review.id),
                    product_id: Set(review.product_id),
                    user_id: Set(review.user_id),
                    rating: Set(review.rating),
                    comment: Set(review.comment.clone()),
                    created_at: Set(review.created_at.into()),
                })
                .exec_without_returning(db)
                .await?;
            }
            PendingWrite::OrderStatus { order_id, status } => {
                let result = Orders::update_many()
                    .col_expr(orders::Column::Status, Expr::value(status.as_str()))
                    .filter(orders::Column::Id.eq(*order_id))
                    .exec(db)
                    .await?;
                if result.rows_affected == 0 {
                    return Err(DbErr::RecordNotUpdated);
                }
            }
        }
        Ok(())
    }
}

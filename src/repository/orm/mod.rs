use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityName, EntityTrait, ModelTrait,
    PaginatorTrait, PrimaryKeyTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::LikeExpr,
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{OrderWithPayment, OrderWithProducts, OrderWithUserAndItems},
        users::UserWithOrders,
    },
    entity::{
        Addresses, CartItems, Carts, Categories, OrderItems, Orders, Payments, Products, Reviews,
        Users, WishlistItems, Wishlists, addresses, cart_items, categories, order_items, orders,
        payments, products, reviews, users, wishlist_items, wishlists,
    },
    error::{AppError, AppResult},
    models::{Address, Cart, Category, Order, OrderStatus, Payment, Product, Review, User, Wishlist},
    money::from_minor_units,
    repository::Repository,
};

mod reads;
mod writes;

use reads::{
    address_from_entity, cart_from_entity, load_orders, load_users, order_from_entity,
    payment_from_entity, product_from_entity, review_from_entity, user_from_entity,
    wishlist_from_entity,
};
use writes::PendingWrite;

/// Repository backed by a sea-orm connection (Postgres or SQLite).
///
/// Staged writes are held in memory and replayed inside one transaction on
/// `save`. Reads always go to the database, so they only see committed rows.
pub struct OrmRepository {
    conn: DatabaseConnection,
    pending: Vec<PendingWrite>,
}

impl OrmRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            conn,
            pending: Vec::new(),
        }
    }

    fn stage(&mut self, write: PendingWrite) {
        tracing::debug!(write = write.describe(), pending = self.pending.len() + 1, "staged");
        self.pending.push(write);
    }

    /// Fails when a row with `id` is already staged or committed in `E`'s table.
    async fn ensure_new<E>(&self, id: Uuid) -> AppResult<()>
    where
        E: EntityTrait,
        E::Model: Sync,
        <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
    {
        let entity = E::default();
        let table = entity.table_name();
        let staged = self
            .pending
            .iter()
            .any(|w| w.inserted() == Some((table, id)));
        if staged || E::find_by_id(id).count(&self.conn).await? > 0 {
            return Err(AppError::constraint(format!("{table} row {id} already exists")));
        }
        Ok(())
    }

    async fn require_user(&self, id: Uuid) -> AppResult<()> {
        let staged = self
            .pending
            .iter()
            .any(|w| matches!(w, PendingWrite::User(u) if u.id == id));
        if staged || Users::find_by_id(id).count(&self.conn).await? > 0 {
            return Ok(());
        }
        Err(AppError::constraint(format!("user {id} does not exist")))
    }

    async fn require_products(&self, ids: impl IntoIterator<Item = Uuid>) -> AppResult<()> {
        let mut missing: Vec<Uuid> = ids
            .into_iter()
            .filter(|id| {
                !self
                    .pending
                    .iter()
                    .any(|w| matches!(w, PendingWrite::Product(p) if p.id == *id))
            })
            .collect();
        missing.sort();
        missing.dedup();
        if missing.is_empty() {
            return Ok(());
        }

        let found: Vec<Uuid> = Products::find()
            .select_only()
            .column(products::Column::Id)
            .filter(products::Column::Id.is_in(missing.clone()))
            .into_tuple()
            .all(&self.conn)
            .await?;
        match missing.iter().find(|id| !found.contains(id)) {
            Some(id) => Err(AppError::constraint(format!("product {id} does not exist"))),
            None => Ok(()),
        }
    }

    /// Status and total of an order, looking at staged writes first.
    async fn order_state(&self, order_id: Uuid) -> AppResult<Option<(OrderStatus, Decimal)>> {
        let mut status = None;
        for write in self.pending.iter().rev() {
            match write {
                PendingWrite::OrderStatus { order_id: id, status: s } if *id == order_id => {
                    status = status.or(Some(*s));
                }
                PendingWrite::Order(order) if order.id == order_id => {
                    return Ok(Some((status.unwrap_or(order.status), order.total_amount())));
                }
                _ => {}
            }
        }

        let Some(model) = Orders::find_by_id(order_id).one(&self.conn).await? else {
            return Ok(None);
        };
        let stored = model.status.parse::<OrderStatus>()?;
        Ok(Some((
            status.unwrap_or(stored),
            from_minor_units(model.total_amount),
        )))
    }
}

impl Repository for OrmRepository {
    async fn add_user(&mut self, user: User) -> AppResult<Uuid> {
        user.validate()?;
        self.ensure_new::<Users>(user.id).await?;
        let clash = |username: &str, email: &str| {
            if username == user.username {
                Some("username")
            } else if email == user.email {
                Some("email")
            } else {
                None
            }
        };

        let staged = self.pending.iter().find_map(|w| match w {
            PendingWrite::User(u) => clash(&u.username, &u.email),
            _ => None,
        });
        let field = match staged {
            Some(field) => Some(field),
            None => Users::find()
                .filter(
                    Condition::any()
                        .add(users::Column::Username.eq(user.username.as_str()))
                        .add(users::Column::Email.eq(user.email.as_str())),
                )
                .one(&self.conn)
                .await?
                .and_then(|u| clash(&u.username, &u.email)),
        };
        if let Some(field) = field {
            return Err(AppError::constraint(format!("{field} is already taken")));
        }

        let id = user.id;
        self.stage(PendingWrite::User(user));
        Ok(id)
    }

    async fn add_category(&mut self, category: Category) -> AppResult<Uuid> {
        category.validate()?;
        self.ensure_new::<Categories>(category.id).await?;
        let staged = self
            .pending
            .iter()
            .any(|w| matches!(w, PendingWrite::Category(c) if c.name == category.name));
        if staged
            || Categories::find()
                .filter(categories::Column::Name.eq(category.name.as_str()))
                .count(&self.conn)
                .await?
                > 0
        {
            return Err(AppError::constraint(format!(
                "category {:?} already exists",
                category.name
            )));
        }
        let id = category.id;
        self.stage(PendingWrite::Category(category));
        Ok(id)
    }

    async fn add_product(&mut self, product: Product) -> AppResult<Uuid> {
        product.validate()?;
        self.ensure_new::<Products>(product.id).await?;
        if let Some(category_id) = product.category_id {
            let staged = self
                .pending
                .iter()
                .any(|w| matches!(w, PendingWrite::Category(c) if c.id == category_id));
            if !staged && Categories::find_by_id(category_id).count(&self.conn).await? == 0 {
                return Err(AppError::constraint(format!(
                    "category {category_id} does not exist"
                )));
            }
        }
        let id = product.id;
        self.stage(PendingWrite::Product(product));
        Ok(id)
    }

    async fn add_cart(&mut self, cart: Cart) -> AppResult<Uuid> {
        cart.validate()?;
        self.ensure_new::<Carts>(cart.id).await?;
        self.require_user(cart.user_id).await?;
        self.require_products(cart.items().iter().map(|i| i.product_id))
            .await?;
        let id = cart.id;
        self.stage(PendingWrite::Cart(cart));
        Ok(id)
    }

    async fn add_order(&mut self, order: Order) -> AppResult<Uuid> {
        order.validate()?;
        self.ensure_new::<Orders>(order.id).await?;
        self.require_user(order.user_id).await?;
        self.require_products(order.items().iter().map(|i| i.product_id))
            .await?;
        let id = order.id;
        self.stage(PendingWrite::Order(order));
        Ok(id)
    }

    async fn add_payment(&mut self, payment: Payment) -> AppResult<Uuid> {
        payment.validate()?;
        self.ensure_new::<Payments>(payment.id).await?;
        let Some((_, total)) = self.order_state(payment.order_id).await? else {
            return Err(AppError::constraint(format!(
                "order {} does not exist",
                payment.order_id
            )));
        };

        let staged = self
            .pending
            .iter()
            .any(|w| matches!(w, PendingWrite::Payment(p) if p.order_id == payment.order_id));
        if staged
            || Payments::find()
                .filter(payments::Column::OrderId.eq(payment.order_id))
                .count(&self.conn)
                .await?
                > 0
        {
            return Err(AppError::constraint(format!(
                "order {} already has a payment",
                payment.order_id
            )));
        }

        if payment.amount != total {
            return Err(AppError::constraint(format!(
                "payment amount {} does not match order total {total}",
                payment.amount
            )));
        }

        let id = payment.id;
        self.stage(PendingWrite::Payment(payment));
        Ok(id)
    }

    async fn add_address(&mut self, address: Address) -> AppResult<Uuid> {
        address.validate()?;
        self.ensure_new::<Addresses>(address.id).await?;
        self.require_user(address.user_id).await?;
        let id = address.id;
        self.stage(PendingWrite::Address(address));
        Ok(id)
    }

    async fn add_wishlist(&mut self, wishlist: Wishlist) -> AppResult<Uuid> {
        wishlist.validate()?;
        self.ensure_new::<Wishlists>(wishlist.id).await?;
        self.require_user(wishlist.user_id).await?;
        let staged = self
            .pending
            .iter()
            .any(|w| matches!(w, PendingWrite::Wishlist(existing) if existing.user_id == wishlist.user_id));
        if staged
            || Wishlists::find()
                .filter(wishlists::Column::UserId.eq(wishlist.user_id))
                .count(&self.conn)
                .await?
                > 0
        {
            return Err(AppError::constraint(format!(
                "user {} already has a wishlist",
                wishlist.user_id
            )));
        }
        self.require_products(wishlist.items().iter().map(|i| i.product_id))
            .await?;
        let id = wishlist.id;
        self.stage(PendingWrite::Wishlist(wishlist));
        Ok(id)
    }

    async fn add_review(&mut self, review: Review) -> AppResult<Uuid> {
        review.validate()?;
        self.ensure_new::<Reviews>(review.id).await?;
        self.require_products([review.product_id]).await?;
        self.require_user(review.user_id).await?;
        let id = review.id;
        self.stage(PendingWrite::Review(review));
        Ok(id)
    }

    async fn update_order_status(&mut self, order_id: Uuid, status: OrderStatus) -> AppResult<()> {
        let Some((current, _)) = self.order_state(order_id).await? else {
            return Err(AppError::constraint(format!("order {order_id} does not exist")));
        };
        let status = current.transition_to(status)?;
        self.stage(PendingWrite::OrderStatus { order_id, status });
        Ok(())
    }

    async fn save(&mut self) -> AppResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let txn = self.conn.begin().await?;
        for write in &self.pending {
            if let Err(err) = write.apply(&txn).await {
                tracing::warn!(error = %err, write = write.describe(), "save failed, rolling back");
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                return Err(err.into());
            }
        }
        txn.commit().await?;

        let committed = self.pending.len();
        self.pending.clear();
        tracing::info!(writes = committed, "changes saved");
        Ok(committed)
    }

    fn discard(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    fn pending(&self) -> usize {
        self.pending.len()
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(Users::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(user_from_entity))
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await?
            .map(user_from_entity))
    }

    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(Products::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(product_from_entity))
    }

    async fn find_user_with_orders(&self, id: Uuid) -> AppResult<Option<UserWithOrders>> {
        let Some(user) = Users::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        let orders = Orders::find()
            .filter(orders::Column::UserId.eq(user.id))
            .order_by_asc(orders::Column::OrderDate)
            .order_by_asc(orders::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(Some(UserWithOrders {
            user: user_from_entity(user),
            orders: load_orders(&self.conn, orders).await?,
        }))
    }

    async fn list_users_with_orders(&self) -> AppResult<Vec<UserWithOrders>> {
        let users = Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await?;
        let user_ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let orders = Orders::find()
            .filter(orders::Column::UserId.is_in(user_ids))
            .order_by_asc(orders::Column::OrderDate)
            .order_by_asc(orders::Column::Id)
            .all(&self.conn)
            .await?;

        let mut by_user: HashMap<Uuid, Vec<OrderWithProducts>> = HashMap::new();
        for order in load_orders(&self.conn, orders).await? {
            by_user.entry(order.order.user_id).or_default().push(order);
        }
        Ok(users
            .into_iter()
            .map(|user| UserWithOrders {
                orders: by_user.remove(&user.id).unwrap_or_default(),
                user: user_from_entity(user),
            })
            .collect())
    }

    async fn find_users_by_username_prefix(&self, prefix: &str) -> AppResult<Vec<User>> {
        // SQLite's LIKE ignores case, so the literal check runs again here.
        let pattern = LikeExpr::new(format!("{}%", escape_like(prefix))).escape('\\');
        Ok(Users::find()
            .filter(users::Column::Username.like(pattern))
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .filter(|u| u.username.starts_with(prefix))
            .map(user_from_entity)
            .collect())
    }

    async fn find_order_with_payment(&self, id: Uuid) -> AppResult<Option<OrderWithPayment>> {
        let Some(model) = Orders::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        let items = model
            .find_related(OrderItems)
            .order_by_asc(order_items::Column::Id)
            .all(&self.conn)
            .await?;
        let payment = model
            .find_related(Payments)
            .one(&self.conn)
            .await?
            .map(payment_from_entity)
            .transpose()?;
        Ok(Some(OrderWithPayment {
            order: order_from_entity(model, items)?,
            payment,
        }))
    }

    async fn list_orders_with_user_and_items(&self) -> AppResult<Vec<OrderWithUserAndItems>> {
        let orders = Orders::find()
            .order_by_asc(orders::Column::OrderDate)
            .order_by_asc(orders::Column::Id)
            .all(&self.conn)
            .await?;
        let users = load_users(&self.conn, orders.iter().map(|o| o.user_id).collect()).await?;

        load_orders(&self.conn, orders)
            .await?
            .into_iter()
            .map(|order| {
                let user_id = order.order.user_id;
                let user = users.get(&user_id).cloned().ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "order {} references missing user {user_id}",
                        order.order.id
                    ))
                })?;
                Ok(OrderWithUserAndItems { user, order })
            })
            .collect()
    }

    async fn find_cart(&self, id: Uuid) -> AppResult<Option<Cart>> {
        let cart = Carts::find_by_id(id)
            .find_with_related(CartItems)
            .order_by_asc(cart_items::Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .next()
            .map(|(cart, items)| cart_from_entity(cart, items));
        Ok(cart)
    }

    async fn find_wishlist_for_user(&self, user_id: Uuid) -> AppResult<Option<Wishlist>> {
        let wishlist = Wishlists::find()
            .filter(wishlists::Column::UserId.eq(user_id))
            .find_with_related(WishlistItems)
            .order_by_asc(wishlist_items::Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .next()
            .map(|(wishlist, items)| wishlist_from_entity(wishlist, items));
        Ok(wishlist)
    }

    async fn list_addresses_for_user(&self, user_id: Uuid) -> AppResult<Vec<Address>> {
        Ok(Addresses::find()
            .filter(addresses::Column::UserId.eq(user_id))
            .order_by_asc(addresses::Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(address_from_entity)
            .collect())
    }

    async fn list_reviews_for_product(&self, product_id: Uuid) -> AppResult<Vec<Review>> {
        Ok(Reviews::find()
            .filter(reviews::Column::ProductId.eq(product_id))
            .order_by_asc(reviews::Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(review_from_entity)
            .collect())
    }
}

/// Escapes LIKE metacharacters so `value` matches literally under a backslash `ESCAPE`.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

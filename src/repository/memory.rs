use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{
    dto::{
        orders::{OrderWithPayment, OrderWithProducts, OrderWithUserAndItems, distinct_products},
        users::UserWithOrders,
    },
    error::{AppError, AppResult},
    models::{Address, Cart, Category, Order, OrderStatus, Payment, Product, Review, User, Wishlist},
    repository::Repository,
};

/// One map per table, keyed by id. Ids are time ordered, so iteration order
/// is insertion order.
#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    categories: BTreeMap<Uuid, Category>,
    products: BTreeMap<Uuid, Product>,
    carts: BTreeMap<Uuid, Cart>,
    orders: BTreeMap<Uuid, Order>,
    payments: BTreeMap<Uuid, Payment>,
    addresses: BTreeMap<Uuid, Address>,
    wishlists: BTreeMap<Uuid, Wishlist>,
    reviews: BTreeMap<Uuid, Review>,
}

impl Tables {
    fn require_user(&self, id: Uuid) -> AppResult<()> {
        if !self.users.contains_key(&id) {
            return Err(AppError::constraint(format!("user {id} does not exist")));
        }
        Ok(())
    }

    fn require_product(&self, id: Uuid) -> AppResult<()> {
        if !self.products.contains_key(&id) {
            return Err(AppError::constraint(format!("product {id} does not exist")));
        }
        Ok(())
    }

    fn require_order(&self, id: Uuid) -> AppResult<&Order> {
        self.orders
            .get(&id)
            .ok_or_else(|| AppError::constraint(format!("order {id} does not exist")))
    }

    fn order_with_products(&self, order: &Order) -> OrderWithProducts {
        let products = distinct_products(
            order
                .items()
                .iter()
                .filter_map(|item| self.products.get(&item.product_id).cloned()),
        );
        OrderWithProducts {
            order: order.clone(),
            products,
        }
    }

    fn sorted_orders<'a>(&'a self, filter: impl Fn(&Order) -> bool) -> Vec<&'a Order> {
        let mut orders: Vec<&Order> = self.orders.values().filter(|o| filter(o)).collect();
        orders.sort_by_key(|o| (o.order_date, o.id));
        orders
    }

    fn user_with_orders(&self, user: &User) -> UserWithOrders {
        let orders = self
            .sorted_orders(|o| o.user_id == user.id)
            .into_iter()
            .map(|o| self.order_with_products(o))
            .collect();
        UserWithOrders {
            user: user.clone(),
            orders,
        }
    }
}

fn ensure_new<T>(table: &BTreeMap<Uuid, T>, id: Uuid, what: &str) -> AppResult<()> {
    if table.contains_key(&id) {
        return Err(AppError::constraint(format!("{what} {id} already exists")));
    }
    Ok(())
}

/// Arena-style store kept entirely in memory.
///
/// Staged writes go to a copy of the committed tables; `save` swaps the copy
/// in, `discard` throws it away.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    committed: Tables,
    staged: Option<Tables>,
    pending: usize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed plus staged state, used for validation.
    fn view(&self) -> &Tables {
        self.staged.as_ref().unwrap_or(&self.committed)
    }

    fn stage(&mut self, write: impl FnOnce(&mut Tables)) {
        let tables = self.staged.get_or_insert_with(|| self.committed.clone());
        write(tables);
        self.pending += 1;
    }
}

impl Repository for MemoryRepository {
    async fn add_user(&mut self, user: User) -> AppResult<Uuid> {
        user.validate()?;
        let view = self.view();
        ensure_new(&view.users, user.id, "user")?;
        if let Some(existing) = view
            .users
            .values()
            .find(|u| u.username == user.username || u.email == user.email)
        {
            let field = if existing.username == user.username {
                "username"
            } else {
                "email"
            };
            return Err(AppError::constraint(format!("{field} is already taken")));
        }
        let id = user.id;
        tracing::debug!(user_id = %id, "staging user");
        self.stage(|t| {
            t.users.insert(id, user);
        });
        Ok(id)
    }

    async fn add_category(&mut self, category: Category) -> AppResult<Uuid> {
        category.validate()?;
        let view = self.view();
        ensure_new(&view.categories, category.id, "category")?;
        if view.categories.values().any(|c| c.name == category.name) {
            return Err(AppError::constraint(format!(
                "category {:?} already exists",
                category.name
            )));
        }
        let id = category.id;
        self.stage(|t| {
            t.categories.insert(id, category);
        });
        Ok(id)
    }

    async fn add_product(&mut self, product: Product) -> AppResult<Uuid> {
        product.validate()?;
        let view = self.view();
        ensure_new(&view.products, product.id, "product")?;
        if let Some(category_id) = product.category_id
            && !view.categories.contains_key(&category_id)
        {
            return Err(AppError::constraint(format!(
                "category {category_id} does not exist"
            )));
        }
        let id = product.id;
        tracing::debug!(product_id = %id, "staging product");
        self.stage(|t| {
            t.products.insert(id, product);
        });
        Ok(id)
    }

    async fn add_cart(&mut self, cart: Cart) -> AppResult<Uuid> {
        cart.validate()?;
        let view = self.view();
        ensure_new(&view.carts, cart.id, "cart")?;
        view.require_user(cart.user_id)?;
        for item in cart.items() {
            view.require_product(item.product_id)?;
        }
        let id = cart.id;
        self.stage(|t| {
            t.carts.insert(id, cart);
        });
        Ok(id)
    }

    async fn add_order(&mut self, order: Order) -> AppResult<Uuid> {
        order.validate()?;
        let view = self.view();
        ensure_new(&view.orders, order.id, "order")?;
        view.require_user(order.user_id)?;
        for item in order.items() {
            view.require_product(item.product_id)?;
        }
        let id = order.id;
        tracing::debug!(order_id = %id, items = order.items().len(), "staging order");
        self.stage(|t| {
            t.orders.insert(id, order);
        });
        Ok(id)
    }

    async fn add_payment(&mut self, payment: Payment) -> AppResult<Uuid> {
        payment.validate()?;
        let view = self.view();
        ensure_new(&view.payments, payment.id, "payment")?;
        let order = view.require_order(payment.order_id)?;
        if view.payments.values().any(|p| p.order_id == payment.order_id) {
            return Err(AppError::constraint(format!(
                "order {} already has a payment",
                payment.order_id
            )));
        }
        let total = order.total_amount();
        if payment.amount != total {
            return Err(AppError::constraint(format!(
                "payment amount {} does not match order total {total}",
                payment.amount
            )));
        }
        let id = payment.id;
        self.stage(|t| {
            t.payments.insert(id, payment);
        });
        Ok(id)
    }

    async fn add_address(&mut self, address: Address) -> AppResult<Uuid> {
        address.validate()?;
        let view = self.view();
        ensure_new(&view.addresses, address.id, "address")?;
        view.require_user(address.user_id)?;
        let id = address.id;
        self.stage(|t| {
            t.addresses.insert(id, address);
        });
        Ok(id)
    }

    async fn add_wishlist(&mut self, wishlist: Wishlist) -> AppResult<Uuid> {
        wishlist.validate()?;
        let view = self.view();
        ensure_new(&view.wishlists, wishlist.id, "wishlist")?;
        view.require_user(wishlist.user_id)?;
        if view.wishlists.values().any(|w| w.user_id == wishlist.user_id) {
            return Err(AppError::constraint(format!(
                "user {} already has a wishlist",
                wishlist.user_id
            )));
        }
        for item in wishlist.items() {
            view.require_product(item.product_id)?;
        }
        let id = wishlist.id;
        self.stage(|t| {
            t.wishlists.insert(id, wishlist);
        });
        Ok(id)
    }

    async fn add_review(&mut self, review: Review) -> AppResult<Uuid> {
        review.validate()?;
        let view = self.view();
        ensure_new(&view.reviews, review.id, "review")?;
        view.require_product(review.product_id)?;
        view.require_user(review.user_id)?;
        let id = review.id;
        self.stage(|t| {
            t.reviews.insert(id, review);
        });
        Ok(id)
    }

    async fn update_order_status(&mut self, order_id: Uuid, status: OrderStatus) -> AppResult<()> {
        let current = self.view().require_order(order_id)?.status;
        let next = current.transition_to(status)?;
        tracing::debug!(order_id = %order_id, from = %current, to = %next, "staging status change");
        self.stage(|t| {
            if let Some(order) = t.orders.get_mut(&order_id) {
                order.status = next;
            }
        });
        Ok(())
    }

    async fn save(&mut self) -> AppResult<usize> {
        let committed = self.pending;
        if let Some(tables) = self.staged.take() {
            self.committed = tables;
        }
        self.pending = 0;
        tracing::info!(writes = committed, "changes saved");
        Ok(committed)
    }

    fn discard(&mut self) -> usize {
        self.staged = None;
        std::mem::take(&mut self.pending)
    }

    fn pending(&self) -> usize {
        self.pending
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.committed.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .committed
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.committed.products.get(&id).cloned())
    }

    async fn find_user_with_orders(&self, id: Uuid) -> AppResult<Option<UserWithOrders>> {
        let tables = &self.committed;
        Ok(tables.users.get(&id).map(|user| tables.user_with_orders(user)))
    }

    async fn list_users_with_orders(&self) -> AppResult<Vec<UserWithOrders>> {
        let tables = &self.committed;
        Ok(tables
            .users
            .values()
            .map(|user| tables.user_with_orders(user))
            .collect())
    }

    async fn find_users_by_username_prefix(&self, prefix: &str) -> AppResult<Vec<User>> {
        Ok(self
            .committed
            .users
            .values()
            .filter(|u| u.username.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn find_order_with_payment(&self, id: Uuid) -> AppResult<Option<OrderWithPayment>> {
        let tables = &self.committed;
        Ok(tables.orders.get(&id).map(|order| OrderWithPayment {
            order: order.clone(),
            payment: tables
                .payments
                .values()
                .find(|p| p.order_id == order.id)
                .cloned(),
        }))
    }

    async fn list_orders_with_user_and_items(&self) -> AppResult<Vec<OrderWithUserAndItems>> {
        let tables = &self.committed;
        tables
            .sorted_orders(|_| true)
            .into_iter()
            .map(|order| {
                let user = tables.users.get(&order.user_id).cloned().ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "order {} references missing user {}",
                        order.id,
                        order.user_id
                    ))
                })?;
                Ok(OrderWithUserAndItems {
                    user,
                    order: tables.order_with_products(order),
                })
            })
            .collect()
    }

    async fn find_cart(&self, id: Uuid) -> AppResult<Option<Cart>> {
        Ok(self.committed.carts.get(&id).cloned())
    }

    async fn find_wishlist_for_user(&self, user_id: Uuid) -> AppResult<Option<Wishlist>> {
        Ok(self
            .committed
            .wishlists
            .values()
            .find(|w| w.user_id == user_id)
            .cloned())
    }

    async fn list_addresses_for_user(&self, user_id: Uuid) -> AppResult<Vec<Address>> {
        Ok(self
            .committed
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_reviews_for_product(&self, product_id: Uuid) -> AppResult<Vec<Review>> {
        Ok(self
            .committed
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect())
    }
}

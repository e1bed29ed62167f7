//! The unit-of-work boundary between callers and storage.
//!
//! `add_*` calls run the aggregate's own `validate`, then check it against
//! committed plus staged state and stage it whole or not at all. Nothing is visible to reads until
//! [`Repository::save`] commits every staged write in one transaction.

use uuid::Uuid;

use crate::{
    dto::{
        orders::{OrderWithPayment, OrderWithUserAndItems},
        users::UserWithOrders,
    },
    error::AppResult,
    models::{Address, Cart, Category, Order, OrderStatus, Payment, Product, Review, User, Wishlist},
};

pub mod memory;
pub mod orm;

pub use memory::MemoryRepository;
pub use orm::OrmRepository;

pub trait Repository {
    async fn add_user(&mut self, user: User) -> AppResult<Uuid>;
    async fn add_category(&mut self, category: Category) -> AppResult<Uuid>;
    async fn add_product(&mut self, product: Product) -> AppResult<Uuid>;
    async fn add_cart(&mut self, cart: Cart) -> AppResult<Uuid>;
    /// Stages the order together with its items.
    async fn add_order(&mut self, order: Order) -> AppResult<Uuid>;
    /// The amount must equal the order total and the order must not be paid yet.
    async fn add_payment(&mut self, payment: Payment) -> AppResult<Uuid>;
    async fn add_address(&mut self, address: Address) -> AppResult<Uuid>;
    async fn add_wishlist(&mut self, wishlist: Wishlist) -> AppResult<Uuid>;
    async fn add_review(&mut self, review: Review) -> AppResult<Uuid>;
    async fn update_order_status(&mut self, order_id: Uuid, status: OrderStatus) -> AppResult<()>;

    /// Commits all staged writes and returns how many there were. On error
    /// nothing is committed and the staged writes are kept for a retry.
    async fn save(&mut self) -> AppResult<usize>;
    /// Drops staged writes, returning how many were dropped.
    fn discard(&mut self) -> usize;
    fn pending(&self) -> usize;

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;
    /// Exact, case-sensitive match.
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>>;
    /// The user with orders, their items and the ordered products.
    async fn find_user_with_orders(&self, id: Uuid) -> AppResult<Option<UserWithOrders>>;
    async fn list_users_with_orders(&self) -> AppResult<Vec<UserWithOrders>>;
    /// Literal, case-sensitive prefix match; `%` and `_` are not wildcards.
    async fn find_users_by_username_prefix(&self, prefix: &str) -> AppResult<Vec<User>>;
    async fn find_order_with_payment(&self, id: Uuid) -> AppResult<Option<OrderWithPayment>>;
    /// Every order with its user and items, oldest first.
    async fn list_orders_with_user_and_items(&self) -> AppResult<Vec<OrderWithUserAndItems>>;
    async fn find_cart(&self, id: Uuid) -> AppResult<Option<Cart>>;
    async fn find_wishlist_for_user(&self, user_id: Uuid) -> AppResult<Option<Wishlist>>;
    async fn list_addresses_for_user(&self, user_id: Uuid) -> AppResult<Vec<Address>>;
    async fn list_reviews_for_product(&self, product_id: Uuid) -> AppResult<Vec<Review>>;
}

use serde::Serialize;

use crate::{dto::orders::OrderWithProducts, models::User};

/// A user with every order eagerly loaded down to the ordered products.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithOrders {
    pub user: User,
    pub orders: Vec<OrderWithProducts>,
}

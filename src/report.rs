use uuid::Uuid;

use crate::{
    dto::{
        orders::{OrderWithPayment, OrderWithUserAndItems},
        users::UserWithOrders,
    },
    error::AppResult,
    models::User,
    repository::Repository,
};

/// Everything the demo reads back after seeding.
#[derive(Debug, Clone)]
pub struct Report {
    pub users: Vec<UserWithOrders>,
    pub orders: Vec<OrderWithUserAndItems>,
    pub user: Option<UserWithOrders>,
    pub order: Option<OrderWithPayment>,
    pub users_starting_with_a: Vec<User>,
}

impl Report {
    /// The console lines the demo prints.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.orders.iter().map(order_line).collect();

        let (name, count) = match &self.user {
            Some(u) => (u.user.username.as_str(), u.orders.len().to_string()),
            None => ("", String::new()),
        };
        lines.push(format!("User: {name}, Orders: {count}"));

        if let Some(OrderWithPayment {
            order,
            payment: Some(payment),
        }) = &self.order
        {
            lines.push(format!(
                "Order {} has payment of {:.2} via {}",
                order.id, payment.amount, payment.method
            ));
        }

        lines.push(format!(
            "Users starting with \"A\": {}",
            self.users_starting_with_a.len()
        ));
        lines
    }
}

fn order_line(entry: &OrderWithUserAndItems) -> String {
    let items: Vec<String> = entry
        .order
        .lines()
        .map(|(item, product)| format!("{} (x{})", product.name, item.quantity))
        .collect();
    format!(
        "Order {} - ordered by {} with items: {}",
        entry.order_id(),
        entry.user.username,
        items.join(", ")
    )
}

/// Runs the demo queries. `user_id` and `order_id` pick the single-entity
/// lookups; the first user and first order are used when they are `None`.
pub async fn read_data<R: Repository>(
    repo: &R,
    user_id: Option<Uuid>,
    order_id: Option<Uuid>,
) -> AppResult<Report> {
    let users = repo.list_users_with_orders().await?;
    let orders = repo.list_orders_with_user_and_items().await?;

    let user = match user_id.or_else(|| users.first().map(|u| u.user.id)) {
        Some(id) => repo.find_user_with_orders(id).await?,
        None => None,
    };
    let order = match order_id.or_else(|| orders.first().map(|o| o.order_id())) {
        Some(id) => repo.find_order_with_payment(id).await?,
        None => None,
    };
    let users_starting_with_a = repo.find_users_by_username_prefix("A").await?;

    Ok(Report {
        users,
        orders,
        user,
        order,
        users_starting_with_a,
    })
}

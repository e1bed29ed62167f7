use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Order, OrderItem, Payment, Product, User};

/// An order aggregate plus the distinct products its items point at.
///
/// Items keep `product_id` as a plain key; [`OrderWithProducts::product_for`]
/// resolves it against the loaded products.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithProducts {
    pub order: Order,
    pub products: Vec<Product>,
}

impl OrderWithProducts {
    pub fn product_for(&self, item: &OrderItem) -> Option<&Product> {
        self.products.iter().find(|p| p.id == item.product_id)
    }

    /// Items paired with their products, in item order. Items whose product
    /// was not loaded are skipped.
    pub fn lines(&self) -> impl Iterator<Item = (&OrderItem, &Product)> {
        self.order
            .items()
            .iter()
            .filter_map(|item| self.product_for(item).map(|product| (item, product)))
    }

    pub fn total_amount(&self) -> Decimal {
        self.order.total_amount()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithPayment {
    pub order: Order,
    pub payment: Option<Payment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithUserAndItems {
    pub user: User,
    pub order: OrderWithProducts,
}

impl OrderWithUserAndItems {
    pub fn order_id(&self) -> Uuid {
        self.order.order.id
    }
}

/// Keeps the first occurrence of every product id.
pub(crate) fn distinct_products(products: impl IntoIterator<Item = Product>) -> Vec<Product> {
    let mut out: Vec<Product> = Vec::new();
    for product in products {
        if !out.iter().any(|p| p.id == product.id) {
            out.push(product);
        }
    }
    out
}

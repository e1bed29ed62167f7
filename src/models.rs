//! Domain entities. Plain data, no persistence logic.
//!
//! Ids are assigned here, at construction, so an aggregate can be staged and
//! referenced before it is committed. Children hold their parent's id as a
//! plain foreign key; nothing points back at its parent.
//!
//! Fields are public, so every model also has a `validate` that the
//! repositories run before staging. Deserialization goes through the same
//! check.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ValidationError, money};

fn new_id() -> Uuid {
    Uuid::now_v7()
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

fn require_amount(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount { field, value });
    }
    if money::to_minor_units(value).is_none() {
        return Err(ValidationError::AmountOutOfRange { field, value });
    }
    Ok(())
}

fn require_quantity(quantity: i32) -> Result<(), ValidationError> {
    if quantity < 1 {
        return Err(ValidationError::Quantity(quantity));
    }
    Ok(())
}

/// Deserializes `$model` through a field-for-field mirror and rejects the
/// result unless `validate` passes.
macro_rules! validated_deserialize {
    ($model:ident from $fields:ident { $($field:ident: $ty:ty),* $(,)? }) => {
        #[derive(Deserialize)]
        struct $fields {
            $($field: $ty),*
        }

        impl TryFrom<$fields> for $model {
            type Error = ValidationError;

            fn try_from(fields: $fields) -> Result<Self, Self::Error> {
                let model = $model {
                    $($field: fields.$field),*
                };
                model.validate()?;
                Ok(model)
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UserFields")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub registered_at: DateTime<Utc>,
}

validated_deserialize!(User from UserFields {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    registered_at: DateTime<Utc>,
});

impl User {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let user = Self {
            id: new_id(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            registered_at: Utc::now(),
        };
        user.validate()?;
        Ok(user)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("username", &self.username)?;
        require("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(ValidationError::Email(self.email.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CategoryFields")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

validated_deserialize!(Category from CategoryFields { id: Uuid, name: String });

impl Category {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let category = Self {
            id: new_id(),
            name: name.into(),
        };
        category.validate()?;
        Ok(category)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("category name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProductFields")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: Option<Uuid>,
}

validated_deserialize!(Product from ProductFields {
    id: Uuid,
    name: String,
    description: String,
    price: Decimal,
    stock_quantity: i32,
    category_id: Option<Uuid>,
});

impl Product {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Decimal,
        stock_quantity: i32,
    ) -> Result<Self, ValidationError> {
        let product = Self {
            id: new_id(),
            name: name.into(),
            description: description.into(),
            price,
            stock_quantity,
            category_id: None,
        };
        product.validate()?;
        Ok(product)
    }

    pub fn in_category(mut self, category: &Category) -> Self {
        self.category_id = Some(category.id);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("product name", &self.name)?;
        require_amount("price", self.price)?;
        if self.stock_quantity < 0 {
            return Err(ValidationError::NegativeCount {
                field: "stock quantity",
                value: self.stock_quantity,
            });
        }
        Ok(())
    }
}

/// A line in a cart. The total is priced once, when the product is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CartFields")]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    items: Vec<CartItem>,
}

validated_deserialize!(Cart from CartFields {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    items: Vec<CartItem>,
});

impl Cart {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: new_id(),
            user_id,
            created_at: Utc::now(),
            items: Vec::new(),
        }
    }

    pub(crate) fn restore(
        id: Uuid,
        user_id: Uuid,
        created_at: DateTime<Utc>,
        items: Vec<CartItem>,
    ) -> Self {
        Self {
            id,
            user_id,
            created_at,
            items,
        }
    }

    pub fn add_item(&mut self, product: &Product, quantity: i32) -> Result<&CartItem, ValidationError> {
        require_quantity(quantity)?;
        let total_price = product.price * Decimal::from(quantity);
        require_amount("cart item total", total_price)?;
        self.items.push(CartItem {
            id: new_id(),
            cart_id: self.id,
            product_id: product.id,
            quantity,
            total_price,
        });
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(|item| item.total_price).sum()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for item in &self.items {
            require_quantity(item.quantity)?;
            require_amount("cart item total", item.total_price)?;
        }
        require_amount("cart total", self.total_amount())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Shipped, OrderStatus::Cancelled)
        )
    }

    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, ValidationError> {
        if !self.can_transition_to(next) {
            return Err(ValidationError::StatusTransition {
                from: self.to_string(),
                to: next.to_string(),
            });
        }
        Ok(next)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(anyhow::anyhow!("unknown order status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Unit price captured when the order was placed.
    pub price: Decimal,
}

impl OrderItem {
    pub fn total_price(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OrderFields")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub shipping_address: String,
    pub status: OrderStatus,
    items: Vec<OrderItem>,
}

validated_deserialize!(Order from OrderFields {
    id: Uuid,
    user_id: Uuid,
    order_date: DateTime<Utc>,
    shipping_address: String,
    status: OrderStatus,
    items: Vec<OrderItem>,
});

impl Order {
    pub fn new(user_id: Uuid, shipping_address: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            user_id,
            order_date: Utc::now(),
            shipping_address: shipping_address.into(),
            status: OrderStatus::Pending,
            items: Vec::new(),
        }
    }

    pub(crate) fn restore(
        id: Uuid,
        user_id: Uuid,
        order_date: DateTime<Utc>,
        shipping_address: String,
        status: OrderStatus,
        items: Vec<OrderItem>,
    ) -> Self {
        Self {
            id,
            user_id,
            order_date,
            shipping_address,
            status,
            items,
        }
    }

    /// Adds a line priced at the product's current price.
    pub fn add_item(&mut self, product: &Product, quantity: i32) -> Result<&OrderItem, ValidationError> {
        self.add_item_at_price(product.id, quantity, product.price)
    }

    pub fn add_item_at_price(
        &mut self,
        product_id: Uuid,
        quantity: i32,
        price: Decimal,
    ) -> Result<&OrderItem, ValidationError> {
        require_quantity(quantity)?;
        require_amount("price", price)?;
        let item = OrderItem {
            id: new_id(),
            order_id: self.id,
            product_id,
            quantity,
            price,
        };
        require_amount("order item total", item.total_price())?;
        self.items.push(item);
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(OrderItem::total_price).sum()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for item in &self.items {
            require_quantity(item.quantity)?;
            require_amount("price", item.price)?;
        }
        require_amount("order total", self.total_amount())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Completed" => Ok(PaymentStatus::Completed),
            "Failed" => Ok(PaymentStatus::Failed),
            other => Err(anyhow::anyhow!("unknown payment status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PaymentFields")]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub payment_date: DateTime<Utc>,
    pub amount: Decimal,
    pub method: String,
    pub status: PaymentStatus,
}

validated_deserialize!(Payment from PaymentFields {
    id: Uuid,
    order_id: Uuid,
    payment_date: DateTime<Utc>,
    amount: Decimal,
    method: String,
    status: PaymentStatus,
});

impl Payment {
    pub fn new(
        order_id: Uuid,
        amount: Decimal,
        method: impl Into<String>,
        status: PaymentStatus,
    ) -> Result<Self, ValidationError> {
        let payment = Self {
            id: new_id(),
            order_id,
            payment_date: Utc::now(),
            amount,
            method: method.into(),
            status,
        };
        payment.validate()?;
        Ok(payment)
    }

    /// Pays the full total of `order`.
    pub fn for_order(
        order: &Order,
        method: impl Into<String>,
        status: PaymentStatus,
    ) -> Result<Self, ValidationError> {
        Self::new(order.id, order.total_amount(), method, status)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_amount("amount", self.amount)?;
        require("payment method", &self.method)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AddressFields")]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

validated_deserialize!(Address from AddressFields {
    id: Uuid,
    user_id: Uuid,
    line1: String,
    line2: Option<String>,
    city: String,
    state: String,
    postal_code: String,
    country: String,
});

impl Address {
    pub fn new(
        user_id: Uuid,
        line1: impl Into<String>,
        line2: Option<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let address = Self {
            id: new_id(),
            user_id,
            line1: line1.into(),
            line2: line2.filter(|l| !l.trim().is_empty()),
            city: city.into(),
            state: state.into(),
            postal_code: postal_code.into(),
            country: country.into(),
        };
        address.validate()?;
        Ok(address)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("address line", &self.line1)?;
        require("city", &self.city)?;
        require("country", &self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: Uuid,
    pub wishlist_id: Uuid,
    pub product_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WishlistFields")]
pub struct Wishlist {
    pub id: Uuid,
    pub user_id: Uuid,
    items: Vec<WishlistItem>,
}

validated_deserialize!(Wishlist from WishlistFields {
    id: Uuid,
    user_id: Uuid,
    items: Vec<WishlistItem>,
});

impl Wishlist {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: new_id(),
            user_id,
            items: Vec::new(),
        }
    }

    pub(crate) fn restore(id: Uuid, user_id: Uuid, items: Vec<WishlistItem>) -> Self {
        Self { id, user_id, items }
    }

    pub fn add_product(&mut self, product: &Product) -> Result<&WishlistItem, ValidationError> {
        if self.contains(product.id) {
            return Err(ValidationError::DuplicateWishlistItem(product.id));
        }
        self.items.push(WishlistItem {
            id: new_id(),
            wishlist_id: self.id,
            product_id: product.id,
        });
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn contains(&self, product_id: Uuid) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (i, item) in self.items.iter().enumerate() {
            if self.items[..i].iter().any(|seen| seen.product_id == item.product_id) {
                return Err(ValidationError::DuplicateWishlistItem(item.product_id));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReviewFields")]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

validated_deserialize!(Review from ReviewFields {
    id: Uuid,
    product_id: Uuid,
    user_id: Uuid,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
});

impl Review {
    pub const MIN_RATING: i16 = 1;
    pub const MAX_RATING: i16 = 5;

    pub fn new(
        product_id: Uuid,
        user_id: Uuid,
        rating: i16,
        comment: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let review = Self {
            id: new_id(),
            product_id,
            user_id,
            rating,
            comment: comment.into(),
            created_at: Utc::now(),
        };
        review.validate()?;
        Ok(review)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(Self::MIN_RATING..=Self::MAX_RATING).contains(&self.rating) {
            return Err(ValidationError::Rating(self.rating));
        }
        Ok(())
    }
}

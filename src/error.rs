use rust_decimal::Decimal;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// An invariant rejected before anything reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("{field} must have at most 4 decimal places and fit in 19 digits, got {value}")]
    AmountOutOfRange { field: &'static str, value: Decimal },

    #[error("{field} must not be negative, got {value}")]
    NegativeCount { field: &'static str, value: i32 },

    #[error("quantity must be at least 1, got {0}")]
    Quantity(i32),

    #[error("rating must be between 1 and 5, got {0}")]
    Rating(i16),

    #[error("invalid email address {0:?}")]
    Email(String),

    #[error("product {0} is already in the wishlist")]
    DuplicateWishlistItem(uuid::Uuid),

    #[error("order status cannot change from {from} to {to}")]
    StatusTransition { from: String, to: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Persistence error: {0}")]
    Persistence(DbErr),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn constraint(message: impl Into<String>) -> Self {
        AppError::ConstraintViolation(message.into())
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg))
            | Some(SqlErr::ForeignKeyConstraintViolation(msg)) => AppError::ConstraintViolation(msg),
            _ => AppError::Persistence(err),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

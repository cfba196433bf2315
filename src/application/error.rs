use thiserror::Error;

use crate::domain::{InvalidMobile, ParseAmountError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Mobile number is already registered: {0}")]
    MobileAlreadyRegistered(String),

    #[error("User {0} has no mobile number on file")]
    MobileRequired(String),

    #[error("Shop not found: {0}")]
    ShopNotFound(String),

    #[error("You don't have any shops")]
    NoShops,

    #[error("No borrowing records found for mobile number {0}")]
    NoBorrowingRecords(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] ParseAmountError),

    #[error("{0}")]
    InvalidMobile(#[from] InvalidMobile),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

use thiserror::Error;

/// Every failure the console core can report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Appointment not found: {id}")]
    AppointmentNotFound { id: i64 },

    #[error("No client with phone {phone}")]
    ClientNotFound { phone: String },

    #[error("No monthly plan on record for phone {phone}")]
    PlanNotFound { phone: String },

    #[error("Client {phone} has no active monthly plan")]
    NoActivePlan { phone: String },

    #[error("Appointment {id} cannot {action} while {state}")]
    InvalidTransition {
        id: i64,
        action: &'static str,
        state: String,
    },

    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error("Email already registered: {email}")]
    DuplicateEmail { email: String },

    #[error("Account {id} is protected")]
    ProtectedAccount { id: i64 },

    #[error("Owner access required")]
    AccessDenied,

    #[error("Password hashing failed: {message}")]
    PasswordHash { message: String },

    #[error("Catalog item not found: {name}")]
    CatalogItemNotFound { name: String },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart line not found: {line_id}")]
    CartLineNotFound { line_id: u32 },

    #[error("Insufficient payment: received {received:.2}, total {total:.2}")]
    InsufficientPayment { received: f64, total: f64 },
}

impl From<argon2::password_hash::Error> for Error {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::PasswordHash {
            message: value.to_string(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("caller {0} does not hold the owner role")]
    Unauthorized(String),

    #[error("insufficient balance: have {available}, need {needed}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("arithmetic overflow in token bookkeeping")]
    Overflow,

    #[error("zero amount")]
    ZeroAmount,
}

//! Pre-submission validation of card payment input.
//!
//! Every check is a pure function of its input. `validate_all` runs all of
//! them and reports one error per failing field, so callers can surface every
//! problem at once instead of fixing them one round trip at a time.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::transaction::{TransactionRequest, TransactionType, mask_card_number};

pub const MAX_AMOUNT: Decimal = dec!(999999.99);
pub const CARD_NUMBER_MIN_LEN: usize = 13;
pub const CARD_NUMBER_MAX_LEN: usize = 19;
pub const CARDHOLDER_NAME_MIN_LEN: usize = 3;
pub const CARDHOLDER_NAME_MAX_LEN: usize = 100;

/// Which rule a field violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    MissingField,
    InvalidAmount,
    InvalidCardFormat,
    InvalidDateFormat,
    ExpiredCard,
    InvalidCvv,
    InvalidCardholderName,
}

/// A single field failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }
}

/// Every field failure found in one request, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn contains(&self, kind: ValidationErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    /// Field name to message map for API responses.
    pub fn to_field_map(&self) -> BTreeMap<&'static str, String> {
        self.errors
            .iter()
            .map(|e| (e.field, e.message.clone()))
            .collect()
    }

    fn push<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Card expiry as a month and a four-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryDate {
    pub month: u32,
    pub year: i32,
}

impl ExpiryDate {
    /// Gateway format: `MM` followed by two-digit `YY`.
    pub fn mmyy(&self) -> String {
        format!("{:02}{:02}", self.month, self.year % 100)
    }
}

/// Source of "today" for expiry checks.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => Utc::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

/// Input that has passed every field rule, in normalized form.
///
/// The only way to obtain one is [`validate_all`], so holding a
/// `ValidatedRequest` proves the input is fit to send.
#[derive(Clone)]
pub struct ValidatedRequest {
    terminal_number: String,
    terminal_password: String,
    card_number: String,
    expiry: ExpiryDate,
    cvv: String,
    cardholder_name: String,
    amount: Decimal,
    transaction_type: TransactionType,
}

impl ValidatedRequest {
    pub fn terminal_number(&self) -> &str {
        &self.terminal_number
    }

    pub fn terminal_password(&self) -> &str {
        &self.terminal_password
    }

    /// Card digits with whitespace removed.
    pub fn card_number(&self) -> &str {
        &self.card_number
    }

    pub fn expiry(&self) -> ExpiryDate {
        self.expiry
    }

    pub fn cvv(&self) -> &str {
        &self.cvv
    }

    pub fn cardholder_name(&self) -> &str {
        &self.cardholder_name
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }
}

impl fmt::Debug for ValidatedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedRequest")
            .field("terminal_number", &self.terminal_number)
            .field("card_number", &mask_card_number(&self.card_number))
            .field("expiry", &self.expiry)
            .field("cardholder_name", &self.cardholder_name)
            .field("amount", &self.amount)
            .field("transaction_type", &self.transaction_type)
            .finish_non_exhaustive()
    }
}

pub fn validate_required(field: &'static str, value: &str) -> Result<String, FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::new(
            field,
            ValidationErrorKind::MissingField,
            "must not be empty",
        ));
    }

    Ok(value.to_string())
}

pub fn validate_amount(amount: Decimal) -> Result<Decimal, FieldError> {
    if amount <= Decimal::ZERO {
        return Err(FieldError::new(
            "amount",
            ValidationErrorKind::InvalidAmount,
            "Amount must be a positive number.",
        ));
    }

    if amount > MAX_AMOUNT {
        return Err(FieldError::new(
            "amount",
            ValidationErrorKind::InvalidAmount,
            "Amount exceeds maximum allowed limit.",
        ));
    }

    Ok(amount)
}

/// Strip whitespace and require 13 to 19 digits.
pub fn validate_card_number(card_number: &str) -> Result<String, FieldError> {
    let card: String = card_number.chars().filter(|c| !c.is_whitespace()).collect();
    let len = card.chars().count();

    if !(CARD_NUMBER_MIN_LEN..=CARD_NUMBER_MAX_LEN).contains(&len) {
        return Err(FieldError::new(
            "card_number",
            ValidationErrorKind::InvalidCardFormat,
            format!(
                "Card number must be between {}-{} digits.",
                CARD_NUMBER_MIN_LEN, CARD_NUMBER_MAX_LEN
            ),
        ));
    }

    if !card.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::new(
            "card_number",
            ValidationErrorKind::InvalidCardFormat,
            "Card number must contain only digits.",
        ));
    }

    Ok(card)
}

/// Parse `MM/YY` and reject cards that expired before the current month.
///
/// A card is valid through the end of its expiry month, and `YY` is read
/// as `20YY`.
pub fn validate_expiry_date(expiry_date: &str, today: NaiveDate) -> Result<ExpiryDate, FieldError> {
    let expiry = expiry_date.trim();
    let bad_format = || {
        FieldError::new(
            "expiry_date",
            ValidationErrorKind::InvalidDateFormat,
            "Expiry date must be in MM/YY format (e.g., 12/25).",
        )
    };

    let (month, year) = expiry.split_once('/').ok_or_else(bad_format)?;
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) {
        return Err(bad_format());
    }

    let month: u32 = month.parse().map_err(|_| bad_format())?;
    let year: i32 = year.parse().map_err(|_| bad_format())?;

    if !(1..=12).contains(&month) {
        return Err(FieldError::new(
            "expiry_date",
            ValidationErrorKind::InvalidDateFormat,
            "Month must be between 01 and 12.",
        ));
    }

    let expiry = ExpiryDate {
        month,
        year: 2000 + year,
    };

    let expiry_index = i64::from(expiry.year) * 12 + i64::from(expiry.month);
    let current_index = i64::from(today.year()) * 12 + i64::from(today.month());
    if expiry_index < current_index {
        return Err(FieldError::new(
            "expiry_date",
            ValidationErrorKind::ExpiredCard,
            format!("Card has expired. Expiry date: {}", expiry_date.trim()),
        ));
    }

    Ok(expiry)
}

pub fn validate_cvv(cvv: &str) -> Result<String, FieldError> {
    let cvv = cvv.trim();
    if !(3..=4).contains(&cvv.len()) || !cvv.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::new(
            "cvv",
            ValidationErrorKind::InvalidCvv,
            "CVV must be 3 or 4 digits.",
        ));
    }

    Ok(cvv.to_string())
}

/// Letters, spaces, hyphens and periods only, with at least one letter.
pub fn validate_cardholder_name(name: &str) -> Result<String, FieldError> {
    let name = name.trim();
    let invalid =
        |message: &str| FieldError::new("cardholder_name", ValidationErrorKind::InvalidCardholderName, message);

    if name.is_empty() {
        return Err(invalid("Cardholder name is required."));
    }

    let len = name.chars().count();
    if len < CARDHOLDER_NAME_MIN_LEN {
        return Err(invalid("Cardholder name must be at least 3 characters."));
    }
    if len > CARDHOLDER_NAME_MAX_LEN {
        return Err(invalid("Cardholder name must not exceed 100 characters."));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphabetic() || matches!(c, ' ' | '-' | '.'))
    {
        return Err(invalid(
            "Cardholder name contains invalid characters. Only letters, spaces, hyphens, and dots are allowed.",
        ));
    }

    if !name.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(invalid("Cardholder name must contain at least one letter."));
    }

    Ok(name.to_string())
}

/// Run every field rule and collect all failures.
pub fn validate_all(
    request: &TransactionRequest,
    today: NaiveDate,
) -> Result<ValidatedRequest, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let terminal_number =
        errors.push(validate_required("terminal_number", &request.terminal_number));
    let terminal_password =
        errors.push(validate_required("terminal_password", &request.terminal_password));
    let amount = errors.push(validate_amount(request.amount));
    let card_number = errors.push(validate_card_number(&request.card_number));
    let expiry = errors.push(validate_expiry_date(&request.expiry_date, today));
    let cvv = errors.push(validate_cvv(&request.cvv));
    let cardholder_name = errors.push(validate_cardholder_name(&request.cardholder_name));

    match (
        terminal_number,
        terminal_password,
        amount,
        card_number,
        expiry,
        cvv,
        cardholder_name,
    ) {
        (
            Some(terminal_number),
            Some(terminal_password),
            Some(amount),
            Some(card_number),
            Some(expiry),
            Some(cvv),
            Some(cardholder_name),
        ) => Ok(ValidatedRequest {
            terminal_number,
            terminal_password,
            card_number,
            expiry,
            cvv,
            cardholder_name,
            amount,
            transaction_type: request.transaction_type,
        }),
        _ => Err(errors),
    }
}

//! # Sale Commands
//!
//! Rings up a sale on the open shift. Cart lines and payments come in as
//! short text forms so the CLI can pass them straight through:
//!
//! ```text
//! item     "Inca Kola 500ml=2.50x2"   name=unit price[xquantity]
//! payment  "cash=40"                  method=amount
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::CashState;
use posgo_core::validation::{parse_amount_input, require_amount};
use posgo_core::{CartLine, Money, PaymentLine, PaymentMethod, Settlement};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    pub transaction_id: String,
    pub shift_id: Option<String>,
    pub date: DateTime<Utc>,
    pub item_count: usize,
    pub total: Money,
    pub payment_method: Option<String>,
    pub payments: Option<Vec<PaymentLine>>,
}

/// Records a sale paid with one method, or split over `payments` when any
/// are given.
pub async fn record_sale(
    cash: &CashState,
    items: &[String],
    method: &str,
    payments: &[String],
) -> Result<SaleResponse, ApiError> {
    debug!(items = items.len(), method, "record_sale command");

    let lines = items
        .iter()
        .enumerate()
        .map(|(n, raw)| parse_item(n, raw))
        .collect::<Result<Vec<_>, _>>()?;

    let settlement = if payments.is_empty() {
        Settlement::Single(PaymentMethod::from(method.trim().to_lowercase()))
    } else {
        Settlement::Split(
            payments
                .iter()
                .map(|raw| parse_payment(raw))
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    let transaction = cash.record_sale(lines, settlement).await?;

    Ok(SaleResponse {
        transaction_id: transaction.id,
        shift_id: transaction.shift_id,
        date: transaction.date,
        item_count: transaction.items.len(),
        total: transaction.total,
        payment_method: transaction.payment_method.map(String::from),
        payments: transaction.payments,
    })
}

/// Parses `name=price[xquantity]`.
pub fn parse_item(index: usize, raw: &str) -> Result<CartLine, ApiError> {
    let (name, rest) = raw
        .rsplit_once('=')
        .ok_or_else(|| ApiError::validation(format!("Item '{}' must look like name=price", raw)))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Item name is required"));
    }

    let (price, quantity) = match rest.rsplit_once(['x', 'X']) {
        Some((price, quantity)) => {
            let quantity = quantity.trim().parse::<i64>().map_err(|_| {
                ApiError::validation(format!("Quantity '{}' is not a whole number", quantity))
            })?;
            (price, quantity)
        }
        None => (rest, 1),
    };

    if quantity <= 0 {
        return Err(ApiError::validation(format!(
            "Quantity for {} must be positive",
            name
        )));
    }

    let price = require_amount(parse_amount_input(price, "price")?, "price")?;

    Ok(CartLine {
        id: format!("line-{}", index + 1),
        name: name.to_string(),
        price,
        quantity,
        selected_variant_id: None,
    })
}

/// Parses `method=amount`.
pub fn parse_payment(raw: &str) -> Result<PaymentLine, ApiError> {
    let (method, amount) = raw.split_once('=').ok_or_else(|| {
        ApiError::validation(format!("Payment '{}' must look like method=amount", raw))
    })?;

    let method = method.trim().to_lowercase();
    if method.is_empty() {
        return Err(ApiError::validation("Payment method is required"));
    }

    Ok(PaymentLine {
        method: PaymentMethod::from(method),
        amount: require_amount(parse_amount_input(amount, "payment")?, "payment")?,
    })
}

//! # Cash Commands
//!
//! Drawer actions (open, close, cash in, cash out) and the views built on
//! them: status, history, shift report and ledger audit.
//!
//! Amounts arrive exactly as typed; `parse_amount_input` decides what a
//! blank box means for each action.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::{CashState, RegisterConfig, RegisterStatus, ShiftAudit};
use posgo_core::shift::{ActiveShiftChange, CashAction, Transition};
use posgo_core::totals::{ShiftSummary, ShiftTotals};
use posgo_core::validation::{parse_amount_input, validate_uuid};
use posgo_core::{Money, MovementType};

/// Result of a drawer action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashActionResponse {
    pub shift_id: String,
    pub movement_id: String,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub amount: Money,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    /// Shift this terminal now considers active.
    pub active_shift_id: Option<String>,
    /// Expected drawer after the action.
    pub totals: ShiftTotals,
}

/// Status view with display strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub store_name: String,
    pub store_id: String,
    #[serde(flatten)]
    pub status: RegisterStatus,
    pub cash_display: String,
    pub digital_display: String,
}

pub async fn open_shift(cash: &CashState, amount: &str) -> Result<CashActionResponse, ApiError> {
    debug!(amount, "open_shift command");
    let amount = parse_amount_input(amount, "amount")?;
    run(cash, CashAction::Open { amount }).await
}

/// Closes the active shift. A blank amount is recorded as 0.
pub async fn close_shift(cash: &CashState, amount: &str) -> Result<CashActionResponse, ApiError> {
    debug!(amount, "close_shift command");
    let amount = parse_amount_input(amount, "amount")?;
    run(cash, CashAction::Close { amount }).await
}

pub async fn cash_in(
    cash: &CashState,
    amount: &str,
    description: &str,
) -> Result<CashActionResponse, ApiError> {
    debug!(amount, "cash_in command");
    let amount = parse_amount_input(amount, "amount")?;
    run(
        cash,
        CashAction::In {
            amount,
            description: description.to_string(),
        },
    )
    .await
}

pub async fn cash_out(
    cash: &CashState,
    amount: &str,
    description: &str,
) -> Result<CashActionResponse, ApiError> {
    debug!(amount, "cash_out command");
    let amount = parse_amount_input(amount, "amount")?;
    run(
        cash,
        CashAction::Out {
            amount,
            description: description.to_string(),
        },
    )
    .await
}

async fn run(cash: &CashState, action: CashAction) -> Result<CashActionResponse, ApiError> {
    let transition = cash.perform(action).await?;
    let totals = cash.totals().await;
    Ok(response(transition, totals))
}

fn response(transition: Transition, totals: ShiftTotals) -> CashActionResponse {
    let active_shift_id = match &transition.active_shift {
        ActiveShiftChange::Set(id) => Some(id.clone()),
        ActiveShiftChange::Clear => None,
        ActiveShiftChange::Unchanged => Some(transition.movement.shift_id.clone()),
    };
    let movement = transition.movement;

    CashActionResponse {
        shift_id: movement.shift_id,
        movement_id: movement.id,
        movement_type: movement.movement_type,
        amount: movement.amount,
        description: movement.description,
        timestamp: movement.timestamp,
        active_shift_id,
        totals,
    }
}

pub async fn get_status(
    cash: &CashState,
    config: &RegisterConfig,
) -> Result<StatusResponse, ApiError> {
    debug!("get_status command");
    let status = cash.status().await?;

    Ok(StatusResponse {
        store_name: config.store.name.clone(),
        store_id: cash.store_id().to_string(),
        cash_display: config.format_currency(status.totals.cash.cents()),
        digital_display: config.format_currency(status.totals.digital.cents()),
        status,
    })
}

pub async fn get_history(cash: &CashState) -> Vec<ShiftSummary> {
    debug!("get_history command");
    cash.history().await
}

pub async fn get_shift_report(cash: &CashState, shift_id: &str) -> Result<ShiftSummary, ApiError> {
    debug!(shift_id, "get_shift_report command");
    validate_uuid(shift_id)?;
    cash.shift_report(shift_id).await
}

pub async fn audit_ledger(cash: &CashState) -> Result<Vec<ShiftAudit>, ApiError> {
    debug!("audit_ledger command");
    cash.audit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::{CashSettings, LocalStore};
    use posgo_db::{CashGateway, MemoryGateway};
    use std::sync::Arc;

    async fn cash(dir: &tempfile::TempDir) -> CashState {
        let gateway: Arc<dyn CashGateway> = Arc::new(MemoryGateway::new("store-1"));
        CashState::load(
            gateway,
            LocalStore::new(dir.path().join("session.json")),
            CashSettings::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_requires_amount() {
        let dir = tempfile::tempdir().unwrap();
        let cash = cash(&dir).await;

        let err = open_shift(&cash, "  ").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = open_shift(&cash, "cien").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let opened = open_shift(&cash, "0").await.unwrap();
        assert_eq!(opened.amount, Money::zero());
        assert_eq!(opened.active_shift_id.as_deref(), Some(opened.shift_id.as_str()));
    }

    #[tokio::test]
    async fn test_blank_close_records_zero() {
        let dir = tempfile::tempdir().unwrap();
        let cash = cash(&dir).await;
        open_shift(&cash, "100").await.unwrap();

        let closed = close_shift(&cash, "").await.unwrap();
        assert_eq!(closed.movement_type, MovementType::Close);
        assert_eq!(closed.amount, Money::zero());
        assert!(closed.active_shift_id.is_none());
        assert_eq!(closed.totals, ShiftTotals::zero());
    }

    #[tokio::test]
    async fn test_cash_out_reports_expected_drawer() {
        let dir = tempfile::tempdir().unwrap();
        let cash = cash(&dir).await;
        open_shift(&cash, "100").await.unwrap();

        let out = cash_out(&cash, "20,50", "compra de hielo").await.unwrap();
        assert_eq!(out.amount, Money::from_cents(2_050));
        assert_eq!(out.totals.cash, Money::from_cents(7_950));

        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["type"], "OUT");
        assert_eq!(json["amount"], 20.5);
    }

    #[tokio::test]
    async fn test_status_display() {
        let dir = tempfile::tempdir().unwrap();
        let cash = cash(&dir).await;
        open_shift(&cash, "12.34").await.unwrap();

        let status = get_status(&cash, &RegisterConfig::default()).await.unwrap();
        assert_eq!(status.cash_display, "S/ 12.34");
        assert_eq!(status.store_id, "store-1");
    }

    #[tokio::test]
    async fn test_report_rejects_malformed_id() {
        let dir = tempfile::tempdir().unwrap();
        let cash = cash(&dir).await;
        let err = get_shift_report(&cash, "no-such-shift").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}

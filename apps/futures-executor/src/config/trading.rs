//! Workflow parameters (`[TRADING]` section).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::ConfigError;
use crate::application::dto::WorkflowParams;
use crate::application::use_cases::DEFAULT_SETTLE_DELAY;
use crate::domain::order_execution::{OrderSide, OrderType};
use crate::domain::shared::{Leverage, Symbol};
use crate::domain::sizing::{LIMIT_PRICE_OFFSET, LimitPricer};

/// What one run of the binary does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Open a position through the order workflow.
    #[default]
    Open,
    /// Cancel every open order for the symbol.
    CancelAll,
}

impl RunMode {
    /// Parse a `MODE` value, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OPEN" => Some(Self::Open),
            "CANCEL_ALL" => Some(Self::CancelAll),
            _ => None,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::CancelAll => write!(f, "CANCEL_ALL"),
        }
    }
}

/// Validated trading parameters for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingSettings {
    /// Open a position or cancel open orders.
    pub mode: RunMode,
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Leverage to set.
    pub leverage: Leverage,
    /// BUY for LONG, SELL for SHORT.
    pub side: OrderSide,
    /// MARKET or LIMIT.
    pub order_type: OrderType,
    /// Notional to spend, in USDT.
    pub usdt_amount: Decimal,
    /// Only reduce an existing position.
    pub reduce_only: bool,
    /// Check the available USDT balance first.
    pub check_balance: bool,
    /// LIMIT price distance from the mark (0.01 = 1%).
    pub limit_offset: Decimal,
    /// Wait between submission and position read-back.
    pub settle_delay: Duration,
}

impl TradingSettings {
    /// Parameters for one workflow run.
    #[must_use]
    pub fn workflow_params(&self) -> WorkflowParams {
        WorkflowParams::market(
            self.symbol.clone(),
            self.leverage,
            self.side,
            self.usdt_amount,
        )
        .with_order_type(self.order_type)
        .with_reduce_only(self.reduce_only)
        .with_balance_check(self.check_balance)
    }

    /// LIMIT pricer for the configured offset.
    #[must_use]
    pub const fn limit_pricer(&self) -> LimitPricer {
        LimitPricer::with_offset(self.limit_offset)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TradingSection {
    #[serde(default, alias = "MODE")]
    mode: Option<String>,
    #[serde(alias = "SYMBOL")]
    symbol: String,
    #[serde(alias = "LEVERAGE")]
    leverage: u32,
    #[serde(default = "default_side", alias = "SIDE")]
    side: String,
    #[serde(default = "default_order_type", alias = "ORDER_TYPE")]
    order_type: String,
    #[serde(alias = "USDT_AMOUNT")]
    usdt_amount: String,
    #[serde(default, alias = "REDUCE_ONLY")]
    reduce_only: bool,
    #[serde(default, alias = "CHECK_BALANCE")]
    check_balance: bool,
    #[serde(default, alias = "LIMIT_OFFSET")]
    limit_offset: Option<String>,
    #[serde(default, alias = "SETTLE_DELAY_MS")]
    settle_delay_ms: Option<u64>,
}

impl TradingSection {
    pub(super) fn into_settings(self) -> Result<TradingSettings, ConfigError> {
        let invalid = |message: String| ConfigError::ValidationError(message);

        let mode = match self.mode.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => RunMode::parse(raw).ok_or_else(|| {
                invalid(format!(
                    "TRADING.MODE must be OPEN or CANCEL_ALL (got '{raw}')"
                ))
            })?,
            _ => RunMode::default(),
        };

        let symbol = Symbol::new(self.symbol);
        symbol
            .validate()
            .map_err(|e| invalid(format!("TRADING.SYMBOL: {e}")))?;

        if self.leverage == 0 {
            return Err(invalid("TRADING.LEVERAGE must be at least 1".to_string()));
        }

        let side = OrderSide::from_direction(&self.side).ok_or_else(|| {
            invalid(format!(
                "TRADING.SIDE must be LONG or SHORT (got '{}')",
                self.side
            ))
        })?;

        let order_type = OrderType::parse(&self.order_type)
            .filter(OrderType::is_supported_entry)
            .ok_or_else(|| {
                invalid(format!(
                    "TRADING.ORDER_TYPE must be MARKET or LIMIT (got '{}')",
                    self.order_type
                ))
            })?;

        let usdt_amount = parse_decimal("TRADING.USDT_AMOUNT", &self.usdt_amount)?;
        if usdt_amount <= Decimal::ZERO {
            return Err(invalid(format!(
                "TRADING.USDT_AMOUNT must be positive (got {usdt_amount})"
            )));
        }

        let limit_offset = match self.limit_offset.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_decimal("TRADING.LIMIT_OFFSET", raw)?,
            _ => LIMIT_PRICE_OFFSET,
        };
        if limit_offset < Decimal::ZERO || limit_offset >= Decimal::ONE {
            return Err(invalid(format!(
                "TRADING.LIMIT_OFFSET must be in [0, 1) (got {limit_offset})"
            )));
        }

        Ok(TradingSettings {
            mode,
            symbol,
            leverage: Leverage::new(self.leverage),
            side,
            order_type,
            usdt_amount,
            reduce_only: self.reduce_only,
            check_balance: self.check_balance,
            limit_offset,
            settle_delay: self
                .settle_delay_ms
                .map_or(DEFAULT_SETTLE_DELAY, Duration::from_millis),
        })
    }
}

fn parse_decimal(key: &str, raw: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(raw.trim()).map_err(|e| {
        ConfigError::ValidationError(format!("{key} is not a decimal ('{raw}'): {e}"))
    })
}

fn default_side() -> String {
    "LONG".to_string()
}

fn default_order_type() -> String {
    "MARKET".to_string()
}

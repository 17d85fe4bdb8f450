//! Futures Executor Binary
//!
//! Opens one leveraged futures position from the INI settings and exits.
//! With `MODE = CANCEL_ALL` in parameter.ini it instead lists the symbol's
//! open orders and cancels them.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin futures-executor
//! ```
//!
//! # Environment Variables
//!
//! ## Optional
//! - `FUTURES_EXECUTOR_CONFIG`: credentials file (default: settings/config.ini)
//! - `FUTURES_EXECUTOR_PARAMETERS`: trading file (default: settings/parameter.ini)
//! - `FUTURES_EXECUTOR_CONFIRM`: set to `YES` to skip the MAINNET prompt
//! - `BINANCE_API_KEY` / `BINANCE_API_SECRET`: referenced from config.ini
//! - `RUST_LOG`: Log filter (default: `warn,futures_executor=info`)
//!
//! # Exit Status
//!
//! `0` on success, otherwise the `ErrorCode` exit status of the failure
//! (`4` means the order may exist and must be checked by hand).

use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use futures_executor::application::use_cases::OpenOrdersManager;
use futures_executor::config::{ExchangeEnvironment, RunMode, Settings, load_settings};
use futures_executor::error::ErrorCode;
use futures_executor::infrastructure::exchange::{
    BinanceGateway, CachingGateway, SimulatedExchange,
};
use futures_executor::telemetry::init_logging;
use futures_executor::{ExchangeGateway, OrderWorkflow, WorkflowFailure};

/// Answer required before trading real funds.
const CONFIRMATION: &str = "YES";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("futures-executor: {e:#}");
            ExitCode::from(exit_status(ErrorCode::InvalidInput))
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    load_dotenv();

    let config_path = std::env::var("FUTURES_EXECUTOR_CONFIG").ok();
    let parameter_path = std::env::var("FUTURES_EXECUTOR_PARAMETERS").ok();
    let settings = load_settings(config_path.as_deref(), parameter_path.as_deref())
        .context("Failed to load settings")?;

    init_logging(&settings.logging).context("Failed to initialize logging")?;
    log_settings(&settings);

    if settings.exchange.environment.is_live() && !confirm_mainnet(&settings)? {
        tracing::warn!("MAINNET run not confirmed, exiting without sending anything");
        return Ok(ExitCode::SUCCESS);
    }

    let ttl = settings.exchange.rules_cache_ttl;
    match settings.exchange.binance_config() {
        Some(config) => {
            let gateway = BinanceGateway::new(config).context("Failed to create Binance gateway")?;
            Ok(dispatch(CachingGateway::new(gateway, ttl), &settings).await)
        }
        None => {
            tracing::info!("Using simulated exchange, no orders leave this process");
            let gateway = SimulatedExchange::with_default_markets();
            Ok(dispatch(CachingGateway::new(gateway, ttl), &settings).await)
        }
    }
}

async fn dispatch<G: ExchangeGateway>(gateway: G, settings: &Settings) -> ExitCode {
    let gateway = Arc::new(gateway);
    match settings.trading.mode {
        RunMode::Open => execute(&gateway, settings).await,
        RunMode::CancelAll => cancel_open_orders(&gateway, settings).await,
    }
}

/// Cancel every open order for the configured symbol.
async fn cancel_open_orders<G: ExchangeGateway>(
    gateway: &Arc<G>,
    settings: &Settings,
) -> ExitCode {
    let orders = OpenOrdersManager::new(Arc::clone(gateway));
    match orders.cancel_all_open(&settings.trading.symbol).await {
        Ok(canceled) => {
            match serde_json::to_string_pretty(&canceled) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!(error = %e, "Failed to render canceled orders"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(
                symbol = %settings.trading.symbol,
                code = %e.code(),
                error = %e,
                "Failed to cancel open orders"
            );
            ExitCode::from(exit_status(e.code()))
        }
    }
}

/// Run the workflow once and turn the outcome into an exit status.
async fn execute<G: ExchangeGateway>(gateway: &Arc<G>, settings: &Settings) -> ExitCode {
    let workflow = OrderWorkflow::new(Arc::clone(gateway))
        .with_settle_delay(settings.trading.settle_delay)
        .with_limit_pricer(settings.trading.limit_pricer());

    match workflow.run(&settings.trading.workflow_params()).await {
        Ok(report) => {
            for position in report.reconciliation.open_positions() {
                tracing::info!(
                    symbol = %position.symbol,
                    direction = ?position.direction(),
                    position_amt = %position.position_amt,
                    entry_price = %position.entry_price,
                    leverage = %position.leverage,
                    liquidation_price = %position.liquidation_price,
                    "Open position"
                );
            }
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!(error = %e, "Failed to render report"),
            }
            ExitCode::SUCCESS
        }
        Err(failure) => {
            if failure.error.is_outcome_unknown() {
                look_up_order(gateway, settings, &failure).await;
            } else if let Some(order) = &failure.order {
                tracing::error!(
                    order_id = %order.order_id,
                    status = %order.status,
                    "Order was accepted but the run did not complete, check the position"
                );
            }
            ExitCode::from(exit_status(failure.error.code()))
        }
    }
}

/// After an unknown submission outcome, ask the exchange whether the order exists.
async fn look_up_order<G: ExchangeGateway>(
    gateway: &Arc<G>,
    settings: &Settings,
    failure: &WorkflowFailure,
) {
    let Some(client_order_id) = &failure.client_order_id else {
        return;
    };
    let orders = OpenOrdersManager::new(Arc::clone(gateway));
    match orders
        .order_status(&settings.trading.symbol, client_order_id)
        .await
    {
        Ok(Some(order)) => tracing::warn!(
            client_order_id = %client_order_id,
            order_id = %order.order_id,
            status = %order.status,
            executed_qty = %order.executed_qty,
            "Order exists on the exchange despite the submission error"
        ),
        Ok(None) => tracing::warn!(
            client_order_id = %client_order_id,
            "Order not visible on the exchange yet, check again before retrying"
        ),
        Err(e) => tracing::error!(
            client_order_id = %client_order_id,
            error = %e,
            "Order status unknown, check the exchange by hand"
        ),
    }
}

fn log_settings(settings: &Settings) {
    let trading = &settings.trading;
    tracing::info!(
        environment = %settings.exchange.environment,
        mode = %trading.mode,
        symbol = %trading.symbol,
        leverage = %trading.leverage,
        side = %trading.side,
        order_type = %trading.order_type,
        usdt_amount = %trading.usdt_amount,
        reduce_only = trading.reduce_only,
        "Futures executor starting"
    );
}

/// Show what is about to happen and ask for `YES` on stdin, unless
/// `FUTURES_EXECUTOR_CONFIRM=YES` is set.
fn confirm_mainnet(settings: &Settings) -> anyhow::Result<bool> {
    if std::env::var("FUTURES_EXECUTOR_CONFIRM").is_ok_and(|v| v.trim() == CONFIRMATION) {
        return Ok(true);
    }

    let trading = &settings.trading;
    let mut stdout = std::io::stdout();
    match trading.mode {
        RunMode::Open => {
            writeln!(stdout, "Symbol:      {}", trading.symbol)?;
            writeln!(stdout, "Side:        {}", trading.side)?;
            writeln!(stdout, "Order type:  {}", trading.order_type)?;
            writeln!(stdout, "USDT amount: {}", trading.usdt_amount)?;
            writeln!(stdout, "Leverage:    {}", trading.leverage)?;
            writeln!(stdout, "Reduce only: {}", trading.reduce_only)?;
        }
        RunMode::CancelAll => {
            writeln!(stdout, "Cancel all open orders for {}", trading.symbol)?;
        }
    }
    write!(
        stdout,
        "{} trades real funds. Type {CONFIRMATION} to continue: ",
        ExchangeEnvironment::Mainnet
    )?;
    stdout.flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(answer.trim() == CONFIRMATION)
}

fn exit_status(code: ErrorCode) -> u8 {
    u8::try_from(code.exit_code()).unwrap_or(1)
}

/// Load `.env` from the working directory or the nearest ancestor that has one.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use lp_quote::{
    config::AppConfig,
    models::{FocusSide, QuoteView},
    pool::FileSnapshotSource,
    quote::Balances,
    service::{QuoteHandle, spawn_quote_service},
    utils,
};
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line of stdin input.
#[derive(Debug, PartialEq)]
enum Input {
    Amount(FocusSide, String),
    Focus(FocusSide),
    Refresh,
    Balance(Balances),
    Sent,
    Quit,
}

fn parse_side(raw: &str) -> Option<FocusSide> {
    match raw {
        "base" => Some(FocusSide::Base),
        "quote" => Some(FocusSide::Quote),
        _ => None,
    }
}

fn parse_input(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let input = match parts.next()? {
        word @ ("base" | "quote") => {
            let side = parse_side(word)?;
            Input::Amount(side, parts.next().unwrap_or_default().to_string())
        }
        "focus" => Input::Focus(parse_side(parts.next()?)?),
        "refresh" => Input::Refresh,
        "balance" => Input::Balance(Balances {
            base: BigDecimal::from_str(parts.next()?).ok()?,
            quote: BigDecimal::from_str(parts.next()?).ok()?,
        }),
        "sent" => Input::Sent,
        "quit" | "exit" => Input::Quit,
        _ => return None,
    };
    Some(input)
}

fn log_view(view: &QuoteView) {
    tracing::info!(
        base = %view.base_amount,
        quote = %view.quote_amount,
        lp = %view.minted_shares_estimate,
        verdict = ?view.verdict,
        focus = view.focus.as_str(),
        rate = view.exchange_rate.as_deref().unwrap_or("-"),
        as_of = ?view.snapshot_as_of,
        pool_not_found = view.pool_not_found,
        "[QUOTE] view"
    );
    if let Some(deposit) = &view.deposit {
        tracing::info!(
            base = %deposit.base_amount,
            quote = %deposit.quote_amount,
            fixed = deposit.fixed_side.as_str(),
            "[QUOTE] deposit ready"
        );
    }
}

async fn read_commands(handle: QuoteHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(input) = parse_input(&line) else {
            tracing::warn!(%line, "unrecognised input");
            continue;
        };
        match input {
            Input::Amount(side, amount) => handle.on_amount_edited(side, amount)?,
            Input::Focus(side) => handle.on_focus_changed(side)?,
            Input::Refresh => handle.on_manual_refresh()?,
            Input::Balance(balances) => handle.on_balances_updated(balances)?,
            Input::Sent => handle.on_deposit_sent()?,
            Input::Quit => break,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(
        pool = %config.pool_id,
        snapshot = %config.snapshot_path.display(),
        refresh_ms = config.service.refresh_interval.as_millis() as u64,
        slippage_bps = config.service.slippage_bps,
        "[INIT] lp-quote starting"
    );

    let source = FileSnapshotSource::new(config.snapshot_path.clone());
    let (handle, service_task) = spawn_quote_service(
        Some(config.pool_id.clone()),
        source,
        config.balances.clone(),
        config.service.clone(),
    );

    let mut views = handle.subscribe();
    let view_task = tokio::spawn(async move {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            log_view(&view);
        }
    });

    // the service stops once the reader drops the last handle
    let reader = read_commands(handle);
    let (read_result, service_result) = futures::join!(reader, service_task);
    view_task.abort();
    service_result?;
    read_result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_input("base 1.5"),
            Some(Input::Amount(FocusSide::Base, "1.5".into()))
        );
        assert_eq!(
            parse_input("quote"),
            Some(Input::Amount(FocusSide::Quote, String::new()))
        );
        assert_eq!(parse_input("focus quote"), Some(Input::Focus(FocusSide::Quote)));
        assert_eq!(parse_input("  refresh "), Some(Input::Refresh));
        assert_eq!(parse_input("sent"), Some(Input::Sent));
        assert_eq!(parse_input("exit"), Some(Input::Quit));
        assert_eq!(
            parse_input("balance 2 3.5"),
            Some(Input::Balance(Balances {
                base: BigDecimal::from(2),
                quote: BigDecimal::from_str("3.5").unwrap(),
            }))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_input(""), None);
        assert_eq!(parse_input("focus left"), None);
        assert_eq!(parse_input("balance 1"), None);
        assert_eq!(parse_input("withdraw 3"), None);
    }
}

//! Decision fills
//!
//! Applies one decision to the portfolio at a given price. Quantities are
//! clipped to what cash, margin and the existing book allow; the clipped
//! fill quantity is returned so callers can log slippage against intent.
//!
//! Cost bases are volume-weighted averages. Short entries post margin at the
//! portfolio's `margin_requirement`; covers release it proportionally.

use log::debug;
use quorum_core::{Action, Decision, Portfolio, Ticker};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Apply a decision at `price`. Returns the quantity actually filled.
pub fn apply_decision(
    portfolio: &mut Portfolio,
    ticker: &Ticker,
    decision: &Decision,
    price: Decimal,
) -> u64 {
    if price <= Decimal::ZERO || decision.quantity == 0 {
        return 0;
    }
    let filled = match decision.action {
        Action::Buy => buy(portfolio, ticker, decision.quantity, price),
        Action::Sell => sell(portfolio, ticker, decision.quantity, price),
        Action::Short => short(portfolio, ticker, decision.quantity, price),
        Action::Cover => cover(portfolio, ticker, decision.quantity, price),
        Action::Hold => 0,
    };
    if filled != decision.quantity {
        debug!(
            "[fills] {} {:?} clipped {} -> {}",
            ticker, decision.action, decision.quantity, filled
        );
    }
    filled
}

fn buy(portfolio: &mut Portfolio, ticker: &Ticker, quantity: u64, price: Decimal) -> u64 {
    let affordable = (portfolio.cash.max(Decimal::ZERO) / price)
        .floor()
        .to_u64()
        .unwrap_or(0);
    let quantity = quantity.min(affordable);
    if quantity == 0 {
        return 0;
    }

    let position = portfolio.position_mut(ticker);
    let old_notional = Decimal::from(position.long) * position.long_cost_basis;
    let add_notional = Decimal::from(quantity) * price;
    position.long += quantity;
    position.long_cost_basis = (old_notional + add_notional) / Decimal::from(position.long);

    portfolio.cash -= add_notional;
    quantity
}

fn sell(portfolio: &mut Portfolio, ticker: &Ticker, quantity: u64, price: Decimal) -> u64 {
    let held = portfolio.position(ticker).long;
    let quantity = quantity.min(held);
    if quantity == 0 {
        return 0;
    }

    let basis = portfolio.position(ticker).long_cost_basis;
    portfolio.gains_mut(ticker).long += (price - basis) * Decimal::from(quantity);
    portfolio.cash += Decimal::from(quantity) * price;

    let position = portfolio.position_mut(ticker);
    position.long -= quantity;
    if position.long == 0 {
        position.long_cost_basis = Decimal::ZERO;
    }
    quantity
}

fn short(portfolio: &mut Portfolio, ticker: &Ticker, quantity: u64, price: Decimal) -> u64 {
    let margin_requirement = portfolio.margin_requirement;
    let quantity = if margin_requirement > Decimal::ZERO {
        let per_share = price * margin_requirement;
        let postable = (portfolio.cash.max(Decimal::ZERO) / per_share)
            .floor()
            .to_u64()
            .unwrap_or(0);
        quantity.min(postable)
    } else {
        quantity
    };
    if quantity == 0 {
        return 0;
    }

    let proceeds = Decimal::from(quantity) * price;
    let margin = proceeds * margin_requirement;

    let position = portfolio.position_mut(ticker);
    let old_notional = Decimal::from(position.short) * position.short_cost_basis;
    position.short += quantity;
    position.short_cost_basis = (old_notional + proceeds) / Decimal::from(position.short);
    position.short_margin_used += margin;

    portfolio.cash += proceeds - margin;
    portfolio.margin_used += margin;
    quantity
}

fn cover(portfolio: &mut Portfolio, ticker: &Ticker, quantity: u64, price: Decimal) -> u64 {
    let position_before = portfolio.position(ticker);
    let quantity = quantity.min(position_before.short);
    if quantity == 0 {
        return 0;
    }

    // Margin is released pro rata with the shares covered
    let release = position_before.short_margin_used * Decimal::from(quantity)
        / Decimal::from(position_before.short);
    let basis = position_before.short_cost_basis;

    portfolio.gains_mut(ticker).short += (basis - price) * Decimal::from(quantity);
    portfolio.cash += release - Decimal::from(quantity) * price;
    portfolio.margin_used -= release;

    let position = portfolio.position_mut(ticker);
    position.short -= quantity;
    position.short_margin_used -= release;
    if position.short == 0 {
        position.short_cost_basis = Decimal::ZERO;
        position.short_margin_used = Decimal::ZERO;
    }
    quantity
}

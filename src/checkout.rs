//! Cart totals and simulated order placement. No payment is taken: placing an
//! order validates the shipping details, prices the cart and empties it.

use log::info;
use serde::Serialize;

use crate::entity_model::CartItem;
use crate::error::{StoreError, StoreResult};
use crate::local_store::{iso_now, timestamp_id, LocalStore};
use crate::validation::{validate_shipping, ShippingDetails};

/// Orders with a subtotal above this ship for free.
pub const FREE_SHIPPING_OVER: f64 = 50.0;
pub const FLAT_SHIPPING: f64 = 5.99;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub item_count: u32,
    pub subtotal: f64,
    pub shipping: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order_id: String,
    pub placed_at: String,
    pub items: Vec<CartItem>,
    pub shipping_details: ShippingDetails,
    pub summary: OrderSummary,
}

/// Rounds to whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn subtotal(items: &[CartItem]) -> f64 {
    round_cents(items.iter().map(CartItem::line_total).sum())
}

/// Shipping for a given subtotal. Nothing to ship means no charge.
pub fn shipping(subtotal: f64) -> f64 {
    if subtotal <= 0.0 || subtotal > FREE_SHIPPING_OVER {
        0.0
    } else {
        FLAT_SHIPPING
    }
}

pub fn summarize(items: &[CartItem]) -> OrderSummary {
    let subtotal = subtotal(items);
    let shipping = shipping(subtotal);
    OrderSummary {
        item_count: items.iter().map(|item| item.quantity).sum(),
        subtotal,
        shipping,
        total: round_cents(subtotal + shipping),
    }
}

/// Validates `details`, prices the current cart and clears it.
pub fn place_order(store: &LocalStore, details: ShippingDetails) -> StoreResult<OrderReceipt> {
    let errors = validate_shipping(&details);
    if !errors.is_empty() {
        let fields: Vec<&str> = errors.keys().copied().collect();
        return Err(StoreError::validation(format!(
            "invalid shipping details: {}",
            fields.join(", ")
        )));
    }

    let cart = store.cart();
    let items = cart.items()?;
    if items.is_empty() {
        return Err(StoreError::EmptyCart);
    }

    let summary = summarize(&items);
    cart.clear()?;

    let receipt = OrderReceipt {
        order_id: timestamp_id(),
        placed_at: iso_now(),
        items,
        shipping_details: details,
        summary,
    };
    info!("Placed order {} for {:.2}", receipt.order_id, summary.total);
    Ok(receipt)
}

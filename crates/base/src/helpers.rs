use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::entities::order::{Quantity, UnitPrice, VatPercent};

pub type Subtotal = Decimal;

pub fn order_subtotal(quantity: Quantity, unit_price: UnitPrice) -> Option<Subtotal> {
    Decimal::from(quantity).checked_mul(unit_price)
}

pub fn vat_amount(subtotal: Subtotal, vat: VatPercent) -> Option<Decimal> {
    subtotal
        .checked_mul(Decimal::from(vat))?
        .checked_div(dec!(100))
}

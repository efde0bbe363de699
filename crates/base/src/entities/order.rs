use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::helpers::{order_subtotal, vat_amount};

pub type OrderId = u32;
pub type VatPercent = u32;
pub type Quantity = u32;
pub type UnitPrice = Decimal;
pub type TotalCost = Decimal;
pub type OrderTime = NaiveDateTime;

pub const MAX_VAT_PERCENT: VatPercent = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("an order with an id {0} already exists")]
    DuplicateKey(OrderId),
    #[error("an order with an id {0} doesn't exist")]
    NotFound(OrderId),
    #[error("{0}")]
    InvalidArgument(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderProperties {
    pub supplier: String,
    pub address: String,
    pub vat: VatPercent,
    pub product_name: String,
    pub quantity: Quantity,
    pub unit_price: UnitPrice,
}

/// Purchase order with a total frozen at construction time. Replacing an
/// order means building a new one, so the total always matches the fields
/// it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    order_id: OrderId,
    props: OrderProperties,
    created_at: OrderTime,
    total: TotalCost,
}

impl Order {
    /// Validates the fields and freezes the VAT-inclusive total.
    pub fn new(
        order_id: OrderId,
        props: OrderProperties,
        created_at: OrderTime,
    ) -> Result<Self, OrderError> {
        if order_id == 0 {
            return Err(invalid_argument("an order id must be a positive integer"));
        }
        if props.supplier.trim().is_empty() {
            return Err(invalid_argument("a supplier can't be empty"));
        }
        if props.address.trim().is_empty() {
            return Err(invalid_argument("an address can't be empty"));
        }
        if props.vat > MAX_VAT_PERCENT {
            return Err(OrderError::InvalidArgument(format!(
                "a vat percent must be between 0 and {}, but got {}",
                MAX_VAT_PERCENT, props.vat
            )));
        }
        if props.product_name.trim().is_empty() {
            return Err(invalid_argument("a product name can't be empty"));
        }
        if props.quantity == 0 {
            return Err(invalid_argument("a quantity must be a positive integer"));
        }
        if props.unit_price <= Decimal::ZERO {
            return Err(OrderError::InvalidArgument(format!(
                "a unit price must be positive, but got {}",
                props.unit_price
            )));
        }

        let total = order_subtotal(props.quantity, props.unit_price)
            .and_then(|subtotal| {
                let vat = vat_amount(subtotal, props.vat)?;
                subtotal.checked_add(vat)
            })
            .ok_or_else(|| {
                OrderError::InvalidArgument(format!(
                    "a total can't be represented for a quantity of {} at a unit price of {}",
                    props.quantity, props.unit_price
                ))
            })?;

        Ok(Self {
            order_id,
            props,
            created_at,
            total,
        })
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn props(&self) -> &OrderProperties {
        &self.props
    }

    pub fn created_at(&self) -> OrderTime {
        self.created_at
    }

    pub fn total(&self) -> TotalCost {
        self.total
    }
}

fn invalid_argument(message: &str) -> OrderError {
    OrderError::InvalidArgument(message.to_string())
}

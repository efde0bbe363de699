pub mod order;

pub use order::{Order, OrderError, OrderProperties};

pub const TOTAL_DECIMAL_PLACES: u32 = 2;

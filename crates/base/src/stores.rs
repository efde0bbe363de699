pub mod order_tree_store;

pub use order_tree_store::OrderTreeStore;

pub mod loaders;
pub mod order;

pub use loaders::{parse_orders, OrderSource};
pub use order::{OrderField, OrderRecord};

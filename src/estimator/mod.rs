pub mod sales;

pub use sales::{estimate, PriorPoint};

pub mod evaluate;
pub mod order;
pub mod summarize;

pub mod quote_flow;

pub use quote_flow::{QuoteFlow, QuoteInputs};

pub mod calculator;
pub mod engine;
pub mod export;
pub mod identifier;
pub mod pipeline;
pub mod rates;
pub mod session;

pub use crate::domain::model::{MatchedComponent, Quotation, QuotationRow, RateRow};
pub use crate::domain::ports::{ChatModel, ComponentIdentifier, ConfigProvider, QuotePipeline, Storage};
pub use crate::utils::error::Result;

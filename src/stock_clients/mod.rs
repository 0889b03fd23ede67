//! Retailer-specific stock client implementations

pub mod nvidia_de;

pub use nvidia_de::NvidiaDeStockClient;

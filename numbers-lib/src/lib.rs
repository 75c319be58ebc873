pub mod fifo_set;
pub mod window;

pub mod aggregate;
pub mod handler;
pub mod metrics;
pub mod upstream;

pub mod stats;
pub mod stocks;

pub mod live;

pub use live::LiveMetrics;

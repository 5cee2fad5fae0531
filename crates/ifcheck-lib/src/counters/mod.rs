//! Counter-to-rate conversion and exponential smoothing

mod average;
mod rate;

pub use average::get_average;
pub use rate::get_rate;

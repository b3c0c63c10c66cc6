pub mod data;
pub mod ev_calculator;
pub mod grading;
pub mod prediction_log;
pub mod props;
pub mod sampler;

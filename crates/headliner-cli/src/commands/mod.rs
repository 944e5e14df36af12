pub mod check_config;
pub mod preview;
pub mod send;
pub mod serve;

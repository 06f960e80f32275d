pub mod api;
pub mod calls;
pub mod config;
pub mod controller;
pub mod error;
pub mod interview;
pub mod processor;
pub mod transport;

pub use interview_realtime_types as types;
pub use interview_realtime_utils as utils;

mod service;

pub use service::PollScheduler;

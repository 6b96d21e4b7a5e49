// src/companysim/mod.rs

pub mod config;
pub mod dataloader;
pub mod environment;
pub mod event;
pub mod planner;
pub mod pool;
pub mod role;
pub mod round_log;
pub mod scheduler;
pub mod workspace;

// Let's explicitly export the scheduler so it can be reached as
// companysim::BatchScheduler instead of companysim::scheduler::BatchScheduler
pub use scheduler::BatchScheduler;

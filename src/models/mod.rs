pub mod capacity;
pub mod task;
pub mod team;
pub mod workload;

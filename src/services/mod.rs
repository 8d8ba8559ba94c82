pub mod capacity_utils;
pub mod team_composition;
pub mod workload_calculator;

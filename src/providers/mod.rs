pub mod memory;

use std::collections::BTreeMap;

use crate::error::AppResult;
use crate::models::capacity::{Capacity, Period};
use crate::models::task::AssignedTask;
use crate::models::team::CandidateMember;

/// Upstream source of working-time snapshots. Unknown users surface
/// `AppError::NotFound`.
#[async_trait::async_trait]
pub trait CapacityProvider: Send + Sync {
    async fn get_capacity(&self, user_id: &str, period: &Period) -> AppResult<Capacity>;
}

/// Upstream source of assigned tasks, already filtered to non-completed
/// tasks due inside the period or undated tasks in an active status.
#[async_trait::async_trait]
pub trait TaskStore: Send + Sync {
    async fn get_assigned_tasks(
        &self,
        user_id: &str,
        period: &Period,
    ) -> AppResult<Vec<AssignedTask>>;
}

/// Upstream source of per-project allocation percentages for one user.
/// Projects absent from the map default to a full allocation.
#[async_trait::async_trait]
pub trait AllocationStore: Send + Sync {
    async fn get_allocations(
        &self,
        user_id: &str,
        project_ids: &[String],
    ) -> AppResult<BTreeMap<String, f64>>;
}

/// Candidate roster offered to the team composition optimizer.
#[async_trait::async_trait]
pub trait CandidatePool: Send + Sync {
    async fn list(&self) -> AppResult<Vec<CandidateMember>>;
}

//! In-memory provider implementations backing tests and demos. Real
//! deployments plug the traits into their own persistence layer.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::capacity::{Capacity, Period};
use crate::models::task::{AssignedTask, ProjectAllocation};
use crate::models::team::CandidateMember;
use crate::providers::{AllocationStore, CandidatePool, CapacityProvider, TaskStore};

#[derive(Debug, Default)]
struct DirectoryEntry {
    capacity: Option<Capacity>,
    tasks: Vec<AssignedTask>,
    allocations: Vec<ProjectAllocation>,
}

/// One in-memory directory serving all four collaborator traits.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<BTreeMap<String, DirectoryEntry>>,
    candidates: RwLock<Vec<CandidateMember>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_capacity(&self, capacity: Capacity) {
        let mut users = self.users.write().expect("directory lock poisoned");
        let user_id = capacity.user_id.clone();
        users.entry(user_id).or_default().capacity = Some(capacity);
    }

    pub fn insert_tasks(&self, user_id: &str, tasks: Vec<AssignedTask>) {
        let mut users = self.users.write().expect("directory lock poisoned");
        users.entry(user_id.to_string()).or_default().tasks = tasks;
    }

    pub fn insert_allocations(&self, user_id: &str, allocations: Vec<ProjectAllocation>) {
        let mut users = self.users.write().expect("directory lock poisoned");
        users.entry(user_id.to_string()).or_default().allocations = allocations;
    }

    pub fn insert_candidates(&self, members: Vec<CandidateMember>) {
        let mut candidates = self.candidates.write().expect("directory lock poisoned");
        *candidates = members;
    }
}

#[async_trait::async_trait]
impl CapacityProvider for InMemoryDirectory {
    async fn get_capacity(&self, user_id: &str, _period: &Period) -> AppResult<Capacity> {
        let users = self.users.read().expect("directory lock poisoned");
        users
            .get(user_id)
            .and_then(|entry| entry.capacity.clone())
            .ok_or_else(AppError::not_found)
    }
}

#[async_trait::async_trait]
impl TaskStore for InMemoryDirectory {
    async fn get_assigned_tasks(
        &self,
        user_id: &str,
        period: &Period,
    ) -> AppResult<Vec<AssignedTask>> {
        let users = self.users.read().expect("directory lock poisoned");
        let entry = users.get(user_id).ok_or_else(AppError::not_found)?;
        let tasks = entry
            .tasks
            .iter()
            .filter(|task| {
                task.status.is_active()
                    && task
                        .due_date
                        .map(|due| period.contains(due))
                        .unwrap_or(true)
            })
            .cloned()
            .collect();
        Ok(tasks)
    }
}

#[async_trait::async_trait]
impl AllocationStore for InMemoryDirectory {
    async fn get_allocations(
        &self,
        user_id: &str,
        project_ids: &[String],
    ) -> AppResult<BTreeMap<String, f64>> {
        let users = self.users.read().expect("directory lock poisoned");
        let entry = users.get(user_id).ok_or_else(AppError::not_found)?;
        let allocations = entry
            .allocations
            .iter()
            .filter(|allocation| project_ids.contains(&allocation.project_id))
            .map(|allocation| {
                (
                    allocation.project_id.clone(),
                    allocation.allocation_percentage,
                )
            })
            .collect();
        Ok(allocations)
    }
}

#[async_trait::async_trait]
impl CandidatePool for InMemoryDirectory {
    async fn list(&self) -> AppResult<Vec<CandidateMember>> {
        let candidates = self.candidates.read().expect("directory lock poisoned");
        Ok(candidates.clone())
    }
}

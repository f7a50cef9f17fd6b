use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::RoadmapModule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Locked,
    Current,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedModule {
    #[serde(flatten)]
    pub module: RoadmapModule,
    pub status: ModuleStatus,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressError {
    #[error("No module at index {0}")]
    NoSuchModule(usize),
    #[error("Module {index} is {status:?}, only the current module can be completed")]
    NotCurrent { index: usize, status: ModuleStatus },
}

/// Unlock progression over a generated roadmap: one module is current at a time,
/// completing it unlocks the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapProgress {
    modules: Vec<TrackedModule>,
}

impl RoadmapProgress {
    pub fn new(modules: Vec<RoadmapModule>) -> Self {
        let modules = modules
            .into_iter()
            .enumerate()
            .map(|(i, module)| TrackedModule {
                module,
                status: if i == 0 { ModuleStatus::Current } else { ModuleStatus::Locked },
            })
            .collect();
        Self { modules }
    }

    pub fn modules(&self) -> &[TrackedModule] {
        &self.modules
    }

    pub fn statuses(&self) -> Vec<ModuleStatus> {
        self.modules.iter().map(|m| m.status).collect()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.modules.iter().position(|m| m.status == ModuleStatus::Current)
    }

    pub fn complete(&mut self, index: usize) -> Result<(), ProgressError> {
        let status = self.modules.get(index).ok_or(ProgressError::NoSuchModule(index))?.status;
        if status != ModuleStatus::Current {
            return Err(ProgressError::NotCurrent { index, status });
        }

        self.modules[index].status = ModuleStatus::Completed;
        if let Some(next) = self.modules.get_mut(index + 1) {
            if next.status == ModuleStatus::Locked {
                next.status = ModuleStatus::Current;
            }
        }
        Ok(())
    }

    pub fn completed_count(&self) -> usize {
        self.modules.iter().filter(|m| m.status == ModuleStatus::Completed).count()
    }

    /// Completed share of the roadmap, rounded down; 0 for an empty roadmap.
    pub fn progress_percent(&self) -> u32 {
        match self.modules.len() {
            0 => 0,
            len => (self.completed_count() * 100 / len) as u32,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.modules.iter().all(|m| m.status == ModuleStatus::Completed)
    }

    pub fn earned_xp(&self) -> u64 {
        self.modules
            .iter()
            .filter(|m| m.status == ModuleStatus::Completed)
            .map(|m| u64::from(m.module.xp))
            .sum()
    }

    pub fn total_xp(&self) -> u64 {
        self.modules.iter().map(|m| u64::from(m.module.xp)).sum()
    }
}

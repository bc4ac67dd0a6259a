use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{Department, DoctorStatus};

/// Live counters for one department queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueState {
    pub department: Department,
    /// Date the queue is keyed under (see `RolloverPolicy`).
    pub queue_date: NaiveDate,
    /// Token currently being served; 0 before the first advance.
    pub current: u32,
    /// Highest token issued so far.
    pub total: u32,
    pub wait_minutes: u32,
}

impl QueueState {
    pub fn empty(department: Department, queue_date: NaiveDate) -> Self {
        Self {
            department,
            queue_date,
            current: 0,
            total: 0,
            wait_minutes: 0,
        }
    }

    pub fn outstanding(&self) -> u32 {
        self.total.saturating_sub(self.current)
    }
}

/// Whole-clinic counters summed over every department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicQueueSummary {
    pub date: NaiveDate,
    pub current: u32,
    pub total: u32,
    pub wait_minutes: u32,
}

/// Doctor roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub department: Department,
    pub room_number: Option<String>,
    pub description: Option<String>,
    /// Operator override: the doctor is not taking patients.
    pub off_duty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorAvailability {
    pub doctor_id: i64,
    pub department: Department,
    pub status: DoctorStatus,
}

/// Read projection served to the booking screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorView {
    pub id: i64,
    pub name: String,
    pub department: Department,
    pub status: DoctorStatus,
    pub room_number: Option<String>,
    pub description: Option<String>,
    pub queue_current: u32,
    pub queue_total: u32,
    pub wait_minutes: u32,
}

//! In-memory enrollment and coach stores.
//!
//! Suitable for tests and development; production deployments implement the
//! storage traits against their database.

use super::storage::{Coach, CoachStore, Enrollment, EnrollmentStatus, EnrollmentStore};
use crate::error::{CoachwayError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory [`EnrollmentStore`]. Cheap to clone.
#[derive(Default, Clone)]
pub struct InMemoryEnrollmentStore {
    inner: Arc<RwLock<HashMap<String, Enrollment>>>,
}

impl InMemoryEnrollmentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn get(&self, enrollment_id: &str) -> Result<Option<Enrollment>> {
        Ok(self.inner.read().unwrap().get(enrollment_id).cloned())
    }

    async fn insert(&self, enrollment: &Enrollment) -> Result<()> {
        self.inner
            .write()
            .unwrap()
            .insert(enrollment.id.clone(), enrollment.clone());
        Ok(())
    }

    async fn set_status(&self, enrollment_id: &str, status: EnrollmentStatus) -> Result<()> {
        let mut enrollments = self.inner.write().unwrap();
        let enrollment = enrollments
            .get_mut(enrollment_id)
            .ok_or_else(|| CoachwayError::not_found(format!("enrollment {}", enrollment_id)))?;
        enrollment.status = status;
        Ok(())
    }

    async fn set_coaching_coach(&self, enrollment_id: &str, coach_id: &str) -> Result<()> {
        let mut enrollments = self.inner.write().unwrap();
        let enrollment = enrollments
            .get_mut(enrollment_id)
            .ok_or_else(|| CoachwayError::not_found(format!("enrollment {}", enrollment_id)))?;
        enrollment.coaching_coach_id = Some(coach_id.to_string());
        Ok(())
    }
}

/// In-memory [`CoachStore`]. Cheap to clone.
#[derive(Default, Clone)]
pub struct InMemoryCoachStore {
    inner: Arc<RwLock<HashMap<String, Coach>>>,
}

impl InMemoryCoachStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed coaches for tests.
    pub fn seed(&self, coaches: Vec<Coach>) {
        let mut store = self.inner.write().unwrap();
        for coach in coaches {
            store.insert(coach.id.clone(), coach);
        }
    }
}

#[async_trait]
impl CoachStore for InMemoryCoachStore {
    async fn get(&self, coach_id: &str) -> Result<Option<Coach>> {
        Ok(self.inner.read().unwrap().get(coach_id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Coach>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }

    async fn insert(&self, coach: &Coach) -> Result<()> {
        self.inner
            .write()
            .unwrap()
            .insert(coach.id.clone(), coach.clone());
        Ok(())
    }

    async fn set_active(&self, coach_id: &str, is_active: bool) -> Result<()> {
        let mut coaches = self.inner.write().unwrap();
        let coach = coaches
            .get_mut(coach_id)
            .ok_or_else(|| CoachwayError::not_found(format!("coach {}", coach_id)))?;
        coach.is_active = is_active;
        Ok(())
    }

    async fn adjust_student_count(&self, coach_id: &str, delta: i32) -> Result<()> {
        let mut coaches = self.inner.write().unwrap();
        let coach = coaches
            .get_mut(coach_id)
            .ok_or_else(|| CoachwayError::not_found(format!("coach {}", coach_id)))?;
        let next = coach.current_students as i64 + delta as i64;
        coach.current_students = next.max(0) as u32;
        Ok(())
    }

    async fn add_fiscal_earnings(&self, coach_id: &str, amount: i64) -> Result<()> {
        let mut coaches = self.inner.write().unwrap();
        let coach = coaches
            .get_mut(coach_id)
            .ok_or_else(|| CoachwayError::not_found(format!("coach {}", coach_id)))?;
        coach.fiscal_year_earnings += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::storage::LeadSource;
    use chrono::NaiveDate;

    fn sample_coach(id: &str, students: u32) -> Coach {
        Coach {
            id: id.to_string(),
            name: format!("Coach {}", id),
            email: format!("{}@example.com", id),
            is_active: true,
            max_capacity: 10,
            current_students: students,
            fiscal_year_earnings: 0,
        }
    }

    #[tokio::test]
    async fn test_enrollment_roundtrip() {
        let store = InMemoryEnrollmentStore::new();
        let enrollment = Enrollment {
            id: "e1".to_string(),
            child_id: "ch1".to_string(),
            child_name: "Meera".to_string(),
            parent_email: "parent@example.com".to_string(),
            total_amount: 5999,
            lead_source: LeadSource::Parent,
            lead_source_coach_id: None,
            coaching_coach_id: None,
            program_start: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            program_end: NaiveDate::from_ymd_opt(2026, 11, 24).unwrap(),
            status: EnrollmentStatus::PendingStart,
        };

        store.insert(&enrollment).await.unwrap();

        store.set_coaching_coach("e1", "c1").await.unwrap();
        store.set_status("e1", EnrollmentStatus::Active).await.unwrap();

        let loaded = store.get("e1").await.unwrap().unwrap();
        assert_eq!(loaded.coaching_coach_id.as_deref(), Some("c1"));
        assert_eq!(loaded.status, EnrollmentStatus::Active);
    }

    #[tokio::test]
    async fn test_set_status_missing_enrollment() {
        let store = InMemoryEnrollmentStore::new();
        let err = store
            .set_status("nope", EnrollmentStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, CoachwayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_coach_counters() {
        let store = InMemoryCoachStore::new();
        store.seed(vec![sample_coach("c1", 3)]);

        store.adjust_student_count("c1", 1).await.unwrap();
        store.add_fiscal_earnings("c1", 2500).await.unwrap();

        let coach = store.get("c1").await.unwrap().unwrap();
        assert_eq!(coach.current_students, 4);
        assert_eq!(coach.fiscal_year_earnings, 2500);

        // Decrement clamps at zero.
        store.adjust_student_count("c1", -10).await.unwrap();
        let coach = store.get("c1").await.unwrap().unwrap();
        assert_eq!(coach.current_students, 0);
    }

    #[tokio::test]
    async fn test_list_active_excludes_inactive() {
        let store = InMemoryCoachStore::new();
        store.seed(vec![sample_coach("c1", 0), sample_coach("c2", 0)]);
        store.set_active("c2", false).await.unwrap();

        let active = store.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "c1");
    }
}

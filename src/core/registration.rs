//! Registration lookup - How the billing core learns who is enrolled where.
//!
//! Student and course records live outside this crate. Billing only needs to
//! know, for a course, which students are registered and at which level and
//! period the course runs, so that is all [`RegistrationLookup`] exposes.

use crate::core::pricing::{CourseLevel, CoursePeriod};
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;

/// Pricing-relevant facts about a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInfo {
    /// Course identifier
    pub course_id: String,
    /// Academic level
    pub level: CourseLevel,
    /// Time slot
    pub period: CoursePeriod,
}

/// A student's enrolment in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Enrolled student
    pub student_id: String,
    /// Course the student is enrolled in
    pub course: CourseInfo,
}

/// Source of registrations consulted when invoices are generated.
pub trait RegistrationLookup {
    /// Returns every registration for a course. An unknown course yields an empty list.
    fn registrations_for_course(
        &self,
        course_id: &str,
    ) -> impl Future<Output = Result<Vec<Registration>>> + Send;
}

/// Finds the registration of one student in one course.
pub async fn find_registration<R>(
    registrations: &R,
    student_id: &str,
    course_id: &str,
) -> Result<Registration>
where
    R: RegistrationLookup + ?Sized,
{
    registrations
        .registrations_for_course(course_id)
        .await?
        .into_iter()
        .find(|r| r.student_id == student_id)
        .ok_or_else(|| Error::RegistrationNotFound {
            student_id: student_id.to_string(),
            course_id: course_id.to_string(),
        })
}

/// Registrations held in memory, keyed by course.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistrations {
    by_course: HashMap<String, Vec<Registration>>,
}

impl InMemoryRegistrations {
    /// Creates an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a student in a course, replacing any earlier registration of
    /// that student in the same course.
    pub fn register(&mut self, student_id: impl Into<String>, course: CourseInfo) {
        let student_id = student_id.into();
        let entries = self.by_course.entry(course.course_id.clone()).or_default();
        entries.retain(|r| r.student_id != student_id);
        entries.push(Registration { student_id, course });
    }

    /// Builder form of [`InMemoryRegistrations::register`].
    #[must_use]
    pub fn with(mut self, student_id: impl Into<String>, course: CourseInfo) -> Self {
        self.register(student_id, course);
        self
    }
}

impl RegistrationLookup for InMemoryRegistrations {
    async fn registrations_for_course(&self, course_id: &str) -> Result<Vec<Registration>> {
        Ok(self.by_course.get(course_id).cloned().unwrap_or_default())
    }
}

//! Specification pattern for filtering entity sequences
//!
//! A specification is a predicate over an entity. Storage reads return plain
//! snapshots; services narrow them with specifications, which compose with
//! `and`, `or` and `not`.

/// Predicate over an entity
pub trait Specification<T>: Send + Sync {
    /// Check if the entity satisfies this specification
    fn is_satisfied_by(&self, entity: &T) -> bool;

    /// Combine with another specification using AND
    fn and<S>(self, other: S) -> AndSpecification<T>
    where
        Self: Sized + 'static,
        S: Specification<T> + 'static,
    {
        AndSpecification {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Combine with another specification using OR
    fn or<S>(self, other: S) -> OrSpecification<T>
    where
        Self: Sized + 'static,
        S: Specification<T> + 'static,
    {
        OrSpecification {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Negate this specification
    fn not(self) -> NotSpecification<T>
    where
        Self: Sized + 'static,
    {
        NotSpecification {
            inner: Box::new(self),
        }
    }
}

pub struct AndSpecification<T> {
    left: Box<dyn Specification<T>>,
    right: Box<dyn Specification<T>>,
}

impl<T> Specification<T> for AndSpecification<T> {
    fn is_satisfied_by(&self, entity: &T) -> bool {
        self.left.is_satisfied_by(entity) && self.right.is_satisfied_by(entity)
    }
}

pub struct OrSpecification<T> {
    left: Box<dyn Specification<T>>,
    right: Box<dyn Specification<T>>,
}

impl<T> Specification<T> for OrSpecification<T> {
    fn is_satisfied_by(&self, entity: &T) -> bool {
        self.left.is_satisfied_by(entity) || self.right.is_satisfied_by(entity)
    }
}

pub struct NotSpecification<T> {
    inner: Box<dyn Specification<T>>,
}

impl<T> Specification<T> for NotSpecification<T> {
    fn is_satisfied_by(&self, entity: &T) -> bool {
        !self.inner.is_satisfied_by(entity)
    }
}

/// Matches every entity
pub struct AnySpec;

impl<T> Specification<T> for AnySpec {
    fn is_satisfied_by(&self, _entity: &T) -> bool {
        true
    }
}

/// A specification backed by a closure
pub struct PredicateSpec<F> {
    predicate: F,
}

impl<T, F> Specification<T> for PredicateSpec<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn is_satisfied_by(&self, entity: &T) -> bool {
        (self.predicate)(entity)
    }
}

/// Build a specification from a closure
pub fn spec<T, F>(predicate: F) -> PredicateSpec<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    PredicateSpec { predicate }
}

/// Keep the entities of a snapshot that satisfy `spec`
pub fn select<T>(entities: Vec<T>, spec: &dyn Specification<T>) -> Vec<T> {
    entities
        .into_iter()
        .filter(|entity| spec.is_satisfied_by(entity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timesheet::entity::Project;
    use crate::domain::timesheet::specification::{ChargeableSpec, ProjectCodeSpec};

    fn project(code: &str, chargeable: bool) -> Project {
        let mut project = Project::new(code, format!("{} name", code));
        project.is_chargeable = chargeable;
        project
    }

    #[test]
    fn test_and_specification() {
        let combined = ProjectCodeSpec::new("abc").and(ChargeableSpec);

        assert!(combined.is_satisfied_by(&project("ABC", true)));
        assert!(!combined.is_satisfied_by(&project("ABC", false)));
        assert!(!combined.is_satisfied_by(&project("XYZ", true)));
    }

    #[test]
    fn test_or_and_not_specification() {
        let either = ProjectCodeSpec::new("ABC").or(ProjectCodeSpec::new("DEF"));
        assert!(either.is_satisfied_by(&project("def", false)));
        assert!(!either.is_satisfied_by(&project("XYZ", false)));

        let overhead = ChargeableSpec.not();
        assert!(overhead.is_satisfied_by(&project("ADMIN", false)));
        assert!(!overhead.is_satisfied_by(&project("ABC", true)));
    }

    #[test]
    fn test_predicate_spec_and_select() {
        let projects = vec![project("A1", true), project("B2", true), project("A3", false)];
        let starts_with_a = spec(|p: &Project| p.code.starts_with('A'));

        let selected = select(projects, &starts_with_a);
        let codes: Vec<_> = selected.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["A1", "A3"]);
    }

    #[test]
    fn test_any_spec_keeps_everything() {
        let projects = vec![project("A1", true), project("B2", false)];
        assert_eq!(select(projects, &AnySpec).len(), 2);
    }
}

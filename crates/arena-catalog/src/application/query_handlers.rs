//! Query handlers for the Template Catalog context.
//!
//! This module contains query handlers that reconstitute aggregates
//! from stored events and return read-only view DTOs.

use arena_core::aggregate::AggregateRoot;
use arena_core::error::DomainError;
use arena_core::repository::EventRepository;
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::{load_template, reconstitute};
use crate::domain::aggregates::Template;
use crate::domain::events::TEMPLATE_CREATED_EVENT_TYPE;
use crate::domain::participation::ParticipationMode;

/// Read-only view of a template aggregate.
#[derive(Debug, Serialize)]
pub struct TemplateView {
    /// The template identifier.
    pub template_id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Participation mode.
    pub mode: ParticipationMode,
    /// Current version (event count).
    pub version: i64,
}

impl TemplateView {
    fn from_aggregate(template: &Template, mode: ParticipationMode) -> Self {
        Self {
            template_id: template.id,
            name: template.name().to_owned(),
            description: template.description().to_owned(),
            mode,
            version: template.version(),
        }
    }
}

/// Retrieves a template by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the template does not exist
/// or has been retired.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_template_by_id(
    template_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<TemplateView, DomainError> {
    let template = load_template(template_id, repo).await?;
    let mode = template
        .mode()
        .ok_or(DomainError::AggregateNotFound(template_id))?;
    Ok(TemplateView::from_aggregate(&template, mode))
}

/// Lists every template that has not been retired, oldest first.
///
/// # Errors
///
/// Returns the repository's error if listing or loading fails.
pub async fn list_templates(repo: &dyn EventRepository) -> Result<Vec<TemplateView>, DomainError> {
    let ids = repo.list_aggregate_ids(TEMPLATE_CREATED_EVENT_TYPE).await?;
    let mut views = Vec::with_capacity(ids.len());
    for template_id in ids {
        let stored_events = repo.load_events(template_id).await?;
        let template = reconstitute(template_id, &stored_events)?;
        if let (true, Some(mode)) = (template.is_available(), template.mode()) {
            views.push(TemplateView::from_aggregate(&template, mode));
        }
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::command_handlers::{
        TemplateUsage, handle_create_template, handle_retire_template,
    };
    use crate::domain::commands::{CreateTemplate, RetireTemplate};
    use arena_test_support::{EmptyEventRepository, FixedClock, InMemoryEventRepository};
    use async_trait::async_trait;

    struct Unused;

    #[async_trait]
    impl TemplateUsage for Unused {
        async fn find_reference(&self, _template_id: Uuid) -> Result<Option<String>, DomainError> {
            Ok(None)
        }
    }

    async fn create(repo: &InMemoryEventRepository, name: &str, mode: ParticipationMode) -> Uuid {
        let command = CreateTemplate {
            correlation_id: Uuid::new_v4(),
            name: name.to_owned(),
            description: String::new(),
            mode,
        };
        handle_create_template(&command, &FixedClock::reference(), repo)
            .await
            .unwrap()
            .aggregate_id
    }

    #[tokio::test]
    async fn test_get_template_by_id_returns_view_with_state() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let template_id = create(&repo, "Escape Room", ParticipationMode::Group).await;

        // Act
        let view = get_template_by_id(template_id, &repo).await.unwrap();

        // Assert
        assert_eq!(view.template_id, template_id);
        assert_eq!(view.name, "Escape Room");
        assert_eq!(view.mode, ParticipationMode::Group);
        assert_eq!(view.version, 1);
    }

    #[tokio::test]
    async fn test_get_template_by_id_returns_not_found_when_no_events() {
        let template_id = Uuid::new_v4();

        let result = get_template_by_id(template_id, &EmptyEventRepository).await;

        match result {
            Err(DomainError::AggregateNotFound(id)) => assert_eq!(id, template_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_templates_skips_retired() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let kept = create(&repo, "Escape Room", ParticipationMode::Group).await;
        let retired = create(&repo, "Ring Toss", ParticipationMode::Solo).await;
        handle_retire_template(
            &RetireTemplate {
                correlation_id: Uuid::new_v4(),
                template_id: retired,
            },
            &FixedClock::reference(),
            &repo,
            &Unused,
        )
        .await
        .unwrap();

        // Act
        let views = list_templates(&repo).await.unwrap();

        // Assert
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].template_id, kept);
    }
}

//! Command handlers for the Template Catalog context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use arena_core::aggregate::AggregateRoot;
use arena_core::clock::Clock;
use arena_core::error::DomainError;
use arena_core::event::{EventMetadata, decode_payload};
use arena_core::repository::{EventRepository, StoredEvent};
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::Template;
use crate::domain::commands::{CreateTemplate, RetireTemplate, UpdateTemplate};
use crate::domain::events::{CatalogEvent, CatalogEventKind};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct CatalogCommandResult {
    /// The aggregate ID affected or created by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Answers whether anything still depends on a template.
///
/// The catalog cannot see locations or sessions itself; the composition
/// root supplies an implementation that can.
#[async_trait]
pub trait TemplateUsage: Send + Sync {
    /// Returns a description of the first live reference to the template,
    /// or `None` if it is unreferenced.
    async fn find_reference(&self, template_id: Uuid) -> Result<Option<String>, DomainError>;
}

/// Reconstitutes a `Template` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(
    template_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<Template, DomainError> {
    let mut template = Template::new(template_id);
    for stored in existing_events {
        let kind: CatalogEventKind = decode_payload(stored)?;
        let event = CatalogEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        };
        template.apply(&event);
    }
    Ok(template)
}

/// Loads a template that exists and has not been retired.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if there is no such template or
/// it was retired, or the repository's error if loading fails.
pub async fn load_template(
    template_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Template, DomainError> {
    let existing_events = repo.load_events(template_id).await?;
    let template = reconstitute(template_id, &existing_events)?;
    if !template.is_available() {
        return Err(DomainError::AggregateNotFound(template_id));
    }
    Ok(template)
}

/// Handles the `CreateTemplate` command: creates a fresh aggregate and
/// persists the resulting events.
///
/// This is a CREATION command; the handler generates the `template_id`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank name, or the repository's
/// error if appending fails.
pub async fn handle_create_template(
    command: &CreateTemplate,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<CatalogCommandResult, DomainError> {
    let template_id = Uuid::new_v4();
    let mut template = Template::new(template_id);

    template.create(
        &command.name,
        &command.description,
        command.mode,
        command.correlation_id,
        clock,
    )?;

    let stored_events = template.stored_uncommitted_events();
    repo.append_events(template_id, template.version(), &stored_events)
        .await?;

    info!(%template_id, mode = %command.mode, "template created");

    Ok(CatalogCommandResult {
        aggregate_id: template_id,
        stored_events,
    })
}

/// Handles the `UpdateTemplate` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the template is missing or
/// retired, `DomainError::Validation` for a blank name, or the repository's
/// error if loading or appending fails.
pub async fn handle_update_template(
    command: &UpdateTemplate,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<CatalogCommandResult, DomainError> {
    let existing_events = repo.load_events(command.template_id).await?;
    let mut template = reconstitute(command.template_id, &existing_events)?;

    template.update(
        &command.name,
        &command.description,
        command.mode,
        command.correlation_id,
        clock,
    )?;

    let stored_events = template.stored_uncommitted_events();
    repo.append_events(command.template_id, template.version(), &stored_events)
        .await?;

    Ok(CatalogCommandResult {
        aggregate_id: command.template_id,
        stored_events,
    })
}

/// Handles the `RetireTemplate` command: refuses while any active location
/// or Active session still references the template.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the template is missing or
/// already retired, `DomainError::Conflict` if it is still referenced, or
/// the repository's error if loading or appending fails.
pub async fn handle_retire_template(
    command: &RetireTemplate,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    usage: &dyn TemplateUsage,
) -> Result<CatalogCommandResult, DomainError> {
    let mut template = load_template(command.template_id, repo).await?;

    if let Some(reference) = usage.find_reference(command.template_id).await? {
        return Err(DomainError::Conflict(format!(
            "template {} is still in use by {reference}",
            command.template_id
        )));
    }

    template.retire(command.correlation_id, clock)?;

    let stored_events = template.stored_uncommitted_events();
    repo.append_events(command.template_id, template.version(), &stored_events)
        .await?;

    info!(template_id = %command.template_id, "template retired");

    Ok(CatalogCommandResult {
        aggregate_id: command.template_id,
        stored_events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::TemplateCreated;
    use crate::domain::participation::ParticipationMode;
    use arena_test_support::{
        EmptyEventRepository, FailingEventRepository, FixedClock, InMemoryEventRepository,
        RecordingEventRepository,
    };

    struct Unused;

    #[async_trait]
    impl TemplateUsage for Unused {
        async fn find_reference(&self, _template_id: Uuid) -> Result<Option<String>, DomainError> {
            Ok(None)
        }
    }

    struct UsedBy(&'static str);

    #[async_trait]
    impl TemplateUsage for UsedBy {
        async fn find_reference(&self, _template_id: Uuid) -> Result<Option<String>, DomainError> {
            Ok(Some(self.0.to_owned()))
        }
    }

    fn create_command(name: &str, mode: ParticipationMode) -> CreateTemplate {
        CreateTemplate {
            correlation_id: Uuid::new_v4(),
            name: name.to_owned(),
            description: "Reach the summit".to_owned(),
            mode,
        }
    }

    #[tokio::test]
    async fn test_handle_create_template_persists_template_created_event() {
        // Arrange
        let clock = FixedClock::reference();
        let repo = RecordingEventRepository::new(Ok(Vec::new()));
        let command = create_command("Climbing Wall", ParticipationMode::Solo);

        // Act
        let result = handle_create_template(&command, &clock, &repo).await.unwrap();

        // Assert
        let appended = repo.appended_events();
        assert_eq!(appended.len(), 1);

        let (agg_id, expected_version, events) = &appended[0];
        assert_eq!(*agg_id, result.aggregate_id);
        assert_eq!(*expected_version, 0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "catalog.template_created");
        assert_eq!(events[0].correlation_id, command.correlation_id);
        assert_eq!(events[0].occurred_at, clock.0);
    }

    #[tokio::test]
    async fn test_handle_create_template_rejects_blank_name_without_writing() {
        let repo = RecordingEventRepository::new(Ok(Vec::new()));
        let command = create_command("  ", ParticipationMode::Group);

        let result = handle_create_template(&command, &FixedClock::reference(), &repo).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(repo.appended_events().is_empty());
    }

    #[tokio::test]
    async fn test_handle_update_template_appends_at_current_version() {
        // Arrange
        let template_id = Uuid::new_v4();
        let existing = StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_id: template_id,
            event_type: "catalog.template_created".to_owned(),
            payload: serde_json::to_value(CatalogEventKind::TemplateCreated(TemplateCreated {
                template_id,
                name: "Climbing Wall".to_owned(),
                description: String::new(),
                mode: ParticipationMode::Solo,
            }))
            .unwrap(),
            sequence_number: 1,
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            occurred_at: FixedClock::reference().0,
        };
        let repo = RecordingEventRepository::new(Ok(vec![existing]));
        let command = UpdateTemplate {
            correlation_id: Uuid::new_v4(),
            template_id,
            name: "Speed Wall".to_owned(),
            description: "Race the clock".to_owned(),
            mode: ParticipationMode::Versus,
        };

        // Act
        handle_update_template(&command, &FixedClock::reference(), &repo)
            .await
            .unwrap();

        // Assert
        let appended = repo.appended_events();
        let (_, expected_version, events) = &appended[0];
        assert_eq!(*expected_version, 1);
        assert_eq!(events[0].event_type, "catalog.template_updated");
        assert_eq!(events[0].sequence_number, 2);
    }

    #[tokio::test]
    async fn test_handle_update_template_returns_not_found_for_unknown_id() {
        let template_id = Uuid::new_v4();
        let command = UpdateTemplate {
            correlation_id: Uuid::new_v4(),
            template_id,
            name: "Speed Wall".to_owned(),
            description: String::new(),
            mode: ParticipationMode::Versus,
        };

        let result =
            handle_update_template(&command, &FixedClock::reference(), &EmptyEventRepository)
                .await;

        match result {
            Err(DomainError::AggregateNotFound(id)) => assert_eq!(id, template_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_retire_template_refuses_while_referenced() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock::reference();
        let created = handle_create_template(
            &create_command("Climbing Wall", ParticipationMode::Solo),
            &clock,
            &repo,
        )
        .await
        .unwrap();
        let command = RetireTemplate {
            correlation_id: Uuid::new_v4(),
            template_id: created.aggregate_id,
        };

        // Act
        let result =
            handle_retire_template(&command, &clock, &repo, &UsedBy("location North Hall")).await;

        // Assert
        match result {
            Err(DomainError::Conflict(msg)) => assert!(msg.contains("North Hall")),
            other => panic!("expected Conflict, got {other:?}"),
        }
        assert!(load_template(created.aggregate_id, &repo).await.is_ok());
    }

    #[tokio::test]
    async fn test_handle_retire_template_hides_template() {
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock::reference();
        let created = handle_create_template(
            &create_command("Climbing Wall", ParticipationMode::Solo),
            &clock,
            &repo,
        )
        .await
        .unwrap();
        let command = RetireTemplate {
            correlation_id: Uuid::new_v4(),
            template_id: created.aggregate_id,
        };

        handle_retire_template(&command, &clock, &repo, &Unused)
            .await
            .unwrap();

        assert!(matches!(
            load_template(created.aggregate_id, &repo).await,
            Err(DomainError::AggregateNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_handle_create_template_propagates_store_failure() {
        let command = create_command("Climbing Wall", ParticipationMode::Solo);

        let result =
            handle_create_template(&command, &FixedClock::reference(), &FailingEventRepository)
                .await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}

//! Template reference lookup backed by location and session streams.

use arena_catalog::application::command_handlers::TemplateUsage;
use arena_core::error::DomainError;
use arena_core::repository::EventRepository;
use arena_venue::application::command_handlers as venue;
use arena_venue::domain::events::LOCATION_REGISTERED_EVENT_TYPE;
use async_trait::async_trait;
use uuid::Uuid;

use crate::application::command_handlers::reconstitute;
use crate::domain::events::SESSION_STARTED_EVENT_TYPE;
use crate::domain::outcome::SessionStatus;

/// Finds active locations and Active sessions that still use a template.
pub struct StoreTemplateUsage<'a> {
    repo: &'a dyn EventRepository,
}

impl<'a> StoreTemplateUsage<'a> {
    /// Creates a lookup over the given store.
    #[must_use]
    pub fn new(repo: &'a dyn EventRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl TemplateUsage for StoreTemplateUsage<'_> {
    async fn find_reference(&self, template_id: Uuid) -> Result<Option<String>, DomainError> {
        for location_id in self
            .repo
            .list_aggregate_ids(LOCATION_REGISTERED_EVENT_TYPE)
            .await?
        {
            let stored_events = self.repo.load_events(location_id).await?;
            let location = venue::reconstitute(location_id, &stored_events)?;
            let assigned = location
                .assigned_template()
                .is_some_and(|t| t.template_id == template_id);
            if location.is_active() && assigned {
                return Ok(Some(format!("active location {}", location.name())));
            }
        }

        for session_id in self
            .repo
            .list_aggregate_ids(SESSION_STARTED_EVENT_TYPE)
            .await?
        {
            let stored_events = self.repo.load_events(session_id).await?;
            let session = reconstitute(session_id, &stored_events)?;
            if session.status() == SessionStatus::Active && session.template_id() == template_id {
                return Ok(Some(format!("active session {session_id}")));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_catalog::application::command_handlers::{
        handle_create_template, handle_retire_template, load_template,
    };
    use arena_catalog::domain::commands::{CreateTemplate, RetireTemplate};
    use arena_catalog::domain::participation::ParticipationMode;
    use arena_test_support::{FixedClock, InMemoryEventRepository};
    use arena_venue::application::command_handlers::{
        handle_activate_location, handle_assign_template, handle_deactivate_location,
        handle_register_location,
    };
    use arena_venue::domain::commands::{
        ActivateLocation, AssignTemplate, DeactivateLocation, RegisterLocation,
    };

    use crate::application::command_handlers::{handle_cancel_session, handle_start_session};
    use crate::domain::commands::{CancelSession, StartSession};

    async fn create_template(repo: &InMemoryEventRepository, name: &str) -> Uuid {
        handle_create_template(
            &CreateTemplate {
                correlation_id: Uuid::new_v4(),
                name: name.to_owned(),
                description: String::new(),
                mode: ParticipationMode::Group,
            },
            &FixedClock::reference(),
            repo,
        )
        .await
        .unwrap()
        .aggregate_id
    }

    async fn location_using(repo: &InMemoryEventRepository, template_id: Uuid, active: bool) -> Uuid {
        let location_id = handle_register_location(
            &RegisterLocation {
                correlation_id: Uuid::new_v4(),
                name: "North Hall".to_owned(),
            },
            &FixedClock::reference(),
            repo,
        )
        .await
        .unwrap()
        .aggregate_id;
        assign(repo, location_id, template_id).await.unwrap();
        if active {
            activate(repo, location_id).await.unwrap();
        }
        location_id
    }

    async fn assign(
        repo: &InMemoryEventRepository,
        location_id: Uuid,
        template_id: Uuid,
    ) -> Result<(), DomainError> {
        handle_assign_template(
            &AssignTemplate {
                correlation_id: Uuid::new_v4(),
                location_id,
                template_id,
            },
            &FixedClock::reference(),
            repo,
        )
        .await
        .map(|_| ())
    }

    async fn activate(repo: &InMemoryEventRepository, location_id: Uuid) -> Result<(), DomainError> {
        handle_activate_location(
            &ActivateLocation {
                correlation_id: Uuid::new_v4(),
                location_id,
            },
            &FixedClock::reference(),
            repo,
        )
        .await
        .map(|_| ())
    }

    /// What happens to the location between the usage check and the
    /// retirement's append.
    #[derive(Clone, Copy)]
    enum Interleaved {
        Assign { template_id: Uuid },
        Activate,
    }

    /// Runs the real lookup, then changes a location before handing the
    /// answer back.
    struct ChangedAfterCheck<'a> {
        repo: &'a InMemoryEventRepository,
        location_id: Uuid,
        change: Interleaved,
    }

    #[async_trait]
    impl TemplateUsage for ChangedAfterCheck<'_> {
        async fn find_reference(&self, template_id: Uuid) -> Result<Option<String>, DomainError> {
            let reference = StoreTemplateUsage::new(self.repo)
                .find_reference(template_id)
                .await?;
            match self.change {
                Interleaved::Assign {
                    template_id: assigned,
                } => assign(self.repo, self.location_id, assigned).await?,
                Interleaved::Activate => activate(self.repo, self.location_id).await?,
            }
            Ok(reference)
        }
    }

    async fn retire(
        repo: &InMemoryEventRepository,
        template_id: Uuid,
        usage: &dyn TemplateUsage,
    ) -> Result<(), DomainError> {
        handle_retire_template(
            &RetireTemplate {
                correlation_id: Uuid::new_v4(),
                template_id,
            },
            &FixedClock::reference(),
            repo,
            usage,
        )
        .await
        .map(|_| ())
    }

    #[tokio::test]
    async fn test_assignment_after_usage_check_blocks_retirement() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let retiring = create_template(&repo, "Laser Maze").await;
        let other = create_template(&repo, "Rope Course").await;
        let location_id = location_using(&repo, other, true).await;
        let usage = ChangedAfterCheck {
            repo: &repo,
            location_id,
            change: Interleaved::Assign {
                template_id: retiring,
            },
        };

        // Act
        let result = retire(&repo, retiring, &usage).await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::ConcurrencyConflict { aggregate_id, .. }) if aggregate_id == retiring
        ));
        let location = venue::load_location(location_id, &repo).await.unwrap();
        assert!(location.is_active());
        assert_eq!(location.assigned_template().unwrap().template_id, retiring);
        assert!(load_template(retiring, &repo).await.is_ok());
    }

    #[tokio::test]
    async fn test_activation_after_usage_check_blocks_retirement() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let retiring = create_template(&repo, "Laser Maze").await;
        let location_id = location_using(&repo, retiring, false).await;
        let usage = ChangedAfterCheck {
            repo: &repo,
            location_id,
            change: Interleaved::Activate,
        };

        // Act
        let result = retire(&repo, retiring, &usage).await;

        // Assert
        assert!(matches!(result, Err(DomainError::ConcurrencyConflict { .. })));
        let location = venue::load_location(location_id, &repo).await.unwrap();
        assert!(location.is_active());
        assert!(load_template(retiring, &repo).await.is_ok());
    }

    #[tokio::test]
    async fn test_location_cannot_be_activated_onto_retired_template() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let retiring = create_template(&repo, "Laser Maze").await;
        let location_id = location_using(&repo, retiring, false).await;
        retire(&repo, retiring, &StoreTemplateUsage::new(&repo))
            .await
            .unwrap();

        // Act
        let result = activate(&repo, location_id).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Precondition(_))));
        let location = venue::load_location(location_id, &repo).await.unwrap();
        assert!(!location.is_active());
    }

    #[tokio::test]
    async fn test_template_in_use_cannot_be_retired_until_released() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock::reference();
        let template_id = handle_create_template(
            &CreateTemplate {
                correlation_id: Uuid::new_v4(),
                name: "Laser Maze".to_owned(),
                description: String::new(),
                mode: ParticipationMode::Group,
            },
            &clock,
            &repo,
        )
        .await
        .unwrap()
        .aggregate_id;
        let location_id = handle_register_location(
            &RegisterLocation {
                correlation_id: Uuid::new_v4(),
                name: "North Hall".to_owned(),
            },
            &clock,
            &repo,
        )
        .await
        .unwrap()
        .aggregate_id;
        handle_assign_template(
            &AssignTemplate {
                correlation_id: Uuid::new_v4(),
                location_id,
                template_id,
            },
            &clock,
            &repo,
        )
        .await
        .unwrap();
        handle_activate_location(
            &ActivateLocation {
                correlation_id: Uuid::new_v4(),
                location_id,
            },
            &clock,
            &repo,
        )
        .await
        .unwrap();
        let session_id = handle_start_session(
            &StartSession {
                correlation_id: Uuid::new_v4(),
                location_id,
            },
            &clock,
            &repo,
        )
        .await
        .unwrap()
        .aggregate_id;
        let retire = RetireTemplate {
            correlation_id: Uuid::new_v4(),
            template_id,
        };
        let usage = StoreTemplateUsage::new(&repo);

        // Act / Assert
        let while_active = handle_retire_template(&retire, &clock, &repo, &usage).await;
        match while_active {
            Err(DomainError::Conflict(msg)) => assert!(msg.contains("North Hall")),
            other => panic!("expected Conflict, got {other:?}"),
        }

        handle_cancel_session(
            &CancelSession {
                correlation_id: Uuid::new_v4(),
                session_id,
            },
            &clock,
            &repo,
        )
        .await
        .unwrap();
        handle_deactivate_location(
            &DeactivateLocation {
                correlation_id: Uuid::new_v4(),
                location_id,
            },
            &clock,
            &repo,
        )
        .await
        .unwrap();

        let released = handle_retire_template(&retire, &clock, &repo, &usage).await;
        assert!(released.is_ok());
    }
}

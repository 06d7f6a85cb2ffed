use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::registry::MetadataRegistry,
    store::{
        client::{SchemaClient, StoreError},
        schema::{Comparator, FamilyDefinition},
    },
};
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::info;

///
/// ReconcileError
///

#[derive(Debug, ThisError)]
pub enum ReconcileError {
    /// A family exists with a different comparator. The comparator defines
    /// the physical sort of every stored column name, so this is never
    /// repairable in place; the run aborts.
    #[error(
        "family '{family}' exists with comparator {found}, entities declare {declared}; \
         the comparator is immutable"
    )]
    ComparatorMismatch {
        family: String,
        found: Comparator,
        declared: Comparator,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ReconcileError> for InternalError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::ComparatorMismatch { .. } => Self::new(
                ErrorClass::InvariantViolation,
                ErrorOrigin::Schema,
                err.to_string(),
            ),
            ReconcileError::Store(inner) => inner.into(),
        }
    }
}

///
/// ReconcileAction
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReconcileAction {
    Created,
    Altered,
    Unchanged,
}

///
/// ReconcileReport
///

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub actions: Vec<(String, ReconcileAction)>,
}

impl ReconcileReport {
    #[must_use]
    pub fn created(&self) -> usize {
        self.count(ReconcileAction::Created)
    }

    #[must_use]
    pub fn altered(&self) -> usize {
        self.count(ReconcileAction::Altered)
    }

    #[must_use]
    pub fn unchanged(&self) -> usize {
        self.count(ReconcileAction::Unchanged)
    }

    fn count(&self, action: ReconcileAction) -> usize {
        self.actions.iter().filter(|(_, a)| *a == action).count()
    }
}

///
/// SchemaReconciler
///
/// Drives the store's schema toward the registry's declarations: missing
/// families are created, existing families with drifted settings are
/// altered in place, up-to-date families are left alone. Running twice in
/// a row performs no second mutation.
///

pub struct SchemaReconciler<S> {
    client: Arc<S>,
}

impl<S: SchemaClient> SchemaReconciler<S> {
    #[must_use]
    pub const fn new(client: Arc<S>) -> Self {
        Self { client }
    }

    pub fn reconcile(&self, registry: &MetadataRegistry) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();
        for definition in registry.family_definitions() {
            let action = self.reconcile_family(&definition)?;
            report.actions.push((definition.name, action));
        }
        Ok(report)
    }

    fn reconcile_family(
        &self,
        definition: &FamilyDefinition,
    ) -> Result<ReconcileAction, ReconcileError> {
        let Some(existing) = self.client.describe_family(&definition.name)? else {
            self.client.create_family(definition)?;
            info!(family = %definition.name, "created column family");
            return Ok(ReconcileAction::Created);
        };

        if existing.comparator != definition.comparator {
            return Err(ReconcileError::ComparatorMismatch {
                family: definition.name.clone(),
                found: existing.comparator,
                declared: definition.comparator,
            });
        }

        if existing.settings == definition.settings {
            return Ok(ReconcileAction::Unchanged);
        }

        self.client.alter_family(definition)?;
        info!(family = %definition.name, "altered column family settings");
        Ok(ReconcileAction::Altered)
    }
}

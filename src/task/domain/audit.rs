//! Audit trail entries written for every task mutation.

use super::{AuditEntryId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Action tags recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A task was created.
    TareaCreada,
    /// A responsible delivered evidence.
    TareaEntregada,
    /// A delivery was approved.
    TareaAprobada,
    /// A delivery was rejected.
    TareaRechazada,
    /// A task was closed directly.
    TareaCompletada,
    /// A task was cancelled.
    TareaCancelada,
    /// A task was edited.
    TareaActualizada,
    /// A deadline change was recorded.
    HistorialAgregado,
    /// Images were attached.
    ImagenesAgregadas,
    /// An image was removed.
    ImagenEliminada,
}

impl AuditAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TareaCreada => "TAREA_CREADA",
            Self::TareaEntregada => "TAREA_ENTREGADA",
            Self::TareaAprobada => "TAREA_APROBADA",
            Self::TareaRechazada => "TAREA_RECHAZADA",
            Self::TareaCompletada => "TAREA_COMPLETADA",
            Self::TareaCancelada => "TAREA_CANCELADA",
            Self::TareaActualizada => "TAREA_ACTUALIZADA",
            Self::HistorialAgregado => "HISTORIAL_AGREGADO",
            Self::ImagenesAgregadas => "IMAGENES_AGREGADAS",
            Self::ImagenEliminada => "IMAGEN_ELIMINADA",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of best-effort removal of an object from external storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageCleanup {
    /// The external object was deleted.
    Deleted,
    /// Deletion failed; the object may linger.
    Failed,
}

impl StorageCleanup {
    /// Returns the value recorded in audit details.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::Failed => "failed",
        }
    }
}

/// An append-only audit record (bitácora).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry identifier.
    #[serde(skip)]
    pub id: AuditEntryId,
    /// Action tag.
    #[serde(rename = "accion")]
    pub action: AuditAction,
    /// Human-readable description.
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Acting user, when known.
    #[serde(rename = "usuarioId", skip_serializing_if = "Option::is_none")]
    pub actor: Option<UserId>,
    /// Structured detail payload.
    #[serde(rename = "detalles")]
    pub details: Value,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry with a fresh identifier.
    #[must_use]
    pub fn new(
        action: AuditAction,
        description: impl Into<String>,
        actor: Option<UserId>,
        details: Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            action,
            description: description.into(),
            actor,
            details,
            timestamp,
        }
    }
}

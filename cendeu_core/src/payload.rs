//! Queue payload schema shared by the dispatcher and the consumer.
//!
//! The field names are fixed by the downstream integration and kept in
//! the regulator's vocabulary. Every field is mandatory: a payload with
//! missing fields fails deserialization outright instead of being
//! silently defaulted.

use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::cuit::{Cuit, CuitError};
use crate::parser::ParsedRecord;

/// Envelope for a batch of debtor update events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtorUpdateBatch {
    pub deudores: Vec<DebtorUpdate>,
}

/// One per-line debtor update event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorUpdate {
    pub cuit: String,
    pub situacion: u8,
    pub monto: u64,
    pub codigo_entidad: String,
    pub fecha_informacion: String,
    pub tipo_identificacion: String,
    pub actividad: String,
    /// Together with `linea_archivo`, the idempotency key that lets the
    /// store absorb at-least-once redelivery without double-counting.
    pub importacion_id: String,
    pub linea_archivo: u64,
}

/// Errors raised by per-update semantic validation on the consumer side.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum UpdateValidationError {
    #[snafu(display("invalid debtor identifier"))]
    InvalidCuit { source: CuitError },
    #[snafu(display("situacion {situacion} outside the 0-9 range"))]
    SituacionOutOfRange { situacion: u8 },
}

/// A [`DebtorUpdate`] that passed semantic validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDebtorUpdate {
    pub cuit: Cuit,
    pub severity: u8,
    pub amount: u64,
    pub run_id: String,
    pub line_number: u64,
}

impl DebtorUpdate {
    /// Build the update event for one parsed line of a run.
    pub fn from_record(record: &ParsedRecord, run_id: &str, line_number: u64) -> Self {
        DebtorUpdate {
            cuit: record.debtor_id.clone(),
            situacion: record.severity,
            monto: record.loan_amount,
            codigo_entidad: record.entity_code.clone(),
            fecha_informacion: record.info_date.clone(),
            tipo_identificacion: record.id_type.clone(),
            actividad: record.activity_code.clone(),
            importacion_id: run_id.to_string(),
            linea_archivo: line_number,
        }
    }

    /// Validate the event semantics: cuit format and situacion range.
    pub fn validate(&self) -> Result<ValidDebtorUpdate, UpdateValidationError> {
        let cuit = Cuit::new(self.cuit.clone())
            .map_err(|source| UpdateValidationError::InvalidCuit { source })?;

        if self.situacion > 9 {
            return Err(UpdateValidationError::SituacionOutOfRange {
                situacion: self.situacion,
            });
        }

        Ok(ValidDebtorUpdate {
            cuit,
            severity: self.situacion,
            amount: self.monto,
            run_id: self.importacion_id.clone(),
            line_number: self.linea_archivo,
        })
    }
}

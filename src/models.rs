//! Wire and store payloads.
//!
//! Field names follow the store schema this service inherited: person
//! documents carry `namePerson`/`type`/`courses`, attendance entries carry
//! `estadoAsistencia`/`horaRegistro`, and the request/response bodies use the
//! Spanish keys the frontend already sends (`estudiante`, `fecha`, `hora`,
//! `curso`, `estado`).

use serde::{Deserialize, Serialize};

/// Registration request body. Required-field checks happen after
/// deserialization so a missing field gets the validation message instead of
/// a decode error.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub estudiante: Option<String>,
    #[serde(default, rename = "estadoAsistencia")]
    pub estado_asistencia: Option<String>,
    #[serde(default, rename = "courseID")]
    pub course_id: Option<String>,
}

/// A `person` collection document. Managed by an external system; this
/// service only reads it.
#[derive(Debug, Clone, Deserialize)]
pub struct Person {
    #[serde(rename = "namePerson")]
    pub name: String,
    #[serde(rename = "type")]
    pub role: String,
    #[serde(default)]
    pub courses: Vec<String>,
}

/// One student's slot in a per-(course, date) attendance document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    #[serde(rename = "estadoAsistencia")]
    pub estado_asistencia: String,
    #[serde(rename = "horaRegistro")]
    pub hora_registro: String,
}

/// Terminal outcomes of one registration attempt. Every invocation is
/// independent; no state survives between calls.
#[derive(Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// An entry for this student already existed today; nothing was written.
    Duplicate {
        student_id: String,
        fecha: String,
        existing: AttendanceEntry,
    },
    /// The entry was written. `created` distinguishes a fresh attendance
    /// document from a merge into an existing one.
    Registered {
        created: bool,
        student_id: String,
        estudiante: String,
        fecha: String,
        hora: String,
        curso: String,
        estado: String,
    },
}

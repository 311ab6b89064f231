//! # Attendance registrar
//!
//! The whole functional surface of the service: resolve a student by name,
//! check enrollment (advisory only), and record today's attendance entry
//! exactly once per (course, date, student).
//!
//! Attendance documents live at `courses/{courseID}/assistances/{date}` and
//! map student ids to entries, so one document aggregates a whole class for
//! one day. The first entry written for a student wins; a later sequential
//! submission gets the existing entry back instead of overwriting it.
//!
//! ## Duplicate check and the write race
//!
//! By default the duplicate check is a plain read followed by a write, which
//! matches the system this one replaced: two concurrent submissions for the
//! same new student can both pass the check and the second merge silently
//! wins at the field level. With `atomic_writes` enabled the write becomes a
//! revision-conditional merge; on conflict we re-read once and report the
//! duplicate if someone else's entry landed first.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::{AttendanceEntry, Person, RegisterOutcome, RegisterRequest},
    store::{DocPath, DocumentStore, StoreError},
};

pub const DEFAULT_COURSE: &str = "default_course";

const PERSON_COLLECTION: &str = "person";
const STUDENT_ROLE: &str = "Student";

type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub struct AttendanceRegistrar {
    store: Arc<dyn DocumentStore>,
    atomic_writes: bool,
    clock: Clock,
}

impl AttendanceRegistrar {
    pub fn new(store: Arc<dyn DocumentStore>, atomic_writes: bool) -> Self {
        Self {
            store,
            atomic_writes,
            clock: Box::new(|| Local::now().naive_local()),
        }
    }

    /// Replace the wall clock, for tests that need a pinned timestamp.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Process one registration end to end. At most one store write happens
    /// per call; validation, not-found and duplicate paths write nothing.
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterOutcome, AppError> {
        let estudiante = request.estudiante.unwrap_or_default();
        let estado = request.estado_asistencia.unwrap_or_default();
        if estudiante.is_empty() || estado.is_empty() {
            return Err(AppError::MissingFields);
        }

        let curso = match request.course_id {
            Some(curso) if !curso.is_empty() => curso,
            _ => DEFAULT_COURSE.to_string(),
        };

        info!(%estudiante, %estado, %curso, "registering attendance");

        // Date and time come from the server clock at request receipt, never
        // from the caller, so records cannot be backdated.
        let now = (self.clock)();
        let fecha = now.format("%Y-%m-%d").to_string();
        let hora = now.format("%H:%M").to_string();
        info!(%fecha, %hora, "derived timestamp");

        let (student_id, person) = self.resolve_student(&estudiante).await?;
        info!(%student_id, "student resolved");

        // Advisory only: an unenrolled student still gets registered.
        if !person.courses.contains(&curso) {
            warn!(%student_id, %curso, "student not enrolled in course");
        }

        let path = DocPath::new(["courses", curso.as_str(), "assistances", fecha.as_str()]);
        let entry = AttendanceEntry {
            estado_asistencia: estado.clone(),
            hora_registro: hora.clone(),
        };

        let snapshot = self.store.get(&path).await?;
        if let Some(snap) = &snapshot {
            if let Some(existing) = entry_for(&snap.data, &student_id)? {
                info!(%student_id, %fecha, "entry already present, not overwriting");
                return Ok(RegisterOutcome::Duplicate {
                    student_id,
                    fecha,
                    existing,
                });
            }
        }

        let patch = patch_for(&student_id, &entry)?;
        let created = snapshot.is_none();

        let revision = snapshot.and_then(|snap| snap.revision);
        if self.atomic_writes && (created || revision.is_some()) {
            match self
                .store
                .update_if_revision(&path, patch, revision.as_deref())
                .await
            {
                Ok(()) => {}
                Err(StoreError::Conflict(_)) => {
                    // Someone wrote between our read and the merge. If it was
                    // this student, report the duplicate; otherwise surface
                    // the conflict rather than retrying.
                    warn!(%path, "conditional write lost a race, re-reading");
                    let snap = self.store.get(&path).await?;
                    if let Some(snap) = &snap {
                        if let Some(existing) = entry_for(&snap.data, &student_id)? {
                            return Ok(RegisterOutcome::Duplicate {
                                student_id,
                                fecha,
                                existing,
                            });
                        }
                    }
                    return Err(StoreError::Conflict(path).into());
                }
                Err(err) => return Err(err.into()),
            }
        } else if created {
            self.store.set(&path, patch).await?;
        } else {
            // Also the atomic-mode fallback when the store reported no
            // revision for an existing document.
            self.store.update(&path, patch).await?;
        }

        if created {
            info!(%student_id, %fecha, "attendance document created");
        } else {
            info!(%student_id, %fecha, "entry merged into today's document");
        }

        Ok(RegisterOutcome::Registered {
            created,
            student_id,
            estudiante,
            fecha,
            hora,
            curso,
            estado,
        })
    }

    /// Name-to-identity resolution, once per request, never cached. When
    /// several persons share a name the store's natural ordering decides.
    async fn resolve_student(&self, estudiante: &str) -> Result<(String, Person), AppError> {
        let hits = self
            .store
            .query(
                PERSON_COLLECTION,
                &[("namePerson", estudiante), ("type", STUDENT_ROLE)],
                1,
            )
            .await?;

        let doc = hits
            .into_iter()
            .next()
            .ok_or_else(|| AppError::StudentNotFound(estudiante.to_string()))?;
        let person: Person =
            serde_json::from_value(Value::Object(doc.data)).map_err(StoreError::Json)?;
        Ok((doc.id, person))
    }
}

fn entry_for(
    data: &Map<String, Value>,
    student_id: &str,
) -> Result<Option<AttendanceEntry>, StoreError> {
    data.get(student_id)
        .map(|value| serde_json::from_value(value.clone()).map_err(StoreError::Json))
        .transpose()
}

fn patch_for(student_id: &str, entry: &AttendanceEntry) -> Result<Map<String, Value>, StoreError> {
    let mut patch = Map::new();
    patch.insert(student_id.to_string(), serde_json::to_value(entry)?);
    Ok(patch)
}

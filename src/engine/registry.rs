// src/engine/registry.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{sync::Mutex, task::JoinHandle, time::MissedTickBehavior};
use uuid::Uuid;

use crate::{
    engine::{
        clock::Clock,
        session::AttemptSession,
    },
    error::AppError,
    models::{
        attempt::AttemptView,
        exam::Exam,
        exam_result::{ExamResult, NewResult},
    },
    store::results::ResultStore,
};

struct Entry {
    session: AttemptSession,
    /// Last time the respondent touched the attempt.
    last_seen: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
}

/// A finished attempt whose result has not reached the result store yet.
struct Unsaved {
    outcome: NewResult,
    /// Submitted by the respondent rather than forced by the timer.
    requested: bool,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<Uuid, Entry>,
    /// Keyed by attempt id, which is also the id the result is stored under.
    unsaved: HashMap<Uuid, Unsaved>,
}

/// Live attempt sessions, keyed by attempt id.
///
/// Every access syncs the session with the clock first, and the background
/// ticker sweeps all sessions so timers expire even when nobody is looking.
/// A finished attempt's result stays queued here until the result store has
/// accepted it; failed writes are retried on the next access or sweep.
#[derive(Clone)]
pub struct AttemptRegistry {
    inner: Arc<Mutex<Inner>>,
    results: ResultStore,
    clock: Arc<dyn Clock>,
    retention: chrono::Duration,
    idle_timeout: chrono::Duration,
}

impl AttemptRegistry {
    pub fn new(
        results: ResultStore,
        clock: Arc<dyn Clock>,
        retention: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            results,
            clock,
            retention: chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX),
            idle_timeout: chrono::Duration::from_std(idle_timeout).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Begins a new attempt of `exam` for `respondent_id`.
    ///
    /// Drafts may only be taken by their owner, and scheduled exams only
    /// inside their window.
    pub async fn start(&self, exam: &Exam, respondent_id: &str) -> Result<AttemptView, AppError> {
        let now = self.clock.now();
        if !exam.is_published && exam.owner_id != respondent_id {
            return Err(AppError::Forbidden("This exam is not published".to_string()));
        }
        if !exam.is_open_at(now) {
            return Err(AppError::Validation("This exam is not open".to_string()));
        }

        let session = AttemptSession::start(exam, respondent_id, Arc::clone(&self.clock))?;
        let view = AttemptView::from(&session);

        tracing::info!(
            "Attempt {} of exam {} started by {}",
            session.id(),
            exam.id,
            respondent_id
        );
        self.inner.lock().await.sessions.insert(
            session.id(),
            Entry {
                session,
                last_seen: now,
                submitted_at: None,
            },
        );

        Ok(view)
    }

    pub async fn view(&self, id: Uuid, caller_id: &str) -> Result<AttemptView, AppError> {
        self.with_session(id, caller_id, |session| Ok(AttemptView::from(&*session)))
            .await
    }

    pub async fn answer(
        &self,
        id: Uuid,
        caller_id: &str,
        question_id: &str,
        value: &serde_json::Value,
    ) -> Result<AttemptView, AppError> {
        self.with_session(id, caller_id, |session| {
            session.answer(question_id, value)?;
            Ok(AttemptView::from(&*session))
        })
        .await
    }

    /// Moves to question `index`. Negative indexes are out of range like any other.
    pub async fn seek(&self, id: Uuid, caller_id: &str, index: i64) -> Result<AttemptView, AppError> {
        self.with_session(id, caller_id, |session| {
            let index = usize::try_from(index).map_err(|_| {
                AppError::InvalidState(format!("Question index {} is out of range", index))
            })?;
            session.seek(index)?;
            Ok(AttemptView::from(&*session))
        })
        .await
    }

    /// Submits the attempt and stores its result.
    ///
    /// If a previous submit could not store the result, submitting again
    /// retries the write and returns the same result.
    pub async fn submit(&self, id: Uuid, caller_id: &str) -> Result<ExamResult, AppError> {
        let now = self.clock.now();
        let (submitted, pending) = {
            let mut inner = self.inner.lock().await;
            let Inner { sessions, unsaved } = &mut *inner;
            let entry = owned_entry(sessions, id, caller_id)?;
            entry.last_seen = now;
            record_expiry(id, entry, unsaved);

            let submitted = entry.session.submit();
            if submitted.is_ok() {
                entry.submitted_at = Some(now);
            }
            (submitted, unsaved.remove(&id))
        };

        match (submitted, pending) {
            (Ok(outcome), _) => {
                tracing::info!("Attempt {} submitted by {}", id, caller_id);
                self.save(
                    id,
                    Unsaved {
                        outcome,
                        requested: true,
                    },
                )
                .await
            }
            (Err(_), Some(pending)) if pending.requested => self.save(id, pending).await,
            (Err(e), Some(pending)) => {
                self.save(id, pending).await.ok();
                Err(e)
            }
            (Err(e), None) => Err(e),
        }
    }

    /// Syncs every live session with the clock, stores every queued result
    /// and forgets sessions that are done with: submitted ones past retention
    /// and in-progress ones left idle too long.
    /// Returns how many sessions were submitted by their timer.
    pub async fn sweep(&self) -> Result<usize, AppError> {
        let now = self.clock.now();
        let (expired, pending) = {
            let mut inner = self.inner.lock().await;
            let Inner { sessions, unsaved } = &mut *inner;

            let mut expired = 0;
            for (id, entry) in sessions.iter_mut() {
                if record_expiry(*id, entry, unsaved) {
                    expired += 1;
                }
            }

            sessions.retain(|id, entry| match entry.submitted_at {
                Some(at) => now - at < self.retention || unsaved.contains_key(id),
                None if now - entry.last_seen < self.idle_timeout => true,
                None => {
                    tracing::info!("Attempt {} abandoned, discarding it", id);
                    false
                }
            });

            (expired, unsaved.drain().collect::<Vec<_>>())
        };

        let mut failure = None;
        for (id, pending) in pending {
            if let Err(e) = self.save(id, pending).await {
                failure = Some(e);
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(expired),
        }
    }

    /// Number of sessions currently held, submitted ones included.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of finished attempts whose result is still waiting to be stored.
    pub async fn unsaved_len(&self) -> usize {
        self.inner.lock().await.unsaved.len()
    }

    /// Runs [`sweep`](Self::sweep) every `period` until the runtime shuts down.
    pub fn spawn_ticker(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match self.sweep().await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!("Timer submitted {} attempt(s)", n),
                    Err(e) => tracing::error!("Attempt sweep failed: {}", e),
                }
            }
        })
    }

    async fn with_session<T, F>(&self, id: Uuid, caller_id: &str, op: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut AttemptSession) -> Result<T, AppError>,
    {
        let now = self.clock.now();
        let (outcome, pending) = {
            let mut inner = self.inner.lock().await;
            let Inner { sessions, unsaved } = &mut *inner;
            let entry = owned_entry(sessions, id, caller_id)?;
            entry.last_seen = now;
            record_expiry(id, entry, unsaved);

            (op(&mut entry.session), unsaved.remove(&id))
        };

        if let Some(pending) = pending {
            // On failure the result is queued again for the sweeper.
            self.save(id, pending).await.ok();
        }
        outcome
    }

    /// Writes a finished attempt's result under the attempt id. On failure the
    /// result goes back on the queue.
    async fn save(&self, id: Uuid, pending: Unsaved) -> Result<ExamResult, AppError> {
        match self.results.append_with_id(id, pending.outcome.clone()).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!("Failed to record result of attempt {}, will retry: {}", id, e);
                self.inner.lock().await.unsaved.insert(id, pending);
                Err(e)
            }
        }
    }
}

fn owned_entry<'a>(
    sessions: &'a mut HashMap<Uuid, Entry>,
    id: Uuid,
    caller_id: &str,
) -> Result<&'a mut Entry, AppError> {
    let entry = sessions
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

    if entry.session.respondent_id() != caller_id {
        tracing::warn!("User {} tried to access attempt {} of another user", caller_id, id);
        return Err(AppError::Forbidden("Not permitted".to_string()));
    }
    Ok(entry)
}

/// Syncs the session's timer. A timer-forced submission is queued for
/// storage; returns whether one happened.
fn record_expiry(id: Uuid, entry: &mut Entry, unsaved: &mut HashMap<Uuid, Unsaved>) -> bool {
    let Some(outcome) = entry.session.sync() else {
        return false;
    };
    entry.submitted_at = Some(outcome.completed_at);
    unsaved.insert(
        id,
        Unsaved {
            outcome,
            requested: false,
        },
    );
    true
}

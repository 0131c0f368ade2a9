//! Background reminder loop.
//!
//! Every interval the scheduler scans open tasks that carry a due date and
//! sends a reminder for each one whose window `[due - lead, due + 1h]`
//! contains the current instant. Reminders older than the window are never
//! sent, so a restart after downtime does not flood chats with stale tasks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::ValueEnum;
use taskbell_core::clock::Clock;
use taskbell_core::task::{Task, TaskFilter};
use taskbell_core::time::format_local;
use taskbell_db::{Database, DbError};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::notify::{ChatId, DeliveryError, NotificationSink};

/// How long after the due instant a reminder may still go out.
const GRACE_AFTER_DUE_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReminderPolicy {
    /// Re-send on every tick while the task is inside its window.
    #[default]
    #[value(alias = "repeat")]
    RepeatUntilExpired,
    /// Send at most one reminder per task.
    #[value(alias = "once")]
    FireOnce,
}

impl ReminderPolicy {
    pub fn allows(&self, task: &Task) -> bool {
        match self {
            ReminderPolicy::RepeatUntilExpired => true,
            ReminderPolicy::FireOnce => task.reminder_count == 0,
        }
    }
}

/// Inclusive window in which a reminder for `due` may fire.
pub fn reminder_window(
    due: DateTime<Utc>,
    lead: chrono::Duration,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (due - lead, due + chrono::Duration::seconds(GRACE_AFTER_DUE_SECS))
}

pub fn in_window(task: &Task, now: DateTime<Utc>, lead: chrono::Duration) -> bool {
    match task.due {
        Some(due) => {
            let (start, end) = reminder_window(due, lead);
            start <= now && now <= end
        }
        None => false,
    }
}

pub fn reminder_text(task: &Task, zone: Tz) -> String {
    format!(
        "⏰ Reminder (id {id}): {title}\nDue: {due}\n\nUse /done {id} if it is already finished.",
        id = task.id,
        title = task.title,
        due = format_local(task.due, zone),
    )
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub zone: Tz,
    pub lead: chrono::Duration,
    pub policy: ReminderPolicy,
    /// Fallback destination for tasks without a usable owner chat.
    pub admin_chat: Option<ChatId>,
    pub interval: Duration,
    pub send_timeout: Duration,
}

impl SchedulerConfig {
    pub fn new(zone: Tz) -> Self {
        Self {
            zone,
            lead: chrono::Duration::zero(),
            policy: ReminderPolicy::default(),
            admin_chat: None,
            interval: Duration::from_secs(60),
            send_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome counters for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks inside their window and allowed by the policy.
    pub considered: usize,
    pub fired: usize,
    pub skipped_no_destination: usize,
    pub failed: usize,
}

pub struct ReminderScheduler {
    db: Arc<dyn Database>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl ReminderScheduler {
    pub fn new(
        db: Arc<dyn Database>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            db,
            sink,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Owner chat when usable, else the admin chat.
    pub fn destination(&self, task: &Task) -> Option<ChatId> {
        task.owner_chat().or(self.config.admin_chat)
    }

    /// Scan once at the clock's current instant.
    ///
    /// Only a failed query aborts the scan. Delivery and bookkeeping failures
    /// are logged per task and the scan moves on.
    pub async fn tick(&self) -> Result<TickReport, DbError> {
        let now = self.clock.now();
        let candidates = self
            .db
            .list_tasks(&TaskFilter::reminder_candidates())
            .await?;

        let mut report = TickReport::default();
        for task in candidates {
            if !in_window(&task, now, self.config.lead) || !self.config.policy.allows(&task) {
                continue;
            }
            report.considered += 1;

            let Some(chat) = self.destination(&task) else {
                debug!(task_id = task.id, "no destination chat for reminder, skipping");
                report.skipped_no_destination += 1;
                continue;
            };

            let text = reminder_text(&task, self.config.zone);
            if let Err(e) = self.deliver(chat, &text).await {
                warn!(task_id = task.id, chat, "reminder delivery failed: {e}");
                report.failed += 1;
                continue;
            }

            match self.db.record_reminder_sent(task.id).await {
                Ok(updated) => {
                    debug!(
                        task_id = task.id,
                        chat,
                        reminder_count = updated.reminder_count,
                        "reminder sent"
                    );
                    report.fired += 1;
                }
                Err(e) => {
                    error!(task_id = task.id, "reminder sent but not recorded: {e}");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    async fn deliver(&self, chat: ChatId, text: &str) -> Result<(), DeliveryError> {
        match tokio::time::timeout(self.config.send_timeout, self.sink.send(chat, text)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(self.config.send_timeout)),
        }
    }

    /// Tick on a fixed interval until `shutdown` flips to true or its sender drops.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "reminder scheduler started (interval: {}s, lead: {}min, policy: {:?})",
            self.config.interval.as_secs(),
            self.config.lead.num_minutes(),
            self.config.policy
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(report) if report.fired > 0 || report.failed > 0 => {
                            info!(
                                fired = report.fired,
                                failed = report.failed,
                                skipped = report.skipped_no_destination,
                                "reminder scan finished"
                            );
                        }
                        Ok(report) => debug!(considered = report.considered, "reminder scan finished"),
                        Err(e) => error!("reminder scan failed: {e}"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("reminder scheduler stopped");
    }
}

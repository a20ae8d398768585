use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::events::{AppEvent, EventBus};
use crate::models::{ServiceProgress, ServiceTask};
use crate::services::local_store::{LocalStore, StoreKey};
use crate::services::scheduling;

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub duration: u32,
}

/// Customer-facing summary mirrored under `trackingProgress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSummary {
    pub booking_id: String,
    pub percent: u8,
    pub remaining_minutes: u32,
    pub done: bool,
}

impl From<&ServiceProgress> for TrackingSummary {
    fn from(p: &ServiceProgress) -> Self {
        Self {
            booking_id: p.booking_id.clone(),
            percent: scheduling::progress_percent(&p.tasks),
            remaining_minutes: scheduling::remaining_time(&p.tasks),
            done: p.is_done(),
        }
    }
}

pub fn get(store: &LocalStore, booking_id: &str) -> Option<ServiceProgress> {
    store
        .read_all::<ServiceProgress>(StoreKey::ServiceProgress)
        .into_iter()
        .find(|p| p.booking_id == booking_id)
}

fn save(store: &LocalStore, bus: &EventBus, progress: &ServiceProgress) -> AppResult<()> {
    let mut all: Vec<ServiceProgress> = store.read_all(StoreKey::ServiceProgress);
    match all.iter_mut().find(|p| p.booking_id == progress.booking_id) {
        Some(slot) => *slot = progress.clone(),
        None => all.push(progress.clone()),
    }
    store.write_all(StoreKey::ServiceProgress, &all)?;

    let mut tracking: Vec<TrackingSummary> = store.read_all(StoreKey::TrackingProgress);
    let summary = TrackingSummary::from(progress);
    match tracking.iter_mut().find(|t| t.booking_id == progress.booking_id) {
        Some(slot) => *slot = summary,
        None => tracking.push(summary),
    }
    store.write_all(StoreKey::TrackingProgress, &tracking)?;

    bus.publish(AppEvent::ServiceProgressUpdated {
        booking_id: progress.booking_id.clone(),
    });
    Ok(())
}

/// Replaces any existing progress record for the booking.
pub fn start(
    store: &LocalStore,
    bus: &EventBus,
    booking_id: &str,
    tasks: Vec<NewTask>,
    now: NaiveDateTime,
) -> AppResult<ServiceProgress> {
    if tasks.is_empty() {
        return Err(AppError::Validation("at least one task is required".to_string()));
    }
    if let Some(task) = tasks.iter().find(|t| t.name.trim().is_empty()) {
        return Err(AppError::Validation(format!(
            "task {} has no name",
            task.id.as_deref().unwrap_or("(new)")
        )));
    }

    let tasks = tasks
        .into_iter()
        .map(|t| ServiceTask {
            id: t.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: t.name,
            duration: t.duration,
            completed: false,
            actual_duration: None,
            completed_at: None,
        })
        .collect();

    let progress = ServiceProgress::new(booking_id, tasks, now);
    save(store, bus, &progress)?;
    tracing::info!(booking_id, "service progress started");
    Ok(progress)
}

/// Marks a task complete. Actual duration defaults to the minutes since the
/// previous completion, or since the job started.
pub fn complete_task(
    store: &LocalStore,
    bus: &EventBus,
    booking_id: &str,
    task_id: &str,
    actual_minutes: Option<u32>,
    now: NaiveDateTime,
) -> AppResult<ServiceProgress> {
    let mut progress = get(store, booking_id)
        .ok_or_else(|| AppError::NotFound(format!("progress for booking {booking_id}")))?;

    let since = progress
        .tasks
        .iter()
        .filter_map(|t| t.completed_at)
        .max()
        .or(progress.started_at);

    let task = progress
        .tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| AppError::NotFound(format!("task {task_id}")))?;

    if task.completed {
        return Ok(progress);
    }

    let elapsed = since
        .map(|s| u32::try_from((now - s).num_minutes().max(0)).unwrap_or(u32::MAX))
        .unwrap_or(task.duration);
    task.completed = true;
    task.completed_at = Some(now);
    task.actual_duration = Some(actual_minutes.unwrap_or(elapsed));

    progress.updated_at = Some(now);
    save(store, bus, &progress)?;
    tracing::info!(booking_id, task_id, "service task completed");
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::datetime::parse_date_time;
    use crate::services::local_store::tests::memory_store;

    fn at(s: &str) -> NaiveDateTime {
        parse_date_time(s).unwrap()
    }

    fn tasks() -> Vec<NewTask> {
        vec![
            NewTask {
                id: Some("wash".to_string()),
                name: "Wash".to_string(),
                duration: 30,
            },
            NewTask {
                id: Some("polish".to_string()),
                name: "Polish".to_string(),
                duration: 60,
            },
        ]
    }

    #[tokio::test]
    async fn test_start_and_complete_tasks() {
        let store = memory_store();
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        start(&store, &bus, "b-1", tasks(), at("2024-06-01T09:00")).unwrap();
        let progress =
            complete_task(&store, &bus, "b-1", "wash", None, at("2024-06-01T09:40")).unwrap();

        let wash = &progress.tasks[0];
        assert!(wash.completed);
        assert_eq!(wash.actual_duration, Some(40));
        assert_eq!(wash.completed_at, Some(at("2024-06-01T09:40")));

        let progress =
            complete_task(&store, &bus, "b-1", "polish", None, at("2024-06-01T10:30")).unwrap();
        assert_eq!(progress.tasks[1].actual_duration, Some(50));
        assert!(progress.is_done());

        let tracking: Vec<TrackingSummary> = store.read_all(StoreKey::TrackingProgress);
        assert_eq!(tracking[0].percent, 100);
        assert!(tracking[0].done);

        let mut updates = 0;
        while let Ok(event) = rx.try_recv() {
            if event.name() == "service-progress-updated" {
                assert_eq!(event.booking_id(), Some("b-1"));
                updates += 1;
            }
        }
        assert_eq!(updates, 3);
    }

    #[test]
    fn test_explicit_actual_duration_wins() {
        let store = memory_store();
        let bus = EventBus::default();
        start(&store, &bus, "b-1", tasks(), at("2024-06-01T09:00")).unwrap();
        let progress =
            complete_task(&store, &bus, "b-1", "polish", Some(75), at("2024-06-01T09:10")).unwrap();
        assert_eq!(progress.tasks[1].actual_duration, Some(75));
        assert_eq!(scheduling::remaining_time(&progress.tasks), 30);
    }

    #[test]
    fn test_unknown_task_and_booking() {
        let store = memory_store();
        let bus = EventBus::default();
        assert!(matches!(
            complete_task(&store, &bus, "nope", "wash", None, at("2024-06-01T09:00")),
            Err(AppError::NotFound(_))
        ));
        start(&store, &bus, "b-1", tasks(), at("2024-06-01T09:00")).unwrap();
        assert!(matches!(
            complete_task(&store, &bus, "b-1", "wax", None, at("2024-06-01T09:00")),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_huge_task_durations_keep_tracking_in_step() {
        let store = memory_store();
        let bus = EventBus::default();
        let huge = vec![
            NewTask {
                id: Some("a".to_string()),
                name: "Detail".to_string(),
                duration: 3_000_000_000,
            },
            NewTask {
                id: Some("b".to_string()),
                name: "Ceramic".to_string(),
                duration: 3_000_000_000,
            },
        ];
        start(&store, &bus, "b-1", huge, at("2024-06-01T09:00")).unwrap();

        assert!(get(&store, "b-1").is_some());
        let tracking: Vec<TrackingSummary> = store.read_all(StoreKey::TrackingProgress);
        assert_eq!(tracking.len(), 1);
        assert_eq!(tracking[0].percent, 0);
        assert_eq!(tracking[0].remaining_minutes, u32::MAX);
    }

    #[test]
    fn test_elapsed_minutes_clamp_instead_of_wrapping() {
        let store = memory_store();
        let bus = EventBus::default();
        start(&store, &bus, "b-1", tasks(), at("2024-06-01T09:00")).unwrap();

        let far_future = chrono::NaiveDate::from_ymd_opt(12000, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let progress = complete_task(&store, &bus, "b-1", "wash", None, far_future).unwrap();
        assert_eq!(progress.tasks[0].actual_duration, Some(u32::MAX));
    }

    #[test]
    fn test_start_requires_tasks() {
        let store = memory_store();
        let bus = EventBus::default();
        assert!(matches!(
            start(&store, &bus, "b-1", vec![], at("2024-06-01T09:00")),
            Err(AppError::Validation(_))
        ));
    }
}

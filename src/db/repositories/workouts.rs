use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    helpers::{
        parse_datetime, parse_exercise, parse_mode, parse_optional_datetime, parse_status,
        to_i64, to_u32, to_u64,
    },
    models::{Workout, WorkoutStatus},
    Database,
};
use crate::models::SessionSummary;

const WORKOUT_COLUMNS: &str = "id, exercise, mode, status, started_at, stopped_at, reps, \
     correct_form_frames, total_frames, skipped_frames, created_at, updated_at";

fn row_to_workout(row: &Row) -> Result<Workout> {
    let exercise: String = row.get("exercise")?;
    let mode: String = row.get("mode")?;
    let status: String = row.get("status")?;
    let started_at: String = row.get("started_at")?;
    let stopped_at: Option<String> = row.get("stopped_at")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Workout {
        id: row.get("id")?,
        exercise: parse_exercise(&exercise)?,
        mode: parse_mode(&mode)?,
        status: parse_status(&status)?,
        started_at: parse_datetime(&started_at, "started_at")?,
        stopped_at: parse_optional_datetime(stopped_at, "stopped_at")?,
        reps: to_u32(row.get("reps")?, "reps")?,
        correct_form_frames: to_u64(row.get("correct_form_frames")?, "correct_form_frames")?,
        total_frames: to_u64(row.get("total_frames")?, "total_frames")?,
        skipped_frames: to_u64(row.get("skipped_frames")?, "skipped_frames")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    pub async fn insert_workout(&self, workout: &Workout) -> Result<()> {
        let record = workout.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO workouts (id, exercise, mode, status, started_at, stopped_at, reps,
                                       correct_form_frames, total_frames, skipped_frames,
                                       created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    record.id,
                    record.exercise.as_str(),
                    record.mode.as_str(),
                    record.status.as_str(),
                    record.started_at.to_rfc3339(),
                    record.stopped_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.reps,
                    to_i64(record.correct_form_frames)?,
                    to_i64(record.total_frames)?,
                    to_i64(record.skipped_frames)?,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn update_workout_progress(
        &self,
        workout_id: &str,
        summary: SessionSummary,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let workout_id = workout_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE workouts
                 SET reps = ?1,
                     correct_form_frames = ?2,
                     total_frames = ?3,
                     skipped_frames = ?4,
                     updated_at = ?5
                 WHERE id = ?6",
                params![
                    summary.reps,
                    to_i64(summary.correct_form_frames)?,
                    to_i64(summary.total_frames)?,
                    to_i64(summary.skipped_frames)?,
                    updated_at.to_rfc3339(),
                    workout_id,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Writes the final counters and closes the workout with `status`.
    pub async fn finish_workout(
        &self,
        workout_id: &str,
        status: WorkoutStatus,
        summary: SessionSummary,
        stopped_at: DateTime<Utc>,
    ) -> Result<()> {
        let workout_id = workout_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE workouts
                 SET status = ?1,
                     reps = ?2,
                     correct_form_frames = ?3,
                     total_frames = ?4,
                     skipped_frames = ?5,
                     stopped_at = ?6,
                     updated_at = ?6
                 WHERE id = ?7",
                params![
                    status.as_str(),
                    summary.reps,
                    to_i64(summary.correct_form_frames)?,
                    to_i64(summary.total_frames)?,
                    to_i64(summary.skipped_frames)?,
                    stopped_at.to_rfc3339(),
                    workout_id,
                ],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("Workout not found"));
            }
            Ok(())
        })
        .await
    }

    pub async fn get_workout(&self, workout_id: &str) -> Result<Option<Workout>> {
        let workout_id = workout_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = ?1"
            ))?;

            let mut rows = stmt.query(params![workout_id])?;
            let workout = match rows.next()? {
                Some(row) => Some(row_to_workout(row)?),
                None => None,
            };
            Ok(workout)
        })
        .await
    }

    pub async fn get_incomplete_workout(&self) -> Result<Option<Workout>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {WORKOUT_COLUMNS}
                 FROM workouts
                 WHERE status = 'Running'
                 ORDER BY started_at DESC
                 LIMIT 1"
            ))?;

            let mut rows = stmt.query([])?;
            let workout = match rows.next()? {
                Some(row) => Some(row_to_workout(row)?),
                None => None,
            };
            Ok(workout)
        })
        .await
    }

    /// Closes a workout left `Running` by a crash. Counters keep whatever the
    /// last heartbeat wrote.
    pub async fn mark_workout_interrupted(
        &self,
        workout_id: &str,
        stopped_at: DateTime<Utc>,
    ) -> Result<()> {
        let workout_id = workout_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE workouts
                 SET status = ?1,
                     stopped_at = ?2,
                     updated_at = ?2
                 WHERE id = ?3",
                params![
                    WorkoutStatus::Interrupted.as_str(),
                    stopped_at.to_rfc3339(),
                    workout_id,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Most recent finished workouts first.
    pub async fn list_workouts(&self, limit: usize) -> Result<Vec<Workout>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {WORKOUT_COLUMNS}
                 FROM workouts
                 WHERE status != 'Running'
                 ORDER BY started_at DESC
                 LIMIT ?1"
            ))?;

            let mut rows = stmt.query(params![limit])?;
            let mut workouts = Vec::new();
            while let Some(row) = rows.next()? {
                workouts.push(row_to_workout(row)?);
            }

            Ok(workouts)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::tempdir;

    use crate::db::{Database, Workout, WorkoutMode, WorkoutStatus};
    use crate::models::{ExerciseVariant, SessionSummary};

    fn summary(reps: u32, correct: u64, total: u64) -> SessionSummary {
        SessionSummary {
            reps,
            correct_form_frames: correct,
            total_frames: total,
            skipped_frames: 1,
            form_accuracy_percent: correct as f64 / total as f64 * 100.0,
        }
    }

    #[tokio::test]
    async fn workout_lifecycle_round_trips() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("formcoach.db")).unwrap();

        let now = chrono::Utc::now();
        let workout = Workout::start(ExerciseVariant::HammerCurl, WorkoutMode::Live, now);
        db.insert_workout(&workout).await.unwrap();

        let running = db.get_incomplete_workout().await.unwrap().unwrap();
        assert_eq!(running.id, workout.id);
        assert_eq!(running.exercise, ExerciseVariant::HammerCurl);
        assert_eq!(running.status, WorkoutStatus::Running);

        db.update_workout_progress(&workout.id, summary(2, 3, 4), now)
            .await
            .unwrap();
        db.finish_workout(
            &workout.id,
            WorkoutStatus::Completed,
            summary(3, 4, 6),
            now + Duration::seconds(30),
        )
        .await
        .unwrap();

        assert!(db.get_incomplete_workout().await.unwrap().is_none());
        let stored = db.get_workout(&workout.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WorkoutStatus::Completed);
        assert_eq!(stored.reps, 3);
        assert_eq!(stored.total_frames, 6);
        assert_eq!(stored.skipped_frames, 1);
        assert!(stored.stopped_at.is_some());
        assert!((stored.form_accuracy_percent() - 66.666).abs() < 0.01);
    }

    #[tokio::test]
    async fn interrupted_workout_keeps_heartbeat_counters() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("formcoach.db")).unwrap();

        let now = chrono::Utc::now();
        let workout = Workout::start(ExerciseVariant::BicepCurl, WorkoutMode::Live, now);
        db.insert_workout(&workout).await.unwrap();
        db.update_workout_progress(&workout.id, summary(5, 10, 12), now)
            .await
            .unwrap();
        db.mark_workout_interrupted(&workout.id, now).await.unwrap();

        let stored = db.get_workout(&workout.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WorkoutStatus::Interrupted);
        assert_eq!(stored.reps, 5);
    }

    #[tokio::test]
    async fn lists_newest_finished_first() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("formcoach.db")).unwrap();
        let base = chrono::Utc::now();

        let mut ids = Vec::new();
        for offset in 0..3 {
            let started = base + Duration::minutes(offset);
            let workout = Workout::start(ExerciseVariant::BicepCurl, WorkoutMode::Upload, started);
            db.insert_workout(&workout).await.unwrap();
            db.finish_workout(&workout.id, WorkoutStatus::Completed, summary(1, 1, 1), started)
                .await
                .unwrap();
            ids.push(workout.id);
        }
        let running = Workout::start(ExerciseVariant::BicepCurl, WorkoutMode::Live, base);
        db.insert_workout(&running).await.unwrap();

        let listed = db.list_workouts(2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, ids[2]);
        assert_eq!(listed[1].id, ids[1]);
        assert!(listed.iter().all(|w| w.mode == WorkoutMode::Upload));
    }

    #[tokio::test]
    async fn finishing_unknown_workout_fails() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("formcoach.db")).unwrap();
        let result = db
            .finish_workout(
                "missing",
                WorkoutStatus::Cancelled,
                SessionSummary::default(),
                chrono::Utc::now(),
            )
            .await;
        assert!(result.is_err());
    }
}

mod common;

use std::{fs, path::Path, sync::Arc};

use formcoach_lib::db::{Database, Workout, WorkoutMode, WorkoutStatus};
use formcoach_lib::inference::{LandmarkTrace, LogisticClassifier};
use formcoach_lib::models::ExerciseVariant;
use formcoach_lib::session::PlaceholderFrames;
use formcoach_lib::settings::SettingsStore;
use formcoach_lib::workout::WorkoutController;
use tempfile::tempdir;

use common::{write_constant_model, write_trace};

fn controller(dir: &Path, db: Database) -> WorkoutController {
    let settings = SettingsStore::new(dir.join("settings.json")).unwrap();
    let model = LogisticClassifier::load(&write_constant_model(dir, 2.0)).unwrap();
    WorkoutController::new(db, Arc::new(settings), Arc::new(model))
}

#[tokio::test]
async fn uploaded_trace_is_recorded_and_listed() {
    let dir = tempdir().unwrap();
    let db = Database::new(dir.path().join("formcoach.sqlite3")).unwrap();
    let workouts = controller(dir.path(), db);

    let trace_path = write_trace(dir.path(), &[Some(150.0), Some(50.0), None, Some(150.0)]);
    let trace = LandmarkTrace::load(&trace_path).unwrap();
    let bytes = fs::read(&trace_path).unwrap();

    let info = workouts
        .process_upload_workout(
            ExerciseVariant::BicepCurl,
            &bytes,
            ".jsonl",
            |path: &Path| Ok(PlaceholderFrames::new(LandmarkTrace::load(path)?.len() as u64)),
            trace.pose_source(),
            |_, _| {},
        )
        .await
        .unwrap();

    assert_eq!(info.status, WorkoutStatus::Completed);
    assert_eq!(info.mode, WorkoutMode::Upload);
    assert_eq!(info.summary.reps, 1);
    assert_eq!(info.summary.skipped_frames, 1);

    let history = workouts.history(5).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].summary.reps, 1);
    assert_eq!(history[0].summary.total_frames, 3);
}

#[tokio::test]
async fn workout_left_running_is_interrupted_on_next_start() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("formcoach.sqlite3");

    let crashed_id = {
        let db = Database::new(db_path.clone()).unwrap();
        let workout = Workout::start(ExerciseVariant::HammerCurl, WorkoutMode::Live, chrono::Utc::now());
        db.insert_workout(&workout).await.unwrap();
        workout.id
    };

    let workouts = controller(dir.path(), Database::new(db_path).unwrap());
    let recovered = workouts.recover_incomplete().await.unwrap().unwrap();
    assert_eq!(recovered.id, crashed_id);
    assert_eq!(recovered.status, WorkoutStatus::Interrupted);

    let history = workouts.history(5).await.unwrap();
    assert_eq!(history[0].status, WorkoutStatus::Interrupted);
    assert_eq!(history[0].exercise, ExerciseVariant::HammerCurl);
}

//! Command-line front end: replay recorded workouts, browse history, print
//! form tips.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::db::{Database, WorkoutInfo};
use crate::engine::FrameReport;
use crate::inference::{LandmarkTrace, LogisticClassifier};
use crate::models::ExerciseVariant;
use crate::session::{FrameSource, GifClip, PlaceholderFrames};
use crate::settings::SettingsStore;
use crate::workout::{WorkoutController, WorkoutSnapshot};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Exercise form coach: counts reps and scores form from pose landmarks.
#[derive(Debug, Parser)]
#[command(name = "formcoach")]
#[command(about = "Rep counting and form scoring for arm exercises", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding settings.json and the workout database
    #[arg(long, env = "FORMCOACH_DATA_DIR", default_value = ".formcoach", global = true)]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a landmark trace as a live stream or as an uploaded clip
    Replay(ReplayArgs),

    /// List recorded workouts, newest first
    History {
        /// Maximum number of workouts to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Print form tips for an exercise
    Tips {
        #[arg(long, default_value = "bicep")]
        exercise: ExerciseVariant,
    },
}

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSON Lines file with one pose detection per frame
    #[arg(long)]
    pub trace: PathBuf,

    /// Animated GIF supplying the frames; defaults to one blank frame per
    /// trace entry
    #[arg(long)]
    pub clip: Option<PathBuf>,

    /// bicep or hammer
    #[arg(long, default_value = "bicep")]
    pub exercise: ExerciseVariant,

    /// Stream frames with live pacing until the clip ends or Ctrl-C
    #[arg(long)]
    pub live: bool,

    /// Classifier weights (JSON); overrides the configured model path
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Print frame timings and process CPU/memory after the workout
    #[arg(long)]
    pub stats: bool,
}

struct AppState {
    settings: Arc<SettingsStore>,
    workouts: WorkoutController,
}

impl AppState {
    fn open(data_dir: &Path, model_override: Option<&Path>) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let settings = Arc::new(SettingsStore::new(data_dir.join("settings.json"))?);
        let database = Database::new(data_dir.join("formcoach.sqlite3"))?;

        let model_path = model_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| settings.get().classifier.model_path);
        let classifier = LogisticClassifier::load(&model_path)?;
        log_info!("classifier loaded from {}", model_path.display());

        Ok(Self {
            workouts: WorkoutController::new(database, settings.clone(), Arc::new(classifier)),
            settings,
        })
    }
}

pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Replay(args) => replay(&cli.data_dir, args).await,
        Command::History { limit } => history(&cli.data_dir, limit).await,
        Command::Tips { exercise } => {
            print_tips(exercise);
            Ok(())
        }
    }
}

async fn replay(data_dir: &Path, args: ReplayArgs) -> Result<()> {
    let app = AppState::open(data_dir, args.model.as_deref())?;

    if let Some(recovered) = app.workouts.recover_incomplete().await? {
        println!(
            "Previous {} workout {} did not finish; recorded as interrupted.",
            recovered.exercise, recovered.id
        );
    }

    let trace = LandmarkTrace::load(&args.trace)?;
    if trace.is_empty() {
        log_warn!("landmark trace {} has no frames", args.trace.display());
    }

    print_tips(args.exercise);
    println!();

    if args.live {
        replay_live(&app, &args, &trace).await
    } else {
        replay_upload(&app, &args, &trace).await
    }
}

async fn replay_live(app: &AppState, args: &ReplayArgs, trace: &LandmarkTrace) -> Result<()> {
    let source: Box<dyn FrameSource + Send> = match &args.clip {
        Some(clip) => Box::new(GifClip::open(clip)?),
        None => Box::new(PlaceholderFrames::new(trace.len() as u64)),
    };

    app.workouts
        .start_live(args.exercise, source, trace.pose_source())
        .await?;
    println!(
        "Streaming {} at {} ms per frame. Press Ctrl-C to stop.",
        args.exercise,
        app.settings.get().live.frame_delay_ms
    );

    if let Some(mut updates) = app.workouts.subscribe().await {
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);
        let mut printed_frames = 0;
        loop {
            tokio::select! {
                _ = &mut interrupt => {
                    log_info!("interrupt received, ending workout");
                    break;
                }
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let update = *updates.borrow_and_update();
                    if update.frames_seen > printed_frames {
                        printed_frames = update.frames_seen;
                        if let Some(metrics) = update.latest {
                            println!("{}", metrics.overlay_lines().join("  |  "));
                        }
                    }
                }
            }
        }
    }

    // Taken before ending; the stream's last metrics go with it.
    let snapshot = app.workouts.get_snapshot().await;
    log_info!("ending workout while stream is {}", snapshot.state.phase.label());

    let info = app.workouts.end_workout().await?;
    println!();
    print_summary(&info);
    if args.stats {
        print_stats(&snapshot);
    }
    Ok(())
}

async fn replay_upload(app: &AppState, args: &ReplayArgs, trace: &LandmarkTrace) -> Result<()> {
    let on_frame = |index: u64, report: &FrameReport| match report.metrics {
        Some(metrics) => println!("Frame {index}\n{metrics}\n"),
        None => println!("Frame {index}: no pose detected\n"),
    };

    let info = match &args.clip {
        Some(clip) => {
            let bytes = fs::read(clip)
                .with_context(|| format!("failed to read clip {}", clip.display()))?;
            app.workouts
                .process_upload_workout(
                    args.exercise,
                    &bytes,
                    ".gif",
                    GifClip::open,
                    trace.pose_source(),
                    on_frame,
                )
                .await?
        }
        None => {
            // Without a clip the trace itself is the upload; each entry
            // stands for one blank frame.
            let bytes = fs::read(&args.trace)
                .with_context(|| format!("failed to read trace {}", args.trace.display()))?;
            app.workouts
                .process_upload_workout(
                    args.exercise,
                    &bytes,
                    ".jsonl",
                    |path: &Path| {
                        let frames = LandmarkTrace::load(path)?.len() as u64;
                        Ok(PlaceholderFrames::new(frames))
                    },
                    trace.pose_source(),
                    on_frame,
                )
                .await?
        }
    };

    print_summary(&info);
    if args.stats {
        print_stats(&app.workouts.get_snapshot().await);
    }
    Ok(())
}

async fn history(data_dir: &Path, limit: usize) -> Result<()> {
    let database = Database::new(data_dir.join("formcoach.sqlite3"))?;
    let workouts = database.list_workouts(limit).await?;
    if workouts.is_empty() {
        println!("No workouts recorded yet.");
        return Ok(());
    }

    for workout in workouts.into_iter().map(WorkoutInfo::from) {
        println!(
            "{}  {:<12}  {:<6}  {:<11}  reps {:>3}  form {:>6.2}%",
            workout.started_at.format("%Y-%m-%d %H:%M"),
            workout.exercise.display_name(),
            workout.mode.as_str(),
            workout.status.as_str(),
            workout.summary.reps,
            workout.summary.form_accuracy_percent,
        );
    }
    Ok(())
}

fn print_tips(exercise: ExerciseVariant) {
    println!("{} form tips:", exercise.display_name());
    for tip in exercise.form_tips() {
        println!("  - {tip}");
    }
}

fn print_summary(info: &WorkoutInfo) {
    println!("{}", info.summary);
    if info.summary.skipped_frames > 0 {
        println!("Frames without a pose: {}", info.summary.skipped_frames);
    }
}

fn print_stats(snapshot: &WorkoutSnapshot) {
    println!("{}", stats_lines(snapshot).join("\n"));
}

fn stats_lines(snapshot: &WorkoutSnapshot) -> Vec<String> {
    let telemetry = &snapshot.telemetry;
    let mut lines = vec![
        format!(
            "Frames processed: {} ({} without a pose)",
            telemetry.frame_count, telemetry.skipped_count
        ),
        format!(
            "Average frame time: {:.1} ms over the last {} frames",
            telemetry.avg_frame_ms,
            telemetry.recent_frames.len()
        ),
        format!(
            "Process CPU: {:.1}%  memory: {:.1} MB",
            telemetry.system.cpu_percent, telemetry.system.memory_mb
        ),
    ];
    if let Some(latest) = snapshot.latest {
        lines.push(format!("Last frame: {}", latest.overlay_lines().join("  |  ")));
    }
    lines
}

use std::{num::NonZeroUsize, path::PathBuf, sync::Arc, time::Duration};

use anno3d::{
    SceneUploader, SceneUploaderConfig, SceneUploaderInput, TaskCreationStrategy, UploadKind,
    UploadSummary,
};
use anno3d_annofab::{AnnofabClient, Credential, DEFAULT_ENDPOINT};
use anno3d_kitti::{CameraHorizontalFovKind, FilePathsLoader, FrameKind};
use argh::FromArgs;

const DEFAULT_KITTI_SIZE: usize = 10;

/// Upload KITTI 3D scenes to Annofab
#[derive(Debug, FromArgs)]
struct Args {
    #[argh(subcommand)]
    command: Command,

    /// annofab user id, ANNOFAB_USER_ID if not given
    #[argh(option)]
    annofab_id: Option<String>,

    /// annofab password, ANNOFAB_PASSWORD if not given
    #[argh(option)]
    annofab_pass: Option<String>,

    /// annofab personal access token, ANNOFAB_PAT if not given
    #[argh(option)]
    annofab_pat: Option<String>,

    /// annofab endpoint, ANNOFAB_ENDPOINT or https://annofab.com if not given
    #[argh(option)]
    annofab_endpoint: Option<String>,

    /// JSON file with the upload configuration
    #[argh(option)]
    config: Option<PathBuf>,

    /// maximum number of concurrent remote operations
    #[argh(option, short = 'j')]
    parallelism: Option<usize>,

    /// overwrite input data that already exists
    #[argh(switch)]
    force: bool,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum Command {
    UploadScene(UploadSceneArgs),
    UploadKitti(UploadKittiArgs),
}

/// Upload a scene as input data, tasks and annotations
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "upload-scene")]
struct UploadSceneArgs {
    /// scene.meta file or scene directory
    #[argh(positional)]
    scene_path: PathBuf,

    /// target project id
    #[argh(option, short = 'p')]
    project_id: String,

    /// prefix of the input data ids
    #[argh(option, default = "String::new()")]
    input_data_id_prefix: String,

    /// prefix of the task ids, required with --upload-kind task or annotation
    #[argh(option, default = "String::new()")]
    task_id_prefix: String,

    /// number of frames per task, all frames in one task if not given
    #[argh(option)]
    frames_per_task: Option<NonZeroUsize>,

    /// camera horizontal field of view source: settings or calib
    #[argh(option, default = "CameraHorizontalFovKind::Settings")]
    camera_horizontal_fov: CameraHorizontalFovKind,

    /// lidar mounting height in meters
    #[argh(option)]
    sensor_height: Option<f64>,

    /// how far to go: data, task or annotation (default)
    #[argh(option, default = "UploadKind::CreateAnnotation")]
    upload_kind: UploadKind,

    /// task creation: bulk_job or direct
    #[argh(option, from_str_fn(to_task_creation))]
    task_creation: Option<TaskCreationStrategy>,

    /// seconds between two polls of the task generation job
    #[argh(option)]
    job_poll_interval: Option<f64>,

    /// seconds to wait for the task generation job before giving up
    #[argh(option)]
    job_poll_timeout: Option<f64>,
}

/// Upload frames of a raw KITTI directory as input data
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "upload-kitti")]
struct UploadKittiArgs {
    /// KITTI directory holding velodyne, image_2 and calib
    #[argh(positional)]
    kitti_dir: PathBuf,

    /// target project id
    #[argh(option, short = 'p')]
    project_id: String,

    /// prefix of the input data ids
    #[argh(option, default = "String::new()")]
    input_data_id_prefix: String,

    /// dataset split: training or testing
    #[argh(option)]
    kind: Option<FrameKind>,

    /// number of frames to skip
    #[argh(option, default = "0")]
    skip: usize,

    /// number of frames to upload
    #[argh(option, default = "DEFAULT_KITTI_SIZE")]
    size: usize,

    /// camera horizontal field of view source: settings or calib
    #[argh(option, default = "CameraHorizontalFovKind::Settings")]
    camera_horizontal_fov: CameraHorizontalFovKind,

    /// lidar mounting height in meters
    #[argh(option)]
    sensor_height: Option<f64>,
}

fn to_task_creation(value: &str) -> Result<TaskCreationStrategy, String> {
    match value {
        "bulk_job" => Ok(TaskCreationStrategy::BulkJob),
        "direct" => Ok(TaskCreationStrategy::Direct),
        _ => Err(format!("unknown task creation {value}, expected bulk_job or direct")),
    }
}

fn to_duration(seconds: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("invalid duration {seconds}: {e}"))
}

/// Pick the credential: a token wins over an id and password, flags win over
/// the environment.
fn resolve_credential(
    args: &Args,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Credential, String> {
    if let Some(pat) = &args.annofab_pat {
        return Ok(Credential::Pat(pat.clone()));
    }
    if let (Some(user_id), Some(password)) = (&args.annofab_id, &args.annofab_pass) {
        return Ok(Credential::IdPass {
            user_id: user_id.clone(),
            password: password.clone(),
        });
    }
    if let Some(pat) = env("ANNOFAB_PAT") {
        return Ok(Credential::Pat(pat));
    }
    match (env("ANNOFAB_USER_ID"), env("ANNOFAB_PASSWORD")) {
        (Some(user_id), Some(password)) => Ok(Credential::IdPass { user_id, password }),
        _ => Err("no annofab credential: set --annofab-pat or --annofab-id and --annofab-pass, \
                  or the ANNOFAB_PAT, ANNOFAB_USER_ID and ANNOFAB_PASSWORD variables"
            .to_string()),
    }
}

fn resolve_endpoint(args: &Args, env: impl Fn(&str) -> Option<String>) -> String {
    args.annofab_endpoint
        .clone()
        .or_else(|| env("ANNOFAB_ENDPOINT"))
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

/// The configuration file, overridden by the flags.
fn resolve_config(args: &Args) -> Result<SceneUploaderConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            let file = std::fs::File::open(path)
                .map_err(|e| format!("cannot open {}: {e}", path.display()))?;
            serde_json::from_reader(std::io::BufReader::new(file))?
        }
        None => SceneUploaderConfig::default(),
    };

    if args.parallelism.is_some() {
        config.parallelism = args.parallelism;
    }
    config.force |= args.force;

    if let Command::UploadScene(scene) = &args.command {
        if let Some(task_creation) = scene.task_creation {
            config.task_creation = task_creation;
        }
        if let Some(interval) = scene.job_poll_interval {
            config.job_poll_interval = to_duration(interval)?;
        }
        if let Some(timeout) = scene.job_poll_timeout {
            config.job_poll_timeout = Some(to_duration(timeout)?);
        }
    }

    Ok(config)
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    let config = resolve_config(&args)?;
    let credential = resolve_credential(&args, env_var)?;
    let endpoint = resolve_endpoint(&args, env_var);

    // the blocking client must be created and dropped outside of the runtime
    log::info!("connecting to {}", endpoint);
    let client = Arc::new(AnnofabClient::new(&endpoint, &credential)?);
    let uploader = SceneUploader::new(client.clone(), config);
    log::debug!("upload config: {:?}", uploader.config());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let summary = match args.command {
        Command::UploadScene(scene) => {
            let input = SceneUploaderInput {
                project_id: scene.project_id,
                input_data_id_prefix: scene.input_data_id_prefix,
                task_id_prefix: scene.task_id_prefix,
                frames_per_task: scene.frames_per_task,
                camera_horizontal_fov: scene.camera_horizontal_fov,
                sensor_height: scene.sensor_height,
                kind: scene.upload_kind,
            };
            runtime.block_on(uploader.upload_from_path(&scene.scene_path, &input))?
        }
        Command::UploadKitti(kitti) => {
            let loader = FilePathsLoader::new(&kitti.kitti_dir, &kitti.kitti_dir, &kitti.kitti_dir);
            let frames = loader
                .load(kitti.kind)?
                .into_iter()
                .skip(kitti.skip)
                .take(kitti.size)
                .collect::<Vec<_>>();

            let input = SceneUploaderInput {
                project_id: kitti.project_id,
                input_data_id_prefix: kitti.input_data_id_prefix,
                task_id_prefix: String::new(),
                frames_per_task: None,
                camera_horizontal_fov: kitti.camera_horizontal_fov,
                sensor_height: kitti.sensor_height,
                kind: UploadKind::DataOnly,
            };
            runtime.block_on(uploader.upload_frames(frames, &input))?
        }
    };

    drop(runtime);
    log_summary(&summary);

    Ok(())
}

fn log_summary(summary: &UploadSummary) {
    log::info!(
        "done: {} input data, {} tasks, {} annotations",
        summary.data_ids.len(),
        summary.task_ids.len(),
        summary.annotation_count
    );
    log::debug!("input data: {:?}", summary.data_ids);
    log::debug!("tasks: {:?}", summary.task_ids);
}

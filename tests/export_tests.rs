use std::fs;
use std::path::Path;
use std::sync::Arc;

use posepipe::error::PipelineError;
use posepipe::pipeline::{CommandEstimator, Pose, PoseEstimator, PoseExportTransform};
use posepipe::scheduler::JobDescriptor;
use posepipe::worker::ItemTransform;

const POSE_JSON: &str = r#"{"score":0.9,"keypoints":[{"part":"nose","score":0.97,"position":{"x":540.0,"y":300.0}}]}"#;

/// Estimator that echoes a fixed pose regardless of the input path.
fn echo_estimator() -> CommandEstimator {
    CommandEstimator::new(
        "sh",
        vec!["-c".to_string(), format!("echo '{POSE_JSON}'")],
    )
}

#[tokio::test]
async fn command_estimator_parses_stdout() {
    let pose = echo_estimator()
        .estimate(Path::new("ignored.jpg"))
        .await
        .unwrap();

    assert_eq!(pose.score, 0.9);
    assert_eq!(pose.keypoints.len(), 1);
    assert_eq!(pose.keypoints[0].part, "nose");
}

#[tokio::test]
async fn command_estimator_surfaces_stderr_on_failure() {
    let estimator = CommandEstimator::new(
        "sh",
        vec!["-c".to_string(), "echo 'model blew up' >&2; exit 1".to_string()],
    );

    let err = estimator.estimate(Path::new("img.jpg")).await.unwrap_err();
    match err {
        PipelineError::Estimator(message) => assert!(message.contains("model blew up")),
        other => panic!("expected estimator error, got {other}"),
    }
}

#[tokio::test]
async fn command_estimator_rejects_non_json_output() {
    let estimator = CommandEstimator::new(
        "sh",
        vec!["-c".to_string(), "echo not json".to_string()],
    );

    let err = estimator.estimate(Path::new("img.jpg")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Json(_)));
}

#[tokio::test]
async fn export_transform_writes_json_named_after_input() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("dist");
    fs::create_dir(&output_dir).unwrap();
    fs::write(dir.path().join("IMG_0042.jpg"), b"fake image").unwrap();

    let transform =
        PoseExportTransform::new(dir.path(), &output_dir, Arc::new(echo_estimator()));
    transform
        .apply(&JobDescriptor {
            input_ref: "IMG_0042.jpg".to_string(),
            output_index: 0,
        })
        .await
        .unwrap();

    let written = fs::read(output_dir.join("IMG_0042.json")).unwrap();
    let pose: Pose = serde_json::from_slice(&written).unwrap();
    assert_eq!(pose.score, 0.9);
}

#[tokio::test]
async fn export_transform_skips_hidden_input_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("dist");
    fs::create_dir(&output_dir).unwrap();

    let transform =
        PoseExportTransform::new(dir.path(), &output_dir, Arc::new(echo_estimator()));
    transform
        .apply(&JobDescriptor {
            input_ref: ".DS_Store".to_string(),
            output_index: 0,
        })
        .await
        .unwrap();

    assert_eq!(fs::read_dir(&output_dir).unwrap().count(), 0);
}

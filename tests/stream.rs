// 该文件是 Huiyan （慧眼） 项目的一部分。
// tests/stream.rs - 实时任务测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

mod common;

use image::RgbImage;

use huiyan::{
  model::ReplayDetector,
  task::{StopReason, StreamTask, Task},
};

use common::*;

fn replay() -> ReplayDetector {
  ReplayDetector::new(
    (416, 416),
    vec![vec![
      detection(100, 10, 200, 150, 0.87, 2),
      detection(0, 0, 30, 30, 0.4, 7),
    ]],
  )
}

#[test]
fn quit_key_stops_the_loop() {
  let mut preview = RecordingPreview::quitting_after(3);
  let summary = StreamTask::new(annotator())
    .run_task(ScriptedCapture::repeat(gray(640, 480), 10), replay(), &mut preview)
    .unwrap();

  assert_eq!(summary.stop, StopReason::QuitKey);
  assert_eq!(summary.frames, 3);
  assert_eq!(preview.shown.len(), 3);
  assert!(preview.shown.iter().all(|image| image.dimensions() == (416, 416)));
}

#[test]
fn invalid_category_costs_one_box_per_frame() {
  let mut preview = RecordingPreview::default();
  let summary = StreamTask::new(annotator())
    .run_task(ScriptedCapture::repeat(gray(416, 416), 4), replay(), &mut preview)
    .unwrap();

  assert_eq!(summary.stop, StopReason::CaptureEnded);
  assert_eq!(summary.frames, 4);
  assert_eq!(summary.rendered, 4);

  let shown = &preview.shown[0];
  assert_eq!(*shown.get_pixel(100, 150), OUTLINE);
  assert_eq!(*shown.get_pixel(200, 100), OUTLINE);
  assert_eq!(*shown.get_pixel(150, 80), BACKGROUND);
}

#[test]
fn empty_frame_ends_the_stream() {
  let frames = vec![gray(416, 416), gray(416, 416), RgbImage::new(0, 0), gray(416, 416)];
  let mut preview = RecordingPreview::default();
  let summary = StreamTask::new(annotator())
    .run_task(ScriptedCapture::new(frames), replay(), &mut preview)
    .unwrap();

  assert_eq!(summary.stop, StopReason::EmptyFrame);
  assert_eq!(summary.frames, 2);
  assert_eq!(preview.shown.len(), 2);
}

#[test]
fn detector_failure_still_displays_the_frame() {
  let mut preview = RecordingPreview::default();
  let summary = StreamTask::new(annotator())
    .run_task(ScriptedCapture::repeat(gray(320, 240), 3), FailingDetector, &mut preview)
    .unwrap();

  assert_eq!(summary.frames, 3);
  assert_eq!(summary.detect_failures, 3);
  assert_eq!(summary.rendered, 0);
  assert_eq!(preview.shown.len(), 3);
}

#[test]
fn pending_interrupt_stops_after_one_frame() {
  let (tx, rx) = std::sync::mpsc::channel();
  tx.send(()).unwrap();

  let mut preview = RecordingPreview::default();
  let summary = StreamTask::new(annotator())
    .with_interrupt(rx)
    .run_task(ScriptedCapture::repeat(gray(416, 416), 5), replay(), &mut preview)
    .unwrap();

  assert_eq!(summary.stop, StopReason::Interrupted);
  assert_eq!(summary.frames, 1);
}

#[test]
fn frame_limit_is_honoured() {
  let mut preview = RecordingPreview::default();
  let summary = StreamTask::new(annotator())
    .with_frame_limit(Some(2))
    .run_task(ScriptedCapture::repeat(gray(416, 416), 5), replay(), &mut preview)
    .unwrap();

  assert_eq!(summary.stop, StopReason::FrameLimit);
  assert_eq!(summary.frames, 2);
}

#[test]
fn capture_and_preview_released_once_on_every_exit() {
  let exits: [(Vec<RgbImage>, Option<usize>, StopReason); 3] = [
    (vec![gray(416, 416); 5], Some(2), StopReason::QuitKey),
    (vec![gray(416, 416), RgbImage::new(0, 0)], None, StopReason::EmptyFrame),
    (vec![gray(416, 416); 2], None, StopReason::CaptureEnded),
  ];

  for (frames, quit_after, expected) in exits {
    let (capture, capture_drops) = DropCounted::new(ScriptedCapture::new(frames));
    let (preview, preview_drops) = DropCounted::new(RecordingPreview {
      shown: Vec::new(),
      quit_after,
    });

    let summary = StreamTask::new(annotator())
      .run_task(capture, replay(), preview)
      .unwrap();

    assert_eq!(summary.stop, expected);
    assert_eq!(capture_drops.get(), 1);
    assert_eq!(preview_drops.get(), 1);
  }
}

#[test]
fn display_error_still_releases_capture_and_preview() {
  let (capture, capture_drops) = DropCounted::new(ScriptedCapture::repeat(gray(416, 416), 3));
  let (preview, preview_drops) = DropCounted::new(BrokenPreview);

  let result = StreamTask::new(annotator()).run_task(capture, replay(), preview);

  assert!(result.is_err());
  assert_eq!(capture_drops.get(), 1);
  assert_eq!(preview_drops.get(), 1);
}

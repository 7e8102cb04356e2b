// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/task.rs - 任务定义
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

use std::{
  fmt::Display,
  io::Write,
  path::PathBuf,
  sync::mpsc::Receiver,
};

use anyhow::Context;
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::{
  frame::resize_image,
  input::CaptureSource,
  model::{Detection, Detector},
  output::{
    ImageSink, Preview,
    draw::{Annotator, Typeface},
  },
};

mod meter;
pub use self::meter::ThroughputMeter;

pub trait Task<I, D, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, detector: D, output: O) -> Result<Self::Output, Self::Error>;
}

/// 实时流结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
  /// 采集源不再产出帧
  CaptureEnded,
  /// 采集到空帧，视为摄像头断开
  EmptyFrame,
  QuitKey,
  Interrupted,
  FrameLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamSummary {
  pub frames: u64,
  pub rendered: usize,
  pub detect_failures: u64,
  pub last_fps: Option<f32>,
  pub stop: StopReason,
}

/// 采集 → 缩放 → 检测 → 标注 → 帧率 → 显示，直到收到退出信号
pub struct StreamTask<T> {
  annotator: Annotator<T>,
  interrupt: Option<Receiver<()>>,
  frame_limit: Option<u64>,
}

impl<T: Typeface> StreamTask<T> {
  pub fn new(annotator: Annotator<T>) -> Self {
    Self {
      annotator,
      interrupt: None,
      frame_limit: None,
    }
  }

  /// 每次循环检查一次中断信号
  pub fn with_interrupt(mut self, interrupt: Receiver<()>) -> Self {
    self.interrupt = Some(interrupt);
    self
  }

  pub fn with_frame_limit(mut self, frame_limit: Option<u64>) -> Self {
    self.frame_limit = frame_limit;
    self
  }
}

impl<T, C, D, P> Task<C, D, P> for StreamTask<T>
where
  T: Typeface,
  C: CaptureSource,
  D: Detector,
  P: Preview,
{
  type Output = StreamSummary;
  type Error = anyhow::Error;

  fn run_task(self, capture: C, detector: D, mut preview: P) -> Result<StreamSummary, Self::Error> {
    let (width, height) = detector.input_size();
    info!(
      "开始实时任务，采集分辨率 {}x{}，检测输入尺寸 {}x{}",
      capture.width(),
      capture.height(),
      width,
      height
    );

    let mut meter = ThroughputMeter::start();
    let mut summary = StreamSummary {
      frames: 0,
      rendered: 0,
      detect_failures: 0,
      last_fps: None,
      stop: StopReason::CaptureEnded,
    };

    for frame in capture {
      if frame.is_empty() {
        warn!("采集到空帧，结束实时任务");
        summary.stop = StopReason::EmptyFrame;
        break;
      }

      let mut frame = frame.resized(width, height);
      let detections = detector.detect(&frame.image).unwrap_or_else(|e| {
        warn!("第 {} 帧检测失败: {}", frame.index, e);
        summary.detect_failures += 1;
        Box::default()
      });
      let rendered = self.annotator.annotate(&mut frame.image, &detections);
      debug!(
        "第 {} 帧: {} 个检测，绘制 {} 个",
        frame.index,
        detections.len(),
        rendered
      );
      summary.frames += 1;
      summary.rendered += rendered;

      if let Some(fps) = meter.tick() {
        info!("FPS: {:.1}", fps);
        self.annotator.overlay_fps(&mut frame.image, fps);
        summary.last_fps = Some(fps);
      }

      preview.show(&frame.image).context("预览显示失败")?;

      if preview.quit_requested().context("读取按键失败")? {
        info!("收到退出按键，退出任务循环");
        summary.stop = StopReason::QuitKey;
        break;
      }
      if self.interrupt.as_ref().is_some_and(|rx| rx.try_recv().is_ok()) {
        warn!("中断信号接收，退出任务循环");
        summary.stop = StopReason::Interrupted;
        break;
      }
      if self.frame_limit.is_some_and(|n| summary.frames >= n) {
        info!("达到指定帧数 {}, 退出任务循环", summary.frames);
        summary.stop = StopReason::FrameLimit;
        break;
      }
    }

    info!(
      "实时任务结束: {} 帧, {} 个检测框, {:?}",
      summary.frames, summary.rendered, summary.stop
    );
    Ok(summary)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
  pub processed: usize,
  pub skipped: usize,
  pub write_failures: usize,
  pub rendered: usize,
}

/// 逐个文件: 读取 → 检测 → 审计 → 标注 → 写出
///
/// 检测在检测器输入尺寸上进行，结果缩放回原图后标注，写出的文件保持原始分辨率。
/// 审计日志记录检测器坐标系下的原始字段，每个检测一行。
pub struct BatchTask<T, W> {
  annotator: Annotator<T>,
  audit: W,
}

impl<T: Typeface, W: Write> BatchTask<T, W> {
  pub fn new(annotator: Annotator<T>, audit: W) -> Self {
    Self { annotator, audit }
  }

  fn write_audit(&mut self, detections: &[Detection]) {
    for detection in detections {
      let line = detection.audit_line();
      debug!("box: {}", line);
      if let Err(e) = writeln!(self.audit, "{}", line) {
        warn!("写入审计日志失败: {}", e);
      }
    }
  }
}

impl<T, W, I, E, D, S> Task<I, D, S> for BatchTask<T, W>
where
  T: Typeface,
  W: Write,
  I: Iterator<Item = (PathBuf, Result<RgbImage, E>)>,
  E: Display,
  D: Detector,
  S: ImageSink,
{
  type Output = BatchSummary;
  type Error = anyhow::Error;

  fn run_task(mut self, images: I, detector: D, sink: S) -> Result<BatchSummary, Self::Error> {
    let (width, height) = detector.input_size();
    info!("开始批处理任务，检测输入尺寸 {}x{}", width, height);
    let mut summary = BatchSummary::default();

    for (path, image) in images {
      let mut image = match image {
        Ok(image) => image,
        Err(e) => {
          warn!("无法读取图像 {}: {}", path.display(), e);
          summary.skipped += 1;
          continue;
        }
      };
      if image.width() == 0 || image.height() == 0 {
        warn!("图像为空: {}", path.display());
        summary.skipped += 1;
        continue;
      }

      let input = resize_image(&image, width, height);
      let detections = match detector.detect(&input) {
        Ok(detections) => detections,
        Err(e) => {
          warn!("检测失败 {}: {}", path.display(), e);
          summary.skipped += 1;
          continue;
        }
      };
      self.write_audit(&detections);

      let sx = image.width() as f32 / width as f32;
      let sy = image.height() as f32 / height as f32;
      let scaled: Vec<Detection> = detections.iter().map(|d| d.scaled(sx, sy)).collect();
      let rendered = self.annotator.annotate(&mut image, &scaled);

      match sink.save(&path, &image) {
        Ok(target) => {
          info!("{} -> {} ({} 个检测框)", path.display(), target.display(), rendered);
          summary.processed += 1;
          summary.rendered += rendered;
        }
        Err(e) => {
          warn!("无法写出图像 {}: {}", path.display(), e);
          summary.write_failures += 1;
        }
      }
    }

    if let Err(e) = self.audit.flush() {
      warn!("刷新审计日志失败: {}", e);
    }
    info!(
      "批处理完成: 处理 {} 个, 跳过 {} 个, 写出失败 {} 个",
      summary.processed, summary.skipped, summary.write_failures
    );
    Ok(summary)
  }
}

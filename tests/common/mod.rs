// 该文件是 Huiyan （慧眼） 项目的一部分。
// tests/common/mod.rs - 集成测试公共组件
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

#![allow(dead_code)]

use std::{
  cell::Cell,
  path::{Path, PathBuf},
  rc::Rc,
};

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};

use huiyan::{
  config::AnnotatorConfig,
  frame::Frame,
  input::CaptureSource,
  model::{Detection, Detector},
  output::{
    ImageSink, Preview,
    draw::{Annotator, TextMetrics, Typeface},
  },
};

pub const BACKGROUND: Rgb<u8> = Rgb([90, 90, 90]);
pub const OUTLINE: Rgb<u8> = Rgb([0, 255, 255]);

/// 每个字符 7 像素宽的方块字体
pub struct BlockTypeface;

impl Typeface for BlockTypeface {
  fn measure(&self, text: &str, _scale: f32) -> TextMetrics {
    TextMetrics {
      width: 7 * text.chars().count() as u32,
      height: 12,
      baseline: 5,
    }
  }

  fn draw(&self, image: &mut RgbImage, color: Rgb<u8>, origin: (i32, i32), scale: f32, text: &str) {
    let metrics = self.measure(text, scale);
    if metrics.width > 0 {
      let rect = Rect::at(origin.0, origin.1 - metrics.height as i32).of_size(metrics.width, metrics.height);
      draw_filled_rect_mut(image, rect, color);
    }
  }
}

pub fn annotator() -> Annotator<BlockTypeface> {
  Annotator::new(AnnotatorConfig::default(), BlockTypeface)
}

pub fn detection(x1: i32, y1: i32, x2: i32, y2: i32, score: f32, cate: i32) -> Detection {
  Detection {
    x1,
    y1,
    x2,
    y2,
    score,
    cate,
  }
}

pub fn gray(width: u32, height: u32) -> RgbImage {
  RgbImage::from_pixel(width, height, BACKGROUND)
}

/// 预先准备好的帧序列
pub struct ScriptedCapture {
  frames: std::vec::IntoIter<Frame>,
  width: u32,
  height: u32,
}

impl ScriptedCapture {
  pub fn new(frames: Vec<RgbImage>) -> Self {
    let (width, height) = frames.first().map(RgbImage::dimensions).unwrap_or((0, 0));
    let frames: Vec<Frame> = frames
      .into_iter()
      .enumerate()
      .map(|(idx, image)| Frame::new(image, idx as u64, idx as u64 * 33))
      .collect();
    Self {
      frames: frames.into_iter(),
      width,
      height,
    }
  }

  pub fn repeat(image: RgbImage, count: usize) -> Self {
    Self::new(vec![image; count])
  }
}

impl Iterator for ScriptedCapture {
  type Item = Frame;

  fn next(&mut self) -> Option<Frame> {
    self.frames.next()
  }
}

impl CaptureSource for ScriptedCapture {
  fn width(&self) -> u32 {
    self.width
  }

  fn height(&self) -> u32 {
    self.height
  }
}

#[derive(Debug, thiserror::Error)]
#[error("scripted failure")]
pub struct ScriptedError;

/// 记录显示过的画面，在第 `quit_after` 次显示后请求退出
#[derive(Default)]
pub struct RecordingPreview {
  pub shown: Vec<RgbImage>,
  pub quit_after: Option<usize>,
}

impl RecordingPreview {
  pub fn quitting_after(shows: usize) -> Self {
    Self {
      shown: Vec::new(),
      quit_after: Some(shows),
    }
  }
}

impl Preview for RecordingPreview {
  type Error = ScriptedError;

  fn show(&mut self, image: &RgbImage) -> Result<(), ScriptedError> {
    self.shown.push(image.clone());
    Ok(())
  }

  fn quit_requested(&mut self) -> Result<bool, ScriptedError> {
    Ok(self.quit_after.is_some_and(|n| self.shown.len() >= n))
  }
}

pub struct FailingDetector;

impl Detector for FailingDetector {
  type Error = ScriptedError;

  fn input_size(&self) -> (u32, u32) {
    (416, 416)
  }

  fn detect(&self, _frame: &RgbImage) -> Result<Box<[Detection]>, ScriptedError> {
    Err(ScriptedError)
  }
}

/// 所有写入都失败的输出
pub struct RejectingSink;

impl ImageSink for RejectingSink {
  type Error = ScriptedError;

  fn save(&self, _source: &Path, _image: &RgbImage) -> Result<PathBuf, ScriptedError> {
    Err(ScriptedError)
  }
}

/// 统计 drop 次数的包装
pub struct DropCounted<T> {
  inner: T,
  drops: Rc<Cell<usize>>,
}

impl<T> DropCounted<T> {
  pub fn new(inner: T) -> (Self, Rc<Cell<usize>>) {
    let drops = Rc::new(Cell::new(0));
    (
      Self {
        inner,
        drops: Rc::clone(&drops),
      },
      drops,
    )
  }
}

impl<T> Drop for DropCounted<T> {
  fn drop(&mut self) {
    self.drops.set(self.drops.get() + 1);
  }
}

impl<T: Iterator<Item = Frame>> Iterator for DropCounted<T> {
  type Item = Frame;

  fn next(&mut self) -> Option<Frame> {
    self.inner.next()
  }
}

impl<T: CaptureSource> CaptureSource for DropCounted<T> {
  fn width(&self) -> u32 {
    self.inner.width()
  }

  fn height(&self) -> u32 {
    self.inner.height()
  }
}

impl<T: Preview> Preview for DropCounted<T> {
  type Error = T::Error;

  fn show(&mut self, image: &RgbImage) -> Result<(), Self::Error> {
    self.inner.show(image)
  }

  fn quit_requested(&mut self) -> Result<bool, Self::Error> {
    self.inner.quit_requested()
  }
}

/// 第一次显示即失败的预览
pub struct BrokenPreview;

impl Preview for BrokenPreview {
  type Error = ScriptedError;

  fn show(&mut self, _image: &RgbImage) -> Result<(), ScriptedError> {
    Err(ScriptedError)
  }

  fn quit_requested(&mut self) -> Result<bool, ScriptedError> {
    Ok(false)
  }
}

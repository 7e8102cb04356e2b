// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
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

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{config::AnnotatorConfig, model::Detection};

/// 类别索引校验：`cate` 必须落在 `[0, label_table_size)` 内
pub fn validate(detection: &Detection, label_table_size: usize) -> bool {
  let valid = usize::try_from(detection.cate).is_ok_and(|cate| cate < label_table_size);
  if !valid {
    warn!("无效的类别索引: {}", detection.cate);
  }
  valid
}

/// 渲染后的文本尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMetrics {
  pub width: u32,
  /// 基线以上高度
  pub height: u32,
  /// 基线以下高度
  pub baseline: u32,
}

/// 标签框位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
  pub box_origin: (i32, i32),
  pub box_size: (u32, u32),
  /// 文字基线的 y 坐标
  pub text_baseline: i32,
}

/// 计算标签框位置。
///
/// 标签默认放在检测框左上角的正上方；超出顶部时下移到 0，
/// 超出右侧时左移贴齐右边缘。不处理底部越界、左侧越界（标签比帧还宽）
/// 以及与检测框重叠的情况。
pub fn place(detection: &Detection, metrics: &TextMetrics, frame: (u32, u32)) -> Placement {
  let (frame_width, _frame_height) = frame;
  let text_width = saturating_i32(metrics.width);
  let text_height = saturating_i32(metrics.height);
  let frame_width = saturating_i32(frame_width);

  let mut x = detection.x1;
  let mut y = detection
    .y1
    .saturating_sub(text_height)
    .saturating_sub(saturating_i32(metrics.baseline));
  if y < 0 {
    y = 0;
  }
  if x.saturating_add(text_width) > frame_width {
    x = frame_width.saturating_sub(text_width);
  }

  Placement {
    box_origin: (x, y),
    box_size: (metrics.width, metrics.height.saturating_add(metrics.baseline)),
    text_baseline: y.saturating_add(text_height),
  }
}

fn saturating_i32(value: u32) -> i32 {
  i32::try_from(value).unwrap_or(i32::MAX)
}

/// 文字测量与绘制
pub trait Typeface {
  fn measure(&self, text: &str, scale: f32) -> TextMetrics;

  /// `(x, baseline)` 为文字基线起点
  fn draw(&self, image: &mut RgbImage, color: Rgb<u8>, origin: (i32, i32), scale: f32, text: &str);
}

#[derive(Error, Debug)]
pub enum FontError {
  #[error("无法读取字体文件: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// TrueType 字体
#[derive(Clone)]
pub struct GlyphTypeface {
  font: FontArc,
}

impl GlyphTypeface {
  /// 内置 DejaVuSans
  pub fn embedded() -> Result<Self, FontError> {
    let font_data: &'static [u8] = include_bytes!("../../assets/DejaVuSans.ttf");
    Ok(Self {
      font: FontArc::try_from_slice(font_data)?,
    })
  }

  /// 优先使用指定字体，无法加载时回退到内置字体
  pub fn load(path: Option<&Path>) -> Result<Self, FontError> {
    if let Some(path) = path {
      match Self::from_file(path) {
        Ok(typeface) => return Ok(typeface),
        Err(e) => warn!("无法加载字体 {}: {}，使用内置字体", path.display(), e),
      }
    }
    Self::embedded()
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FontError> {
    let data = std::fs::read(path.as_ref())?;
    let font = FontArc::try_from_vec(data)?;
    debug!("已加载字体: {}", path.as_ref().display());
    Ok(Self { font })
  }

  fn ascent(&self, scale: f32) -> f32 {
    self.font.as_scaled(PxScale::from(scale)).ascent()
  }
}

impl Typeface for GlyphTypeface {
  fn measure(&self, text: &str, scale: f32) -> TextMetrics {
    let scaled = self.font.as_scaled(PxScale::from(scale));
    let (width, _) = text_size(PxScale::from(scale), &self.font, text);
    TextMetrics {
      width,
      height: scaled.ascent().ceil() as u32,
      baseline: (-scaled.descent()).ceil().max(0.0) as u32,
    }
  }

  fn draw(&self, image: &mut RgbImage, color: Rgb<u8>, origin: (i32, i32), scale: f32, text: &str) {
    // imageproc 以文字顶部为 y 起点
    let top = origin.1 - self.ascent(scale).ceil() as i32;
    draw_text_mut(image, color, origin.0, top, PxScale::from(scale), &self.font, text);
  }
}

/// 检测结果标注器
pub struct Annotator<T> {
  config: AnnotatorConfig,
  typeface: T,
}

impl<T: Typeface> Annotator<T> {
  pub fn new(config: AnnotatorConfig, typeface: T) -> Self {
    Self { config, typeface }
  }

  pub fn config(&self) -> &AnnotatorConfig {
    &self.config
  }

  /// 按检测器给出的顺序绘制，返回实际绘制的检测框数量。
  ///
  /// 每个检测依次绘制标签背景、标签文字、检测框。
  pub fn annotate(&self, image: &mut RgbImage, detections: &[Detection]) -> usize {
    let mut rendered = 0;

    for detection in detections {
      if !validate(detection, self.config.labels.len()) {
        continue;
      }
      let caption = caption(&self.config.labels[detection.cate as usize], detection.score);

      let metrics = self.typeface.measure(&caption, self.config.caption_scale);
      let placement = place(detection, &metrics, image.dimensions());

      let (x, y) = placement.box_origin;
      let (w, h) = placement.box_size;
      let (left, top) = (i64::from(x), i64::from(y));
      let (right, bottom) = (left + i64::from(w) - 1, top + i64::from(h) - 1);
      // 完全位于画面外的标签不绘制
      if overlaps(image, left, top, right, bottom) {
        fill_clipped(image, left, top, right, bottom, self.config.label_fill);
        self.typeface.draw(
          image,
          self.config.caption_color,
          (x, placement.text_baseline),
          self.config.caption_scale,
          &caption,
        );
      }
      draw_outline(
        image,
        detection,
        self.config.outline_color,
        self.config.outline_thickness,
      );

      rendered += 1;
    }

    rendered
  }

  /// 在固定位置绘制 `FPS: <整数>`
  pub fn overlay_fps(&self, image: &mut RgbImage, fps: f32) {
    let text = format!("FPS: {}", fps as i32);
    self.typeface.draw(
      image,
      self.config.fps_color,
      self.config.fps_origin,
      self.config.fps_scale,
      &text,
    );
  }
}

/// 标签文本: `<类别> <置信度百分比，一位小数>%`
pub fn caption(label: &str, score: f32) -> String {
  format!("{} {:.1}%", label, score * 100.0)
}

/// 使用未裁剪的原始坐标绘制检测框，线宽向框内延伸
fn draw_outline(image: &mut RgbImage, detection: &Detection, color: Rgb<u8>, thickness: u32) {
  let left = i64::from(detection.x1.min(detection.x2));
  let right = i64::from(detection.x1.max(detection.x2));
  let top = i64::from(detection.y1.min(detection.y2));
  let bottom = i64::from(detection.y1.max(detection.y2));
  let t = i64::from(thickness.max(1));

  if 2 * t >= right - left + 1 || 2 * t >= bottom - top + 1 {
    fill_clipped(image, left, top, right, bottom, color);
    return;
  }
  fill_clipped(image, left, top, right, top + t - 1, color);
  fill_clipped(image, left, bottom - t + 1, right, bottom, color);
  fill_clipped(image, left, top + t, left + t - 1, bottom - t, color);
  fill_clipped(image, right - t + 1, top + t, right, bottom - t, color);
}

fn overlaps(image: &RgbImage, left: i64, top: i64, right: i64, bottom: i64) -> bool {
  let (width, height) = image.dimensions();
  left <= right
    && top <= bottom
    && right >= 0
    && bottom >= 0
    && left < i64::from(width)
    && top < i64::from(height)
}

/// 填充闭区间矩形与画面的交集
fn fill_clipped(image: &mut RgbImage, left: i64, top: i64, right: i64, bottom: i64, color: Rgb<u8>) {
  if !overlaps(image, left, top, right, bottom) {
    return;
  }
  let (width, height) = image.dimensions();
  let l = left.max(0);
  let t = top.max(0);
  let r = right.min(i64::from(width) - 1);
  let b = bottom.min(i64::from(height) - 1);
  let rect = Rect::at(l as i32, t as i32).of_size((r - l + 1) as u32, (b - t + 1) as u32);
  draw_filled_rect_mut(image, rect, color);
}

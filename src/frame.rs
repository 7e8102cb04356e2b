// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/frame.rs - 帧定义
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

use image::{RgbImage, imageops::FilterType};

/// 帧数据
///
/// 帧缓冲区在任一时刻只属于一个处理阶段：采集 → 缩放 → 检测（只读借用）
/// → 标注（可变借用） → 显示/写出。
#[derive(Debug, Clone)]
pub struct Frame {
  /// RGB 图像数据
  pub image: RgbImage,
  /// 帧索引
  pub index: u64,
  /// 时间戳（毫秒）
  pub timestamp_ms: u64,
}

impl From<RgbImage> for Frame {
  fn from(image: RgbImage) -> Self {
    Self {
      image,
      index: 0,
      timestamp_ms: 0,
    }
  }
}

impl Frame {
  pub fn new(image: RgbImage, index: u64, timestamp_ms: u64) -> Self {
    Self {
      image,
      index,
      timestamp_ms,
    }
  }

  /// 空帧（宽或高为 0）表示摄像头断开或流结束
  pub fn is_empty(&self) -> bool {
    self.image.width() == 0 || self.image.height() == 0
  }

  /// 缩放到检测器输入尺寸，保留帧索引与时间戳
  pub fn resized(&self, width: u32, height: u32) -> Frame {
    Frame {
      image: resize_image(&self.image, width, height),
      index: self.index,
      timestamp_ms: self.timestamp_ms,
    }
  }
}

pub fn resize_image(image: &RgbImage, width: u32, height: u32) -> RgbImage {
  if image.dimensions() == (width, height) {
    return image.clone();
  }
  image::imageops::resize(image, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resize_keeps_frame_identity() {
    let frame = Frame::new(RgbImage::new(640, 480), 7, 1234);
    let resized = frame.resized(416, 416);
    assert_eq!(resized.image.dimensions(), (416, 416));
    assert_eq!(resized.index, 7);
    assert_eq!(resized.timestamp_ms, 1234);
  }

  #[test]
  fn zero_sized_frame_is_empty() {
    assert!(Frame::from(RgbImage::new(0, 0)).is_empty());
    assert!(Frame::from(RgbImage::new(16, 0)).is_empty());
    assert!(!Frame::from(RgbImage::new(1, 1)).is_empty());
  }
}

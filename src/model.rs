// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/model.rs - 检测器边界
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

use image::RgbImage;

/// 检测结果
///
/// 坐标为帧内像素坐标。检测器不保证 `x1 < x2`、`y1 < y2`，
/// 也不保证 `cate` 落在类别表范围内。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
  pub x1: i32,
  pub y1: i32,
  pub x2: i32,
  pub y2: i32,
  /// 置信度 [0, 1]
  pub score: f32,
  /// 类别索引
  pub cate: i32,
}

impl Detection {
  /// 审计记录格式: `x1 y1 x2 y2 score cate`
  pub fn audit_line(&self) -> String {
    format!(
      "{} {} {} {} {} {}",
      self.x1, self.y1, self.x2, self.y2, self.score, self.cate
    )
  }

  /// 在检测器坐标系与帧坐标系之间缩放
  pub fn scaled(&self, sx: f32, sy: f32) -> Detection {
    Detection {
      x1: (self.x1 as f32 * sx).round() as i32,
      y1: (self.y1 as f32 * sy).round() as i32,
      x2: (self.x2 as f32 * sx).round() as i32,
      y2: (self.y2 as f32 * sy).round() as i32,
      ..*self
    }
  }
}

pub trait Detector {
  type Error: std::error::Error + Send + Sync + 'static;

  /// 检测器要求的输入尺寸 (宽, 高)
  fn input_size(&self) -> (u32, u32);

  /// 结果顺序由检测器决定，不保证唯一
  fn detect(&self, frame: &RgbImage) -> Result<Box<[Detection]>, Self::Error>;
}

impl<D: Detector + ?Sized> Detector for &D {
  type Error = D::Error;

  fn input_size(&self) -> (u32, u32) {
    (**self).input_size()
  }

  fn detect(&self, frame: &RgbImage) -> Result<Box<[Detection]>, Self::Error> {
    (**self).detect(frame)
  }
}

pub trait LoadModel: Sized {
  type Error;

  fn load_model(param_path: &Path, weights_path: &Path) -> Result<Self, Self::Error>;
}

mod replay;
pub use self::replay::{ReplayDetector, ReplayDetectorError};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn audit_line_lists_raw_fields() {
    let det = Detection {
      x1: 100,
      y1: 10,
      x2: 200,
      y2: 150,
      score: 0.87,
      cate: 2,
    };
    assert_eq!(det.audit_line(), "100 10 200 150 0.87 2");
  }

  #[test]
  fn scaled_maps_corners_only() {
    let det = Detection {
      x1: 104,
      y1: 52,
      x2: 208,
      y2: 416,
      score: 0.5,
      cate: 1,
    };
    let mapped = det.scaled(640.0 / 416.0, 480.0 / 416.0);
    assert_eq!((mapped.x1, mapped.y1, mapped.x2, mapped.y2), (160, 60, 320, 480));
    assert_eq!(mapped.score, 0.5);
    assert_eq!(mapped.cate, 1);
  }
}

// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/model/replay.rs - 回放检测器
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

//! 回放已记录的检测结果。
//!
//! 参数文件给出输入尺寸 `<宽> <高>`；权重文件每行对应一帧，
//! 帧内多个检测用 `;` 分隔，每个检测为 `x1 y1 x2 y2 score cate`，
//! `-` 表示该帧无检测，`#` 开头为注释。

use std::{cell::Cell, path::Path};

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{Detection, Detector, LoadModel};

#[derive(Error, Debug)]
pub enum ReplayDetectorError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(#[from] std::io::Error),
  #[error("参数文件无效: {0}")]
  InvalidParam(String),
  #[error("记录第 {line} 行无效: {reason}")]
  InvalidRecord { line: usize, reason: String },
  #[error("输入尺寸不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  InputShapeMismatch {
    expected: (u32, u32),
    actual: (u32, u32),
  },
}

pub struct ReplayDetector {
  input_size: (u32, u32),
  frames: Box<[Box<[Detection]>]>,
  cursor: Cell<usize>,
}

impl ReplayDetector {
  pub fn new(input_size: (u32, u32), frames: Vec<Vec<Detection>>) -> Self {
    Self {
      input_size,
      frames: frames.into_iter().map(Vec::into_boxed_slice).collect(),
      cursor: Cell::new(0),
    }
  }

  pub fn recorded_frames(&self) -> usize {
    self.frames.len()
  }

  fn parse_param(text: &str) -> Result<(u32, u32), ReplayDetectorError> {
    let line = meaningful_lines(text)
      .map(|(_, line)| line)
      .next()
      .ok_or_else(|| ReplayDetectorError::InvalidParam("缺少输入尺寸".to_string()))?;

    let dims = line
      .split_whitespace()
      .map(str::parse::<u32>)
      .collect::<Result<Vec<_>, _>>()
      .map_err(|e| ReplayDetectorError::InvalidParam(e.to_string()))?;

    match dims.as_slice() {
      [w, h] if *w > 0 && *h > 0 => Ok((*w, *h)),
      _ => Err(ReplayDetectorError::InvalidParam(format!(
        "期望 `<宽> <高>`, 实际 `{}`",
        line
      ))),
    }
  }

  fn parse_records(text: &str) -> Result<Vec<Vec<Detection>>, ReplayDetectorError> {
    meaningful_lines(text)
      .map(|(line_no, line)| {
        if line == "-" {
          return Ok(Vec::new());
        }
        line
          .split(';')
          .map(str::trim)
          .filter(|item| !item.is_empty())
          .map(|item| {
            parse_detection(item).map_err(|reason| ReplayDetectorError::InvalidRecord {
              line: line_no,
              reason,
            })
          })
          .collect()
      })
      .collect()
  }
}

fn meaningful_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
  text
    .lines()
    .enumerate()
    .map(|(idx, line)| (idx + 1, line.trim()))
    .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_detection(item: &str) -> Result<Detection, String> {
  let fields: Vec<&str> = item.split_whitespace().collect();
  let &[x1, y1, x2, y2, score, cate] = fields.as_slice() else {
    return Err(format!("期望 6 个字段, 实际 {} 个: `{}`", fields.len(), item));
  };

  let int = |s: &str| s.parse::<i32>().map_err(|e| format!("`{}`: {}", s, e));
  Ok(Detection {
    x1: int(x1)?,
    y1: int(y1)?,
    x2: int(x2)?,
    y2: int(y2)?,
    score: score
      .parse::<f32>()
      .map_err(|e| format!("`{}`: {}", score, e))?,
    cate: int(cate)?,
  })
}

impl LoadModel for ReplayDetector {
  type Error = ReplayDetectorError;

  fn load_model(param_path: &Path, weights_path: &Path) -> Result<Self, Self::Error> {
    info!("加载模型参数: {}", param_path.display());
    let input_size = Self::parse_param(&std::fs::read_to_string(param_path)?)?;

    info!("加载模型权重: {}", weights_path.display());
    let frames = Self::parse_records(&std::fs::read_to_string(weights_path)?)?;
    debug!(
      "输入尺寸 {}x{}, 共 {} 帧记录",
      input_size.0,
      input_size.1,
      frames.len()
    );

    Ok(Self::new(input_size, frames))
  }
}

impl Detector for ReplayDetector {
  type Error = ReplayDetectorError;

  fn input_size(&self) -> (u32, u32) {
    self.input_size
  }

  fn detect(&self, frame: &RgbImage) -> Result<Box<[Detection]>, Self::Error> {
    if frame.dimensions() != self.input_size {
      return Err(ReplayDetectorError::InputShapeMismatch {
        expected: self.input_size,
        actual: frame.dimensions(),
      });
    }

    if self.frames.is_empty() {
      return Ok(Box::new([]));
    }

    let idx = self.cursor.get();
    self.cursor.set((idx + 1) % self.frames.len());
    Ok(self.frames[idx].clone())
  }
}

// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/config.rs - 标注与驱动配置
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

use std::path::{Path, PathBuf};

use image::Rgb;

use crate::model::LoadModel;

/// 默认类别名称
pub const BOX_CLASSES: [&str; 5] = ["black box", "blue box", "green box", "red box", "white box"];

// 模型文件
pub const STREAM_MODEL_PARAM: &str = "./model/drone-yolo-fastestv2.param";
pub const STREAM_MODEL_WEIGHTS: &str = "./model/drone-yolo-fastestv2.bin";
pub const BATCH_MODEL_PARAM: &str = "./model/yolo-fastestv2-opt.param";
pub const BATCH_MODEL_WEIGHTS: &str = "./model/yolo-fastestv2-opt.bin";

// 输入输出
pub const CAMERA_URL: &str = "v4l:///dev/video1";
pub const BATCH_INPUT_DIR: &str = "../../../test";
pub const BATCH_OUTPUT_DIR: &str = "./output_images";

// 预览窗口
pub const WINDOW_NAME: &str = "YOLO Detection";
pub const QUIT_KEY: char = 'q';

/// 检测器输入尺寸
pub const DETECTOR_INPUT_SIZE: (u32, u32) = (416, 416);

// 绘制常量
const LABEL_FILL_COLOR: [u8; 3] = [255, 255, 255]; // 白色
const CAPTION_COLOR: [u8; 3] = [0, 0, 0]; // 黑色
const OUTLINE_COLOR: [u8; 3] = [0, 255, 255]; // 青色
const OUTLINE_THICKNESS: u32 = 2;
const CAPTION_SCALE: f32 = 16.0;
const FPS_COLOR: [u8; 3] = [0, 255, 0]; // 绿色
const FPS_ORIGIN: (i32, i32) = (10, 30);
const FPS_SCALE: f32 = 32.0;

/// 类别名称表
///
/// 表长是判断类别索引是否有效的唯一依据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
  names: Box<[String]>,
}

impl LabelTable {
  pub fn new<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      names: names.into_iter().map(Into::into).collect(),
    }
  }

  pub fn boxes() -> Self {
    Self::new(BOX_CLASSES)
  }

  /// 每行一个类别名称，忽略空行与 `#` 注释
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
    let text = std::fs::read_to_string(path)?;
    Ok(Self::new(
      text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#')),
    ))
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn get(&self, cate: i32) -> Option<&str> {
    usize::try_from(cate)
      .ok()
      .and_then(|idx| self.names.get(idx))
      .map(String::as_str)
  }
}

impl std::ops::Index<usize> for LabelTable {
  type Output = str;

  fn index(&self, idx: usize) -> &str {
    &self.names[idx]
  }
}

impl Default for LabelTable {
  fn default() -> Self {
    Self::boxes()
  }
}

/// 标注器配置
#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
  pub labels: LabelTable,
  pub label_fill: Rgb<u8>,
  pub caption_color: Rgb<u8>,
  pub caption_scale: f32,
  pub outline_color: Rgb<u8>,
  pub outline_thickness: u32,
  pub fps_color: Rgb<u8>,
  /// FPS 文本基线起点
  pub fps_origin: (i32, i32),
  pub fps_scale: f32,
}

impl Default for AnnotatorConfig {
  fn default() -> Self {
    Self {
      labels: LabelTable::boxes(),
      label_fill: Rgb(LABEL_FILL_COLOR),
      caption_color: Rgb(CAPTION_COLOR),
      caption_scale: CAPTION_SCALE,
      outline_color: Rgb(OUTLINE_COLOR),
      outline_thickness: OUTLINE_THICKNESS,
      fps_color: Rgb(FPS_COLOR),
      fps_origin: FPS_ORIGIN,
      fps_scale: FPS_SCALE,
    }
  }
}

impl AnnotatorConfig {
  pub fn with_labels(mut self, labels: LabelTable) -> Self {
    self.labels = labels;
    self
  }
}

/// 模型文件路径
#[derive(Debug, Clone)]
pub struct ModelPaths {
  pub param: PathBuf,
  pub weights: PathBuf,
}

impl ModelPaths {
  pub fn new(param: impl Into<PathBuf>, weights: impl Into<PathBuf>) -> Self {
    Self {
      param: param.into(),
      weights: weights.into(),
    }
  }

  pub fn load<M: LoadModel>(&self) -> Result<M, M::Error> {
    M::load_model(&self.param, &self.weights)
  }
}

/// 实时流驱动配置
#[derive(Debug, Clone)]
pub struct StreamConfig {
  pub model: ModelPaths,
  pub camera: String,
  pub window_name: String,
  pub quit_key: char,
}

impl Default for StreamConfig {
  fn default() -> Self {
    Self {
      model: ModelPaths::new(STREAM_MODEL_PARAM, STREAM_MODEL_WEIGHTS),
      camera: CAMERA_URL.to_string(),
      window_name: WINDOW_NAME.to_string(),
      quit_key: QUIT_KEY,
    }
  }
}

/// 批处理驱动配置
#[derive(Debug, Clone)]
pub struct BatchConfig {
  pub model: ModelPaths,
  pub input_dir: PathBuf,
  pub output_dir: PathBuf,
}

impl Default for BatchConfig {
  fn default() -> Self {
    Self {
      model: ModelPaths::new(BATCH_MODEL_PARAM, BATCH_MODEL_WEIGHTS),
      input_dir: PathBuf::from(BATCH_INPUT_DIR),
      output_dir: PathBuf::from(BATCH_OUTPUT_DIR),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn label_lookup_rejects_out_of_range() {
    let labels = LabelTable::boxes();
    assert_eq!(labels.len(), 5);
    assert_eq!(labels.get(2), Some("green box"));
    assert_eq!(labels.get(-1), None);
    assert_eq!(labels.get(5), None);
  }

  #[test]
  fn label_file_skips_comments_and_blanks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labels.txt");
    std::fs::write(&path, "# drone set\nred box\n\n  blue box  \n").unwrap();

    let labels = LabelTable::from_file(&path).unwrap();
    assert_eq!(labels, LabelTable::new(["red box", "blue box"]));
  }
}

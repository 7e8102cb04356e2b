// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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
  ffi::OsStr,
  path::{Path, PathBuf},
};

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::output::ImageSink;

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("无效的文件名: {0}")]
  InvalidFileName(String),
}

/// 将标注后的图像以原文件名写入输出目录
pub struct AnnotatedImageWriter {
  output_dir: PathBuf,
}

impl AnnotatedImageWriter {
  /// 输出目录不存在时自动创建，已存在时不报错
  pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, SaveImageFileError> {
    let output_dir = output_dir.into();
    std::fs::create_dir_all(&output_dir)?;
    info!("输出目录: {}", output_dir.display());
    Ok(Self { output_dir })
  }

  fn target_path(&self, source: &Path) -> Result<PathBuf, SaveImageFileError> {
    source
      .file_name()
      .map(|name| self.output_dir.join(name))
      .ok_or_else(|| SaveImageFileError::InvalidFileName(source.display().to_string()))
  }

  /// 返回写入的路径
  pub fn write(&self, source: &Path, image: &RgbImage) -> Result<PathBuf, SaveImageFileError> {
    let target = self.target_path(source)?;
    if target.extension().and_then(OsStr::to_str).is_none() {
      return Err(SaveImageFileError::InvalidFileName(
        target.display().to_string(),
      ));
    }
    image.save(&target)?;
    debug!("保存图像到文件: {}", target.display());
    Ok(target)
  }
}

impl ImageSink for AnnotatedImageWriter {
  type Error = SaveImageFileError;

  fn save(&self, source: &Path, image: &RgbImage) -> Result<PathBuf, Self::Error> {
    self.write(source, image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn creates_missing_directory_and_tolerates_existing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("output_images");
    AnnotatedImageWriter::new(&out).unwrap();
    assert!(out.is_dir());
    AnnotatedImageWriter::new(&out).unwrap();
  }

  #[test]
  fn keeps_source_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let writer = AnnotatedImageWriter::new(dir.path()).unwrap();
    let written = writer
      .write(Path::new("/somewhere/else/shot_01.png"), &RgbImage::new(4, 4))
      .unwrap();
    assert_eq!(written, dir.path().join("shot_01.png"));
    assert_eq!(image::open(&written).unwrap().to_rgb8().dimensions(), (4, 4));
  }

  #[test]
  fn name_without_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let writer = AnnotatedImageWriter::new(dir.path()).unwrap();
    let result = writer.write(Path::new("README"), &RgbImage::new(2, 2));
    assert!(matches!(result, Err(SaveImageFileError::InvalidFileName(_))));
  }
}

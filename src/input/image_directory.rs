// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/input/image_directory.rs - 图像目录输入
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

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum ImageDirectoryError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像解码错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 目录中的常规文件，按文件名排序后逐个解码
pub struct ImageDirectory {
  entries: std::vec::IntoIter<PathBuf>,
}

impl ImageDirectory {
  pub fn open(dir: impl AsRef<Path>) -> Result<Self, ImageDirectoryError> {
    let dir = dir.as_ref();
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).inspect_err(|e| {
      error!("无法读取输入目录 {}: {}", dir.display(), e);
    })? {
      let path = entry?.path();
      if path.is_file() {
        entries.push(path);
      }
    }
    entries.sort();
    debug!("输入目录 {} 共 {} 个文件", dir.display(), entries.len());

    Ok(Self {
      entries: entries.into_iter(),
    })
  }
}

pub fn load_image(path: &Path) -> Result<RgbImage, ImageDirectoryError> {
  let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
  Ok(image.to_rgb8())
}

impl Iterator for ImageDirectory {
  /// 解码失败作为单个文件的结果返回，不终止迭代
  type Item = (PathBuf, Result<RgbImage, ImageDirectoryError>);

  fn next(&mut self) -> Option<Self::Item> {
    let path = self.entries.next()?;
    let image = load_image(&path);
    Some((path, image))
  }
}

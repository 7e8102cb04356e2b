// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/output/highgui_preview.rs - OpenCV 预览窗口
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

use image::RgbImage;
use opencv::{
  core::{CV_8UC3, Mat, Scalar},
  highgui,
  prelude::*,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::output::Preview;

const POLL_DELAY_MS: i32 = 1;

#[derive(Error, Debug)]
pub enum PreviewError {
  #[error("OpenCV 错误: {0}")]
  OpenCvError(#[from] opencv::Error),
  #[error("图像尺寸超出范围: {0}x{1}")]
  DimensionOverflow(u32, u32),
}

/// 单个 highgui 窗口，drop 时销毁
pub struct HighguiPreview {
  window_name: String,
  quit_key: char,
}

impl HighguiPreview {
  pub fn open(window_name: impl Into<String>, quit_key: char) -> Result<Self, PreviewError> {
    let window_name = window_name.into();
    highgui::named_window(&window_name, highgui::WINDOW_AUTOSIZE)?;
    info!("预览窗口已打开: {}", window_name);
    Ok(Self {
      window_name,
      quit_key,
    })
  }
}

/// highgui 使用 BGR 顺序
fn to_bgr_mat(image: &RgbImage) -> Result<Mat, PreviewError> {
  let (width, height) = image.dimensions();
  let (Ok(cols), Ok(rows)) = (i32::try_from(width), i32::try_from(height)) else {
    return Err(PreviewError::DimensionOverflow(width, height));
  };

  let mut mat = Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(0.0))?;
  let bytes = mat.data_bytes_mut()?;
  for (dst, src) in bytes.chunks_exact_mut(3).zip(image.as_raw().chunks_exact(3)) {
    dst[0] = src[2];
    dst[1] = src[1];
    dst[2] = src[0];
  }
  Ok(mat)
}

impl Preview for HighguiPreview {
  type Error = PreviewError;

  fn show(&mut self, image: &RgbImage) -> Result<(), Self::Error> {
    let mat = to_bgr_mat(image)?;
    highgui::imshow(&self.window_name, &mat)?;
    Ok(())
  }

  fn quit_requested(&mut self) -> Result<bool, Self::Error> {
    let key = highgui::wait_key(POLL_DELAY_MS)?;
    Ok(key >= 0 && (key & 0xFF) == self.quit_key as i32)
  }
}

impl Drop for HighguiPreview {
  fn drop(&mut self) {
    match highgui::destroy_window(&self.window_name) {
      Ok(()) => info!("预览窗口已关闭: {}", self.window_name),
      Err(e) => warn!("关闭预览窗口失败: {}", e),
    }
  }
}

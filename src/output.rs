// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/output.rs - 输出定义
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

use image::RgbImage;

pub mod draw;

/// 实时预览画面
///
/// 每次循环调用一次 `show`，随后调用 `quit_requested` 轮询退出按键。
/// 预览被 drop 时关闭窗口。
pub trait Preview {
  type Error: std::error::Error + Send + Sync + 'static;

  fn show(&mut self, image: &RgbImage) -> Result<(), Self::Error>;
  fn quit_requested(&mut self) -> Result<bool, Self::Error>;
}

impl<P: Preview + ?Sized> Preview for &mut P {
  type Error = P::Error;

  fn show(&mut self, image: &RgbImage) -> Result<(), Self::Error> {
    (**self).show(image)
  }

  fn quit_requested(&mut self) -> Result<bool, Self::Error> {
    (**self).quit_requested()
  }
}

/// 标注结果的落盘位置，返回写入的路径
pub trait ImageSink {
  type Error: std::error::Error + Send + Sync + 'static;

  fn save(&self, source: &Path, image: &RgbImage) -> Result<PathBuf, Self::Error>;
}

#[cfg(feature = "highgui")]
mod highgui_preview;
#[cfg(feature = "highgui")]
pub use self::highgui_preview::{HighguiPreview, PreviewError};

#[cfg(feature = "save_image_file")]
mod save_image_file;
#[cfg(feature = "save_image_file")]
pub use self::save_image_file::{AnnotatedImageWriter, SaveImageFileError};

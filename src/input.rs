// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/input.rs - 输入定义
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

use thiserror::Error;

use crate::frame::Frame;

/// 实时采集源
///
/// 迭代结束或产出空帧表示摄像头断开；源被 drop 时释放设备。
pub trait CaptureSource: Iterator<Item = Frame> {
  fn width(&self) -> u32;
  fn height(&self) -> u32;
}

#[cfg(feature = "read_image_file")]
mod image_directory;
#[cfg(feature = "read_image_file")]
pub use self::image_directory::{ImageDirectory, ImageDirectoryError};

#[cfg(feature = "v4l_input")]
mod v4l_camera;
#[cfg(feature = "v4l_input")]
pub use self::v4l_camera::{V4lCamera, V4lCameraError};

#[cfg(feature = "gstreamer_input")]
mod gstreamer_camera;
#[cfg(feature = "gstreamer_input")]
pub use self::gstreamer_camera::{GStreamerCamera, GStreamerCameraError};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "v4l_input")]
  #[error("V4L 摄像头错误: {0}")]
  V4lCameraError(#[from] V4lCameraError),
  #[cfg(feature = "gstreamer_input")]
  #[error("GStreamer 摄像头错误: {0}")]
  GStreamerCameraError(#[from] GStreamerCameraError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

#[cfg(any(feature = "v4l_input", feature = "gstreamer_input"))]
pub use self::wrapper::CaptureWrapper;

#[cfg(any(feature = "v4l_input", feature = "gstreamer_input"))]
mod wrapper {
  use url::Url;

  use super::{CaptureSource, InputError};
  use crate::{FromUrl, frame::Frame};

  #[cfg(feature = "gstreamer_input")]
  use super::GStreamerCamera;
  #[cfg(feature = "v4l_input")]
  use super::V4lCamera;

  pub enum CaptureWrapper {
    #[cfg(feature = "v4l_input")]
    V4l(V4lCamera),
    #[cfg(feature = "gstreamer_input")]
    GStreamer(GStreamerCamera),
  }

  impl FromUrl for CaptureWrapper {
    type Error = InputError;

    fn from_url(url: &Url) -> Result<Self, Self::Error> {
      #[cfg(feature = "v4l_input")]
      {
        use crate::FromUrlWithScheme;

        if url.scheme() == V4lCamera::SCHEME {
          return Ok(CaptureWrapper::V4l(V4lCamera::from_url(url)?));
        }
      }
      #[cfg(feature = "gstreamer_input")]
      {
        use crate::FromUrlWithScheme;

        if url.scheme() == GStreamerCamera::SCHEME {
          return Ok(CaptureWrapper::GStreamer(GStreamerCamera::from_url(url)?));
        }
      }
      Err(InputError::SchemeMismatch(url.scheme().to_string()))
    }
  }

  impl Iterator for CaptureWrapper {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
      match self {
        #[cfg(feature = "v4l_input")]
        CaptureWrapper::V4l(camera) => camera.next(),
        #[cfg(feature = "gstreamer_input")]
        CaptureWrapper::GStreamer(camera) => camera.next(),
      }
    }
  }

  impl CaptureSource for CaptureWrapper {
    fn width(&self) -> u32 {
      match self {
        #[cfg(feature = "v4l_input")]
        CaptureWrapper::V4l(camera) => camera.width(),
        #[cfg(feature = "gstreamer_input")]
        CaptureWrapper::GStreamer(camera) => camera.width(),
      }
    }

    fn height(&self) -> u32 {
      match self {
        #[cfg(feature = "v4l_input")]
        CaptureWrapper::V4l(camera) => camera.height(),
        #[cfg(feature = "gstreamer_input")]
        CaptureWrapper::GStreamer(camera) => camera.height(),
      }
    }
  }
}

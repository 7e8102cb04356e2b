// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/input/gstreamer_camera.rs - GStreamer 视频输入
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

//! 基于 GStreamer 的视频输入。
//!
//! ## URL 格式
//!
//! - 摄像头: `gst://camera/dev/video1?width=640&height=480&fps=30`
//! - 视频文件: `gst://file/path/to/video.mp4`
//!
//! 管道末端统一转换为 RGB 并交给 appsink，文件播放结束与摄像头断开
//! 都表现为迭代结束。
//!
//! ## 系统依赖
//!
//! **Ubuntu/Debian:**
//! ```bash
//! sudo apt-get install libgstreamer1.0-dev libgstreamer-plugins-base1.0-dev
//! ```

use std::{collections::HashMap, time::Instant};

use gstreamer::{self as gst, prelude::*};
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use image::RgbImage;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::Frame, input::CaptureSource};

#[derive(Error, Debug)]
pub enum GStreamerCameraError {
  /// URI scheme 不匹配（期望 "gst://"）
  #[error("URI scheme mismatch")]
  SchemeMismatch,
  #[error("不支持的输入类型: {0}")]
  UnknownSource(String),
  #[error("GStreamer error: {0}")]
  GStreamerError(#[from] gst::glib::Error),
  #[error("GStreamer boolean error: {0}")]
  GStreamerBoolError(#[from] gst::glib::BoolError),
  #[error("Failed to get appsink element")]
  AppSinkNotFound,
  #[error("Failed to convert element to appsink")]
  AppSinkConversionFailed,
  #[error("Failed to get video info from caps")]
  VideoInfoError,
  #[error("Unsupported video format")]
  UnsupportedFormat,
  #[error("Pipeline error: {0}")]
  PipelineError(String),
  #[error("Buffer size mismatch: expected {expected} bytes, got {actual} bytes")]
  BufferSizeMismatch { expected: usize, actual: usize },
  #[error("State change error: {0}")]
  StateChangeError(#[from] gst::StateChangeError),
}

enum SourceItem {
  File(String),
  Camera {
    device: String,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
  },
}

impl SourceItem {
  fn to_pipeline(&self) -> String {
    match self {
      SourceItem::File(path) => format!("filesrc location={} ! decodebin", path),
      SourceItem::Camera {
        device,
        width,
        height,
        fps,
      } => {
        let mut caps = Vec::new();
        if let Some(width) = width {
          caps.push(format!("width={}", width));
        }
        if let Some(height) = height {
          caps.push(format!("height={}", height));
        }
        if let Some(fps) = fps {
          caps.push(format!("framerate={}/1", fps));
        }
        if caps.is_empty() {
          format!("v4l2src device={}", device)
        } else {
          format!("v4l2src device={} ! video/x-raw,{}", device, caps.join(","))
        }
      }
    }
  }
}

fn pipeline_description(source: &SourceItem) -> String {
  format!(
    "{} ! videoconvert ! video/x-raw,format=RGB ! appsink max-buffers=2 drop=true name=sink",
    source.to_pipeline()
  )
}

pub struct GStreamerCamera {
  pipeline: gst::Pipeline,
  appsink: gst_app::AppSink,
  frame_index: u64,
  width: u32,
  height: u32,
  start_time: Instant,
}

impl FromUrlWithScheme for GStreamerCamera {
  const SCHEME: &'static str = "gst";
}

impl FromUrl for GStreamerCamera {
  type Error = GStreamerCameraError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(GStreamerCameraError::SchemeMismatch);
    }

    let query: HashMap<String, String> = url
      .query_pairs()
      .map(|(k, v)| (String::from(k), String::from(v)))
      .collect();
    let number = |key: &str| query.get(key).and_then(|v| v.parse::<u32>().ok());

    let source = match url.host_str() {
      Some("camera") => SourceItem::Camera {
        device: url.path().to_string(),
        width: number("width"),
        height: number("height"),
        fps: number("fps"),
      },
      Some("file") => SourceItem::File(url.path().to_string()),
      other => {
        return Err(GStreamerCameraError::UnknownSource(
          other.unwrap_or_default().to_string(),
        ));
      }
    };

    Self::launch(&pipeline_description(&source))
  }
}

impl GStreamerCamera {
  fn launch(description: &str) -> Result<Self, GStreamerCameraError> {
    gst::init()?;
    info!("GStreamer pipeline description: {}", description);

    let pipeline = gst::parse::launch(description)?
      .downcast::<gst::Pipeline>()
      .map_err(|_| GStreamerCameraError::PipelineError("Failed to create pipeline".to_string()))?;

    let appsink = pipeline
      .by_name("sink")
      .ok_or(GStreamerCameraError::AppSinkNotFound)?
      .downcast::<gst_app::AppSink>()
      .map_err(|_| GStreamerCameraError::AppSinkConversionFailed)?;

    pipeline.set_state(gst::State::Playing)?;

    let mut camera = GStreamerCamera {
      pipeline,
      appsink,
      frame_index: 0,
      width: 0,
      height: 0,
      start_time: Instant::now(),
    };

    // 预读第一帧之前分辨率未知，从协商后的 caps 获取
    if let Some(caps) = camera.appsink.sink_pads().first().and_then(|pad| pad.current_caps())
      && let Ok(info) = gst_video::VideoInfo::from_caps(&caps)
    {
      camera.width = info.width();
      camera.height = info.height();
    }

    Ok(camera)
  }

  fn pull_frame(&mut self) -> Result<Option<RgbImage>, GStreamerCameraError> {
    let sample = match self.appsink.pull_sample() {
      Ok(sample) => sample,
      Err(_) if self.appsink.is_eos() => return Ok(None),
      Err(e) => return Err(GStreamerCameraError::GStreamerBoolError(e)),
    };
    let image = convert_sample(&sample)?;
    self.width = image.width();
    self.height = image.height();
    Ok(Some(image))
  }
}

impl Drop for GStreamerCamera {
  fn drop(&mut self) {
    if let Err(e) = self.pipeline.set_state(gst::State::Null) {
      warn!("Failed to stop GStreamer pipeline: {}", e);
    }
  }
}

fn convert_sample(sample: &gst::Sample) -> Result<RgbImage, GStreamerCameraError> {
  let buffer = sample
    .buffer()
    .ok_or_else(|| GStreamerCameraError::PipelineError("No buffer in sample".to_string()))?;
  let caps = sample
    .caps()
    .ok_or_else(|| GStreamerCameraError::PipelineError("No caps in sample".to_string()))?;
  let info =
    gst_video::VideoInfo::from_caps(caps).map_err(|_| GStreamerCameraError::VideoInfoError)?;
  if info.format() != gst_video::VideoFormat::Rgb {
    return Err(GStreamerCameraError::UnsupportedFormat);
  }

  let width = info.width() as usize;
  let height = info.height() as usize;
  let stride = info.stride()[0] as usize;

  let map = buffer.map_readable().map_err(|e| {
    GStreamerCameraError::PipelineError(format!("Failed to map buffer for reading: {}", e))
  })?;
  let data = map.as_slice();

  let row_bytes = width * 3;
  let expected = stride * height.saturating_sub(1) + row_bytes;
  if data.len() < expected {
    return Err(GStreamerCameraError::BufferSizeMismatch {
      expected,
      actual: data.len(),
    });
  }

  // 行尾可能存在对齐填充
  let mut pixels = Vec::with_capacity(row_bytes * height);
  for row in 0..height {
    let start = row * stride;
    pixels.extend_from_slice(&data[start..start + row_bytes]);
  }

  RgbImage::from_raw(width as u32, height as u32, pixels).ok_or(
    GStreamerCameraError::BufferSizeMismatch {
      expected: row_bytes * height,
      actual: data.len(),
    },
  )
}

impl Iterator for GStreamerCamera {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    let image = match self.pull_frame() {
      Ok(Some(image)) => image,
      Ok(None) => {
        info!("GStreamer 输入已结束");
        return None;
      }
      Err(e) => {
        error!("Failed to fetch sample: {}", e);
        return None;
      }
    };

    let frame = Frame::new(
      image,
      self.frame_index,
      self.start_time.elapsed().as_millis() as u64,
    );
    self.frame_index += 1;
    Some(frame)
  }
}

impl CaptureSource for GStreamerCamera {
  fn width(&self) -> u32 {
    self.width
  }

  fn height(&self) -> u32 {
    self.height
  }
}

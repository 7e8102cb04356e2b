// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/bin/stream.rs - 实时摄像头标注
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

use std::{path::PathBuf, thread, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use url::Url;

use huiyan::{
  FromUrl,
  config::{self, AnnotatorConfig, LabelTable, ModelPaths, StreamConfig},
  input::CaptureWrapper,
  model::ReplayDetector,
  output::{
    HighguiPreview,
    draw::{Annotator, GlyphTypeface},
  },
  task::{StreamTask, Task},
};

/// 实时摄像头检测预览，按 q 退出
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型参数文件
  #[arg(long, value_name = "PARAM", default_value = config::STREAM_MODEL_PARAM)]
  pub param: PathBuf,
  /// 模型权重文件
  #[arg(long, value_name = "WEIGHTS", default_value = config::STREAM_MODEL_WEIGHTS)]
  pub weights: PathBuf,
  /// 摄像头来源
  #[arg(long, value_name = "SOURCE", default_value = config::CAMERA_URL)]
  pub camera: String,
  /// 标签字体，默认使用内置字体
  #[arg(long, value_name = "FONT")]
  pub font: Option<PathBuf>,
  /// 类别名称文件，每行一个
  #[arg(long, value_name = "LABELS")]
  pub labels: Option<PathBuf>,
  /// 预览窗口名称
  #[arg(long, value_name = "NAME", default_value = config::WINDOW_NAME)]
  pub window: String,
  /// 处理指定帧数后退出
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<u64>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  let stream = StreamConfig {
    model: ModelPaths::new(args.param, args.weights),
    camera: args.camera,
    window_name: args.window,
    ..StreamConfig::default()
  };

  info!("模型参数文件: {}", stream.model.param.display());
  info!("摄像头来源: {}", stream.camera);

  let detector: ReplayDetector = stream
    .model
    .load()
    .with_context(|| format!("无法加载模型 {}", stream.model.param.display()))?;

  let labels = match &args.labels {
    Some(path) => LabelTable::from_file(path)
      .with_context(|| format!("无法读取类别文件 {}", path.display()))?,
    None => LabelTable::boxes(),
  };
  let typeface = GlyphTypeface::load(args.font.as_deref()).context("无法加载内置字体")?;
  let annotator = Annotator::new(AnnotatorConfig::default().with_labels(labels), typeface);

  let camera = Url::parse(&stream.camera)
    .with_context(|| format!("无效的摄像头地址 {}", stream.camera))?;
  let capture =
    CaptureWrapper::from_url(&camera).with_context(|| format!("无法打开摄像头 {}", camera))?;
  let preview = HighguiPreview::open(&stream.window_name, stream.quit_key)?;

  let (tx, rx) = std::sync::mpsc::channel();
  ctrlc::set_handler(move || {
    info!("收到中断信号，准备退出...");
    let _ = tx.send(());
    thread::spawn(|| {
      thread::sleep(Duration::from_secs(30));
      warn!("强制退出程序");
      std::process::exit(1);
    });
  })
  .context("无法设置 Ctrl-C 处理函数")?;

  let summary = StreamTask::new(annotator)
    .with_interrupt(rx)
    .with_frame_limit(args.frame_number)
    .run_task(capture, detector, preview)?;
  info!("{:?}", summary);

  Ok(())
}

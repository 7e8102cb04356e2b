// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/bin/batch.rs - 批量图像标注
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

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use huiyan::{
  config::{self, AnnotatorConfig, BatchConfig, LabelTable, ModelPaths},
  input::ImageDirectory,
  model::ReplayDetector,
  output::{
    AnnotatedImageWriter,
    draw::{Annotator, GlyphTypeface},
  },
  task::{BatchTask, Task},
};

/// 批量标注目录中的图像，检测结果逐行输出到标准输出
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型参数文件
  #[arg(long, value_name = "PARAM", default_value = config::BATCH_MODEL_PARAM)]
  pub param: PathBuf,
  /// 模型权重文件
  #[arg(long, value_name = "WEIGHTS", default_value = config::BATCH_MODEL_WEIGHTS)]
  pub weights: PathBuf,
  /// 输入图像目录
  #[arg(long, value_name = "DIR", default_value = config::BATCH_INPUT_DIR)]
  pub input_dir: PathBuf,
  /// 输出目录
  #[arg(long, value_name = "DIR", default_value = config::BATCH_OUTPUT_DIR)]
  pub output_dir: PathBuf,
  /// 标签字体，默认使用内置字体
  #[arg(long, value_name = "FONT")]
  pub font: Option<PathBuf>,
  /// 类别名称文件，每行一个
  #[arg(long, value_name = "LABELS")]
  pub labels: Option<PathBuf>,
}

fn main() -> Result<()> {
  // 标准输出留给审计日志
  tracing_subscriber::fmt().with_writer(std::io::stderr).init();

  let args = Args::parse();
  let batch = BatchConfig {
    model: ModelPaths::new(args.param, args.weights),
    input_dir: args.input_dir,
    output_dir: args.output_dir,
  };

  info!("模型参数文件: {}", batch.model.param.display());
  info!("输入目录: {}", batch.input_dir.display());
  info!("输出目录: {}", batch.output_dir.display());

  let detector: ReplayDetector = batch
    .model
    .load()
    .with_context(|| format!("无法加载模型 {}", batch.model.param.display()))?;
  let writer = AnnotatedImageWriter::new(&batch.output_dir)
    .with_context(|| format!("无法创建输出目录 {}", batch.output_dir.display()))?;

  let labels = match &args.labels {
    Some(path) => LabelTable::from_file(path)
      .with_context(|| format!("无法读取类别文件 {}", path.display()))?,
    None => LabelTable::boxes(),
  };
  let typeface = GlyphTypeface::load(args.font.as_deref()).context("无法加载内置字体")?;
  let annotator = Annotator::new(AnnotatorConfig::default().with_labels(labels), typeface);

  let images = ImageDirectory::open(&batch.input_dir)
    .with_context(|| format!("无法读取输入目录 {}", batch.input_dir.display()))?;

  let stdout = std::io::stdout();
  let summary = BatchTask::new(annotator, stdout.lock()).run_task(images, detector, writer)?;
  info!("{:?}", summary);

  Ok(())
}

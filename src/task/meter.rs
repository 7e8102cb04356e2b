// 该文件是 Huiyan （慧眼） 项目的一部分。
// src/task/meter.rs - 帧率统计
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

use std::time::{Duration, Instant};

const FPS_WINDOW: Duration = Duration::from_secs(1);

/// 固定窗口帧率统计
///
/// 每个不重叠的 ≥1 秒窗口报告一次帧率，两次报告之间的值不更新。
#[derive(Debug, Clone)]
pub struct ThroughputMeter {
  frame_count: u32,
  window_start: Instant,
}

impl ThroughputMeter {
  pub fn start() -> Self {
    Self::start_at(Instant::now())
  }

  pub fn start_at(now: Instant) -> Self {
    Self {
      frame_count: 0,
      window_start: now,
    }
  }

  pub fn frame_count(&self) -> u32 {
    self.frame_count
  }

  pub fn tick(&mut self) -> Option<f32> {
    self.tick_at(Instant::now())
  }

  pub fn tick_at(&mut self, now: Instant) -> Option<f32> {
    self.frame_count += 1;

    let elapsed = now.saturating_duration_since(self.window_start);
    if elapsed < FPS_WINDOW {
      return None;
    }

    let fps = self.frame_count as f32 / elapsed.as_secs_f32();
    self.frame_count = 0;
    self.window_start = now;
    Some(fps)
  }
}

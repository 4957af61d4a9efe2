// 该文件是 Biaozhu （标注） 项目的一部分。
// src/detection.rs - 检测结果与检测器
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

use image::RgbaImage;
use serde::Serialize;

/// 检测器：由外部推理端实现
pub trait Detector {
  type Error;

  fn detect(&self, image: &RgbaImage) -> Result<Vec<DetectionResult>, Self::Error>;
}

/// 像素坐标下的轴对齐矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
}

impl Region {
  pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
    Self {
      left,
      top,
      right,
      bottom,
    }
  }

  pub fn width(&self) -> f32 {
    self.right - self.left
  }

  pub fn height(&self) -> f32 {
    self.bottom - self.top
  }
}

impl From<[f32; 4]> for Region {
  // [x_min, y_min, x_max, y_max]
  fn from(bbox: [f32; 4]) -> Self {
    Region::new(bbox[0], bbox[1], bbox[2], bbox[3])
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
  pub region: Region,
  pub label: String,
  /// 百分比形式的置信度 0 - 100
  pub confidence: u8,
}

impl DetectionResult {
  pub fn new(region: impl Into<Region>, label: impl Into<String>, confidence: u8) -> Self {
    Self {
      region: region.into(),
      label: label.into(),
      confidence: confidence.min(100),
    }
  }

  /// 由推理端给出的 0.0 - 1.0 分数构造，百分比向零截断
  pub fn from_score(region: impl Into<Region>, label: impl Into<String>, score: f32) -> Self {
    let percent = (score * 100.0).clamp(0.0, 100.0) as u8;
    Self::new(region, label, percent)
  }

  /// 标签文本，例如 `dog | 87`
  pub fn label_text(&self) -> String {
    format!("{} | {}", self.label, self.confidence)
  }
}

mod replay;
pub use self::replay::{ReplayDetector, ReplayDetectorBuilder, ReplayDetectorError, ReplayEntry};

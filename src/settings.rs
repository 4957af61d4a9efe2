// 该文件是 Biaozhu （标注） 项目的一部分。
// src/settings.rs - 检测参数与输入校验
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
use tracing::debug;

pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
  #[error("最大结果数无效: '{0}'（需要正整数）")]
  InvalidMaxResults(String),
  #[error("置信度阈值无效: '{0}'（需要 0 - 100 之间的百分数）")]
  InvalidScoreThreshold(String),
}

/// 传给推理端的检测参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorOptions {
  /// 最多返回的结果数（正整数）
  pub max_results: usize,
  /// 最低置信度（0.0 - 1.0）
  pub score_threshold: f32,
}

impl Default for DetectorOptions {
  fn default() -> Self {
    Self {
      max_results: DEFAULT_MAX_RESULTS,
      score_threshold: DEFAULT_SCORE_THRESHOLD,
    }
  }
}

impl DetectorOptions {
  pub fn with_max_results(mut self, max_results: usize) -> Self {
    self.max_results = max_results;
    self
  }

  pub fn with_score_threshold(mut self, score_threshold: f32) -> Self {
    self.score_threshold = score_threshold;
    self
  }

  /// 用用户输入的文本更新参数。
  ///
  /// 两个字段都先校验，全部通过后才写入；空字段保留原值。
  /// 任一字段无效时返回错误，参数保持不变。
  pub fn update_from_text(
    &mut self,
    max_results: &str,
    score_percent: &str,
  ) -> Result<(), SettingsError> {
    let max_results = match max_results.trim() {
      "" => None,
      text => Some(parse_max_results(text)?),
    };
    let score_threshold = match score_percent.trim() {
      "" => None,
      text => Some(parse_score_percent(text)?),
    };

    if let Some(max_results) = max_results {
      self.max_results = max_results;
    }
    if let Some(score_threshold) = score_threshold {
      self.score_threshold = score_threshold;
    }
    debug!("检测参数已更新: {:?}", self);
    Ok(())
  }
}

/// 解析最大结果数，必须是不小于 1 的整数
pub fn parse_max_results(text: &str) -> Result<usize, SettingsError> {
  match text.trim().parse::<usize>() {
    Ok(value) if value >= 1 => Ok(value),
    _ => Err(SettingsError::InvalidMaxResults(text.to_string())),
  }
}

/// 解析百分数形式的置信度阈值，返回 0.0 - 1.0 的小数
pub fn parse_score_percent(text: &str) -> Result<f32, SettingsError> {
  match text.trim().parse::<f32>() {
    Ok(value) if (0.0..=100.0).contains(&value) => Ok(value / 100.0),
    _ => Err(SettingsError::InvalidScoreThreshold(text.to_string())),
  }
}

// 该文件是 Biaozhu （标注） 项目的一部分。
// src/detection/replay.rs - 回放外部推理结果的检测器
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

use image::RgbaImage;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  detection::{DetectionResult, Detector},
  settings::DetectorOptions,
  utils::url_path,
};

/// 外部推理一次输出的单个目标
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayEntry {
  pub label: String,
  pub score: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]
}

#[derive(Error, Debug)]
pub enum ReplayDetectorError {
  #[error("检测结果文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("检测结果文件格式错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("检测器路径必须使用 {0} 方案")]
  SchemeMismatch(&'static str),
}

/// 对每一帧回放同一组外部推理结果，并按检测参数过滤
pub struct ReplayDetector {
  entries: Vec<ReplayEntry>,
  options: DetectorOptions,
}

pub struct ReplayDetectorBuilder {
  path: PathBuf,
  options: DetectorOptions,
}

impl FromUrlWithScheme for ReplayDetectorBuilder {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayDetectorBuilder {
  type Error = ReplayDetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayDetectorError::SchemeMismatch(Self::SCHEME));
    }

    Ok(ReplayDetectorBuilder {
      path: url_path(url),
      options: DetectorOptions::default(),
    })
  }
}

impl ReplayDetectorBuilder {
  pub fn options(mut self, options: DetectorOptions) -> Self {
    self.options = options;
    self
  }

  pub fn build(self) -> Result<ReplayDetector, ReplayDetectorError> {
    info!("加载检测结果文件: {}", self.path.display());
    let data = std::fs::read(&self.path)?;
    let entries: Vec<ReplayEntry> = serde_json::from_slice(&data)?;
    debug!("共 {} 条检测结果", entries.len());
    Ok(ReplayDetector::new(entries, self.options))
  }
}

impl ReplayDetector {
  pub fn new(entries: Vec<ReplayEntry>, options: DetectorOptions) -> Self {
    Self { entries, options }
  }

  pub fn options(&self) -> &DetectorOptions {
    &self.options
  }
}

impl Detector for ReplayDetector {
  type Error = ReplayDetectorError;

  fn detect(&self, _image: &RgbaImage) -> Result<Vec<DetectionResult>, Self::Error> {
    let mut kept: Vec<&ReplayEntry> = self
      .entries
      .iter()
      .filter(|entry| entry.score >= self.options.score_threshold)
      .collect();
    // 稳定排序，同分保持原顺序
    kept.sort_by(|a, b| b.score.total_cmp(&a.score));
    kept.truncate(self.options.max_results);

    Ok(
      kept
        .into_iter()
        .map(|entry| DetectionResult::from_score(entry.bbox, entry.label.clone(), entry.score))
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(label: &str, score: f32) -> ReplayEntry {
    ReplayEntry {
      label: label.to_string(),
      score,
      bbox: [0.0, 0.0, 10.0, 10.0],
    }
  }

  #[test]
  fn filters_by_threshold_and_limits_count() {
    let detector = ReplayDetector::new(
      vec![
        entry("a", 0.2),
        entry("b", 0.9),
        entry("c", 0.6),
        entry("d", 0.5),
        entry("e", 0.7),
      ],
      DetectorOptions::default().with_max_results(3),
    );
    let image = RgbaImage::new(4, 4);
    let labels: Vec<_> = detector
      .detect(&image)
      .unwrap()
      .into_iter()
      .map(|r| r.label)
      .collect();
    assert_eq!(labels, vec!["b", "e", "c"]);
  }

  #[test]
  fn equal_scores_keep_recorded_order() {
    let detector = ReplayDetector::new(
      vec![entry("first", 0.8), entry("second", 0.8)],
      DetectorOptions::default(),
    );
    let results = detector.detect(&RgbaImage::new(1, 1)).unwrap();
    assert_eq!(results[0].label, "first");
    assert_eq!(results[1].label, "second");
    assert_eq!(results[0].confidence, 80);
  }

  #[test]
  fn builder_reads_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cat.json");
    std::fs::write(
      &path,
      r#"[{"label": "cat", "score": 0.92, "bbox": [10, 10, 110, 40]}]"#,
    )
    .unwrap();

    let url = Url::from_file_path(&path).unwrap();
    let url = Url::parse(&format!("replay://{}", url.path())).unwrap();
    let detector = ReplayDetectorBuilder::from_url(&url).unwrap().build().unwrap();
    let results = detector.detect(&RgbaImage::new(1, 1)).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].label_text(), "cat | 92");
    assert_eq!(results[0].region.right, 110.0);
  }

  #[test]
  fn rejects_other_schemes() {
    let url = Url::parse("image:///tmp/a.json").unwrap();
    assert!(matches!(
      ReplayDetectorBuilder::from_url(&url),
      Err(ReplayDetectorError::SchemeMismatch("replay"))
    ));
  }

  #[test]
  fn builder_options_reach_detector() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("many.json");
    std::fs::write(
      &path,
      r#"[
        {"label": "a", "score": 0.35, "bbox": [0, 0, 1, 1]},
        {"label": "b", "score": 0.25, "bbox": [0, 0, 1, 1]},
        {"label": "c", "score": 0.95, "bbox": [0, 0, 1, 1]}
      ]"#,
    )
    .unwrap();

    let url = Url::parse(&format!("replay://{}", path.display())).unwrap();
    let options = DetectorOptions::default()
      .with_max_results(2)
      .with_score_threshold(0.3);
    let detector = ReplayDetectorBuilder::from_url(&url)
      .unwrap()
      .options(options)
      .build()
      .unwrap();
    assert_eq!(detector.options(), &options);
    let labels: Vec<_> = detector
      .detect(&RgbaImage::new(1, 1))
      .unwrap()
      .into_iter()
      .map(|r| r.label)
      .collect();
    assert_eq!(labels, vec!["c", "a"]);
  }
}

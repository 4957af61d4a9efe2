// 该文件是 Biaozhu （标注） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Datelike, Utc};
use image::RgbaImage;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::{
  FromUrl, FromUrlWithScheme,
  detection::DetectionResult,
  frame::Frame,
  output::{Render, save_image_file::{SaveImageFileError, save_rgba}},
  utils::{has_query_flag, url_path},
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像保存错误: {0}")]
  SaveError(#[from] SaveImageFileError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("记录序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct FrameRecord<'a> {
  index: u64,
  timestamp_ms: u64,
  detections: &'a [DetectionResult],
}

/// 按日期分目录保存标注后的帧，可选同时写出检测结果 JSON
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  record: bool,
  always: bool,
  frame_counter: AtomicU32,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    Ok(DirectoryRecordOutput {
      directory: url_path(uri),
      record: has_query_flag(uri, "record"),
      always: has_query_flag(uri, "always"),
      frame_counter: AtomicU32::new(0),
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> u32 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed) + 1
  }

  fn frame_path(&self, now: DateTime<Utc>) -> Result<PathBuf, std::io::Error> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }

  fn write_record(
    path: &Path,
    frame: &Frame,
    results: &[DetectionResult],
  ) -> Result<(), DirectoryRecordOutputError> {
    let record = FrameRecord {
      index: frame.index,
      timestamp_ms: frame.timestamp_ms,
      detections: results,
    };
    std::fs::write(path.with_extension("json"), serde_json::to_vec_pretty(&record)?)?;
    Ok(())
  }
}

impl Render for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(
    &self,
    frame: &Frame,
    annotated: &RgbaImage,
    results: &[DetectionResult],
  ) -> Result<(), Self::Error> {
    if !self.always && results.is_empty() {
      debug!("第 {} 帧没有检测结果，跳过保存", frame.index);
      return Ok(());
    }

    let path = self.frame_path(Utc::now())?;
    save_rgba(annotated, &path)?;
    if self.record {
      Self::write_record(&path, frame, results)?;
    }
    debug!("第 {} 帧已保存: {}", frame.index, path.display());
    Ok(())
  }
}

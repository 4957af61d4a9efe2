// 该文件是 Biaozhu （标注） 项目的一部分。
// src/input/frame_folder.rs - 目录帧序列输入
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

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  utils::{has_query_flag, query_value, url_path},
};

const DEFAULT_FPS: f64 = 30.0;
const FRAME_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "webp"];

#[derive(Error, Debug)]
pub enum FrameFolderInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("帧率无效: {0}")]
  InvalidFps(String),
}

/// 把目录中的图片按文件名顺序当作连续帧送出，模拟摄像头帧流。
/// 解码失败的帧记录警告后跳过。
pub struct FrameFolderInput {
  files: std::vec::IntoIter<PathBuf>,
  fps: f64,
  next_index: u64,
  swap_rb: bool,
}

impl FromUrlWithScheme for FrameFolderInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for FrameFolderInput {
  type Error = FrameFolderInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(FrameFolderInputError::SchemeMismatch);
    }

    let fps = match query_value(url, "fps") {
      Some(text) => match text.parse::<f64>() {
        Ok(fps) if fps > 0.0 && fps.is_finite() => fps,
        _ => return Err(FrameFolderInputError::InvalidFps(text)),
      },
      None => DEFAULT_FPS,
    };

    let directory = url_path(url);
    let files = list_frames(&directory)?;
    info!(
      "帧目录: {}，共 {} 帧，帧率 {}",
      directory.display(),
      files.len(),
      fps
    );

    Ok(FrameFolderInput {
      files: files.into_iter(),
      fps,
      next_index: 0,
      swap_rb: has_query_flag(url, "swap_rb"),
    })
  }
}

fn list_frames(directory: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
  let mut files = Vec::new();
  for entry in std::fs::read_dir(directory)? {
    let path = entry?.path();
    let is_frame = path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
      .unwrap_or(false);
    if is_frame && path.is_file() {
      files.push(path);
    }
  }
  files.sort();
  Ok(files)
}

impl FrameFolderInput {
  pub fn fps(&self) -> f64 {
    self.fps
  }

  pub fn remaining(&self) -> usize {
    self.files.len()
  }
}

impl Iterator for FrameFolderInput {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    for path in self.files.by_ref() {
      let decoded = ImageReader::open(&path)
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.decode());
      let image = match decoded {
        Ok(image) => image.to_rgba8(),
        Err(e) => {
          warn!("跳过无法解码的帧 {}: {}", path.display(), e);
          continue;
        }
      };

      let index = self.next_index;
      self.next_index += 1;
      let timestamp_ms = (index as f64 * 1000.0 / self.fps) as u64;
      debug!("读取第 {} 帧: {}", index, path.display());

      let frame = Frame::new(image, index, timestamp_ms);
      return Some(if self.swap_rb {
        frame.swap_red_blue()
      } else {
        frame
      });
    }
    None
  }
}

// 该文件是 Biaozhu （标注） 项目的一部分。
// src/annotate/font.rs - 标签字体
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

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use thiserror::Error;
use tracing::info;

/// 标签文字的测量与绘制
pub trait LabelFont {
  /// 以 `size` 像素字号测量文本，返回 (宽, 高)
  fn text_size(&self, size: f32, text: &str) -> (u32, u32);

  /// 以 (x, y) 为文本框左上角绘制文本
  fn draw_text(
    &self,
    canvas: &mut RgbaImage,
    color: Rgba<u8>,
    x: i32,
    y: i32,
    size: f32,
    text: &str,
  );
}

#[derive(Error, Debug)]
pub enum FontError {
  #[error("无法读取字体文件: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 基于 TrueType/OpenType 字体的标签字体，绘制时按字形覆盖率混合
#[derive(Clone)]
pub struct GlyphFont {
  font: FontArc,
}

/// 内置的 DejaVu Sans 字体
const EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/font.ttf");

impl GlyphFont {
  /// 使用内置字体
  pub fn embedded() -> Result<Self, FontError> {
    let font = FontArc::try_from_slice(EMBEDDED_FONT)?;
    Ok(Self { font })
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FontError> {
    let path = path.as_ref();
    info!("加载字体文件: {}", path.display());
    let data = std::fs::read(path)?;
    Self::from_bytes(data)
  }

  pub fn from_bytes(data: Vec<u8>) -> Result<Self, FontError> {
    let font = FontArc::try_from_vec(data)?;
    Ok(Self { font })
  }
}

impl LabelFont for GlyphFont {
  fn text_size(&self, size: f32, text: &str) -> (u32, u32) {
    text_size(PxScale::from(size), &self.font, text)
  }

  fn draw_text(
    &self,
    canvas: &mut RgbaImage,
    color: Rgba<u8>,
    x: i32,
    y: i32,
    size: f32,
    text: &str,
  ) {
    draw_text_mut(canvas, color, x, y, PxScale::from(size), &self.font, text);
  }
}

impl<F: LabelFont + ?Sized> LabelFont for &F {
  fn text_size(&self, size: f32, text: &str) -> (u32, u32) {
    (**self).text_size(size, text)
  }

  fn draw_text(
    &self,
    canvas: &mut RgbaImage,
    color: Rgba<u8>,
    x: i32,
    y: i32,
    size: f32,
    text: &str,
  ) {
    (**self).draw_text(canvas, color, x, y, size, text)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    annotate::Annotator,
    detection::{DetectionResult, Region},
  };

  #[test]
  fn rejects_garbage_font_data() {
    assert!(matches!(
      GlyphFont::from_bytes(b"not a font".to_vec()),
      Err(FontError::InvalidFont(_))
    ));
  }

  #[test]
  fn missing_font_file_is_io_error() {
    assert!(matches!(
      GlyphFont::from_path("/nonexistent/biaozhu/font.ttf"),
      Err(FontError::IoError(_))
    ));
  }

  #[test]
  fn embedded_font_measures_text() {
    let font = GlyphFont::embedded().unwrap();
    let (short, height) = font.text_size(75.0, "cat");
    let (long, _) = font.text_size(75.0, "cat | 92");
    assert!(short > 0 && height > 0);
    assert!(long > short);
    let (half, _) = font.text_size(37.5, "cat | 92");
    assert!(half < long);
  }

  #[test]
  fn embedded_font_fits_positive_scenario() {
    let annotator = Annotator::new(GlyphFont::embedded().unwrap());
    let region = Region::new(10.0, 10.0, 110.0, 40.0);
    let layout = annotator.layout_label(&region, "cat | 92".into());
    assert!(layout.font_size < 75.0);
    assert!(layout.width <= 101, "width {}", layout.width);
    assert!(layout.x >= 10, "x {}", layout.x);
    assert_eq!(layout.y, 10);
  }

  #[test]
  fn embedded_font_fits_negative_scenario() {
    let annotator = Annotator::new(GlyphFont::embedded().unwrap());
    let region = Region::new(0.0, 0.0, 50.0, 20.0);
    let layout = annotator.layout_label(&region, "a very long description | 10".into());
    assert!(layout.font_size > 0.0 && layout.font_size < 75.0);
    assert!(layout.width <= 51, "width {}", layout.width);
    assert!(layout.x >= 0);
  }

  #[test]
  fn embedded_font_draws_yellow_label() {
    let annotator = Annotator::new(GlyphFont::embedded().unwrap());
    let image = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]));
    let result = DetectionResult::new([10.0, 10.0, 110.0, 60.0], "cat", 92);
    let out = annotator.annotate(&image, &[result]);
    let yellow = annotator.palette().label;
    // 标签位于矩形内部，描边之外的区域
    let text_pixels = (13..108)
      .flat_map(|x| (13..58).map(move |y| (x, y)))
      .filter(|&(x, y)| *out.get_pixel(x, y) == yellow)
      .count();
    assert!(text_pixels > 0);
    assert_eq!(*out.get_pixel(60, 60), annotator.palette().positive);
  }
}

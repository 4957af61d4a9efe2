// 该文件是 Biaozhu （标注） 项目的一部分。
// src/annotate.rs - 目标检测结果可视化
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

use image::{Rgba, RgbaImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use tracing::debug;

use crate::detection::{DetectionResult, Region};

mod font;
pub use self::font::{FontError, GlyphFont, LabelFont};

// 文本渲染常量
pub const LABEL_FONT_SIZE: f32 = 75.0;
pub const BORDER_STROKE_WIDTH: u32 = 5;
/// 置信度严格大于该值时使用 positive 颜色
pub const CONFIDENCE_SPLIT: u8 = 50;

const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
  pub positive: Rgba<u8>,
  pub negative: Rgba<u8>,
  pub label: Rgba<u8>,
}

impl Default for Palette {
  fn default() -> Self {
    Self {
      positive: GREEN,
      negative: RED,
      label: YELLOW,
    }
  }
}

impl Palette {
  pub fn border_color(&self, confidence: u8) -> Rgba<u8> {
    if confidence > CONFIDENCE_SPLIT {
      self.positive
    } else {
      self.negative
    }
  }
}

/// 一个标签最终的排版结果
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayout {
  pub text: String,
  pub font_size: f32,
  /// 文本框左上角
  pub x: i32,
  pub y: i32,
  /// 基线 = 矩形上边 + 文本高度
  pub baseline: i32,
  pub width: u32,
  pub height: u32,
}

impl LabelLayout {
  /// 文本框与 width x height 的画布是否有交集
  pub fn overlaps(&self, width: u32, height: u32) -> bool {
    let right = self.x as i64 + self.width as i64;
    let bottom = self.y as i64 + self.height as i64;
    right > 0 && bottom > 0 && (self.x as i64) < width as i64 && (self.y as i64) < height as i64
  }
}

/// 在图像副本上绘制检测框与标签
pub struct Annotator<F> {
  font: F,
  palette: Palette,
  base_font_size: f32,
  stroke_width: u32,
}

impl<F: LabelFont> Annotator<F> {
  pub fn new(font: F) -> Self {
    Self {
      font,
      palette: Palette::default(),
      base_font_size: LABEL_FONT_SIZE,
      stroke_width: BORDER_STROKE_WIDTH,
    }
  }

  pub fn with_palette(mut self, palette: Palette) -> Self {
    self.palette = palette;
    self
  }

  pub fn with_base_font_size(mut self, size: f32) -> Self {
    self.base_font_size = size;
    self
  }

  pub fn with_stroke_width(mut self, width: u32) -> Self {
    self.stroke_width = width;
    self
  }

  pub fn palette(&self) -> &Palette {
    &self.palette
  }

  pub fn base_font_size(&self) -> f32 {
    self.base_font_size
  }

  /// 返回标注后的新图像，输入图像不变
  pub fn annotate(&self, image: &RgbaImage, results: &[DetectionResult]) -> RgbaImage {
    let mut canvas = image.clone();
    self.annotate_mut(&mut canvas, results);
    canvas
  }

  /// 按给定顺序直接在图像上绘制
  pub fn annotate_mut(&self, canvas: &mut RgbaImage, results: &[DetectionResult]) {
    for result in results {
      let color = self.palette.border_color(result.confidence);
      self.draw_border(canvas, &result.region, color);

      let layout = self.layout_label(&result.region, result.label_text());
      if layout.font_size < 1.0 || layout.width == 0 {
        debug!("标签 '{}' 没有可绘制的空间，跳过", layout.text);
        continue;
      }
      if !layout.overlaps(canvas.width(), canvas.height()) {
        debug!("标签 '{}' 完全在图像之外，跳过", layout.text);
        continue;
      }
      self.font.draw_text(
        canvas,
        self.palette.label,
        layout.x,
        layout.y,
        layout.font_size,
        &layout.text,
      );
    }
  }

  /// 计算标签字号与位置。
  ///
  /// 文本宽于矩形时按 矩形宽 / 文本宽 等比缩小字号，从不放大；
  /// 测得宽度为 0 时不缩放。缩放后重新测量，并在矩形内水平居中。
  pub fn layout_label(&self, region: &Region, text: String) -> LabelLayout {
    let rect_width = region.width();
    let (measured, _) = self.font.text_size(self.base_font_size, &text);

    let mut font_size = self.base_font_size;
    if measured > 0 && measured as f32 > rect_width {
      font_size = self.base_font_size * rect_width / measured as f32;
    }

    let (width, height) = if font_size >= 1.0 {
      self.font.text_size(font_size, &text)
    } else {
      (0, 0)
    };

    let margin = ((rect_width - width as f32) / 2.0).max(0.0);
    let x = (region.left + margin).round() as i32;
    let y = region.top.round() as i32;

    LabelLayout {
      text,
      font_size,
      x,
      y,
      baseline: y.saturating_add(height as i32),
      width,
      height,
    }
  }

  // 描边以矩形边线为中心，超出图像的部分由绘制函数丢弃
  fn draw_border(&self, canvas: &mut RgbaImage, region: &Region, color: Rgba<u8>) {
    let left = region.left.round() as i64;
    let top = region.top.round() as i64;
    let right = region.right.round() as i64;
    let bottom = region.bottom.round() as i64;

    if right.saturating_sub(left) < 1
      || bottom.saturating_sub(top) < 1
      || self.stroke_width == 0
    {
      return;
    }

    // 远在画布外的边线收拢到画布外一圈，可见像素不变
    let stroke = self.stroke_width as i64;
    let pad = stroke + 1;
    let max_x = canvas.width() as i64 + pad;
    let max_y = canvas.height() as i64 + pad;
    let left = left.clamp(-pad, max_x);
    let right = right.clamp(-pad, max_x);
    let top = top.clamp(-pad, max_y);
    let bottom = bottom.clamp(-pad, max_y);
    let (width, height) = (right - left, bottom - top);
    if width < 1 || height < 1 {
      return;
    }

    let inner = stroke / 2;
    let outer = stroke - 1 - inner;
    for offset in -inner..=outer {
      let w = width + 1 + 2 * offset;
      let h = height + 1 + 2 * offset;
      if w < 1 || h < 1 {
        continue;
      }
      let rect =
        Rect::at((left - offset) as i32, (top - offset) as i32).of_size(w as u32, h as u32);
      draw_hollow_rect_mut(canvas, rect, color);
    }
  }
}

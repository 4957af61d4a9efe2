// 该文件是 Biaozhu （标注） 项目的一部分。
// tests/common/mod.rs - 测试辅助
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

use biaozhu::annotate::LabelFont;
use image::{Rgba, RgbaImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};

/// 等宽方块字体，每个字符宽 0.5 × 字号，高 = 字号
pub struct BlockFont;

impl LabelFont for BlockFont {
  fn text_size(&self, size: f32, text: &str) -> (u32, u32) {
    let chars = text.chars().count() as f32;
    ((chars * size * 0.5).round() as u32, size.round() as u32)
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
    let (w, h) = self.text_size(size, text);
    if w > 0 && h > 0 {
      draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(w, h), color);
    }
  }
}

pub fn write_replay(path: &std::path::Path, json: &str) -> url::Url {
  std::fs::write(path, json).unwrap();
  url::Url::parse(&format!("replay://{}", path.display())).unwrap()
}

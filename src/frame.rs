// 该文件是 Biaozhu （标注） 项目的一部分。
// src/frame.rs - 帧定义
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

/// 帧数据
#[derive(Debug, Clone)]
pub struct Frame {
  /// RGBA 图像数据
  pub image: RgbaImage,
  /// 帧索引
  pub index: u64,
  /// 时间戳（毫秒）
  pub timestamp_ms: u64,
}

impl Frame {
  pub fn new(image: RgbaImage, index: u64, timestamp_ms: u64) -> Self {
    Self {
      image,
      index,
      timestamp_ms,
    }
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  /// 交换 R/B 通道（BGR 与 RGB 互转）
  pub fn swap_red_blue(mut self) -> Self {
    swap_red_blue(&mut self.image);
    self
  }
}

pub fn swap_red_blue(image: &mut RgbaImage) {
  for pixel in image.pixels_mut() {
    pixel.0.swap(0, 2);
  }
}

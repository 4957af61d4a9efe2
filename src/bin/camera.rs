// 该文件是 Biaozhu （标注） 项目的一部分。
// src/bin/camera.rs - 连续帧检测标注
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

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use biaozhu::{
  FromUrl,
  annotate::{Annotator, GlyphFont},
  detection::ReplayDetectorBuilder,
  input::InputWrapper,
  output::OutputWrapper,
  settings::{DetectorOptions, parse_max_results, parse_score_percent},
  task::{ContinuousTask, DecoupledTask, Task, install_interrupt_flag},
};

/// 连续帧检测标注
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测结果来源，例如 replay:///runs/street.json
  #[arg(long, value_name = "DETECTOR")]
  pub detector: Url,
  /// 帧来源，例如 folder:///captures/street?fps=30&swap_rb
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，例如 folder:///records?record
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 标签字体文件，缺省使用内置字体
  #[arg(long, value_name = "FONT")]
  pub font: Option<String>,
  /// 最多显示的结果数
  #[arg(long, value_name = "COUNT", default_value = "5", value_parser = parse_max_results)]
  pub max_results: usize,
  /// 置信度阈值（百分数 0 - 100）
  #[arg(long, value_name = "PERCENT", default_value = "50", value_parser = parse_score_percent)]
  pub threshold: f32,
  /// 最大处理帧数
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,
  /// 读帧与检测解耦，检测跟不上时丢弃旧帧
  #[arg(long)]
  pub decoupled: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("检测结果来源: {}", args.detector);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let options = DetectorOptions::default()
    .with_max_results(args.max_results)
    .with_score_threshold(args.threshold);

  let input = InputWrapper::from_url(&args.input)?;
  let model = ReplayDetectorBuilder::from_url(&args.detector)?
    .options(options)
    .build()?;
  info!("检测参数: {:?}", model.options());
  let font = match &args.font {
    Some(path) => GlyphFont::from_path(path)?,
    None => GlyphFont::embedded()?,
  };
  let output = OutputWrapper::from_url(&args.output)?;
  let stop = install_interrupt_flag()?;
  let annotator = Annotator::new(font);

  if args.decoupled {
    DecoupledTask::new(annotator)
      .with_frame_number(args.frame_number)
      .with_stop_flag(stop)
      .run_task(input, model, output)?;
  } else {
    ContinuousTask::new(annotator)
      .with_frame_number(args.frame_number)
      .with_stop_flag(stop)
      .run_task(input, model, output)?;
  }

  Ok(())
}

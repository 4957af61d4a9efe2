// 该文件是 Biaozhu （标注） 项目的一部分。
// src/task.rs - 推理任务
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

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};
use std::{thread, time::Duration, time::Instant};

use tracing::{info, warn};

use crate::{
  annotate::{Annotator, LabelFont},
  detection::Detector,
  frame::Frame,
  output::Render,
};

mod slot;
pub use self::slot::{SlotReader, SlotWriter, frame_slot};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 安装 Ctrl-C 处理，返回停止标志；30 秒内未退出则强制结束进程
pub fn install_interrupt_flag() -> Result<Arc<AtomicBool>, ctrlc::Error> {
  let stop = Arc::new(AtomicBool::new(false));
  let flag = stop.clone();
  ctrlc::set_handler(move || {
    info!("收到中断信号，准备退出...");
    flag.store(true, Ordering::SeqCst);
    thread::spawn(|| {
      thread::sleep(Duration::from_secs(30));
      warn!("强制退出程序");
      std::process::exit(1);
    });
  })?;
  Ok(stop)
}

// 检测 -> 标注 -> 输出，返回检测数量
fn process_frame<F, M, O, ME, RE>(
  frame: &Frame,
  model: &M,
  annotator: &Annotator<F>,
  output: &O,
) -> anyhow::Result<usize>
where
  F: LabelFont,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Detector<Error = ME>,
  O: Render<Error = RE>,
{
  let now = Instant::now();
  let results = model.detect(&frame.image)?;
  let elapsed_a = now.elapsed();
  let annotated = annotator.annotate(&frame.image, &results);
  output.render_result(frame, &annotated, &results)?;
  let elapsed_b = now.elapsed();
  info!(
    "第 {} 帧: {} 个目标，推理 {:.2?} / 总计 {:.2?}",
    frame.index,
    results.len(),
    elapsed_a,
    elapsed_b
  );
  Ok(results.len())
}

/// 单张图片：取第一帧，检测、标注、输出
pub struct OneShotTask<F> {
  annotator: Annotator<F>,
}

impl<F: LabelFont> OneShotTask<F> {
  pub fn new(annotator: Annotator<F>) -> Self {
    Self { annotator }
  }
}

impl<F, ME, RE, I, M, O> Task<I, M, O> for OneShotTask<F>
where
  F: LabelFont,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Frame>,
  M: Detector<Error = ME>,
  O: Render<Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功: {}x{}", frame.width(), frame.height());
    process_frame(&frame, &model, &self.annotator, &output)?;
    info!("任务完成");
    Ok(())
  }
}

/// 连续帧：逐帧同步处理，处理慢时上游自然被阻塞
pub struct ContinuousTask<F> {
  annotator: Annotator<F>,
  frame_number: Option<usize>,
  stop: Arc<AtomicBool>,
}

impl<F: LabelFont> ContinuousTask<F> {
  pub fn new(annotator: Annotator<F>) -> Self {
    Self {
      annotator,
      frame_number: None,
      stop: Arc::new(AtomicBool::new(false)),
    }
  }

  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
    self.stop = stop;
    self
  }
}

impl<F, ME, RE, I, M, O> Task<I, M, O> for ContinuousTask<F>
where
  F: LabelFont,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Frame>,
  M: Detector<Error = ME>,
  O: Render<Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let mut processed = 0usize;
    let mut total_detections = 0usize;
    for frame in input {
      total_detections += process_frame(&frame, &model, &self.annotator, &output)?;
      processed += 1;
      if self.frame_number.map(|n| processed >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", processed);
        break;
      }
      if self.stop.load(Ordering::SeqCst) {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!(
      "任务完成，共处理 {} 帧，检测到 {} 个目标",
      processed, total_detections
    );
    Ok(())
  }
}

/// 生产者线程读帧写入单槽缓冲，检测端总是处理最新一帧；
/// 未被取走的旧帧直接丢弃，不做排队
pub struct DecoupledTask<F> {
  annotator: Annotator<F>,
  frame_number: Option<usize>,
  stop: Arc<AtomicBool>,
}

impl<F: LabelFont> DecoupledTask<F> {
  pub fn new(annotator: Annotator<F>) -> Self {
    Self {
      annotator,
      frame_number: None,
      stop: Arc::new(AtomicBool::new(false)),
    }
  }

  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
    self.stop = stop;
    self
  }
}

impl<F, ME, RE, I, M, O> Task<I, M, O> for DecoupledTask<F>
where
  F: LabelFont,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Frame> + Send,
  M: Detector<Error = ME>,
  O: Render<Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务（解耦模式）...");
    let (writer, slot) = frame_slot();
    let done = AtomicBool::new(false);

    let result = thread::scope(|scope| {
      scope.spawn(|| {
        for frame in input {
          if done.load(Ordering::SeqCst) || self.stop.load(Ordering::SeqCst) {
            break;
          }
          writer.put(frame);
        }
        writer.close();
      });

      let mut processed = 0usize;
      let outcome = (|| -> anyhow::Result<()> {
        while let Some(frame) = slot.take() {
          process_frame(&frame, &model, &self.annotator, &output)?;
          processed += 1;
          if self.frame_number.map(|n| processed >= n).unwrap_or(false) {
            info!("达到指定帧数 {}, 退出任务循环", processed);
            break;
          }
          if self.stop.load(Ordering::SeqCst) {
            warn!("中断信号接收，退出任务循环");
            break;
          }
        }
        Ok(())
      })();
      done.store(true, Ordering::SeqCst);
      info!("共处理 {} 帧，丢弃 {} 帧", processed, slot.dropped());
      outcome
    });

    info!("任务完成，退出");
    result
  }
}

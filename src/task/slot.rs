// 该文件是 Biaozhu （标注） 项目的一部分。
// src/task/slot.rs - 单槽帧缓冲
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
  atomic::{AtomicU64, Ordering},
};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::debug;

/// 创建容量为 1 的帧缓冲：写入时覆盖尚未取走的旧值
pub fn frame_slot<T>() -> (SlotWriter<T>, SlotReader<T>) {
  let (tx, rx) = bounded(1);
  let dropped = Arc::new(AtomicU64::new(0));
  let writer = SlotWriter {
    tx,
    stale: rx.clone(),
    dropped: dropped.clone(),
  };
  (writer, SlotReader { rx, dropped })
}

/// 写入端，持有一份接收端用于清掉未取走的旧值
pub struct SlotWriter<T> {
  tx: Sender<T>,
  stale: Receiver<T>,
  dropped: Arc<AtomicU64>,
}

impl<T> SlotWriter<T> {
  /// 写入新值，返回是否丢弃了旧值
  pub fn put(&self, item: T) -> bool {
    let mut item = item;
    let mut replaced = false;
    loop {
      match self.tx.try_send(item) {
        Ok(()) => return replaced,
        Err(TrySendError::Full(back)) => {
          if self.stale.try_recv().is_ok() {
            replaced = true;
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("丢弃未处理的旧帧，累计 {}", dropped);
          }
          item = back;
        }
        // 自身持有接收端，通道不会断开
        Err(TrySendError::Disconnected(_)) => return replaced,
      }
    }
  }

  /// 不再写入；已有的值仍可取走
  pub fn close(self) {
    drop(self);
  }
}

/// 读取端
pub struct SlotReader<T> {
  rx: Receiver<T>,
  dropped: Arc<AtomicU64>,
}

impl<T> SlotReader<T> {
  /// 阻塞直到有值；写入端关闭且为空时返回 None
  pub fn take(&self) -> Option<T> {
    self.rx.recv().ok()
  }

  pub fn dropped(&self) -> u64 {
    self.dropped.load(Ordering::Relaxed)
  }
}

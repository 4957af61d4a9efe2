// 该文件是 Biaozhu （标注） 项目的一部分。
// src/utils.rs - URL 辅助函数
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

use url::Url;

/// 将 URL 路径解码为文件系统路径（处理空格、中文等百分号编码字符）
pub fn url_path(url: &Url) -> PathBuf {
  match urlencoding::decode(url.path()) {
    Ok(path) => PathBuf::from(path.into_owned()),
    Err(_) => PathBuf::from(url.path()),
  }
}

/// 查询参数中是否出现某个键（不关心取值）
pub fn has_query_flag(url: &Url, key: &str) -> bool {
  url.query_pairs().any(|(k, _)| k == key)
}

/// 取查询参数的值
pub fn query_value(url: &Url, key: &str) -> Option<String> {
  url
    .query_pairs()
    .find(|(k, _)| k == key)
    .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_percent_encoded_paths() {
    let url = Url::parse("image:///tmp/my%20photos/%E7%8C%AB.png").unwrap();
    assert_eq!(url_path(&url), PathBuf::from("/tmp/my photos/猫.png"));
  }

  #[test]
  fn reads_flags_and_values() {
    let url = Url::parse("folder:///frames?fps=15&swap_rb").unwrap();
    assert!(has_query_flag(&url, "swap_rb"));
    assert!(!has_query_flag(&url, "always"));
    assert_eq!(query_value(&url, "fps").as_deref(), Some("15"));
    assert_eq!(query_value(&url, "record"), None);
  }
}

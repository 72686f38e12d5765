//! 章节标题推导模块
//!
//! EPUB章节文件很少携带专门的标题元数据，最显眼的标题元素是最好的
//! 替代品。从h5到h1逐级扫描：顶层标题常常是重复的样板文字("第X章")，
//! 更深层级的子标题才是真正的章节名，所以优先取更具体的层级。

use crate::epub::xml::XmlDocument;

/// 没有任何可用标题时的回退标题
pub const FALLBACK_TITLE: &str = "Untitled";

/// 从章节文档中推导显示标题
///
/// 按h5到h1的顺序查找每个层级的全部标题元素(文档顺序)，取第一个
/// 修剪后非空的文本；所有层级都没有可用文本时返回`"Untitled"`。
pub fn deduce_chapter_title(document: &XmlDocument) -> String {
    for level in (1..=5u32).rev() {
        let query = format!("//h{}", level);
        for header in document.select_all(&query) {
            if let Some(text) = header.first_text() {
                return text;
            }
        }
    }
    FALLBACK_TITLE.to_string()
}

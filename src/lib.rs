pub mod epub;

// === 核心API重新导出 ===

/// EPUB书籍模型（主要接口）
pub use epub::Book;

/// 错误处理
pub use epub::{EpubError, Result};

// === 数据结构 ===

/// 章节信息
pub use epub::Chapter;

/// 资源及其存储
pub use epub::{Resource, ResourceStore};

// === 底层组件（高级用法） ===

/// 文档缓存与文档树
pub use epub::{DocumentCache, XmlDocument, XmlElement, XmlNode};

/// 元数据查询配置
pub use epub::{MetadataQuery, MetadataQueryConfigs};

/// 章节标题推导
pub use epub::{FALLBACK_TITLE, deduce_chapter_title};

// === 库信息 ===

/// BookBind库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// BookBind库的描述
pub const DESCRIPTION: &str = "一个用于合并EPUB文件的Rust库";

// === 便捷函数 ===

/// 快速打开EPUB文件
///
/// 这是 `Book::from_path` 的便捷包装函数。
///
/// # 参数
/// * `path` - EPUB文件路径
///
/// # 返回值
/// * `Result<Book>` - 书籍实例
pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Book> {
    Book::from_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        println!("BookBind version: {}", VERSION);
    }

    #[test]
    fn test_description() {
        assert!(!DESCRIPTION.is_empty());
        println!("Description: {}", DESCRIPTION);
    }
}

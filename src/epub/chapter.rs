//! 章节模块
//!
//! 提供阅读顺序条目(章节)的结构定义。

/// 章节信息(阅读顺序中的一项)
///
/// 章节序列的顺序即阅读顺序，调用者可以在加载和保存之间任意重排。
#[derive(Debug, Clone)]
pub struct Chapter {
    /// 推导出的显示标题
    title: String,
    /// 章节内容对应的资源路径
    resource_path: String,
}

impl Chapter {
    /// 创建新的章节
    pub fn new(title: impl Into<String>, resource_path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            resource_path: resource_path.into(),
        }
    }

    /// 章节标题
    pub fn title(&self) -> &str {
        &self.title
    }

    /// 章节内容所在的资源路径
    ///
    /// 该路径必须存在于所属Book的资源存储中。
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }
}

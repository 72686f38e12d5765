//! 资源模块
//!
//! 提供EPUB归档内资源(按路径寻址的二进制条目)及其有序存储的结构定义。

use crate::epub::error::{EpubError, Result};

/// EPUB归档中的单个资源
///
/// 路径同时是资源的名称和主键。媒体类型在解析包文档之前是未知的，
/// 由加载过程通过[`ResourceStore::set_kind`]显式赋值。
#[derive(Debug, Clone)]
pub struct Resource {
    path: String,
    content: Vec<u8>,
    kind: String,
}

impl Resource {
    /// 创建新的资源
    ///
    /// # 参数
    /// * `path` - 资源在归档中的完整路径
    /// * `content` - 资源的原始二进制内容
    pub fn new(path: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            content,
            kind: String::new(),
        }
    }

    /// 资源路径(归档内的完整路径)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 资源的原始内容
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// 资源的媒体类型，未知时为空字符串
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// 检查资源是否为XML文档类资源
    pub fn is_document(&self) -> bool {
        self.kind.contains("xml")
    }
}

/// 按路径排序的资源存储
///
/// 始终保持按路径的字典序排序，以支持二分查找。插入阶段允许重复路径，
/// 去重在拷贝/合并边界由[`ResourceStore::dedup_by_path`]完成。
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    resources: Vec<Resource>,
}

impl ResourceStore {
    /// 创建空的资源存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入资源，保持按路径排序
    ///
    /// 相同路径的资源插入到已有条目之后，配合稳定去重实现"先出现者保留"。
    pub fn add(&mut self, resource: Resource) {
        let pos = self
            .resources
            .partition_point(|r| r.path.as_str() <= resource.path.as_str());
        self.resources.insert(pos, resource);
    }

    /// 按路径二分查找资源
    ///
    /// # 参数
    /// * `path` - 资源路径
    ///
    /// # 返回值
    /// * `Result<&Resource>` - 找不到时返回`ResourceNotFound`，存储不变
    pub fn lookup(&self, path: &str) -> Result<&Resource> {
        self.resources
            .binary_search_by(|r| r.path.as_str().cmp(path))
            .map(|idx| &self.resources[idx])
            .map_err(|_| EpubError::ResourceNotFound(path.to_string()))
    }

    /// 设置资源的媒体类型
    ///
    /// 这是存储中唯一的原地修改操作，在包文档解析出资源的角色后调用。
    pub fn set_kind(&mut self, path: &str, kind: impl Into<String>) -> Result<()> {
        let idx = self
            .resources
            .binary_search_by(|r| r.path.as_str().cmp(path))
            .map_err(|_| EpubError::ResourceNotFound(path.to_string()))?;
        self.resources[idx].kind = kind.into();
        Ok(())
    }

    /// 按路径去重
    ///
    /// 稳定排序后折叠相邻的同路径条目，保留最先出现的那个。
    pub fn dedup_by_path(&mut self) {
        self.resources.sort_by(|a, b| a.path.cmp(&b.path));
        self.resources.dedup_by(|b, a| a.path == b.path);
    }

    /// 合并另一个存储中的全部资源，随后按路径去重
    ///
    /// 去重时本存储中已有的条目优先保留。
    pub fn merge_from(&mut self, other: &ResourceStore) {
        self.resources.extend(other.resources.iter().cloned());
        self.dedup_by_path();
    }

    /// 按路径顺序遍历所有资源
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    /// 资源总数
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// 检查存储是否为空
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(path: &str, content: &str) -> Resource {
        Resource::new(path, content.as_bytes().to_vec())
    }

    #[test]
    fn test_add_keeps_sorted_order() {
        let mut store = ResourceStore::new();
        store.add(res("b.xhtml", "b"));
        store.add(res("a.xhtml", "a"));
        store.add(res("c.png", "c"));

        let paths: Vec<&str> = store.iter().map(|r| r.path()).collect();
        assert_eq!(paths, vec!["a.xhtml", "b.xhtml", "c.png"]);
    }

    #[test]
    fn test_lookup_found_and_missing() {
        let mut store = ResourceStore::new();
        store.add(res("OEBPS/ch1.xhtml", "one"));
        store.add(res("OEBPS/ch2.xhtml", "two"));

        let found = store.lookup("OEBPS/ch2.xhtml").unwrap();
        assert_eq!(found.content(), b"two");

        let missing = store.lookup("OEBPS/ch3.xhtml");
        assert!(matches!(missing, Err(EpubError::ResourceNotFound(p)) if p == "OEBPS/ch3.xhtml"));
        // 查找失败不改变存储
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_set_kind() {
        let mut store = ResourceStore::new();
        store.add(res("ch1.xhtml", "x"));
        assert_eq!(store.lookup("ch1.xhtml").unwrap().kind(), "");
        assert!(!store.lookup("ch1.xhtml").unwrap().is_document());

        store.set_kind("ch1.xhtml", "application/xhtml+xml").unwrap();
        assert_eq!(
            store.lookup("ch1.xhtml").unwrap().kind(),
            "application/xhtml+xml"
        );
        assert!(store.lookup("ch1.xhtml").unwrap().is_document());

        let err = store.set_kind("nope", "text/css");
        assert!(matches!(err, Err(EpubError::ResourceNotFound(_))));
    }

    #[test]
    fn test_dedup_first_occurrence_wins() {
        let mut store = ResourceStore::new();
        store.add(res("style.css", "first"));
        store.add(res("style.css", "second"));
        store.add(res("ch1.xhtml", "ch"));
        assert_eq!(store.len(), 3);

        store.dedup_by_path();
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup("style.css").unwrap().content(), b"first");
    }

    #[test]
    fn test_merge_from_prefers_existing() {
        let mut a = ResourceStore::new();
        a.add(res("shared.css", "from a"));
        a.add(res("a.xhtml", "a"));

        let mut b = ResourceStore::new();
        b.add(res("shared.css", "from b"));
        b.add(res("b.xhtml", "b"));

        a.merge_from(&b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.lookup("shared.css").unwrap().content(), b"from a");
        assert!(a.lookup("b.xhtml").is_ok());
    }
}

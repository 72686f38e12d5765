//! 文档缓存模块
//!
//! 以资源路径为键，对XML文档树做惰性的记忆化解析。每个资源在一个Book
//! 实例内至多解析一次，此后所有读写共享同一棵树，修改对后续调用可见。

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::epub::error::{EpubError, Result};
use crate::epub::resource::Resource;
use crate::epub::xml::XmlDocument;

/// XML文档树的惰性缓存
#[derive(Debug, Default)]
pub struct DocumentCache {
    documents: HashMap<String, XmlDocument>,
}

impl DocumentCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取资源对应的文档树，首次访问时解析并缓存
    ///
    /// # 参数
    /// * `resource` - 要解析的资源，媒体类型必须是XML文档类
    ///
    /// # 返回值
    /// * `Result<&mut XmlDocument>` - 缓存中的树(命中与否对调用者透明)；
    ///   资源类型不支持时返回`UnsupportedKind`，内容不合法时返回`ParseError`
    pub fn get_or_parse(&mut self, resource: &Resource) -> Result<&mut XmlDocument> {
        if !resource.is_document() {
            return Err(EpubError::UnsupportedKind {
                path: resource.path().to_string(),
                kind: resource.kind().to_string(),
            });
        }

        match self.documents.entry(resource.path().to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let document =
                    XmlDocument::parse(resource.content()).map_err(|message| {
                        EpubError::ParseError {
                            path: resource.path().to_string(),
                            message,
                        }
                    })?;
                Ok(entry.insert(document))
            }
        }
    }

    /// 检查资源是否已被解析过
    ///
    /// 保存时据此决定从树序列化(反映修改)还是直接写原始字节。
    pub fn has_parsed(&self, path: &str) -> bool {
        self.documents.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::resource::ResourceStore;

    fn xml_resource(path: &str, content: &str) -> Resource {
        let mut store = ResourceStore::new();
        store.add(Resource::new(path, content.as_bytes().to_vec()));
        store.set_kind(path, "application/xhtml+xml").unwrap();
        store.lookup(path).unwrap().clone()
    }

    #[test]
    fn test_unsupported_kind_rejected() {
        let mut cache = DocumentCache::new();
        let image = Resource::new("cover.jpg", vec![0xFF, 0xD8]);
        let result = cache.get_or_parse(&image);
        assert!(matches!(
            result,
            Err(EpubError::UnsupportedKind { path, .. }) if path == "cover.jpg"
        ));
        assert!(!cache.has_parsed("cover.jpg"));
    }

    #[test]
    fn test_parse_error_includes_diagnostic() {
        let mut cache = DocumentCache::new();
        let broken = xml_resource("broken.xhtml", "<html><body></html>");
        let result = cache.get_or_parse(&broken);
        assert!(matches!(
            result,
            Err(EpubError::ParseError { path, .. }) if path == "broken.xhtml"
        ));
    }

    #[test]
    fn test_memoized_edits_are_visible() {
        let mut cache = DocumentCache::new();
        let resource = xml_resource("doc.xhtml", "<html><body><p>hi</p></body></html>");

        assert!(!cache.has_parsed("doc.xhtml"));
        {
            let doc = cache.get_or_parse(&resource).unwrap();
            let appended =
                doc.append_child("/html/body", crate::epub::xml::XmlElement::new("div"));
            assert!(appended);
        }
        assert!(cache.has_parsed("doc.xhtml"));

        // 第二次访问返回同一棵树，之前的修改可见
        let doc = cache.get_or_parse(&resource).unwrap();
        assert!(doc.select_first("/html/body/div").is_some());
    }
}

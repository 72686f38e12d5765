//! 包文档加载模块
//!
//! 通过容器描述文件定位包文档，从中提取元数据并按spine顺序推导章节列表。

use crate::epub::book::Book;
use crate::epub::chapter::Chapter;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::config::MetadataQueryConfigs;
use crate::epub::title::deduce_chapter_title;

/// 容器描述文件在归档中的固定路径
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// 容器描述文件中指向包文档的rootfile查询路径
const ROOTFILE_QUERY: &str = "/container/rootfiles/rootfile";

/// manifest清单项，按id排序后支持二分查找
#[derive(Debug, Clone)]
struct ManifestEntry {
    id: String,
    href: String,
    media_type: String,
}

impl Book {
    /// 解析容器描述文件，定位包文档
    ///
    /// 容器描述文件和包文档都在此处被标记为XML文档类资源。
    pub(crate) fn resolve_root_file(&mut self) -> Result<()> {
        self.resources.set_kind(CONTAINER_PATH, "application/xml")?;
        let container = self
            .cache
            .get_or_parse(self.resources.lookup(CONTAINER_PATH)?)?;

        let root_path = container
            .select_first(ROOTFILE_QUERY)
            .and_then(|rootfile| rootfile.attribute("full-path"))
            .map(|path| path.to_string())
            .ok_or_else(|| {
                EpubError::ContainerParseError("没有找到有效的rootfile条目".to_string())
            })?;

        self.resources
            .set_kind(&root_path, "application/oebps-package+xml")?;
        self.root_path = root_path;
        Ok(())
    }

    /// 从包文档提取元数据
    ///
    /// 对每个配置的语义字段执行其查询路径，取第一个匹配节点的文本，
    /// 没有匹配时存入空字符串。
    pub(crate) fn load_metadata(&mut self, config: &MetadataQueryConfigs) -> Result<()> {
        let document = self
            .cache
            .get_or_parse(self.resources.lookup(&self.root_path)?)?;

        for (name, query) in config.fields() {
            let value = document
                .select_first(query)
                .map(|node| node.text().trim().to_string())
                .unwrap_or_default();
            self.metadata.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// 按spine顺序推导章节列表
    ///
    /// spine的idref列表被原样保留，供保存时的包文档改写做差异删除。
    pub(crate) fn load_chapters(&mut self) -> Result<()> {
        // 先把manifest和spine拷贝成自有数据，之后才能修改资源存储
        let (mut manifest, spine_ids) = {
            let document = self
                .cache
                .get_or_parse(self.resources.lookup(&self.root_path)?)?;

            let manifest: Vec<ManifestEntry> = document
                .select_all("/package/manifest/item")
                .into_iter()
                .map(|item| ManifestEntry {
                    id: item.attribute("id").unwrap_or_default().to_string(),
                    href: item.attribute("href").unwrap_or_default().to_string(),
                    media_type: item.attribute("media-type").unwrap_or_default().to_string(),
                })
                .collect();

            let spine_ids: Vec<String> = document
                .select_all("/package/spine/itemref")
                .into_iter()
                .filter_map(|itemref| itemref.attribute("idref"))
                .filter(|idref| !idref.is_empty())
                .map(|idref| idref.to_string())
                .collect();

            (manifest, spine_ids)
        };
        manifest.sort_by(|a, b| a.id.cmp(&b.id));

        let package_dir = package_directory(&self.root_path);
        for idref in &spine_ids {
            let idx = manifest
                .binary_search_by(|entry| entry.id.as_str().cmp(idref))
                .map_err(|_| EpubError::SpineManifestMismatch(idref.clone()))?;
            let entry = &manifest[idx];

            let resource_path = resolve_href(&package_dir, &entry.href);
            self.resources
                .set_kind(&resource_path, entry.media_type.clone())?;

            let document = self
                .cache
                .get_or_parse(self.resources.lookup(&resource_path)?)?;
            let title = deduce_chapter_title(document);
            self.chapters.push(Chapter::new(title, resource_path));
        }

        self.spine_ids = spine_ids;
        Ok(())
    }
}

/// 包文档所在的目录(归档内路径)，位于根目录时为空字符串
pub(crate) fn package_directory(root_path: &str) -> String {
    match root_path.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => String::new(),
    }
}

/// 把manifest中相对于包文档的href解析为归档内的完整路径
pub(crate) fn resolve_href(package_dir: &str, href: &str) -> String {
    if package_dir.is_empty() {
        href.to_string()
    } else {
        format!("{}/{}", package_dir, href)
    }
}

//! 包文档改写模块
//!
//! 根据Book当前的章节序列重建包文档的manifest和spine：精确删除原始
//! spine对应的条目(样式表、图片、导航文档等从未进入spine的清单项原样
//! 保留)，再按新的章节顺序追加合成条目。章节的增删和重排因此只需要
//! 在加载和保存之间修改章节序列本身。

use crate::epub::book::Book;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::parser::package_directory;
use crate::epub::xml::XmlElement;

/// 合成清单id的起始偏移
///
/// 合成id等于章节下标加上该偏移，不会与既有的小编号id冲突。
/// 同一个Book重复保存时产生相同的id序列。
pub const SYNTHETIC_ID_BASE: usize = 10000;

impl Book {
    /// 按当前章节序列改写包文档的manifest和spine
    pub(crate) fn rewrite_package(&mut self) -> Result<()> {
        let package_dir = package_directory(&self.root_path);

        // 先收集每个章节的(相对href, 合成id, 媒体类型)，之后才能独占借用文档树
        let mut additions = Vec::with_capacity(self.chapters.len());
        for (idx, chapter) in self.chapters.iter().enumerate() {
            let resource = self.resources.lookup(chapter.resource_path())?;
            let synthetic_id = (idx + SYNTHETIC_ID_BASE).to_string();
            let href = relative_href(&package_dir, chapter.resource_path()).to_string();
            additions.push((href, synthetic_id, resource.kind().to_string()));
        }
        let synthetic_ids: Vec<String> = additions.iter().map(|(_, id, _)| id.clone()).collect();

        let mut original_ids = self.spine_ids.clone();
        original_ids.sort();
        let in_original_spine = |id: Option<&str>| -> bool {
            match id {
                Some(id) => original_ids
                    .binary_search_by(|probe| probe.as_str().cmp(id))
                    .is_ok(),
                None => false,
            }
        };

        let document = self
            .cache
            .get_or_parse(self.resources.lookup(&self.root_path)?)?;

        let manifest_found = document.retain_children("/package/manifest", |element| {
            !(element.local_name() == "item" && in_original_spine(element.attribute("id")))
        });
        let spine_found = document.retain_children("/package/spine", |element| {
            !(element.local_name() == "itemref" && in_original_spine(element.attribute("idref")))
        });
        if !manifest_found || !spine_found {
            return Err(EpubError::InvalidEpub(
                "包文档中缺少manifest或spine元素".to_string(),
            ));
        }

        for (href, id, media_type) in additions {
            let mut item = XmlElement::new("item");
            item.set_attribute("href", href);
            item.set_attribute("id", id.clone());
            item.set_attribute("media-type", media_type);
            document.append_child("/package/manifest", item);

            let mut itemref = XmlElement::new("itemref");
            itemref.set_attribute("idref", id);
            itemref.set_attribute("linear", "yes");
            document.append_child("/package/spine", itemref);
        }

        // 合成id成为新的spine id列表，重复保存时先删除上一轮的合成条目
        self.spine_ids = synthetic_ids;
        Ok(())
    }
}

/// 把归档内的完整路径还原为相对于包文档目录的href
fn relative_href<'a>(package_dir: &str, path: &'a str) -> &'a str {
    if package_dir.is_empty() {
        return path;
    }
    match path
        .strip_prefix(package_dir)
        .and_then(|rest| rest.strip_prefix('/'))
    {
        Some(rest) => rest,
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_href() {
        assert_eq!(relative_href("OEBPS", "OEBPS/text/ch1.xhtml"), "text/ch1.xhtml");
        assert_eq!(relative_href("", "ch1.xhtml"), "ch1.xhtml");
        // 不在包目录下的路径原样返回
        assert_eq!(relative_href("OEBPS", "other/ch1.xhtml"), "other/ch1.xhtml");
    }
}

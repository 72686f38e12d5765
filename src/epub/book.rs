//! 书籍模块
//!
//! `Book`是整个库的门面：从字节或路径构建，聚合资源存储、元数据、
//! 章节序列和文档缓存，提供两本书的合并以及重建包文档后的保存。

use std::collections::HashMap;
use std::fs;
use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::ops::Add;
use std::path::Path;

use crate::epub::archive;
use crate::epub::cache::DocumentCache;
use crate::epub::chapter::Chapter;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::config::MetadataQueryConfigs;
use crate::epub::resource::{Resource, ResourceStore};

/// 表示一本已加载到内存的EPUB书
///
/// 章节序列定义阅读顺序，可以在加载和保存之间通过[`Book::chapters_mut`]
/// 任意增删重排；保存时包文档会按当前序列重建。
#[derive(Debug)]
pub struct Book {
    pub(crate) resources: ResourceStore,
    pub(crate) metadata: HashMap<String, String>,
    pub(crate) chapters: Vec<Chapter>,
    pub(crate) root_path: String,
    pub(crate) spine_ids: Vec<String>,
    pub(crate) cache: DocumentCache,
}

impl Book {
    /// 从文件路径加载EPUB
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<Book>` - 成功返回Book实例，失败返回错误
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Book> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// 从字节缓冲区加载EPUB
    pub fn from_bytes(bytes: &[u8]) -> Result<Book> {
        Self::from_bytes_with_config(bytes, &MetadataQueryConfigs::default_config())
    }

    /// 使用指定的元数据查询配置从字节缓冲区加载EPUB
    ///
    /// # 参数
    /// * `bytes` - 整个归档的字节内容
    /// * `config` - 元数据字段的查询配置
    pub fn from_bytes_with_config(bytes: &[u8], config: &MetadataQueryConfigs) -> Result<Book> {
        let mut resources = ResourceStore::new();
        for (name, content) in archive::unpack(bytes)? {
            resources.add(Resource::new(name, content));
        }

        let mut book = Book {
            resources,
            metadata: HashMap::new(),
            chapters: Vec::new(),
            root_path: String::new(),
            spine_ids: Vec::new(),
            cache: DocumentCache::new(),
        };

        book.validate()?;
        book.resolve_root_file()?;
        book.load_metadata(config)?;
        book.load_chapters()?;
        Ok(book)
    }

    /// 验证EPUB的mimetype文件
    ///
    /// 检查步骤：
    /// 1. 检查是否存在mimetype条目
    /// 2. 验证其内容是否为"application/epub+zip"
    fn validate(&self) -> Result<()> {
        let Ok(mimetype) = self.resources.lookup("mimetype") else {
            return Err(EpubError::MissingMimetype);
        };

        let content = String::from_utf8_lossy(mimetype.content());
        let content = content.trim();
        let expected = "application/epub+zip";
        if content != expected {
            return Err(EpubError::InvalidMimetype {
                expected: expected.to_string(),
                found: content.to_string(),
            });
        }
        Ok(())
    }

    /// 提取出的元数据(字段名到值的映射)
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// 当前的章节序列(阅读顺序)
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// 章节序列的可变引用，调用者可以任意增删重排
    pub fn chapters_mut(&mut self) -> &mut Vec<Chapter> {
        &mut self.chapters
    }

    /// 书内的资源存储
    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    /// 包文档在归档中的路径
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// 合并两本书
    ///
    /// 以本书的拷贝为基础：元数据中本书的值优先(不覆盖)；对方的章节
    /// 追加在本书章节之后，双方内部顺序不变；资源合并后按路径去重，
    /// 先出现者保留。合并结果的章节序列就是新的阅读顺序，与双方原有
    /// 的spine无关。
    pub fn merge(&self, other: &Book) -> Book {
        let mut result = self.clone();
        for (key, value) in &other.metadata {
            result
                .metadata
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        result.chapters.extend(other.chapters.iter().cloned());
        result.resources.merge_from(&other.resources);
        result
    }

    /// 保存为EPUB文件
    ///
    /// 按当前章节序列重建包文档后写出归档。已解析的文档从树序列化
    /// (反映全部修改)，未解析的资源按原始字节原样写出。
    ///
    /// # 参数
    /// * `path` - 输出文件路径
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// 把重建后的归档写入任意`Write + Seek`目标
    pub fn write_to<W: Write + Seek>(&mut self, writer: W) -> Result<()> {
        self.rewrite_package()?;

        let mut entries = Vec::with_capacity(self.resources.len());
        for resource in self.resources.iter() {
            let content = if self.cache.has_parsed(resource.path()) {
                self.cache.get_or_parse(resource)?.to_bytes()
            } else {
                resource.content().to_vec()
            };
            entries.push((resource.path().to_string(), content));
        }

        archive::pack(writer, entries)
    }

    /// 序列化为EPUB归档字节
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }
}

impl Clone for Book {
    /// 拷贝时资源按路径去重(稳定排序后折叠，先出现者保留)；
    /// 文档缓存不随拷贝保留，需要时惰性重建。
    fn clone(&self) -> Self {
        let mut resources = self.resources.clone();
        resources.dedup_by_path();
        Book {
            resources,
            metadata: self.metadata.clone(),
            chapters: self.chapters.clone(),
            root_path: self.root_path.clone(),
            spine_ids: self.spine_ids.clone(),
            cache: DocumentCache::new(),
        }
    }
}

impl Add<&Book> for &Book {
    type Output = Book;

    /// `&a + &b`等价于`a.merge(&b)`
    fn add(self, rhs: &Book) -> Book {
        self.merge(rhs)
    }
}

//! 元数据查询配置模块
//!
//! 提供元数据字段到包文档查询路径的配置管理功能，支持从YAML文件加载配置。

use crate::epub::error::{EpubError, Result};
use serde::{Deserialize, Serialize};
use std::fs;

/// 默认配置文件路径
const DEFAULT_CONFIG_PATH: &str = "metadata_queries.yaml";

/// 单个元数据字段的查询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataQuery {
    /// 针对包文档的查询路径
    pub query: String,
    /// 可选的描述
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MetadataQuery {
    /// 创建新的查询配置
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            description: None,
        }
    }

    /// 创建带描述的查询配置
    pub fn with_description(query: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            description: Some(description.into()),
        }
    }
}

/// 元数据查询配置，定义每个语义字段对应的包文档查询路径
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataQueryConfigs {
    /// 标题查询配置
    pub title: MetadataQuery,
    /// 作者查询配置
    pub author: MetadataQuery,
    /// 语言查询配置
    pub language: MetadataQuery,
    /// UUID标识符查询配置
    pub uuid: MetadataQuery,
    /// ISBN标识符查询配置
    pub isbn: MetadataQuery,
    /// 描述查询配置
    pub description: MetadataQuery,
}

impl MetadataQueryConfigs {
    /// 从默认配置文件中加载元数据查询配置
    ///
    /// 配置文件默认为当前目录下的 `metadata_queries.yaml`
    ///
    /// # 返回值
    /// * `Result<Self>` - 加载成功返回配置实例，失败返回错误
    pub fn from_file() -> Result<Self> {
        let content = fs::read_to_string(DEFAULT_CONFIG_PATH)
            .map_err(|e| EpubError::ConfigError(format!("无法读取配置文件: {}", e)))?;

        serde_yml::from_str(&content)
            .map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))
    }

    /// 获取默认配置
    ///
    /// 查询路径与字段集合来自EPUB包文档的Dublin Core元数据约定。
    pub fn default_config() -> Self {
        Self {
            title: MetadataQuery::with_description("/package/metadata/dc:title", "书籍标题"),
            author: MetadataQuery::with_description("/package/metadata/dc:creator", "作者信息"),
            language: MetadataQuery::with_description("/package/metadata/dc:language", "书籍语言"),
            uuid: MetadataQuery::with_description(
                "/package/metadata/dc:identifier[@opf:scheme='uuid']",
                "UUID标识符",
            ),
            isbn: MetadataQuery::with_description(
                "/package/metadata/dc:identifier[@opf:scheme='ISBN']",
                "ISBN标识符",
            ),
            description: MetadataQuery::with_description(
                "/package/metadata/dc:description",
                "书籍描述/简介",
            ),
        }
    }

    /// 尝试从默认配置文件加载，文件不存在或无效时使用内置默认配置
    pub fn new() -> Self {
        Self::from_file().unwrap_or_else(|_| Self::default_config())
    }

    /// 按固定顺序返回(字段名, 查询路径)列表
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("title", self.title.query.as_str()),
            ("author", self.author.query.as_str()),
            ("language", self.language.query.as_str()),
            ("uuid", self.uuid.query.as_str()),
            ("isbn", self.isbn.query.as_str()),
            ("description", self.description.query.as_str()),
        ]
    }
}

impl Default for MetadataQueryConfigs {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_fields() {
        let config = MetadataQueryConfigs::default_config();
        let fields = config.fields();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0].0, "title");
        assert_eq!(fields[0].1, "/package/metadata/dc:title");
        assert_eq!(fields[4].1, "/package/metadata/dc:identifier[@opf:scheme='ISBN']");
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = MetadataQueryConfigs::default_config();
        let yaml = serde_yml::to_string(&config).unwrap();
        let restored: MetadataQueryConfigs = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(restored.title.query, config.title.query);
        assert_eq!(restored.isbn.query, config.isbn.query);
    }
}

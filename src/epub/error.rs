use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// Epub相关的错误类型
///
/// 所有错误在检测点都是不可恢复的，直接向上层调用者传播。
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("文件不是有效的EPUB格式: {0}")]
    InvalidEpub(String),

    #[error("缺少mimetype文件")]
    MissingMimetype,

    #[error("无效的mimetype: {expected}, 找到: {found}")]
    InvalidMimetype { expected: String, found: String },

    #[error("资源不存在: {0}")]
    ResourceNotFound(String),

    #[error("资源{path}的媒体类型({kind})不是XML文档")]
    UnsupportedKind { path: String, kind: String },

    #[error("XML文档{path}解析错误: {message}")]
    ParseError { path: String, message: String },

    #[error("spine中的itemref({0})在manifest中没有对应的清单项")]
    SpineManifestMismatch(String),

    #[error("container.xml解析错误: {0}")]
    ContainerParseError(String),

    #[error("XML解析错误: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("配置文件错误: {0}")]
    ConfigError(String),
}

pub mod archive;
pub mod book;
pub mod cache;
pub mod chapter;
pub mod error;
pub mod opf;
pub mod resource;
pub mod title;
pub mod xml;

// 重新导出错误处理
pub use error::{EpubError, Result};

// 重新导出书籍门面
pub use book::Book;

// 重新导出章节与资源
pub use chapter::Chapter;
pub use resource::{Resource, ResourceStore};

// 重新导出文档缓存与文档树
pub use cache::DocumentCache;
pub use xml::{XmlDocument, XmlElement, XmlNode};

// 重新导出包文档相关
pub use opf::{MetadataQuery, MetadataQueryConfigs, SYNTHETIC_ID_BASE};

// 重新导出章节标题推导
pub use title::{FALLBACK_TITLE, deduce_chapter_title};

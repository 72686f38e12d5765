//! XML文档树模块
//!
//! 提供可变的XML文档树，支持受限的路径查询(绝对子路径、属性谓词、
//! 通配后代查找)、属性读写、文本提取、子节点追加/删除和重新序列化。
//! 包文档的改写和章节标题推导都在这棵树上进行。

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// XML树中的一个节点
#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
}

/// XML元素
///
/// 元素名和属性名保留文档中的原始写法(含命名空间前缀)，
/// 查询时按本地名称匹配。
#[derive(Debug, Clone)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// 创建新的空元素
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// 元素名(含命名空间前缀)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 去掉命名空间前缀的本地名称
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// 按本地名称读取属性值
    pub fn attribute(&self, name: &str) -> Option<&str> {
        let target = local_name(name);
        self.attributes
            .iter()
            .find(|(key, _)| local_name(key) == target)
            .map(|(_, value)| value.as_str())
    }

    /// 设置属性值，已存在的同名属性被覆盖
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.attributes.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// 遍历直接子元素
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// 拼接元素及其后代的全部文本内容
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(text) | XmlNode::CData(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
                XmlNode::Comment(_) => {}
            }
        }
    }

    /// 深度优先查找第一个修剪后非空的文本
    ///
    /// 仅含空白的文本节点不会结束查找。
    pub fn first_text(&self) -> Option<String> {
        for child in &self.children {
            match child {
                XmlNode::Text(text) | XmlNode::CData(text) => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
                XmlNode::Element(element) => {
                    if let Some(found) = element.first_text() {
                        return Some(found);
                    }
                }
                XmlNode::Comment(_) => {}
            }
        }
        None
    }
}

/// 已解析的XML文档
#[derive(Debug, Clone)]
pub struct XmlDocument {
    has_declaration: bool,
    doctype: Option<String>,
    root: XmlElement,
}

impl XmlDocument {
    /// 解析XML内容为文档树
    ///
    /// # 参数
    /// * `content` - 文档的原始字节内容
    ///
    /// # 返回值
    /// * `Result<XmlDocument, String>` - 失败时返回解析器的诊断信息
    pub fn parse(content: &[u8]) -> std::result::Result<XmlDocument, String> {
        let text =
            std::str::from_utf8(content).map_err(|e| format!("无效的UTF-8编码: {}", e))?;
        let mut reader = Reader::from_str(text);
        reader.config_mut().expand_empty_elements = true;

        let mut has_declaration = false;
        let mut doctype = None;
        let mut root: Option<XmlElement> = None;
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
                Event::Decl(_) => {
                    has_declaration = true;
                }
                Event::DocType(ref e) => {
                    doctype = Some(String::from_utf8_lossy(e).trim().to_string());
                }
                Event::Start(ref e) => {
                    let mut element =
                        XmlElement::new(String::from_utf8_lossy(e.name().as_ref()).to_string());
                    for attr_result in e.attributes() {
                        let attr = attr_result.map_err(|err| format!("无效的属性: {}", err))?;
                        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                        let value = attr
                            .unescape_value()
                            .map_err(|err| err.to_string())?
                            .to_string();
                        element.set_attribute(key, value);
                    }
                    stack.push(element);
                }
                Event::End(_) => {
                    let Some(finished) = stack.pop() else {
                        return Err("意外的结束标签".to_string());
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(finished)),
                        None => {
                            if root.is_some() {
                                return Err("文档包含多个根元素".to_string());
                            }
                            root = Some(finished);
                        }
                    }
                }
                Event::Text(ref e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e.unescape().map_err(|err| err.to_string())?.to_string();
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Event::CData(ref e) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(XmlNode::CData(String::from_utf8_lossy(e).to_string()));
                    }
                }
                Event::Comment(ref e) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(XmlNode::Comment(String::from_utf8_lossy(e).to_string()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        match root {
            Some(root) => Ok(XmlDocument {
                has_declaration,
                doctype,
                root,
            }),
            None => Err("没有找到根元素".to_string()),
        }
    }

    /// 文档的根元素
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// 查询路径匹配的所有元素(按文档顺序)
    ///
    /// 支持三种形式：
    /// * 绝对子路径，如 `/package/manifest/item`
    /// * 末步属性谓词，如 `/package/metadata/dc:identifier[@opf:scheme='ISBN']`
    /// * 通配后代查找，如 `//h3`
    pub fn select_all(&self, path: &str) -> Vec<&XmlElement> {
        let Some((descendant, steps)) = parse_path(path) else {
            return Vec::new();
        };
        let Some((first, rest)) = steps.split_first() else {
            return Vec::new();
        };

        let mut matched: Vec<&XmlElement> = Vec::new();
        if descendant {
            collect_descendants(&self.root, first, &mut matched);
        } else if step_matches(&self.root, first) {
            matched.push(&self.root);
        }

        for step in rest {
            let mut next = Vec::new();
            for element in matched {
                for child in element.child_elements() {
                    if step_matches(child, step) {
                        next.push(child);
                    }
                }
            }
            matched = next;
        }
        matched
    }

    /// 查询路径匹配的第一个元素
    pub fn select_first(&self, path: &str) -> Option<&XmlElement> {
        self.select_all(path).into_iter().next()
    }

    /// 删除指定父元素下不满足保留条件的子元素
    ///
    /// 只作用于元素子节点，文本和注释保持不变。
    ///
    /// # 返回值
    /// * `bool` - 父路径不存在时返回false
    pub fn retain_children<F>(&mut self, parent_path: &str, keep: F) -> bool
    where
        F: Fn(&XmlElement) -> bool,
    {
        let Some(parent) = self.select_first_mut(parent_path) else {
            return false;
        };
        parent.children.retain(|child| match child {
            XmlNode::Element(element) => keep(element),
            _ => true,
        });
        true
    }

    /// 向指定父元素追加一个子元素
    ///
    /// # 返回值
    /// * `bool` - 父路径不存在时返回false
    pub fn append_child(&mut self, parent_path: &str, element: XmlElement) -> bool {
        let Some(parent) = self.select_first_mut(parent_path) else {
            return false;
        };
        parent.children.push(XmlNode::Element(element));
        true
    }

    /// 序列化文档为字节串
    ///
    /// 不引入额外的缩进和换行，保持节点原有的空白。
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        if self.has_declaration {
            out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>");
        }
        if let Some(doctype) = &self.doctype {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push('>');
        }
        write_element(&self.root, &mut out);
        out.into_bytes()
    }

    /// 沿绝对子路径查找第一个匹配元素的可变引用(修改操作的入口)
    fn select_first_mut(&mut self, path: &str) -> Option<&mut XmlElement> {
        let (descendant, steps) = parse_path(path)?;
        if descendant {
            return None;
        }
        let (first, rest) = steps.split_first()?;
        if !step_matches(&self.root, first) {
            return None;
        }

        let mut current = &mut self.root;
        for step in rest {
            let idx = current.children.iter().position(|child| {
                matches!(child, XmlNode::Element(element) if step_matches(element, step))
            })?;
            let XmlNode::Element(next) = &mut current.children[idx] else {
                return None;
            };
            current = next;
        }
        Some(current)
    }
}

/// 路径查询中的一步
struct PathStep {
    name: String,
    attr: Option<(String, String)>,
}

/// 解析路径表达式，返回(是否为后代查找, 步骤列表)
fn parse_path(path: &str) -> Option<(bool, Vec<PathStep>)> {
    let (descendant, rest) = if let Some(rest) = path.strip_prefix("//") {
        (true, rest)
    } else if let Some(rest) = path.strip_prefix('/') {
        (false, rest)
    } else {
        return None;
    };

    let mut steps = Vec::new();
    for part in rest.split('/') {
        if part.is_empty() {
            return None;
        }
        steps.push(parse_step(part)?);
    }
    Some((descendant, steps))
}

/// 解析单步表达式，形如 `name` 或 `name[@attr='value']`
fn parse_step(part: &str) -> Option<PathStep> {
    let Some(open) = part.find('[') else {
        return Some(PathStep {
            name: part.to_string(),
            attr: None,
        });
    };
    let name = &part[..open];
    let predicate = part[open..].strip_prefix("[@")?.strip_suffix("']")?;
    let (attr_name, value) = predicate.split_once("='")?;
    Some(PathStep {
        name: name.to_string(),
        attr: Some((attr_name.to_string(), value.to_string())),
    })
}

fn step_matches(element: &XmlElement, step: &PathStep) -> bool {
    if local_name(element.name()) != local_name(&step.name) {
        return false;
    }
    match &step.attr {
        None => true,
        Some((name, value)) => element.attribute(name) == Some(value.as_str()),
    }
}

fn collect_descendants<'a>(element: &'a XmlElement, step: &PathStep, out: &mut Vec<&'a XmlElement>) {
    if step_matches(element, step) {
        out.push(element);
    }
    for child in element.child_elements() {
        collect_descendants(child, step, out);
    }
}

/// 去掉命名空间前缀的本地名称
fn local_name(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

fn write_element(element: &XmlElement, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    out.push('>');
    for child in &element.children {
        match child {
            XmlNode::Element(child_element) => write_element(child_element, out),
            XmlNode::Text(text) => out.push_str(&escape(text.as_str())),
            XmlNode::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
            XmlNode::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGE_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
<metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
<dc:title>Sample Book</dc:title>
<dc:identifier opf:scheme="ISBN">978-1234567890</dc:identifier>
<dc:identifier opf:scheme="uuid">some-uuid</dc:identifier>
</metadata>
<manifest>
<item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
<item id="css" href="style.css" media-type="text/css"/>
</manifest>
<spine>
<itemref idref="ch1"/>
</spine>
</package>"#;

    #[test]
    fn test_select_absolute_path() {
        let doc = XmlDocument::parse(PACKAGE_XML.as_bytes()).unwrap();
        let items = doc.select_all("/package/manifest/item");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].attribute("id"), Some("ch1"));
        assert_eq!(items[1].attribute("href"), Some("style.css"));
    }

    #[test]
    fn test_select_with_attribute_predicate() {
        let doc = XmlDocument::parse(PACKAGE_XML.as_bytes()).unwrap();
        let isbn = doc
            .select_first("/package/metadata/dc:identifier[@opf:scheme='ISBN']")
            .unwrap();
        assert_eq!(isbn.text(), "978-1234567890");

        let uuid = doc
            .select_first("/package/metadata/dc:identifier[@opf:scheme='uuid']")
            .unwrap();
        assert_eq!(uuid.text(), "some-uuid");

        assert!(
            doc.select_first("/package/metadata/dc:identifier[@opf:scheme='DOI']")
                .is_none()
        );
    }

    #[test]
    fn test_select_descendants() {
        let xhtml = r#"<html><body><div><h2>Intro</h2></div><h2>Second</h2></body></html>"#;
        let doc = XmlDocument::parse(xhtml.as_bytes()).unwrap();
        let headers = doc.select_all("//h2");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].text(), "Intro");

        assert!(doc.select_all("//h1").is_empty());
    }

    #[test]
    fn test_namespace_prefix_is_ignored_in_matching() {
        let doc = XmlDocument::parse(PACKAGE_XML.as_bytes()).unwrap();
        // 查询使用dc:前缀，文档中也带前缀
        assert!(doc.select_first("/package/metadata/dc:title").is_some());
        // 不带前缀的查询同样可以命中
        assert!(doc.select_first("/package/metadata/title").is_some());
    }

    #[test]
    fn test_first_text_skips_whitespace() {
        let xhtml = r#"<html><body><h1>  </h1><h1><span> </span><em>Real Title</em></h1></body></html>"#;
        let doc = XmlDocument::parse(xhtml.as_bytes()).unwrap();
        let headers = doc.select_all("//h1");
        assert_eq!(headers[0].first_text(), None);
        assert_eq!(headers[1].first_text(), Some("Real Title".to_string()));
    }

    #[test]
    fn test_retain_and_append_children() {
        let mut doc = XmlDocument::parse(PACKAGE_XML.as_bytes()).unwrap();

        let removed = doc.retain_children("/package/manifest", |element| {
            element.attribute("id") != Some("ch1")
        });
        assert!(removed);
        let items = doc.select_all("/package/manifest/item");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].attribute("id"), Some("css"));

        let mut item = XmlElement::new("item");
        item.set_attribute("id", "10000");
        item.set_attribute("href", "new.xhtml");
        assert!(doc.append_child("/package/manifest", item));
        let items = doc.select_all("/package/manifest/item");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].attribute("id"), Some("10000"));

        // 不存在的父路径
        assert!(!doc.append_child("/package/nothing", XmlElement::new("x")));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let doc = XmlDocument::parse(PACKAGE_XML.as_bytes()).unwrap();
        let bytes = doc.to_bytes();
        let reparsed = XmlDocument::parse(&bytes).unwrap();
        assert_eq!(reparsed.select_all("/package/manifest/item").len(), 2);
        assert_eq!(
            reparsed.select_first("/package/metadata/dc:title").unwrap().text(),
            "Sample Book"
        );
    }

    #[test]
    fn test_escaped_text_roundtrip() {
        let xml = r#"<note><body>Fish &amp; Chips &lt;tasty&gt;</body></note>"#;
        let doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        assert_eq!(
            doc.select_first("/note/body").unwrap().text(),
            "Fish & Chips <tasty>"
        );

        let reparsed = XmlDocument::parse(&doc.to_bytes()).unwrap();
        assert_eq!(
            reparsed.select_first("/note/body").unwrap().text(),
            "Fish & Chips <tasty>"
        );
    }

    #[test]
    fn test_parse_error_reports_diagnostic() {
        let result = XmlDocument::parse(b"<package><unclosed></package>");
        assert!(result.is_err());
    }

    #[test]
    fn test_doctype_preserved() {
        let xml = "<!DOCTYPE html><html><body></body></html>";
        let doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        let out = String::from_utf8(doc.to_bytes()).unwrap();
        assert!(out.starts_with("<!DOCTYPE html>"));
    }
}

//! Zip归档适配模块
//!
//! 在字节缓冲区和(路径, 内容)条目列表之间转换。归档句柄只在函数内
//! 作用域内存在，成功或失败都会在返回前释放。

use std::io::{Cursor, Read, Seek, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::epub::error::Result;

/// 解包归档内容为(路径, 字节)条目列表
///
/// 目录条目被跳过，文件按归档内顺序返回。
///
/// # 参数
/// * `bytes` - 整个归档的字节内容
pub fn unpack(bytes: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)?;
        entries.push((file.name().to_string(), content));
    }

    Ok(entries)
}

/// 打包条目列表为归档并写入目标
///
/// mimetype条目按EPUB约定最先写入且不压缩，其余条目按给定顺序写入。
///
/// # 参数
/// * `writer` - 输出目标
/// * `entries` - (路径, 字节)条目列表
pub fn pack<W: Write + Seek>(writer: W, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
    let mut zip = ZipWriter::new(writer);
    let stored = FileOptions::<()>::default().compression_method(CompressionMethod::Stored);
    let deflated = FileOptions::<()>::default();

    if let Some((name, content)) = entries.iter().find(|(name, _)| name == "mimetype") {
        zip.start_file(name.as_str(), stored)?;
        zip.write_all(content)?;
    }

    for (name, content) in &entries {
        if name == "mimetype" {
            continue;
        }
        zip.start_file(name.as_str(), deflated)?;
        zip.write_all(content)?;
    }

    zip.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_roundtrip() {
        let entries = vec![
            ("mimetype".to_string(), b"application/epub+zip".to_vec()),
            (
                "META-INF/container.xml".to_string(),
                b"<container/>".to_vec(),
            ),
            ("OEBPS/ch1.xhtml".to_string(), b"<html/>".to_vec()),
        ];

        let mut buffer = Cursor::new(Vec::new());
        pack(&mut buffer, entries.clone()).unwrap();

        let unpacked = unpack(buffer.get_ref()).unwrap();
        assert_eq!(unpacked.len(), 3);
        // mimetype最先写入
        assert_eq!(unpacked[0].0, "mimetype");
        assert_eq!(unpacked[0].1, b"application/epub+zip");

        for (name, content) in &entries {
            let found = unpacked.iter().find(|(n, _)| n == name).unwrap();
            assert_eq!(&found.1, content);
        }
    }

    #[test]
    fn test_unpack_rejects_garbage() {
        let result = unpack(b"this is definitely not a zip file");
        assert!(result.is_err());
    }
}

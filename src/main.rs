use bookbind::{Book, Result};
use clap::Parser;

/// 📚 BookBind - EPUB合并工具
#[derive(Parser)]
#[command(name = "bookbind")]
#[command(about = "一个用于合并EPUB文件的Rust工具")]
#[command(version)]
struct Args {
    /// EPUB文件路径列表
    #[arg(required = true, help = "要处理的EPUB文件路径，多个文件将按顺序合并")]
    epub_files: Vec<String>,

    /// 详细输出模式
    #[arg(short, long, help = "显示详细信息")]
    verbose: bool,

    /// 显示元数据信息
    #[arg(short, long, help = "显示EPUB元数据信息")]
    metadata: bool,

    /// 显示章节列表
    #[arg(short, long, help = "显示章节标题列表")]
    chapters: bool,

    /// 输出文件路径
    #[arg(short, long, help = "合并结果的输出路径")]
    output: Option<String>,
}

fn main() {
    let args = Args::parse();

    println!("📚 BookBind - EPUB合并工具");

    if args.verbose {
        println!("🔍 详细模式已启用");
    }

    match run(&args) {
        Ok(_) => println!("🎉 处理完成！"),
        Err(e) => eprintln!("❌ 错误: {}", e),
    }
}

fn run(args: &Args) -> Result<()> {
    let mut books = Vec::with_capacity(args.epub_files.len());
    for path in &args.epub_files {
        println!("正在加载EPUB文件: {}", path);
        let book = Book::from_path(path)?;

        if args.verbose {
            println!("  共 {} 个资源, {} 个章节", book.resources().len(), book.chapters().len());
            println!("  包文档路径: {}", book.root_path());
        }

        if args.metadata {
            display_metadata(&book);
        }

        if args.chapters {
            display_chapters(&book);
        }

        books.push(book);
    }

    // 按命令行顺序左折叠合并
    let mut iter = books.into_iter();
    let Some(first) = iter.next() else {
        return Ok(());
    };
    let mut combined = iter.fold(first, |acc, book| &acc + &book);

    if args.epub_files.len() > 1 {
        println!("\n🔗 合并结果: {} 个章节, {} 个资源",
            combined.chapters().len(),
            combined.resources().len()
        );
    }

    if let Some(output) = &args.output {
        combined.save(output)?;
        println!("💾 已保存到: {}", output);
    }

    Ok(())
}

/// 显示书籍元数据
fn display_metadata(book: &Book) {
    println!("  📊 元数据:");
    let mut fields: Vec<_> = book.metadata().iter().collect();
    fields.sort();
    for (name, value) in fields {
        if !value.is_empty() {
            println!("    {}: {}", name, value);
        }
    }
}

/// 显示章节列表
fn display_chapters(book: &Book) {
    println!("  📖 章节列表:");
    for (i, chapter) in book.chapters().iter().enumerate() {
        println!("    {}. {} ({})", i + 1, chapter.title(), chapter.resource_path());
    }
}

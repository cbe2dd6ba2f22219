//! LineCopy 宿主程序
//! 命令行交互：加载 `.lcd` 文档，执行复制为线命令，保存回文档

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use linecopy_command::{matches_command, CommandResult, CopyAsLines, ElementPicker};
use linecopy_core::prelude::*;
use linecopy_file::{native, Document};

/// 从标准输入读取元素ID的拾取器，空行取消
struct StdinPicker<'a, R: BufRead> {
    input: &'a mut R,
}

impl<R: BufRead> ElementPicker for StdinPicker<'_, R> {
    fn pick_element(&mut self, prompt: &str) -> Option<ElementId> {
        print!("{} ", prompt);
        io::stdout().flush().ok()?;

        let mut line = String::new();
        self.input.read_line(&mut line).ok()?;
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match line.parse::<u64>() {
            Ok(id) => Some(ElementId(id)),
            Err(_) => {
                println!("无效的元素ID: {}", line);
                None
            }
        }
    }
}

/// 示例文档：一层平面、天花板平面和三维视图
fn create_demo_document() -> Document {
    let mut doc = Document::new();
    doc.metadata.title = "Demo".to_string();

    doc.add_view(View::new("Level 1", ViewKind::FloorPlan));
    doc.add_view(View::new("Level 1 RCP", ViewKind::CeilingPlan));
    doc.add_view(View::new("{3D}", ViewKind::ThreeD));

    let corners = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(8.0, 0.0, 0.0),
        Point3::new(8.0, 6.0, 0.0),
        Point3::new(0.0, 6.0, 0.0),
    ];
    for (i, start) in corners.iter().enumerate() {
        let end = corners[(i + 1) % corners.len()];
        doc.add_element(
            Element::new(Category::Wall)
                .with_name(format!("Wall {}", i + 1))
                .with_location(Location::Curve(Curve::line(*start, end))),
        );
    }

    doc.add_element(
        Element::new(Category::Door)
            .with_name("Door")
            .with_location(Location::Point(Point3::new(4.0, 0.0, 0.0)))
            .with_geometry(GeometryObject::Solid(Solid::cuboid(
                Point3::new(3.5, -0.1, 0.0),
                Point3::new(4.5, 0.1, 2.1),
            ))),
    );

    doc.add_element(
        Element::new(Category::Ceiling)
            .with_name("Ceiling")
            .with_geometry(GeometryObject::Solid(Solid::cuboid(
                Point3::new(0.0, 0.0, 2.8),
                Point3::new(8.0, 6.0, 2.9),
            ))),
    );

    doc.add_element(
        Element::new(Category::Furniture)
            .with_name("Desk")
            .with_instance("Desk 1200x600", Point3::new(2.0, 3.0, 0.0))
            .with_geometry(GeometryObject::Solid(Solid::cuboid(
                Point3::new(1.4, 2.7, 0.0),
                Point3::new(2.6, 3.3, 0.75),
            ))),
    );

    doc
}

fn print_views(doc: &Document) {
    let active = doc.active_view().map(|v| v.id);
    for view in doc.views() {
        let marker = if Some(view.id) == active { "*" } else { " " };
        println!("{} {} {} ({})", marker, view.id, view.name, view.kind.name());
    }
}

fn print_elements(doc: &Document) {
    for element in doc.elements() {
        let p = element.position();
        println!(
            "  {} {} {} ({:.3}, {:.3}, {:.3}){}",
            element.id,
            element.category.name(),
            element.name,
            p.x,
            p.y,
            p.z,
            if element.pinned { " [pinned]" } else { "" }
        );
    }
}

fn main() -> Result<()> {
    // 初始化日志
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let path = std::env::args().nth(1).map(PathBuf::from);
    let mut doc = match &path {
        Some(p) if p.exists() => {
            native::load(p).with_context(|| format!("无法打开 {}", p.display()))?
        }
        _ => create_demo_document(),
    };

    info!("LineCopy started with {} elements", doc.element_count());
    println!("命令: COPYASLINES (CAL), VIEWS, VIEW <id>, LIST, SAVE, QUIT");

    let command = CopyAsLines::new();
    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        print!("命令: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            continue;
        };

        if matches_command(verb) {
            let mut picker = StdinPicker { input: &mut input };
            match command.execute(&mut doc, &mut picker) {
                CommandResult::Succeeded(id) => println!("已创建元素 {}", id),
                CommandResult::Cancelled => println!("已取消"),
                CommandResult::Failed(message) => println!("失败: {}", message),
            }
            continue;
        }

        match verb.to_ascii_uppercase().as_str() {
            "VIEWS" => print_views(&doc),
            "VIEW" => match words.next().and_then(|w| w.parse::<u64>().ok()) {
                Some(id) => {
                    if let Err(e) = doc.set_active_view(ViewId(id)) {
                        println!("{}", e);
                    }
                }
                None => println!("用法: VIEW <id>"),
            },
            "LIST" => print_elements(&doc),
            "SAVE" => match &path {
                Some(p) => {
                    native::save(&doc, p).with_context(|| format!("无法保存 {}", p.display()))?;
                    println!("已保存 {}", p.display());
                }
                None => println!("没有指定文件路径"),
            },
            "QUIT" | "EXIT" => break,
            other => println!("未知命令: {}", other),
        }
    }

    Ok(())
}

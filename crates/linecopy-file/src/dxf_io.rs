//! DXF 交换文件导入/导出
//!
//! 导出：把视图中可见的元素投影到视图平面，按类别分图层写出。
//! 导入：把文件中的线性实体读成一个新的导入元素。

use crate::document::Document;
use crate::error::FileError;
use dxf::entities::{EntityType, Face3D};
use dxf::enums::AcadVersion;
use linecopy_core::element::{Category, Element, ElementId, Location};
use linecopy_core::geometry::{Curve, GeometryObject, Solid};
use linecopy_core::math::{points_coincide, BoundingBox3, Point3, Vector3, EPSILON};
use linecopy_core::view::{ViewFrame, ViewId};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// 交换文件扩展名
pub const INTERCHANGE_EXTENSION: &str = "dxf";

/// 不能保留为圆弧时的细分段数
const ARC_SEGMENTS: u32 = 16;

/// 实体导出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolidExport {
    /// 精确边界（每条边一条 LINE）
    Precise,
    /// 面片（每个面一个或多个 3DFACE）
    Faceted,
}

/// 导出选项
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub version: AcadVersion,
    pub solids: SolidExport,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            version: AcadVersion::R2007,
            solids: SolidExport::Precise,
        }
    }
}

/// 导入放置方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPlacement {
    /// 文件原点对齐世界原点
    Origin,
    /// 导入几何中心对齐世界原点
    Center,
}

/// 导入单位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportUnits {
    /// 沿用文档单位，不换算
    Default,
    Meters,
    Millimeters,
    Feet,
}

impl ImportUnits {
    /// 换算到文档单位（米）的系数
    pub fn factor(&self) -> f64 {
        match self {
            ImportUnits::Default | ImportUnits::Meters => 1.0,
            ImportUnits::Millimeters => 0.001,
            ImportUnits::Feet => 0.3048,
        }
    }
}

/// 导入选项
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportOptions {
    pub placement: ImportPlacement,
    pub scale: f64,
    pub units: ImportUnits,
    /// 是否提示用户选择单位（没有提示通道，只接受 false）
    pub prompt_units: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            placement: ImportPlacement::Origin,
            scale: 1.0,
            units: ImportUnits::Default,
            prompt_units: false,
        }
    }
}

fn to_dxf(p: &Point3) -> dxf::Point {
    dxf::Point::new(p.x, p.y, p.z)
}

fn from_dxf(p: &dxf::Point) -> Point3 {
    Point3::new(p.x, p.y, p.z)
}

fn line_entity(start: &Point3, end: &Point3) -> EntityType {
    let mut line = dxf::entities::Line::default();
    line.p1 = to_dxf(start);
    line.p2 = to_dxf(end);
    EntityType::Line(line)
}

/// 把曲线投影到视图平面
///
/// 视图平面与圆弧所在平面平行时保留圆弧，否则细分为线段。
fn project_curve(frame: &ViewFrame, curve: &Curve) -> Vec<EntityType> {
    match curve {
        Curve::Line { start, end } => {
            vec![line_entity(&frame.project(start), &frame.project(end))]
        }
        Curve::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        } => {
            let normal = frame.right.cross(&frame.up);
            if (normal - Vector3::z()).norm() < EPSILON {
                let rotation = frame.right.y.atan2(frame.right.x);
                let mut arc = dxf::entities::Arc::default();
                arc.center = to_dxf(&frame.project(center));
                arc.radius = *radius;
                arc.start_angle = (start_angle - rotation).to_degrees();
                arc.end_angle = (end_angle - rotation).to_degrees();
                vec![EntityType::Arc(arc)]
            } else {
                (0..ARC_SEGMENTS)
                    .map(|i| {
                        let t0 = f64::from(i) / f64::from(ARC_SEGMENTS);
                        let t1 = f64::from(i + 1) / f64::from(ARC_SEGMENTS);
                        line_entity(
                            &frame.project(&curve.evaluate(t0)),
                            &frame.project(&curve.evaluate(t1)),
                        )
                    })
                    .collect()
            }
        }
    }
}

fn project_solid(frame: &ViewFrame, solid: &Solid, mode: SolidExport) -> Vec<EntityType> {
    match mode {
        SolidExport::Precise => {
            // 三维去重后再按投影去重：厚度方向的上下两条边投影后重合
            let mut projected: Vec<(Point3, Point3)> = Vec::new();
            for (a, b) in solid.unique_edges() {
                let (a, b) = (frame.project(&a), frame.project(&b));
                if points_coincide(&a, &b, EPSILON) {
                    continue;
                }
                let duplicate = projected.iter().any(|(p, q)| {
                    (points_coincide(p, &a, EPSILON) && points_coincide(q, &b, EPSILON))
                        || (points_coincide(p, &b, EPSILON) && points_coincide(q, &a, EPSILON))
                });
                if !duplicate {
                    projected.push((a, b));
                }
            }
            projected.iter().map(|(a, b)| line_entity(a, b)).collect()
        }
        SolidExport::Faceted => solid
            .faces
            .iter()
            .filter(|f| f.vertices.len() >= 3)
            .flat_map(|f| {
                let v: Vec<Point3> = f.vertices.iter().map(|p| frame.project(p)).collect();
                // 扇形三角化，四边形直接输出
                if v.len() == 4 {
                    vec![face_entity(&v[0], &v[1], &v[2], &v[3])]
                } else {
                    (1..v.len() - 1)
                        .map(|i| face_entity(&v[0], &v[i], &v[i + 1], &v[i + 1]))
                        .collect()
                }
            })
            .collect(),
    }
}

fn face_entity(a: &Point3, b: &Point3, c: &Point3, d: &Point3) -> EntityType {
    let mut face = Face3D::default();
    face.first_corner = to_dxf(a);
    face.second_corner = to_dxf(b);
    face.third_corner = to_dxf(c);
    face.fourth_corner = to_dxf(d);
    EntityType::Face3D(face)
}

/// 元素投影后的 DXF 实体
fn element_entities(frame: &ViewFrame, element: &Element, options: &ExportOptions) -> Vec<EntityType> {
    let mut specifics = Vec::new();

    if let Some(Location::Curve(curve)) = &element.location {
        // 有实体几何时定位线只是参考，不导出
        if !element.geometry.iter().any(|g| matches!(g, GeometryObject::Solid(_))) {
            specifics.extend(project_curve(frame, curve));
        }
    }

    for object in &element.geometry {
        match object {
            GeometryObject::Curve(curve) => specifics.extend(project_curve(frame, curve)),
            GeometryObject::Solid(solid) => specifics.extend(project_solid(frame, solid, options.solids)),
        }
    }

    specifics
}

/// 导出视图到 `directory/base_name.dxf`，返回写出的文件路径
///
/// 只导出视图中可见（含隔离过滤）的元素。
pub fn export_view(
    document: &Document,
    view: ViewId,
    directory: &Path,
    base_name: &str,
    options: &ExportOptions,
) -> Result<PathBuf, FileError> {
    let frame = document.view(view).ok_or(FileError::ViewNotFound(view))?.frame;
    let visible = document.visible_elements(view)?;

    let mut drawing = dxf::Drawing::new();
    drawing.header.version = options.version;

    // 每个类别一个图层
    let layers: BTreeSet<&'static str> = visible.iter().map(|e| e.category.name()).collect();
    for name in &layers {
        let mut layer = dxf::tables::Layer::default();
        layer.name = name.to_string();
        drawing.add_layer(layer);
    }

    let mut count = 0usize;
    for element in &visible {
        for specific in element_entities(&frame, element, options) {
            let mut entity = dxf::entities::Entity::new(specific);
            entity.common.layer = element.category.name().to_string();
            drawing.add_entity(entity);
            count += 1;
        }
    }

    let path = directory.join(format!("{}.{}", base_name, INTERCHANGE_EXTENSION));
    drawing
        .save_file(&path)
        .map_err(|e| FileError::Dxf(e.to_string()))?;

    tracing::info!(
        "Exported view {} ({} elements, {} entities) to {}",
        view,
        visible.len(),
        count,
        path.display()
    );

    Ok(path)
}

/// 多段线顶点对转换为曲线，bulge 为 0 时为直线
fn bulge_segment(p1: Point3, p2: Point3, bulge: f64) -> Curve {
    let chord = p2 - p1;
    let chord_len = chord.norm();
    if bulge.abs() < EPSILON || chord_len < EPSILON {
        return Curve::line(p1, p2);
    }

    let s = chord_len / 2.0;
    let h = s * bulge; // 弧高
    let radius = (s * s + h * h) / (2.0 * h.abs());
    let d = radius - h.abs(); // 圆心到弦的距离

    let perp = if bulge > 0.0 {
        Vector3::new(-chord.y, chord.x, 0.0).normalize()
    } else {
        Vector3::new(chord.y, -chord.x, 0.0).normalize()
    };
    let center = Point3::from((p1.coords + p2.coords) / 2.0) + perp * d;

    let a1 = (p1.y - center.y).atan2(p1.x - center.x);
    let a2 = (p2.y - center.y).atan2(p2.x - center.x);

    // 负 bulge 为顺时针，交换端点保持逆时针表示
    if bulge > 0.0 {
        Curve::arc(center, radius, a1, a2)
    } else {
        Curve::arc(center, radius, a2, a1)
    }
}

fn polyline_curves(vertices: &[(Point3, f64)], closed: bool) -> Vec<Curve> {
    if vertices.len() < 2 {
        return Vec::new();
    }
    let segments = if closed { vertices.len() } else { vertices.len() - 1 };
    (0..segments)
        .map(|i| {
            let (p1, bulge) = vertices[i];
            let (p2, _) = vertices[(i + 1) % vertices.len()];
            bulge_segment(p1, p2, bulge)
        })
        .collect()
}

/// 将 DXF 实体转换为曲线
fn convert_dxf_entity(entity: &dxf::entities::Entity) -> Vec<Curve> {
    match &entity.specific {
        EntityType::Line(line) => vec![Curve::line(from_dxf(&line.p1), from_dxf(&line.p2))],

        EntityType::Arc(arc) => vec![Curve::arc(
            from_dxf(&arc.center),
            arc.radius,
            arc.start_angle.to_radians(),
            arc.end_angle.to_radians(),
        )],

        EntityType::Circle(circle) => vec![Curve::arc(
            from_dxf(&circle.center),
            circle.radius,
            0.0,
            std::f64::consts::TAU,
        )],

        EntityType::LwPolyline(lwpoly) => {
            let vertices: Vec<(Point3, f64)> = lwpoly
                .vertices
                .iter()
                .map(|v| (Point3::new(v.x, v.y, 0.0), v.bulge))
                .collect();
            polyline_curves(&vertices, lwpoly.is_closed())
        }

        EntityType::Polyline(poly) => {
            let vertices: Vec<(Point3, f64)> = poly
                .vertices()
                .map(|v| (from_dxf(&v.location), v.bulge))
                .collect();
            polyline_curves(&vertices, poly.is_closed())
        }

        EntityType::Face3D(face) => {
            let mut corners = vec![
                from_dxf(&face.first_corner),
                from_dxf(&face.second_corner),
                from_dxf(&face.third_corner),
            ];
            let fourth = from_dxf(&face.fourth_corner);
            if (fourth - corners[2]).norm() > EPSILON {
                corners.push(fourth);
            }
            let n = corners.len();
            (0..n)
                .map(|i| Curve::line(corners[i], corners[(i + 1) % n]))
                .filter(|c| c.length() > EPSILON)
                .collect()
        }

        // 其余实体没有线性表示
        _ => Vec::new(),
    }
}

/// 导入交换文件为一个新元素
///
/// 文件中没有可导入的线性实体时返回 `Ok(None)`。
/// 新元素属于目标视图，锁定状态取自文档设置。
pub fn import_into(
    document: &mut Document,
    path: &Path,
    options: &ImportOptions,
    view: ViewId,
) -> Result<Option<ElementId>, FileError> {
    if document.view(view).is_none() {
        return Err(FileError::ViewNotFound(view));
    }
    if options.prompt_units {
        return Err(FileError::UnsupportedOption(
            "unit prompt is not available during import".to_string(),
        ));
    }

    let drawing = dxf::Drawing::load_file(path).map_err(|e| FileError::Dxf(e.to_string()))?;

    let factor = options.scale * options.units.factor();
    let curves: Vec<Curve> = drawing
        .entities()
        .flat_map(convert_dxf_entity)
        .map(|c| scale_curve(&c, factor))
        .collect();

    if curves.is_empty() {
        tracing::warn!("No importable entities in {}", path.display());
        return Ok(None);
    }

    let offset = match options.placement {
        ImportPlacement::Origin => Vector3::zeros(),
        ImportPlacement::Center => {
            let bbox = curves
                .iter()
                .map(Curve::bounding_box)
                .reduce(|a, b| a.union(&b))
                .unwrap_or_else(|| BoundingBox3::new(Point3::origin(), Point3::origin()));
            -bbox.center().coords
        }
    };

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Import".to_string());

    let mut element = Element::new(Category::ImportedGeometry)
        .with_name(name)
        .with_owner_view(view)
        .pinned(document.settings.pin_imports);
    let curve_count = curves.len();
    element.geometry = curves
        .into_iter()
        .map(|c| GeometryObject::Curve(c.translated(&offset)))
        .collect();
    element.origin = Point3::origin() + offset;

    let id = document.add_element(element);
    tracing::info!(
        "Imported {} curves from {} as element {}",
        curve_count,
        path.display(),
        id
    );

    Ok(Some(id))
}

fn scale_curve(curve: &Curve, factor: f64) -> Curve {
    if (factor - 1.0).abs() < EPSILON {
        return curve.clone();
    }
    match curve {
        Curve::Line { start, end } => Curve::line(
            Point3::from(start.coords * factor),
            Point3::from(end.coords * factor),
        ),
        Curve::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        } => Curve::arc(
            Point3::from(center.coords * factor),
            radius * factor,
            *start_angle,
            *end_angle,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linecopy_core::view::{View, ViewKind};

    fn plan_with(elements: Vec<Element>) -> (Document, ViewId, Vec<ElementId>) {
        let mut doc = Document::new();
        let view = doc.add_view(View::new("Level 1", ViewKind::FloorPlan));
        let ids = elements.into_iter().map(|e| doc.add_element(e)).collect();
        (doc, view, ids)
    }

    fn imported_curves(doc: &Document, id: ElementId) -> Vec<Curve> {
        doc.element(id)
            .unwrap()
            .geometry
            .iter()
            .filter_map(|g| match g {
                GeometryObject::Curve(c) => Some(c.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_export_import_wall() {
        let dir = tempfile::tempdir().unwrap();
        let wall = Element::new(Category::Wall).with_location(Location::Curve(Curve::line(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
        )));
        let (mut doc, view, _) = plan_with(vec![wall]);

        let path = export_view(&doc, view, dir.path(), "wall", &ExportOptions::default()).unwrap();
        assert_eq!(path, dir.path().join("wall.dxf"));
        assert!(path.exists());

        let id = import_into(&mut doc, &path, &ImportOptions::default(), view)
            .unwrap()
            .unwrap();
        let element = doc.element(id).unwrap();
        assert_eq!(element.category, Category::ImportedGeometry);
        assert_eq!(element.owner_view, Some(view));
        assert!(element.pinned);
        assert_eq!(element.origin, Point3::origin());

        let curves = imported_curves(&doc, id);
        assert_eq!(curves.len(), 1);
        assert!((curves[0].start_point() - Point3::new(0.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((curves[0].end_point() - Point3::new(5.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_export_respects_isolation() {
        let dir = tempfile::tempdir().unwrap();
        let a = Element::new(Category::Wall).with_location(Location::Curve(Curve::line(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
        )));
        let b = Element::new(Category::Wall).with_location(Location::Curve(Curve::line(
            Point3::new(0.0, 5.0, 0.0),
            Point3::new(1.0, 5.0, 0.0),
        )));
        let (mut doc, view, ids) = plan_with(vec![a, b]);
        doc.isolate_temporary(view, &[ids[1]]).unwrap();

        let path = export_view(&doc, view, dir.path(), "iso", &ExportOptions::default()).unwrap();
        let id = import_into(&mut doc, &path, &ImportOptions::default(), view)
            .unwrap()
            .unwrap();

        let curves = imported_curves(&doc, id);
        assert_eq!(curves.len(), 1);
        assert!((curves[0].start_point().y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_solid_precise_vs_faceted() {
        let dir = tempfile::tempdir().unwrap();
        let ceiling = Element::new(Category::Ceiling).with_geometry(GeometryObject::Solid(
            Solid::cuboid(Point3::new(0.0, 0.0, 2.9), Point3::new(4.0, 4.0, 3.0)),
        ));
        let (mut doc, view, _) = plan_with(vec![ceiling]);

        let precise = export_view(&doc, view, dir.path(), "precise", &ExportOptions::default()).unwrap();
        let id = import_into(&mut doc, &precise, &ImportOptions::default(), view)
            .unwrap()
            .unwrap();
        // 竖向边投影后退化，上下两圈投影后重合，只剩 4 条
        assert_eq!(imported_curves(&doc, id).len(), 4);

        let faceted_options = ExportOptions {
            solids: SolidExport::Faceted,
            ..ExportOptions::default()
        };
        let faceted = export_view(&doc, view, dir.path(), "faceted", &faceted_options).unwrap();
        let drawing = dxf::Drawing::load_file(&faceted).unwrap();
        let faces = drawing
            .entities()
            .filter(|e| matches!(e.specific, EntityType::Face3D(_)))
            .count();
        assert_eq!(faces, 6);
    }

    #[test]
    fn test_arc_survives_plan_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let arc = Element::new(Category::Wall).with_location(Location::Curve(Curve::arc(
            Point3::new(1.0, 1.0, 0.0),
            2.0,
            0.0,
            std::f64::consts::FRAC_PI_2,
        )));
        let (mut doc, view, _) = plan_with(vec![arc]);

        let path = export_view(&doc, view, dir.path(), "arc", &ExportOptions::default()).unwrap();
        let id = import_into(&mut doc, &path, &ImportOptions::default(), view)
            .unwrap()
            .unwrap();
        let curves = imported_curves(&doc, id);
        assert_eq!(curves.len(), 1);
        assert!(matches!(curves[0], Curve::Arc { .. }));
        assert!((curves[0].start_point() - Point3::new(3.0, 1.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_empty_export_imports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut doc, view, _) = plan_with(vec![Element::new(Category::GenericModel)]);

        let path = export_view(&doc, view, dir.path(), "empty", &ExportOptions::default()).unwrap();
        let before = doc.element_count();
        let result = import_into(&mut doc, &path, &ImportOptions::default(), view).unwrap();
        assert!(result.is_none());
        assert_eq!(doc.element_count(), before);
    }

    #[test]
    fn test_import_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (mut doc, view, _) = plan_with(vec![]);
        let result = import_into(&mut doc, &dir.path().join("missing.dxf"), &ImportOptions::default(), view);
        assert!(matches!(result, Err(FileError::Dxf(_))));
    }

    #[test]
    fn test_bulge_segment() {
        let arc = bulge_segment(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0), 1.0);
        // bulge 1 为半圆
        assert!((arc.length() - std::f64::consts::PI).abs() < 1e-9);
        assert!((arc.start_point() - Point3::new(0.0, 0.0, 0.0)).norm() < 1e-9);

        let cw = bulge_segment(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0), -1.0);
        assert!((cw.length() - std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn test_prompt_units_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let wall = Element::new(Category::Wall).with_location(Location::Curve(Curve::line(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
        )));
        let (mut doc, view, _) = plan_with(vec![wall]);
        let path = export_view(&doc, view, dir.path(), "wall", &ExportOptions::default()).unwrap();

        let options = ImportOptions {
            prompt_units: true,
            ..ImportOptions::default()
        };
        let before = doc.element_count();
        let result = import_into(&mut doc, &path, &options, view);
        assert!(matches!(result, Err(FileError::UnsupportedOption(_))));
        assert_eq!(doc.element_count(), before);
    }

    #[test]
    fn test_import_center_placement() {
        let dir = tempfile::tempdir().unwrap();
        let wall = Element::new(Category::Wall).with_location(Location::Curve(Curve::line(
            Point3::origin(),
            Point3::new(4.0, 2.0, 0.0),
        )));
        let (mut doc, view, _) = plan_with(vec![wall]);
        let path = export_view(&doc, view, dir.path(), "wall", &ExportOptions::default()).unwrap();

        let options = ImportOptions {
            placement: ImportPlacement::Center,
            ..ImportOptions::default()
        };
        let id = import_into(&mut doc, &path, &options, view).unwrap().unwrap();

        let element = doc.element(id).unwrap();
        assert!((element.origin - Point3::new(-2.0, -1.0, 0.0)).norm() < 1e-9);
        let curves = imported_curves(&doc, id);
        assert!((curves[0].start_point() - Point3::new(-2.0, -1.0, 0.0)).norm() < 1e-9);
        assert!((curves[0].end_point() - Point3::new(2.0, 1.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_section_view_subdivides_arc() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new();
        // 朝 +Y 看的剖面：右方向 +X，上方向 +Z
        let section = doc.add_view(
            View::new("Section 1", ViewKind::Section)
                .with_frame(ViewFrame::facing(Point3::origin(), Vector3::x())),
        );
        doc.add_element(Element::new(Category::Wall).with_location(Location::Curve(Curve::arc(
            Point3::new(0.0, 0.0, 1.0),
            2.0,
            0.0,
            std::f64::consts::PI,
        ))));

        let path = export_view(&doc, section, dir.path(), "section", &ExportOptions::default()).unwrap();
        let id = import_into(&mut doc, &path, &ImportOptions::default(), section)
            .unwrap()
            .unwrap();

        let curves = imported_curves(&doc, id);
        assert_eq!(curves.len(), ARC_SEGMENTS as usize);
        assert!(curves.iter().all(|c| matches!(c, Curve::Line { .. })));
        // 水平圆弧在剖面中投影为高度 1.0 的直线
        assert!(curves
            .iter()
            .all(|c| (c.start_point().y - 1.0).abs() < 1e-9 && c.start_point().z.abs() < 1e-9));
        assert!((curves[0].start_point().x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_units_factor() {
        assert_eq!(ImportUnits::Default.factor(), 1.0);
        assert!((ImportUnits::Millimeters.factor() - 0.001).abs() < EPSILON);
    }
}

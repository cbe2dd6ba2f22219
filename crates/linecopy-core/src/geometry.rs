//! 几何表示
//!
//! 元素的几何由以下对象组成：
//! - 曲线 (Curve)：直线段或水平面内的圆弧
//! - 实体 (Solid)：由平面面片围成
//!
//! 曲线参数统一归一化到 [0, 1]，0 为起点，1 为终点。

use crate::math::{points_coincide, BoundingBox3, Point3, Vector3, EPSILON};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// 曲线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Curve {
    Line {
        start: Point3,
        end: Point3,
    },
    /// 法向为 +Z 的圆弧，角度为弧度，逆时针从 start_angle 扫到 end_angle
    Arc {
        center: Point3,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
}

impl Curve {
    pub fn line(start: Point3, end: Point3) -> Self {
        Curve::Line { start, end }
    }

    pub fn arc(center: Point3, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Curve::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        }
    }

    /// 圆弧扫过的角度，范围 (0, 2π]
    fn sweep(start_angle: f64, end_angle: f64) -> f64 {
        let sweep = (end_angle - start_angle).rem_euclid(TAU);
        if sweep < EPSILON {
            TAU
        } else {
            sweep
        }
    }

    /// 按归一化参数求曲线上的点
    pub fn evaluate(&self, t: f64) -> Point3 {
        match self {
            Curve::Line { start, end } => start + (end - start) * t,
            Curve::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let angle = start_angle + Self::sweep(*start_angle, *end_angle) * t;
                Point3::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                    center.z,
                )
            }
        }
    }

    pub fn start_point(&self) -> Point3 {
        self.evaluate(0.0)
    }

    pub fn end_point(&self) -> Point3 {
        self.evaluate(1.0)
    }

    pub fn length(&self) -> f64 {
        match self {
            Curve::Line { start, end } => (end - start).norm(),
            Curve::Arc {
                radius,
                start_angle,
                end_angle,
                ..
            } => radius * Self::sweep(*start_angle, *end_angle),
        }
    }

    /// 平移
    pub fn translated(&self, offset: &Vector3) -> Self {
        match self {
            Curve::Line { start, end } => Curve::Line {
                start: start + offset,
                end: end + offset,
            },
            Curve::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => Curve::Arc {
                center: center + offset,
                radius: *radius,
                start_angle: *start_angle,
                end_angle: *end_angle,
            },
        }
    }

    pub fn bounding_box(&self) -> BoundingBox3 {
        match self {
            Curve::Line { start, end } => BoundingBox3::new(*start, *start).union(&BoundingBox3::new(*end, *end)),
            Curve::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let mut bbox = BoundingBox3::new(self.start_point(), self.start_point());
                bbox.expand_to(&self.end_point());
                // 补上扫过的象限点
                let sweep = Self::sweep(*start_angle, *end_angle);
                for quadrant in 0..4u8 {
                    let angle = f64::from(quadrant) * TAU / 4.0;
                    if (angle - start_angle).rem_euclid(TAU) <= sweep {
                        bbox.expand_to(&Point3::new(
                            center.x + radius * angle.cos(),
                            center.y + radius * angle.sin(),
                            center.z,
                        ));
                    }
                }
                bbox
            }
        }
    }
}

/// 面引用（仅在计算引用时填充）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceReference(pub u32);

/// 平面面片，顶点按顺序首尾相连
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub vertices: Vec<Point3>,
    #[serde(default)]
    pub reference: Option<FaceReference>,
}

impl Face {
    pub fn new(vertices: Vec<Point3>) -> Self {
        Self {
            vertices,
            reference: None,
        }
    }

    /// 面片的边（闭合环）
    pub fn edges(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
        let n = self.vertices.len();
        let count = if n < 2 { 0 } else { n };
        (0..count).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

/// 实体
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Solid {
    pub faces: Vec<Face>,
}

impl Solid {
    pub fn new(faces: Vec<Face>) -> Self {
        Self { faces }
    }

    /// 轴对齐长方体
    pub fn cuboid(min: Point3, max: Point3) -> Self {
        let p = |x: f64, y: f64, z: f64| Point3::new(x, y, z);
        let (a, b) = (min, max);
        Self::new(vec![
            Face::new(vec![p(a.x, a.y, a.z), p(b.x, a.y, a.z), p(b.x, b.y, a.z), p(a.x, b.y, a.z)]),
            Face::new(vec![p(a.x, a.y, b.z), p(b.x, a.y, b.z), p(b.x, b.y, b.z), p(a.x, b.y, b.z)]),
            Face::new(vec![p(a.x, a.y, a.z), p(b.x, a.y, a.z), p(b.x, a.y, b.z), p(a.x, a.y, b.z)]),
            Face::new(vec![p(a.x, b.y, a.z), p(b.x, b.y, a.z), p(b.x, b.y, b.z), p(a.x, b.y, b.z)]),
            Face::new(vec![p(a.x, a.y, a.z), p(a.x, b.y, a.z), p(a.x, b.y, b.z), p(a.x, a.y, b.z)]),
            Face::new(vec![p(b.x, a.y, a.z), p(b.x, b.y, a.z), p(b.x, b.y, b.z), p(b.x, a.y, b.z)]),
        ])
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox3> {
        BoundingBox3::from_points(self.faces.iter().flat_map(|f| f.vertices.iter().copied()))
    }

    /// 去重后的边，按首次出现的顺序
    pub fn unique_edges(&self) -> Vec<(Point3, Point3)> {
        let mut edges: Vec<(Point3, Point3)> = Vec::new();
        for (a, b) in self.faces.iter().flat_map(|f| f.edges()) {
            if points_coincide(&a, &b, EPSILON) {
                continue;
            }
            let duplicate = edges.iter().any(|(p, q)| {
                (points_coincide(p, &a, EPSILON) && points_coincide(q, &b, EPSILON))
                    || (points_coincide(p, &b, EPSILON) && points_coincide(q, &a, EPSILON))
            });
            if !duplicate {
                edges.push((a, b));
            }
        }
        edges
    }

    pub fn translated(&self, offset: &Vector3) -> Self {
        Self::new(
            self.faces
                .iter()
                .map(|f| Face {
                    vertices: f.vertices.iter().map(|v| v + offset).collect(),
                    reference: f.reference,
                })
                .collect(),
        )
    }
}

/// 几何对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryObject {
    Solid(Solid),
    Curve(Curve),
}

impl GeometryObject {
    pub fn bounding_box(&self) -> Option<BoundingBox3> {
        match self {
            GeometryObject::Solid(s) => s.bounding_box(),
            GeometryObject::Curve(c) => Some(c.bounding_box()),
        }
    }

    pub fn translated(&self, offset: &Vector3) -> Self {
        match self {
            GeometryObject::Solid(s) => GeometryObject::Solid(s.translated(offset)),
            GeometryObject::Curve(c) => GeometryObject::Curve(c.translated(offset)),
        }
    }
}

/// 几何读取选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeometryOptions {
    /// 是否计算面引用
    pub compute_references: bool,
}

impl GeometryOptions {
    pub fn with_references() -> Self {
        Self {
            compute_references: true,
        }
    }
}

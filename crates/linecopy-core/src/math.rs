//! 数学基础类型
//!
//! 基于 nalgebra，统一使用 f64 世界坐标。

use serde::{Deserialize, Serialize};

pub type Point3 = nalgebra::Point3<f64>;
pub type Vector3 = nalgebra::Vector3<f64>;

/// 坐标比较容差
pub const EPSILON: f64 = 1e-9;

/// 判断两点是否重合（容差内）
pub fn points_coincide(a: &Point3, b: &Point3, tolerance: f64) -> bool {
    (a - b).norm() <= tolerance
}

/// 三维轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3 {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingBox3 {
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// 从点集构造包围盒，点集为空时返回 None
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first, first);
        for p in iter {
            bbox.expand_to(&p);
        }
        Some(bbox)
    }

    /// 扩展包围盒以包含指定点
    pub fn expand_to(&mut self, p: &Point3) {
        self.min = Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    /// 合并两个包围盒
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = *self;
        merged.expand_to(&other.min);
        merged.expand_to(&other.max);
        merged
    }

    /// 中点 (min + max) / 2
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }
}

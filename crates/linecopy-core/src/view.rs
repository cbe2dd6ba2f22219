//! 视图
//!
//! 二维视图通过视图坐标系 (ViewFrame) 把世界坐标投影到视图平面；
//! 临时隔离 (TemporaryIsolation) 限制视图只显示指定元素。

use crate::element::ElementId;
use crate::math::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 视图ID，与元素ID共用同一个分配序列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 视图类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    FloorPlan,
    CeilingPlan,
    Elevation,
    Section,
    Drafting,
    ThreeD,
}

impl ViewKind {
    /// 是否为二维视图
    pub fn is_2d(&self) -> bool {
        !matches!(self, ViewKind::ThreeD)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::FloorPlan => "Floor Plan",
            ViewKind::CeilingPlan => "Ceiling Plan",
            ViewKind::Elevation => "Elevation",
            ViewKind::Section => "Section",
            ViewKind::Drafting => "Drafting",
            ViewKind::ThreeD => "3D",
        }
    }
}

/// 视图坐标系
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewFrame {
    pub origin: Point3,
    /// 视图平面 X 方向（单位向量）
    pub right: Vector3,
    /// 视图平面 Y 方向（单位向量）
    pub up: Vector3,
}

impl ViewFrame {
    /// 平面视图：视图平面即世界 XY 平面
    pub fn plan() -> Self {
        Self {
            origin: Point3::origin(),
            right: Vector3::x(),
            up: Vector3::y(),
        }
    }

    /// 立面/剖面：沿指定水平方向观察
    pub fn facing(origin: Point3, right: Vector3) -> Self {
        Self {
            origin,
            right: right.normalize(),
            up: Vector3::z(),
        }
    }

    /// 投影到视图平面，返回的 z 为 0
    pub fn project(&self, p: &Point3) -> Point3 {
        let d = p - self.origin;
        Point3::new(d.dot(&self.right), d.dot(&self.up), 0.0)
    }
}

impl Default for ViewFrame {
    fn default() -> Self {
        Self::plan()
    }
}

/// 临时隔离：只显示集合中的元素
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TemporaryIsolation {
    pub elements: BTreeSet<ElementId>,
}

/// 视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub id: ViewId,
    pub name: String,
    pub kind: ViewKind,
    pub frame: ViewFrame,
    pub isolation: Option<TemporaryIsolation>,
}

impl View {
    pub fn new(name: impl Into<String>, kind: ViewKind) -> Self {
        Self {
            id: ViewId(0),
            name: name.into(),
            kind,
            frame: ViewFrame::plan(),
            isolation: None,
        }
    }

    pub fn with_frame(mut self, frame: ViewFrame) -> Self {
        self.frame = frame;
        self
    }

    pub fn is_2d(&self) -> bool {
        self.kind.is_2d()
    }

    /// 临时隔离指定元素（替换已有隔离）
    pub fn isolate_temporary(&mut self, elements: impl IntoIterator<Item = ElementId>) {
        self.isolation = Some(TemporaryIsolation {
            elements: elements.into_iter().collect(),
        });
    }

    /// 隔离是否允许显示该元素
    pub fn isolation_allows(&self, id: ElementId) -> bool {
        self.isolation
            .as_ref()
            .map_or(true, |iso| iso.elements.contains(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_2d() {
        assert!(ViewKind::FloorPlan.is_2d());
        assert!(ViewKind::Section.is_2d());
        assert!(!ViewKind::ThreeD.is_2d());
    }

    #[test]
    fn test_plan_projection_drops_z() {
        let frame = ViewFrame::plan();
        assert_eq!(frame.project(&Point3::new(1.0, 2.0, 3.0)), Point3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_elevation_projection() {
        let frame = ViewFrame::facing(Point3::new(0.0, -10.0, 0.0), Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(frame.project(&Point3::new(4.0, 3.0, 2.5)), Point3::new(4.0, 2.5, 0.0));
    }

    #[test]
    fn test_isolation() {
        let mut view = View::new("Level 1", ViewKind::FloorPlan);
        assert!(view.isolation_allows(ElementId(5)));

        view.isolate_temporary([ElementId(3)]);
        assert!(view.isolation_allows(ElementId(3)));
        assert!(!view.isolation_allows(ElementId(5)));
    }
}

//! 锚点解析
//!
//! 从元素的不同表示中推导一个世界坐标锚点，按优先级依次尝试：
//! 1. 点定位 (PointLocation)
//! 2. 曲线定位的起点 (CurveStart)，参数 0 处，不取中点或终点
//! 3. 天花板类构件第一个有面的实体的包围盒中点 (CeilingBounds)
//! 4. 族实例放置点 (InstancePlacement)
//!
//! 第一个成功的策略胜出；全部失败返回 None，由调用方决定如何中止。
//!
//! # 实体顺序
//!
//! `CeilingBounds` 取的是元素几何枚举顺序（即存储顺序）中的第一个有面实体，
//! 后续实体即使也满足条件也被忽略。

use crate::element::Element;
use crate::geometry::{GeometryObject, GeometryOptions};
use crate::math::Point3;
use serde::{Deserialize, Serialize};

/// 锚点来源（即解析策略）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorSource {
    PointLocation,
    CurveStart,
    CeilingBounds,
    InstancePlacement,
}

impl AnchorSource {
    /// 默认优先级顺序
    pub const DEFAULT_CHAIN: [AnchorSource; 4] = [
        AnchorSource::PointLocation,
        AnchorSource::CurveStart,
        AnchorSource::CeilingBounds,
        AnchorSource::InstancePlacement,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AnchorSource::PointLocation => "point location",
            AnchorSource::CurveStart => "curve start",
            AnchorSource::CeilingBounds => "ceiling bounds",
            AnchorSource::InstancePlacement => "instance placement",
        }
    }

    /// 用当前策略尝试解析
    pub fn try_resolve(&self, element: &Element) -> Option<Point3> {
        match self {
            AnchorSource::PointLocation => element.location_point(),
            AnchorSource::CurveStart => element.location_curve().map(|c| c.evaluate(0.0)),
            AnchorSource::CeilingBounds => {
                if !element.category.is_ceiling_like() {
                    return None;
                }
                element
                    .geometry(&GeometryOptions::with_references())
                    .iter()
                    .find_map(|object| match object {
                        GeometryObject::Solid(solid) if solid.face_count() > 0 => solid.bounding_box(),
                        _ => None,
                    })
                    .map(|bbox| bbox.center())
            }
            AnchorSource::InstancePlacement => element.instance.as_ref().map(|i| i.placement),
        }
    }
}

/// 解析出的锚点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub point: Point3,
    pub source: AnchorSource,
}

/// 锚点解析器：有序策略链，首个成功者胜出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorResolver {
    chain: Vec<AnchorSource>,
}

impl AnchorResolver {
    /// 使用自定义策略链
    pub fn with_chain(chain: impl IntoIterator<Item = AnchorSource>) -> Self {
        Self {
            chain: chain.into_iter().collect(),
        }
    }

    pub fn chain(&self) -> &[AnchorSource] {
        &self.chain
    }

    /// 解析锚点，找不到时返回 None
    pub fn resolve(&self, element: &Element) -> Option<AnchorPoint> {
        let anchor = self.chain.iter().find_map(|source| {
            source
                .try_resolve(element)
                .map(|point| AnchorPoint { point, source: *source })
        });

        match &anchor {
            Some(a) => tracing::debug!(
                "Element {} anchored by {} at ({:.4}, {:.4}, {:.4})",
                element.id,
                a.source.name(),
                a.point.x,
                a.point.y,
                a.point.z
            ),
            None => tracing::debug!("Element {} has no resolvable anchor", element.id),
        }

        anchor
    }
}

impl Default for AnchorResolver {
    fn default() -> Self {
        Self::with_chain(AnchorSource::DEFAULT_CHAIN)
    }
}

/// 使用默认策略链解析
pub fn resolve(element: &Element) -> Option<AnchorPoint> {
    AnchorResolver::default().resolve(element)
}

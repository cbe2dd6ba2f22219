//! 元素模型
//!
//! 元素由宿主文档持有，本模块只描述其数据：
//! - 类别 (Category)
//! - 定位 (Location)：点或曲线
//! - 几何 (GeometryObject)：实体与曲线
//! - 族实例放置点 (FamilyInstance)

use crate::geometry::{Curve, GeometryObject, GeometryOptions};
use crate::math::{BoundingBox3, Point3, Vector3};
use crate::view::ViewId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 元素ID，由文档分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 元素类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Wall,
    Ceiling,
    Floor,
    Roof,
    Door,
    Window,
    Furniture,
    GenericModel,
    DetailLine,
    ImportedGeometry,
}

impl Category {
    /// 类别名称（同时用作导出图层名）
    pub fn name(&self) -> &'static str {
        match self {
            Category::Wall => "Walls",
            Category::Ceiling => "Ceilings",
            Category::Floor => "Floors",
            Category::Roof => "Roofs",
            Category::Door => "Doors",
            Category::Window => "Windows",
            Category::Furniture => "Furniture",
            Category::GenericModel => "Generic Models",
            Category::DetailLine => "Detail Lines",
            Category::ImportedGeometry => "Imports",
        }
    }

    /// 是否为天花板类的平面构件
    pub fn is_ceiling_like(&self) -> bool {
        matches!(self, Category::Ceiling)
    }
}

/// 元素定位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Location {
    Point(Point3),
    Curve(Curve),
}

impl Location {
    pub fn translated(&self, offset: &Vector3) -> Self {
        match self {
            Location::Point(p) => Location::Point(p + offset),
            Location::Curve(c) => Location::Curve(c.translated(offset)),
        }
    }
}

/// 族实例信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyInstance {
    pub family: String,
    /// 实例放置点
    pub placement: Point3,
}

/// 元素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub category: Category,
    pub name: String,
    pub location: Option<Location>,
    pub geometry: Vec<GeometryObject>,
    pub instance: Option<FamilyInstance>,
    /// 视图专有元素的所属视图（模型元素为 None）
    pub owner_view: Option<ViewId>,
    /// 锁定后不可移动
    pub pinned: bool,
    /// 元素在世界坐标中的原点，导入元素以此作为位置
    pub origin: Point3,
}

impl Element {
    /// 创建元素，ID 在加入文档时分配
    pub fn new(category: Category) -> Self {
        Self {
            id: ElementId(0),
            category,
            name: category.name().to_string(),
            location: None,
            geometry: Vec::new(),
            instance: None,
            owner_view: None,
            pinned: false,
            origin: Point3::origin(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_geometry(mut self, geometry: GeometryObject) -> Self {
        self.geometry.push(geometry);
        self
    }

    pub fn with_instance(mut self, family: impl Into<String>, placement: Point3) -> Self {
        self.instance = Some(FamilyInstance {
            family: family.into(),
            placement,
        });
        self
    }

    pub fn with_owner_view(mut self, view: ViewId) -> Self {
        self.owner_view = Some(view);
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    /// 定位点（仅点定位）
    pub fn location_point(&self) -> Option<Point3> {
        match &self.location {
            Some(Location::Point(p)) => Some(*p),
            _ => None,
        }
    }

    /// 定位曲线（仅曲线定位）
    pub fn location_curve(&self) -> Option<&Curve> {
        match &self.location {
            Some(Location::Curve(c)) => Some(c),
            _ => None,
        }
    }

    /// 按选项读取几何，顺序即存储顺序
    ///
    /// 计算引用时为每个面分配按出现顺序递增的引用号，否则清空引用。
    pub fn geometry(&self, options: &GeometryOptions) -> Vec<GeometryObject> {
        let mut next_reference = 0u32;
        self.geometry
            .iter()
            .map(|object| match object {
                GeometryObject::Solid(solid) => {
                    let mut solid = solid.clone();
                    for face in &mut solid.faces {
                        face.reference = if options.compute_references {
                            next_reference += 1;
                            Some(crate::geometry::FaceReference(next_reference))
                        } else {
                            None
                        };
                    }
                    GeometryObject::Solid(solid)
                }
                other => other.clone(),
            })
            .collect()
    }

    /// 元素位置：点定位、曲线起点，否则为原点
    pub fn position(&self) -> Point3 {
        match &self.location {
            Some(Location::Point(p)) => *p,
            Some(Location::Curve(c)) => c.start_point(),
            None => self.origin,
        }
    }

    /// 刚体平移（定位、几何、放置点、原点同时移动）
    pub fn translate(&mut self, offset: &Vector3) {
        if let Some(location) = &self.location {
            self.location = Some(location.translated(offset));
        }
        self.geometry = self.geometry.iter().map(|g| g.translated(offset)).collect();
        if let Some(instance) = &mut self.instance {
            instance.placement += *offset;
        }
        self.origin += *offset;
    }

    pub fn bounding_box(&self) -> Option<BoundingBox3> {
        let location_box = self.location.as_ref().map(|l| match l {
            Location::Point(p) => BoundingBox3::new(*p, *p),
            Location::Curve(c) => c.bounding_box(),
        });
        self.geometry
            .iter()
            .filter_map(GeometryObject::bounding_box)
            .chain(location_box)
            .reduce(|a, b| a.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Solid;

    #[test]
    fn test_geometry_references() {
        let element = Element::new(Category::Ceiling)
            .with_geometry(GeometryObject::Solid(Solid::cuboid(
                Point3::origin(),
                Point3::new(1.0, 1.0, 1.0),
            )));

        let plain = element.geometry(&GeometryOptions::default());
        let GeometryObject::Solid(solid) = &plain[0] else {
            panic!("expected solid");
        };
        assert!(solid.faces.iter().all(|f| f.reference.is_none()));

        let referenced = element.geometry(&GeometryOptions::with_references());
        let GeometryObject::Solid(solid) = &referenced[0] else {
            panic!("expected solid");
        };
        let refs: Vec<u32> = solid.faces.iter().filter_map(|f| f.reference).map(|r| r.0).collect();
        assert_eq!(refs, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_translate_moves_everything() {
        let mut element = Element::new(Category::Furniture)
            .with_location(Location::Point(Point3::new(1.0, 1.0, 0.0)))
            .with_instance("Desk", Point3::new(1.0, 1.0, 0.0));

        element.translate(&Vector3::new(2.0, 0.0, 1.0));

        assert_eq!(element.location_point(), Some(Point3::new(3.0, 1.0, 1.0)));
        assert_eq!(element.instance.as_ref().unwrap().placement, Point3::new(3.0, 1.0, 1.0));
        assert_eq!(element.origin, Point3::new(2.0, 0.0, 1.0));
    }

    #[test]
    fn test_position_fallback_to_origin() {
        let mut element = Element::new(Category::ImportedGeometry);
        element.origin = Point3::new(7.0, 8.0, 9.0);
        assert_eq!(element.position(), Point3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn test_element_serde() {
        let element = Element::new(Category::Wall).with_location(Location::Curve(Curve::line(
            Point3::origin(),
            Point3::new(5.0, 0.0, 0.0),
        )));
        let json = serde_json::to_string(&element).unwrap();
        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(back, element);
    }
}

//! LineCopy 核心
//!
//! 提供元素模型、几何表示、视图和锚点解析。
//!
//! # 示例
//!
//! ```rust
//! use linecopy_core::prelude::*;
//!
//! let wall = Element::new(Category::Wall).with_location(Location::Curve(Curve::line(
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(5.0, 0.0, 0.0),
//! )));
//!
//! let anchor = linecopy_core::anchor::resolve(&wall).unwrap();
//! assert_eq!(anchor.point, Point3::origin());
//! ```

pub mod anchor;
pub mod element;
pub mod geometry;
pub mod math;
pub mod view;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::anchor::{AnchorPoint, AnchorResolver, AnchorSource};
    pub use crate::element::{Category, Element, ElementId, FamilyInstance, Location};
    pub use crate::geometry::{Curve, Face, GeometryObject, GeometryOptions, Solid};
    pub use crate::math::{BoundingBox3, Point3, Vector3, EPSILON};
    pub use crate::view::{View, ViewFrame, ViewId, ViewKind};
}

//! 导入与放置
//!
//! 交换文件以文件原点导入（默认单位、比例 1.0、不提示单位），
//! 然后把新元素平移到锚点。锁定状态在移动前读取，
//! 移动无论成败都会恢复，移动前后的锁定状态保持一致。

use crate::error::ExternalOperationFailed;
use crate::session::EditingSession;
use linecopy_core::anchor::AnchorPoint;
use linecopy_core::element::ElementId;
use linecopy_core::math::Point3;
use linecopy_core::view::ViewId;
use linecopy_file::{FileError, ImportOptions};
use std::path::Path;

/// 导入交换文件并放置到锚点，返回新元素
pub fn import_and_place<S: EditingSession>(
    session: &mut S,
    path: &Path,
    anchor: &AnchorPoint,
    target_view: ViewId,
) -> Result<ElementId, ExternalOperationFailed> {
    let imported = session
        .import_file(path, &ImportOptions::default(), target_view)
        .map_err(ExternalOperationFailed::Import)?;

    let id = imported
        .filter(|id| session.element(*id).is_some())
        .ok_or(ExternalOperationFailed::ImportProducedNoElement)?;

    place_at(session, id, anchor.point)?;
    Ok(id)
}

/// 把元素平移到 `target`，保持锁定状态
pub fn place_at<S: EditingSession>(
    session: &mut S,
    id: ElementId,
    target: Point3,
) -> Result<(), ExternalOperationFailed> {
    let was_pinned = session.is_pinned(id).map_err(ExternalOperationFailed::Move)?;
    if was_pinned {
        session
            .set_pinned(id, false)
            .map_err(ExternalOperationFailed::Move)?;
    }

    let moved = translate_to(session, id, target);

    if was_pinned {
        if let Err(e) = session.set_pinned(id, true) {
            if moved.is_ok() {
                return Err(ExternalOperationFailed::Move(e));
            }
            tracing::warn!("Failed to restore pin on element {}: {}", id, e);
        }
    }

    moved.map_err(ExternalOperationFailed::Move)
}

fn translate_to<S: EditingSession>(
    session: &mut S,
    id: ElementId,
    target: Point3,
) -> Result<(), FileError> {
    let position = session
        .element(id)
        .map(|e| e.position())
        .ok_or(FileError::ElementNotFound(id))?;
    let offset = target - position;
    session.move_element(id, &offset)?;
    tracing::info!(
        "Placed element {} at ({:.4}, {:.4}, {:.4})",
        id,
        target.x,
        target.y,
        target.z
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linecopy_core::element::{Category, Element};
    use linecopy_core::geometry::{Curve, GeometryObject};
    use linecopy_core::math::Vector3;
    use linecopy_core::view::{View, ViewKind};
    use linecopy_file::Document;

    fn imported(doc: &mut Document, pinned: bool) -> ElementId {
        doc.add_element(
            Element::new(Category::ImportedGeometry)
                .with_geometry(GeometryObject::Curve(Curve::line(
                    Point3::origin(),
                    Point3::new(5.0, 0.0, 0.0),
                )))
                .pinned(pinned),
        )
    }

    #[test]
    fn test_place_pinned_element_restores_pin() {
        let mut doc = Document::new();
        let id = imported(&mut doc, true);

        place_at(&mut doc, id, Point3::new(2.0, 2.0, 3.0)).unwrap();

        let element = doc.element(id).unwrap();
        assert!(element.pinned);
        assert_eq!(element.position(), Point3::new(2.0, 2.0, 3.0));
        let GeometryObject::Curve(curve) = &element.geometry[0] else {
            panic!("expected curve");
        };
        assert_eq!(curve.start_point(), Point3::new(2.0, 2.0, 3.0));
        assert_eq!(curve.end_point(), Point3::new(7.0, 2.0, 3.0));
    }

    #[test]
    fn test_place_unpinned_element_stays_unpinned() {
        let mut doc = Document::new();
        let id = imported(&mut doc, false);

        place_at(&mut doc, id, Point3::new(-1.0, 0.5, 0.0)).unwrap();

        let element = doc.element(id).unwrap();
        assert!(!element.pinned);
        assert_eq!(element.position(), Point3::new(-1.0, 0.5, 0.0));
    }

    #[test]
    fn test_place_from_non_origin_position() {
        let mut doc = Document::new();
        let id = imported(&mut doc, false);
        doc.move_element(id, &Vector3::new(10.0, 10.0, 0.0)).unwrap();

        place_at(&mut doc, id, Point3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(doc.element(id).unwrap().position(), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_place_missing_element() {
        let mut doc = Document::new();
        let result = place_at(&mut doc, ElementId(42), Point3::origin());
        assert!(matches!(result, Err(ExternalOperationFailed::Move(FileError::ElementNotFound(_)))));
    }

    #[test]
    fn test_import_nothing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new();
        let view = doc.add_view(View::new("Level 1", ViewKind::FloorPlan));
        let path = linecopy_file::dxf_io::export_view(
            &doc,
            view,
            dir.path(),
            "empty",
            &linecopy_file::ExportOptions::default(),
        )
        .unwrap();

        let anchor = AnchorPoint {
            point: Point3::origin(),
            source: linecopy_core::anchor::AnchorSource::PointLocation,
        };
        let result = import_and_place(&mut doc, &path, &anchor, view);
        assert!(matches!(result, Err(ExternalOperationFailed::ImportProducedNoElement)));
    }
}

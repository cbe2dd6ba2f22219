//! 文档模型
//!
//! 文档持有元素和视图，负责ID分配、视图复制与隔离、元素移动和事务。
//!
//! 事务基于快照：开启时保存模型副本，回滚时整体恢复。
//! 事务外的修改同样允许（用于构建文档），但同一时间只能有一个事务。

use crate::error::FileError;
use chrono::{DateTime, Utc};
use linecopy_core::element::{Element, ElementId};
use linecopy_core::math::Vector3;
use linecopy_core::view::{View, ViewId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 文档元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub id: Uuid,
    pub title: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: "Untitled".to_string(),
            created: now,
            modified: now,
        }
    }
}

/// 文档设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSettings {
    /// 导入的元素是否默认锁定
    pub pin_imports: bool,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self { pin_imports: true }
    }
}

/// 视图复制方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewDuplicateOption {
    /// 仅复制视图本身
    Duplicate,
    /// 同时复制视图专有元素（详图线等）
    WithDetailing,
}

/// 模型数据（事务快照的单位）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Model {
    pub(crate) elements: BTreeMap<ElementId, Element>,
    pub(crate) views: BTreeMap<ViewId, View>,
    pub(crate) active_view: Option<ViewId>,
    pub(crate) next_id: u64,
}

impl Model {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug)]
struct OpenTransaction {
    name: String,
    snapshot: Model,
}

/// 文档
#[derive(Debug, Default)]
pub struct Document {
    pub metadata: DocumentMetadata,
    pub settings: DocumentSettings,
    pub(crate) model: Model,
    transaction: Option<OpenTransaction>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== 元素 ==========

    /// 添加元素并分配ID
    pub fn add_element(&mut self, mut element: Element) -> ElementId {
        let id = ElementId(self.model.allocate_id());
        element.id = id;
        self.model.elements.insert(id, element);
        id
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.model.elements.get(&id)
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut Element, FileError> {
        self.model
            .elements
            .get_mut(&id)
            .ok_or(FileError::ElementNotFound(id))
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.model.elements.values()
    }

    pub fn element_count(&self) -> usize {
        self.model.elements.len()
    }

    /// 平移元素，锁定的元素不可移动
    pub fn move_element(&mut self, id: ElementId, offset: &Vector3) -> Result<(), FileError> {
        let element = self.element_mut(id)?;
        if element.pinned {
            return Err(FileError::ElementPinned(id));
        }
        element.translate(offset);
        tracing::debug!(
            "Moved element {} by ({:.4}, {:.4}, {:.4})",
            id,
            offset.x,
            offset.y,
            offset.z
        );
        Ok(())
    }

    pub fn set_pinned(&mut self, id: ElementId, pinned: bool) -> Result<(), FileError> {
        self.element_mut(id)?.pinned = pinned;
        Ok(())
    }

    // ========== 视图 ==========

    /// 添加视图并分配ID，第一个视图自动成为当前视图
    pub fn add_view(&mut self, mut view: View) -> ViewId {
        let id = ViewId(self.model.allocate_id());
        view.id = id;
        self.model.views.insert(id, view);
        if self.model.active_view.is_none() {
            self.model.active_view = Some(id);
        }
        id
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.model.views.get(&id)
    }

    fn view_mut(&mut self, id: ViewId) -> Result<&mut View, FileError> {
        self.model.views.get_mut(&id).ok_or(FileError::ViewNotFound(id))
    }

    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.model.views.values()
    }

    pub fn view_count(&self) -> usize {
        self.model.views.len()
    }

    pub fn active_view(&self) -> Option<&View> {
        self.model.active_view.and_then(|id| self.view(id))
    }

    pub fn set_active_view(&mut self, id: ViewId) -> Result<(), FileError> {
        if !self.model.views.contains_key(&id) {
            return Err(FileError::ViewNotFound(id));
        }
        self.model.active_view = Some(id);
        Ok(())
    }

    /// 删除视图及其专有元素
    pub fn remove_view(&mut self, id: ViewId) -> Result<View, FileError> {
        if self.model.active_view == Some(id) {
            return Err(FileError::Transaction(format!(
                "cannot delete the active view {}",
                id
            )));
        }
        let view = self.model.views.remove(&id).ok_or(FileError::ViewNotFound(id))?;
        self.model.elements.retain(|_, e| e.owner_view != Some(id));
        Ok(view)
    }

    /// 复制视图，副本不继承临时隔离
    pub fn duplicate_view(
        &mut self,
        id: ViewId,
        option: ViewDuplicateOption,
    ) -> Result<ViewId, FileError> {
        let source = self.view(id).ok_or(FileError::ViewNotFound(id))?;
        let copy_prefix = format!("{} Copy ", source.name);
        let copies = self
            .model
            .views
            .values()
            .filter(|v| v.name.starts_with(&copy_prefix))
            .count();

        let mut copy = source.clone();
        copy.name = format!("{} Copy {}", source.name, copies + 1);
        copy.isolation = None;

        let new_id = self.add_view(copy);

        if option == ViewDuplicateOption::WithDetailing {
            let detailing: Vec<Element> = self
                .model
                .elements
                .values()
                .filter(|e| e.owner_view == Some(id))
                .cloned()
                .collect();
            for element in detailing {
                self.add_element(element.with_owner_view(new_id));
            }
        }

        tracing::debug!("Duplicated view {} as {} ({:?})", id, new_id, option);
        Ok(new_id)
    }

    /// 在视图中临时隔离元素
    pub fn isolate_temporary(
        &mut self,
        view: ViewId,
        elements: &[ElementId],
    ) -> Result<(), FileError> {
        if let Some(missing) = elements.iter().find(|id| !self.model.elements.contains_key(*id)) {
            return Err(FileError::ElementNotFound(*missing));
        }
        self.view_mut(view)?.isolate_temporary(elements.iter().copied());
        Ok(())
    }

    /// 视图中可见的元素：模型元素与该视图的专有元素，再按隔离过滤
    pub fn visible_elements(&self, view: ViewId) -> Result<Vec<&Element>, FileError> {
        let v = self.view(view).ok_or(FileError::ViewNotFound(view))?;
        Ok(self
            .model
            .elements
            .values()
            .filter(|e| e.owner_view.map_or(true, |owner| owner == view))
            .filter(|e| v.isolation_allows(e.id))
            .collect())
    }

    // ========== 事务 ==========

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    pub fn begin_transaction(&mut self, name: &str) -> Result<(), FileError> {
        if let Some(open) = &self.transaction {
            return Err(FileError::Transaction(format!(
                "transaction '{}' is already open",
                open.name
            )));
        }
        self.transaction = Some(OpenTransaction {
            name: name.to_string(),
            snapshot: self.model.clone(),
        });
        tracing::debug!("Transaction '{}' started", name);
        Ok(())
    }

    pub fn commit_transaction(&mut self) -> Result<(), FileError> {
        let open = self
            .transaction
            .take()
            .ok_or_else(|| FileError::Transaction("no open transaction to commit".to_string()))?;
        self.metadata.modified = Utc::now();
        tracing::info!("Transaction '{}' committed", open.name);
        Ok(())
    }

    pub fn rollback_transaction(&mut self) -> Result<(), FileError> {
        let open = self
            .transaction
            .take()
            .ok_or_else(|| FileError::Transaction("no open transaction to roll back".to_string()))?;
        // 回滚后ID计数不倒退，已分配的ID不再复用
        let next_id = self.model.next_id;
        self.model = open.snapshot;
        self.model.next_id = next_id;
        tracing::info!("Transaction '{}' rolled back", open.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linecopy_core::element::{Category, Location};
    use linecopy_core::geometry::Curve;
    use linecopy_core::math::Point3;
    use linecopy_core::view::ViewKind;

    fn plan_document() -> (Document, ViewId, ElementId) {
        let mut doc = Document::new();
        let view = doc.add_view(View::new("Level 1", ViewKind::FloorPlan));
        let wall = doc.add_element(Element::new(Category::Wall).with_location(Location::Curve(
            Curve::line(Point3::origin(), Point3::new(5.0, 0.0, 0.0)),
        )));
        (doc, view, wall)
    }

    #[test]
    fn test_ids_are_unique() {
        let (mut doc, view, wall) = plan_document();
        let other = doc.add_element(Element::new(Category::Floor));
        assert_ne!(view.0, wall.0);
        assert_ne!(wall, other);
        assert_eq!(doc.active_view().unwrap().id, view);
    }

    #[test]
    fn test_move_pinned_fails() {
        let (mut doc, _, wall) = plan_document();
        doc.set_pinned(wall, true).unwrap();
        let result = doc.move_element(wall, &Vector3::new(1.0, 0.0, 0.0));
        assert!(matches!(result, Err(FileError::ElementPinned(id)) if id == wall));

        doc.set_pinned(wall, false).unwrap();
        doc.move_element(wall, &Vector3::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(doc.element(wall).unwrap().position(), Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_duplicate_and_isolate() {
        let (mut doc, view, wall) = plan_document();
        let floor = doc.add_element(Element::new(Category::Floor));
        let note = doc.add_element(Element::new(Category::DetailLine).with_owner_view(view));

        let plain = doc.duplicate_view(view, ViewDuplicateOption::Duplicate).unwrap();
        assert_eq!(doc.view(plain).unwrap().name, "Level 1 Copy 1");
        // 普通复制不带详图元素
        let visible: Vec<ElementId> = doc.visible_elements(plain).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(visible, vec![wall, floor]);

        let detailed = doc.duplicate_view(view, ViewDuplicateOption::WithDetailing).unwrap();
        assert_eq!(doc.visible_elements(detailed).unwrap().len(), 3);
        assert!(doc.visible_elements(detailed).unwrap().iter().all(|e| e.id != note));

        doc.isolate_temporary(plain, &[wall]).unwrap();
        let visible: Vec<ElementId> = doc.visible_elements(plain).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(visible, vec![wall]);
        // 原视图不受影响
        assert_eq!(doc.visible_elements(view).unwrap().len(), 3);
    }

    #[test]
    fn test_remove_view_removes_owned_elements() {
        let (mut doc, view, _) = plan_document();
        let scratch = doc.duplicate_view(view, ViewDuplicateOption::Duplicate).unwrap();
        doc.add_element(Element::new(Category::ImportedGeometry).with_owner_view(scratch));
        assert_eq!(doc.element_count(), 2);

        doc.remove_view(scratch).unwrap();
        assert_eq!(doc.element_count(), 1);
        assert!(doc.remove_view(view).is_err());
    }

    #[test]
    fn test_rollback_restores_model() {
        let (mut doc, view, wall) = plan_document();

        doc.begin_transaction("edit").unwrap();
        assert!(doc.begin_transaction("nested").is_err());
        let scratch = doc.duplicate_view(view, ViewDuplicateOption::Duplicate).unwrap();
        doc.move_element(wall, &Vector3::new(0.0, 3.0, 0.0)).unwrap();
        doc.rollback_transaction().unwrap();

        assert!(doc.view(scratch).is_none());
        assert_eq!(doc.element(wall).unwrap().position(), Point3::origin());
        assert!(!doc.in_transaction());
        assert!(doc.rollback_transaction().is_err());
    }

    #[test]
    fn test_rollback_does_not_reuse_ids() {
        let (mut doc, _, _) = plan_document();

        doc.begin_transaction("discarded").unwrap();
        let discarded = doc.add_element(Element::new(Category::Floor));
        doc.rollback_transaction().unwrap();
        assert!(doc.element(discarded).is_none());

        let next = doc.add_element(Element::new(Category::Floor));
        assert_ne!(next, discarded);
        assert!(next > discarded);
    }

    #[test]
    fn test_duplicate_numbering_ignores_similar_names() {
        let mut doc = Document::new();
        let level1 = doc.add_view(View::new("Level 1", ViewKind::FloorPlan));
        let level10 = doc.add_view(View::new("Level 10", ViewKind::FloorPlan));
        doc.duplicate_view(level10, ViewDuplicateOption::Duplicate).unwrap();

        let copy = doc.duplicate_view(level1, ViewDuplicateOption::Duplicate).unwrap();
        assert_eq!(doc.view(copy).unwrap().name, "Level 1 Copy 1");
        let second = doc.duplicate_view(level1, ViewDuplicateOption::Duplicate).unwrap();
        assert_eq!(doc.view(second).unwrap().name, "Level 1 Copy 2");
    }

    #[test]
    fn test_commit_keeps_changes() {
        let (mut doc, view, _) = plan_document();
        doc.begin_transaction("edit").unwrap();
        let scratch = doc.duplicate_view(view, ViewDuplicateOption::Duplicate).unwrap();
        doc.commit_transaction().unwrap();
        assert!(doc.view(scratch).is_some());
        assert!(doc.commit_transaction().is_err());
    }
}

//! 事务守卫
//!
//! 创建临时对象时登记清理动作，提交前按登记的逆序执行。
//! 未提交就被丢弃的守卫会回滚事务，临时对象随之消失。

use crate::session::EditingSession;
use linecopy_file::FileError;
use std::ops::{Deref, DerefMut};

type Deferred<'a, S> = Box<dyn FnOnce(&mut S) -> Result<(), FileError> + 'a>;

/// 事务守卫
pub struct Transaction<'a, S: EditingSession> {
    session: &'a mut S,
    name: String,
    deferred: Vec<Deferred<'a, S>>,
    finished: bool,
}

impl<'a, S: EditingSession> Transaction<'a, S> {
    pub fn begin(session: &'a mut S, name: &str) -> Result<Self, FileError> {
        session.begin_transaction(name)?;
        Ok(Self {
            session,
            name: name.to_string(),
            deferred: Vec::new(),
            finished: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 登记提交前执行的清理动作
    pub fn defer(&mut self, action: impl FnOnce(&mut S) -> Result<(), FileError> + 'a) {
        self.deferred.push(Box::new(action));
    }

    /// 执行清理动作后提交；任一清理失败则不提交，守卫丢弃时回滚
    pub fn commit(mut self) -> Result<(), FileError> {
        let deferred = std::mem::take(&mut self.deferred);
        for action in deferred.into_iter().rev() {
            action(&mut *self.session)?;
        }
        self.session.commit_transaction()?;
        self.finished = true;
        Ok(())
    }

    /// 回滚，已登记的清理动作不再需要
    pub fn rollback(mut self) -> Result<(), FileError> {
        self.deferred.clear();
        self.finished = true;
        self.session.rollback_transaction()
    }
}

impl<'a, S: EditingSession> Deref for Transaction<'a, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &*self.session
    }
}

impl<'a, S: EditingSession> DerefMut for Transaction<'a, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.session
    }
}

impl<'a, S: EditingSession> Drop for Transaction<'a, S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.session.rollback_transaction() {
            Ok(()) => tracing::warn!("Transaction '{}' dropped without commit, rolled back", self.name),
            Err(e) => tracing::error!("Failed to roll back transaction '{}': {}", self.name, e),
        }
    }
}

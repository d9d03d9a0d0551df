//! Virtual component tree.
//!
//! A [`Node`] owns its children and knows its parent through a weak
//! reference, so dropping the last handle to a root frees the whole tree.
//! Explicit teardown goes through [`Node::destroy`], which destroys the
//! children first and then gives the node payload a chance to release native
//! resources via [`NodeData::on_destroy`].

use crate::errors::GuiError;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt::{Debug, Display, Formatter};
use std::rc::{Rc, Weak};
use uuid::Uuid;

/// A unique identifier for a tree node, represented as a UUID.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId(Uuid);

impl ComponentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload of a tree node.
pub trait NodeData: Sized {
    /// Called once while `node` is destroyed, after all of its children.
    fn on_destroy(_node: &Node<Self>) -> Result<(), GuiError> {
        Ok(())
    }
}

struct NodeCell<T> {
    id: ComponentId,
    parent: RefCell<Weak<NodeCell<T>>>,
    children: RefCell<Vec<Node<T>>>,
    destroyed: Cell<bool>,
    data: RefCell<T>,
}

/// Shared handle to a tree node.
pub struct Node<T>(Rc<NodeCell<T>>);

/// Non-owning handle to a tree node.
pub struct WeakNode<T>(Weak<NodeCell<T>>);

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Node(self.0.clone())
    }
}

impl<T> Clone for WeakNode<T> {
    fn clone(&self) -> Self {
        WeakNode(self.0.clone())
    }
}

impl<T> WeakNode<T> {
    pub fn upgrade(&self) -> Option<Node<T>> {
        self.0.upgrade().map(Node)
    }
}

impl<T> Default for WeakNode<T> {
    fn default() -> Self {
        WeakNode(Weak::new())
    }
}

impl<T: NodeData> Node<T> {
    pub fn new(data: T) -> Self {
        Node(Rc::new(NodeCell {
            id: ComponentId::new(),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            destroyed: Cell::new(false),
            data: RefCell::new(data),
        }))
    }

    pub fn id(&self) -> ComponentId {
        self.0.id
    }

    pub fn parent(&self) -> Option<Node<T>> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    /// Snapshot of the children, in insertion order.
    pub fn children(&self) -> Vec<Node<T>> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.get()
    }

    pub fn data(&self) -> Ref<'_, T> {
        self.0.data.borrow()
    }

    pub fn data_mut(&self) -> RefMut<'_, T> {
        self.0.data.borrow_mut()
    }

    pub fn downgrade(&self) -> WeakNode<T> {
        WeakNode(Rc::downgrade(&self.0))
    }

    /// True when both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// True if `self` is a (possibly indirect) parent of `other`.
    pub fn is_ancestor_of(&self, other: &Node<T>) -> bool {
        let mut current = other.parent();
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// The topmost ancestor, or the node itself when it has no parent.
    pub fn root(&self) -> Node<T> {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    /// Moves this node under `new_parent`, appending it to its children. `None` detaches it.
    pub fn reparent(&self, new_parent: Option<&Node<T>>) -> Result<(), GuiError> {
        if self.is_destroyed() {
            return Err(GuiError::ComponentDestroyed(self.id()));
        }
        if let Some(parent) = new_parent {
            if parent.is_destroyed() {
                return Err(GuiError::ComponentDestroyed(parent.id()));
            }
            if parent.ptr_eq(self) || self.is_ancestor_of(parent) {
                return Err(GuiError::ReparentCycle {
                    node: self.id(),
                    parent: parent.id(),
                });
            }
        }

        self.detach();
        if let Some(parent) = new_parent {
            parent.0.children.borrow_mut().push(self.clone());
            *self.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
        }
        Ok(())
    }

    /// Appends `child` to this node's children.
    pub fn add_child(&self, child: &Node<T>) -> Result<(), GuiError> {
        child.reparent(Some(self))
    }

    fn detach(&self) {
        let old = std::mem::take(&mut *self.0.parent.borrow_mut());
        if let Some(old) = old.upgrade() {
            old.children.borrow_mut().retain(|c| !Rc::ptr_eq(&c.0, &self.0));
        }
    }

    /// Destroys the subtree rooted at this node.
    ///
    /// Children go first, then [`NodeData::on_destroy`] runs and the node is
    /// detached from its parent. Teardown continues past errors; the first one
    /// is returned. Destroying an already destroyed node does nothing.
    pub fn destroy(&self) -> Result<(), GuiError> {
        if self.0.destroyed.replace(true) {
            return Ok(());
        }

        let mut result = Ok(());
        for child in self.children() {
            let res = child.destroy();
            if result.is_ok() {
                result = res;
            }
        }

        let res = T::on_destroy(self);
        if result.is_ok() {
            result = res;
        }

        self.detach();
        result
    }
}

impl<T> Debug for Node<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.0.id)
            .field("children", &self.0.children.try_borrow().map(|c| c.len()).ok())
            .field("destroyed", &self.0.destroyed.get())
            .finish()
    }
}

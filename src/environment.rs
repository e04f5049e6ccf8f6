use crate::types::{IodeObject, IodeSymbol};
use itertools::Itertools;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct UnboundVariable(pub IodeSymbol);

impl fmt::Display for UnboundVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reference to undefined variable `{}`", self.0)
    }
}

impl std::error::Error for UnboundVariable {}

/// One frame of the scope chain. Frames are shared through `Rc`: every
/// closure created in a frame keeps it (and its ancestors) alive.
#[derive(Default)]
pub struct Environment {
    bindings: RefCell<HashMap<IodeSymbol, IodeObject>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn spawn_from(parent: &Rc<Self>) -> Rc<Self> {
        Self::child(parent, Vec::new())
    }

    pub fn child<I>(parent: &Rc<Self>, bindings: I) -> Rc<Self>
    where
        I: IntoIterator<Item = (IodeSymbol, IodeObject)>,
    {
        Rc::new(Self {
            bindings: RefCell::new(bindings.into_iter().collect()),
            parent: Some(parent.clone()),
        })
    }

    fn frames(&self) -> impl Iterator<Item = &Environment> {
        std::iter::successors(Some(self), |env| env.parent.as_deref())
    }

    pub fn get(&self, key: &IodeSymbol) -> Option<IodeObject> {
        self.frames()
            .find_map(|env| env.bindings.borrow().get(key).cloned())
    }

    pub fn fetch(&self, key: &IodeSymbol) -> Result<IodeObject, UnboundVariable> {
        self.get(key).ok_or_else(|| UnboundVariable(key.clone()))
    }

    /// Binds in this frame, shadowing anything further out.
    pub fn define<T>(&self, key: T, value: IodeObject)
    where
        T: Into<IodeSymbol>,
    {
        self.bindings.borrow_mut().insert(key.into(), value);
    }

    /// Overwrites the nearest existing binding. Never creates one.
    pub fn assign(&self, key: &IodeSymbol, value: IodeObject) -> Result<IodeObject, UnboundVariable> {
        match self.frames().find(|env| env.defines(key)) {
            Some(env) => {
                env.bindings.borrow_mut().insert(key.clone(), value.clone());
                Ok(value)
            }
            None => Err(UnboundVariable(key.clone())),
        }
    }

    /// True if this frame itself (not an ancestor) binds `key`.
    pub fn defines(&self, key: &IodeSymbol) -> bool {
        self.bindings.borrow().contains_key(key)
    }

    /// Copies the bindings made directly in `other` into this frame.
    pub fn absorb(&self, other: &Environment) {
        if std::ptr::eq(self, other) {
            return;
        }
        let incoming = other.bindings.borrow();
        let mut bindings = self.bindings.borrow_mut();
        for (key, value) in incoming.iter() {
            bindings.insert(key.clone(), value.clone());
        }
    }

    pub fn names(&self) -> Vec<IodeSymbol> {
        self.bindings
            .borrow()
            .keys()
            .cloned()
            .sorted_by(|a, b| a.as_str().cmp(b.as_str()))
            .collect()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frames = self
            .frames()
            .map(|env| format!("{{{}}}", env.names().iter().join(" ")))
            .join(" -> ");
        write!(f, "{}", frames)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment({})", self)
    }
}

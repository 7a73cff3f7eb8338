//! Nesting of provider layers around application content.
//!
//! A composer is an ordered list of descriptors. Composing filters out the
//! descriptors whose condition is false, then wraps the content right to
//! left, so the first descriptor ends up outermost:
//!
//! ```text
//! [A, B (condition=false), C].compose(x)  ==  A( C( x ) )
//! ```
//!
//! Conditions are evaluated on every `compose`, so one composer can be kept
//! around and re-composed as the flags behind it change.

use core::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Inclusion test for a provider layer.
#[derive(Clone)]
pub struct Condition(Arc<dyn Fn() -> bool + Send + Sync>);

impl Condition {
    pub fn new(test: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(test))
    }

    pub fn evaluate(&self) -> bool {
        (self.0)()
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

/// One provider layer: which component, with which props, and whether it is
/// included at all.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor<C> {
    pub component: C,
    pub props: Value,
    /// `None` means always included.
    pub condition: Option<Condition>,
}

impl<C> ProviderDescriptor<C> {
    pub fn new(component: C) -> Self {
        Self {
            component,
            props: Value::Null,
            condition: None,
        }
    }

    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }

    pub fn when(mut self, test: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.condition = Some(Condition::new(test));
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.condition.as_ref().is_none_or(Condition::evaluate)
    }
}

/// Composed tree: provider layers down to the content.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderNode<C, T> {
    Provider {
        component: C,
        props: Value,
        child: Box<ProviderNode<C, T>>,
    },
    Content(T),
}

impl<C, T> ProviderNode<C, T> {
    /// Components from the outermost layer inwards.
    pub fn components(&self) -> Vec<&C> {
        let mut out = Vec::new();
        let mut node = self;
        while let ProviderNode::Provider { component, child, .. } = node {
            out.push(component);
            node = &**child;
        }
        out
    }

    /// The wrapped content.
    pub fn content(&self) -> &T {
        let mut node = self;
        loop {
            match node {
                ProviderNode::Provider { child, .. } => node = &**child,
                ProviderNode::Content(content) => return content,
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.components().len()
    }
}

impl<C: fmt::Display, T: fmt::Display> fmt::Display for ProviderNode<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut node = self;
        let mut indent = 0;
        loop {
            match node {
                ProviderNode::Provider { component, props, child } => {
                    if props.is_null() {
                        writeln!(f, "{:indent$}{component}", "")?;
                    } else {
                        writeln!(f, "{:indent$}{component} {props}", "")?;
                    }
                    indent += 2;
                    node = &**child;
                }
                ProviderNode::Content(content) => return write!(f, "{:indent$}{content}", ""),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderComposer<C> {
    providers: Vec<ProviderDescriptor<C>>,
}

impl<C> Default for ProviderComposer<C> {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
        }
    }
}

impl<C: Clone> ProviderComposer<C> {
    pub fn new(providers: Vec<ProviderDescriptor<C>>) -> Self {
        Self { providers }
    }

    /// Append an innermost layer.
    pub fn with(mut self, descriptor: ProviderDescriptor<C>) -> Self {
        self.providers.push(descriptor);
        self
    }

    /// `self`'s layers outside `inner`'s.
    pub fn then(&self, inner: &ProviderComposer<C>) -> ProviderComposer<C> {
        let providers = self
            .providers
            .iter()
            .chain(inner.providers.iter())
            .cloned()
            .collect();
        ProviderComposer { providers }
    }

    /// Components that survive the condition filter, outermost first.
    pub fn active_components(&self) -> Vec<&C> {
        self.providers
            .iter()
            .filter(|d| d.is_enabled())
            .map(|d| &d.component)
            .collect()
    }

    pub fn compose<T>(&self, content: T) -> ProviderNode<C, T> {
        self.providers
            .iter()
            .filter(|d| d.is_enabled())
            .rev()
            .fold(ProviderNode::Content(content), |child, d| ProviderNode::Provider {
                component: d.component.clone(),
                props: d.props.clone(),
                child: Box::new(child),
            })
    }
}

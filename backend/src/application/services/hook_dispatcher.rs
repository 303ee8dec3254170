/// Hook registry and dispatcher for `trigger` / `apply`
use crate::domain::base::{DomainError, DomainResult};
use crate::domain::events::{Arguments, Event, HookValue};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Handler signature: handlers pull the arguments they need from the event
/// and may return a replacement value (only used by `apply`)
pub type HookHandler = Rc<dyn Fn(&Event) -> DomainResult<Option<HookValue>>>;

#[derive(Clone)]
pub struct Hook {
    handler: HookHandler,
}

impl Hook {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Event) -> DomainResult<Option<HookValue>> + 'static,
    {
        Hook {
            handler: Rc::new(handler),
        }
    }

    pub fn call(&self, event: &Event) -> DomainResult<Option<HookValue>> {
        (self.handler)(event)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook")
    }
}

/// Handlers keyed by exact name or wildcard pattern, in registration order
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    hooks: IndexMap<String, Vec<Hook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        HookRegistry::default()
    }

    /// Register a closure under a name or pattern
    pub fn on<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&Event) -> DomainResult<Option<HookValue>> + 'static,
    {
        self.register(pattern, Hook::new(handler))
    }

    pub fn register(&mut self, pattern: &str, hook: Hook) -> &mut Self {
        self.hooks.entry(pattern.to_string()).or_default().push(hook);
        self
    }

    /// Handlers for an event: exact name first, then each wildcard group
    pub fn handlers_for(&self, event: &Event) -> Vec<Hook> {
        let mut handlers: Vec<Hook> = self.hooks.get(event.name()).cloned().unwrap_or_default();
        for pattern in event.name_wildcards() {
            if let Some(group) = self.hooks.get(&pattern) {
                handlers.extend(group.iter().cloned());
            }
        }
        handlers
    }

    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs registered hooks with a per-name recursion guard
///
/// The guard is a stack of event names currently being dispatched. A nested
/// dispatch of a name already on the stack is a no-op; other names run fully.
#[derive(Debug, Default)]
pub struct HookDispatcher {
    registry: RefCell<HookRegistry>,
    in_flight: RefCell<Vec<String>>,
}

/// Pops the in-flight entry on every exit path
struct InFlightGuard<'a> {
    in_flight: &'a RefCell<Vec<String>>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.borrow_mut().pop();
    }
}

impl HookDispatcher {
    pub fn new(registry: HookRegistry) -> Self {
        HookDispatcher {
            registry: RefCell::new(registry),
            in_flight: RefCell::new(Vec::new()),
        }
    }

    /// Register an additional handler at runtime
    pub fn on<F>(&self, pattern: &str, handler: F)
    where
        F: Fn(&Event) -> DomainResult<Option<HookValue>> + 'static,
    {
        self.registry.borrow_mut().on(pattern, handler);
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.in_flight.borrow().iter().any(|running| running == name)
    }

    fn enter(&self, name: &str) -> Option<InFlightGuard<'_>> {
        if self.is_running(name) {
            tracing::debug!("Skipping recursive hook dispatch: {}", name);
            return None;
        }
        self.in_flight.borrow_mut().push(name.to_string());
        Some(InFlightGuard {
            in_flight: &self.in_flight,
        })
    }

    fn handlers_for(&self, event: &Event) -> Vec<Hook> {
        self.registry.borrow().handlers_for(event)
    }

    /// Run every matching handler; return values are discarded
    pub fn trigger(&self, name: &str, arguments: Arguments) -> DomainResult<()> {
        self.trigger_event(Event::new(name, arguments))
    }

    pub fn trigger_event(&self, event: Event) -> DomainResult<()> {
        let Some(_guard) = self.enter(event.name()) else {
            return Ok(());
        };

        for hook in self.handlers_for(&event) {
            hook.call(&event)?;
        }

        Ok(())
    }

    /// Run every matching handler, chaining the value stored under `key`
    ///
    /// A handler returning `None` or a null value keeps the previous value.
    pub fn apply(&self, name: &str, arguments: Arguments, key: &str) -> DomainResult<HookValue> {
        self.apply_event(Event::new(name, arguments), key)
    }

    pub fn apply_event(&self, event: Event, key: &str) -> DomainResult<HookValue> {
        if event.argument(key).is_none() {
            return Err(DomainError::invalid_value(
                "error.hooks.argument.invalid",
                format!("The argument {} does not exist", key),
            ));
        }

        let Some(_guard) = self.enter(event.name()) else {
            return Ok(event.argument(key).cloned().unwrap_or_default());
        };

        let mut event = event;
        for hook in self.handlers_for(&event) {
            if let Some(value) = hook.call(&event)? {
                if !value.is_null() {
                    event = event.with_argument(key, value);
                }
            }
        }

        Ok(event.argument(key).cloned().unwrap_or_default())
    }
}

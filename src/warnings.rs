// ==============================================================================
// warnings.rs - Request-Scoped Warning Collection
// ==============================================================================
// Description: Scoped collector for non-fatal diagnostics raised by routines
// ==============================================================================

use std::cell::RefCell;
use std::marker::PhantomData;

thread_local! {
    static SCOPES: RefCell<Vec<Vec<String>>> = const { RefCell::new(Vec::new()) };
}

/// Handle for one collection scope.
///
/// `enter` begins collecting warnings emitted on the current thread; `finish`
/// ends the scope and returns everything collected, in emission order. If the
/// handle is dropped without `finish` (an error or panic on the way out), the
/// scope is still torn down, so a previous scope is always restored on every
/// exit path.
///
/// The handle is deliberately `!Send`: a scope must be entered and finished
/// around a synchronous routine call, never held across an `.await`, so
/// concurrently executing requests cannot observe each other's warnings.
pub struct WarningScope {
    finished: bool,
    _not_send: PhantomData<*const ()>,
}

impl WarningScope {
    /// Begin collecting warnings for this call.
    pub fn enter() -> Self {
        SCOPES.with(|scopes| scopes.borrow_mut().push(Vec::new()));
        WarningScope {
            finished: false,
            _not_send: PhantomData,
        }
    }

    /// End the scope and return the collected warnings.
    pub fn finish(mut self) -> Vec<String> {
        self.finished = true;
        SCOPES.with(|scopes| scopes.borrow_mut().pop().unwrap_or_default())
    }
}

impl Drop for WarningScope {
    fn drop(&mut self) {
        if !self.finished {
            SCOPES.with(|scopes| {
                scopes.borrow_mut().pop();
            });
        }
    }
}

/// Record a non-fatal diagnostic.
///
/// Appends to the innermost active scope on this thread; outside any scope the
/// message is logged and otherwise discarded.
pub fn emit(message: impl Into<String>) {
    let message = message.into();
    tracing::warn!("{}", message);
    SCOPES.with(|scopes| {
        if let Some(scope) = scopes.borrow_mut().last_mut() {
            scope.push(message);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_in_emission_order() {
        let scope = WarningScope::enter();
        emit("first");
        emit("second");
        assert_eq!(scope.finish(), vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_emit_outside_scope_is_discarded() {
        emit("nobody listening");
        let scope = WarningScope::enter();
        assert_eq!(scope.finish(), Vec::<String>::new());
    }

    #[test]
    fn test_nested_scopes_restore_outer() {
        let outer = WarningScope::enter();
        emit("outer one");
        {
            let inner = WarningScope::enter();
            emit("inner");
            assert_eq!(inner.finish(), vec!["inner".to_string()]);
        }
        emit("outer two");
        assert_eq!(
            outer.finish(),
            vec!["outer one".to_string(), "outer two".to_string()]
        );
    }

    #[test]
    fn test_drop_without_finish_restores_previous_scope() {
        let outer = WarningScope::enter();
        {
            let _inner = WarningScope::enter();
            emit("lost with the inner scope");
        }
        emit("outer still active");
        assert_eq!(outer.finish(), vec!["outer still active".to_string()]);
    }
}

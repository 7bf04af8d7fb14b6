//! A bound-function pair: a function pointer plus an optional receiver
//! pointer, compared and invoked without heap allocation (§4.10).
//!
//! No precedent for this exact shape exists in the example pack (the
//! closest analogue, `shrev`'s `EventChannel`, is a buffered reader-group
//! channel, not a synchronous observer list — see SPEC_FULL.md). The
//! fn-pointer-plus-receiver-pointer layout follows EnTT's `delegate`, which
//! spec's glossary calls out by name, adapted here with Rust function items
//! instead of captured closures so identity comparison stays meaningful.

use std::marker::PhantomData;

type Stub<Args, Out> = fn(*const (), *const (), Args) -> Out;

/// A type-erased bound function: either a free function or a function
/// bound to a `&T` receiver. Cheap to copy and compares by identity (same
/// function and, for bound delegates, same receiver address).
pub struct Delegate<Args, Out = ()> {
    func: *const (),
    instance: *const (),
    stub: Stub<Args, Out>,
    _marker: PhantomData<fn(Args) -> Out>,
}

impl<Args, Out> Delegate<Args, Out> {
    /// Binds a free function.
    pub fn connect_free(f: fn(Args) -> Out) -> Self {
        fn stub<Args, Out>(func: *const (), _instance: *const (), args: Args) -> Out {
            // SAFETY: `func` was produced from a `fn(Args) -> Out` of this
            // exact signature in `connect_free` below; function pointers
            // and data pointers share representation on every target Rust
            // supports.
            let f: fn(Args) -> Out = unsafe { std::mem::transmute(func) };
            f(args)
        }
        Delegate {
            func: f as *const (),
            instance: std::ptr::null(),
            stub: stub::<Args, Out>,
            _marker: PhantomData,
        }
    }

    /// Binds `method` to `instance`, forming a bound-member-style delegate.
    /// `instance` must outlive every call to [`Delegate::call`].
    pub fn connect<T: 'static>(instance: &T, method: fn(&T, Args) -> Out) -> Self {
        fn stub<T, Args, Out>(func: *const (), instance: *const (), args: Args) -> Out {
            // SAFETY: see `connect_free`; `instance` is guaranteed live by
            // the caller's contract on `connect`.
            let f: fn(&T, Args) -> Out = unsafe { std::mem::transmute(func) };
            let t = unsafe { &*(instance as *const T) };
            f(t, args)
        }
        Delegate {
            func: method as *const (),
            instance: instance as *const T as *const (),
            stub: stub::<T, Args, Out>,
            _marker: PhantomData,
        }
    }

    /// Invokes the bound function.
    pub fn call(&self, args: Args) -> Out {
        (self.stub)(self.func, self.instance, args)
    }

    /// True for a delegate created with [`Delegate::connect`] (bound to a
    /// receiver), false for one created with [`Delegate::connect_free`].
    pub fn is_bound(&self) -> bool {
        !self.instance.is_null()
    }
}

impl<Args, Out> Clone for Delegate<Args, Out> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Args, Out> Copy for Delegate<Args, Out> {}

impl<Args, Out> PartialEq for Delegate<Args, Out> {
    fn eq(&self, other: &Self) -> bool {
        self.func == other.func && self.instance == other.instance
    }
}

impl<Args, Out> Eq for Delegate<Args, Out> {}

impl<Args, Out> std::fmt::Debug for Delegate<Args, Out> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delegate")
            .field("func", &self.func)
            .field("instance", &self.instance)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(x: i32) -> i32 {
        x * 2
    }

    struct Adder(i32);
    impl Adder {
        fn add(&self, x: i32) -> i32 {
            self.0 + x
        }
    }

    #[test]
    fn free_function_delegate_invokes() {
        let d = Delegate::connect_free(double);
        assert_eq!(d.call(21), 42);
        assert!(!d.is_bound());
    }

    #[test]
    fn bound_delegate_invokes_with_receiver() {
        let adder = Adder(10);
        let d = Delegate::connect(&adder, Adder::add);
        assert_eq!(d.call(5), 15);
        assert!(d.is_bound());
    }

    #[test]
    fn equality_is_structural_not_by_value() {
        let a1 = Adder(1);
        let a2 = Adder(1);
        let d1 = Delegate::connect(&a1, Adder::add);
        let d2 = Delegate::connect(&a1, Adder::add);
        let d3 = Delegate::connect(&a2, Adder::add);
        assert_eq!(d1, d2);
        assert_ne!(d1, d3);
    }
}

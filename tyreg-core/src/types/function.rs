use core::{any::TypeId, fmt};

use crate::{MetaData, MetaInfo, ReflectError, TypeRegistry, VarPtr};

/// How a function is invoked: with or without a receiver, with or without a
/// return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallShape {
    /// Free function returning a value.
    Static,
    /// Free function returning `()`.
    VoidStatic,
    /// Member function returning a value.
    Member,
    /// Member function returning `()`.
    VoidMember,
}

impl CallShape {
    fn of<R: 'static>(member: bool) -> Self {
        match (member, returns_unit::<R>()) {
            (false, false) => CallShape::Static,
            (false, true) => CallShape::VoidStatic,
            (true, false) => CallShape::Member,
            (true, true) => CallShape::VoidMember,
        }
    }

    /// Whether the function needs a receiver.
    pub fn is_member(self) -> bool {
        matches!(self, CallShape::Member | CallShape::VoidMember)
    }

    /// Whether the function writes a result through the return handle.
    pub fn returns_value(self) -> bool {
        matches!(self, CallShape::Static | CallShape::Member)
    }
}

type Trampoline =
    Box<dyn Fn(&mut VarPtr<'_>, &mut VarPtr<'_>, &mut [VarPtr<'_>]) + Send + Sync + 'static>;

/// A registered function, callable through type-erased handles.
///
/// The typed function is captured at registration inside a trampoline that
/// pulls arguments out of the handles, calls it, and stores the result.
pub struct Function {
    name: &'static str,
    shape: CallShape,
    args: Vec<MetaInfo>,
    return_type: MetaInfo,
    context: MetaInfo,
    exclusive_receiver: bool,
    trampoline: Trampoline,
}

impl Function {
    /// Name the function was registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// How the function is invoked.
    pub fn shape(&self) -> CallShape {
        self.shape
    }

    /// Number of arguments, receiver excluded.
    pub fn num_args(&self) -> usize {
        self.args.len()
    }

    /// Record of the argument at `index`, or [`MetaData::unregistered`] past
    /// the end.
    pub fn arg(&self, index: usize) -> MetaInfo {
        self.args
            .get(index)
            .copied()
            .unwrap_or_else(MetaData::unregistered)
    }

    /// Records of all arguments.
    pub fn args(&self) -> &[MetaInfo] {
        &self.args
    }

    /// Record of the return type; [`MetaData::unregistered`] for `()`.
    pub fn return_type(&self) -> MetaInfo {
        self.return_type
    }

    /// Record of the receiver type; [`MetaData::unregistered`] for free
    /// functions.
    pub fn context(&self) -> MetaInfo {
        self.context
    }

    /// Whether the receiver is taken by `&mut`.
    pub fn mutates_receiver(&self) -> bool {
        self.exclusive_receiver
    }

    /// Calls the function.
    ///
    /// Arguments are copied out of `args`, the receiver (for member functions)
    /// is borrowed from `context`, and a non-`()` result is assigned through
    /// `ret`. `context` is ignored by free functions and `ret` by functions
    /// returning `()`.
    ///
    /// # Panics
    ///
    /// If `args` has the wrong length, a member function gets an invalid
    /// receiver, or any handle carries the wrong type. [`Function::try_call`]
    /// checks all of this up front instead.
    pub fn call(&self, ret: &mut VarPtr<'_>, context: &mut VarPtr<'_>, args: &mut [VarPtr<'_>]) {
        (self.trampoline)(ret, context, args)
    }

    /// Calls a free function.
    pub fn invoke(&self, ret: &mut VarPtr<'_>, args: &mut [VarPtr<'_>]) {
        self.call(ret, &mut VarPtr::invalid(), args)
    }

    /// Checks every handle against the signature, then calls the function.
    pub fn try_call(
        &self,
        ret: &mut VarPtr<'_>,
        context: &mut VarPtr<'_>,
        args: &mut [VarPtr<'_>],
    ) -> Result<(), ReflectError> {
        if args.len() != self.args.len() {
            return Err(ReflectError::ArityMismatch {
                function: self.name,
                expected: self.args.len(),
                actual: args.len(),
            });
        }
        if self.shape.is_member() {
            if !context.valid() {
                return Err(ReflectError::MissingReceiver {
                    function: self.name,
                });
            }
            expect_handle(context, self.context, self.exclusive_receiver)?;
        }
        for (arg, expected) in args.iter().zip(self.args.iter().copied()) {
            expect_handle(arg, expected, false)?;
        }
        if self.shape.returns_value() {
            expect_handle(ret, self.return_type, true)?;
        }
        self.call(ret, context, args);
        Ok(())
    }
}

fn expect_handle(var: &VarPtr<'_>, expected: MetaInfo, mutable: bool) -> Result<(), ReflectError> {
    if !core::ptr::eq(var.type_info(), expected) {
        return Err(ReflectError::WrongType {
            requested: expected.rust_name(),
            actual: var.type_info().name(),
        });
    }
    if !var.valid() {
        return Err(ReflectError::InvalidHandle);
    }
    if mutable && !var.is_mutable() {
        return Err(ReflectError::ReadOnly {
            type_name: expected.name(),
        });
    }
    Ok(())
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field(
                "args",
                &self.args.iter().map(|arg| arg.name()).collect::<Vec<_>>(),
            )
            .field("return_type", &self.return_type.name())
            .field("context", &self.context.name())
            .finish_non_exhaustive()
    }
}

/// Marker for member functions taking `&self`.
pub struct ByRef;

/// Marker for member functions taking `&mut self`.
pub struct ByMut;

/// Marker for member functions returning a reference into the receiver. The
/// referenced value is cloned into the return handle.
pub struct Borrowed;

/// Rust functions and closures that can be registered as free functions.
///
/// Implemented for every `Fn(A0, .., An) -> R` with up to eight arguments,
/// where each argument is `Clone`. `Marker` only tells the implementations
/// apart and is always inferred.
pub trait FreeFunction<Marker>: Send + Sync + 'static {
    /// Builds the descriptor, resolving argument and return types in
    /// `registry`.
    fn into_function(self, name: &'static str, registry: &TypeRegistry) -> Function;
}

/// Rust functions and closures that can be registered as member functions of
/// `C`.
///
/// Implemented for every `Fn(&C, A0, .., An) -> R` and
/// `Fn(&mut C, A0, .., An) -> R` with up to eight arguments, where each
/// argument is `Clone`. Methods such as `Counter::get` fit directly.
///
/// Getters returning a borrow, `Fn(&C, ..) -> &R` and
/// `Fn(&mut C, ..) -> &mut R`, are accepted when `R: Clone`; the caller gets
/// a copy through the return handle, not a handle to the field. Unsized
/// targets such as `&str` are not supported, so return `&String` or `String`
/// instead.
pub trait MemberFunction<C, Marker>: Send + Sync + 'static {
    /// Builds the descriptor, resolving argument, return and receiver types in
    /// `registry`.
    fn into_function(self, name: &'static str, registry: &TypeRegistry) -> Function;
}

fn returns_unit<R: 'static>() -> bool {
    TypeId::of::<R>() == TypeId::of::<()>()
}

fn return_type<R: 'static>(registry: &TypeRegistry) -> MetaInfo {
    if returns_unit::<R>() {
        MetaData::unregistered()
    } else {
        registry.lookup::<R>()
    }
}

fn trampoline<F>(f: F) -> Trampoline
where
    F: Fn(&mut VarPtr<'_>, &mut VarPtr<'_>, &mut [VarPtr<'_>]) + Send + Sync + 'static,
{
    Box::new(f)
}

fn check_arity(function: &'static str, expected: usize, actual: usize) {
    if expected != actual {
        panic!(
            "{}",
            ReflectError::ArityMismatch {
                function,
                expected,
                actual
            }
        );
    }
}

fn check_receiver(function: &'static str, context: &VarPtr<'_>) {
    if !context.valid() {
        panic!("{}", ReflectError::MissingReceiver { function });
    }
}

fn store_return<R: 'static>(ret: &mut VarPtr<'_>, value: R) {
    if !returns_unit::<R>() {
        *ret.get_mut::<R>() = value;
    }
}

macro_rules! impl_function_traits {
    ($(($A:ident, $a:ident)),* ; $(($RA:ident, $ra:ident, $ridx:tt)),*) => {
        impl<F, R, $($A,)*> FreeFunction<fn($($A,)*) -> R> for F
        where
            F: Fn($($A,)*) -> R + Send + Sync + 'static,
            R: 'static,
            $($A: Clone + 'static,)*
        {
            fn into_function(self, name: &'static str, registry: &TypeRegistry) -> Function {
                let args: Vec<MetaInfo> = vec![$(registry.lookup::<$A>()),*];
                let arity = args.len();
                let f = self;
                Function {
                    name,
                    shape: CallShape::of::<R>(false),
                    args,
                    return_type: return_type::<R>(registry),
                    context: MetaData::unregistered(),
                    exclusive_receiver: false,
                    trampoline: trampoline(move |ret, _context, args| {
                        check_arity(name, arity, args.len());
                        $(let $ra = args[$ridx].value::<$RA>();)*
                        store_return(ret, f($($a,)*));
                    }),
                }
            }
        }

        impl<F, C, R, $($A,)*> MemberFunction<C, (ByRef, fn($($A,)*) -> R)> for F
        where
            F: Fn(&C, $($A,)*) -> R + Send + Sync + 'static,
            C: 'static,
            R: 'static,
            $($A: Clone + 'static,)*
        {
            fn into_function(self, name: &'static str, registry: &TypeRegistry) -> Function {
                let args: Vec<MetaInfo> = vec![$(registry.lookup::<$A>()),*];
                let arity = args.len();
                let f = self;
                Function {
                    name,
                    shape: CallShape::of::<R>(true),
                    args,
                    return_type: return_type::<R>(registry),
                    context: registry.lookup::<C>(),
                    exclusive_receiver: false,
                    trampoline: trampoline(move |ret, context, args| {
                        check_arity(name, arity, args.len());
                        check_receiver(name, context);
                        $(let $ra = args[$ridx].value::<$RA>();)*
                        store_return(ret, f(context.get::<C>(), $($a,)*));
                    }),
                }
            }
        }

        impl<F, C, R, $($A,)*> MemberFunction<C, (ByMut, fn($($A,)*) -> R)> for F
        where
            F: Fn(&mut C, $($A,)*) -> R + Send + Sync + 'static,
            C: 'static,
            R: 'static,
            $($A: Clone + 'static,)*
        {
            fn into_function(self, name: &'static str, registry: &TypeRegistry) -> Function {
                let args: Vec<MetaInfo> = vec![$(registry.lookup::<$A>()),*];
                let arity = args.len();
                let f = self;
                Function {
                    name,
                    shape: CallShape::of::<R>(true),
                    args,
                    return_type: return_type::<R>(registry),
                    context: registry.lookup::<C>(),
                    exclusive_receiver: true,
                    trampoline: trampoline(move |ret, context, args| {
                        check_arity(name, arity, args.len());
                        check_receiver(name, context);
                        $(let $ra = args[$ridx].value::<$RA>();)*
                        store_return(ret, f(context.get_mut::<C>(), $($a,)*));
                    }),
                }
            }
        }

        impl<F, C, R, $($A,)*> MemberFunction<C, (ByRef, Borrowed, fn($($A,)*) -> R)> for F
        where
            F: Fn(&C, $($A,)*) -> &R + Send + Sync + 'static,
            C: 'static,
            R: Clone + 'static,
            $($A: Clone + 'static,)*
        {
            fn into_function(self, name: &'static str, registry: &TypeRegistry) -> Function {
                let args: Vec<MetaInfo> = vec![$(registry.lookup::<$A>()),*];
                let arity = args.len();
                let f = self;
                Function {
                    name,
                    shape: CallShape::of::<R>(true),
                    args,
                    return_type: return_type::<R>(registry),
                    context: registry.lookup::<C>(),
                    exclusive_receiver: false,
                    trampoline: trampoline(move |ret, context, args| {
                        check_arity(name, arity, args.len());
                        check_receiver(name, context);
                        $(let $ra = args[$ridx].value::<$RA>();)*
                        let value = R::clone(f(context.get::<C>(), $($a,)*));
                        store_return(ret, value);
                    }),
                }
            }
        }

        impl<F, C, R, $($A,)*> MemberFunction<C, (ByMut, Borrowed, fn($($A,)*) -> R)> for F
        where
            F: Fn(&mut C, $($A,)*) -> &mut R + Send + Sync + 'static,
            C: 'static,
            R: Clone + 'static,
            $($A: Clone + 'static,)*
        {
            fn into_function(self, name: &'static str, registry: &TypeRegistry) -> Function {
                let args: Vec<MetaInfo> = vec![$(registry.lookup::<$A>()),*];
                let arity = args.len();
                let f = self;
                Function {
                    name,
                    shape: CallShape::of::<R>(true),
                    args,
                    return_type: return_type::<R>(registry),
                    context: registry.lookup::<C>(),
                    exclusive_receiver: true,
                    trampoline: trampoline(move |ret, context, args| {
                        check_arity(name, arity, args.len());
                        check_receiver(name, context);
                        $(let $ra = args[$ridx].value::<$RA>();)*
                        let value = R::clone(f(context.get_mut::<C>(), $($a,)*));
                        store_return(ret, value);
                    }),
                }
            }
        }
    };
}

impl_function_traits!(;);
impl_function_traits!((A0, a0); (A0, a0, 0));
impl_function_traits!((A0, a0), (A1, a1); (A1, a1, 1), (A0, a0, 0));
impl_function_traits!(
    (A0, a0), (A1, a1), (A2, a2);
    (A2, a2, 2), (A1, a1, 1), (A0, a0, 0)
);
impl_function_traits!(
    (A0, a0), (A1, a1), (A2, a2), (A3, a3);
    (A3, a3, 3), (A2, a2, 2), (A1, a1, 1), (A0, a0, 0)
);
impl_function_traits!(
    (A0, a0), (A1, a1), (A2, a2), (A3, a3), (A4, a4);
    (A4, a4, 4), (A3, a3, 3), (A2, a2, 2), (A1, a1, 1), (A0, a0, 0)
);
impl_function_traits!(
    (A0, a0), (A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5);
    (A5, a5, 5), (A4, a4, 4), (A3, a3, 3), (A2, a2, 2), (A1, a1, 1), (A0, a0, 0)
);
impl_function_traits!(
    (A0, a0), (A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5), (A6, a6);
    (A6, a6, 6), (A5, a5, 5), (A4, a4, 4), (A3, a3, 3), (A2, a2, 2), (A1, a1, 1), (A0, a0, 0)
);
impl_function_traits!(
    (A0, a0), (A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5), (A6, a6), (A7, a7);
    (A7, a7, 7), (A6, a6, 6), (A5, a5, 5), (A4, a4, 4), (A3, a3, 3), (A2, a2, 2), (A1, a1, 1),
    (A0, a0, 0)
);

#[cfg(test)]
mod tests {
    use super::*;
    use tyreg_testhelpers::test;

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    fn nothing() {}

    #[test]
    fn shapes_follow_the_signature() {
        let registry = TypeRegistry::global();
        let add = registry.register_fn("function_tests::add", add);
        assert_eq!(add.shape(), CallShape::Static);
        assert_eq!(add.num_args(), 2);
        assert_eq!(add.arg(0).name(), "i32");
        assert!(!add.arg(2).valid());
        assert_eq!(add.return_type().name(), "i32");
        assert!(!add.context().valid());

        let nothing = registry.register_fn("function_tests::nothing", nothing);
        assert_eq!(nothing.shape(), CallShape::VoidStatic);
        assert!(!nothing.return_type().valid());
    }

    #[test]
    fn arguments_arrive_in_order() {
        let concat = TypeRegistry::global().register_fn(
            "function_tests::concat",
            |a: String, b: char, c: u8| format!("{a}{b}{c}"),
        );
        let (mut a, mut b, mut c) = (String::from("x"), '-', 7u8);
        let mut out = String::new();
        concat.invoke(
            &mut VarPtr::new(&mut out),
            &mut [VarPtr::new(&mut a), VarPtr::new(&mut b), VarPtr::new(&mut c)],
        );
        assert_eq!(out, "x-7");
    }

    #[test]
    #[should_panic(expected = "takes 2 argument(s), but 1 were passed")]
    fn wrong_arity_panics() {
        let add = TypeRegistry::global().register_fn("function_tests::add_arity", add);
        let mut a = 1i32;
        let mut ret = 0i32;
        add.invoke(&mut VarPtr::new(&mut ret), &mut [VarPtr::new(&mut a)]);
    }

    #[test]
    fn try_call_reports_instead_of_panicking() {
        let add = TypeRegistry::global().register_fn("function_tests::add_checked", add);
        let (mut a, mut b, mut ret) = (1i32, 2u8, 0i32);
        let err = add
            .try_call(
                &mut VarPtr::new(&mut ret),
                &mut VarPtr::invalid(),
                &mut [VarPtr::new(&mut a), VarPtr::new(&mut b)],
            )
            .unwrap_err();
        assert!(matches!(err, ReflectError::WrongType { actual: "u8", .. }));
        assert_eq!(ret, 0);
    }
}

use unsynn::*;

unsynn! {
    /// A test function: attributes and signature, then the body.
    struct TestFn {
        signature: Any<Cons<Except<BraceGroup>, TokenTree>>,
        body: BraceGroup,
    }

    /// The attribute argument: a path to a function that registers the types
    /// the test needs.
    struct Registration {
        path: Any<Cons<Except<Comma>, TokenTree>>,
    }
}

/// Test attribute for the tyreg workspace.
///
/// Installs the tracing subscriber, then calls the registration function named
/// in the attribute (if any) before the body runs, so every test sees its
/// types registered in the global registry.
///
/// ```ignore
/// fn register() {
///     // reflect::<Point>("Point") ...
/// }
///
/// #[tyreg_testhelpers::test(register)]
/// fn point_is_known() {
///     assert!(type_named("Point").valid());
/// }
/// ```
#[proc_macro_attribute]
pub fn test(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let item = TokenStream::from(item);
    let Ok(test_fn) = item.to_token_iter().parse::<TestFn>() else {
        return compile_error("#[test] expects a function with a body");
    };

    let attr = TokenStream::from(attr);
    let register = if attr.is_empty() {
        TokenStream::new()
    } else {
        let Ok(registration) = attr.to_token_iter().parse::<Registration>() else {
            return compile_error("#[test(..)] takes the path of a registration function");
        };
        let mut path = TokenStream::new();
        registration.path.to_tokens(&mut path);
        quote::quote! { #path(); }
    };

    let mut signature = TokenStream::new();
    test_fn.signature.to_tokens(&mut signature);
    let body = test_fn.body.0.stream();

    quote::quote! {
        #[::core::prelude::rust_2024::test]
        #signature {
            ::tyreg_testhelpers::setup();
            #register

            #body
        }
    }
    .into()
}

fn compile_error(message: &str) -> proc_macro::TokenStream {
    quote::quote! { ::core::compile_error!(#message); }.into()
}

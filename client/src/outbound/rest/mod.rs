//! REST binding: the canonical backend binding.

mod http_binding;

pub use http_binding::RestBinding;
